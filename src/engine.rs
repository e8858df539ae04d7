//! Drives one cleanup run: scan, protect, confirm, archive, verify, delete,
//! record.

use crate::archiver::{Archive, verify_archive};
use crate::cache::{CacheCandidate, RemovableCache, SafetyTier, TierFilter};
use crate::cleaner::{DeleteMethod, DeleteOutcome, delete_item};
use crate::confirm::{Confirm, ConfirmRequest, Decision};
use crate::error::CleanupError;
use crate::git::{self, STEPS};
use crate::guard::{ProtectionGuard, unpushed_commits};
use crate::model::{CleanupConfig, Disposition, Entry, Mode};
use crate::policy::Category;
use crate::report::{AuditLog, CleanupResults, Recorder, RepoOutcome};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Scanning,
    Archiving,
    Deleting,
    Reporting,
    Done,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: Mode,
    /// Skip per-item confirmation (review-tier caches are still asked).
    pub assume_yes: bool,
    pub method: DeleteMethod,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub state: RunState,
    pub results: CleanupResults,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        self.results.exit_code()
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Checks that abort the run before any item is touched.
pub fn preflight(config: &CleanupConfig) -> Result<(), CleanupError> {
    if !config.workspace_root.is_dir() {
        return Err(CleanupError::MissingWorkspace(config.workspace_root.clone()));
    }
    // archive_dir is <archive-root>/<date>; the archive root itself may be
    // created on first use, its parent may not.
    let archive_parent = config
        .archive_dir
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("/"));
    if !archive_parent.is_dir() {
        return Err(CleanupError::MissingArchiveParent(archive_parent.to_path_buf()));
    }
    Ok(())
}

pub struct Engine<'a> {
    options: RunOptions,
    guard: &'a ProtectionGuard,
    archiver: &'a dyn Archive,
    confirmer: &'a mut dyn Confirm,
    recorder: Recorder,
    state: RunState,
}

impl<'a> Engine<'a> {
    pub fn new(
        options: RunOptions,
        guard: &'a ProtectionGuard,
        archiver: &'a dyn Archive,
        confirmer: &'a mut dyn Confirm,
        log: Option<AuditLog>,
    ) -> Self {
        Self {
            options,
            guard,
            archiver,
            confirmer,
            recorder: Recorder::new(log),
            state: RunState::Idle,
        }
    }

    fn transition(&mut self, next: RunState) {
        if self.state != next {
            tracing::debug!("state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn finish(mut self) -> RunOutcome {
        self.transition(RunState::Reporting);
        let results = std::mem::take(&mut self.recorder).finish();
        self.transition(RunState::Done);
        RunOutcome {
            state: self.state,
            results,
        }
    }

    /// Processes categories in order. `scan` is called lazily per run so the
    /// caller's enumeration happens inside the `Scanning` state.
    pub fn run_categories(
        mut self,
        config: &CleanupConfig,
        scan: impl FnOnce() -> Vec<Category>,
    ) -> RunOutcome {
        self.transition(RunState::Scanning);
        let categories = scan();

        'categories: for category in &categories {
            tracing::debug!(
                category = %category.name,
                items = category.entries.len(),
                "processing"
            );
            let mut approve_all = false;
            for entry in &category.entries {
                let flow = self.process_entry(
                    entry,
                    &category.scan_root,
                    &config.archive_dir,
                    &mut approve_all,
                );
                if let Flow::Quit = flow {
                    self.recorder.results.quit = true;
                    break 'categories;
                }
            }
        }

        self.finish()
    }

    fn process_entry(
        &mut self,
        entry: &Entry,
        scan_root: &Path,
        archive_dir: &Path,
        approve_all: &mut bool,
    ) -> Flow {
        let path = entry.path.as_path();
        if let Err(veto) = self.guard.check(path) {
            self.recorder.skipped(path, &veto.to_string());
            return Flow::Continue;
        }

        let size = entry.size();
        let action = match entry.disposition {
            Disposition::ArchiveThenDelete => "ARCHIVE",
            Disposition::DeleteOnly | Disposition::DeleteImmediately => "DELETE",
        };
        let request = ConfirmRequest {
            action,
            path,
            size,
            sample: &[],
        };
        match self.approve(&request, false, approve_all) {
            Some(true) => {}
            Some(false) => {
                self.recorder.skipped(path, "declined");
                return Flow::Continue;
            }
            None => return Flow::Quit,
        }

        match entry.disposition {
            Disposition::ArchiveThenDelete => {
                self.archive_then_delete(path, size, scan_root, archive_dir);
            }
            Disposition::DeleteOnly | Disposition::DeleteImmediately => self.delete(path, size),
        }
        Flow::Continue
    }

    /// `Some(true)` to proceed, `Some(false)` when declined, `None` to quit.
    fn approve(
        &mut self,
        request: &ConfirmRequest<'_>,
        always_ask: bool,
        approve_all: &mut bool,
    ) -> Option<bool> {
        if self.options.mode.is_dry_run() || *approve_all {
            return Some(true);
        }
        if self.options.assume_yes && !always_ask {
            return Some(true);
        }
        match self.confirmer.confirm(request) {
            Decision::Yes => Some(true),
            Decision::No => Some(false),
            Decision::All => {
                *approve_all = true;
                Some(true)
            }
            Decision::Quit => None,
        }
    }

    fn archive_then_delete(
        &mut self,
        path: &Path,
        size: u64,
        scan_root: &Path,
        archive_dir: &Path,
    ) {
        let mode = self.options.mode;
        self.transition(RunState::Archiving);
        let dest = match self.archiver.archive(path, scan_root, archive_dir, mode) {
            Ok(dest) => dest,
            Err(e) => {
                self.recorder.error(path, e.to_string());
                return;
            }
        };

        if !mode.is_dry_run()
            && let Err(reason) = verify_archive(path, &dest)
        {
            let error = CleanupError::Verify {
                path: path.to_path_buf(),
                reason,
            };
            self.recorder.error(path, error.to_string());
            return;
        }

        self.transition(RunState::Deleting);
        match delete_item(path, mode, self.options.method) {
            Ok(_) => self.recorder.archived(path, size, &dest),
            Err(e) => self.recorder.error(path, e.to_string()),
        }
    }

    fn delete(&mut self, path: &Path, size: u64) {
        self.transition(RunState::Deleting);
        match delete_item(path, self.options.mode, self.options.method) {
            Ok(DeleteOutcome::Removed | DeleteOutcome::Simulated) => {
                self.recorder.deleted(path, size);
            }
            Ok(DeleteOutcome::AlreadyAbsent) => self.recorder.absent(path),
            Err(e) => self.recorder.error(path, e.to_string()),
        }
    }

    /// Cache cleanup, tier by tier. Danger candidates are recorded as skipped
    /// and never reach the deleter.
    pub fn run_caches(mut self, candidates: &[CacheCandidate], filter: TierFilter) -> RunOutcome {
        self.transition(RunState::Scanning);

        'tiers: for tier in [SafetyTier::Safe, SafetyTier::Review, SafetyTier::Danger] {
            if !filter.includes(tier) {
                continue;
            }
            let mut approve_all = false;
            for candidate in candidates.iter().filter(|c| c.tier == tier) {
                let Some(removable) = RemovableCache::new(candidate) else {
                    let path = &candidate.entry.path;
                    self.recorder.skipped(path, "danger tier, inspect manually");
                    continue;
                };
                if let Flow::Quit = self.remove_cache(&removable, &mut approve_all) {
                    self.recorder.results.quit = true;
                    break 'tiers;
                }
            }
        }

        self.finish()
    }

    fn remove_cache(&mut self, removable: &RemovableCache<'_>, approve_all: &mut bool) -> Flow {
        let path = removable.path();
        if let Err(veto) = self.guard.check(path) {
            self.recorder.skipped(path, &veto.to_string());
            return Flow::Continue;
        }

        let size = removable.candidate().entry.size();
        let request = ConfirmRequest {
            action: "DELETE CACHE",
            path,
            size,
            sample: &removable.candidate().sample,
        };
        match self.approve(&request, removable.needs_confirmation(), approve_all) {
            Some(true) => {}
            Some(false) => {
                self.recorder.skipped(path, "declined");
                return Flow::Continue;
            }
            None => return Flow::Quit,
        }

        self.delete(path, size);
        Flow::Continue
    }

    /// Git maintenance per repository. Unpushed commits produce a warning
    /// before the destructive steps but do not stop them.
    pub fn run_git(mut self, repos: &[PathBuf]) -> RunOutcome {
        self.transition(RunState::Scanning);
        let mut approve_all = false;

        for repo in repos {
            if let Err(veto) = self.guard.check_markers(repo) {
                self.recorder.skipped(repo, &veto.to_string());
                continue;
            }

            let size_before = git::git_dir_size(repo);
            let packed_before = git::packed_size(repo);
            let request = ConfirmRequest {
                action: "MAINTAIN",
                path: repo,
                size: size_before,
                sample: &[],
            };
            match self.approve(&request, false, &mut approve_all) {
                Some(true) => {}
                Some(false) => {
                    self.recorder.skipped(repo, "declined");
                    continue;
                }
                None => {
                    self.recorder.results.quit = true;
                    break;
                }
            }

            let size_after = self.maintain(repo);
            self.recorder.maintained(RepoOutcome {
                path: repo.clone(),
                size_before,
                packed_before,
                size_after,
            });
        }

        self.finish()
    }

    fn maintain(&mut self, repo: &Path) -> Option<u64> {
        let dry_run = self.options.mode.is_dry_run();
        let mut warned = false;

        for step in STEPS {
            if step.destructive && !warned {
                warned = true;
                if let Some(count) = unpushed_commits(repo).filter(|&n| n > 0) {
                    self.recorder.warning(
                        repo,
                        format!(
                            "{}: {count} unpushed commit(s); reflog expiry and prune still run",
                            repo.display()
                        ),
                    );
                }
            }
            if dry_run {
                continue;
            }
            self.transition(RunState::Deleting);
            if let Err(e) = git::run_step(repo, step) {
                self.recorder.error(repo, e.to_string());
                return None;
            }
        }

        if dry_run {
            None
        } else {
            Some(git::git_dir_size(repo))
        }
    }
}

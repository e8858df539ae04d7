use crate::constants::SUMMARY_ITEM_LIMIT;
use crate::model::{CleanupConfig, Mode};
use crate::scanner::size::format_size;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Git maintenance result for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoOutcome {
    pub path: PathBuf,
    pub size_before: u64,
    pub packed_before: u64,
    /// `None` in dry-run or when maintenance failed.
    pub size_after: Option<u64>,
}

impl RepoOutcome {
    pub const fn saved(&self) -> Option<u64> {
        match self.size_after {
            Some(after) => Some(self.size_before.saturating_sub(after)),
            None => None,
        }
    }
}

/// Accumulates every outcome of one run.
#[derive(Debug, Default)]
pub struct CleanupResults {
    pub archived_items: Vec<(PathBuf, u64)>,
    pub deleted_items: Vec<(PathBuf, u64)>,
    pub errors: Vec<String>,
    pub skipped: Vec<(PathBuf, String)>,
    pub warnings: Vec<String>,
    pub repos: Vec<RepoOutcome>,
    pub total_archived_size: u64,
    pub total_deleted_size: u64,
    /// The user quit at a confirmation prompt.
    pub quit: bool,
}

impl CleanupResults {
    pub fn add_archived(&mut self, path: PathBuf, size: u64) {
        self.total_archived_size += size;
        self.archived_items.push((path, size));
    }

    pub fn add_deleted(&mut self, path: PathBuf, size: u64) {
        self.total_deleted_size += size;
        self.deleted_items.push((path, size));
    }

    pub fn add_error(&mut self, message: String) {
        self.errors.push(message);
    }

    pub fn add_skipped(&mut self, path: PathBuf, reason: String) {
        self.skipped.push((path, reason));
    }

    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub fn add_repo(&mut self, outcome: RepoOutcome) {
        self.repos.push(outcome);
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn exit_code(&self) -> u8 {
        u8::from(!self.is_success())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    Archived,
    Deleted,
    Absent,
    Skipped,
    Error,
    Warning,
    Maintained,
}

impl LogAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Archived => "ARCHIVED",
            Self::Deleted => "DELETED",
            Self::Absent => "ABSENT",
            Self::Skipped => "SKIPPED",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Maintained => "MAINTAINED",
        }
    }
}

/// Append-only per-run log at `<logs-dir>/cleanup-<timestamp>.log`.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: File,
}

impl AuditLog {
    pub fn create(logs_dir: &Path, now: DateTime<Local>) -> io::Result<Self> {
        fs::create_dir_all(logs_dir)?;
        let path = logs_dir.join(format!("cleanup-{}.log", now.format("%Y%m%d-%H%M%S")));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&mut self, action: LogAction, path: &Path, size: Option<u64>, note: &str) {
        let line = format_log_line(Local::now(), action, path, size, note);
        if let Err(e) = writeln!(self.file, "{line}") {
            tracing::warn!(log = %self.path.display(), "failed to write audit log: {e}");
        }
    }
}

pub fn format_log_line(
    at: DateTime<Local>,
    action: LogAction,
    path: &Path,
    size: Option<u64>,
    note: &str,
) -> String {
    let size = size.map_or_else(|| "-".to_string(), format_size);
    format!(
        "{} | {} | {} | {size} | {note}",
        at.format("%Y-%m-%dT%H:%M:%S%:z"),
        action.as_str(),
        path.display()
    )
}

/// Owns the results and, in execute mode, the audit log. Every event goes
/// through here so the summary and the log never disagree.
#[derive(Debug, Default)]
pub struct Recorder {
    pub results: CleanupResults,
    log: Option<AuditLog>,
}

impl Recorder {
    pub fn new(log: Option<AuditLog>) -> Self {
        Self {
            results: CleanupResults::default(),
            log,
        }
    }

    fn log(&mut self, action: LogAction, path: &Path, size: Option<u64>, note: &str) {
        if let Some(log) = &mut self.log {
            log.record(action, path, size, note);
        }
    }

    pub fn archived(&mut self, path: &Path, size: u64, dest: &Path) {
        tracing::info!(path = %path.display(), dest = %dest.display(), "archived");
        self.log(LogAction::Archived, path, Some(size), &dest.display().to_string());
        self.results.add_archived(path.to_path_buf(), size);
    }

    pub fn deleted(&mut self, path: &Path, size: u64) {
        tracing::info!(path = %path.display(), "deleted");
        self.log(LogAction::Deleted, path, Some(size), "");
        self.results.add_deleted(path.to_path_buf(), size);
    }

    pub fn absent(&mut self, path: &Path) {
        self.log(LogAction::Absent, path, None, "already removed");
    }

    pub fn skipped(&mut self, path: &Path, reason: &str) {
        tracing::warn!(path = %path.display(), "skipped: {reason}");
        self.log(LogAction::Skipped, path, None, reason);
        self.results.add_skipped(path.to_path_buf(), reason.to_string());
    }

    pub fn error(&mut self, path: &Path, message: String) {
        tracing::error!("{message}");
        self.log(LogAction::Error, path, None, &message);
        self.results.add_error(message);
    }

    pub fn warning(&mut self, path: &Path, message: String) {
        tracing::warn!("{message}");
        self.log(LogAction::Warning, path, None, &message);
        self.results.add_warning(message);
    }

    pub fn maintained(&mut self, outcome: RepoOutcome) {
        if let Some(saved) = outcome.saved() {
            self.log(
                LogAction::Maintained,
                &outcome.path,
                outcome.size_after,
                &format!("saved {}", format_size(saved)),
            );
        }
        self.results.add_repo(outcome);
    }

    pub fn finish(self) -> CleanupResults {
        self.results
    }
}

fn write_items(out: &mut String, title: &str, items: &[(PathBuf, u64)], total: u64) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title} ({} items, {}):", items.len(), format_size(total));
    for (path, size) in items.iter().take(SUMMARY_ITEM_LIMIT) {
        let _ = writeln!(out, "  {} ({})", path.display(), format_size(*size));
    }
    if items.len() > SUMMARY_ITEM_LIMIT {
        let _ = writeln!(out, "  ... and {} more", items.len() - SUMMARY_ITEM_LIMIT);
    }
}

/// Human-readable summary. Dry-run wording is a prediction.
pub fn format_results(results: &CleanupResults, config: &CleanupConfig, mode: Mode) -> String {
    let dry_run = mode.is_dry_run();
    let mut out = String::new();

    if dry_run {
        out.push_str("DRY RUN MODE - no changes made\n");
    } else {
        out.push_str("Cleanup complete\n");
    }
    let _ = writeln!(out, "Retention: {} days", config.retention_days);

    if !results.archived_items.is_empty() {
        let _ = writeln!(out, "Archive: {}", config.archive_dir.display());
    }

    let (archive_title, delete_title) = if dry_run {
        ("WILL ARCHIVE", "WILL DELETE")
    } else {
        ("ARCHIVED", "DELETED")
    };
    write_items(
        &mut out,
        archive_title,
        &results.archived_items,
        results.total_archived_size,
    );
    write_items(
        &mut out,
        delete_title,
        &results.deleted_items,
        results.total_deleted_size,
    );

    if !results.repos.is_empty() {
        let _ = writeln!(out, "\nGIT REPOSITORIES ({}):", results.repos.len());
        for repo in &results.repos {
            let status = match repo.saved() {
                None if dry_run => "will repack and prune".to_string(),
                None => "not completed".to_string(),
                Some(0) => "complete, no space saved".to_string(),
                Some(saved) => format!("saved {}", format_size(saved)),
            };
            let _ = writeln!(
                out,
                "  {} (.git {}, packed {}): {status}",
                repo.path.display(),
                format_size(repo.size_before),
                format_size(repo.packed_before),
            );
        }
    }

    if results.archived_items.is_empty()
        && results.deleted_items.is_empty()
        && results.repos.is_empty()
    {
        out.push_str("\nNothing to clean up.\n");
    }

    if !results.skipped.is_empty() {
        let _ = writeln!(out, "\nSKIPPED ({}):", results.skipped.len());
        for (path, reason) in results.skipped.iter().take(SUMMARY_ITEM_LIMIT) {
            let _ = writeln!(out, "  {} ({reason})", path.display());
        }
        if results.skipped.len() > SUMMARY_ITEM_LIMIT {
            let _ = writeln!(out, "  ... and {} more", results.skipped.len() - SUMMARY_ITEM_LIMIT);
        }
    }

    if !results.warnings.is_empty() {
        let _ = writeln!(out, "\nWARNINGS ({}):", results.warnings.len());
        for warning in &results.warnings {
            let _ = writeln!(out, "  {warning}");
        }
    }

    if !results.errors.is_empty() {
        let _ = writeln!(out, "\nERRORS ({}):", results.errors.len());
        for error in &results.errors {
            let _ = writeln!(out, "  {error}");
        }
    }

    if results.quit {
        out.push_str("\nStopped at user request; completed actions were kept.\n");
    }

    let total = results.total_archived_size + results.total_deleted_size;
    if dry_run {
        let _ = writeln!(out, "\nTotal space to reclaim: {}", format_size(total));
        out.push_str("Run with --execute to perform cleanup.\n");
    } else {
        let _ = writeln!(out, "\nTotal space reclaimed: {}", format_size(total));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn config() -> CleanupConfig {
        CleanupConfig::new(
            PathBuf::from("/home/u/.claude"),
            Path::new("/home/u/Documents/claude-archives"),
            7,
            Local::now(),
        )
    }

    #[test]
    fn accumulates_totals() {
        let mut results = CleanupResults::default();
        assert_eq!(results.exit_code(), 0);

        results.add_archived(PathBuf::from("/test/file.txt"), 1024);
        results.add_deleted(PathBuf::from("/test/old.log"), 512);
        assert_eq!(results.archived_items[0], (PathBuf::from("/test/file.txt"), 1024));
        assert_eq!(results.total_archived_size, 1024);
        assert_eq!(results.total_deleted_size, 512);
        assert!(results.is_success());

        results.add_error("Test error message".to_string());
        assert_eq!(results.errors, vec!["Test error message".to_string()]);
        assert_eq!(results.exit_code(), 1);
    }

    #[test]
    fn dry_run_summary_is_a_prediction() {
        let mut results = CleanupResults::default();
        results.add_archived(PathBuf::from("/claude/projects/old"), 100 * 1024 * 1024);
        results.add_deleted(PathBuf::from("/claude/debug/old.log"), 50 * 1024 * 1024);

        let output = format_results(&results, &config(), Mode::DryRun);

        assert!(output.contains("DRY RUN MODE"));
        assert!(output.contains("WILL ARCHIVE"));
        assert!(output.contains("WILL DELETE"));
        assert!(output.contains("100.0MB"));
        assert!(output.contains("50.0MB"));
        assert!(output.contains("Run with --execute"));
    }

    #[test]
    fn execute_summary_uses_completed_verbs() {
        let mut results = CleanupResults::default();
        results.add_archived(PathBuf::from("/claude/projects/old"), 100 * 1024 * 1024);

        let output = format_results(&results, &config(), Mode::Execute);

        assert!(!output.contains("DRY RUN MODE"));
        assert!(!output.contains("WILL ARCHIVE"));
        assert!(output.contains("ARCHIVED (1 items, 100.0MB)"));
        assert!(!output.contains("--execute"));
    }

    #[test]
    fn long_lists_are_truncated() {
        let mut results = CleanupResults::default();
        for i in 0..15 {
            results.add_deleted(PathBuf::from(format!("/claude/debug/{i}.log")), 1);
        }

        let output = format_results(&results, &config(), Mode::Execute);

        assert!(output.contains("/claude/debug/9.log"));
        assert!(!output.contains("/claude/debug/10.log"));
        assert!(output.contains("... and 5 more"));
    }

    #[test]
    fn git_savings_wording() {
        let mut results = CleanupResults::default();
        results.add_repo(RepoOutcome {
            path: PathBuf::from("/code/a"),
            size_before: 2048,
            packed_before: 1024,
            size_after: Some(4096),
        });
        results.add_repo(RepoOutcome {
            path: PathBuf::from("/code/b"),
            size_before: 4096,
            packed_before: 0,
            size_after: Some(1024),
        });

        let output = format_results(&results, &config(), Mode::Execute);

        assert!(output.contains("/code/a (.git 2.0KB, packed 1.0KB): complete, no space saved"));
        assert!(output.contains("/code/b (.git 4.0KB, packed 0B): saved 3.0KB"));
    }

    #[test]
    fn log_line_format() {
        let at = Local.with_ymd_and_hms(2026, 2, 23, 9, 30, 0).unwrap();
        let line = format_log_line(
            at,
            LogAction::Deleted,
            Path::new("/claude/debug/old.log"),
            Some(1536),
            "",
        );
        assert!(line.starts_with("2026-02-23T09:30:00"));
        assert!(line.ends_with(" | DELETED | /claude/debug/old.log | 1.5KB | "));
    }

    #[test]
    fn audit_log_appends_lines() -> Result<()> {
        let dir = tempdir()?;
        let logs = dir.path().join("logs");
        let at = Local.with_ymd_and_hms(2026, 2, 23, 9, 30, 0).unwrap();

        let log = AuditLog::create(&logs, at)?;
        let log_path = log.path().to_path_buf();
        let mut recorder = Recorder::new(Some(log));
        recorder.deleted(Path::new("/w/debug/a.log"), 10);
        recorder.error(Path::new("/w/debug/b.log"), "failed to delete /w/debug/b.log".to_string());
        let results = recorder.finish();

        assert_eq!(log_path, logs.join("cleanup-20260223-093000.log"));
        let text = fs::read_to_string(log_path)?;
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("| DELETED | /w/debug/a.log | 10B |"));
        assert!(lines[1].contains("| ERROR | /w/debug/b.log | - | failed to delete"));
        assert_eq!(results.exit_code(), 1);
        Ok(())
    }
}

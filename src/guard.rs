use crate::allowlist::Allowlist;
use crate::constants::{PROTECTION_MARKERS, SYSTEM_ROOTS};
use crate::error::Veto;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Decides whether a path may be archived or deleted.
///
/// Checked per item, immediately before any archive or delete call.
pub struct ProtectionGuard {
    cwd: Option<PathBuf>,
    home: Option<PathBuf>,
    allowlist: Allowlist,
}

impl ProtectionGuard {
    pub fn new(allowlist: Allowlist) -> Self {
        Self {
            cwd: env::current_dir().ok().map(|p| canonical(&p)),
            home: dirs::home_dir().map(|p| canonical(&p)),
            allowlist,
        }
    }

    #[cfg(test)]
    pub fn with_cwd(allowlist: Allowlist, cwd: Option<PathBuf>) -> Self {
        Self {
            cwd,
            home: None,
            allowlist,
        }
    }

    pub fn check(&self, path: &Path) -> Result<(), Veto> {
        let resolved = canonical(path);

        if self.is_system_root(&resolved) {
            return Err(Veto::SystemRoot);
        }
        if let Some(cwd) = &self.cwd
            && cwd.starts_with(&resolved)
        {
            return Err(Veto::WorkingDirectory);
        }
        self.check_markers(path)
    }

    /// Marker and allowlist rules only. Used for git maintenance, which leaves
    /// the working tree in place.
    pub fn check_markers(&self, path: &Path) -> Result<(), Veto> {
        if let Some(rule) = self.allowlist.matching_rule(path) {
            return Err(Veto::Allowlisted(rule.display().to_string()));
        }
        if let Some(marker) = find_marker(path) {
            return Err(Veto::Marker(marker));
        }
        Ok(())
    }

    fn is_system_root(&self, path: &Path) -> bool {
        SYSTEM_ROOTS.iter().any(|root| path == Path::new(root))
            || self.home.as_deref().is_some_and(|home| path == home)
    }
}

/// A marker inside the item (when it is a directory) or next to it.
fn find_marker(path: &Path) -> Option<PathBuf> {
    let mut dirs = Vec::with_capacity(2);
    if path.is_dir() && !path.is_symlink() {
        dirs.push(path);
    }
    if let Some(parent) = path.parent() {
        dirs.push(parent);
    }

    dirs.into_iter()
        .flat_map(|dir| PROTECTION_MARKERS.iter().map(move |m| dir.join(m)))
        .find(|marker| marker.exists())
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Count of commits on local branches that no remote has.
///
/// Returns `None` when git cannot answer (not a repository, git missing).
pub fn unpushed_commits(repo: &Path) -> Option<usize> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["log", "--branches", "--not", "--remotes", "--oneline"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(stdout.lines().filter(|l| !l.trim().is_empty()).count())
}

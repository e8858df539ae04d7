use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    DryRun,
    Execute,
}

impl Mode {
    pub const fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Valuable data: copied to the archive, verified, then removed.
    ArchiveThenDelete,
    /// Regenerable data: removed once older than the cutoff.
    DeleteOnly,
    /// Ephemera: removed regardless of age.
    DeleteImmediately,
}

impl Disposition {
    pub const fn is_age_filtered(self) -> bool {
        !matches!(self, Self::DeleteImmediately)
    }
}

/// A filesystem entry discovered during one scan pass.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub modified: SystemTime,
    pub disposition: Disposition,
}

impl Entry {
    /// Builds an entry from `symlink_metadata`. Returns `None` when the path
    /// cannot be stat'ed (vanished or unreadable).
    pub fn from_path(path: &Path, disposition: Disposition) -> Option<Self> {
        let metadata = fs::symlink_metadata(path).ok()?;
        let kind = if metadata.file_type().is_symlink() {
            EntryKind::Symlink
        } else if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Some(Self {
            path: path.to_path_buf(),
            kind,
            modified,
            disposition,
        })
    }

    /// Recomputed on each call. A symlink counts as the link itself.
    pub fn size(&self) -> u64 {
        match self.kind {
            EntryKind::Directory => crate::scanner::size::get_size(&self.path),
            EntryKind::File | EntryKind::Symlink => {
                fs::symlink_metadata(&self.path).map_or(0, |m| m.len())
            }
        }
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub workspace_root: PathBuf,
    pub archive_dir: PathBuf,
    pub retention_days: u32,
    pub cutoff: SystemTime,
}

impl CleanupConfig {
    /// `archive_dir` is `<archive_root>/<YYYY-MM-DD>` for the given `now`.
    pub fn new(
        workspace_root: PathBuf,
        archive_root: &Path,
        retention_days: u32,
        now: DateTime<Local>,
    ) -> Self {
        let archive_dir = archive_root.join(now.format("%Y-%m-%d").to_string());
        let retention = Duration::from_secs(u64::from(retention_days) * SECONDS_PER_DAY);
        let cutoff = SystemTime::from(now)
            .checked_sub(retention)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        Self {
            workspace_root,
            archive_dir,
            retention_days,
            cutoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn config_derives_dated_archive_and_cutoff() {
        let now = Local.with_ymd_and_hms(2026, 2, 23, 12, 0, 0).unwrap();
        let config = CleanupConfig::new(
            PathBuf::from("/work/.claude"),
            Path::new("/archive"),
            7,
            now,
        );

        assert_eq!(config.archive_dir, PathBuf::from("/archive/2026-02-23"));
        assert_eq!(
            SystemTime::from(now).duration_since(config.cutoff).unwrap(),
            Duration::from_secs(7 * SECONDS_PER_DAY)
        );
    }

    #[test]
    fn only_delete_immediately_skips_age_filter() {
        assert!(Disposition::ArchiveThenDelete.is_age_filtered());
        assert!(Disposition::DeleteOnly.is_age_filtered());
        assert!(!Disposition::DeleteImmediately.is_age_filtered());
    }
}

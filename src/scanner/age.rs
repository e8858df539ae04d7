use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Strictly older than the cutoff. An mtime equal to the cutoff is recent.
pub fn is_older_than(modified: SystemTime, cutoff: SystemTime) -> bool {
    modified < cutoff
}

/// Judges a single path by its own mtime (symlinks are not followed).
/// Unreadable paths are never old.
pub fn is_old(path: &Path, cutoff: SystemTime) -> bool {
    fs::symlink_metadata(path)
        .and_then(|metadata| metadata.modified())
        .is_ok_and(|modified| is_older_than(modified, cutoff))
}

/// Immediate children of `directory` older than `cutoff`.
///
/// A missing directory yields an empty list. Children whose metadata cannot
/// be read are omitted.
pub fn find_old_items(directory: &Path, cutoff: SystemTime) -> Vec<PathBuf> {
    super::list_children(directory)
        .into_iter()
        .filter(|path| is_old(path, cutoff))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    fn set_mtime(path: &Path, time: SystemTime) -> Result<()> {
        File::open(path)?.set_modified(time)?;
        Ok(())
    }

    #[test]
    fn finds_only_old_children() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path();
        let now = SystemTime::now();

        let old = root.join("old.txt");
        File::create(&old)?;
        set_mtime(&old, now - Duration::from_secs(10 * 86_400))?;

        let old_dir = root.join("old-dir");
        fs::create_dir(&old_dir)?;
        File::create(old_dir.join("fresh.txt"))?;
        set_mtime(&old_dir, now - Duration::from_secs(10 * 86_400))?;

        File::create(root.join("new.txt"))?;

        let cutoff = now - Duration::from_secs(7 * 86_400);
        let items = find_old_items(root, cutoff);

        // Directory age is its own mtime, not its newest child.
        assert_eq!(items, vec![old_dir, old]);
        Ok(())
    }

    #[test]
    fn missing_directory_is_empty() {
        let path = Path::new("/path/to/non/existent/reclaim_age_test_12345");
        assert!(find_old_items(path, SystemTime::now()).is_empty());
    }

    #[test]
    fn cutoff_boundary() -> Result<()> {
        let dir = tempdir()?;
        let cutoff = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        let at_cutoff = dir.path().join("at-cutoff.txt");
        File::create(&at_cutoff)?;
        set_mtime(&at_cutoff, cutoff)?;

        let one_second_older = dir.path().join("older.txt");
        File::create(&one_second_older)?;
        set_mtime(&one_second_older, cutoff - Duration::from_secs(1))?;

        assert!(!is_older_than(cutoff, cutoff));
        assert!(is_older_than(cutoff - Duration::from_secs(1), cutoff));
        assert!(!is_old(&at_cutoff, cutoff));
        assert!(is_old(&one_second_older, cutoff));
        assert_eq!(find_old_items(dir.path(), cutoff), vec![one_second_older]);
        Ok(())
    }
}

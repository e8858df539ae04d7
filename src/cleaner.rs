use crate::error::CleanupError;
use crate::model::Mode;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMethod {
    #[default]
    Permanent,
    /// Move to the OS trash instead of unlinking.
    Trash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// Vanished between scan and action. Counts as success.
    AlreadyAbsent,
    Simulated,
}

/// Removes a file, symlink (not its target) or directory tree.
pub fn delete_item(
    path: &Path,
    mode: Mode,
    method: DeleteMethod,
) -> Result<DeleteOutcome, CleanupError> {
    if mode.is_dry_run() {
        return Ok(DeleteOutcome::Simulated);
    }

    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "already absent");
            return Ok(DeleteOutcome::AlreadyAbsent);
        }
        Err(e) => return Err(delete_error(path, e)),
    };

    if method == DeleteMethod::Trash {
        trash::delete(path).map_err(|source| CleanupError::Trash {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(DeleteOutcome::Removed);
    }

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(DeleteOutcome::Removed),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DeleteOutcome::AlreadyAbsent),
        Err(e) => Err(delete_error(path, e)),
    }
}

fn delete_error(path: &Path, source: io::Error) -> CleanupError {
    CleanupError::Delete {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn deletes_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test_file.txt");
        File::create(&file_path)?;

        let outcome = delete_item(&file_path, Mode::Execute, DeleteMethod::Permanent)?;

        assert_eq!(outcome, DeleteOutcome::Removed);
        assert!(!file_path.exists());
        Ok(())
    }

    #[test]
    fn deletes_directory_tree() -> Result<()> {
        let dir = tempdir()?;
        let tree = dir.path().join("test_dir");
        fs::create_dir_all(tree.join("subdir"))?;
        fs::write(tree.join("file1.txt"), "content1")?;
        fs::write(tree.join("subdir/file2.txt"), "content2")?;

        delete_item(&tree, Mode::Execute, DeleteMethod::Permanent)?;

        assert!(!tree.exists());
        Ok(())
    }

    #[test]
    fn dry_run_keeps_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.txt");
        File::create(&file_path)?;

        let outcome = delete_item(&file_path, Mode::DryRun, DeleteMethod::Permanent)?;

        assert_eq!(outcome, DeleteOutcome::Simulated);
        assert!(file_path.exists());
        Ok(())
    }

    #[test]
    fn absent_target_is_success() -> Result<()> {
        let dir = tempdir()?;
        let outcome = delete_item(
            &dir.path().join("never-existed"),
            Mode::Execute,
            DeleteMethod::Permanent,
        )?;
        assert_eq!(outcome, DeleteOutcome::AlreadyAbsent);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn symlink_removed_target_kept() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("target-dir");
        fs::create_dir(&target)?;
        fs::write(target.join("keep.txt"), "keep")?;
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link)?;

        delete_item(&link, Mode::Execute, DeleteMethod::Permanent)?;

        assert!(fs::symlink_metadata(&link).is_err());
        assert!(target.join("keep.txt").exists());
        Ok(())
    }
}

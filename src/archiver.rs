use crate::error::{CleanupError, VerifyError};
use crate::model::Mode;
use crate::scanner::size::{count_entries, get_size};
use jwalk::WalkDir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Copies an entry into the archive. The engine only deletes a source after
/// `archive` succeeded and `verify_archive` accepted the copy.
pub trait Archive {
    fn archive(
        &self,
        source: &Path,
        scan_root: &Path,
        archive_dir: &Path,
        mode: Mode,
    ) -> Result<PathBuf, CleanupError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FsArchiver;

impl Archive for FsArchiver {
    fn archive(
        &self,
        source: &Path,
        scan_root: &Path,
        archive_dir: &Path,
        mode: Mode,
    ) -> Result<PathBuf, CleanupError> {
        archive_item(source, scan_root, archive_dir, mode)
    }
}

/// Destination of `source` inside `archive_dir`, keeping its path relative
/// to `scan_root`.
pub fn archive_destination(
    source: &Path,
    scan_root: &Path,
    archive_dir: &Path,
) -> Result<PathBuf, CleanupError> {
    let relative = source
        .strip_prefix(scan_root)
        .map_err(|_| CleanupError::OutsideRoot {
            path: source.to_path_buf(),
            root: scan_root.to_path_buf(),
        })?;
    Ok(archive_dir.join(relative))
}

/// Copies `source` to `archive_dir/<source relative to scan_root>`.
///
/// Dry-run performs no I/O. On failure the partial copy is left in place.
pub fn archive_item(
    source: &Path,
    scan_root: &Path,
    archive_dir: &Path,
    mode: Mode,
) -> Result<PathBuf, CleanupError> {
    let dest = archive_destination(source, scan_root, archive_dir)?;
    if mode.is_dry_run() {
        return Ok(dest);
    }

    copy_tree(source, &dest).map_err(|e| CleanupError::Archive {
        path: source.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(source = %source.display(), dest = %dest.display(), "archived");
    Ok(dest)
}

fn copy_tree(source: &Path, dest: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(source)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    if !metadata.is_dir() {
        return copy_entry(source, dest, &metadata);
    }

    fs::create_dir_all(dest)?;
    for entry in WalkDir::new(source)
        .skip_hidden(false)
        .sort(true)
        .parallelism(jwalk::Parallelism::Serial)
    {
        let entry = entry.map_err(io::Error::other)?;
        if entry.depth == 0 {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(source).map_err(io::Error::other)?;
        let target = dest.join(relative);
        let metadata = fs::symlink_metadata(&path)?;
        if metadata.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            copy_entry(&path, &target, &metadata)?;
        }
    }
    Ok(())
}

fn copy_entry(source: &Path, dest: &Path, metadata: &fs::Metadata) -> io::Result<()> {
    if metadata.file_type().is_symlink() {
        return copy_symlink(source, dest);
    }
    fs::copy(source, dest).map(|_| ())
}

#[cfg(unix)]
fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(source)?;
    if fs::symlink_metadata(dest).is_ok() {
        fs::remove_file(dest)?;
    }
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(source, dest).map(|_| ())
}

/// Coarse integrity check: the copy exists, totals the same bytes and, for
/// directories, holds the same number of entries.
pub fn verify_archive(source: &Path, dest: &Path) -> Result<(), VerifyError> {
    if fs::symlink_metadata(dest).is_err() {
        return Err(VerifyError::MissingDestination);
    }

    let expected = get_size(source);
    let actual = get_size(dest);
    if expected != actual {
        return Err(VerifyError::SizeMismatch { expected, actual });
    }

    if source.is_dir() {
        let expected = count_entries(source);
        let actual = count_entries(dest);
        if expected != actual {
            return Err(VerifyError::CountMismatch { expected, actual });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn archives_file_with_relative_structure() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("source");
        fs::create_dir_all(root.join("subdir"))?;
        let file = root.join("subdir/test.txt");
        fs::write(&file, "test content")?;
        let archive = dir.path().join("archive");

        let dest = archive_item(&file, &root, &archive, Mode::Execute)?;

        assert_eq!(dest, archive.join("subdir/test.txt"));
        assert_eq!(fs::read_to_string(&dest)?, "test content");
        assert!(file.exists());
        Ok(())
    }

    #[test]
    fn archives_directory_tree() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("source");
        let project = root.join("projects/test_dir");
        fs::create_dir_all(project.join("subdir"))?;
        fs::write(project.join("file1.txt"), "content1")?;
        fs::write(project.join("subdir/file2.txt"), "content2")?;
        let archive = dir.path().join("archive");

        let dest = archive_item(&project, &root, &archive, Mode::Execute)?;

        assert_eq!(dest, archive.join("projects/test_dir"));
        let file2 = dest.join("subdir/file2.txt");
        assert_eq!(fs::read_to_string(dest.join("file1.txt"))?, "content1");
        assert_eq!(fs::read_to_string(file2)?, "content2");
        assert_eq!(verify_archive(&project, &dest), Ok(()));
        Ok(())
    }

    #[test]
    fn dry_run_copies_nothing() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("source");
        fs::create_dir_all(&root)?;
        let file = root.join("test.txt");
        fs::write(&file, "test")?;
        let archive = dir.path().join("archive");

        let dest = archive_item(&file, &root, &archive, Mode::DryRun)?;

        assert_eq!(dest, archive.join("test.txt"));
        assert!(!archive.exists());
        Ok(())
    }

    #[test]
    fn source_outside_root_is_rejected() {
        let result = archive_item(
            Path::new("/elsewhere/file"),
            Path::new("/root-dir"),
            Path::new("/archive"),
            Mode::DryRun,
        );
        assert!(matches!(result, Err(CleanupError::OutsideRoot { .. })));
    }

    #[test]
    fn missing_source_fails_without_destination_side_effects() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("source");
        fs::create_dir_all(&root)?;
        let archive = dir.path().join("archive");

        let result = archive_item(&root.join("gone"), &root, &archive, Mode::Execute);
        assert!(matches!(result, Err(CleanupError::Archive { .. })));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_recreated_not_followed() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("source");
        let project = root.join("p");
        fs::create_dir_all(&project)?;
        let outside = dir.path().join("outside.bin");
        fs::write(&outside, [0u8; 4096])?;
        std::os::unix::fs::symlink(&outside, project.join("link"))?;
        let archive = dir.path().join("archive");

        let dest = archive_item(&project, &root, &archive, Mode::Execute)?;

        assert!(dest.join("link").is_symlink());
        assert_eq!(verify_archive(&project, &dest), Ok(()));
        Ok(())
    }

    #[test]
    fn verify_matching_copy() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("source/test.txt");
        fs::create_dir_all(dir.path().join("source"))?;
        fs::write(&source, "x".repeat(1024))?;
        let dest = dir.path().join("dest/test.txt");
        fs::create_dir_all(dir.path().join("dest"))?;
        fs::copy(&source, &dest)?;

        assert_eq!(verify_archive(&source, &dest), Ok(()));
        Ok(())
    }

    #[test]
    fn verify_size_mismatch() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("source.txt");
        fs::write(&source, "x".repeat(1024))?;
        let dest = dir.path().join("dest.txt");
        fs::write(&dest, "x".repeat(512))?;

        assert_eq!(
            verify_archive(&source, &dest),
            Err(VerifyError::SizeMismatch {
                expected: 1024,
                actual: 512
            })
        );
        Ok(())
    }

    #[test]
    fn verify_count_mismatch() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("source");
        fs::create_dir_all(source.join("empty-subdir"))?;
        fs::write(source.join("a.txt"), "abc")?;
        let dest = dir.path().join("dest");
        fs::create_dir_all(&dest)?;
        fs::write(dest.join("a.txt"), "abc")?;

        assert_eq!(
            verify_archive(&source, &dest),
            Err(VerifyError::CountMismatch {
                expected: 2,
                actual: 1
            })
        );
        Ok(())
    }

    #[test]
    fn verify_missing_destination() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("test.txt");
        fs::write(&source, "test content")?;

        let dest = dir.path().join("dest/test.txt");
        assert_eq!(
            verify_archive(&source, &dest),
            Err(VerifyError::MissingDestination)
        );
        Ok(())
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("workspace root not found: {}", .0.display())]
    MissingWorkspace(PathBuf),

    #[error("archive parent directory not found: {}", .0.display())]
    MissingArchiveParent(PathBuf),

    #[error("{} is not under scan root {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("failed to archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("archive verification failed for {}: {reason}", .path.display())]
    Verify { path: PathBuf, reason: VerifyError },

    #[error("failed to delete {}: {source}", .path.display())]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to move {} to trash: {source}", .path.display())]
    Trash { path: PathBuf, source: trash::Error },

    #[error("git {command} failed in {}: {stderr}", .repo.display())]
    Git {
        repo: PathBuf,
        command: String,
        stderr: String,
    },

    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("archived copy is missing")]
    MissingDestination,

    #[error("size mismatch (expected {expected} bytes, archived {actual} bytes)")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("entry count mismatch (expected {expected}, archived {actual})")]
    CountMismatch { expected: u64, actual: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Veto {
    #[error("protection marker {} present", .0.display())]
    Marker(PathBuf),

    #[error("current working directory")]
    WorkingDirectory,

    #[error("system path")]
    SystemRoot,

    #[error("allowlisted by rule {0}")]
    Allowlisted(String),
}

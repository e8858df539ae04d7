//! Repository-scoped maintenance: repack, prune worktrees, expire reflog.

use crate::error::CleanupError;
use crate::scanner::{self, size::get_size};
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn is_repository(path: &Path) -> bool {
    path.join(".git").is_dir()
}

/// Repositories under each root (the root itself included). Nested
/// repositories inside a found one are not reported separately.
pub fn find_repositories(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut repos = Vec::new();
    for root in roots {
        if is_repository(root) {
            repos.push(root.clone());
            continue;
        }
        repos.extend(scanner::find_matching_dirs(root, is_repository));
    }
    repos
}

pub fn git_dir_size(repo: &Path) -> u64 {
    get_size(&repo.join(".git"))
}

pub fn packed_size(repo: &Path) -> u64 {
    get_size(&repo.join(".git/objects/pack"))
}

/// One maintenance step. `destructive` steps discard history that may be
/// the only copy of unpushed work.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub args: &'static [&'static str],
    pub destructive: bool,
}

pub const REPACK: Step = Step {
    args: &["repack", "-a", "-d", "-f", "--depth=250", "--window=250"],
    destructive: false,
};
pub const PRUNE_WORKTREES: Step = Step {
    args: &["worktree", "prune"],
    destructive: false,
};
pub const EXPIRE_REFLOG: Step = Step {
    args: &["reflog", "expire", "--expire=30.days.ago", "--all"],
    destructive: true,
};
pub const PRUNE_OBJECTS: Step = Step {
    args: &["prune", "--expire=now"],
    destructive: true,
};

pub const STEPS: [Step; 4] = [REPACK, PRUNE_WORKTREES, EXPIRE_REFLOG, PRUNE_OBJECTS];

pub fn run_step(repo: &Path, step: Step) -> Result<(), CleanupError> {
    tracing::debug!(repo = %repo.display(), "git {}", step.args.join(" "));
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(step.args)
        .output()
        .map_err(|e| git_error(repo, step, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(git_error(repo, step, stderr));
    }
    Ok(())
}

fn git_error(repo: &Path, step: Step, stderr: String) -> CleanupError {
    CleanupError::Git {
        repo: repo.to_path_buf(),
        command: step.args.join(" "),
        stderr,
    }
}

/// A repository at `repo` with one commit and no remote.
#[cfg(test)]
pub fn init_repo_with_commit(repo: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(repo)?;
    std::fs::write(repo.join("README"), "hello")?;
    let commands: [&[&str]; 3] = [
        &["init", "-q"],
        &["add", "README"],
        &[
            "-c",
            "user.name=t",
            "-c",
            "user.email=t@t",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "-m",
            "init",
        ],
    ];
    for args in commands {
        let status = Command::new("git").arg("-C").arg(repo).args(args).status()?;
        anyhow::ensure!(status.success(), "git {} failed", args.join(" "));
    }
    Ok(())
}

pub mod age;
pub mod size;

use crate::constants::MAX_SCAN_DEPTH;
use jwalk::WalkDir;
use std::fs;
use std::path::{Path, PathBuf};

const GIT_DIR: &str = ".git";

/// Recursively searches `root` for directories accepted by `matcher`.
///
/// Matched directories and `.git` are not descended into, so nested
/// `node_modules` or repositories inside a found repository are reported
/// once through their outermost match.
pub fn find_matching_dirs(root: &Path, matcher: fn(&Path) -> bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .skip_hidden(false)
        .max_depth(MAX_SCAN_DEPTH)
        .process_read_dir(move |_depth, _path, _state, children| {
            for entry in children.iter_mut().flatten() {
                if entry.file_type().is_dir()
                    && (entry.file_name().to_string_lossy() == GIT_DIR || matcher(&entry.path()))
                {
                    entry.read_children_path = None;
                }
            }
        });

    let mut found: Vec<PathBuf> = walker
        .into_iter()
        .flatten()
        .filter(|e| e.depth > 0 && e.file_type().is_dir())
        .map(|e| e.path())
        .filter(|p| matcher(p))
        .collect();

    found.sort();
    found
}

/// Recursively collects files (and symlinks) whose name satisfies `matcher`.
pub fn find_matching_files(root: &Path, matcher: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .skip_hidden(false)
        .max_depth(MAX_SCAN_DEPTH)
        .process_read_dir(|_depth, _path, _state, children| {
            for entry in children.iter_mut().flatten() {
                if entry.file_name().to_string_lossy() == GIT_DIR {
                    entry.read_children_path = None;
                }
            }
        });

    let mut found: Vec<PathBuf> = walker
        .into_iter()
        .flatten()
        .filter(|e| e.depth > 0 && !e.file_type().is_dir())
        .filter(|e| matcher(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();

    found.sort();
    found
}

/// Immediate children of `dir`, sorted. Missing or unreadable directories
/// yield an empty list and unreadable entries are skipped.
pub fn list_children(dir: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return vec![];
    };
    let mut children: Vec<PathBuf> = read_dir
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect();
    children.sort();
    children
}

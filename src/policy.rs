//! Disposition rules for the workspace, dependency and build cleanups.

use crate::constants::{ARCHIVE_DIRS, DELETE_ONLY_DIRS, TEMP_PATTERNS};
use crate::error::CleanupError;
use crate::model::{CleanupConfig, Disposition, Entry};
use crate::scanner::{self, age};
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A batch of candidates sharing one disposition. Confirmation "all" applies
/// to the rest of a category.
#[derive(Debug)]
pub struct Category {
    pub name: String,
    pub scan_root: PathBuf,
    pub entries: Vec<Entry>,
}

/// A name pattern from the delete-immediately list.
#[derive(Debug)]
pub enum TempPattern {
    /// Every entry inside a directory of this name at the workspace root.
    Directory(String),
    /// File names matching a shell-style glob, anywhere under the root.
    Glob { pattern: String, regex: Regex },
}

impl TempPattern {
    pub fn parse(pattern: &str) -> Result<Self, CleanupError> {
        if !pattern.contains(['*', '?']) && !pattern.starts_with('.') {
            return Ok(Self::Directory(pattern.to_string()));
        }
        let regex = glob_to_regex(pattern).map_err(|source| CleanupError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::Glob {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Self::Directory(dir) => dir == name,
            Self::Glob { regex, .. } => regex.is_match(name),
        }
    }
}

fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}

/// The fixed rule lists of the workspace archive-and-reclaim cleanup.
#[derive(Debug)]
pub struct WorkspacePolicy {
    archive_dirs: Vec<String>,
    delete_only_dirs: Vec<String>,
    temp_patterns: Vec<TempPattern>,
}

impl WorkspacePolicy {
    pub fn new() -> Result<Self, CleanupError> {
        Ok(Self {
            archive_dirs: ARCHIVE_DIRS.iter().map(ToString::to_string).collect(),
            delete_only_dirs: DELETE_ONLY_DIRS.iter().map(ToString::to_string).collect(),
            temp_patterns: TEMP_PATTERNS
                .iter()
                .map(|p| TempPattern::parse(p))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Classifies a path under `root`. `None` means the engine leaves it alone.
    pub fn disposition_for(&self, root: &Path, path: &Path) -> Option<Disposition> {
        let relative = path.strip_prefix(root).ok()?;
        let mut components = relative.components();
        let first = components
            .next()?
            .as_os_str()
            .to_string_lossy()
            .into_owned();
        let is_top_level = components.next().is_none();
        let name = path.file_name()?.to_string_lossy();

        let temp = self.temp_patterns.iter().any(|pattern| match pattern {
            TempPattern::Directory(dir) => *dir == first && !is_top_level,
            TempPattern::Glob { .. } => pattern.matches_name(&name),
        });
        if temp {
            return Some(Disposition::DeleteImmediately);
        }
        if is_top_level {
            return None;
        }
        if self.archive_dirs.contains(&first) {
            return Some(Disposition::ArchiveThenDelete);
        }
        if self.delete_only_dirs.contains(&first) {
            return Some(Disposition::DeleteOnly);
        }
        None
    }

    /// Candidate categories in processing order: archive directories,
    /// delete-only directories, then delete-immediately patterns.
    ///
    /// A path inside an entry of an earlier category is dropped, so nothing is
    /// both archived with its parent and deleted on its own.
    pub fn enumerate(&self, config: &CleanupConfig) -> Vec<Category> {
        let root = &config.workspace_root;
        let mut categories: Vec<Category> = Vec::new();

        for dir in self.archive_dirs.iter().chain(&self.delete_only_dirs) {
            let entries = age::find_old_items(&root.join(dir), config.cutoff)
                .iter()
                .filter_map(|path| self.entry(config, path))
                .collect();
            categories.push(Category {
                name: dir.clone(),
                scan_root: root.clone(),
                entries,
            });
        }

        for pattern in &self.temp_patterns {
            let paths = match pattern {
                TempPattern::Directory(dir) => scanner::list_children(&root.join(dir)),
                TempPattern::Glob { .. } => {
                    scanner::find_matching_files(root, |name| pattern.matches_name(name))
                }
            };
            let entries = paths
                .iter()
                .filter(|path| !is_claimed(&categories, path))
                .filter_map(|path| self.entry(config, path))
                .collect();
            categories.push(Category {
                name: pattern_label(pattern),
                scan_root: root.clone(),
                entries,
            });
        }

        categories
    }

    fn entry(&self, config: &CleanupConfig, path: &Path) -> Option<Entry> {
        let disposition = self.disposition_for(&config.workspace_root, path)?;
        let entry = Entry::from_path(path, disposition)?;
        (!disposition.is_age_filtered() || age::is_older_than(entry.modified, config.cutoff))
            .then_some(entry)
    }
}

fn is_claimed(categories: &[Category], path: &Path) -> bool {
    categories
        .iter()
        .flat_map(|c| &c.entries)
        .any(|e| path.starts_with(&e.path))
}

fn pattern_label(pattern: &TempPattern) -> String {
    match pattern {
        TempPattern::Directory(dir) => dir.clone(),
        TempPattern::Glob { pattern, .. } => pattern.clone(),
    }
}

/// A regenerable directory and the project manifests that must sit beside it.
struct TargetRule {
    name: &'static str,
    /// Empty means the directory name alone is enough.
    manifests: &'static [&'static str],
}

const fn rule(name: &'static str, manifests: &'static [&'static str]) -> TargetRule {
    TargetRule { name, manifests }
}

impl TargetRule {
    fn matches(&self, name: &OsStr, parent: &Path) -> bool {
        if name != self.name {
            return false;
        }
        self.manifests.is_empty() || self.manifests.iter().any(|m| parent.join(m).exists())
    }
}

const PYTHON_MANIFESTS: &[&str] = &["pyproject.toml", "requirements.txt", "setup.py", "Pipfile"];
const NODE_MANIFESTS: &[&str] = &["package.json"];
const GRADLE_MANIFESTS: &[&str] = &["build.gradle", "build.gradle.kts"];
const BUILD_MANIFESTS: &[&str] = &["package.json", "build.gradle", "build.gradle.kts"];

const DEPENDENCY_RULES: &[TargetRule] = &[
    rule("node_modules", NODE_MANIFESTS),
    rule("bower_components", &["bower.json"]),
    rule(".venv", PYTHON_MANIFESTS),
    rule("venv", PYTHON_MANIFESTS),
    rule(".bundle", &["Gemfile"]),
];

const BUILD_RULES: &[TargetRule] = &[
    rule("target", &["Cargo.toml"]),
    rule("dist", NODE_MANIFESTS),
    rule("build", BUILD_MANIFESTS),
    rule(".next", NODE_MANIFESTS),
    rule(".nuxt", NODE_MANIFESTS),
    rule(".turbo", NODE_MANIFESTS),
    rule(".gradle", GRADLE_MANIFESTS),
    rule("__pycache__", &[]),
    rule(".pytest_cache", PYTHON_MANIFESTS),
    rule(".mypy_cache", PYTHON_MANIFESTS),
    rule(".tox", PYTHON_MANIFESTS),
];

fn matches_rules(path: &Path, rules: &[TargetRule]) -> bool {
    let (Some(name), Some(parent)) = (path.file_name(), path.parent()) else {
        return false;
    };
    rules.iter().any(|rule| rule.matches(name, parent))
}

pub fn is_dependency_dir(path: &Path) -> bool {
    matches_rules(path, DEPENDENCY_RULES)
}

pub fn is_build_dir(path: &Path) -> bool {
    matches_rules(path, BUILD_RULES)
}

/// Old directories under each root accepted by `matcher`, one category per
/// root. Every match is `DeleteOnly`.
pub fn enumerate_targets(
    roots: &[PathBuf],
    matcher: fn(&Path) -> bool,
    cutoff: std::time::SystemTime,
) -> Vec<Category> {
    roots
        .iter()
        .map(|root| {
            let entries = scanner::find_matching_dirs(root, matcher)
                .iter()
                .filter(|path| age::is_old(path, cutoff))
                .filter_map(|path| Entry::from_path(path, Disposition::DeleteOnly))
                .collect();
            Category {
                name: root.display().to_string(),
                scan_root: root.clone(),
                entries,
            }
        })
        .collect()
}

//! Cache cleanup candidates and their safety tiers.

use crate::constants::{
    DANGER_KEYWORDS, DATABASE_EXTENSIONS, KNOWN_TOOL_CACHES, LIBRARY_CACHES,
    REVIEW_SAMPLE_SIZE, SAFE_CACHE_NAMES, USER_CACHE,
};
use crate::model::{Disposition, Entry};
use crate::scanner::list_children;
use clap::ValueEnum;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafetyTier {
    /// Known package or build-tool cache.
    Safe,
    /// Unrecognized cache; needs a per-item decision.
    Review,
    /// Possibly holds credentials or databases. Listed, never removed.
    Danger,
}

impl SafetyTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Review => "REVIEW",
            Self::Danger => "DANGER",
        }
    }
}

/// `--category` filter for the cache cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TierFilter {
    Safe,
    Review,
    Danger,
    #[default]
    All,
}

impl TierFilter {
    pub const fn includes(self, tier: SafetyTier) -> bool {
        matches!(
            (self, tier),
            (Self::All, _)
                | (Self::Safe, SafetyTier::Safe)
                | (Self::Review, SafetyTier::Review)
                | (Self::Danger, SafetyTier::Danger)
        )
    }
}

#[derive(Debug, Clone)]
pub struct CacheCandidate {
    pub entry: Entry,
    pub tier: SafetyTier,
    /// First few names inside the cache, shown for review.
    pub sample: Vec<String>,
}

/// A cache path that is allowed to reach the deleter.
///
/// Only constructible from `Safe` and `Review` candidates.
#[derive(Debug)]
pub struct RemovableCache<'a> {
    candidate: &'a CacheCandidate,
    needs_confirmation: bool,
}

impl<'a> RemovableCache<'a> {
    pub fn new(candidate: &'a CacheCandidate) -> Option<Self> {
        let needs_confirmation = match candidate.tier {
            SafetyTier::Safe => false,
            SafetyTier::Review => true,
            SafetyTier::Danger => return None,
        };
        Some(Self {
            candidate,
            needs_confirmation,
        })
    }

    pub const fn candidate(&self) -> &CacheCandidate {
        self.candidate
    }

    pub fn path(&self) -> &Path {
        &self.candidate.entry.path
    }

    /// Review-tier caches are confirmed even when `--yes` was given.
    pub const fn needs_confirmation(&self) -> bool {
        self.needs_confirmation
    }
}

/// Default cache locations under `home`: children of `~/.cache` and
/// `~/Library/Caches`, plus the known tool caches themselves.
pub fn default_candidate_paths(home: &Path) -> Vec<(PathBuf, PathBuf)> {
    let mut paths = Vec::new();

    for root in [home.join(USER_CACHE), home.join(LIBRARY_CACHES)] {
        for child in list_children(&root) {
            paths.push((root.clone(), child));
        }
    }

    for known in KNOWN_TOOL_CACHES {
        let path = home.join(known);
        if path.exists() {
            paths.push((home.to_path_buf(), path));
        }
    }

    paths
}

/// Children of each `--path` root.
pub fn candidate_paths_under(roots: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    roots
        .iter()
        .flat_map(|root| {
            list_children(root)
                .into_iter()
                .map(move |child| (root.clone(), child))
        })
        .collect()
}

/// Classifies every candidate and orders them by tier, then path.
pub fn scan(paths: &[(PathBuf, PathBuf)]) -> Vec<CacheCandidate> {
    let home = dirs::home_dir();
    let mut candidates: Vec<CacheCandidate> = paths
        .iter()
        .filter_map(|(root, path)| {
            let entry = Entry::from_path(path, Disposition::DeleteOnly)?;
            let tier = classify(home.as_deref(), root, path);
            let sample = if tier == SafetyTier::Review {
                sample_contents(path)
            } else {
                vec![]
            };
            Some(CacheCandidate {
                entry,
                tier,
                sample,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.tier
            .cmp(&b.tier)
            .then_with(|| a.entry.path.cmp(&b.entry.path))
    });
    candidates
}

/// Danger checks run first so that a sensitive path with a familiar
/// cache name is still never offered for removal.
///
/// Keywords are matched against the whole path below `home` (the full path
/// when it lies elsewhere), so a sensitive scan root taints every child.
pub fn classify(home: Option<&Path>, root: &Path, path: &Path) -> SafetyTier {
    let below_home = home
        .and_then(|home| path.strip_prefix(home).ok())
        .unwrap_or(path);
    if is_dangerous(below_home) || holds_database(path) {
        return SafetyTier::Danger;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let relative = path.strip_prefix(root).unwrap_or(path);
    let known = SAFE_CACHE_NAMES.contains(&name.as_str())
        || KNOWN_TOOL_CACHES
            .iter()
            .any(|known| relative == Path::new(known));
    if known {
        SafetyTier::Safe
    } else {
        SafetyTier::Review
    }
}

fn is_dangerous(path: &Path) -> bool {
    let lowered = path.to_string_lossy().to_lowercase();
    DANGER_KEYWORDS.iter().any(|k| lowered.contains(k)) || has_database_extension(path)
}

fn has_database_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| DATABASE_EXTENSIONS.contains(&e.as_str()))
}

fn holds_database(path: &Path) -> bool {
    if !path.is_dir() || path.is_symlink() {
        return false;
    }
    list_children(path)
        .iter()
        .any(|p| has_database_extension(p))
}

fn sample_contents(path: &Path) -> Vec<String> {
    list_children(path)
        .iter()
        .take(REVIEW_SAMPLE_SIZE)
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect()
}

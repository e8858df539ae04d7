use crate::constants::{ALLOWLIST_FILE, APP_DIR};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// User-maintained list of paths that must never be archived or removed.
#[derive(Debug, Default, Clone)]
pub struct Allowlist {
    rules: Vec<PathBuf>,
}

impl Allowlist {
    pub fn new(rules: Vec<PathBuf>) -> Self {
        Self { rules }
    }

    /// Loads the allowlist from `<config-dir>/reclaim/allowlist.txt`.
    /// Returns an empty allowlist if the file doesn't exist or errors.
    pub fn load() -> Self {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(ALLOWLIST_FILE))
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(file) = fs::File::open(path) else {
            return Self::default();
        };

        let rules = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .map(|line| line.trim().to_string())
            // Skip empty lines and comments
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| crate::config::expand_tilde(&line))
            .collect();

        Self::new(rules)
    }

    /// Returns the rule covering `path`: the rule itself or anything below it.
    pub fn matching_rule(&self, path: &Path) -> Option<&Path> {
        self.rules
            .iter()
            .find(|rule| path.starts_with(rule))
            .map(PathBuf::as_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn matches_rule_and_descendants() {
        let allowlist = Allowlist::new(vec![
            PathBuf::from("/Users/test/Secret"),
            PathBuf::from("/Users/test/Projects/Keep"),
        ]);

        let covered = |path: &str| allowlist.matching_rule(Path::new(path)).is_some();

        assert!(covered("/Users/test/Secret"));
        assert!(covered("/Users/test/Secret/file.txt"));
        assert!(covered("/Users/test/Projects/Keep"));

        assert!(!covered("/Users/test/SecretSauce"));
        assert!(!covered("/Users/test/Projects/DeleteMe"));
        assert!(!covered("/Users/test/Public"));
    }

    #[test]
    fn load_skips_comments_and_blank_lines() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("allowlist.txt");
        let mut file = fs::File::create(&path)?;
        writeln!(file, "# keep these")?;
        writeln!(file)?;
        writeln!(file, "  /data/important  ")?;

        let allowlist = Allowlist::load_from(&path);
        assert_eq!(allowlist.rules, vec![PathBuf::from("/data/important")]);
        Ok(())
    }

    #[test]
    fn load_missing_file_is_empty() {
        let path = Path::new("/non/existent/reclaim_allowlist.txt");
        let allowlist = Allowlist::load_from(path);
        assert!(allowlist.rules.is_empty());
    }
}

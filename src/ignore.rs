use std::fs;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use tracing::debug;

use crate::error::{Error, IoResultExt, Result};
use crate::repo::{IGNORE_FILE, META_DIR};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// glob patterns deciding which workspace paths are skipped
///
/// a pattern matches a path when it matches the whole relative path, any
/// leading directory prefix of it, or any single component. the metadata
/// directory is always ignored.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

impl IgnoreRules {
    /// parse newline separated patterns; blank and `#` lines are skipped
    pub fn parse(content: &str) -> Result<Self> {
        let mut rules = Self::default();
        for line in content.lines() {
            rules.push(line)?;
        }
        Ok(rules)
    }

    /// read the workspace ignore file (if any) plus extra patterns
    pub fn load(workdir: &Path, extra: &[String]) -> Result<Self> {
        let path = workdir.join(IGNORE_FILE);
        let mut rules = if path.is_file() {
            let content = fs::read_to_string(&path).with_path(&path)?;
            Self::parse(&content)?
        } else {
            Self::default()
        };

        for pattern in extra {
            rules.push(pattern)?;
        }

        debug!(patterns = rules.patterns.len(), "loaded ignore rules");
        Ok(rules)
    }

    /// add a single pattern line
    pub fn push(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let pattern = line.trim_end_matches('/');
        let compiled = Pattern::new(pattern).map_err(|e| Error::InvalidIgnorePattern {
            pattern: line.to_string(),
            message: e.to_string(),
        })?;
        self.patterns.push(compiled);
        Ok(())
    }

    /// number of active patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// no patterns configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// decide whether a `/` separated workspace-relative path is ignored
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let components: Vec<&str> = rel_path.split('/').filter(|c| !c.is_empty()).collect();
        if components.first() == Some(&META_DIR) {
            return true;
        }

        let mut prefix = String::new();
        for component in &components {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(component);

            let hit = self.patterns.iter().any(|p| {
                p.matches_with(component, MATCH_OPTIONS) || p.matches_with(&prefix, MATCH_OPTIONS)
            });
            if hit {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let rules = IgnoreRules::parse("# build output\n\n   \n*.log\n").unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_wildcard_matches_nested_files() {
        let rules = IgnoreRules::parse("*.log").unwrap();
        assert!(rules.is_ignored("debug.log"));
        assert!(rules.is_ignored("logs/2024/debug.log"));
        assert!(!rules.is_ignored("src/main.rs"));
    }

    #[test]
    fn test_directory_pattern_covers_contents() {
        let rules = IgnoreRules::parse("target/\nnode_modules").unwrap();
        assert!(rules.is_ignored("target"));
        assert!(rules.is_ignored("target/debug/app"));
        assert!(rules.is_ignored("web/node_modules/pkg/index.js"));
        assert!(!rules.is_ignored("targets.txt"));
    }

    #[test]
    fn test_path_pattern() {
        let rules = IgnoreRules::parse("docs/*.tmp").unwrap();
        assert!(rules.is_ignored("docs/draft.tmp"));
        assert!(!rules.is_ignored("src/draft.tmp"));
    }

    #[test]
    fn test_metadata_dir_always_ignored() {
        let rules = IgnoreRules::default();
        assert!(rules.is_ignored(".cube"));
        assert!(rules.is_ignored(".cube/objects/ab/cdef"));
        assert!(!rules.is_ignored(".cubeignore"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = IgnoreRules::parse("[unclosed");
        assert!(matches!(result, Err(Error::InvalidIgnorePattern { .. })));
    }

    #[test]
    fn test_load_from_workdir_with_extra() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(IGNORE_FILE), "*.bak\n").unwrap();

        let rules = IgnoreRules::load(dir.path(), &["*.tmp".to_string()]).unwrap();
        assert!(rules.is_ignored("a.bak"));
        assert!(rules.is_ignored("b.tmp"));
        assert!(!rules.is_ignored("c.txt"));
    }

    #[test]
    fn test_load_without_file() {
        let dir = tempdir().unwrap();
        let rules = IgnoreRules::load(dir.path(), &[]).unwrap();
        assert!(rules.is_empty());
    }
}

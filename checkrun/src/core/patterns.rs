//! Per-scope ignore patterns.
//!
//! Patterns are evaluated root-to-scope in declaration order; the last
//! matching pattern decides. A leading `!` re-includes what an earlier
//! pattern excluded.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

use crate::core::scope::ScopeTree;
use crate::core::types::ScopeId;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    include: bool,
}

#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    rules: Vec<Rule>,
}

impl IgnoreSet {
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut rules = Vec::with_capacity(patterns.len());
        for raw in patterns {
            let raw = raw.as_ref();
            let (include, body) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            let pattern =
                Pattern::new(body).with_context(|| format!("invalid ignore pattern '{raw}'"))?;
            rules.push(Rule { pattern, include });
        }
        Ok(Self { rules })
    }

    /// Every pattern along the lineage of `scope`, root first.
    pub fn for_scope(tree: &ScopeTree, scope: ScopeId) -> Result<Self> {
        let mut patterns: Vec<&str> = Vec::new();
        for id in tree.lineage(scope).into_iter().rev() {
            patterns.extend(tree.scope(id).ignores().iter().map(String::as_str));
        }
        Self::parse(&patterns)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `path` is tested both as given and relative to `base`.
    pub fn is_excluded(&self, path: &Path, base: &Path) -> bool {
        let relative = path.strip_prefix(base).unwrap_or(path);
        let mut excluded = false;
        for rule in &self.rules {
            if rule.pattern.matches_path_with(relative, MATCH_OPTIONS)
                || rule.pattern.matches_path_with(path, MATCH_OPTIONS)
            {
                excluded = !rule.include;
            }
        }
        excluded
    }

    pub fn filter(&self, targets: &[PathBuf], base: &Path) -> Vec<PathBuf> {
        if self.rules.is_empty() {
            return targets.to_vec();
        }
        targets
            .iter()
            .filter(|target| !self.is_excluded(target, base))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_matching_pattern_wins() {
        let set = IgnoreSet::parse(&["vendor/**", "!vendor/keep.js"]).expect("patterns");
        let base = Path::new("/repo");
        assert!(set.is_excluded(Path::new("/repo/vendor/lib.js"), base));
        assert!(!set.is_excluded(Path::new("/repo/vendor/keep.js"), base));
        assert!(!set.is_excluded(Path::new("/repo/src/main.js"), base));
    }

    #[test]
    fn lineage_patterns_apply_root_first() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.excludes(root, "*.min.js");
        let js = tree.add_scope(root, "js");
        tree.includes(js, "app.min.js");

        let set = IgnoreSet::for_scope(&tree, js).expect("patterns");
        let targets = vec![
            PathBuf::from("app.min.js"),
            PathBuf::from("lib.min.js"),
            PathBuf::from("app.js"),
        ];
        let kept = set.filter(&targets, Path::new("."));
        assert_eq!(kept, vec![PathBuf::from("app.min.js"), PathBuf::from("app.js")]);
    }

    #[test]
    fn bad_pattern_is_an_error() {
        assert!(IgnoreSet::parse(&["[z-a"]).is_err());
    }
}

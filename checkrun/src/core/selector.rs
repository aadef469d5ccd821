//! Grep-style selection of checkers by full title.

use anyhow::{Context, Result};
use regex::Regex;

/// A regex over checker full titles, optionally inverted.
///
/// With no pattern every title matches.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pattern: Option<Regex>,
    invert: bool,
}

impl Selection {
    /// Matches every checker.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(pattern: Regex, invert: bool) -> Self {
        Self {
            pattern: Some(pattern),
            invert,
        }
    }

    /// Compile a user-supplied pattern.
    pub fn from_pattern(pattern: &str, invert: bool) -> Result<Self> {
        let pattern =
            Regex::new(pattern).with_context(|| format!("invalid grep pattern '{pattern}'"))?;
        Ok(Self::new(pattern, invert))
    }

    /// Match `text` literally anywhere in the title.
    pub fn literal(text: &str, invert: bool) -> Result<Self> {
        let pattern = Regex::new(&regex::escape(text))
            .with_context(|| format!("invalid grep text '{text}'"))?;
        Ok(Self::new(pattern, invert))
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_ref().map_or(".*", Regex::as_str)
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    pub fn matches(&self, full_title: &str) -> bool {
        let hit = self
            .pattern
            .as_ref()
            .is_none_or(|pattern| pattern.is_match(full_title));
        hit != self.invert
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_flips_the_match() {
        let selection = Selection::from_pattern("^js ", false).expect("regex");
        assert!(selection.matches("js text"));
        assert!(!selection.matches("json schema"));
        let inverted = selection.inverted();
        assert!(!inverted.matches("js text"));
        assert!(inverted.matches("json schema"));
    }

    #[test]
    fn literal_escapes_metacharacters() {
        let selection = Selection::literal("a.b(c)", false).expect("literal");
        assert!(selection.matches("scope a.b(c) text"));
        assert!(!selection.matches("scope axb(c) text"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = Selection::from_pattern("(", false).expect_err("invalid");
        assert!(err.to_string().contains("invalid grep pattern"));
    }
}

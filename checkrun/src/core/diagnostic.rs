//! Diagnostic model produced by checkers.
//!
//! The scheduler only needs a checker's result to expose an ordered sequence
//! of diagnostics. Everything else here exists for formatters and reporters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How bad a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("Warning"),
            Severity::Error => f.write_str("Error"),
        }
    }
}

/// One reported problem at a location in a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file_path: String,
    /// 1-based line, 0 when unknown.
    #[serde(default)]
    pub line: usize,
    /// 1-based column, 0 when unknown.
    #[serde(default)]
    pub column: usize,
    pub severity: Severity,
    /// Set when the target could not be processed at all (e.g. parse failure).
    #[serde(default)]
    pub fatal: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl Diagnostic {
    pub fn error(file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            line: 0,
            column: 0,
            severity: Severity::Error,
            fatal: false,
            message: message.into(),
            rule_id: None,
        }
    }

    pub fn warning(file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(file_path, message)
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self.severity = Severity::Error;
        self
    }

    /// Fatal diagnostics always count as errors.
    pub fn is_error(&self) -> bool {
        self.fatal || self.severity == Severity::Error
    }
}

/// Result of checking one or more targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// Merge per-target reports into one, grouped by file path.
    ///
    /// The sort is stable, so each target keeps its own diagnostic order no
    /// matter which target finished first.
    pub fn merge(reports: impl IntoIterator<Item = CheckReport>) -> Self {
        let mut diagnostics: Vec<Diagnostic> = reports
            .into_iter()
            .flat_map(|report| report.diagnostics)
            .collect();
        diagnostics.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_groups_by_path_and_keeps_per_target_order() {
        let c = CheckReport::new(vec![Diagnostic::error("c.js", "c1").at(1, 1)]);
        let a = CheckReport::new(vec![
            Diagnostic::warning("a.js", "a2").at(9, 1),
            Diagnostic::error("a.js", "a1").at(2, 4),
        ]);
        let b = CheckReport::new(vec![Diagnostic::error("b.js", "b1")]);

        let merged = CheckReport::merge(vec![c, a, b]);
        let messages: Vec<&str> = merged
            .diagnostics
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(messages, vec!["a2", "a1", "b1", "c1"]);
    }

    #[test]
    fn fatal_counts_as_error() {
        let report = CheckReport::new(vec![
            Diagnostic::warning("x", "w"),
            Diagnostic::warning("x", "f").fatal(),
        ]);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }
}

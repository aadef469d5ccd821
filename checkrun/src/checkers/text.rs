//! Line-oriented style rules over plain text files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::core::checker::Checker;
use crate::core::diagnostic::{CheckReport, Diagnostic, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineBreak {
    #[serde(rename = "LF")]
    Lf,
    #[serde(rename = "CRLF")]
    Crlf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKeyword {
    Tab,
}

/// A width in spaces, or `"tab"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Indentation {
    Spaces(usize),
    Tabs(TabKeyword),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub maximum_line_length: Option<usize>,
    pub line_breaks: Option<LineBreak>,
    pub indentation: Option<Indentation>,
    /// Report whitespace at the end of a line.
    pub trailing_whitespace: bool,
    /// Require the file to end with a line break.
    pub final_newline: bool,
    pub severity: Severity,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            maximum_line_length: None,
            line_breaks: None,
            indentation: None,
            trailing_whitespace: false,
            final_newline: false,
            severity: Severity::Error,
        }
    }
}

impl TextOptions {
    pub fn validate(&self) -> Result<()> {
        if self.maximum_line_length == Some(0) {
            bail!("maximum_line_length must be > 0");
        }
        if self.indentation == Some(Indentation::Spaces(0)) {
            bail!("indentation width must be > 0");
        }
        Ok(())
    }
}

pub struct TextChecker {
    title: String,
    options: TextOptions,
    globals: Vec<String>,
}

impl TextChecker {
    pub fn new(title: impl Into<String>, options: TextOptions) -> Self {
        Self {
            title: title.into(),
            options,
            globals: Vec::new(),
        }
    }

    pub fn with_globals(mut self, globals: Vec<String>) -> Self {
        self.globals = globals;
        self
    }

    /// Run every enabled rule over `source`.
    pub fn check_source(&self, file: &str, source: &str) -> Vec<Diagnostic> {
        let opts = &self.options;
        let mut out = Vec::new();
        let report = |out: &mut Vec<Diagnostic>,
                      line: usize,
                      column: usize,
                      rule: &str,
                      message: String| {
            out.push(
                Diagnostic::error(file, message)
                    .with_severity(opts.severity)
                    .at(line, column)
                    .rule(rule),
            );
        };

        for (index, raw) in source.split_inclusive('\n').enumerate() {
            let number = index + 1;
            let terminated = raw.ends_with('\n');
            let body = raw.strip_suffix('\n').unwrap_or(raw);
            let crlf = body.ends_with('\r');
            let body = body.strip_suffix('\r').unwrap_or(body);
            let width = body.chars().count();

            if let Some(style) = opts.line_breaks
                && terminated
            {
                match style {
                    LineBreak::Lf if crlf => report(
                        &mut out,
                        number,
                        width + 1,
                        "line-breaks",
                        "Invalid line break, expected LF".to_string(),
                    ),
                    LineBreak::Crlf if !crlf => report(
                        &mut out,
                        number,
                        width + 1,
                        "line-breaks",
                        "Invalid line break, expected CRLF".to_string(),
                    ),
                    _ => {}
                }
            }

            if let Some(max) = opts.maximum_line_length
                && width > max
            {
                report(
                    &mut out,
                    number,
                    max + 1,
                    "maximum-line-length",
                    format!("Line must be at most {max} characters"),
                );
            }

            if opts.trailing_whitespace {
                let kept = body.trim_end_matches([' ', '\t']);
                if kept.len() != body.len() {
                    report(
                        &mut out,
                        number,
                        kept.chars().count() + 1,
                        "trailing-whitespace",
                        "Illegal trailing whitespace".to_string(),
                    );
                }
            }

            if let Some(indentation) = opts.indentation
                && let Some(message) = indentation_problem(indentation, body)
            {
                report(&mut out, number, 1, "indentation", message);
            }
        }

        if opts.final_newline && !source.is_empty() && !source.ends_with('\n') {
            let last = source.split('\n').count();
            let width = source.rsplit('\n').next().map_or(0, |line| line.chars().count());
            report(
                &mut out,
                last,
                width + 1,
                "final-newline",
                "Missing line feed at file end".to_string(),
            );
        }
        out
    }
}

fn indentation_problem(indentation: Indentation, line: &str) -> Option<String> {
    let content = line.trim_start_matches([' ', '\t']);
    if content.is_empty() {
        return None;
    }
    let leading = &line[..line.len() - content.len()];
    match indentation {
        Indentation::Tabs(_) => leading
            .contains(' ')
            .then(|| "Invalid indentation character: space".to_string()),
        Indentation::Spaces(width) => {
            if leading.contains('\t') {
                Some("Invalid indentation character: tab".to_string())
            } else if leading.len() % width != 0 {
                Some(format!(
                    "Expected indentation of a multiple of {width} spaces"
                ))
            } else {
                None
            }
        }
    }
}

impl Checker for TextChecker {
    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> &str {
        "text"
    }

    fn check(&self, target: &Path) -> Result<CheckReport> {
        let source =
            fs::read_to_string(target).with_context(|| format!("read {}", target.display()))?;
        let file = target.display().to_string();
        Ok(CheckReport::new(self.check_source(&file, &source)))
    }

    fn allowed_globals(&self) -> &[String] {
        &self.globals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(options: TextOptions) -> TextChecker {
        TextChecker::new("text", options)
    }

    fn rules(diagnostics: &[Diagnostic]) -> Vec<(usize, usize, &str)> {
        diagnostics
            .iter()
            .map(|d| (d.line, d.column, d.rule_id.as_deref().unwrap_or("")))
            .collect()
    }

    #[test]
    fn long_lines_and_trailing_whitespace() {
        let text = checker(TextOptions {
            maximum_line_length: Some(5),
            trailing_whitespace: true,
            ..TextOptions::default()
        });
        let found = text.check_source("a.txt", "short\ntoo long\nok  \n");
        assert_eq!(
            rules(&found),
            vec![(2, 6, "maximum-line-length"), (3, 3, "trailing-whitespace")]
        );
        assert!(found.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn line_break_style() {
        let lf = checker(TextOptions {
            line_breaks: Some(LineBreak::Lf),
            ..TextOptions::default()
        });
        assert_eq!(rules(&lf.check_source("a", "a\r\nb\n")), vec![(1, 2, "line-breaks")]);

        let crlf = checker(TextOptions {
            line_breaks: Some(LineBreak::Crlf),
            ..TextOptions::default()
        });
        assert_eq!(rules(&crlf.check_source("a", "a\r\nb\n")), vec![(2, 2, "line-breaks")]);
    }

    #[test]
    fn indentation_width_and_character() {
        let spaces = checker(TextOptions {
            indentation: Some(Indentation::Spaces(4)),
            ..TextOptions::default()
        });
        let found = spaces.check_source("a", "fn x() {\n    ok\n   off\n\tbad\n\n}\n");
        assert_eq!(rules(&found), vec![(3, 1, "indentation"), (4, 1, "indentation")]);
        assert_eq!(found[1].message, "Invalid indentation character: tab");

        let tabs = checker(TextOptions {
            indentation: Some(Indentation::Tabs(TabKeyword::Tab)),
            ..TextOptions::default()
        });
        assert_eq!(rules(&tabs.check_source("a", "\tok\n  no\n")), vec![(2, 1, "indentation")]);
    }

    #[test]
    fn final_newline_is_required() {
        let text = checker(TextOptions {
            final_newline: true,
            severity: Severity::Warning,
            ..TextOptions::default()
        });
        let found = text.check_source("a", "one\ntwo");
        assert_eq!(rules(&found), vec![(2, 4, "final-newline")]);
        assert_eq!(found[0].severity, Severity::Warning);
        assert!(text.check_source("a", "one\n").is_empty());
        assert!(text.check_source("a", "").is_empty());
    }

    #[test]
    fn options_parse_from_toml() {
        let options: TextOptions = toml::from_str(
            "maximum_line_length = 80\nline_breaks = \"CRLF\"\nindentation = \"tab\"\n",
        )
        .expect("parse");
        assert_eq!(options.maximum_line_length, Some(80));
        assert_eq!(options.line_breaks, Some(LineBreak::Crlf));
        assert_eq!(options.indentation, Some(Indentation::Tabs(TabKeyword::Tab)));

        let spaces: TextOptions = toml::from_str("indentation = 2").expect("parse");
        assert_eq!(spaces.indentation, Some(Indentation::Spaces(2)));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let options = TextOptions {
            maximum_line_length: Some(0),
            ..TextOptions::default()
        };
        assert!(options.validate().is_err());
    }
}

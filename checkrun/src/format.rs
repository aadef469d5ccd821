//! Diagnostic rendering.
//!
//! `compact` prints one line per diagnostic followed by a problem count;
//! `json` prints every diagnostic plus a top-level summary.

use std::fmt::Write as _;
use std::io::IsTerminal;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use serde_json::json;

use crate::core::diagnostic::{CheckReport, Diagnostic, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterKind {
    Compact,
    Json,
}

impl FormatterKind {
    pub const ALL: [FormatterKind; 2] = [FormatterKind::Compact, FormatterKind::Json];

    pub fn name(self) -> &'static str {
        match self {
            FormatterKind::Compact => "compact",
            FormatterKind::Json => "json",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FormatterKind::Compact => "default formatter, one line per problem",
            FormatterKind::Json => "machine readable results with a summary",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match Self::ALL.into_iter().find(|kind| kind.name() == name) {
            Some(kind) => Ok(kind),
            None => bail!("invalid formatter \"{name}\""),
        }
    }
}

/// Whether to emit ANSI colors.
///
/// An explicit `--colors`/`--no-colors` wins. Otherwise colors are used on a
/// terminal unless `NO_COLOR` is set. JSON is never colored.
pub fn use_colors(kind: FormatterKind, requested: Option<bool>) -> bool {
    if kind == FormatterKind::Json {
        return false;
    }
    requested.unwrap_or_else(|| {
        std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    })
}

/// One checker's report, labelled with the checker's full title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledReport {
    pub checker: String,
    pub report: CheckReport,
}

#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    kind: FormatterKind,
    colors: bool,
}

impl Formatter {
    pub fn new(kind: FormatterKind, colors: bool) -> Self {
        Self { kind, colors }
    }

    pub fn kind(&self) -> FormatterKind {
        self.kind
    }

    pub fn render(&self, results: &[LabelledReport]) -> Result<String> {
        match self.kind {
            FormatterKind::Compact => Ok(self.compact(results)),
            FormatterKind::Json => json_output(results),
        }
    }

    fn compact(&self, results: &[LabelledReport]) -> String {
        let mut out = String::new();
        let mut total = 0usize;
        for result in results {
            for diagnostic in &result.report.diagnostics {
                total += 1;
                let _ = writeln!(out, "{}", self.compact_line(diagnostic));
            }
        }
        if total > 0 {
            let summary = format!("{total} problem{}", if total == 1 { "" } else { "s" });
            let _ = write!(out, "\n{}", self.paint_summary(&summary));
        }
        out
    }

    fn compact_line(&self, d: &Diagnostic) -> String {
        let severity = severity_label(d);
        let rule = d
            .rule_id
            .as_deref()
            .map(|rule| format!(" ({rule})"))
            .unwrap_or_default();
        if !self.colors {
            return format!(
                "{}: line {}, col {}, {} - {}{}",
                d.file_path, d.line, d.column, severity, d.message, rule
            );
        }
        let severity = if d.is_error() {
            severity.red().bold().to_string()
        } else {
            severity.yellow().bold().to_string()
        };
        format!(
            "{}: line {}, col {}, {} - {}{}",
            d.file_path.bold(),
            d.line,
            d.column,
            severity,
            d.message,
            rule.bright_black()
        )
    }

    fn paint_summary(&self, summary: &str) -> String {
        if self.colors {
            summary.bold().to_string()
        } else {
            summary.to_string()
        }
    }
}

fn severity_label(d: &Diagnostic) -> Severity {
    if d.is_error() {
        Severity::Error
    } else {
        Severity::Warning
    }
}

fn json_output(results: &[LabelledReport]) -> Result<String> {
    let mut items = Vec::new();
    let mut errors = 0usize;
    let mut warnings = 0usize;
    for result in results {
        errors += result.report.error_count();
        warnings += result.report.warning_count();
        for d in &result.report.diagnostics {
            items.push(json!({
                "checker": result.checker,
                "file": d.file_path,
                "line": d.line,
                "column": d.column,
                "severity": d.severity,
                "fatal": d.fatal,
                "message": d.message,
                "rule_id": d.rule_id,
            }));
        }
    }
    let out = json!({
        "results": items,
        "summary": {
            "errors": errors,
            "warnings": warnings,
            "problems": errors + warnings,
        },
    });
    serde_json::to_string_pretty(&out).context("serialize json results")
}

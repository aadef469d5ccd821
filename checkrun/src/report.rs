//! Run statistics and the end-of-run epilogue.
//!
//! A [`Reporter`] subscribes to a runner, counts what happened and keeps the
//! failures and per-checker diagnostics for printing once the run ends.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;
use std::time::{Duration, Instant};

use owo_colors::OwoColorize;

use crate::core::events::{RunEvent, RunListener};
use crate::core::scope::ScopeTree;
use crate::format::LabelledReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Non-root scopes entered.
    pub scopes: usize,
    /// Checkers that ran to their end event.
    pub checkers: usize,
    pub passes: usize,
    pub pending: usize,
    pub failures: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub title: String,
    pub message: String,
    pub uncaught: bool,
}

impl FailureRecord {
    pub fn describe(&self) -> String {
        if self.uncaught {
            format!("Uncaught {}", self.message)
        } else {
            self.message.clone()
        }
    }
}

#[derive(Debug, Default)]
struct ReportState {
    stats: Stats,
    started: Option<Instant>,
    failures: Vec<FailureRecord>,
    results: Vec<LabelledReport>,
}

/// Collects a run's outcome. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    state: Rc<RefCell<ReportState>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Stats {
        self.state.borrow().stats
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.state.borrow().failures.clone()
    }

    /// Reports of every checker that ran to completion, failed ones
    /// included, in completion order.
    pub fn results(&self) -> Vec<LabelledReport> {
        self.state.borrow().results.clone()
    }

    pub fn error_count(&self) -> usize {
        self.state
            .borrow()
            .results
            .iter()
            .map(|result| result.report.error_count())
            .sum()
    }

    /// Counts followed by the numbered failure list.
    pub fn epilogue(&self, colors: bool) -> String {
        let state = self.state.borrow();
        let stats = state.stats;
        let mut out = String::from("\n");

        let passing = format!(
            "  {} passing ({}ms)",
            stats.passes,
            stats.duration.as_millis()
        );
        let _ = writeln!(out, "{}", paint(&passing, colors, Tone::Pass));
        if stats.pending > 0 {
            let pending = format!("  {} pending", stats.pending);
            let _ = writeln!(out, "{}", paint(&pending, colors, Tone::Pending));
        }
        if stats.failures > 0 {
            let failing = format!("  {} failing", stats.failures);
            let _ = writeln!(out, "{}", paint(&failing, colors, Tone::Fail));
            out.push('\n');
            for (index, failure) in state.failures.iter().enumerate() {
                let _ = writeln!(out, "  {}) {}:", index + 1, failure.title);
                let message = failure.describe();
                let _ = writeln!(out, "     {}", paint(&message, colors, Tone::Fail));
            }
        }
        out
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Pass,
    Pending,
    Fail,
}

fn paint(text: &str, colors: bool, tone: Tone) -> String {
    if !colors {
        return text.to_string();
    }
    match tone {
        Tone::Pass => text.green().to_string(),
        Tone::Pending => text.cyan().to_string(),
        Tone::Fail => text.red().to_string(),
    }
}

impl RunListener for Reporter {
    fn on_event(&mut self, tree: &ScopeTree, event: &RunEvent<'_>) {
        let mut state = self.state.borrow_mut();
        match event {
            RunEvent::Start { .. } => {
                state.started = Some(Instant::now());
            }
            RunEvent::Scope(scope) if !scope.is_root() => state.stats.scopes += 1,
            RunEvent::CheckerEnd(entry, report) => {
                state.stats.checkers += 1;
                if let Some(report) = report {
                    state.results.push(LabelledReport {
                        checker: tree.checker_full_title(entry.id()),
                        report: (*report).clone(),
                    });
                }
            }
            RunEvent::Pass(..) => state.stats.passes += 1,
            RunEvent::Pending(_) => state.stats.pending += 1,
            RunEvent::Fail {
                unit,
                error,
                uncaught,
            } => {
                state.stats.failures += 1;
                state.failures.push(FailureRecord {
                    title: unit.full_title(tree),
                    message: format!("{error:#}"),
                    uncaught: *uncaught,
                });
            }
            RunEvent::End { .. } => {
                if let Some(started) = state.started {
                    state.stats.duration = started.elapsed();
                }
            }
            _ => {}
        }
    }
}

//! Lifecycle events emitted by the runner.
//!
//! Events borrow from the tree being run, so listeners receive the tree
//! alongside each event to resolve titles and parents.

use crate::core::diagnostic::CheckReport;
use crate::core::hook::Hook;
use crate::core::scope::{CheckerEntry, Scope, ScopeTree};

/// The unit a failure is attributed to.
#[derive(Debug, Clone, Copy)]
pub enum Unit<'a> {
    Checker(&'a CheckerEntry),
    Hook(&'a Hook),
}

impl Unit<'_> {
    pub fn title(&self) -> &str {
        match self {
            Unit::Checker(entry) => entry.title(),
            Unit::Hook(hook) => hook.title(),
        }
    }

    /// Title prefixed with every enclosing scope title.
    pub fn full_title(&self, tree: &ScopeTree) -> String {
        let (scope, title) = match self {
            Unit::Checker(entry) => return tree.checker_full_title(entry.id()),
            Unit::Hook(hook) => (hook.scope(), hook.title()),
        };
        let prefix = tree.full_title(scope);
        if prefix.is_empty() {
            title.to_string()
        } else {
            format!("{prefix} {title}")
        }
    }
}

#[derive(Debug)]
pub enum RunEvent<'a> {
    /// Selected checker count for the whole run.
    Start { total: usize },
    Scope(&'a Scope),
    ScopeEnd(&'a Scope),
    Checker(&'a CheckerEntry),
    /// Carries the report when the checker ran to completion, even if it
    /// also failed.
    CheckerEnd(&'a CheckerEntry, Option<&'a CheckReport>),
    Hook(&'a Hook),
    HookEnd(&'a Hook),
    Pass(&'a CheckerEntry, &'a CheckReport),
    Fail {
        unit: Unit<'a>,
        error: &'a anyhow::Error,
        /// Raised by a panic rather than returned.
        uncaught: bool,
    },
    Pending(&'a CheckerEntry),
    End { failures: usize },
}

impl RunEvent<'_> {
    /// Short name used in logs and test transcripts.
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::Start { .. } => "start",
            RunEvent::Scope(_) => "scope",
            RunEvent::ScopeEnd(_) => "scope end",
            RunEvent::Checker(_) => "checker",
            RunEvent::CheckerEnd(..) => "checker end",
            RunEvent::Hook(_) => "hook",
            RunEvent::HookEnd(_) => "hook end",
            RunEvent::Pass(..) => "pass",
            RunEvent::Fail { .. } => "fail",
            RunEvent::Pending(_) => "pending",
            RunEvent::End { .. } => "end",
        }
    }
}

/// Receives every event of a run, in order.
pub trait RunListener {
    fn on_event(&mut self, tree: &ScopeTree, event: &RunEvent<'_>);
}

impl<F> RunListener for F
where
    F: FnMut(&ScopeTree, &RunEvent<'_>),
{
    fn on_event(&mut self, tree: &ScopeTree, event: &RunEvent<'_>) {
        self(tree, event)
    }
}

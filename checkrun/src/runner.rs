//! Scheduler: walks a finished [`ScopeTree`] and runs its hooks and checkers.
//!
//! Execution is strictly sequential. For every scope with at least one
//! selected checker the runner emits `scope`, runs `before all` hooks, runs
//! each own checker wrapped in the `before each` chain (root first) and the
//! `after each` chain (nearest first), recurses into child scopes, runs
//! `after all` hooks and emits `scope end`.
//!
//! Hook failures unwind as follows:
//!
//! - `before all`: nothing under the scope runs; its `after all` still does.
//! - `before each` in scope E: the `after each` chain from E upward runs once,
//!   then the rest of E is skipped.
//! - `after each` in scope E: the chain continues from E's parent, then the
//!   rest of E (checkers and descendants) is skipped.
//! - `after all`: recorded, nothing else changes.
//!
//! A failure while unwinding moves the skipped scope up to the new failure.
//!
//! With `bail` set on the hook's scope, a hook failure ends the run on the
//! spot: no further hooks run and no `scope end` events follow. A failed
//! checker still gets its `after each` chain before the run stops.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tracing::{debug, info, instrument, warn};

use crate::core::checker::{CheckerCall, ErrorSink};
use crate::core::context::Contexts;
use crate::core::diagnostic::CheckReport;
use crate::core::events::{RunEvent, RunListener, Unit};
use crate::core::hook::{Hook, HookCall};
use crate::core::leaks::{EnvironmentProbe, LeakDetector};
use crate::core::patterns::IgnoreSet;
use crate::core::scope::{CheckerEntry, ScopeTree};
use crate::core::selector::Selection;
use crate::core::types::{
    CheckerId, Deadline, GlobalLeakError, HookId, HookStage, Runnable, ScopeId, TimeoutError,
    UncaughtError, UnitError, UnitState,
};
use crate::io::env_probe::ProcessEnvProbe;

/// Cooperative abort flag shared between the runner and whoever stops it.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Stop before the next checker or child scope. Running units finish.
    pub fn abort(&self) {
        debug!("aborting");
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-unit time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitLimits {
    /// `None` disables the deadline.
    pub timeout: Option<Duration>,
    /// Units taking at least this long are logged as slow.
    pub slow: Duration,
}

impl Default for UnitLimits {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            slow: Duration::from_secs(2),
        }
    }
}

impl UnitLimits {
    /// Build from millisecond settings where a zero timeout disables it.
    pub fn from_millis(timeout_ms: u64, slow_ms: u64) -> Self {
        Self {
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            slow: Duration::from_millis(slow_ms),
        }
    }
}

/// Counts for one finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Selected checkers.
    pub total: usize,
    pub passes: usize,
    pub pending: usize,
    /// Failure records, not failed units: one unit can fail more than once.
    pub failures: usize,
    pub aborted: bool,
    pub duration: Duration,
}

/// How a unit body finished.
enum Outcome<T> {
    Done(T),
    Pending,
    Failed(anyhow::Error),
    Uncaught(anyhow::Error),
}

pub struct Runner<'t> {
    tree: &'t ScopeTree,
    targets: Vec<PathBuf>,
    base_dir: PathBuf,
    selection: Selection,
    selected: Vec<bool>,
    selected_below: Vec<usize>,
    total: usize,
    listeners: Vec<Box<dyn RunListener + 't>>,
    leaks: LeakDetector,
    limits: UnitLimits,
    abort: AbortHandle,
    contexts: Contexts,
    states: Vec<UnitState>,
    reports: Vec<Option<CheckReport>>,
    runtime_pending: Vec<bool>,
    current_checker: Option<CheckerId>,
    failures: usize,
    passes: usize,
    pending: usize,
    halted: bool,
}

impl<'t> Runner<'t> {
    /// A runner over `tree` that hands `targets` to every checker.
    pub fn new(tree: &'t ScopeTree, targets: Vec<PathBuf>) -> Self {
        let mut runner = Self {
            tree,
            targets,
            base_dir: PathBuf::from("."),
            selection: Selection::all(),
            selected: Vec::new(),
            selected_below: Vec::new(),
            total: 0,
            listeners: Vec::new(),
            leaks: LeakDetector::new(Box::new(ProcessEnvProbe)),
            limits: UnitLimits::default(),
            abort: AbortHandle::default(),
            contexts: Contexts::for_tree(tree),
            states: vec![UnitState::Unset; tree.checker_count()],
            reports: (0..tree.checker_count()).map(|_| None).collect(),
            runtime_pending: vec![false; tree.scope_count()],
            current_checker: None,
            failures: 0,
            passes: 0,
            pending: 0,
            halted: false,
        };
        runner.grep(Selection::all());
        runner
    }

    pub fn subscribe(&mut self, listener: impl RunListener + 't) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Only run checkers whose full title the selection keeps.
    pub fn grep(&mut self, selection: Selection) -> &mut Self {
        debug!(
            pattern = selection.pattern(),
            invert = selection.is_inverted(),
            "grep"
        );
        let tree = self.tree;
        self.selected = (0..tree.checker_count())
            .map(|index| selection.matches(&tree.checker_full_title(CheckerId(index))))
            .collect();

        // Children are always declared after their parent, so a reverse pass
        // sees every child before its parent.
        let mut below = vec![0usize; tree.scope_count()];
        for index in (0..tree.scope_count()).rev() {
            let scope = tree.scope(ScopeId(index));
            let own = scope
                .checkers()
                .iter()
                .filter(|id| self.selected[id.index()])
                .count();
            let nested: usize = scope.children().iter().map(|child| below[child.index()]).sum();
            below[index] = own + nested;
        }
        self.total = below[tree.root().index()];
        self.selected_below = below;
        self.selection = selection;
        self
    }

    /// Selected checkers under `scope`.
    pub fn grep_total(&self, scope: ScopeId) -> usize {
        self.selected_below[scope.index()]
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Allow-list extra global names (exact or `prefix*`).
    pub fn globals(&mut self, names: impl IntoIterator<Item = String>) -> &mut Self {
        self.leaks.allow(names);
        self
    }

    pub fn allowed_globals(&self) -> &[String] {
        self.leaks.allowed()
    }

    /// Replace the host probe. Names allowed so far stay allowed.
    pub fn with_probe(&mut self, probe: Box<dyn EnvironmentProbe>) -> &mut Self {
        let enabled = self.leaks.is_enabled();
        let carried = self.leaks.allowed().to_vec();
        self.leaks = LeakDetector::new(probe);
        self.leaks.allow(carried);
        self.leaks.set_enabled(enabled);
        self
    }

    pub fn ignore_leaks(&mut self, ignore: bool) -> &mut Self {
        self.leaks.set_enabled(!ignore);
        self
    }

    pub fn with_limits(&mut self, limits: UnitLimits) -> &mut Self {
        self.limits = limits;
        self
    }

    /// Directory ignore patterns are matched relative to.
    pub fn with_base_dir(&mut self, base_dir: impl Into<PathBuf>) -> &mut Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn abort(&self) {
        self.abort.abort();
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn state(&self, id: CheckerId) -> UnitState {
        self.states[id.index()]
    }

    /// Diagnostics of a checker that ran to completion.
    pub fn report(&self, id: CheckerId) -> Option<&CheckReport> {
        self.reports[id.index()].as_ref()
    }

    pub fn contexts(&self) -> &Contexts {
        &self.contexts
    }

    /// Run the whole tree once. Emits `start` first and `end` last.
    #[instrument(skip_all, fields(total = self.total))]
    pub fn run(&mut self) -> RunSummary {
        let started = Instant::now();
        self.reset();
        info!(targets = self.targets.len(), "run started");
        self.emit(RunEvent::Start { total: self.total });
        let root = self.tree.root();
        self.run_scope(root);
        let failures = self.failures;
        self.emit_end(failures);

        let summary = RunSummary {
            total: self.total,
            passes: self.passes,
            pending: self.pending,
            failures,
            aborted: self.abort.is_aborted(),
            duration: started.elapsed(),
        };
        info!(?summary, "run finished");
        summary
    }

    fn reset(&mut self) {
        let tree = self.tree;
        self.contexts = Contexts::for_tree(tree);
        self.states = vec![UnitState::Unset; tree.checker_count()];
        self.reports = (0..tree.checker_count()).map(|_| None).collect();
        self.runtime_pending = vec![false; tree.scope_count()];
        self.current_checker = None;
        self.failures = 0;
        self.passes = 0;
        self.pending = 0;
        self.halted = false;
    }

    /// Returns the scope whose remaining work must be skipped, when that
    /// scope is an ancestor of `id`.
    fn run_scope(&mut self, id: ScopeId) -> Option<ScopeId> {
        if self.halted || self.grep_total(id) == 0 {
            return None;
        }
        let tree = self.tree;
        let scope = tree.scope(id);
        debug!(scope = %tree.full_title(id), "run scope");
        self.emit(RunEvent::Scope(scope));

        let mut skip = None;
        if self.run_hooks(id, HookStage::BeforeAll) {
            skip = match self.run_checkers(id) {
                Some(err_scope) => Some(err_scope),
                None => self.run_children(id),
            };
            if skip == Some(id) {
                skip = None;
            }
        }

        if self.halted {
            return None;
        }
        self.run_hooks(id, HookStage::AfterAll);
        if self.halted {
            return None;
        }
        self.emit(RunEvent::ScopeEnd(scope));
        skip
    }

    fn run_children(&mut self, id: ScopeId) -> Option<ScopeId> {
        let tree = self.tree;
        for &child in tree.scope(id).children() {
            if self.should_stop(id) {
                break;
            }
            if let Some(err_scope) = self.run_scope(child) {
                return Some(err_scope);
            }
        }
        None
    }

    fn should_stop(&self, scope: ScopeId) -> bool {
        if self.halted {
            return true;
        }
        if self.abort.is_aborted() {
            debug!("abort requested");
            return true;
        }
        self.failures > 0 && self.tree.scope(scope).bail()
    }

    fn lineage_pending(&self, scope: ScopeId) -> bool {
        self.tree
            .lineage(scope)
            .iter()
            .any(|id| self.runtime_pending[id.index()])
    }

    fn run_checkers(&mut self, id: ScopeId) -> Option<ScopeId> {
        let tree = self.tree;
        for &checker_id in tree.scope(id).checkers() {
            if self.should_stop(id) {
                return None;
            }
            if !self.selected[checker_id.index()] {
                continue;
            }
            let entry = tree.checker(checker_id);
            if entry.pending() || self.lineage_pending(id) {
                self.mark_pending(entry);
                continue;
            }

            debug!(checker = %tree.checker_full_title(checker_id), "run checker");
            self.emit(RunEvent::Checker(entry));
            self.current_checker = Some(checker_id);

            if let Err(err_scope) = self.run_hook_chain(id, HookStage::BeforeEach) {
                let skip = self.unwind_after_each(err_scope, false);
                self.current_checker = None;
                return skip;
            }
            if self.halted {
                return None;
            }
            if self.lineage_pending(id) {
                self.current_checker = None;
                self.mark_pending(entry);
                continue;
            }

            let pending = self.run_checker(entry);
            if pending {
                self.current_checker = None;
                continue;
            }
            if let Err(err_scope) = self.run_hook_chain(id, HookStage::AfterEach) {
                let skip = self.unwind_after_each(err_scope, true);
                self.current_checker = None;
                return skip;
            }
            self.current_checker = None;
            if self.halted {
                return None;
            }
        }
        None
    }

    fn mark_pending(&mut self, entry: &CheckerEntry) {
        self.pending += 1;
        self.emit(RunEvent::Pending(entry));
        self.emit(RunEvent::CheckerEnd(entry, None));
        self.check_globals(Runnable::Checker(entry.id()));
    }

    /// Finish the `after each` chain after a hook in `err_scope` failed.
    /// Returns the scope to skip.
    fn unwind_after_each(&mut self, err_scope: ScopeId, after: bool) -> Option<ScopeId> {
        let tree = self.tree;
        let mut err_scope = err_scope;
        let mut after = after;
        loop {
            if self.halted {
                return None;
            }
            let from = if after {
                tree.scope(err_scope).parent()
            } else {
                Some(err_scope)
            };
            let Some(from) = from else {
                return Some(err_scope);
            };
            match self.run_hook_chain(from, HookStage::AfterEach) {
                Ok(()) => return Some(err_scope),
                Err(higher) => {
                    err_scope = higher;
                    after = true;
                }
            }
        }
    }

    /// `before each` runs root first, `after each` nearest first. Stops at the
    /// first scope whose hooks fail and returns it.
    fn run_hook_chain(&mut self, from: ScopeId, stage: HookStage) -> Result<(), ScopeId> {
        let mut chain = self.tree.lineage(from);
        if stage == HookStage::BeforeEach {
            chain.reverse();
        }
        for scope in chain {
            if !self.run_hooks(scope, stage) {
                return Err(scope);
            }
        }
        Ok(())
    }

    /// Run every hook of `stage` on `scope`. False when one failed.
    fn run_hooks(&mut self, scope: ScopeId, stage: HookStage) -> bool {
        let tree = self.tree;
        let around = match stage {
            HookStage::BeforeEach | HookStage::AfterEach => {
                self.current_checker.map(|id| tree.checker(id))
            }
            HookStage::BeforeAll | HookStage::AfterAll => None,
        };
        for &hook_id in tree.scope(scope).hooks(stage) {
            if self.halted {
                return false;
            }
            let hook = tree.hook(hook_id);
            self.emit(RunEvent::Hook(hook));

            let outcome = self.execute_hook(hook, around);
            if let Some(err) = hook.take_error() {
                match around {
                    Some(entry) => self.fail(Runnable::Checker(entry.id()), err, false),
                    None => self.fail(Runnable::Hook(hook_id), err, false),
                }
            }
            match outcome {
                Outcome::Done(()) => {}
                Outcome::Pending => {
                    debug!(hook = hook.title(), "hook marked scope pending");
                    self.runtime_pending[scope.index()] = true;
                }
                Outcome::Failed(err) => {
                    warn!(hook = hook.title(), error = %err, "hook failed");
                    self.fail_hook(hook_id, err);
                    return false;
                }
                Outcome::Uncaught(err) => {
                    warn!(hook = hook.title(), error = %err, "hook panicked, ending run");
                    self.fail_uncaught(Runnable::Hook(hook_id), err);
                    return false;
                }
            }
            self.emit(RunEvent::HookEnd(hook));
            self.check_globals(Runnable::Hook(hook_id));
        }
        true
    }

    fn execute_hook(&mut self, hook: &Hook, around: Option<&CheckerEntry>) -> Outcome<()> {
        let started = Instant::now();
        let deadline = self.limits.timeout.map(Deadline::after);
        let runnable = Runnable::Hook(hook.id());
        self.contexts.set_runnable(hook.scope(), Some(runnable));
        let result = {
            let mut call = HookCall {
                hook,
                ctx: self.contexts.view(hook.scope()),
                checker: around,
                abort: &self.abort,
                deadline,
            };
            panic::catch_unwind(AssertUnwindSafe(|| (hook.body)(&mut call)))
        };
        self.contexts.set_runnable(hook.scope(), None);
        self.settle(hook.title(), started, result)
    }

    /// Run one checker and emit its terminal events. True when it turned out
    /// pending, in which case no `after each` hooks follow.
    fn run_checker(&mut self, entry: &CheckerEntry) -> bool {
        let id = entry.id();
        let started = Instant::now();
        let deadline = self.limits.timeout.map(Deadline::after);
        let sink = ErrorSink::default();

        let outcome = match IgnoreSet::for_scope(self.tree, entry.scope()) {
            Ok(ignores) => {
                let targets = ignores.filter(&self.targets, &self.base_dir);
                self.contexts.set_runnable(entry.scope(), Some(Runnable::Checker(id)));
                let result = {
                    let mut call =
                        CheckerCall::new(&targets, self.contexts.view(entry.scope()), &sink, deadline);
                    panic::catch_unwind(AssertUnwindSafe(|| entry.checker().run(&mut call)))
                };
                self.contexts.set_runnable(entry.scope(), None);
                self.settle(entry.title(), started, result)
            }
            Err(err) => Outcome::Failed(err),
        };

        let raised = sink.drain();
        let clean = raised.is_empty();
        for err in raised {
            self.fail(Runnable::Checker(id), err, false);
        }

        let mut pending = false;
        let mut completed = None;
        match outcome {
            Outcome::Done(report) => {
                if clean {
                    self.states[id.index()] = UnitState::Passed;
                    self.passes += 1;
                    self.emit(RunEvent::Pass(entry, &report));
                }
                completed = Some(report);
            }
            Outcome::Pending => {
                pending = true;
                self.pending += 1;
                self.emit(RunEvent::Pending(entry));
            }
            Outcome::Failed(err) => self.fail(Runnable::Checker(id), err, false),
            Outcome::Uncaught(err) => self.fail(Runnable::Checker(id), err, true),
        }
        self.emit(RunEvent::CheckerEnd(entry, completed.as_ref()));
        self.reports[id.index()] = completed;
        self.check_globals(Runnable::Checker(id));
        pending
    }

    /// Map a guarded unit result onto an outcome, applying the deadline after
    /// the fact.
    fn settle<T>(
        &self,
        title: &str,
        started: Instant,
        result: std::thread::Result<Result<T, UnitError>>,
    ) -> Outcome<T> {
        let elapsed = started.elapsed();
        if elapsed >= self.limits.slow {
            warn!(unit = title, elapsed_ms = elapsed.as_millis() as u64, "slow unit");
        }
        match result {
            Err(payload) => Outcome::Uncaught(anyhow!(UncaughtError::from_panic(payload.as_ref()))),
            Ok(Err(UnitError::Pending)) => Outcome::Pending,
            Ok(Err(UnitError::Failed(err))) => Outcome::Failed(err),
            Ok(Ok(value)) => match self.limits.timeout {
                Some(limit) if elapsed > limit => Outcome::Failed(anyhow!(TimeoutError { limit })),
                _ => Outcome::Done(value),
            },
        }
    }

    fn check_globals(&mut self, runnable: Runnable) {
        let tree = self.tree;
        let extra: &[String] = match runnable {
            Runnable::Checker(id) => tree.checker(id).checker().allowed_globals(),
            Runnable::Hook(_) => &[],
        };
        let leaks = self.leaks.check(extra);
        if !leaks.is_empty() {
            let err = anyhow!(GlobalLeakError { names: leaks });
            self.fail(runnable, err, false);
        }
    }

    /// The single place failures are recorded.
    fn fail(&mut self, runnable: Runnable, err: anyhow::Error, uncaught: bool) {
        let tree = self.tree;
        self.failures += 1;
        let unit = match runnable {
            Runnable::Checker(id) => {
                self.states[id.index()] = UnitState::Failed;
                Unit::Checker(tree.checker(id))
            }
            Runnable::Hook(id) => Unit::Hook(tree.hook(id)),
        };
        debug!(unit = %unit.full_title(tree), error = %err, uncaught, "unit failed");
        self.emit(RunEvent::Fail {
            unit,
            error: &err,
            uncaught,
        });
    }

    /// A hook returned an error. Ends the run when its scope bails.
    fn fail_hook(&mut self, id: HookId, err: anyhow::Error) {
        self.fail(Runnable::Hook(id), err, false);
        let scope = self.tree.hook(id).scope();
        if self.tree.scope(scope).bail() {
            debug!("bail after hook failure");
            self.halted = true;
        }
    }

    /// A hook panicked: record it and stop the run.
    fn fail_uncaught(&mut self, runnable: Runnable, err: anyhow::Error) {
        self.fail(runnable, err, true);
        self.halted = true;
    }

    fn emit(&mut self, event: RunEvent<'_>) {
        if self.halted {
            return;
        }
        self.dispatch(&event);
    }

    fn emit_end(&mut self, failures: usize) {
        self.dispatch(&RunEvent::End { failures });
    }

    fn dispatch(&mut self, event: &RunEvent<'_>) {
        let tree = self.tree;
        for listener in &mut self.listeners {
            listener.on_event(tree, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checker::Checker;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    struct Fixed(&'static str);

    impl Checker for Fixed {
        fn title(&self) -> &str {
            self.0
        }

        fn kind(&self) -> &str {
            "fixed"
        }

        fn check(&self, _target: &Path) -> anyhow::Result<CheckReport> {
            Ok(CheckReport::default())
        }
    }

    struct NoGlobals;

    impl EnvironmentProbe for NoGlobals {
        fn globals(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl RunListener) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let listener = move |tree: &ScopeTree, event: &RunEvent<'_>| {
            let entry = match event {
                RunEvent::Checker(entry) | RunEvent::Pass(entry, _) => {
                    format!("{} {}", event.name(), tree.checker_full_title(entry.id()))
                }
                _ => event.name().to_string(),
            };
            sink.borrow_mut().push(entry);
        };
        (log, listener)
    }

    #[test]
    fn grep_total_counts_selected_subtree() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let js = tree.add_scope(root, "js");
        tree.add_checker(js, Box::new(Fixed("text")));
        tree.add_checker(js, Box::new(Fixed("json")));
        let css = tree.add_scope(root, "css");
        tree.add_checker(css, Box::new(Fixed("text")));

        let mut runner = Runner::new(&tree, Vec::new());
        assert_eq!(runner.total(), 3);
        runner.grep(Selection::from_pattern("text$", false).expect("regex"));
        assert_eq!(runner.total(), 2);
        assert_eq!(runner.grep_total(js), 1);
        runner.grep(Selection::literal("css", true).expect("literal"));
        assert_eq!(runner.grep_total(css), 0);
        assert_eq!(runner.total(), 2);
    }

    #[test]
    fn empty_selection_emits_start_and_end_only() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.add_checker(root, Box::new(Fixed("text")));
        tree.before_all(root, "never", |_| Ok(()));

        let (log, listener) = recorder();
        let mut runner = Runner::new(&tree, Vec::new());
        runner
            .with_probe(Box::new(NoGlobals))
            .subscribe(listener)
            .grep(Selection::literal("nothing", false).expect("literal"));
        let summary = runner.run();
        assert_eq!(summary.total, 0);
        assert_eq!(*log.borrow(), vec!["start", "end"]);
    }

    #[test]
    fn passing_checker_event_order() {
        let mut tree = ScopeTree::new();
        let a = tree.add_scope(tree.root(), "a");
        tree.add_checker(a, Box::new(Fixed("text")));

        let (log, listener) = recorder();
        let mut runner = Runner::new(&tree, vec![PathBuf::from("x.js")]);
        runner.with_probe(Box::new(NoGlobals)).subscribe(listener);
        let summary = runner.run();

        assert_eq!(summary.passes, 1);
        assert_eq!(summary.failures, 0);
        assert_eq!(
            *log.borrow(),
            vec![
                "start",
                "scope",
                "scope",
                "checker a text",
                "pass a text",
                "checker end",
                "scope end",
                "scope end",
                "end",
            ]
        );
    }

    #[test]
    fn from_millis_zero_disables_timeout() {
        let limits = UnitLimits::from_millis(0, 10);
        assert_eq!(limits.timeout, None);
        assert_eq!(limits.slow, Duration::from_millis(10));
    }

    #[test]
    fn abort_handle_is_shared() {
        let tree = ScopeTree::new();
        let runner = Runner::new(&tree, Vec::new());
        let handle = runner.abort_handle();
        handle.abort();
        assert!(runner.abort_handle().is_aborted());
    }
}

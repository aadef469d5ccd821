//! Test-only helpers: scripted checkers, recording listeners, fake probes and
//! throwaway workspaces.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::checker::{Checker, CheckerCall, fan_out};
use crate::core::diagnostic::{CheckReport, Diagnostic};
use crate::core::events::{RunEvent, RunListener};
use crate::core::leaks::EnvironmentProbe;
use crate::core::scope::ScopeTree;
use crate::core::types::UnitError;

/// What a [`ScriptedChecker`] does when run.
#[derive(Debug, Clone)]
pub enum Script {
    /// One warning per target.
    Pass,
    Fail(String),
    Pending,
    Panic(String),
    /// Raise an out-of-band error, then pass.
    Raise(String),
    Sleep(Duration),
    /// Add a global to the probe while running.
    Leak(SharedProbe, String),
}

#[derive(Debug, Clone)]
pub struct ScriptedChecker {
    title: String,
    script: Script,
}

impl ScriptedChecker {
    pub fn new(title: &str, script: Script) -> Self {
        Self {
            title: title.to_string(),
            script,
        }
    }

    pub fn passing(title: &str) -> Box<Self> {
        Box::new(Self::new(title, Script::Pass))
    }

    pub fn failing(title: &str, message: &str) -> Box<Self> {
        Box::new(Self::new(title, Script::Fail(message.to_string())))
    }
}

impl Checker for ScriptedChecker {
    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> &str {
        "scripted"
    }

    fn check(&self, target: &Path) -> Result<CheckReport> {
        Ok(CheckReport::new(vec![
            Diagnostic::warning(target.display().to_string(), format!("seen by {}", self.title))
                .rule("scripted"),
        ]))
    }

    fn run(&self, call: &mut CheckerCall<'_>) -> Result<CheckReport, UnitError> {
        match &self.script {
            Script::Pass => {}
            Script::Fail(message) => return Err(UnitError::Failed(anyhow!("{message}"))),
            Script::Pending => return Err(UnitError::Pending),
            Script::Panic(message) => panic!("{message}"),
            Script::Raise(message) => call.errors().raise(anyhow!("{message}")),
            Script::Sleep(delay) => std::thread::sleep(*delay),
            Script::Leak(probe, name) => probe.push(name),
        }
        fan_out(self, call.targets(), call.deadline())
    }
}

/// Probe over a shared, test-controlled list of names.
#[derive(Debug, Clone, Default)]
pub struct SharedProbe(Arc<Mutex<Vec<String>>>);

impl SharedProbe {
    pub fn with(names: &[&str]) -> Self {
        let probe = Self::default();
        for name in names {
            probe.push(name);
        }
        probe
    }

    pub fn push(&self, name: &str) {
        match self.0.lock() {
            Ok(mut names) => names.push(name.to_string()),
            Err(poisoned) => poisoned.into_inner().push(name.to_string()),
        }
    }
}

impl EnvironmentProbe for SharedProbe {
    fn globals(&self) -> Vec<String> {
        match self.0.lock() {
            Ok(names) => names.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Records every event as one line of text.
///
/// Lines read `<event> <full title>`; failures append `: <message>` and
/// uncaught ones are tagged. Cloning shares the transcript.
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    lines: Rc<RefCell<Vec<String>>>,
}

impl RecordingListener {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Lines starting with `prefix`.
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.matching(prefix).len()
    }
}

impl RunListener for RecordingListener {
    fn on_event(&mut self, tree: &ScopeTree, event: &RunEvent<'_>) {
        let name = event.name();
        let line = match event {
            RunEvent::Start { total } => format!("{name} {total}"),
            RunEvent::End { failures } => format!("{name} {failures}"),
            RunEvent::Scope(scope) | RunEvent::ScopeEnd(scope) => {
                format!("{name} {}", tree.full_title(scope.id()))
            }
            RunEvent::Checker(entry)
            | RunEvent::CheckerEnd(entry, _)
            | RunEvent::Pending(entry)
            | RunEvent::Pass(entry, _) => {
                format!("{name} {}", tree.checker_full_title(entry.id()))
            }
            RunEvent::Hook(hook) | RunEvent::HookEnd(hook) => {
                format!("{name} {}", hook.title())
            }
            RunEvent::Fail {
                unit,
                error,
                uncaught,
            } => {
                let tag = if *uncaught { "uncaught " } else { "" };
                format!("{name} {tag}{}: {error}", unit.full_title(tree))
            }
        };
        self.lines.borrow_mut().push(line.trim_end().to_string());
    }
}

/// A temporary directory for files under test.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

//! Delegate each target to an external program.
//!
//! The program runs in the configuration's base directory, like config
//! hooks, and receives the absolute target path as its last argument.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::checker::Checker;
use crate::core::diagnostic::{CheckReport, Diagnostic, Severity};
use crate::io::process::{DEFAULT_OUTPUT_LIMIT_BYTES, ProcessLimits, run_command};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandOptions {
    pub program: String,
    /// Arguments placed before the target path.
    pub args: Vec<String>,
    /// Per-target limit; 0 waits indefinitely.
    pub timeout_ms: u64,
    pub output_limit_bytes: usize,
    pub severity: Severity,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            timeout_ms: 10_000,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            severity: Severity::Error,
        }
    }
}

impl CommandOptions {
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            bail!("command checker requires a program");
        }
        Ok(())
    }

    fn limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

pub struct CommandChecker {
    title: String,
    options: CommandOptions,
    program: PathBuf,
    base: PathBuf,
    globals: Vec<String>,
}

impl CommandChecker {
    /// A program given as a path (`./tool.sh`, `bin/lint`) resolves against
    /// `base`; a bare name is looked up on `PATH`.
    pub fn new(title: impl Into<String>, options: CommandOptions, base: &Path) -> Self {
        let program = if options.program.contains(['/', '\\']) {
            base.join(&options.program)
        } else {
            PathBuf::from(&options.program)
        };
        Self {
            title: title.into(),
            options,
            program,
            base: base.to_path_buf(),
            globals: Vec::new(),
        }
    }

    pub fn with_globals(mut self, globals: Vec<String>) -> Self {
        self.globals = globals;
        self
    }
}

impl Checker for CommandChecker {
    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> &str {
        "command"
    }

    fn check(&self, target: &Path) -> Result<CheckReport> {
        let target = self.base.join(target);
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.options.args)
            .arg(&target)
            .current_dir(&self.base);

        let output = run_command(cmd, self.options.limits())?;
        if output.timed_out {
            bail!(
                "{} timed out on {}",
                self.options.program,
                target.display()
            );
        }
        if output.success() {
            return Ok(CheckReport::default());
        }

        debug!(
            target = %target.display(),
            exit = %output.describe_exit(),
            "command reported problems"
        );
        let message = output.first_line().unwrap_or_else(|| {
            format!("{} failed with {}", self.options.program, output.describe_exit())
        });
        Ok(CheckReport::new(vec![
            Diagnostic::error(target.display().to_string(), message)
                .with_severity(self.options.severity)
                .rule("command"),
        ]))
    }

    fn allowed_globals(&self) -> &[String] {
        &self.globals
    }
}

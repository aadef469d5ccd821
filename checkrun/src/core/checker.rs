//! Checker contract: how a unit of work turns targets into diagnostics.
//!
//! A checker fans out [`Checker::check`] across every target concurrently and
//! joins the results. This is the only place the engine runs work in
//! parallel; the scheduler itself stays strictly sequential.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use rayon::prelude::*;
use tracing::debug;

use crate::core::context::ContextView;
use crate::core::diagnostic::CheckReport;
use crate::core::types::{Deadline, UnitError};

pub trait Checker: Send + Sync {
    fn title(&self) -> &str;

    /// Type tag of the concrete checker (e.g. `text`, `json`).
    fn kind(&self) -> &str;

    /// Check one target. Known-bad targets should become diagnostics; an
    /// `Err` fails the whole checker.
    fn check(&self, target: &Path) -> Result<CheckReport>;

    /// Extra global identifiers this checker is allowed to introduce.
    fn allowed_globals(&self) -> &[String] {
        &[]
    }

    fn run(&self, call: &mut CheckerCall<'_>) -> Result<CheckReport, UnitError> {
        let deadline = call.deadline();
        fan_out(self, call.targets(), deadline)
    }
}

/// Run `check` over every target in parallel and merge the reports.
///
/// Any failing target fails the join. Targets that would start after
/// `deadline` fail with a [`TimeoutError`](crate::core::types::TimeoutError).
pub fn fan_out<C>(
    checker: &C,
    targets: &[PathBuf],
    deadline: Option<Deadline>,
) -> Result<CheckReport, UnitError>
where
    C: Checker + ?Sized,
{
    debug!(checker = checker.title(), targets = targets.len(), "fan out");
    let reports = targets
        .par_iter()
        .map(|target| {
            if let Some(deadline) = deadline
                && deadline.expired()
            {
                return Err(anyhow!(deadline.error()));
            }
            checker
                .check(target)
                .map_err(|err| err.context(format!("check {}", target.display())))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CheckReport::merge(reports))
}

/// Out-of-band error channel. Safe to use from the parallel per-target work.
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Mutex<Vec<anyhow::Error>>,
}

impl ErrorSink {
    pub fn raise(&self, err: anyhow::Error) {
        match self.errors.lock() {
            Ok(mut errors) => errors.push(err),
            Err(poisoned) => poisoned.into_inner().push(err),
        }
    }

    pub(crate) fn drain(&self) -> Vec<anyhow::Error> {
        match self.errors.lock() {
            Ok(mut errors) => std::mem::take(&mut *errors),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

/// What a checker sees while it runs.
pub struct CheckerCall<'a> {
    pub(crate) targets: &'a [PathBuf],
    pub(crate) ctx: ContextView<'a>,
    pub(crate) errors: &'a ErrorSink,
    pub(crate) deadline: Option<Deadline>,
}

impl<'a> CheckerCall<'a> {
    pub fn new(
        targets: &'a [PathBuf],
        ctx: ContextView<'a>,
        errors: &'a ErrorSink,
        deadline: Option<Deadline>,
    ) -> Self {
        Self {
            targets,
            ctx,
            errors,
            deadline,
        }
    }

    pub fn targets(&self) -> &'a [PathBuf] {
        self.targets
    }

    pub fn ctx(&self) -> &ContextView<'a> {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut ContextView<'a> {
        &mut self.ctx
    }

    pub fn errors(&self) -> &'a ErrorSink {
        self.errors
    }

    pub fn deadline(&self) -> Option<Deadline> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostic::Diagnostic;
    use crate::core::types::TimeoutError;
    use std::time::{Duration, Instant};

    struct Slow;

    impl Checker for Slow {
        fn title(&self) -> &str {
            "slow"
        }

        fn kind(&self) -> &str {
            "test"
        }

        fn check(&self, target: &Path) -> Result<CheckReport> {
            let name = target.display().to_string();
            // a.js finishes last
            let delay = if name == "a.js" { 30 } else { 0 };
            std::thread::sleep(Duration::from_millis(delay));
            if name == "bad.js" {
                return Err(anyhow!("cannot read"));
            }
            Ok(CheckReport::new(vec![
                Diagnostic::error(name.clone(), "first"),
                Diagnostic::warning(name, "second"),
            ]))
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn aggregates_every_target_grouped_by_path() {
        let report = fan_out(&Slow, &paths(&["c.js", "a.js", "b.js"]), None).expect("report");
        let seen: Vec<(String, String)> = report
            .diagnostics
            .iter()
            .map(|d| (d.file_path.clone(), d.message.clone()))
            .collect();
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], ("a.js".to_string(), "first".to_string()));
        assert_eq!(seen[1], ("a.js".to_string(), "second".to_string()));
        assert_eq!(seen[5], ("c.js".to_string(), "second".to_string()));
    }

    #[test]
    fn one_failing_target_fails_the_join() {
        let err = fan_out(&Slow, &paths(&["a.js", "bad.js"]), None).expect_err("join fails");
        match err {
            UnitError::Failed(err) => assert!(format!("{err:#}").contains("cannot read")),
            UnitError::Pending => panic!("unexpected pending"),
        }
    }

    #[test]
    fn expired_deadline_fails_with_timeout() {
        let deadline = Deadline {
            at: Instant::now(),
            limit: Duration::from_millis(5),
        };
        let err = fan_out(&Slow, &paths(&["b.js"]), Some(deadline)).expect_err("timeout");
        match err {
            UnitError::Failed(err) => assert!(err.downcast_ref::<TimeoutError>().is_some()),
            UnitError::Pending => panic!("unexpected pending"),
        }
    }

    #[test]
    fn sink_drains_raised_errors() {
        let sink = ErrorSink::default();
        sink.raise(anyhow!("one"));
        sink.raise(anyhow!("two"));
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.drain().is_empty());
    }
}

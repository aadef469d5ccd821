//! Shared types for the scope tree and the scheduler.
//!
//! Ids index into the arenas owned by [`ScopeTree`](crate::core::scope::ScopeTree)
//! and are only meaningful for the tree that issued them.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CheckerId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookId(pub(crate) usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl CheckerId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl HookId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A schedulable unit: the thing a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runnable {
    Checker(CheckerId),
    Hook(HookId),
}

/// Lifecycle stage a hook is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStage {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl HookStage {
    pub const ALL: [HookStage; 4] = [
        HookStage::BeforeAll,
        HookStage::AfterAll,
        HookStage::BeforeEach,
        HookStage::AfterEach,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HookStage::BeforeAll => "before all",
            HookStage::AfterAll => "after all",
            HookStage::BeforeEach => "before each",
            HookStage::AfterEach => "after each",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            HookStage::BeforeAll => 0,
            HookStage::AfterAll => 1,
            HookStage::BeforeEach => 2,
            HookStage::AfterEach => 3,
        }
    }
}

/// Terminal state of a checker within one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    #[default]
    Unset,
    Passed,
    Failed,
}

/// How a hook or checker body reports that it did not succeed.
///
/// `Pending` is not a failure: it marks the unit as intentionally skipped.
#[derive(Debug)]
pub enum UnitError {
    Pending,
    Failed(anyhow::Error),
}

impl UnitError {
    pub fn failed(message: impl fmt::Display) -> Self {
        UnitError::Failed(anyhow::anyhow!("{message}"))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, UnitError::Pending)
    }
}

impl<E> From<E> for UnitError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        UnitError::Failed(err.into())
    }
}

/// Point in time a unit must finish by, with the limit it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub at: Instant,
    pub limit: Duration,
}

impl Deadline {
    pub fn after(limit: Duration) -> Self {
        Self {
            at: Instant::now() + limit,
            limit,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn error(&self) -> TimeoutError {
        TimeoutError { limit: self.limit }
    }
}

/// A unit ran past its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutError {
    pub limit: Duration,
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timeout of {}ms exceeded; make sure the unit completes in time",
            self.limit.as_millis()
        )
    }
}

impl std::error::Error for TimeoutError {}

/// New global identifiers appeared while a unit ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalLeakError {
    pub names: Vec<String>,
}

impl fmt::Display for GlobalLeakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.names.len() > 1 {
            write!(f, "global leaks detected: {}", self.names.join(", "))
        } else {
            write!(f, "global leak detected: {}", self.names.join(", "))
        }
    }
}

impl std::error::Error for GlobalLeakError {}

/// A unit panicked instead of reporting through its `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncaughtError {
    pub message: String,
}

impl UncaughtError {
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "a panic without a message was raised, panic with a string".to_string()
        };
        Self { message }
    }
}

impl fmt::Display for UncaughtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UncaughtError {}

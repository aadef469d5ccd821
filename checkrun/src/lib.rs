//! Hierarchical checker runner.
//!
//! Checkers (units that turn target files into diagnostics) are declared in a
//! tree of scopes, each with optional lifecycle hooks. A [`runner::Runner`]
//! walks the tree sequentially, emitting lifecycle events that a
//! [`report::Reporter`] turns into statistics and a failure list.
//!
//! - **[`core`]**: The tree model, events, contexts, selection and leak
//!   detection. No filesystem or process access.
//! - **[`io`]**: Config files, file lookup, child processes, the host
//!   environment.
//!
//! [`checkers`], [`format`] and [`report`] build the concrete tool on top.

pub mod checkers;
pub mod core;
pub mod exit_codes;
pub mod format;
pub mod io;
pub mod logging;
pub mod report;
pub mod runner;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

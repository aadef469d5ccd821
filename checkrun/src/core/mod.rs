//! Deterministic logic shared by the runner.
//!
//! Core modules are free of filesystem and process side effects. They define
//! the scope tree, the unit contracts and the bookkeeping the scheduler needs,
//! and operate on in-memory data suitable for tests.

pub mod checker;
pub mod context;
pub mod diagnostic;
pub mod events;
pub mod hook;
pub mod leaks;
pub mod patterns;
pub mod scope;
pub mod selector;
pub mod types;

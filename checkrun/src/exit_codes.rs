//! Stable exit codes for the checkrun CLI.

/// Every selected checker passed without error diagnostics.
pub const OK: i32 = 0;
/// At least one unit failed or a checker reported an error diagnostic.
pub const FAILURES: i32 = 1;
/// Bad invocation, unreadable configuration or unresolvable targets.
pub const INVALID: i32 = 2;

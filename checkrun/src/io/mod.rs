//! Side-effecting edges: config files, the filesystem, child processes and
//! the host environment.

pub mod config;
pub mod env_probe;
pub mod lookup;
pub mod process;

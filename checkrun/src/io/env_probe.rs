//! Host probe for leak detection: process environment variable names.

use crate::core::leaks::EnvironmentProbe;

/// Treats the process environment as the set of globals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvProbe;

impl EnvironmentProbe for ProcessEnvProbe {
    fn globals(&self) -> Vec<String> {
        let mut names: Vec<String> = std::env::vars_os()
            .filter_map(|(name, _)| name.into_string().ok())
            .collect();
        names.sort();
        names
    }
}

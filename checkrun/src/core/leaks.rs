//! Global-state leak detection.
//!
//! The runner snapshots the names of process-global identifiers after every
//! unit and reports names that were not there before and are not allow-listed.
//! What counts as a "global" is host specific and comes from an
//! [`EnvironmentProbe`]; the diff and the allow-list matching live here.
//!
//! Snapshots are only diffed when the number of names changed. A unit that
//! removes one global and adds another in the same step goes unnoticed.

use tracing::{debug, warn};

/// Enumerates the names of process-global identifiers.
pub trait EnvironmentProbe {
    fn globals(&self) -> Vec<String>;

    /// Host artifacts that are never reported.
    fn is_exempt(&self, name: &str) -> bool {
        host_exempt(name)
    }
}

/// Names starting with a digit are host indices, names with the tool's own
/// prefix are set by the runner itself.
pub fn host_exempt(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_digit()) || name.starts_with("CHECKRUN_")
}

/// Exact name or `prefix*` wildcard.
pub fn allow_listed(allowed: &[String], name: &str) -> bool {
    allowed.iter().any(|ok| match ok.split_once('*') {
        Some((prefix, _)) => name.starts_with(prefix),
        None => name == ok,
    })
}

pub struct LeakDetector {
    probe: Box<dyn EnvironmentProbe>,
    allowed: Vec<String>,
    prev_len: Option<usize>,
    enabled: bool,
}

impl LeakDetector {
    /// Everything visible right now is allowed.
    pub fn new(probe: Box<dyn EnvironmentProbe>) -> Self {
        let allowed = probe.globals();
        Self {
            probe,
            allowed,
            prev_len: None,
            enabled: true,
        }
    }

    pub fn disabled(probe: Box<dyn EnvironmentProbe>) -> Self {
        Self {
            enabled: false,
            ..Self::new(probe)
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn allow(&mut self, names: impl IntoIterator<Item = String>) {
        let names: Vec<String> = names.into_iter().collect();
        debug!(?names, "allow globals");
        self.allowed.extend(names);
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// New leaked names since the last snapshot. Reported names join the
    /// allow-list so each leak is reported once.
    pub fn check(&mut self, extra_allowed: &[String]) -> Vec<String> {
        if !self.enabled {
            return Vec::new();
        }
        let globals = self.probe.globals();
        if self.prev_len == Some(globals.len()) {
            return Vec::new();
        }
        self.prev_len = Some(globals.len());

        let leaks: Vec<String> = globals
            .into_iter()
            .filter(|name| !self.probe.is_exempt(name))
            .filter(|name| !allow_listed(&self.allowed, name))
            .filter(|name| !allow_listed(extra_allowed, name))
            .collect();
        if !leaks.is_empty() {
            warn!(?leaks, "global leak detected");
            self.allowed.extend(leaks.iter().cloned());
        }
        leaks
    }
}

//! Chained fixture state shared by hooks and checkers along a scope lineage.
//!
//! Each scope owns one frame. A read that misses locally falls through to the
//! parent frame, a write always lands in the frame it was issued against.
//! Frames never own their parents; the chain is just a parent index.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::scope::ScopeTree;
use crate::core::types::{Runnable, ScopeId};

#[derive(Debug, Clone, Default, Serialize)]
struct Frame {
    #[serde(skip)]
    parent: Option<ScopeId>,
    values: BTreeMap<String, Value>,
    #[serde(skip)]
    runnable: Option<Runnable>,
}

/// All context frames for one run, indexed by scope.
#[derive(Debug, Clone, Default)]
pub struct Contexts {
    frames: Vec<Frame>,
}

impl Contexts {
    /// Build frames mirroring `tree`, seeded with declaration-time fixtures.
    pub fn for_tree(tree: &ScopeTree) -> Self {
        let frames = tree
            .scopes()
            .map(|scope| Frame {
                parent: scope.parent(),
                values: scope.fixtures().clone(),
                runnable: None,
            })
            .collect();
        Self { frames }
    }

    pub fn view(&mut self, scope: ScopeId) -> ContextView<'_> {
        ContextView {
            contexts: self,
            scope,
        }
    }

    pub fn get(&self, scope: ScopeId, key: &str) -> Option<&Value> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = self.frames.get(id.index())?;
            if let Some(value) = frame.values.get(key) {
                return Some(value);
            }
            current = frame.parent;
        }
        None
    }

    pub(crate) fn set_runnable(&mut self, scope: ScopeId, runnable: Option<Runnable>) {
        if let Some(frame) = self.frames.get_mut(scope.index()) {
            frame.runnable = runnable;
        }
    }

    /// Flatten the visible values for `scope`, nearest frame winning.
    pub fn resolved(&self, scope: ScopeId) -> BTreeMap<String, Value> {
        let mut chain = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let Some(frame) = self.frames.get(id.index()) else {
                break;
            };
            chain.push(frame);
            current = frame.parent;
        }
        let mut out = BTreeMap::new();
        for frame in chain.into_iter().rev() {
            for (key, value) in &frame.values {
                out.insert(key.clone(), value.clone());
            }
        }
        out
    }
}

/// A mutable handle onto one scope's frame, reading through its ancestors.
#[derive(Debug)]
pub struct ContextView<'a> {
    contexts: &'a mut Contexts,
    scope: ScopeId,
}

impl<'a> ContextView<'a> {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.contexts.get(self.scope, key)
    }

    /// Read and deserialize a value, `None` when missing or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// True only when the key is set on this frame, not inherited.
    pub fn has_own(&self, key: &str) -> bool {
        self.frame().values.contains_key(key)
    }

    /// Write locally, shadowing any ancestor value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.frame_mut().values.insert(key.into(), value.into());
    }

    /// Remove a local value; an inherited one becomes visible again.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.frame_mut().values.remove(key)
    }

    /// Reborrow the parent frame to write into an ancestor explicitly.
    pub fn parent(&mut self) -> Option<ContextView<'_>> {
        let parent = self.frame().parent?;
        Some(ContextView {
            contexts: &mut *self.contexts,
            scope: parent,
        })
    }

    /// Every visible key with its nearest value.
    pub fn resolved(&self) -> BTreeMap<String, Value> {
        self.contexts.resolved(self.scope)
    }

    /// The unit currently executing against this frame.
    pub fn runnable(&self) -> Option<Runnable> {
        self.frame().runnable
    }

    /// Own values as pretty JSON, without the runnable back-reference.
    pub fn inspect(&self) -> String {
        serde_json::to_string_pretty(self.frame()).unwrap_or_else(|_| "{}".to_string())
    }

    fn frame(&self) -> &Frame {
        &self.contexts.frames[self.scope.index()]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.contexts.frames[self.scope.index()]
    }
}

//! Lifecycle hooks.

use std::cell::RefCell;
use std::fmt;

use crate::core::context::ContextView;
use crate::core::scope::CheckerEntry;
use crate::core::types::{Deadline, HookId, HookStage, ScopeId, UnitError};
use crate::runner::AbortHandle;

/// Hook body. Receives the call handle for the current invocation.
pub type HookFn = Box<dyn Fn(&mut HookCall<'_>) -> Result<(), UnitError>>;

pub struct Hook {
    pub(crate) id: HookId,
    pub(crate) title: String,
    pub(crate) stage: HookStage,
    pub(crate) scope: ScopeId,
    pub(crate) body: HookFn,
    captured: RefCell<Option<anyhow::Error>>,
}

impl Hook {
    pub(crate) fn new(
        id: HookId,
        stage: HookStage,
        name: &str,
        scope: ScopeId,
        body: HookFn,
    ) -> Self {
        Self {
            id,
            title: hook_title(stage, name),
            stage,
            scope,
            body,
            captured: RefCell::new(None),
        }
    }

    pub fn id(&self) -> HookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn stage(&self) -> HookStage {
        self.stage
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Record an error against the checker the hook is running around.
    ///
    /// Only the most recent error is kept.
    pub fn set_error(&self, err: anyhow::Error) {
        *self.captured.borrow_mut() = Some(err);
    }

    /// Take the captured error, leaving none behind.
    pub fn take_error(&self) -> Option<anyhow::Error> {
        self.captured.borrow_mut().take()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("stage", &self.stage)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// `"before each" hook: name`, or without the suffix when unnamed.
pub fn hook_title(stage: HookStage, name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        format!("\"{}\" hook", stage.label())
    } else {
        format!("\"{}\" hook: {}", stage.label(), name)
    }
}

/// What a hook body sees while it runs.
pub struct HookCall<'a> {
    pub(crate) hook: &'a Hook,
    pub(crate) ctx: ContextView<'a>,
    pub(crate) checker: Option<&'a CheckerEntry>,
    pub(crate) abort: &'a AbortHandle,
    pub(crate) deadline: Option<Deadline>,
}

impl<'a> HookCall<'a> {
    pub fn hook(&self) -> &Hook {
        self.hook
    }

    pub fn ctx(&self) -> &ContextView<'a> {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut ContextView<'a> {
        &mut self.ctx
    }

    /// The checker a `before each`/`after each` hook is wrapped around.
    pub fn current_checker(&self) -> Option<&CheckerEntry> {
        self.checker
    }

    /// Fail the current checker without failing the hook itself.
    pub fn fail_checker(&self, err: anyhow::Error) {
        self.hook.set_error(err);
    }

    pub fn abort_handle(&self) -> &AbortHandle {
        self.abort
    }

    /// Deadline for this invocation; bodies doing long work should poll it.
    pub fn deadline(&self) -> Option<Deadline> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_follow_stage_and_name() {
        assert_eq!(hook_title(HookStage::BeforeAll, ""), "\"before all\" hook");
        assert_eq!(
            hook_title(HookStage::AfterEach, "reset cache"),
            "\"after each\" hook: reset cache"
        );
    }

    #[test]
    fn captured_error_is_cleared_on_read() {
        let hook = Hook::new(
            HookId(0),
            HookStage::AfterEach,
            "",
            ScopeId(0),
            Box::new(|_| Ok(())),
        );
        hook.set_error(anyhow::anyhow!("first"));
        hook.set_error(anyhow::anyhow!("second"));
        assert_eq!(hook.take_error().expect("error").to_string(), "second");
        assert!(hook.take_error().is_none());
    }
}

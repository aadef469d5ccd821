//! Scope tree: declaration-time structure of scopes, checkers and hooks.
//!
//! The tree is an arena. Scopes refer to their parent and children by
//! [`ScopeId`]; checkers and hooks live in their own arenas. Nothing here
//! executes anything; the runner walks the finished tree.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::core::checker::Checker;
use crate::core::hook::{Hook, HookCall};
use crate::core::types::{CheckerId, HookId, HookStage, ScopeId, UnitError};

/// Emitted while the tree is being declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    Scope(ScopeId),
    Checker(CheckerId),
    Hook(HookId),
}

type DeclarationListener = Box<dyn FnMut(&ScopeTree, Declaration)>;

#[derive(Debug, Clone)]
pub struct Scope {
    id: ScopeId,
    title: String,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    checkers: Vec<CheckerId>,
    ignores: Vec<String>,
    pending: bool,
    bail: bool,
    hooks: [Vec<HookId>; 4],
    fixtures: BTreeMap<String, Value>,
}

impl Scope {
    fn new(id: ScopeId, title: &str, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            title: title.to_string(),
            parent,
            children: Vec::new(),
            checkers: Vec::new(),
            ignores: Vec::new(),
            pending: false,
            bail: false,
            hooks: Default::default(),
            fixtures: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn checkers(&self) -> &[CheckerId] {
        &self.checkers
    }

    /// Ignore patterns in declaration order; `!` marks a re-include.
    pub fn ignores(&self) -> &[String] {
        &self.ignores
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn bail(&self) -> bool {
        self.bail
    }

    pub fn hooks(&self, stage: HookStage) -> &[HookId] {
        &self.hooks[stage.slot()]
    }

    pub fn fixtures(&self) -> &BTreeMap<String, Value> {
        &self.fixtures
    }
}

/// A checker bound to its owning scope.
pub struct CheckerEntry {
    id: CheckerId,
    scope: ScopeId,
    pending: bool,
    checker: Box<dyn Checker>,
}

impl CheckerEntry {
    pub fn id(&self) -> CheckerId {
        self.id
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn title(&self) -> &str {
        self.checker.title()
    }

    pub fn kind(&self) -> &str {
        self.checker.kind()
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn checker(&self) -> &dyn Checker {
        self.checker.as_ref()
    }
}

impl fmt::Debug for CheckerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerEntry")
            .field("id", &self.id)
            .field("title", &self.title())
            .field("kind", &self.kind())
            .field("scope", &self.scope)
            .field("pending", &self.pending)
            .finish()
    }
}

pub struct ScopeTree {
    scopes: Vec<Scope>,
    checkers: Vec<CheckerEntry>,
    hooks: Vec<Hook>,
    listener: Option<DeclarationListener>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScopeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeTree")
            .field("scopes", &self.scopes)
            .field("checkers", &self.checkers)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl ScopeTree {
    /// A tree holding only the untitled root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeId(0), "", None)],
            checkers: Vec::new(),
            hooks: Vec::new(),
            listener: None,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Observe declarations made after this call.
    pub fn on_declare(&mut self, listener: impl FnMut(&ScopeTree, Declaration) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn checker(&self, id: CheckerId) -> &CheckerEntry {
        &self.checkers[id.index()]
    }

    pub fn hook(&self, id: HookId) -> &Hook {
        &self.hooks[id.index()]
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn checker_count(&self) -> usize {
        self.checkers.len()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Declare a child scope. It inherits `bail` and `pending` from `parent`
    /// at this moment; later changes to the parent do not propagate.
    pub fn add_scope(&mut self, parent: ScopeId, title: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let mut scope = Scope::new(id, title, Some(parent));
        let parent_scope = self.scope(parent);
        scope.pending = parent_scope.pending;
        scope.bail = parent_scope.bail;
        self.scopes.push(scope);
        self.scopes[parent.index()].children.push(id);
        debug!(scope = %self.full_title(id), "declare scope");
        self.declared(Declaration::Scope(id));
        id
    }

    /// Declare a scope whose checkers are all pending.
    pub fn add_pending_scope(&mut self, parent: ScopeId, title: &str) -> ScopeId {
        let id = self.add_scope(parent, title);
        self.scopes[id.index()].pending = true;
        id
    }

    pub fn add_checker(&mut self, scope: ScopeId, checker: Box<dyn Checker>) -> CheckerId {
        let id = CheckerId(self.checkers.len());
        let pending = self.scope(scope).pending;
        self.checkers.push(CheckerEntry {
            id,
            scope,
            pending,
            checker,
        });
        self.scopes[scope.index()].checkers.push(id);
        self.declared(Declaration::Checker(id));
        id
    }

    pub fn add_pending_checker(&mut self, scope: ScopeId, checker: Box<dyn Checker>) -> CheckerId {
        let id = self.add_checker(scope, checker);
        self.checkers[id.index()].pending = true;
        id
    }

    /// Register a hook. Returns `None` (and registers nothing) on a pending scope.
    pub fn add_hook<F>(&mut self, scope: ScopeId, stage: HookStage, name: &str, body: F) -> Option<HookId>
    where
        F: Fn(&mut HookCall<'_>) -> Result<(), UnitError> + 'static,
    {
        if self.scope(scope).pending {
            return None;
        }
        let id = HookId(self.hooks.len());
        self.hooks
            .push(Hook::new(id, stage, name, scope, Box::new(body)));
        self.scopes[scope.index()].hooks[stage.slot()].push(id);
        self.declared(Declaration::Hook(id));
        Some(id)
    }

    pub fn before_all<F>(&mut self, scope: ScopeId, name: &str, body: F) -> Option<HookId>
    where
        F: Fn(&mut HookCall<'_>) -> Result<(), UnitError> + 'static,
    {
        self.add_hook(scope, HookStage::BeforeAll, name, body)
    }

    pub fn after_all<F>(&mut self, scope: ScopeId, name: &str, body: F) -> Option<HookId>
    where
        F: Fn(&mut HookCall<'_>) -> Result<(), UnitError> + 'static,
    {
        self.add_hook(scope, HookStage::AfterAll, name, body)
    }

    pub fn before_each<F>(&mut self, scope: ScopeId, name: &str, body: F) -> Option<HookId>
    where
        F: Fn(&mut HookCall<'_>) -> Result<(), UnitError> + 'static,
    {
        self.add_hook(scope, HookStage::BeforeEach, name, body)
    }

    pub fn after_each<F>(&mut self, scope: ScopeId, name: &str, body: F) -> Option<HookId>
    where
        F: Fn(&mut HookCall<'_>) -> Result<(), UnitError> + 'static,
    {
        self.add_hook(scope, HookStage::AfterEach, name, body)
    }

    pub fn set_bail(&mut self, scope: ScopeId, bail: bool) {
        self.scopes[scope.index()].bail = bail;
    }

    /// Exclude targets matching `pattern` from this scope's checkers.
    pub fn excludes(&mut self, scope: ScopeId, pattern: &str) {
        self.scopes[scope.index()].ignores.push(pattern.to_string());
    }

    /// Re-include targets matching `pattern` after an earlier exclusion.
    pub fn includes(&mut self, scope: ScopeId, pattern: &str) {
        self.scopes[scope.index()]
            .ignores
            .push(format!("!{pattern}"));
    }

    /// Attach a declaration-time value to the scope's context frame.
    pub fn set_fixture(&mut self, scope: ScopeId, key: &str, value: Value) {
        self.scopes[scope.index()]
            .fixtures
            .insert(key.to_string(), value);
    }

    pub fn full_title(&self, id: ScopeId) -> String {
        let scope = self.scope(id);
        if let Some(parent) = scope.parent {
            let full = self.full_title(parent);
            if !full.is_empty() {
                return format!("{} {}", full, scope.title);
            }
        }
        scope.title.clone()
    }

    pub fn checker_full_title(&self, id: CheckerId) -> String {
        let entry = self.checker(id);
        let scope_title = self.full_title(entry.scope);
        if scope_title.is_empty() {
            entry.title().to_string()
        } else {
            format!("{} {}", scope_title, entry.title())
        }
    }

    /// `id` followed by its ancestors, nearest first.
    pub fn lineage(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut out = vec![id];
        let mut current = self.scope(id).parent;
        while let Some(parent) = current {
            out.push(parent);
            current = self.scope(parent).parent;
        }
        out
    }

    /// Declaration-time checker count over the subtree.
    pub fn total(&self, id: ScopeId) -> usize {
        let scope = self.scope(id);
        scope.checkers.len()
            + scope
                .children
                .iter()
                .map(|child| self.total(*child))
                .sum::<usize>()
    }

    /// Visit every checker in the subtree, own checkers before children's.
    pub fn each_checker(&self, id: ScopeId, f: &mut impl FnMut(&CheckerEntry)) {
        let scope = self.scope(id);
        for checker in &scope.checkers {
            f(self.checker(*checker));
        }
        for child in &scope.children {
            self.each_checker(*child, f);
        }
    }

    fn declared(&mut self, declaration: Declaration) {
        if let Some(mut listener) = self.listener.take() {
            listener(self, declaration);
            self.listener = Some(listener);
        }
    }
}

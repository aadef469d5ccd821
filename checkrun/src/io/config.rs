//! Checkrun configuration (`checkrun.toml`) and turning it into a scope tree.
//!
//! Several files may contribute: `.config/checkrun.toml` and `checkrun.toml`
//! are picked up from the working directory when present, then any explicit
//! `-c` files. Scalar settings from later files win; scopes and lists are
//! appended in load order.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::checkers::CheckerKind;
use crate::core::hook::HookCall;
use crate::core::patterns::IgnoreSet;
use crate::core::scope::ScopeTree;
use crate::core::types::{HookStage, ScopeId, UnitError};
use crate::io::process::{ProcessLimits, run_command};

/// Looked up relative to the working directory, in this order.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = [".config/checkrun.toml", "checkrun.toml"];

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SLOW_MS: u64 = 2_000;

/// Prefix of the environment variables that expose context values to hook
/// commands.
pub const CONTEXT_ENV_PREFIX: &str = "CHECKRUN_CTX_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CheckrunConfig {
    /// Stop at the first failure.
    pub bail: Option<bool>,
    /// Per-unit limit in milliseconds; 0 disables it.
    pub timeout_ms: Option<u64>,
    /// Units slower than this are logged.
    pub slow_ms: Option<u64>,
    pub ignore_leaks: Option<bool>,
    /// Allow-listed global names (`prefix*` wildcards allowed).
    pub globals: Vec<String>,
    pub formatter: Option<String>,
    /// Extensions picked up when walking directories; empty means any.
    pub extensions: Vec<String>,
    #[serde(rename = "scope")]
    pub scopes: Vec<ScopeSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeSpec {
    pub title: String,
    pub pending: bool,
    /// Raw ignore patterns; a leading `!` re-includes.
    pub ignores: Vec<String>,
    pub excludes: Vec<String>,
    pub includes: Vec<String>,
    pub fixtures: BTreeMap<String, Value>,
    pub hooks: Vec<HookSpec>,
    pub checkers: Vec<CheckerSpec>,
    pub scopes: Vec<ScopeSpec>,
    /// Directory of the file that declared this scope.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HookSpec {
    pub stage: HookStage,
    #[serde(default)]
    pub name: Option<String>,
    /// Program followed by its arguments, e.g. `["just", "prepare"]`.
    pub command: Vec<String>,
}

impl HookSpec {
    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.command.join(" "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckerSpec {
    /// Defaults to the checker type.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub pending: bool,
    /// Extra allowed globals for this checker only.
    #[serde(default)]
    pub globals: Vec<String>,
    #[serde(flatten)]
    pub kind: CheckerKind,
}

impl CheckerSpec {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.kind.name())
    }
}

impl CheckrunConfig {
    pub fn bail(&self) -> bool {
        self.bail.unwrap_or(false)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn slow_ms(&self) -> u64 {
        self.slow_ms.unwrap_or(DEFAULT_SLOW_MS)
    }

    pub fn ignore_leaks(&self) -> bool {
        self.ignore_leaks.unwrap_or(false)
    }

    pub fn validate(&self) -> Result<()> {
        for scope in &self.scopes {
            scope.validate()?;
        }
        if let Some(formatter) = &self.formatter
            && formatter.trim().is_empty()
        {
            bail!("formatter must not be empty");
        }
        Ok(())
    }

    /// Fold `other` into `self`, `other` taking precedence for scalars.
    pub fn merge(&mut self, other: CheckrunConfig) {
        self.bail = other.bail.or(self.bail);
        self.timeout_ms = other.timeout_ms.or(self.timeout_ms);
        self.slow_ms = other.slow_ms.or(self.slow_ms);
        self.ignore_leaks = other.ignore_leaks.or(self.ignore_leaks);
        self.formatter = other.formatter.or(self.formatter.take());
        self.globals.extend(other.globals);
        self.extensions.extend(other.extensions);
        self.scopes.extend(other.scopes);
    }

    pub fn has_checkers(&self) -> bool {
        self.scopes.iter().any(ScopeSpec::has_checkers)
    }
}

impl ScopeSpec {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("scope title must not be empty");
        }
        let context = || format!("scope '{}'", self.title);
        IgnoreSet::parse(&self.ignores).with_context(context)?;
        IgnoreSet::parse(&self.excludes).with_context(context)?;
        IgnoreSet::parse(&self.includes).with_context(context)?;
        for hook in &self.hooks {
            if hook.command.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(anyhow!("hook command must be a non-empty array")).with_context(context);
            }
        }
        for checker in &self.checkers {
            if checker.title().trim().is_empty() {
                return Err(anyhow!("checker title must not be empty")).with_context(context);
            }
            checker
                .kind
                .validate()
                .with_context(|| format!("checker '{}'", checker.title()))
                .with_context(context)?;
        }
        for child in &self.scopes {
            child.validate().with_context(context)?;
        }
        Ok(())
    }

    fn has_checkers(&self) -> bool {
        !self.checkers.is_empty() || self.scopes.iter().any(ScopeSpec::has_checkers)
    }

    fn set_base_dir(&mut self, dir: &Path) {
        self.base_dir = dir.to_path_buf();
        for child in &mut self.scopes {
            child.set_base_dir(dir);
        }
    }
}

/// Load and validate one config file.
pub fn load_config(path: &Path) -> Result<CheckrunConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut cfg: CheckrunConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    for scope in &mut cfg.scopes {
        scope.set_base_dir(&base);
    }
    Ok(cfg)
}

/// Load the default files that exist under `cwd`, then every explicit file.
///
/// Explicit files must exist; missing defaults are skipped.
pub fn discover_config(cwd: &Path, explicit: &[PathBuf]) -> Result<CheckrunConfig> {
    let mut merged = CheckrunConfig::default();
    for name in DEFAULT_CONFIG_FILES {
        let path = cwd.join(name);
        if path.is_file() {
            debug!(path = %path.display(), "loading default config");
            merged.merge(load_config(&path)?);
        }
    }
    for path in explicit {
        let path = if path.is_absolute() {
            path.clone()
        } else {
            cwd.join(path)
        };
        debug!(path = %path.display(), "loading config");
        merged.merge(load_config(&path)?);
    }
    Ok(merged)
}

/// Declare every configured scope under the tree's root.
pub fn build_tree(cfg: &CheckrunConfig) -> Result<ScopeTree> {
    let mut tree = ScopeTree::new();
    let root = tree.root();
    tree.set_bail(root, cfg.bail());
    for spec in &cfg.scopes {
        declare_scope(&mut tree, root, spec)?;
    }
    info!(
        scopes = tree.scope_count() - 1,
        checkers = tree.checker_count(),
        hooks = tree.hook_count(),
        "declared scope tree"
    );
    Ok(tree)
}

fn declare_scope(tree: &mut ScopeTree, parent: ScopeId, spec: &ScopeSpec) -> Result<()> {
    let id = if spec.pending {
        tree.add_pending_scope(parent, &spec.title)
    } else {
        tree.add_scope(parent, &spec.title)
    };
    for pattern in &spec.ignores {
        match pattern.strip_prefix('!') {
            Some(rest) => tree.includes(id, rest),
            None => tree.excludes(id, pattern),
        }
    }
    for pattern in &spec.excludes {
        tree.excludes(id, pattern);
    }
    for pattern in &spec.includes {
        tree.includes(id, pattern);
    }
    for (key, value) in &spec.fixtures {
        tree.set_fixture(id, key, value.clone());
    }
    for hook in &spec.hooks {
        let name = hook.display_name();
        let body = command_hook(hook.command.clone(), spec.base_dir.clone());
        tree.add_hook(id, hook.stage, &name, body);
    }
    for checker in &spec.checkers {
        let built = checker
            .kind
            .build(checker.title(), checker.globals.clone(), &spec.base_dir)
            .with_context(|| format!("build checker '{}'", checker.title()))?;
        if checker.pending {
            tree.add_pending_checker(id, built);
        } else {
            tree.add_checker(id, built);
        }
    }
    for child in &spec.scopes {
        declare_scope(tree, id, child)?;
    }
    Ok(())
}

/// A hook body that runs `command` in `dir`, exporting the visible context.
///
/// The command gets whatever remains of the hook's deadline; a non-zero exit
/// fails the hook.
pub fn command_hook(
    command: Vec<String>,
    dir: PathBuf,
) -> impl Fn(&mut HookCall<'_>) -> Result<(), UnitError> + 'static {
    move |call: &mut HookCall<'_>| {
        let Some((program, args)) = command.split_first() else {
            return Err(UnitError::failed("empty hook command"));
        };
        let mut cmd = Command::new(program);
        cmd.args(args);
        if dir.is_dir() {
            cmd.current_dir(&dir);
        }
        for (key, value) in call.ctx().resolved() {
            cmd.env(context_env_name(&key), context_env_value(&value));
        }
        if let Some(checker) = call.current_checker() {
            cmd.env("CHECKRUN_CHECKER", checker.title());
        }

        let deadline = call.deadline();
        let limits = ProcessLimits {
            timeout: deadline.map(|deadline| deadline.remaining()),
            ..ProcessLimits::default()
        };
        let output = run_command(cmd, limits)?;
        if output.timed_out
            && let Some(deadline) = deadline
        {
            return Err(deadline.error().into());
        }
        if !output.success() {
            let detail = output
                .first_line()
                .map(|line| format!(": {line}"))
                .unwrap_or_default();
            return Err(UnitError::failed(format!(
                "{} failed with {}{}",
                command.join(" "),
                output.describe_exit(),
                detail
            )));
        }
        Ok(())
    }
}

/// `build-dir` becomes `CHECKRUN_CTX_BUILD_DIR`.
pub fn context_env_name(key: &str) -> String {
    let mut name = String::from(CONTEXT_ENV_PREFIX);
    name.extend(key.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        }
    }));
    name
}

/// Strings pass through unquoted; everything else is JSON.
fn context_env_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestWorkspace;

    const SAMPLE: &str = r#"
bail = true
timeout_ms = 500
globals = ["CI", "npm_*"]

[[scope]]
title = "docs"
excludes = ["**/vendor/**"]
fixtures = { owner = "docs-team", width = 80 }

[[scope.hooks]]
stage = "before_all"
command = ["true"]

[[scope.checkers]]
type = "text"
title = "markdown style"
maximum_line_length = 100
final_newline = true

[[scope.scopes]]
title = "data"
pending = true

[[scope.scopes.checkers]]
type = "json"
required = ["name"]
"#;

    #[test]
    fn parses_nested_scopes() {
        let cfg: CheckrunConfig = toml::from_str(SAMPLE).expect("parse");
        cfg.validate().expect("valid");
        assert!(cfg.bail());
        assert_eq!(cfg.timeout_ms(), 500);
        assert_eq!(cfg.slow_ms(), DEFAULT_SLOW_MS);
        let docs = &cfg.scopes[0];
        assert_eq!(docs.hooks[0].stage, HookStage::BeforeAll);
        assert_eq!(docs.hooks[0].display_name(), "true");
        assert_eq!(docs.checkers[0].title(), "markdown style");
        assert_eq!(docs.scopes[0].checkers[0].title(), "json");
        assert!(cfg.has_checkers());
    }

    #[test]
    fn builds_the_tree() {
        let cfg: CheckrunConfig = toml::from_str(SAMPLE).expect("parse");
        let tree = build_tree(&cfg).expect("tree");
        assert!(tree.scope(tree.root()).bail());
        assert_eq!(tree.scope_count(), 3);
        assert_eq!(tree.checker_count(), 2);
        assert_eq!(tree.hook_count(), 1);
        let docs = tree.scope(tree.root()).children()[0];
        assert_eq!(tree.scope(docs).ignores(), ["**/vendor/**".to_string()]);
        assert_eq!(tree.scope(docs).fixtures()["width"], serde_json::json!(80));
        let data = tree.scope(docs).children()[0];
        assert!(tree.scope(data).pending());
        assert_eq!(tree.total(tree.root()), 2);
    }

    #[test]
    fn rejects_bad_configs() {
        let cases = [
            ("[[scope]]\ntitle = \"\"\n", "scope title must not be empty"),
            (
                "[[scope]]\ntitle = \"x\"\n[[scope.hooks]]\nstage = \"before_all\"\ncommand = []\n",
                "hook command must be a non-empty array",
            ),
            (
                "[[scope]]\ntitle = \"x\"\n[[scope.checkers]]\ntype = \"text\"\nmaximum_line_length = 0\n",
                "maximum_line_length must be > 0",
            ),
            (
                "[[scope]]\ntitle = \"x\"\nexcludes = [\"a[\"]\n",
                "invalid ignore pattern",
            ),
        ];
        for (source, expected) in cases {
            let cfg: CheckrunConfig = toml::from_str(source).expect("parse");
            let err = cfg.validate().expect_err(source);
            assert!(
                format!("{err:#}").contains(expected),
                "{source}: {err:#}"
            );
        }
    }

    #[test]
    fn unknown_stage_is_a_parse_error() {
        let source = "[[scope]]\ntitle = \"x\"\n[[scope.hooks]]\nstage = \"around\"\ncommand = [\"true\"]\n";
        assert!(toml::from_str::<CheckrunConfig>(source).is_err());
    }

    #[test]
    fn later_files_win_for_scalars_and_append_scopes() {
        let ws = TestWorkspace::new().expect("workspace");
        ws.write(
            ".config/checkrun.toml",
            "timeout_ms = 100\nformatter = \"json\"\n[[scope]]\ntitle = \"a\"\n",
        )
        .expect("write");
        ws.write("checkrun.toml", "timeout_ms = 0\n[[scope]]\ntitle = \"b\"\n")
            .expect("write");
        ws.write("extra/more.toml", "bail = true\n[[scope]]\ntitle = \"c\"\n")
            .expect("write");

        let cfg = discover_config(ws.path(), &[PathBuf::from("extra/more.toml")]).expect("load");
        assert_eq!(cfg.timeout_ms(), 0);
        assert_eq!(cfg.formatter.as_deref(), Some("json"));
        assert!(cfg.bail());
        let titles: Vec<&str> = cfg.scopes.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(cfg.scopes[2].base_dir, ws.path().join("extra"));
    }

    #[test]
    fn missing_defaults_are_fine_but_explicit_files_are_not() {
        let ws = TestWorkspace::new().expect("workspace");
        let cfg = discover_config(ws.path(), &[]).expect("empty");
        assert!(!cfg.has_checkers());
        assert!(discover_config(ws.path(), &[PathBuf::from("nope.toml")]).is_err());
    }

    #[test]
    fn env_names_are_upper_snake() {
        assert_eq!(context_env_name("build-dir"), "CHECKRUN_CTX_BUILD_DIR");
        assert_eq!(context_env_value(&serde_json::json!("x")), "x");
        assert_eq!(context_env_value(&serde_json::json!([1, 2])), "[1,2]");
    }
}

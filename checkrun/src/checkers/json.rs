//! JSON syntax, required keys and optional schema validation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use jsonschema::{Validator, validator_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::checker::Checker;
use crate::core::diagnostic::{CheckReport, Diagnostic};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Schema file, relative to the config file that declared the checker.
    pub schema: Option<PathBuf>,
    /// Top-level keys every document must carry.
    pub required: Vec<String>,
}

pub struct JsonChecker {
    title: String,
    required: Vec<String>,
    schema: Option<Validator>,
    globals: Vec<String>,
}

impl JsonChecker {
    /// Build a checker, compiling the schema (if any) resolved against `base`.
    pub fn new(title: impl Into<String>, options: &JsonOptions, base: &Path) -> Result<Self> {
        let schema = match &options.schema {
            Some(path) => Some(load_schema(&base.join(path))?),
            None => None,
        };
        Ok(Self {
            title: title.into(),
            required: options.required.clone(),
            schema,
            globals: Vec::new(),
        })
    }

    pub fn with_globals(mut self, globals: Vec<String>) -> Self {
        self.globals = globals;
        self
    }

    pub fn check_source(&self, file: &str, source: &str) -> Vec<Diagnostic> {
        let value: Value = match serde_json::from_str(source) {
            Ok(value) => value,
            Err(err) => {
                return vec![
                    Diagnostic::error(file, format!("Parsing error: {err}"))
                        .at(err.line(), err.column())
                        .fatal(),
                ];
            }
        };

        let mut out = Vec::new();
        for key in &self.required {
            if value.get(key).is_none() {
                out.push(
                    Diagnostic::error(file, format!("Missing required key '{key}'"))
                        .at(1, 1)
                        .rule("required-key"),
                );
            }
        }
        if let Some(schema) = &self.schema {
            out.extend(schema.iter_errors(&value).map(|err| {
                Diagnostic::error(file, err.to_string()).rule("schema")
            }));
        }
        out
    }
}

fn load_schema(path: &Path) -> Result<Validator> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read schema {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse schema {}", path.display()))?;
    validator_for(&value).map_err(|err| anyhow!("invalid schema {}: {}", path.display(), err))
}

impl Checker for JsonChecker {
    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> &str {
        "json"
    }

    fn check(&self, target: &Path) -> Result<CheckReport> {
        if target.extension().is_none_or(|ext| ext != "json") {
            return Ok(CheckReport::default());
        }
        let source =
            fs::read_to_string(target).with_context(|| format!("read {}", target.display()))?;
        Ok(CheckReport::new(
            self.check_source(&target.display().to_string(), &source),
        ))
    }

    fn allowed_globals(&self) -> &[String] {
        &self.globals
    }
}

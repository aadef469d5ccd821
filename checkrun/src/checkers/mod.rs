//! Built-in checkers selectable from configuration by their `type` tag.

pub mod command;
pub mod json;
pub mod text;

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::checker::Checker;

pub use command::{CommandChecker, CommandOptions};
pub use json::{JsonChecker, JsonOptions};
pub use text::{TextChecker, TextOptions};

/// Checker type plus its options, as written in a `[[scope.checkers]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckerKind {
    Text(TextOptions),
    Json(JsonOptions),
    Command(CommandOptions),
}

impl CheckerKind {
    pub fn name(&self) -> &'static str {
        match self {
            CheckerKind::Text(_) => "text",
            CheckerKind::Json(_) => "json",
            CheckerKind::Command(_) => "command",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            CheckerKind::Text(options) => options.validate(),
            CheckerKind::Json(_) => Ok(()),
            CheckerKind::Command(options) => options.validate(),
        }
    }

    /// Instantiate the checker. Relative paths in options resolve against `base`.
    pub fn build(&self, title: &str, globals: Vec<String>, base: &Path) -> Result<Box<dyn Checker>> {
        Ok(match self {
            CheckerKind::Text(options) => {
                Box::new(TextChecker::new(title, options.clone()).with_globals(globals))
            }
            CheckerKind::Json(options) => {
                Box::new(JsonChecker::new(title, options, base)?.with_globals(globals))
            }
            CheckerKind::Command(options) => {
                Box::new(CommandChecker::new(title, options.clone(), base).with_globals(globals))
            }
        })
    }
}

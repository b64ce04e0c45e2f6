//! Python code-smell scanner.
//!
//! One linear pass: parse with `rustpython-parser`, then run each rule as an
//! isolated pure function over the module body and concatenate the results.
//! A parse failure short-circuits into a single `syntax-error` issue.

pub mod rules;

use rustpython_parser::{ast, parse, Mode};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub rule: &'static str,
    pub message: String,
    pub severity: Severity,
}

impl Issue {
    pub(crate) fn new(rule: &'static str, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            rule,
            message: message.into(),
            severity,
        }
    }
}

/// Scan a Python source string. No configuration, no cross-file analysis.
pub fn scan(source: &str) -> Vec<Issue> {
    let module = match parse(source, Mode::Module, "<input>") {
        Ok(ast::Mod::Module(module)) => module,
        // Module mode only ever yields `Mod::Module`.
        Ok(_) => return Vec::new(),
        Err(err) => {
            return vec![Issue::new("syntax-error", err.to_string(), Severity::Error)];
        }
    };

    let mut issues = rules::unused_args(&module.body);
    issues.extend(rules::bare_excepts(&module.body));
    issues.extend(rules::print_calls(&module.body));
    issues
}

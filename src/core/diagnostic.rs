use crate::core::catalog::{self, Severity};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A localized edit: replace the first occurrence of `find` on `line` with
/// `replace`. Applied by [`crate::core::fixer`] after every rule has run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Fix {
    pub path: PathBuf,
    pub line: usize,
    pub find: String,
    pub replace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Diagnostic {
    /// Build a diagnostic whose severity, message and hint come from the catalog.
    pub fn new(code: &str, path: &Path, line: Option<usize>, context: &[(&str, String)]) -> Self {
        let def = catalog::get(code);
        Self {
            code: code.to_string(),
            severity: catalog::severity_of(code),
            message: catalog::format(code, context),
            path: path.to_path_buf(),
            line,
            hint: def.and_then(|d| d.hint).map(str::to_string),
            fix: None,
        }
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The namespace part of the code (`SEC` for `SEC-E001`).
    pub fn namespace(&self) -> &str {
        self.code.split('-').next().unwrap_or("")
    }

    /// Sort key: severity descending, then path, then line, then code.
    pub fn sort_key(&self) -> (std::cmp::Reverse<Severity>, &Path, Option<usize>, &str, &str) {
        (
            std::cmp::Reverse(self.severity),
            self.path.as_path(),
            self.line,
            self.code.as_str(),
            self.message.as_str(),
        )
    }
}

/// Deduplicate and order diagnostics deterministically.
pub fn normalize(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    diagnostics.dedup_by(|a, b| {
        a.code == b.code && a.path == b.path && a.line == b.line && a.message == b.message
    });
    diagnostics
}

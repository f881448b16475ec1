use super::RuleContext;
use crate::core::artifact::Artifact;
use crate::core::catalog::codes;
use crate::core::diagnostic::{Diagnostic, Fix};
use regex::Regex;
use std::sync::LazyLock;

static START_AT_001_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(start(?:ing|s)? at\s+)(`?)001(`?)").unwrap());

/// Guidance prose must say document numbers start at `01`, never `001`.
pub fn check(artifact: &Artifact, _ctx: &RuleContext) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for (idx, text) in artifact.text.lines().enumerate() {
        let line = idx + 1;
        if artifact.structure.is_code(line) {
            continue;
        }
        for found in START_AT_001_RE.find_iter(text) {
            let find = found.as_str().to_string();
            let replace = START_AT_001_RE.replace(&find, "${1}${2}01${3}").into_owned();
            diags.push(
                Diagnostic::new(
                    codes::NUM_W001,
                    &artifact.path,
                    Some(line),
                    &[("found", find.clone())],
                )
                .with_fix(Fix {
                    path: artifact.path.clone(),
                    line,
                    find,
                    replace,
                }),
            );
        }
    }
    diags
}

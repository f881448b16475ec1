//! Split-document section accounting.
//!
//! A document split as `<ID>.0_*.md` (index) plus `<ID>.<n>_*.md` section
//! files declares `total_sections` in the index frontmatter. The declared
//! total must equal the number of non-zero section files in the same
//! directory.

use super::{frontmatter_line, RuleContext};
use crate::core::artifact::Artifact;
use crate::core::catalog::codes;
use crate::core::diagnostic::{Diagnostic, Fix};
use crate::core::index::parent_of;
use regex::Regex;
use std::sync::LazyLock;

static TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"total_sections\s*:\s*['\x22]?(\d+)['\x22]?").unwrap());

pub fn check(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    let Some(section) = artifact.id.section else {
        return Vec::new();
    };
    let dir = parent_of(&artifact.path);
    let inventory = ctx.index.section_inventory(&dir, &artifact.id);
    let doc = artifact.id.as_document().canonical();

    if section > 0 {
        // Reported once per document, on its lowest-numbered section file.
        if inventory.index_path.is_none()
            && inventory.first_section_path.as_deref() == Some(artifact.path.as_path())
        {
            return vec![Diagnostic::new(
                codes::SEC_E003,
                &artifact.path,
                None,
                &[("doc", doc)],
            )];
        }
        return Vec::new();
    }

    let mut diags = Vec::new();
    let declared = artifact
        .frontmatter
        .as_ref()
        .and_then(|fm| fm.get_u64("total_sections"));
    let actual = inventory.actual();
    match declared {
        None if !artifact.frontmatter_error => {
            diags.push(Diagnostic::new(
                codes::SEC_E002,
                &artifact.path,
                artifact.frontmatter_span.map(|s| s.open),
                &[("doc", doc.clone())],
            ));
        }
        None => {}
        Some(declared) if declared != actual as u64 => {
            let line = frontmatter_line(artifact, "total_sections");
            let mut diag = Diagnostic::new(
                codes::SEC_E001,
                &artifact.path,
                line,
                &[
                    ("declared", declared.to_string()),
                    ("actual", actual.to_string()),
                    ("doc", doc.clone()),
                ],
            );
            if let Some(fix) = line.and_then(|l| total_fix(artifact, l, actual)) {
                diag = diag.with_fix(fix);
            }
            diags.push(diag);
        }
        Some(_) => {}
    }

    for missing in &inventory.gaps {
        diags.push(Diagnostic::new(
            codes::SEC_W001,
            &artifact.path,
            None,
            &[("missing", missing.to_string()), ("doc", doc.clone())],
        ));
    }
    diags
}

fn total_fix(artifact: &Artifact, line: usize, actual: usize) -> Option<Fix> {
    let text = artifact.text.lines().nth(line - 1)?;
    let caps = TOTAL_RE.captures(text)?;
    let whole = caps.get(0)?.as_str();
    let number = caps.get(1)?;
    let start = number.start() - caps.get(0)?.start();
    let mut replace = whole.to_string();
    replace.replace_range(start..start + number.as_str().len(), &actual.to_string());
    Some(Fix {
        path: artifact.path.clone(),
        line,
        find: whole.to_string(),
        replace,
    })
}

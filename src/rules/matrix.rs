//! Traceability matrices.
//!
//! Every directory holding artifacts of a kind carries a matrix file
//! (`<PREFIX>-00_traceability_matrix.md`) that lists each of them. Matrices of
//! non-root kinds also need an Upstream section. References in a matrix must
//! resolve; unresolved ones are errors only in strict mode.

use super::RuleContext;
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::ids::ArtifactId;
use crate::core::index::parent_of;
use crate::core::kinds::ArtifactKind;
use crate::core::loader::IndexDoc;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

fn find_matrix<'a>(docs: &'a [IndexDoc], dir: &Path, kind: ArtifactKind) -> Option<&'a IndexDoc> {
    docs.iter()
        .find(|d| d.kind == kind && d.is_traceability_matrix() && parent_of(&d.path).as_path() == dir)
}

pub fn check(ctx: &RuleContext) -> Vec<Diagnostic> {
    let mut groups: BTreeMap<(PathBuf, ArtifactKind), BTreeSet<ArtifactId>> = BTreeMap::new();
    for record in ctx.index.validated().filter(|r| !r.is_template) {
        groups
            .entry((parent_of(&record.path), record.kind()))
            .or_default()
            .insert(record.id.as_document());
    }

    let mut diags = Vec::new();
    let mut checked = BTreeSet::new();
    for ((dir, kind), documents) in &groups {
        let Some(matrix) = find_matrix(ctx.index.index_docs(), dir, *kind) else {
            diags.push(Diagnostic::new(
                codes::TRACE_E001,
                dir,
                None,
                &[
                    ("kind", kind.prefix().to_string()),
                    ("dir", dir.display().to_string()),
                ],
            ));
            continue;
        };
        checked.insert(matrix.path.clone());

        let listed: BTreeSet<ArtifactId> = matrix
            .mentions
            .iter()
            .map(|(_, m)| m.id.as_document())
            .collect();
        for missing in documents.iter().filter(|d| !listed.contains(d)) {
            diags.push(Diagnostic::new(
                codes::TRACE_E002,
                &matrix.path,
                None,
                &[("id", missing.canonical())],
            ));
        }

        let has_upstream = matrix
            .structure
            .headings
            .iter()
            .any(|h| h.title.to_ascii_lowercase().contains("upstream"));
        if !kind.is_root() && !has_upstream {
            diags.push(Diagnostic::new(codes::TRACE_E003, &matrix.path, None, &[]));
        }
    }

    let unresolved = if ctx.strict {
        codes::TRACE_E004
    } else {
        codes::TRACE_W001
    };
    for matrix in ctx.index.index_docs().iter().filter(|d| checked.contains(&d.path)) {
        for (line, mention) in &matrix.mentions {
            if !ctx.index.exists(&mention.id) {
                diags.push(Diagnostic::new(
                    unresolved,
                    &matrix.path,
                    Some(*line),
                    &[("target", mention.id.canonical())],
                ));
            }
        }
    }
    diags
}

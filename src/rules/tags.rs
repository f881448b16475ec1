//! Traceability tags: `@kind: DocId[:ElementId], ...`.

use super::RuleContext;
use crate::core::artifact::{Artifact, TagValue, TraceTag};
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::ids::ArtifactId;
use crate::core::kinds::{TagKind, IMPL_STATUS_VALUES};

/// Tag vocabulary, reference shape, `impl-status` values and upstream
/// resolution. Pending tags are recorded as info.
pub fn check(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for tag in &artifact.tags {
        let kind = tag.kind.to_string();
        match &tag.kind {
            TagKind::Unknown(raw) => {
                diags.push(Diagnostic::new(
                    codes::TAG_E001,
                    &artifact.path,
                    Some(tag.line),
                    &[("kind", raw.clone())],
                ));
            }
            TagKind::Threshold => {}
            TagKind::ImplStatus => {
                for value in &tag.values {
                    if let TagValue::Value(v) = value {
                        if !IMPL_STATUS_VALUES.contains(&v.as_str()) {
                            diags.push(Diagnostic::new(
                                codes::TAG_E003,
                                &artifact.path,
                                Some(tag.line),
                                &[("value", v.clone())],
                            ));
                        }
                    }
                }
            }
            TagKind::Artifact(_) => check_references(artifact, ctx, tag, &kind, &mut diags),
        }
    }
    diags
}

fn check_references(
    artifact: &Artifact,
    ctx: &RuleContext,
    tag: &TraceTag,
    kind: &str,
    diags: &mut Vec<Diagnostic>,
) {
    let expected = tag.kind.artifact_kind();
    let mut pending = false;
    for value in &tag.values {
        match value {
            TagValue::Pending(_) => pending = true,
            TagValue::Malformed(raw) | TagValue::Value(raw) => {
                diags.push(Diagnostic::new(
                    codes::TAG_E004,
                    &artifact.path,
                    Some(tag.line),
                    &[("value", raw.clone()), ("kind", kind.to_string())],
                ));
            }
            TagValue::Ref(r) => {
                if Some(r.target.kind) != expected {
                    diags.push(Diagnostic::new(
                        codes::TAG_E004,
                        &artifact.path,
                        Some(tag.line),
                        &[("value", r.raw.clone()), ("kind", kind.to_string())],
                    ));
                    continue;
                }
                if tag.kind.requires_element() && r.element.is_none() && r.target.section.is_none() {
                    diags.push(Diagnostic::new(
                        codes::TAG_E002,
                        &artifact.path,
                        Some(tag.line),
                        &[("kind", kind.to_string()), ("value", r.raw.clone())],
                    ));
                }
                let upstream = r.target.layer() < artifact.layer();
                let kind_indexed = !ctx.index.artifacts_of_kind(r.target.kind).is_empty();
                if upstream && kind_indexed && !ctx.index.exists(&r.target) {
                    diags.push(Diagnostic::new(
                        codes::TAG_W001,
                        &artifact.path,
                        Some(tag.line),
                        &[("kind", kind.to_string()), ("target", r.target.canonical())],
                    ));
                }
            }
        }
    }
    if pending {
        diags.push(Diagnostic::new(
            codes::TAG_I001,
            &artifact.path,
            Some(tag.line),
            &[("kind", kind.to_string())],
        ));
    }
}

/// A PENDING tag is stale once an artifact of the tagged kind exists with
/// the same document number as the tagging artifact.
pub fn check_pending(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for tag in artifact.tags.iter().filter(|t| t.is_pending()) {
        let Some(kind) = tag.kind.artifact_kind() else {
            continue;
        };
        let counterpart = ArtifactId::document(kind, artifact.id.doc);
        if ctx.index.exists(&counterpart) {
            diags.push(Diagnostic::new(
                codes::TAG_W002,
                &artifact.path,
                Some(tag.line),
                &[("kind", tag.kind.to_string()), ("target", counterpart.canonical())],
            ));
        }
    }
    diags
}

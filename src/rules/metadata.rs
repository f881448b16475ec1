use super::RuleContext;
use crate::core::artifact::Artifact;
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::kinds::Format;

/// Frontmatter presence and the keys every document carries: `title` always,
/// `tags` and `custom_fields.document_type` in strict mode.
pub fn check(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    // Feature files carry no frontmatter; malformed blocks already have VAL-E002.
    if artifact.format == Format::Feature || artifact.frontmatter_error {
        return Vec::new();
    }
    let Some(fm) = artifact.frontmatter.as_ref() else {
        return vec![Diagnostic::new(codes::META_E001, &artifact.path, Some(1), &[])];
    };
    let line = artifact.frontmatter_span.map(|s| s.open);

    let mut diags = Vec::new();
    if !fm.has("title") {
        diags.push(Diagnostic::new(codes::META_E002, &artifact.path, line, &[]));
    }
    if ctx.strict {
        if !fm.has("tags") {
            diags.push(Diagnostic::new(codes::META_E003, &artifact.path, line, &[]));
        }
        let typed = fm
            .get("custom_fields.document_type")
            .and_then(crate::core::frontmatter::scalar_to_string)
            .is_some_and(|v| !v.trim().is_empty());
        if !typed {
            diags.push(Diagnostic::new(codes::META_E004, &artifact.path, line, &[]));
        }
    }
    diags
}

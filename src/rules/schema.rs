//! Per-kind schema conformance: required and recommended frontmatter fields,
//! required and recommended body sections, controlled vocabularies.

use super::{frontmatter_line, RuleContext};
use crate::core::artifact::Artifact;
use crate::core::catalog::{kind_code, KindCode};
use crate::core::diagnostic::Diagnostic;
use crate::core::frontmatter::scalar_to_string;
use crate::core::kinds::Format;
use crate::core::schema::KindSchema;
use serde_yaml::Value;

pub fn check(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    let Some(loaded) = ctx.index.schemas().get(artifact.kind()) else {
        return Vec::new();
    };
    let schema = match artifact.format {
        Format::Yaml => loaded.schema.for_yaml(),
        _ => &loaded.schema,
    };
    // Split documents: the `.0` index carries the fields, sections are spread
    // across files and are checked by the section-count rule instead.
    let whole_document = artifact.id.section.is_none();
    if artifact.id.section.is_some_and(|s| s > 0) {
        return Vec::new();
    }

    let mut diags = Vec::new();
    if !artifact.frontmatter_error {
        check_fields(artifact, schema, &mut diags);
    }
    if whole_document && artifact.format != Format::Yaml {
        check_sections(artifact, schema, &mut diags);
    }
    diags
}

fn check_fields(artifact: &Artifact, schema: &KindSchema, diags: &mut Vec<Diagnostic>) {
    let kind = artifact.kind();
    let fm_line = artifact.frontmatter_span.map(|s| s.open);
    let fm = artifact.frontmatter.as_ref();
    let has = |field: &str| fm.is_some_and(|fm| fm.has(field));

    // Markdown without frontmatter is reported once by the metadata rule.
    if fm.is_none() && artifact.format == Format::Markdown {
        return;
    }

    for field in &schema.required_fields {
        if !has(field) {
            diags.push(Diagnostic::new(
                &kind_code(kind, KindCode::MissingField),
                &artifact.path,
                fm_line,
                &[("field", field.clone())],
            ));
        }
    }
    for field in &schema.recommended_fields {
        if !has(field) {
            diags.push(Diagnostic::new(
                &kind_code(kind, KindCode::RecommendedField),
                &artifact.path,
                fm_line,
                &[("field", field.clone())],
            ));
        }
    }

    let Some(fm) = fm else {
        return;
    };
    for (field, allowed) in &schema.vocabularies {
        let values: Vec<String> = match fm.lookup(field) {
            Some(Value::Sequence(seq)) => seq.iter().filter_map(scalar_to_string).collect(),
            Some(v) => scalar_to_string(v).into_iter().collect(),
            None => continue,
        };
        for value in values {
            if value.trim().is_empty() || schema.allows(field, &value) != Some(false) {
                continue;
            }
            diags.push(Diagnostic::new(
                &kind_code(kind, KindCode::Vocabulary),
                &artifact.path,
                frontmatter_line(artifact, field).or(fm_line),
                &[
                    ("field", field.clone()),
                    ("value", value),
                    ("allowed", allowed.join(", ")),
                ],
            ));
        }
    }
}

fn has_section(artifact: &Artifact, wanted: &str) -> bool {
    let wanted = wanted.to_ascii_lowercase();
    artifact
        .structure
        .headings
        .iter()
        .any(|h| h.title.to_ascii_lowercase().contains(&wanted))
}

fn check_sections(artifact: &Artifact, schema: &KindSchema, diags: &mut Vec<Diagnostic>) {
    let kind = artifact.kind();
    for section in &schema.required_sections {
        if !has_section(artifact, section) {
            diags.push(Diagnostic::new(
                &kind_code(kind, KindCode::MissingSection),
                &artifact.path,
                None,
                &[("section", section.clone())],
            ));
        }
    }
    for section in &schema.recommended_sections {
        if !has_section(artifact, section) {
            diags.push(Diagnostic::new(
                &kind_code(kind, KindCode::RecommendedSection),
                &artifact.path,
                None,
                &[("section", section.clone())],
            ));
        }
    }
}

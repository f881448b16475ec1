//! File-name conventions for kinds with a naming policy: fixed-width
//! document numbers, slug shape, creation timestamps, H1 agreement and
//! gap-free numbering within a directory.

use super::RuleContext;
use crate::core::artifact::Artifact;
use crate::core::catalog::{kind_code, KindCode};
use crate::core::diagnostic::Diagnostic;
use crate::core::ids;
use crate::core::index::parent_of;
use crate::core::kinds::{Format, NamingPolicy};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").unwrap());
static TIMESTAMPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(.+?)_)?(\d{8}_\d{6})$").unwrap());

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn check(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    let kind = artifact.kind();
    let (width, timestamped) = match kind.naming() {
        NamingPolicy::Free => return Vec::new(),
        NamingPolicy::Plain { width } => (width, false),
        NamingPolicy::Timestamped { width } => (width, true),
    };
    let code = |c: KindCode| kind_code(kind, c);
    let mut diags = Vec::new();

    if let Some(digits) = ids::raw_doc_digits(&artifact.path) {
        if digits.len() != width {
            diags.push(Diagnostic::new(
                &code(KindCode::IdWidth),
                &artifact.path,
                None,
                &[("digits", digits), ("width", width.to_string())],
            ));
        }
    }

    let raw_slug = artifact.slug.clone().unwrap_or_default();
    let slug = if timestamped {
        match TIMESTAMPED_RE.captures(&raw_slug) {
            Some(caps) => {
                let stamp = &caps[2];
                if NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_err() {
                    diags.push(Diagnostic::new(
                        &code(KindCode::Timestamp),
                        &artifact.path,
                        None,
                        &[("timestamp", stamp.to_string())],
                    ));
                }
                Some(caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default())
            }
            None => {
                diags.push(Diagnostic::new(
                    &code(KindCode::Timestamp),
                    &artifact.path,
                    None,
                    &[("timestamp", raw_slug.clone())],
                ));
                None
            }
        }
    } else {
        artifact.slug.clone()
    };
    if let Some(slug) = slug {
        if !SLUG_RE.is_match(&slug) {
            diags.push(Diagnostic::new(
                &code(KindCode::SlugShape),
                &artifact.path,
                None,
                &[("slug", slug)],
            ));
        }
    }

    if artifact.format == Format::Markdown {
        match artifact.h1() {
            None => diags.push(Diagnostic::new(
                &code(KindCode::MissingH1),
                &artifact.path,
                None,
                &[],
            )),
            Some(h1) => {
                let declared = ids::find_mentions(&h1.title).into_iter().next();
                let matches = declared
                    .as_ref()
                    .is_some_and(|m| m.id.as_document() == artifact.id.as_document());
                if !matches {
                    diags.push(Diagnostic::new(
                        &code(KindCode::H1Mismatch),
                        &artifact.path,
                        Some(h1.line),
                        &[
                            ("h1", declared.map(|m| m.raw).unwrap_or_else(|| "(none)".to_string())),
                            ("id", artifact.id.as_document().canonical()),
                        ],
                    ));
                }
            }
        }
    }

    diags.extend(sequence_gap(artifact, ctx, width));
    diags
}

/// Missing document numbers directly below this one, reported on the first
/// file carrying the number after the gap.
fn sequence_gap(artifact: &Artifact, ctx: &RuleContext, width: usize) -> Option<Diagnostic> {
    let kind = artifact.kind();
    let doc = artifact.id.doc;
    let sequence = ctx.index.sequence(&parent_of(&artifact.path), kind);
    if sequence.get(&doc) != Some(&artifact.path) {
        return None;
    }
    let previous = sequence.range(..doc).next_back().map(|(n, _)| *n).unwrap_or(0);
    if previous + 1 >= doc {
        return None;
    }
    let missing: Vec<String> = (previous + 1..doc)
        .map(|n| format!("{}-{:0width$}", kind.prefix(), n, width = width))
        .collect();
    Some(Diagnostic::new(
        &kind_code(kind, KindCode::SequenceGap),
        &artifact.path,
        None,
        &[("kind", kind.prefix().to_string()), ("missing", missing.join(", "))],
    ))
}

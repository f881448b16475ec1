//! References that point down the layer stack.
//!
//! An artifact may name a downstream artifact only once it exists, and
//! should not skip more than two layers when it does.

use super::RuleContext;
use crate::core::artifact::Artifact;
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::index::references_of;
use crate::core::kinds::ArtifactKind;
use regex::Regex;
use std::sync::LazyLock;

/// Layers a reference may cross before it is flagged.
pub const MAX_LAYER_SPAN: u8 = 2;

static KIND_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,3}}|(?i:one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve))\s+({})s?\b",
        ArtifactKind::prefix_alternation()
    ))
    .unwrap()
});

pub fn check(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    let source_layer = artifact.layer();
    let source = artifact.id.as_document().canonical();
    let mut diags = Vec::new();

    for reference in references_of(artifact) {
        let target_layer = ctx.index.layer_of(&reference.target);
        if target_layer <= source_layer {
            continue;
        }
        let context = [
            ("source", source.clone()),
            ("source_layer", source_layer.to_string()),
            ("target", reference.target.canonical()),
            ("target_layer", target_layer.to_string()),
        ];
        if !ctx.index.exists(&reference.target) {
            diags.push(Diagnostic::new(
                codes::FWDREF_E001,
                &artifact.path,
                Some(reference.line),
                &context,
            ));
        } else if target_layer - source_layer > MAX_LAYER_SPAN {
            diags.push(Diagnostic::new(
                codes::FWDREF_W001,
                &artifact.path,
                Some(reference.line),
                &context,
            ));
        }
    }

    for (idx, text) in artifact.text.lines().enumerate() {
        let line = idx + 1;
        if !artifact.is_prose_line(line) {
            continue;
        }
        for caps in KIND_COUNT_RE.captures_iter(text) {
            let Some(kind) = ArtifactKind::from_prefix(&caps[2]) else {
                continue;
            };
            if kind.layer() <= source_layer {
                continue;
            }
            diags.push(Diagnostic::new(
                codes::FWDREF_W002,
                &artifact.path,
                Some(line),
                &[("claim", caps[0].to_string()), ("kind", kind.prefix().to_string())],
            ));
        }
    }
    diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{codes, Fixture};

    #[test]
    fn missing_downstream_target_is_an_error() {
        let f = Fixture::new(&[(
            "BRD-01_goals.md",
            "---\ntitle: Goals\n---\n# BRD-01\n\nSee ADR-005 for the storage decision.\n",
        )]);
        let diags = f.run(check, "BRD-01_goals.md", false);
        assert_eq!(codes(&diags), vec!["FWDREF-E001"]);
        assert_eq!(diags[0].line, Some(6));
        assert!(diags[0].message.contains("ADR-05 (layer 5)"));
    }

    #[test]
    fn existing_targets_and_upstream_refs_pass() {
        let f = Fixture::new(&[
            ("PRD-01_app.md", "# PRD-01\n\nRefined in EARS-01; derived from BRD-09.\n"),
            ("EARS-01_rules.md", "# EARS-01\n"),
        ]);
        assert!(f.run(check, "PRD-01_app.md", false).is_empty());
    }

    #[test]
    fn skipping_layers_warns() {
        let f = Fixture::new(&[
            ("PRD-01_app.md", "# PRD-01\n\n@sys: SYS-02:01\n"),
            ("SYS-02_platform.md", "# SYS-02\n"),
        ]);
        let diags = f.run(check, "PRD-01_app.md", false);
        assert_eq!(codes(&diags), vec!["FWDREF-W001"]);
        assert_eq!(diags[0].line, Some(3));
    }

    #[test]
    fn fenced_mentions_are_ignored_and_kind_counts_warn() {
        let f = Fixture::new(&[(
            "PRD-01_app.md",
            "# PRD-01\n\n```text\nADR-009\n```\n\nWe expect 3 ADRs and 2 BRDs.\n",
        )]);
        let diags = f.run(check, "PRD-01_app.md", false);
        assert_eq!(codes(&diags), vec!["FWDREF-W002"]);
        assert!(diags[0].message.contains("'3 ADRs'"));
    }
}

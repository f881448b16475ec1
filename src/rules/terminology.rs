//! Deprecated phrases and their canonical replacements.

use super::RuleContext;
use crate::core::artifact::Artifact;
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Built-in table; `[terminology]` in `.sddlint.toml` adds to it.
pub const DEPRECATED_TERMS: &[(&str, &str)] = &[
    ("Feature Requirements Document", "Product Requirements Document"),
    ("Technical Design Document", "Architecture Decision Record"),
    ("API Specification", "API Contract"),
    ("Test Plan", "Test Specification"),
    ("Business Rules Document", "Business Requirements Document"),
    ("System Design Spec", "System Requirements"),
    ("whitelist", "allowlist"),
    ("blacklist", "denylist"),
    ("master branch", "main branch"),
];

const HISTORY_HEADINGS: &[&str] = &["revision history", "change log", "changelog", "document history"];

static BUILTIN: LazyLock<Vec<(Regex, &'static str, &'static str)>> = LazyLock::new(|| {
    DEPRECATED_TERMS
        .iter()
        .filter_map(|(term, canonical)| term_regex(term).map(|re| (re, *term, *canonical)))
        .collect()
});

fn term_regex(term: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
        .case_insensitive(true)
        .build()
        .ok()
}

fn in_history_section(artifact: &Artifact, line: usize) -> bool {
    let headings = &artifact.structure.headings;
    headings.iter().enumerate().any(|(idx, h)| {
        let title = h.title.to_ascii_lowercase();
        if !HISTORY_HEADINGS.iter().any(|w| title.contains(w)) {
            return false;
        }
        let (start, end) = artifact.structure.section_span(idx, artifact.line_count());
        line > start && line <= end
    })
}

pub fn check(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    let configured: Vec<(Regex, &str, &str)> = ctx
        .config
        .terminology
        .iter()
        .filter_map(|(term, canonical)| {
            term_regex(term).map(|re| (re, term.as_str(), canonical.as_str()))
        })
        .collect();

    let mut diags = Vec::new();
    for (idx, text) in artifact.text.lines().enumerate() {
        let line = idx + 1;
        if artifact.structure.is_code(line) || artifact.in_frontmatter(line) {
            continue;
        }
        let table = BUILTIN.iter().map(|(re, t, c)| (re, *t, *c));
        let extra = configured.iter().map(|(re, t, c)| (re, *t, *c));
        let hits: Vec<(&str, &str)> = table
            .chain(extra)
            .filter(|(re, _, _)| re.is_match(text))
            .map(|(_, t, c)| (t, c))
            .collect();
        if hits.is_empty() || in_history_section(artifact, line) {
            continue;
        }
        for (term, canonical) in hits {
            diags.push(Diagnostic::new(
                codes::TERM_W001,
                &artifact.path,
                Some(line),
                &[("term", term.to_string()), ("canonical", canonical.to_string())],
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
    fn deprecated_term_names_canonical() {
        let f = Fixture::new(&[(
            "PRD-01_app.md",
            "# PRD-01\n\nSee the technical design document for details.\n",
        )]);
        let diags = f.run(check, "PRD-01_app.md", false);
        assert_eq!(codes(&diags), vec!["TERM-W001"]);
        assert_eq!(diags[0].line, Some(3));
        assert!(diags[0].message.contains("'Architecture Decision Record'"));
    }

    #[test]
    fn revision_history_and_word_parts_are_skipped() {
        let f = Fixture::new(&[(
            "PRD-01_app.md",
            "# PRD-01\n\nThe blacklisted hosts.\n\n## Revision History\n\n- renamed Test Plan\n",
        )]);
        assert!(f.run(check, "PRD-01_app.md", false).is_empty());
    }

    #[test]
    fn configured_terms_extend_the_table() {
        let mut f = Fixture::new(&[("PRD-01_app.md", "Uses the legacy gizmo.\n")]);
        f.config
            .terminology
            .insert("gizmo".to_string(), "component".to_string());
        assert_eq!(codes(&f.run(check, "PRD-01_app.md", false)), vec!["TERM-W001"]);
    }
}

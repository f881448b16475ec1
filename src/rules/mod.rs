//! Rule library.
//!
//! Every rule is a flat descriptor: the family (and so the CLI verb) it
//! belongs to, whether it needs the cross-artifact index, which kinds it
//! applies to, and the function that evaluates it. Rules are pure: they read
//! immutable records and the index, and return diagnostics.

pub mod counts;
pub mod diagrams;
pub mod forward_refs;
pub mod identifiers;
pub mod magic;
pub mod matrix;
pub mod metadata;
pub mod naming;
pub mod numbering;
pub mod schema;
pub mod sections;
pub mod sync;
pub mod tags;
pub mod terminology;

use crate::core::artifact::Artifact;
use crate::core::catalog::Severity;
use crate::core::config::Config;
use crate::core::diagnostic::Diagnostic;
use crate::core::index::ProjectIndex;
use crate::core::kinds::ArtifactKind;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleFamily {
    Schema,
    Ids,
    Sections,
    Counts,
    Diagrams,
    ForwardRefs,
    Tags,
    Magic,
    Terms,
    Numbering,
    Naming,
    Meta,
    Sync,
    Matrix,
}

impl RuleFamily {
    pub const ALL: &'static [RuleFamily] = &[
        RuleFamily::Schema,
        RuleFamily::Ids,
        RuleFamily::Sections,
        RuleFamily::Counts,
        RuleFamily::Diagrams,
        RuleFamily::ForwardRefs,
        RuleFamily::Tags,
        RuleFamily::Magic,
        RuleFamily::Terms,
        RuleFamily::Numbering,
        RuleFamily::Naming,
        RuleFamily::Meta,
        RuleFamily::Sync,
        RuleFamily::Matrix,
    ];

    /// CLI verb for the family.
    pub fn verb(self) -> &'static str {
        match self {
            RuleFamily::Schema => "schema",
            RuleFamily::Ids => "ids",
            RuleFamily::Sections => "sections",
            RuleFamily::Counts => "counts",
            RuleFamily::Diagrams => "diagrams",
            RuleFamily::ForwardRefs => "fwdref",
            RuleFamily::Tags => "tags",
            RuleFamily::Magic => "magic",
            RuleFamily::Terms => "terms",
            RuleFamily::Numbering => "numbering",
            RuleFamily::Naming => "naming",
            RuleFamily::Meta => "meta",
            RuleFamily::Sync => "sync",
            RuleFamily::Matrix => "matrix",
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Local rules see one record; cross rules also need the whole index and
/// only run for directory and project targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    Local,
    Cross,
}

/// Everything a rule may read besides the record itself.
pub struct RuleContext<'a> {
    pub index: &'a ProjectIndex,
    pub config: &'a Config,
    pub strict: bool,
}

pub type ArtifactCheck = fn(&Artifact, &RuleContext) -> Vec<Diagnostic>;
pub type ProjectCheck = fn(&RuleContext) -> Vec<Diagnostic>;

#[derive(Clone, Copy)]
pub enum Check {
    /// Evaluated once per validated record.
    PerArtifact(ArtifactCheck),
    /// Evaluated once per run.
    Project(ProjectCheck),
}

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub family: RuleFamily,
    pub scope: RuleScope,
    /// Code namespace; `*` for per-kind namespaces.
    pub namespace: &'static str,
    /// Empty means every kind.
    pub applies_to: &'static [ArtifactKind],
    pub default_severity: Severity,
    pub check: Check,
}

impl Rule {
    pub fn applies(&self, kind: ArtifactKind) -> bool {
        self.applies_to.is_empty() || self.applies_to.contains(&kind)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("family", &self.family)
            .field("scope", &self.scope)
            .field("namespace", &self.namespace)
            .finish()
    }
}

const ALL_KINDS: &[ArtifactKind] = &[];

pub static RULES: &[Rule] = &[
    Rule {
        name: "schema-conformance",
        family: RuleFamily::Schema,
        scope: RuleScope::Local,
        namespace: "*",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::PerArtifact(schema::check),
    },
    Rule {
        name: "duplicate-ids",
        family: RuleFamily::Ids,
        scope: RuleScope::Cross,
        namespace: "*",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::Project(identifiers::check),
    },
    Rule {
        name: "section-count",
        family: RuleFamily::Sections,
        scope: RuleScope::Local,
        namespace: "SEC",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::PerArtifact(sections::check),
    },
    Rule {
        name: "count-claims",
        family: RuleFamily::Counts,
        scope: RuleScope::Local,
        namespace: "COUNT",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::PerArtifact(counts::check),
    },
    Rule {
        name: "diagram-consistency",
        family: RuleFamily::Diagrams,
        scope: RuleScope::Local,
        namespace: "DIAG",
        applies_to: ALL_KINDS,
        default_severity: Severity::Warning,
        check: Check::PerArtifact(diagrams::check),
    },
    Rule {
        name: "forward-references",
        family: RuleFamily::ForwardRefs,
        scope: RuleScope::Cross,
        namespace: "FWDREF",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::PerArtifact(forward_refs::check),
    },
    Rule {
        name: "tag-vocabulary",
        family: RuleFamily::Tags,
        scope: RuleScope::Cross,
        namespace: "TAG",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::PerArtifact(tags::check),
    },
    Rule {
        name: "pending-resolution",
        family: RuleFamily::Tags,
        scope: RuleScope::Cross,
        namespace: "TAG",
        applies_to: ALL_KINDS,
        default_severity: Severity::Warning,
        check: Check::PerArtifact(tags::check_pending),
    },
    Rule {
        name: "magic-numbers",
        family: RuleFamily::Magic,
        scope: RuleScope::Local,
        namespace: "MAGIC",
        applies_to: ALL_KINDS,
        default_severity: Severity::Warning,
        check: Check::PerArtifact(magic::check),
    },
    Rule {
        name: "deprecated-terms",
        family: RuleFamily::Terms,
        scope: RuleScope::Local,
        namespace: "TERM",
        applies_to: ALL_KINDS,
        default_severity: Severity::Warning,
        check: Check::PerArtifact(terminology::check),
    },
    Rule {
        name: "numbering-phrasing",
        family: RuleFamily::Numbering,
        scope: RuleScope::Local,
        namespace: "NUM",
        applies_to: ALL_KINDS,
        default_severity: Severity::Warning,
        check: Check::PerArtifact(numbering::check),
    },
    Rule {
        name: "file-naming",
        family: RuleFamily::Naming,
        scope: RuleScope::Local,
        namespace: "*",
        applies_to: &[ArtifactKind::Plan, ArtifactKind::Contract],
        default_severity: Severity::Error,
        check: Check::PerArtifact(naming::check),
    },
    Rule {
        name: "frontmatter-metadata",
        family: RuleFamily::Meta,
        scope: RuleScope::Local,
        namespace: "META",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::PerArtifact(metadata::check),
    },
    Rule {
        name: "schema-template-sync",
        family: RuleFamily::Sync,
        scope: RuleScope::Cross,
        namespace: "SYNC",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::Project(sync::check),
    },
    Rule {
        name: "traceability-matrix",
        family: RuleFamily::Matrix,
        scope: RuleScope::Cross,
        namespace: "TRACE",
        applies_to: ALL_KINDS,
        default_severity: Severity::Error,
        check: Check::Project(matrix::check),
    },
];

/// Rules of the selected families; an empty selection means all of them.
pub fn select(families: &[RuleFamily]) -> Vec<&'static Rule> {
    RULES
        .iter()
        .filter(|r| families.is_empty() || families.contains(&r.family))
        .collect()
}

/// 1-based line of `key:` inside a record's frontmatter, when present.
pub(crate) fn frontmatter_line(artifact: &Artifact, key: &str) -> Option<usize> {
    let (first, last) = match artifact.frontmatter_span {
        Some(span) => (span.open + 1, span.close.saturating_sub(1)),
        None if artifact.format == crate::core::kinds::Format::Yaml => {
            (1, artifact.line_count())
        }
        None => return None,
    };
    artifact
        .text
        .lines()
        .enumerate()
        .skip(first.saturating_sub(1))
        .take(last.saturating_sub(first) + 1)
        .find(|(_, line)| {
            let trimmed = line.trim_start().trim_start_matches("- ");
            trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with(':'))
        })
        .map(|(idx, _)| idx + 1)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_family_has_a_rule() {
        for family in RuleFamily::ALL {
            assert!(
                RULES.iter().any(|r| r.family == *family),
                "no rule for {}",
                family
            );
        }
    }

    #[test]
    fn select_filters_by_family() {
        let tags = select(&[RuleFamily::Tags]);
        assert_eq!(tags.len(), 2);
        assert!(tags.iter().all(|r| r.scope == RuleScope::Cross));
        assert_eq!(select(&[]).len(), RULES.len());
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn naming_applies_to_policy_kinds_only() {
        let naming = RULES.iter().find(|r| r.name == "file-naming").expect("rule");
        assert!(naming.applies(ArtifactKind::Plan));
        assert!(!naming.applies(ArtifactKind::ArchitectureDecision));
    }
}

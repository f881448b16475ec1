//! Layer registry: the closed set of artifact kinds and their ordering.
//!
//! Every kind has exactly one row in [`REGISTRY`]. Classification, code
//! namespaces, layer ordering and naming policy are all derived from it, so
//! adding a kind is a table edit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How strictly a kind's file names are checked by the naming family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingPolicy {
    /// No file-name rules beyond classification.
    Free,
    /// `PREFIX-NNN_slug.ext` with a fixed id width.
    Plain { width: usize },
    /// `PREFIX-NNN_slug_YYYYMMDD_HHMMSS.md` with a fixed id width.
    Timestamped { width: usize },
}

/// File formats an artifact may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Markdown,
    Yaml,
    Feature,
}

impl Format {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" => Some(Self::Markdown),
            "yaml" | "yml" => Some(Self::Yaml),
            "feature" => Some(Self::Feature),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    BusinessRequirements,
    ProductRequirements,
    EngineeringRequirements,
    BehaviorSpec,
    ArchitectureDecision,
    SystemRequirements,
    AtomicRequirements,
    ImplementationSpec,
    Contract,
    TechnicalSpec,
    Tasks,
    Plan,
    TestSpecUnit,
    TestSpecIntegration,
    TestSpecSmoke,
    TestSpecFunctional,
    TestSpecPerformance,
}

pub struct KindInfo {
    pub kind: ArtifactKind,
    pub name: &'static str,
    pub prefix: &'static str,
    pub layer: u8,
    pub formats: &'static [Format],
    pub naming: NamingPolicy,
}

const MD: &[Format] = &[Format::Markdown];

pub const REGISTRY: &[KindInfo] = &[
    KindInfo {
        kind: ArtifactKind::BusinessRequirements,
        name: "business-requirements",
        prefix: "BRD",
        layer: 1,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::ProductRequirements,
        name: "product-requirements",
        prefix: "PRD",
        layer: 2,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::EngineeringRequirements,
        name: "engineering-requirements",
        prefix: "EARS",
        layer: 3,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::BehaviorSpec,
        name: "behavior-spec",
        prefix: "BDD",
        layer: 4,
        formats: &[Format::Feature, Format::Markdown],
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::ArchitectureDecision,
        name: "architecture-decision",
        prefix: "ADR",
        layer: 5,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::SystemRequirements,
        name: "system-requirements",
        prefix: "SYS",
        layer: 6,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::AtomicRequirements,
        name: "atomic-requirements",
        prefix: "REQ",
        layer: 7,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::ImplementationSpec,
        name: "implementation-spec",
        prefix: "IMPL",
        layer: 8,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::Contract,
        name: "contract",
        prefix: "CTR",
        layer: 9,
        formats: &[Format::Markdown, Format::Yaml],
        naming: NamingPolicy::Plain { width: 3 },
    },
    KindInfo {
        kind: ArtifactKind::TechnicalSpec,
        name: "technical-spec",
        prefix: "SPEC",
        layer: 10,
        formats: &[Format::Yaml, Format::Markdown],
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::Tasks,
        name: "tasks",
        prefix: "TASKS",
        layer: 11,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::Plan,
        name: "plan",
        prefix: "IPLAN",
        layer: 12,
        formats: MD,
        naming: NamingPolicy::Timestamped { width: 3 },
    },
    KindInfo {
        kind: ArtifactKind::TestSpecUnit,
        name: "test-spec-unit",
        prefix: "UTEST",
        layer: 10,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::TestSpecIntegration,
        name: "test-spec-integration",
        prefix: "ITEST",
        layer: 10,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::TestSpecSmoke,
        name: "test-spec-smoke",
        prefix: "STEST",
        layer: 10,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::TestSpecFunctional,
        name: "test-spec-functional",
        prefix: "FTEST",
        layer: 10,
        formats: MD,
        naming: NamingPolicy::Free,
    },
    KindInfo {
        kind: ArtifactKind::TestSpecPerformance,
        name: "test-spec-performance",
        prefix: "PTEST",
        layer: 10,
        formats: MD,
        naming: NamingPolicy::Free,
    },
];

impl ArtifactKind {
    pub fn all() -> impl Iterator<Item = ArtifactKind> {
        REGISTRY.iter().map(|row| row.kind)
    }

    pub fn info(self) -> &'static KindInfo {
        // The registry holds one row per variant, in declaration order.
        &REGISTRY[self as usize]
    }

    pub fn prefix(self) -> &'static str {
        self.info().prefix
    }

    pub fn layer(self) -> u8 {
        self.info().layer
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn naming(self) -> NamingPolicy {
        self.info().naming
    }

    /// The root kind has no upstream layer and no schema.
    pub fn is_root(self) -> bool {
        self == ArtifactKind::BusinessRequirements
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|row| row.prefix == prefix)
            .map(|row| row.kind)
    }

    /// Alternation of every prefix, longest first so `IPLAN` wins over `PLAN`-like
    /// overlaps when embedded in a larger regex.
    pub fn prefix_alternation() -> String {
        let mut prefixes: Vec<&str> = REGISTRY.iter().map(|row| row.prefix).collect();
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        prefixes.join("|")
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a traceability tag: `@adr:`, `@req:`, ..., `@impl-status:` or
/// `@threshold:` (a key into the shared threshold registry).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagKind {
    Artifact(ArtifactKind),
    ImplStatus,
    Threshold,
    Unknown(String),
}

pub const IMPL_STATUS_VALUES: &[&str] = &["pending", "in-progress", "complete", "deprecated"];

impl TagKind {
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.to_ascii_lowercase();
        if lowered == "impl-status" {
            return TagKind::ImplStatus;
        }
        if lowered == "threshold" {
            return TagKind::Threshold;
        }
        match ArtifactKind::from_prefix(&lowered.to_ascii_uppercase()) {
            Some(kind) => TagKind::Artifact(kind),
            None => TagKind::Unknown(raw.to_string()),
        }
    }

    /// Requirement-bearing kinds whose tags must point at an element, not a whole document.
    pub fn requires_element(&self) -> bool {
        matches!(
            self,
            TagKind::Artifact(
                ArtifactKind::BusinessRequirements
                    | ArtifactKind::ProductRequirements
                    | ArtifactKind::EngineeringRequirements
                    | ArtifactKind::BehaviorSpec
                    | ArtifactKind::SystemRequirements
                    | ArtifactKind::AtomicRequirements
            )
        )
    }

    pub fn artifact_kind(&self) -> Option<ArtifactKind> {
        match self {
            TagKind::Artifact(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagKind::Artifact(kind) => write!(f, "{}", kind.prefix().to_ascii_lowercase()),
            TagKind::ImplStatus => f.write_str("impl-status"),
            TagKind::Threshold => f.write_str("threshold"),
            TagKind::Unknown(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_rows_follow_declaration_order() {
        for (idx, row) in REGISTRY.iter().enumerate() {
            assert_eq!(row.kind as usize, idx, "row {} out of order", row.prefix);
        }
    }

    #[test]
    fn prefixes_are_unique() {
        let mut prefixes: Vec<&str> = REGISTRY.iter().map(|r| r.prefix).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), REGISTRY.len());
    }

    #[test]
    fn tag_kinds_parse_case_insensitively() {
        assert_eq!(
            TagKind::parse("ADR"),
            TagKind::Artifact(ArtifactKind::ArchitectureDecision)
        );
        assert_eq!(TagKind::parse("impl-status"), TagKind::ImplStatus);
        assert_eq!(TagKind::parse("Threshold"), TagKind::Threshold);
        assert_eq!(TagKind::parse("foo"), TagKind::Unknown("foo".into()));
        assert!(TagKind::parse("req").requires_element());
        assert!(!TagKind::parse("spec").requires_element());
    }

    #[test]
    fn layers_increase_down_the_chain() {
        assert!(ArtifactKind::BusinessRequirements.layer() < ArtifactKind::ArchitectureDecision.layer());
        assert!(ArtifactKind::AtomicRequirements.layer() < ArtifactKind::TechnicalSpec.layer());
        assert!(ArtifactKind::BusinessRequirements.is_root());
    }
}

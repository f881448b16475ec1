//! Artifact identifiers and file-name classification.

use crate::core::kinds::{ArtifactKind, Format};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// `(kind, document, section?, element?)`. Numbers are stored as integers so
/// `ADR-005`, `ADR-05` and `ADR-5` are the same identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactId {
    pub kind: ArtifactKind,
    pub doc: u32,
    pub section: Option<u32>,
    pub element: Option<u32>,
}

static ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^({})-(\d{{1,4}})(?:\.(\d{{1,3}}))?(?:\.(\d{{1,3}}))?$",
        ArtifactKind::prefix_alternation()
    ))
    .unwrap()
});

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b({})-(\d{{2,4}})((?:\.\d{{1,3}}){{0,2}})",
        ArtifactKind::prefix_alternation()
    ))
    .unwrap()
});

static FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^({})-(\d{{2,4}})(?:\.(\d{{1,3}}))?(?:_([^.]+))?\.(md|yaml|yml|feature)$",
        ArtifactKind::prefix_alternation()
    ))
    .unwrap()
});

static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^({})[-_].*TEMPLATE.*\.(md|yaml|yml|feature)$",
        ArtifactKind::prefix_alternation()
    ))
    .unwrap()
});

static SCHEMA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^({})[-_]SCHEMA\.(yaml|yml)$",
        ArtifactKind::prefix_alternation()
    ))
    .unwrap()
});

impl ArtifactId {
    pub fn document(kind: ArtifactKind, doc: u32) -> Self {
        Self {
            kind,
            doc,
            section: None,
            element: None,
        }
    }

    /// Parse an identifier, normalizing numeric widths.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = ID_RE.captures(raw.trim())?;
        let kind = ArtifactKind::from_prefix(&caps[1])?;
        Some(Self {
            kind,
            doc: caps[2].parse().ok()?,
            section: caps.get(3).and_then(|m| m.as_str().parse().ok()),
            element: caps.get(4).and_then(|m| m.as_str().parse().ok()),
        })
    }

    /// The whole-document identifier this id belongs to.
    pub fn as_document(&self) -> Self {
        Self::document(self.kind, self.doc)
    }

    pub fn layer(&self) -> u8 {
        self.kind.layer()
    }

    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.kind.prefix(), self.doc)?;
        if let Some(section) = self.section {
            write!(f, ".{:02}", section)?;
        }
        if let Some(element) = self.element {
            write!(f, ".{:02}", element)?;
        }
        Ok(())
    }
}

impl Serialize for ArtifactId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

/// An identifier mentioned in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub id: ArtifactId,
    pub raw: String,
    pub column: usize,
}

/// Every identifier mentioned on a line, in order of appearance.
pub fn find_mentions(line: &str) -> Vec<Mention> {
    let mut out = Vec::new();
    for caps in MENTION_RE.captures_iter(line) {
        let whole = caps.get(0).map(|m| (m.start(), m.end(), m.as_str()));
        let Some((start, end, raw)) = whole else {
            continue;
        };
        // `ADR-00512` is not `ADR-0051`.
        if line[end..].chars().next().is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Some(id) = ArtifactId::parse(raw) {
            out.push(Mention {
                id,
                raw: raw.to_string(),
                column: start + 1,
            });
        }
    }
    out
}

/// Result of classifying a path by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Artifact {
        id: ArtifactId,
        format: Format,
        slug: Option<String>,
    },
    Template {
        kind: ArtifactKind,
        format: Format,
    },
    Schema {
        kind: ArtifactKind,
    },
    /// Index-only files: `*_index.md` and all-zero document numbers such as
    /// traceability matrices (`BRD-00_traceability_matrix.md`).
    Index {
        kind: ArtifactKind,
        format: Format,
    },
    NotArtifact,
}

impl Classification {
    pub fn kind(&self) -> Option<ArtifactKind> {
        match self {
            Classification::Artifact { id, .. } => Some(id.kind),
            Classification::Template { kind, .. }
            | Classification::Schema { kind }
            | Classification::Index { kind, .. } => Some(*kind),
            Classification::NotArtifact => None,
        }
    }
}

pub fn classify(path: &Path) -> Classification {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Classification::NotArtifact;
    };
    if let Some(caps) = SCHEMA_RE.captures(name) {
        if let Some(kind) = ArtifactKind::from_prefix(&caps[1]) {
            return Classification::Schema { kind };
        }
    }
    if let Some(caps) = TEMPLATE_RE.captures(name) {
        let kind = ArtifactKind::from_prefix(&caps[1]);
        let format = Format::from_extension(&caps[2]);
        if let (Some(kind), Some(format)) = (kind, format) {
            return Classification::Template { kind, format };
        }
    }
    let Some(caps) = FILE_RE.captures(name) else {
        return Classification::NotArtifact;
    };
    let (Some(kind), Some(format)) = (
        ArtifactKind::from_prefix(&caps[1]),
        Format::from_extension(&caps[5]),
    ) else {
        return Classification::NotArtifact;
    };
    let doc: u32 = match caps[2].parse() {
        Ok(n) => n,
        Err(_) => return Classification::NotArtifact,
    };
    let section = caps.get(3).and_then(|m| m.as_str().parse().ok());
    let slug = caps.get(4).map(|m| m.as_str().to_string());

    let index_suffix = name.ends_with("_index.md");
    if (doc == 0 && section.is_none()) || (index_suffix && section.is_none()) {
        return Classification::Index { kind, format };
    }

    Classification::Artifact {
        id: ArtifactId {
            kind,
            doc,
            section,
            element: None,
        },
        format,
        slug,
    }
}

/// The raw digits of the document number as written in the file name.
pub fn raw_doc_digits(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let caps = FILE_RE.captures(name)?;
    Some(caps[2].to_string())
}

/// Whether a file name uses a known kind prefix at all, even if malformed.
pub fn has_known_prefix(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let prefix: String = name.chars().take_while(|c| c.is_ascii_uppercase()).collect();
    ArtifactKind::from_prefix(&prefix).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_normalizes_width() {
        let a = ArtifactId::parse("ADR-005").expect("parse");
        let b = ArtifactId::parse("ADR-05").expect("parse");
        assert_eq!(a, b);
        assert_eq!(a.canonical(), "ADR-05");
        assert_eq!(
            ArtifactId::parse("REQ-07.03.02").map(|id| id.canonical()),
            Some("REQ-07.03.02".to_string())
        );
        assert!(ArtifactId::parse("XYZ-01").is_none());
    }

    #[test]
    fn classify_regular_section_and_index_files() {
        match classify(&PathBuf::from("docs/05_ADR/ADR-003_event_bus.md")) {
            Classification::Artifact { id, format, slug } => {
                assert_eq!(id.canonical(), "ADR-03");
                assert_eq!(format, Format::Markdown);
                assert_eq!(slug.as_deref(), Some("event_bus"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match classify(&PathBuf::from("PRD-001.0_overview.md")) {
            Classification::Artifact { id, .. } => assert_eq!(id.section, Some(0)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            classify(&PathBuf::from("BRD-00_traceability_matrix.md")),
            Classification::Index { .. }
        ));
        assert!(matches!(
            classify(&PathBuf::from("ADR-TEMPLATE.md")),
            Classification::Template { .. }
        ));
        assert!(matches!(
            classify(&PathBuf::from("ADR_SCHEMA.yaml")),
            Classification::Schema { .. }
        ));
        assert_eq!(classify(&PathBuf::from("README.md")), Classification::NotArtifact);
    }

    #[test]
    fn slugless_yaml_classifies() {
        match classify(&PathBuf::from("SPEC-07.yaml")) {
            Classification::Artifact { id, format, slug } => {
                assert_eq!(id.canonical(), "SPEC-07");
                assert_eq!(format, Format::Yaml);
                assert!(slug.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mentions_skip_longer_numbers() {
        let found = find_mentions("See ADR-005 and REQ-07.03.02, not ADR-00512.");
        let ids: Vec<String> = found.iter().map(|m| m.id.canonical()).collect();
        assert_eq!(ids, vec!["ADR-05", "REQ-07.03.02"]);
        assert_eq!(found[0].raw, "ADR-005");
    }
}

//! Loaded artifact records and traceability tags.

use crate::core::frontmatter::{Frontmatter, FrontmatterSpan};
use crate::core::ids::{self, ArtifactId, Mention};
use crate::core::kinds::{ArtifactKind, Format, TagKind};
use crate::core::markdown::{Heading, Structure};
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s(\[`"'|*])@([A-Za-z][A-Za-z0-9_-]*):[ \t]*([^|`"\n]*)"#).unwrap()
});
static ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*$").unwrap());

/// Placeholder values meaning "not yet known".
const PENDING_WORDS: &[&str] = &["PENDING", "TBD", "N/A", "NONE", "NULL"];

/// One parsed reference inside a tag: `DocId[:ElementId]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRef {
    pub target: ArtifactId,
    pub element: Option<String>,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Ref(TagRef),
    Pending(String),
    /// A non-reference value: an `@impl-status:` word or an `@threshold:` key.
    Value(String),
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceTag {
    pub kind: TagKind,
    pub raw_kind: String,
    pub line: usize,
    pub values: Vec<TagValue>,
}

impl TraceTag {
    pub fn refs(&self) -> impl Iterator<Item = &TagRef> {
        self.values.iter().filter_map(|v| match v {
            TagValue::Ref(r) => Some(r),
            _ => None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.values.iter().any(|v| matches!(v, TagValue::Pending(_)))
    }
}

/// Extract every `@kind: value` tag on the given lines. Lines for which
/// `skip(line_no)` is true (fenced code) are ignored.
pub fn parse_tags(text: &str, skip: impl Fn(usize) -> bool) -> Vec<TraceTag> {
    let mut tags = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if skip(line_no) || !line.contains('@') {
            continue;
        }
        for caps in TAG_RE.captures_iter(line) {
            let raw_kind = caps[1].to_string();
            let kind = TagKind::parse(&raw_kind);
            let values = caps[2]
                .split(',')
                .map(|t| t.trim().trim_end_matches(['.', ';', ')', ']']).trim())
                .filter(|t| !t.is_empty())
                .map(|t| parse_value(&kind, t))
                .collect::<Vec<_>>();
            if values.is_empty() {
                continue;
            }
            tags.push(TraceTag {
                kind,
                raw_kind,
                line: line_no,
                values,
            });
        }
    }
    tags
}

fn parse_value(kind: &TagKind, token: &str) -> TagValue {
    match kind {
        TagKind::ImplStatus => return TagValue::Value(token.to_ascii_lowercase()),
        TagKind::Threshold => return TagValue::Value(token.to_string()),
        _ => {}
    }
    if PENDING_WORDS.contains(&token.to_ascii_uppercase().as_str()) {
        return TagValue::Pending(token.to_string());
    }
    let (doc, element) = match token.split_once(':') {
        Some((doc, el)) => (doc, Some(el)),
        None => (token, None),
    };
    let Some(target) = ArtifactId::parse(doc) else {
        return TagValue::Malformed(token.to_string());
    };
    if let Some(el) = element {
        if !ELEMENT_RE.is_match(el) {
            return TagValue::Malformed(token.to_string());
        }
    }
    TagValue::Ref(TagRef {
        target,
        element: element.map(str::to_string),
        raw: token.to_string(),
    })
}

/// A fully parsed artifact file. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub id: ArtifactId,
    pub format: Format,
    pub slug: Option<String>,
    pub is_template: bool,
    /// Loaded from a `--search-dir` root: used for resolution only, never validated.
    pub external: bool,
    pub frontmatter: Option<Frontmatter>,
    pub frontmatter_span: Option<FrontmatterSpan>,
    /// Frontmatter was present but could not be parsed (`VAL-E002` already emitted).
    pub frontmatter_error: bool,
    pub schema_version: Option<String>,
    pub text: String,
    pub structure: Structure,
    pub tags: Vec<TraceTag>,
    pub mentions: Vec<(usize, Mention)>,
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        self.id.kind
    }

    pub fn layer(&self) -> u8 {
        self.id.layer()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// First body line after the frontmatter block.
    pub fn body_start(&self) -> usize {
        self.frontmatter_span.map(|s| s.close + 1).unwrap_or(1)
    }

    pub fn in_frontmatter(&self, line: usize) -> bool {
        self.frontmatter_span
            .is_some_and(|s| line >= s.open && line <= s.close)
    }

    /// A body line that is neither frontmatter nor fenced code.
    pub fn is_prose_line(&self, line: usize) -> bool {
        self.format != Format::Yaml && !self.in_frontmatter(line) && !self.structure.is_code(line)
    }

    pub fn h1(&self) -> Option<&Heading> {
        self.structure.headings.iter().find(|h| h.level == 1)
    }

    pub fn fm_str(&self, key: &str) -> Option<String> {
        self.frontmatter.as_ref().and_then(|fm| fm.get_str(key))
    }

    /// Documents split into `<ID>.0` index plus section files share a document id.
    pub fn is_section_file(&self) -> bool {
        self.id.section.is_some()
    }
}

/// Build the mention list for a record, skipping fenced code and self-mentions.
pub fn collect_mentions(
    text: &str,
    own: &ArtifactId,
    skip: impl Fn(usize) -> bool,
) -> Vec<(usize, Mention)> {
    let own_doc = own.as_document();
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if skip(line_no) {
            continue;
        }
        for mention in ids::find_mentions(line) {
            if mention.id.as_document() == own_doc {
                continue;
            }
            out.push((line_no, mention));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinds::ArtifactKind;

    #[test]
    fn parses_namespaced_and_pending_tags() {
        let text = "@brd: BRD-01:03, BRD-02:01.2\n@spec: PENDING\n";
        let tags = parse_tags(text, |_| false);
        assert_eq!(tags.len(), 2);
        let refs: Vec<&TagRef> = tags[0].refs().collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].target.canonical(), "BRD-01");
        assert_eq!(refs[1].element.as_deref(), Some("01.2"));
        assert_eq!(
            tags[1].kind,
            TagKind::Artifact(ArtifactKind::TechnicalSpec)
        );
        assert!(tags[1].is_pending());
    }

    #[test]
    fn table_cells_and_malformed_refs() {
        let text = "| Upstream | @prd: PRD-01:1 | ok |\n- @adr: ADR-x\n@impl-status: complete\n";
        let tags = parse_tags(text, |_| false);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].refs().count(), 1);
        assert!(matches!(tags[1].values[0], TagValue::Malformed(_)));
        assert_eq!(tags[2].values, vec![TagValue::Value("complete".into())]);
    }

    #[test]
    fn emails_and_skipped_lines_are_ignored() {
        let text = "mail dev@example.com: hi\n@adr: ADR-01\n";
        let tags = parse_tags(text, |line| line == 2);
        assert!(tags.is_empty());
    }

    #[test]
    fn mentions_exclude_self() {
        let own = ArtifactId::parse("ADR-03").expect("id");
        let text = "ADR-003 builds on ADR-01.\n```\nADR-09\n```\n";
        let mentions = collect_mentions(text, &own, |line| (2..=4).contains(&line));
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].1.id.canonical(), "ADR-01");
    }
}

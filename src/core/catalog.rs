//! Error catalog: the registry of stable diagnostic codes.
//!
//! Codes follow `<NAMESPACE>-<SEVERITY><NNN>`. Fixed namespaces (`VAL`, `SEC`,
//! `COUNT`, ...) have one entry per code. Artifact-kind namespaces share a
//! single per-kind table keyed by the `<SEVERITY><NNN>` suffix, so `ADR-E002`
//! and `REQ-E002` are the same finding in different namespaces.

use crate::core::diagnostic::Diagnostic;
use crate::core::kinds::ArtifactKind;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn word(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'E' => Some(Severity::Error),
            'W' => Some(Severity::Warning),
            'I' => Some(Severity::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

struct Entry {
    code: &'static str,
    title: &'static str,
    template: &'static str,
    hint: Option<&'static str>,
    fixed: Option<&'static str>,
}

const fn entry(code: &'static str, title: &'static str, template: &'static str) -> Entry {
    Entry {
        code,
        title,
        template,
        hint: None,
        fixed: None,
    }
}

const fn hinted(
    code: &'static str,
    title: &'static str,
    template: &'static str,
    hint: &'static str,
) -> Entry {
    Entry {
        code,
        title,
        template,
        hint: Some(hint),
        fixed: None,
    }
}

const fn fixable(
    code: &'static str,
    title: &'static str,
    template: &'static str,
    hint: &'static str,
    fixed: &'static str,
) -> Entry {
    Entry {
        code,
        title,
        template,
        hint: Some(hint),
        fixed: Some(fixed),
    }
}

/// Stable code names referenced by rules.
pub mod codes {
    pub const VAL_E001: &str = "VAL-E001";
    pub const VAL_E002: &str = "VAL-E002";
    pub const VAL_E003: &str = "VAL-E003";
    pub const VAL_E004: &str = "VAL-E004";

    pub const SEC_E001: &str = "SEC-E001";
    pub const SEC_E002: &str = "SEC-E002";
    pub const SEC_E003: &str = "SEC-E003";
    pub const SEC_W001: &str = "SEC-W001";

    pub const COUNT_E001: &str = "COUNT-E001";
    pub const COUNT_W001: &str = "COUNT-W001";

    pub const DIAG_E001: &str = "DIAG-E001";
    pub const DIAG_E002: &str = "DIAG-E002";
    pub const DIAG_W001: &str = "DIAG-W001";
    pub const DIAG_W002: &str = "DIAG-W002";

    pub const FWDREF_E001: &str = "FWDREF-E001";
    pub const FWDREF_W001: &str = "FWDREF-W001";
    pub const FWDREF_W002: &str = "FWDREF-W002";

    pub const TAG_E001: &str = "TAG-E001";
    pub const TAG_E002: &str = "TAG-E002";
    pub const TAG_E003: &str = "TAG-E003";
    pub const TAG_E004: &str = "TAG-E004";
    pub const TAG_W001: &str = "TAG-W001";
    pub const TAG_W002: &str = "TAG-W002";
    pub const TAG_I001: &str = "TAG-I001";

    pub const MAGIC_W001: &str = "MAGIC-W001";
    pub const TERM_W001: &str = "TERM-W001";
    pub const NUM_W001: &str = "NUM-W001";

    pub const META_E001: &str = "META-E001";
    pub const META_E002: &str = "META-E002";
    pub const META_E003: &str = "META-E003";
    pub const META_E004: &str = "META-E004";

    pub const SYNC_E001: &str = "SYNC-E001";
    pub const SYNC_E002: &str = "SYNC-E002";
    pub const SYNC_E003: &str = "SYNC-E003";
    pub const SYNC_W001: &str = "SYNC-W001";

    pub const TRACE_E001: &str = "TRACE-E001";
    pub const TRACE_E002: &str = "TRACE-E002";
    pub const TRACE_E003: &str = "TRACE-E003";
    pub const TRACE_E004: &str = "TRACE-E004";
    pub const TRACE_W001: &str = "TRACE-W001";

    pub const SCORE_E001: &str = "SCORE-E001";
}

const CATALOG: &[Entry] = &[
    hinted(
        "VAL-E001",
        "Unreadable file",
        "cannot read file: {reason}",
        "Check permissions and that the file is valid UTF-8.",
    ),
    hinted(
        "VAL-E002",
        "Malformed frontmatter",
        "malformed frontmatter: {reason}",
        "Frontmatter must be a YAML mapping between two `---` lines.",
    ),
    hinted(
        "VAL-E003",
        "Unknown artifact prefix",
        "file name '{name}' does not match any known artifact kind",
        "Name artifacts <PREFIX>-<NN>_<slug>.<ext> using a registered prefix.",
    ),
    entry(
        "VAL-E004",
        "Invalid schema file",
        "schema file for {kind} is invalid: {reason}",
    ),
    fixable(
        "SEC-E001",
        "total_sections mismatch",
        "total_sections declares {declared} but {actual} section files exist for {doc}",
        "Update total_sections or run with --auto-fix.",
        "SEC-I001",
    ),
    entry(
        "SEC-E002",
        "total_sections missing",
        "section index for {doc} does not declare total_sections",
    ),
    hinted(
        "SEC-E003",
        "Missing section index",
        "{doc} has section files but no {doc}.0 index file",
        "Add a <ID>.0_<slug>.md index declaring total_sections.",
    ),
    entry(
        "SEC-W001",
        "Section numbering gap",
        "section {missing} of {doc} is missing",
    ),
    entry(
        "SEC-I001",
        "total_sections corrected",
        "auto-fixed: {detail}",
    ),
    fixable(
        "COUNT-E001",
        "Count claim mismatch",
        "claim of {claimed} {noun} does not match the {actual} items listed at line {list_line}",
        "Correct the number or the list, or run with --auto-fix.",
        "COUNT-I001",
    ),
    hinted(
        "COUNT-W001",
        "Large unverified list",
        "list of {actual} items starting at line {list_line} has no count claim",
        "State the number of items so the count can be verified.",
    ),
    entry(
        "COUNT-I001",
        "Count claim corrected",
        "auto-fixed: {detail}",
    ),
    entry("DIAG-E001", "Empty diagram", "{lang} diagram has no nodes"),
    hinted(
        "DIAG-E002",
        "Architecture section without diagram",
        "section '{section}' has no diagram",
        "Add a mermaid diagram describing the components.",
    ),
    entry(
        "DIAG-W001",
        "Diagram count mismatch",
        "prose claims {claimed} {noun} but the diagram at line {diagram_line} has {actual} nodes",
    ),
    entry(
        "DIAG-W002",
        "Unreferenced diagram node",
        "diagram node '{node}' (line {diagram_line}) is never mentioned in the surrounding prose",
    ),
    hinted(
        "FWDREF-E001",
        "Missing downstream artifact",
        "{source} (layer {source_layer}) references {target} (layer {target_layer}), which does not exist",
        "Reference downstream artifacts only after they exist, or use a PENDING tag.",
    ),
    entry(
        "FWDREF-W001",
        "Reference skips layers",
        "{source} (layer {source_layer}) references {target} (layer {target_layer}), crossing more than two layers",
    ),
    entry(
        "FWDREF-W002",
        "Downstream count claim",
        "'{claim}' counts {kind} artifacts, which belong to a downstream layer",
    ),
    hinted(
        "TAG-E001",
        "Unknown tag kind",
        "unknown traceability tag kind '@{kind}'",
        "Use a registered artifact prefix in lowercase, or impl-status.",
    ),
    entry(
        "TAG-E002",
        "Missing element id",
        "@{kind} references must use DocId:ElementId, found '{value}'",
    ),
    entry(
        "TAG-E003",
        "Invalid impl-status",
        "impl-status '{value}' is not one of pending, in-progress, complete, deprecated",
    ),
    entry(
        "TAG-E004",
        "Malformed reference",
        "malformed reference '{value}' in @{kind} tag",
    ),
    entry(
        "TAG-W001",
        "Unresolved upstream reference",
        "@{kind} tag references {target}, which is not in the index",
    ),
    entry(
        "TAG-W002",
        "Stale pending tag",
        "@{kind} tag is PENDING but {target} now exists; update the tag",
    ),
    entry("TAG-I001", "Pending tag", "@{kind} tag is pending"),
    hinted(
        "MAGIC-W001",
        "Hardcoded quantitative value",
        "hardcoded {category} value '{value}'",
        "Reference the shared threshold registry (e.g. @threshold: PRD-01:perf.latency.p95) instead.",
    ),
    entry(
        "TERM-W001",
        "Deprecated terminology",
        "deprecated term '{term}'; use '{canonical}'",
    ),
    fixable(
        "NUM-W001",
        "Numbering phrasing",
        "numbering guidance says '{found}'; document numbers start at `01`",
        "Write \"starting at `01`\", or run with --auto-fix.",
        "NUM-I001",
    ),
    entry(
        "NUM-I001",
        "Numbering phrasing corrected",
        "auto-fixed: {detail}",
    ),
    entry("META-E001", "Missing frontmatter", "no YAML frontmatter"),
    entry("META-E002", "Missing title", "frontmatter has no title"),
    entry("META-E003", "Missing tags", "frontmatter has no tags"),
    entry(
        "META-E004",
        "Missing document type",
        "frontmatter has no custom_fields.document_type",
    ),
    entry(
        "SYNC-E001",
        "Schema version mismatch",
        "template {template} declares schema_version {template_version} but {schema} declares {schema_version}",
    ),
    entry(
        "SYNC-E002",
        "Template without version",
        "template {template} does not declare schema_version",
    ),
    entry(
        "SYNC-E003",
        "Root template version",
        "{kind} has no schema; template {template} must declare schema_version n/a, found {template_version}",
    ),
    entry(
        "SYNC-W001",
        "Template without schema",
        "template {template} has no matching {kind} schema file",
    ),
    hinted(
        "TRACE-E001",
        "Missing traceability matrix",
        "no traceability matrix for {kind} artifacts in {dir}",
        "Add <PREFIX>-00_traceability_matrix.md listing every artifact of the kind.",
    ),
    entry(
        "TRACE-E002",
        "Artifact missing from matrix",
        "{id} is not listed in the traceability matrix",
    ),
    entry(
        "TRACE-E003",
        "Matrix without upstream section",
        "traceability matrix has no Upstream section",
    ),
    entry(
        "TRACE-E004",
        "Unresolved matrix reference",
        "traceability matrix references {target}, which does not exist",
    ),
    entry(
        "TRACE-W001",
        "Unresolved matrix reference",
        "traceability matrix references {target}, which does not exist",
    ),
    entry(
        "SCORE-E001",
        "Quality score below threshold",
        "quality score {score} is below the required {min}",
    ),
];

/// Entries shared by every artifact-kind namespace, keyed by suffix.
const KIND_ENTRIES: &[Entry] = &[
    hinted(
        "E001",
        "Duplicate identifier",
        "duplicate identifier {id}: also declared in {other}",
        "Every artifact id must be unique; renumber one of the files.",
    ),
    entry("E002", "Missing required field", "missing required field '{field}'"),
    entry(
        "E003",
        "Missing required section",
        "missing required section '{section}'",
    ),
    entry(
        "E004",
        "Invalid vocabulary value",
        "field '{field}' has value '{value}', expected one of: {allowed}",
    ),
    entry(
        "W001",
        "Missing recommended field",
        "missing recommended field '{field}'",
    ),
    entry(
        "W002",
        "Missing recommended section",
        "missing recommended section '{section}'",
    ),
    entry(
        "E010",
        "Identifier width",
        "document number '{digits}' must be {width} digits",
    ),
    entry(
        "E011",
        "Slug shape",
        "slug '{slug}' must be lowercase words separated by single hyphens or underscores",
    ),
    entry(
        "E012",
        "Invalid timestamp",
        "file name timestamp '{timestamp}' is not a valid YYYYMMDD_HHMMSS",
    ),
    entry(
        "E013",
        "H1 identifier mismatch",
        "H1 identifier {h1} does not match file identifier {id}",
    ),
    entry(
        "W010",
        "Sequence gap",
        "{kind} sequence has a gap: {missing} is missing",
    ),
    entry("W011", "Missing H1", "document has no H1 heading"),
];

/// Per-kind finding, rendered into the kind's own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindCode {
    Duplicate,
    MissingField,
    MissingSection,
    Vocabulary,
    RecommendedField,
    RecommendedSection,
    IdWidth,
    SlugShape,
    Timestamp,
    H1Mismatch,
    SequenceGap,
    MissingH1,
}

impl KindCode {
    fn suffix(self) -> &'static str {
        match self {
            KindCode::Duplicate => "E001",
            KindCode::MissingField => "E002",
            KindCode::MissingSection => "E003",
            KindCode::Vocabulary => "E004",
            KindCode::RecommendedField => "W001",
            KindCode::RecommendedSection => "W002",
            KindCode::IdWidth => "E010",
            KindCode::SlugShape => "E011",
            KindCode::Timestamp => "E012",
            KindCode::H1Mismatch => "E013",
            KindCode::SequenceGap => "W010",
            KindCode::MissingH1 => "W011",
        }
    }
}

pub fn kind_code(kind: ArtifactKind, code: KindCode) -> String {
    format!("{}-{}", kind.prefix(), code.suffix())
}

/// A catalog definition resolved for a concrete code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDef {
    pub code: String,
    pub severity: Severity,
    pub title: &'static str,
    pub template: &'static str,
    pub hint: Option<&'static str>,
    /// Code a diagnostic is demoted to once its auto-fix has been applied.
    pub fixed_code: Option<&'static str>,
}

fn resolve(code: &str) -> Option<&'static Entry> {
    let (namespace, suffix) = code.split_once('-')?;
    if ArtifactKind::from_prefix(namespace).is_some() {
        return KIND_ENTRIES.iter().find(|e| e.code == suffix);
    }
    CATALOG.iter().find(|e| e.code == code)
}

pub fn get(code: &str) -> Option<ErrorDef> {
    let e = resolve(code)?;
    Some(ErrorDef {
        code: code.to_string(),
        severity: severity_of(code),
        title: e.title,
        template: e.template,
        hint: e.hint,
        fixed_code: e.fixed,
    })
}

/// Severity is encoded in the code itself; unknown shapes count as errors.
pub fn severity_of(code: &str) -> Severity {
    code.split_once('-')
        .and_then(|(_, suffix)| suffix.chars().next())
        .and_then(Severity::from_letter)
        .unwrap_or(Severity::Error)
}

/// Render a code's message template, substituting `{key}` placeholders.
pub fn format(code: &str, context: &[(&str, String)]) -> String {
    let Some(e) = resolve(code) else {
        return context
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
    };
    let mut out = e.template.to_string();
    for (key, value) in context {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// `[<SEVERITY-WORD>] <CODE>: <path>[:<line>]: <message>`
pub fn format_line(diag: &Diagnostic) -> String {
    let location = match diag.line {
        Some(line) => format!("{}:{}", diag.path.display(), line),
        None => diag.path.display().to_string(),
    };
    format!(
        "[{}] {}: {}: {}",
        diag.severity.word(),
        diag.code,
        location,
        diag.message
    )
}

/// 2 when any error is present (or any warning under `strict`), 1 when only
/// warnings remain, 0 otherwise. Info never affects the result.
pub fn exit_code(diagnostics: &[Diagnostic], strict: bool) -> i32 {
    let errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);
    match (errors, warnings) {
        (true, _) => 2,
        (false, true) if strict => 2,
        (false, true) => 1,
        (false, false) => 0,
    }
}

/// Every fixed-namespace code, in catalog order.
pub fn all_codes() -> Vec<ErrorDef> {
    let mut out: Vec<ErrorDef> = CATALOG.iter().filter_map(|e| get(e.code)).collect();
    out.extend(
        KIND_ENTRIES
            .iter()
            .filter_map(|e| get(&format!("ADR-{}", e.code))),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn catalog_codes_are_well_formed_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for e in CATALOG {
            assert!(seen.insert(e.code), "duplicate {}", e.code);
            let (_, suffix) = e.code.split_once('-').expect("dash");
            assert_eq!(suffix.len(), 4, "{}", e.code);
            assert!(Severity::from_letter(suffix.chars().next().unwrap()).is_some());
            if let Some(fixed) = e.fixed {
                assert!(resolve(fixed).is_some(), "{} fixes to unknown {}", e.code, fixed);
            }
        }
    }

    #[test]
    fn kind_namespaces_share_entries() {
        let def = get("REQ-E002").expect("kind code");
        assert_eq!(def.severity, Severity::Error);
        assert_eq!(def.title, "Missing required field");
        assert_eq!(
            kind_code(ArtifactKind::Plan, KindCode::SequenceGap),
            "IPLAN-W010"
        );
        assert!(get("NOPE-E001").is_none());
    }

    #[test]
    fn format_substitutes_placeholders() {
        let msg = format(
            "SEC-E001",
            &[
                ("declared", "10".into()),
                ("actual", "8".into()),
                ("doc", "PRD-01".into()),
            ],
        );
        assert_eq!(
            msg,
            "total_sections declares 10 but 8 section files exist for PRD-01"
        );
    }

    #[test]
    fn format_line_shape() {
        let d = Diagnostic::new(
            "META-E002",
            &PathBuf::from("docs/ADR-01_x.md"),
            Some(2),
            &[],
        );
        assert_eq!(
            format_line(&d),
            "[ERROR] META-E002: docs/ADR-01_x.md:2: frontmatter has no title"
        );
    }

    #[test]
    fn exit_code_policy() {
        let p = PathBuf::from("x.md");
        let warn = Diagnostic::new("TERM-W001", &p, None, &[]);
        let err = Diagnostic::new("META-E001", &p, None, &[]);
        let info = Diagnostic::new("TAG-I001", &p, None, &[]);
        assert_eq!(exit_code(&[], false), 0);
        assert_eq!(exit_code(&[info.clone()], true), 0);
        assert_eq!(exit_code(&[warn.clone(), info.clone()], false), 1);
        assert_eq!(exit_code(&[warn.clone()], true), 2);
        assert_eq!(exit_code(&[warn, err], false), 2);
    }
}

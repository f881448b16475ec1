//! Artifact discovery and loading.
//!
//! Discovery is by file name only, never by directory layout. Loading reads a
//! file once and produces an immutable [`Artifact`]; failures become
//! diagnostics attached to the file and never abort the run.

use crate::core::artifact::{self, Artifact};
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::frontmatter::{self, Extracted, Frontmatter};
use crate::core::ids::{self, ArtifactId, Classification, Mention};
use crate::core::kinds::{ArtifactKind, Format};
use crate::core::markdown::{self, Structure};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, trace};
use walkdir::WalkDir;

static FEATURE_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*#\s*SCHEMA_VERSION:\s*(\S+)").unwrap());

const SKIPPED_DIRS: &[&str] = &["target", "node_modules", "__pycache__"];

/// A classified file found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub path: PathBuf,
    pub class: Classification,
}

/// Walk `root` and yield every file that classifies as something other than
/// [`Classification::NotArtifact`], in file-name order. Hidden directories and
/// build output are not entered.
pub fn discover_all(root: &Path, max_depth: Option<usize>) -> impl Iterator<Item = Discovered> {
    let mut walker = WalkDir::new(root).sort_by_file_name().follow_links(false);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }
    walker
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_ref())
        })
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                debug!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let class = ids::classify(e.path());
            match class {
                Classification::NotArtifact => None,
                class => Some(Discovered {
                    path: e.into_path(),
                    class,
                }),
            }
        })
}

/// Artifact files under `root`. Templates are included only on request;
/// index-only and schema files never are.
pub fn discover(root: &Path, include_templates: bool) -> impl Iterator<Item = PathBuf> {
    discover_all(root, None).filter_map(move |d| match d.class {
        Classification::Artifact { .. } => Some(d.path),
        Classification::Template { .. } if include_templates => Some(d.path),
        _ => None,
    })
}

/// Outcome of loading one file: a record when one could be built, plus any
/// loader diagnostics.
#[derive(Debug, Default)]
pub struct Loaded {
    pub artifact: Option<Artifact>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn load(path: &Path, class: &Classification, external: bool) -> Loaded {
    let (id, format, slug, is_template) = match class {
        Classification::Artifact { id, format, slug } => (*id, *format, slug.clone(), false),
        Classification::Template { kind, format } => {
            (ArtifactId::document(*kind, 0), *format, None, true)
        }
        _ => return Loaded::default(),
    };

    let text = match read_text(path) {
        Ok(text) => text,
        Err(diag) => {
            return Loaded {
                artifact: None,
                diagnostics: vec![diag],
            };
        }
    };

    let mut diagnostics = Vec::new();
    let mut fm = None;
    let mut span = None;
    let mut frontmatter_error = false;
    let mut first_body_line = 1;

    match format {
        Format::Markdown => match frontmatter::extract_markdown(&text) {
            Extracted::Absent => {}
            Extracted::Parsed(parsed, s) => {
                first_body_line = s.close + 1;
                fm = Some(parsed);
                span = Some(s);
            }
            Extracted::Malformed { line, reason } => {
                frontmatter_error = true;
                diagnostics.push(Diagnostic::new(
                    codes::VAL_E002,
                    path,
                    Some(line),
                    &[("reason", reason)],
                ));
            }
        },
        Format::Yaml => match Frontmatter::parse(&text) {
            Ok(parsed) => fm = Some(parsed),
            Err(reason) => {
                frontmatter_error = true;
                diagnostics.push(Diagnostic::new(
                    codes::VAL_E002,
                    path,
                    None,
                    &[("reason", reason)],
                ));
            }
        },
        Format::Feature => {}
    }

    let schema_version = match format {
        Format::Feature => FEATURE_VERSION_RE
            .captures(&text)
            .map(|caps| caps[1].to_string()),
        _ => fm.as_ref().and_then(Frontmatter::schema_version),
    };

    let structure = markdown::scan(&text, format, first_body_line);
    let tags = artifact::parse_tags(&text, |line| structure.is_code(line));
    let mentions = artifact::collect_mentions(&text, &id, |line| structure.is_code(line));
    trace!(path = %path.display(), tags = tags.len(), mentions = mentions.len(), "loaded");

    Loaded {
        artifact: Some(Artifact {
            path: path.to_path_buf(),
            id,
            format,
            slug,
            is_template,
            external,
            frontmatter: fm,
            frontmatter_span: span,
            frontmatter_error,
            schema_version,
            text,
            structure,
            tags,
            mentions,
        }),
        diagnostics,
    }
}

fn read_text(path: &Path) -> Result<String, Diagnostic> {
    let bytes = fs::read(path).map_err(|e| {
        Diagnostic::new(codes::VAL_E001, path, None, &[("reason", e.to_string())])
    })?;
    String::from_utf8(bytes).map_err(|e| {
        Diagnostic::new(
            codes::VAL_E001,
            path,
            None,
            &[("reason", format!("not valid UTF-8 ({})", e.utf8_error()))],
        )
    })
}

/// An index-only file (traceability matrix or `_index.md`). Not an artifact:
/// it has no identity, only the ids it lists.
#[derive(Debug, Clone)]
pub struct IndexDoc {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub text: String,
    pub structure: Structure,
    pub mentions: Vec<(usize, Mention)>,
}

impl IndexDoc {
    pub fn is_traceability_matrix(&self) -> bool {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        name.contains("traceability") && name.contains("matrix")
    }
}

pub fn load_index(path: &Path, kind: ArtifactKind, format: Format) -> Result<IndexDoc, Diagnostic> {
    let text = read_text(path)?;
    let first_line = match frontmatter::extract_markdown(&text) {
        Extracted::Parsed(_, span) => span.close + 1,
        _ => 1,
    };
    let structure = markdown::scan(&text, format, first_line);
    // Mentions of the matrix's own all-zero id are not listings.
    let own = ArtifactId::document(kind, 0);
    let mentions = artifact::collect_mentions(&text, &own, |line| structure.is_code(line));
    Ok(IndexDoc {
        path: path.to_path_buf(),
        kind,
        text,
        structure,
        mentions,
    })
}

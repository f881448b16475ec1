//! Line-oriented structure of Markdown and Gherkin bodies: headings, fenced
//! code blocks and itemized lists. All line numbers are 1-based.

use crate::core::kinds::Format;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").unwrap());
static NUMBER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+(.*)$").unwrap());
static GHERKIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(Feature|Background|Rule|Scenario Outline|Scenario Template|Scenario|Example):\s*(.*)$")
        .unwrap()
});
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(?:[-*+]|\d+[.)])\s+\S").unwrap());
static TABLE_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)*\|?\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: usize,
    pub line: usize,
    /// Numeric prefix such as `3` or `3.2`, when present.
    pub number: Option<String>,
    pub title: String,
}

impl Heading {
    /// Level 2–3 headings carrying a numeric prefix.
    pub fn is_numbered_section(&self) -> bool {
        self.number.is_some() && (2..=3).contains(&self.level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeFence {
    pub lang: Option<String>,
    /// Line of the opening fence.
    pub start_line: usize,
    /// Number of content lines between the fences.
    pub line_count: usize,
    pub digest: String,
    #[serde(skip)]
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bulleted,
    Table,
}

/// A contiguous itemized list or table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBlock {
    pub kind: ListKind,
    pub start_line: usize,
    pub end_line: usize,
    /// Top-level items, or data rows for tables.
    pub items: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub headings: Vec<Heading>,
    pub fences: Vec<CodeFence>,
    /// `in_fence[i]` is true when line `i + 1` is a fence delimiter or inside one.
    pub in_fence: Vec<bool>,
}

impl Structure {
    pub fn is_code(&self, line: usize) -> bool {
        line >= 1 && self.in_fence.get(line - 1).copied().unwrap_or(false)
    }

    /// `(first, last)` line covered by the heading at `idx`, up to the next
    /// heading of the same or a higher level.
    pub fn section_span(&self, idx: usize, total_lines: usize) -> (usize, usize) {
        let heading = &self.headings[idx];
        let end = self.headings[idx + 1..]
            .iter()
            .find(|h| h.level <= heading.level)
            .map(|h| h.line - 1)
            .unwrap_or(total_lines);
        (heading.line, end)
    }

    /// Index of the innermost heading that contains `line`.
    pub fn enclosing_heading(&self, line: usize) -> Option<usize> {
        self.headings.iter().rposition(|h| h.line <= line)
    }
}

pub fn digest(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Scan `text` for headings and fences. `first_line` lets callers skip a
/// frontmatter block (lines before it are ignored).
pub fn scan(text: &str, format: Format, first_line: usize) -> Structure {
    let lines: Vec<&str> = text.lines().collect();
    let mut structure = Structure {
        in_fence: vec![false; lines.len()],
        ..Structure::default()
    };

    let mut open: Option<(usize, Option<String>, Vec<&str>)> = None;
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line_no < first_line {
            continue;
        }
        let trimmed = line.trim_start();
        if format == Format::Markdown && trimmed.starts_with("```") {
            structure.in_fence[idx] = true;
            match open.take() {
                Some((start, lang, body)) => {
                    let content = body.join("\n");
                    structure.fences.push(CodeFence {
                        lang,
                        start_line: start,
                        line_count: body.len(),
                        digest: digest(&content),
                        content,
                    });
                }
                None => {
                    let lang = trimmed
                        .trim_start_matches('`')
                        .split_whitespace()
                        .next()
                        .map(|s| s.trim_matches(|c| c == '{' || c == '}').to_ascii_lowercase())
                        .filter(|s| !s.is_empty());
                    open = Some((line_no, lang, Vec::new()));
                }
            }
            continue;
        }
        if let Some((_, _, body)) = open.as_mut() {
            structure.in_fence[idx] = true;
            body.push(line);
            continue;
        }
        match format {
            Format::Markdown => {
                if let Some(h) = parse_heading(line, line_no) {
                    structure.headings.push(h);
                }
            }
            Format::Feature => {
                if let Some(caps) = GHERKIN_RE.captures(line) {
                    let level = if &caps[1] == "Feature" { 1 } else { 2 };
                    structure.headings.push(Heading {
                        level,
                        line: line_no,
                        number: None,
                        title: format!("{}: {}", &caps[1], caps[2].trim()),
                    });
                }
            }
            Format::Yaml => {}
        }
    }
    // An unterminated fence swallows the rest of the file, as renderers do.
    if let Some((start, lang, body)) = open {
        let content = body.join("\n");
        structure.fences.push(CodeFence {
            lang,
            start_line: start,
            line_count: body.len(),
            digest: digest(&content),
            content,
        });
    }
    structure
}

fn parse_heading(line: &str, line_no: usize) -> Option<Heading> {
    let caps = HEADING_RE.captures(line)?;
    let level = caps[1].len();
    let text = caps[2].trim();
    let (number, title) = match NUMBER_PREFIX_RE.captures(text) {
        Some(num) => (Some(num[1].to_string()), num[2].trim().to_string()),
        None => (None, text.to_string()),
    };
    Some(Heading {
        level,
        line: line_no,
        number,
        title,
    })
}

/// Itemized blocks outside code fences.
pub fn find_lists(lines: &[&str], structure: &Structure) -> Vec<ListBlock> {
    let mut blocks = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        let line_no = idx + 1;
        if structure.is_code(line_no) {
            idx += 1;
            continue;
        }
        let line = lines[idx];
        if let Some(caps) = BULLET_RE.captures(line) {
            let base_indent = caps[1].len();
            let start = line_no;
            let mut items = 0;
            let mut end = line_no;
            while idx < lines.len() && !structure.is_code(idx + 1) {
                let current = lines[idx];
                if let Some(c) = BULLET_RE.captures(current) {
                    if c[1].len() <= base_indent {
                        items += 1;
                    }
                    end = idx + 1;
                } else if current.trim().is_empty() {
                    // A blank line ends the list unless the next line continues it.
                    let continues = lines
                        .get(idx + 1)
                        .is_some_and(|next| BULLET_RE.is_match(next));
                    if !continues {
                        break;
                    }
                } else if current.starts_with(' ') || current.starts_with('\t') {
                    end = idx + 1;
                } else {
                    break;
                }
                idx += 1;
            }
            blocks.push(ListBlock {
                kind: ListKind::Bulleted,
                start_line: start,
                end_line: end,
                items,
            });
            continue;
        }
        if line.trim_start().starts_with('|') {
            let start = line_no;
            let mut rows: usize = 0;
            let mut saw_separator = false;
            while idx < lines.len() && lines[idx].trim_start().starts_with('|') {
                if TABLE_SEPARATOR_RE.is_match(lines[idx]) {
                    saw_separator = true;
                } else {
                    rows += 1;
                }
                idx += 1;
            }
            // The header row is not an item.
            let items = if saw_separator { rows.saturating_sub(1) } else { rows };
            blocks.push(ListBlock {
                kind: ListKind::Table,
                start_line: start,
                end_line: idx,
                items,
            });
            continue;
        }
        idx += 1;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# ADR-01: Title\n\n## 1. Context\n\n```mermaid\n## not a heading\nA --> B\n```\n\n## 2. Decision\n### 2.1 Detail\n";

    #[test]
    fn headings_skip_fenced_content() {
        let s = scan(DOC, Format::Markdown, 1);
        let titles: Vec<&str> = s.headings.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["ADR-01: Title", "Context", "Decision", "Detail"]);
        assert_eq!(s.headings[3].number.as_deref(), Some("2.1"));
        assert!(s.headings[1].is_numbered_section());
        assert!(!s.headings[0].is_numbered_section());
    }

    #[test]
    fn fences_record_language_and_extent() {
        let s = scan(DOC, Format::Markdown, 1);
        assert_eq!(s.fences.len(), 1);
        let fence = &s.fences[0];
        assert_eq!(fence.lang.as_deref(), Some("mermaid"));
        assert_eq!(fence.start_line, 5);
        assert_eq!(fence.line_count, 2);
        assert_eq!(fence.digest.len(), 64);
        assert!(s.is_code(6));
        assert!(!s.is_code(3));
    }

    #[test]
    fn section_span_stops_at_same_level() {
        let s = scan(DOC, Format::Markdown, 1);
        let lines = DOC.lines().count();
        assert_eq!(s.section_span(1, lines), (3, 9));
        assert_eq!(s.section_span(2, lines), (10, lines));
    }

    #[test]
    fn gherkin_keywords_become_headings() {
        let text = "# SCHEMA_VERSION: 1.0\nFeature: Login\n  Scenario: ok\n    Given a user\n";
        let s = scan(text, Format::Feature, 1);
        assert_eq!(s.headings.len(), 2);
        assert_eq!(s.headings[0].level, 1);
        assert_eq!(s.headings[1].title, "Scenario: ok");
    }

    #[test]
    fn lists_and_tables_count_items() {
        let text = "Intro:\n\n- one\n- two\n  - nested\n- three\n\n| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n";
        let lines: Vec<&str> = text.lines().collect();
        let s = scan(text, Format::Markdown, 1);
        let blocks = find_lists(&lines, &s);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].items, 3);
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (3, 6));
        assert_eq!(blocks[1].kind, ListKind::Table);
        assert_eq!(blocks[1].items, 2);
    }
}

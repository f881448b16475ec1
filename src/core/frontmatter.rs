//! YAML frontmatter extraction and typed access.
//!
//! Markdown frontmatter is located by search, not anchored at byte zero:
//! blank lines, `#!` lines and HTML comments may precede the opening `---`.

use serde_yaml::{Mapping, Value};

/// A parsed frontmatter mapping (or the root mapping of a YAML artifact).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    map: Mapping,
}

impl Frontmatter {
    pub fn new(map: Mapping) -> Self {
        Self { map }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        match serde_yaml::from_str::<Value>(raw) {
            Ok(Value::Mapping(map)) => Ok(Self { map }),
            Ok(Value::Null) => Ok(Self::default()),
            Ok(_) => Err("frontmatter root is not a mapping".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Look up a dotted path such as `custom_fields.document_type`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.map.get(first)?;
        for part in parts {
            current = current.as_mapping()?.get(part)?;
        }
        Some(current)
    }

    /// Look up `key`, falling back to `custom_fields.<key>` and `metadata.<key>`.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
            .or_else(|| self.get(&format!("custom_fields.{key}")))
            .or_else(|| self.get(&format!("metadata.{key}")))
    }

    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some_and(|v| !is_blank(v))
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.lookup(key).and_then(scalar_to_string)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.lookup(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Scalar or sequence-of-scalars values, as strings.
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(Value::Sequence(seq)) => seq.iter().filter_map(scalar_to_string).collect(),
            Some(v) => scalar_to_string(v).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn schema_version(&self) -> Option<String> {
        self.get_str("schema_version")
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}

pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

/// Where a frontmatter block sits in the file, 1-based inclusive line numbers
/// of the two delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterSpan {
    pub open: usize,
    pub close: usize,
}

#[derive(Debug, PartialEq)]
pub enum Extracted {
    /// No frontmatter block at all.
    Absent,
    /// Block found and parsed.
    Parsed(Frontmatter, FrontmatterSpan),
    /// Block found but unterminated or not valid YAML.
    Malformed { line: usize, reason: String },
}

/// Find and parse the leading frontmatter block of a Markdown document.
pub fn extract_markdown(text: &str) -> Extracted {
    let lines: Vec<&str> = text.lines().collect();
    let mut in_comment = false;
    let mut open = None;
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if in_comment {
            if trimmed.contains("-->") {
                in_comment = false;
            }
            continue;
        }
        if trimmed == "---" {
            open = Some(idx);
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with("#!") {
            continue;
        }
        if trimmed.starts_with("<!--") {
            in_comment = !trimmed.contains("-->");
            continue;
        }
        // First real content line: the document has no frontmatter.
        return Extracted::Absent;
    }
    let Some(open) = open else {
        return Extracted::Absent;
    };
    let close = lines
        .iter()
        .enumerate()
        .skip(open + 1)
        .find(|(_, l)| matches!(l.trim_end(), "---" | "..."))
        .map(|(idx, _)| idx);
    let Some(close) = close else {
        return Extracted::Malformed {
            line: open + 1,
            reason: "frontmatter opening `---` has no closing delimiter".to_string(),
        };
    };
    let raw = lines[open + 1..close].join("\n");
    match Frontmatter::parse(&raw) {
        Ok(fm) => Extracted::Parsed(
            fm,
            FrontmatterSpan {
                open: open + 1,
                close: close + 1,
            },
        ),
        Err(reason) => Extracted::Malformed {
            line: open + 1,
            reason,
        },
    }
}

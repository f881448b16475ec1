//! Mermaid diagrams versus the prose around them.

use super::counts::parse_number;
use super::RuleContext;
use crate::core::artifact::Artifact;
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::kinds::Format;
use crate::core::markdown::CodeFence;
use regex::Regex;
use std::sync::LazyLock;

const DIAGRAM_LANGS: &[&str] = &["mermaid", "plantuml", "puml", "dot", "graphviz", "d2"];
const ARCHITECTURE_WORDS: &[&str] = &["architecture", "system design", "infrastructure", "deployment"];
const FLOW_KEYWORDS: &[&str] = &[
    "graph", "flowchart", "subgraph", "end", "direction", "TD", "TB", "BT", "LR", "RL", "style",
    "classDef", "class", "click", "linkStyle", "o", "x",
];

static FLOW_NODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b([A-Za-z_]\w*)\s*(?:\[\[?|\(\(?|\{\{?)\s*"?([^\]\)\}"]*)"?\s*(?:\]\]?|\)\)?|\}\}?)"#)
        .unwrap()
});
static LABEL_STRIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[[^\]]*\]|\([^)]*\)|\{[^}]*\}|\|[^|]*\||"[^"]*""#).unwrap()
});
static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_][\w]*").unwrap());
static PARTICIPANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:participant|actor)\s+(\S+)(?:\s+as\s+(.+?))?\s*$").unwrap()
});
static MESSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([\w ]+?)\s*-{1,2}(?:>>|>|x|\))[+-]?\s*([\w ]+?)\s*:").unwrap()
});
static C4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(Person|System|Container|Component)(?:Db|Queue)?(?:_Ext)?\s*\(\s*(\w+)\s*,\s*"([^"]*)""#)
        .unwrap()
});
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*class\s+([A-Za-z_]\w*)").unwrap());
static COMPONENT_CLAIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty)\s+(?:[a-z-]+\s+){0,2}?(services|microservices|components|nodes|systems|containers|modules|subsystems|tiers|servers|databases|queues)\b")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: Option<String>,
}

fn push_node(nodes: &mut Vec<Node>, id: &str, label: Option<&str>) {
    let label = label
        .map(|l| l.split("<br").next().unwrap_or(l).trim().to_string())
        .filter(|l| !l.is_empty());
    match nodes.iter_mut().find(|n| n.id == id) {
        Some(existing) => {
            if existing.label.is_none() {
                existing.label = label;
            }
        }
        None => nodes.push(Node {
            id: id.to_string(),
            label,
        }),
    }
}

/// Nodes of a mermaid diagram, in order of first appearance.
pub fn mermaid_nodes(content: &str) -> Vec<Node> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("%%"));
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let kind = header.split_whitespace().next().unwrap_or_default();
    let mut nodes = Vec::new();

    match kind {
        "sequenceDiagram" => {
            let body: Vec<&str> = lines.collect();
            for line in &body {
                if let Some(caps) = PARTICIPANT_RE.captures(line) {
                    push_node(&mut nodes, &caps[1], caps.get(2).map(|m| m.as_str()));
                }
            }
            if nodes.is_empty() {
                for line in &body {
                    if let Some(caps) = MESSAGE_RE.captures(line) {
                        push_node(&mut nodes, caps[1].trim(), None);
                        push_node(&mut nodes, caps[2].trim(), None);
                    }
                }
            }
        }
        "classDiagram" => {
            for line in lines {
                if let Some(caps) = CLASS_RE.captures(line) {
                    push_node(&mut nodes, &caps[1], None);
                }
            }
        }
        k if k.starts_with("C4") => {
            for line in lines {
                for caps in C4_RE.captures_iter(line) {
                    push_node(&mut nodes, &caps[2], Some(&caps[3]));
                }
            }
        }
        _ => {
            for line in lines {
                let first = line.split_whitespace().next().unwrap_or_default();
                if matches!(
                    first,
                    "subgraph" | "end" | "style" | "classDef" | "class" | "click" | "linkStyle" | "direction"
                ) {
                    continue;
                }
                for caps in FLOW_NODE_RE.captures_iter(line) {
                    push_node(&mut nodes, &caps[1], Some(&caps[2]));
                }
                let stripped = LABEL_STRIP_RE.replace_all(line, " ");
                for ident in IDENT_RE.find_iter(&stripped) {
                    let ident = ident.as_str();
                    if FLOW_KEYWORDS.contains(&ident) {
                        continue;
                    }
                    push_node(&mut nodes, ident, None);
                }
            }
        }
    }
    nodes
}

fn is_diagram(fence: &CodeFence) -> bool {
    fence
        .lang
        .as_deref()
        .is_some_and(|lang| DIAGRAM_LANGS.contains(&lang))
}

fn is_mermaid(fence: &CodeFence) -> bool {
    fence.lang.as_deref() == Some("mermaid")
}

/// Line range of the section that owns `line`; the whole file when no
/// heading precedes it.
fn owning_span(artifact: &Artifact, line: usize) -> (usize, usize) {
    match artifact.structure.enclosing_heading(line) {
        Some(idx) => artifact.structure.section_span(idx, artifact.line_count()),
        None => (1, artifact.line_count()),
    }
}

fn prose_in(artifact: &Artifact, (start, end): (usize, usize)) -> String {
    artifact
        .text
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text))
        .filter(|(line, _)| *line >= start && *line <= end && artifact.is_prose_line(*line))
        .map(|(_, text)| text.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Nearest mermaid diagram in the claim's section, widening to enclosing
/// sections when the innermost one has none.
fn diagram_for_claim<'a>(
    artifact: &'a Artifact,
    line: usize,
    diagrams: &'a [(&'a CodeFence, Vec<Node>)],
) -> Option<&'a (&'a CodeFence, Vec<Node>)> {
    let headings = &artifact.structure.headings;
    let mut current = artifact.structure.enclosing_heading(line);
    loop {
        let (start, end) = match current {
            Some(idx) => artifact.structure.section_span(idx, artifact.line_count()),
            None => (1, artifact.line_count()),
        };
        let nearest = diagrams
            .iter()
            .filter(|(f, _)| f.start_line >= start && f.start_line <= end)
            .min_by_key(|(f, _)| f.start_line.abs_diff(line));
        if nearest.is_some() {
            return nearest;
        }
        let idx = current?;
        let level = headings[idx].level;
        if level <= 1 {
            return None;
        }
        current = headings[..idx].iter().rposition(|h| h.level < level);
    }
}

pub fn check(artifact: &Artifact, _ctx: &RuleContext) -> Vec<Diagnostic> {
    if artifact.format != Format::Markdown {
        return Vec::new();
    }
    let mut diags = Vec::new();
    let diagrams: Vec<(&CodeFence, Vec<Node>)> = artifact
        .structure
        .fences
        .iter()
        .filter(|f| is_mermaid(f))
        .map(|f| (f, mermaid_nodes(&f.content)))
        .collect();

    for (fence, nodes) in &diagrams {
        if nodes.is_empty() {
            diags.push(Diagnostic::new(
                codes::DIAG_E001,
                &artifact.path,
                Some(fence.start_line),
                &[("lang", "mermaid".to_string())],
            ));
            continue;
        }
        let prose = prose_in(artifact, owning_span(artifact, fence.start_line));
        for node in nodes {
            let mentioned = match &node.label {
                Some(label) => prose.contains(&label.to_ascii_lowercase()),
                None => node.id.len() < 2,
            } || (node.id.len() > 1 && prose.contains(&node.id.to_ascii_lowercase()));
            if !mentioned {
                diags.push(Diagnostic::new(
                    codes::DIAG_W002,
                    &artifact.path,
                    Some(fence.start_line),
                    &[
                        ("node", node.label.clone().unwrap_or_else(|| node.id.clone())),
                        ("diagram_line", fence.start_line.to_string()),
                    ],
                ));
            }
        }
    }

    for (idx, heading) in artifact.structure.headings.iter().enumerate() {
        let title = heading.title.to_ascii_lowercase();
        if heading.level < 2
            || title.contains("architecture decision")
            || !ARCHITECTURE_WORDS.iter().any(|w| title.contains(w))
        {
            continue;
        }
        let (start, end) = artifact.structure.section_span(idx, artifact.line_count());
        let has_diagram = artifact
            .structure
            .fences
            .iter()
            .any(|f| is_diagram(f) && f.start_line > start && f.start_line <= end);
        if !has_diagram {
            diags.push(Diagnostic::new(
                codes::DIAG_E002,
                &artifact.path,
                Some(heading.line),
                &[("section", heading.title.clone())],
            ));
        }
    }

    for (idx, text) in artifact.text.lines().enumerate() {
        let line = idx + 1;
        if !artifact.is_prose_line(line) {
            continue;
        }
        for caps in COMPONENT_CLAIM_RE.captures_iter(text) {
            let Some(claimed) = parse_number(&caps[1]) else { continue };
            let Some((fence, nodes)) = diagram_for_claim(artifact, line, &diagrams) else {
                continue;
            };
            if nodes.is_empty() || nodes.len() == claimed {
                continue;
            }
            diags.push(Diagnostic::new(
                codes::DIAG_W001,
                &artifact.path,
                Some(line),
                &[
                    ("claimed", claimed.to_string()),
                    ("noun", caps[2].to_ascii_lowercase()),
                    ("diagram_line", fence.start_line.to_string()),
                    ("actual", nodes.len().to_string()),
                ],
            ));
        }
    }
    diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{codes, Fixture};

    const ARCH: &str = "# SYS-01\n\n## 3. System Architecture\n\nWe deploy 5 services: the Gateway, the Orders service and the Ledger.\n\n```mermaid\ngraph LR\n  gw[Gateway] --> orders[Orders]\n  orders --> ledger[Ledger]\n```\n";

    #[test]
    fn flowchart_nodes_and_labels() {
        let nodes = mermaid_nodes("flowchart TD\n  A[Client] -->|HTTPS| B(API)\n  B --> C{Cache?}\n  B --> D\n");
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
        assert_eq!(nodes[0].label.as_deref(), Some("Client"));
        assert_eq!(nodes[3].label, None);
    }

    #[test]
    fn sequence_c4_and_class_nodes() {
        let seq = mermaid_nodes("sequenceDiagram\n  participant U as User\n  participant S\n  U->>S: login\n");
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0].label.as_deref(), Some("User"));
        let implicit = mermaid_nodes("sequenceDiagram\n  Alice->>Bob: hi\n  Bob-->>Alice: ok\n");
        assert_eq!(implicit.len(), 2);
        let c4 = mermaid_nodes("C4Context\n  Person(u, \"Customer\")\n  System_Boundary(b, \"Shop\") {\n  System(s, \"Storefront\")\n  }\n");
        assert_eq!(c4.len(), 2);
        assert_eq!(mermaid_nodes("classDiagram\n  class Order\n  class Item\n").len(), 2);
    }

    #[test]
    fn count_claim_against_diagram() {
        let f = Fixture::new(&[("SYS-01_arch.md", ARCH)]);
        let diags = f.run(check, "SYS-01_arch.md", false);
        assert_eq!(codes(&diags), vec!["DIAG-W001"]);
        assert_eq!(diags[0].line, Some(5));
        assert!(diags[0].message.contains("line 7 has 3 nodes"));
    }

    #[test]
    fn architecture_section_without_diagram() {
        let f = Fixture::new(&[(
            "SYS-01_arch.md",
            "# SYS-01\n\n## 4. Deployment\n\nRuns on two clusters.\n\n## 5. Architecture Decisions\n",
        )]);
        let diags = f.run(check, "SYS-01_arch.md", false);
        assert_eq!(codes(&diags), vec!["DIAG-E002"]);
        assert_eq!(diags[0].line, Some(3));
    }

    #[test]
    fn empty_diagram_and_unmentioned_node() {
        let f = Fixture::new(&[(
            "SYS-01_arch.md",
            "# SYS-01\n\n```mermaid\ngraph TD\n```\n\n## Flow\n\nThe Gateway calls out.\n\n```mermaid\ngraph TD\n  gw[Gateway] --> rk[Risk Engine]\n```\n",
        )]);
        let diags = f.run(check, "SYS-01_arch.md", false);
        assert_eq!(codes(&diags), vec!["DIAG-E001", "DIAG-W002"]);
        assert!(diags[1].message.contains("'Risk Engine'"));
    }
}

//! Numeric claims in prose versus the lists they describe.
//!
//! A claim ("the following 5 requirements", "Total: 12", a heading ending in
//! "(7)") binds to the nearest itemized list: one starting within a few
//! lines after it, or, failing that, one ending just before it. Headings bind
//! to the first list in their section.

use super::RuleContext;
use crate::core::artifact::Artifact;
use crate::core::catalog::codes;
use crate::core::diagnostic::{Diagnostic, Fix};
use crate::core::markdown::{self, ListBlock};
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Lists at least this long should state their size.
pub const LARGE_LIST: usize = 10;
/// Non-blank lines allowed between a claim and the list after it.
const LOOKAHEAD: usize = 3;

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "twenty",
];

static NOUN_CLAIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,3}}|{})\s+(?:[a-z-]+\s+){{0,2}}?(items|requirements|features|steps|goals|objectives|risks|use cases|stakeholders|criteria|capabilities|endpoints|scenarios|tasks|phases|principles|constraints|assumptions|dependencies|entries|rules|metrics|deliverables|milestones)\b",
        NUMBER_WORDS[1..].join("|")
    ))
    .unwrap()
});
static TOTAL_CLAIM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btotal(?:\s+of)?\s*[:=]?\s*\**(\d{1,3})\b").unwrap());
static HEADING_CLAIM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d{1,3})(?:\s+[A-Za-z ]+)?\)\s*#*\s*$").unwrap());

pub fn parse_number(token: &str) -> Option<usize> {
    token.parse().ok().or_else(|| {
        let lowered = token.to_ascii_lowercase();
        NUMBER_WORDS.iter().position(|w| *w == lowered)
    })
}

/// A numeric claim found in prose.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Claim {
    line: usize,
    claimed: usize,
    /// Matched text and the number token's range within it.
    text: String,
    number_range: (usize, usize),
    noun: String,
    heading: Option<usize>,
}

fn claim_from(caps: &Captures, number_group: usize, noun: &str, line: usize) -> Option<Claim> {
    let whole = caps.get(0)?;
    let number = caps.get(number_group)?;
    let claimed = parse_number(number.as_str())?;
    if claimed == 0 {
        return None;
    }
    Some(Claim {
        line,
        claimed,
        text: whole.as_str().to_string(),
        number_range: (number.start() - whole.start(), number.end() - whole.start()),
        noun: noun.to_string(),
        heading: None,
    })
}

fn find_claims(artifact: &Artifact, lists: &[ListBlock]) -> Vec<Claim> {
    let in_list = |line: usize| lists.iter().any(|l| l.start_line <= line && line <= l.end_line);
    let mut claims = Vec::new();
    for (idx, text) in artifact.text.lines().enumerate() {
        let line = idx + 1;
        if !artifact.is_prose_line(line) || in_list(line) {
            continue;
        }
        if let Some(heading_idx) = artifact.structure.headings.iter().position(|h| h.line == line) {
            if let Some(caps) = HEADING_CLAIM_RE.captures(text) {
                if let Some(mut claim) = claim_from(&caps, 1, "items", line) {
                    claim.heading = Some(heading_idx);
                    claims.push(claim);
                }
            }
            continue;
        }
        for caps in NOUN_CLAIM_RE.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            // `REQ-07 requirements` is an identifier, not a count.
            if text[..whole.start()].ends_with(['-', '.']) {
                continue;
            }
            let noun = caps[2].to_ascii_lowercase();
            if let Some(claim) = claim_from(&caps, 1, &noun, line) {
                claims.push(claim);
            }
        }
        if let Some(caps) = TOTAL_CLAIM_RE.captures(text) {
            if let Some(claim) = claim_from(&caps, 1, "items", line) {
                claims.push(claim);
            }
        }
    }
    claims
}

fn bind<'l>(artifact: &Artifact, claim: &Claim, lists: &'l [ListBlock]) -> Option<&'l ListBlock> {
    if let Some(heading_idx) = claim.heading {
        let (start, end) = artifact
            .structure
            .section_span(heading_idx, artifact.line_count());
        return lists.iter().find(|l| l.start_line > start && l.start_line <= end);
    }
    let lines = artifact.lines();
    let heading_lines: BTreeSet<usize> = artifact.structure.headings.iter().map(|h| h.line).collect();
    let after = lists.iter().find(|l| {
        if l.start_line <= claim.line {
            return false;
        }
        let between = (claim.line + 1)..l.start_line;
        if between.clone().any(|n| heading_lines.contains(&n)) {
            return false;
        }
        between
            .filter(|n| lines.get(n - 1).is_some_and(|t| !t.trim().is_empty()))
            .count()
            <= LOOKAHEAD
    });
    after.or_else(|| {
        lists
            .iter()
            .rev()
            .find(|l| l.end_line < claim.line && claim.line - l.end_line <= 2)
    })
}

pub fn check(artifact: &Artifact, _ctx: &RuleContext) -> Vec<Diagnostic> {
    if artifact.format == crate::core::kinds::Format::Yaml {
        return Vec::new();
    }
    let lines = artifact.lines();
    let lists = markdown::find_lists(&lines, &artifact.structure);
    let mut claimed_lists = BTreeSet::new();
    let mut diags = Vec::new();

    for claim in find_claims(artifact, &lists) {
        let Some(list) = bind(artifact, &claim, &lists) else {
            continue;
        };
        claimed_lists.insert(list.start_line);
        if list.items == claim.claimed {
            continue;
        }
        let (from, to) = claim.number_range;
        let mut replace = claim.text.clone();
        replace.replace_range(from..to, &list.items.to_string());
        diags.push(
            Diagnostic::new(
                codes::COUNT_E001,
                &artifact.path,
                Some(claim.line),
                &[
                    ("claimed", claim.claimed.to_string()),
                    ("noun", claim.noun.clone()),
                    ("actual", list.items.to_string()),
                    ("list_line", list.start_line.to_string()),
                ],
            )
            .with_fix(Fix {
                path: artifact.path.clone(),
                line: claim.line,
                find: claim.text.clone(),
                replace,
            }),
        );
    }

    for list in &lists {
        if list.items >= LARGE_LIST && !claimed_lists.contains(&list.start_line) {
            diags.push(Diagnostic::new(
                codes::COUNT_W001,
                &artifact.path,
                Some(list.start_line),
                &[
                    ("actual", list.items.to_string()),
                    ("list_line", list.start_line.to_string()),
                ],
            ));
        }
    }
    diags
}

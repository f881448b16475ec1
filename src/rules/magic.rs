//! Hardcoded quantitative values that belong in the shared threshold registry.
//!
//! Each category is a regex whose first capture group is the reported value.
//! Categories are tried in order and a value already claimed by an earlier
//! category is not reported twice.

use super::RuleContext;
use crate::core::artifact::Artifact;
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::kinds::Format;
use regex::Regex;
use std::sync::LazyLock;

static CATEGORIES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "timeout",
            r"(?i)\btime-?\s?outs?\b[^.\n]{0,40}?\b(\d+(?:\.\d+)?\s?(?:ms|s|secs?|seconds?|mins?|minutes?|hours?))\b",
        ),
        (
            "retry",
            r"(?i)\b(\d+\s+(?:retries|retry attempts|attempts))\b",
        ),
        (
            "retry",
            r"(?i)\bretries\s*(?:of|:|=)\s*(\d+)\b",
        ),
        (
            "batch size",
            r"(?i)\bbatch(?:es)?\s+(?:size\s+)?(?:of\s+)?(\d[\d,]*)\b",
        ),
        (
            "batch size",
            r"(?i)\b(\d[\d,]*\s+(?:records|items|rows|messages|events)\s+per\s+batch)\b",
        ),
        (
            "rate limit",
            r"(?i)\b(\d[\d,]*\s?(?:requests?|req|calls?|messages?|events?)\s?(?:/|per\s)\s?(?:s|sec|second|min|minute|h|hour|day))\b",
        ),
        ("rate limit", r"(?i)\b(\d[\d,]*\s?(?:rps|qps|tps))\b"),
        ("availability", r"\b(\d{2}\.\d+\s?%)"),
        (
            "availability",
            r"(?i)\b(?:uptime|sla|availability)\b[^\n]{0,40}?\b(\d{1,3}(?:\.\d+)?\s?%)",
        ),
        ("monetary", r"(\$\s?\d[\d,]*(?:\.\d+)?(?:\s?[kKmMbB]\b)?)"),
        (
            "resource",
            r"\b(\d+(?:\.\d+)?\s?(?:KB|MB|GB|TB|KiB|MiB|GiB|TiB|vCPUs?|cores|CPUs?))\b",
        ),
        ("latency", r"\b(\d+(?:\.\d+)?\s?ms)\b"),
    ]
    .into_iter()
    .map(|(category, pattern)| (category, Regex::new(pattern).unwrap()))
    .collect()
});

/// YAML keys whose numeric values are thresholds, e.g. `timeout_ms: 3000`.
static YAML_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*-?\s*([a-z_]*(?:timeout|latency|retries|retry|batch|rate_limit|memory|cpu|budget|cost)[a-z_]*)\s*:\s*['\x22]?(\d[\d._]*)")
        .unwrap()
});

fn yaml_category(key: &str) -> &'static str {
    let key = key.to_ascii_lowercase();
    if key.contains("timeout") {
        "timeout"
    } else if key.contains("latency") {
        "latency"
    } else if key.contains("retr") {
        "retry"
    } else if key.contains("batch") {
        "batch size"
    } else if key.contains("rate") {
        "rate limit"
    } else if key.contains("memory") || key.contains("cpu") {
        "resource"
    } else {
        "monetary"
    }
}

fn is_comment(text: &str, format: Format) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with("<!--")
        || trimmed.starts_with("//")
        || (format != Format::Markdown && trimmed.starts_with('#'))
}

fn is_example(text: &str) -> bool {
    let lowered = text.trim_start().to_ascii_lowercase();
    let lowered = lowered.trim_start_matches(['-', '*', '>', ' ']);
    lowered.starts_with("example")
        || lowered.contains("e.g.")
        || lowered.contains("for example")
        || lowered.contains("example:")
}

pub fn check(artifact: &Artifact, ctx: &RuleContext) -> Vec<Diagnostic> {
    let markers = &ctx.config.magic.threshold_markers;
    let mut diags = Vec::new();
    for (idx, text) in artifact.text.lines().enumerate() {
        let line = idx + 1;
        if artifact.in_frontmatter(line) || artifact.structure.is_code(line) {
            continue;
        }
        if markers.iter().any(|m| text.contains(m.as_str()))
            || is_comment(text, artifact.format)
            || is_example(text)
        {
            continue;
        }

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut found: Vec<(&str, String)> = Vec::new();
        if artifact.format == Format::Yaml {
            if let Some(caps) = YAML_KEY_RE.captures(text) {
                if let Some(value) = caps.get(2) {
                    claimed.push((value.start(), value.end()));
                    found.push((yaml_category(&caps[1]), value.as_str().to_string()));
                }
            }
        }
        for (category, re) in CATEGORIES.iter() {
            for caps in re.captures_iter(text) {
                let Some(value) = caps.get(1) else { continue };
                let overlaps = claimed
                    .iter()
                    .any(|(s, e)| value.start() < *e && *s < value.end());
                if overlaps {
                    continue;
                }
                claimed.push((value.start(), value.end()));
                found.push((category, value.as_str().trim().to_string()));
            }
        }
        for (category, value) in found {
            diags.push(Diagnostic::new(
                codes::MAGIC_W001,
                &artifact.path,
                Some(line),
                &[("category", category.to_string()), ("value", value)],
            ));
        }
    }
    diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{codes, Fixture};

    fn values(diags: &[Diagnostic]) -> Vec<String> {
        diags.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn categories_are_detected() {
        let f = Fixture::new(&[(
            "SYS-01_perf.md",
            "---\ntitle: Perf\n---\n# SYS-01\n\nResponses return within 200ms.\nThe service keeps 99.95% uptime.\nRequests time out after 30 seconds.\nBudget is capped at $5,000 per month.\nEach pod gets 512 MB.\n",
        )]);
        let diags = f.run(check, "SYS-01_perf.md", false);
        assert_eq!(codes(&diags), vec!["MAGIC-W001"; 5]);
        let messages = values(&diags);
        assert!(messages[0].contains("latency value '200ms'"));
        assert!(messages[1].contains("availability value '99.95%'"));
        assert!(messages[2].contains("timeout value '30 seconds'"));
        assert!(messages[3].contains("monetary value '$5,000'"));
        assert!(messages[4].contains("resource value '512 MB'"));
    }

    #[test]
    fn threshold_comment_and_example_lines_are_skipped() {
        let f = Fixture::new(&[(
            "SYS-01_perf.md",
            "p95 under 200ms @threshold: PRD-01:perf.latency.p95\n<!-- 500ms budget -->\nFor example, 300ms.\nLimit is {{rate_limit}} or 100 rps.\n```\nsleep 400ms\n```\n",
        )]);
        assert!(f.run(check, "SYS-01_perf.md", false).is_empty());
    }

    #[test]
    fn timeout_wins_over_latency() {
        let f = Fixture::new(&[("SYS-01_perf.md", "Connection timeout is 250ms.\n")]);
        let diags = f.run(check, "SYS-01_perf.md", false);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("timeout value '250ms'"));
    }

    #[test]
    fn yaml_threshold_keys() {
        let f = Fixture::new(&[(
            "SPEC-07.yaml",
            "id: SPEC-07\n# retries: 9\nclient:\n  timeout_ms: 3000\n  max_retries: 3\n",
        )]);
        let diags = f.run(check, "SPEC-07.yaml", false);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].line, Some(4));
        assert!(diags[0].message.contains("timeout value '3000'"));
        assert!(diags[1].message.contains("retry value '3'"));
    }
}

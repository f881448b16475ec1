//! Quality-gate scoring.
//!
//! Each artifact is scored over five equally weighted gates. A gate passes
//! when none of the diagnostics mapped to it are present for the artifact.
//! Scores are reported alongside diagnostics; only `--min-score` turns a low
//! score into a finding.

use crate::core::catalog::{codes, Severity};
use crate::core::diagnostic::Diagnostic;
use crate::core::ids::ArtifactId;
use crate::core::kinds::ArtifactKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Metadata,
    SchemaFields,
    Structure,
    Traceability,
    Hygiene,
}

pub const GATES: &[(Gate, f64)] = &[
    (Gate::Metadata, 0.2),
    (Gate::SchemaFields, 0.2),
    (Gate::Structure, 0.2),
    (Gate::Traceability, 0.2),
    (Gate::Hygiene, 0.2),
];

impl Gate {
    pub fn label(self) -> &'static str {
        match self {
            Gate::Metadata => "metadata",
            Gate::SchemaFields => "schema fields",
            Gate::Structure => "structure",
            Gate::Traceability => "traceability",
            Gate::Hygiene => "hygiene",
        }
    }

    /// Hygiene fails on warnings too; every other gate only on errors.
    fn fails_on(self, severity: Severity) -> bool {
        match self {
            Gate::Hygiene => severity >= Severity::Warning,
            _ => severity == Severity::Error,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The gate a diagnostic code counts against, if any.
pub fn gate_of(code: &str) -> Option<Gate> {
    let (namespace, suffix) = code.split_once('-')?;
    if ArtifactKind::from_prefix(namespace).is_some() {
        return match suffix {
            "E002" | "E003" | "E004" | "W001" | "W002" => Some(Gate::SchemaFields),
            _ => Some(Gate::Structure),
        };
    }
    match namespace {
        "META" | "VAL" => Some(Gate::Metadata),
        "SEC" | "COUNT" | "DIAG" => Some(Gate::Structure),
        "TAG" | "FWDREF" | "TRACE" => Some(Gate::Traceability),
        "MAGIC" | "TERM" | "NUM" => Some(Gate::Hygiene),
        _ => None,
    }
}

/// `(rule, passed, weight) -> partial score`.
pub fn partial_score(passed: bool, weight: f64) -> f64 {
    if passed { weight } else { 0.0 }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResult {
    pub gate: Gate,
    pub passed: bool,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactScore {
    pub path: PathBuf,
    pub id: ArtifactId,
    pub score: f64,
    pub gates: Vec<GateResult>,
}

impl ArtifactScore {
    pub fn failed_gates(&self) -> Vec<Gate> {
        self.gates.iter().filter(|g| !g.passed).map(|g| g.gate).collect()
    }
}

pub fn score(path: &Path, id: ArtifactId, diagnostics: &[&Diagnostic]) -> ArtifactScore {
    let gates: Vec<GateResult> = GATES
        .iter()
        .map(|(gate, weight)| GateResult {
            gate: *gate,
            passed: !diagnostics
                .iter()
                .any(|d| gate_of(&d.code) == Some(*gate) && gate.fails_on(d.severity)),
            weight: *weight,
        })
        .collect();
    let total = gates.iter().map(|g| partial_score(g.passed, g.weight)).sum::<f64>();
    ArtifactScore {
        path: path.to_path_buf(),
        id,
        score: (total * 100.0).round() / 100.0,
        gates,
    }
}

/// Score every artifact against the diagnostics attached to its path.
pub fn score_all<'a>(
    artifacts: impl Iterator<Item = (&'a Path, ArtifactId)>,
    diagnostics: &[Diagnostic],
) -> Vec<ArtifactScore> {
    let mut by_path: BTreeMap<&Path, Vec<&Diagnostic>> = BTreeMap::new();
    for d in diagnostics {
        by_path.entry(d.path.as_path()).or_default().push(d);
    }
    let mut scores: Vec<ArtifactScore> = artifacts
        .map(|(path, id)| score(path, id, by_path.get(path).map(Vec::as_slice).unwrap_or(&[])))
        .collect();
    scores.sort_by(|a, b| a.path.cmp(&b.path));
    scores
}

/// `SCORE-E001` for every artifact below `min`.
pub fn below_threshold(scores: &[ArtifactScore], min: f64) -> Vec<Diagnostic> {
    scores
        .iter()
        .filter(|s| s.score + 1e-9 < min)
        .map(|s| {
            Diagnostic::new(
                codes::SCORE_E001,
                &s.path,
                None,
                &[
                    ("score", format!("{:.2}", s.score)),
                    ("min", format!("{:.2}", min)),
                ],
            )
        })
        .collect()
}

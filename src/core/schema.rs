//! Per-kind artifact schemas.
//!
//! A schema names the frontmatter fields and body sections an artifact kind
//! must (or should) carry, plus controlled vocabularies for selected fields.
//! Built-in defaults cover every non-root kind; a `<PREFIX>_SCHEMA.yaml` file
//! found in the tree replaces the built-in for its kind.

use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::frontmatter::scalar_to_string;
use crate::core::kinds::ArtifactKind;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct KindSchema {
    schema_version: Option<serde_yaml::Value>,
    pub required_fields: Vec<String>,
    pub recommended_fields: Vec<String>,
    pub required_sections: Vec<String>,
    pub recommended_sections: Vec<String>,
    /// Field name to allowed values (compared case-insensitively).
    pub vocabularies: BTreeMap<String, Vec<String>>,
    /// Overrides applied to the YAML form of the kind.
    pub yaml: Option<Box<KindSchema>>,
}

impl KindSchema {
    pub fn version(&self) -> Option<String> {
        self.schema_version.as_ref().and_then(scalar_to_string)
    }

    /// The schema that applies to a YAML-format artifact of this kind.
    pub fn for_yaml(&self) -> &KindSchema {
        self.yaml.as_deref().unwrap_or(self)
    }

    pub fn allows(&self, field: &str, value: &str) -> Option<bool> {
        let allowed = self.vocabularies.get(field)?;
        Some(
            allowed
                .iter()
                .any(|a| a.eq_ignore_ascii_case(value.trim())),
        )
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn vocab(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(field, values)| (field.to_string(), strings(values)))
        .collect()
}

const DOC_STATUS: &[&str] = &["Draft", "In Review", "Approved", "Deprecated", "Superseded"];

fn builtin(kind: ArtifactKind) -> Option<KindSchema> {
    use ArtifactKind::*;
    let schema = match kind {
        BusinessRequirements => return None,
        ProductRequirements => KindSchema {
            recommended_fields: strings(&["status"]),
            required_sections: strings(&["Functional Requirements"]),
            recommended_sections: strings(&["Executive Summary"]),
            vocabularies: vocab(&[("status", DOC_STATUS)]),
            ..KindSchema::default()
        },
        EngineeringRequirements => KindSchema {
            recommended_fields: strings(&["status"]),
            required_sections: strings(&["Requirements"]),
            vocabularies: vocab(&[("status", DOC_STATUS)]),
            ..KindSchema::default()
        },
        BehaviorSpec => KindSchema {
            required_sections: strings(&["Feature", "Scenario"]),
            ..KindSchema::default()
        },
        ArchitectureDecision => KindSchema {
            required_fields: strings(&["status"]),
            required_sections: strings(&["Context", "Decision", "Consequences"]),
            recommended_sections: strings(&["Alternatives"]),
            vocabularies: vocab(&[(
                "status",
                &["Proposed", "Accepted", "Deprecated", "Superseded", "Rejected"],
            )]),
            ..KindSchema::default()
        },
        SystemRequirements => KindSchema {
            recommended_fields: strings(&["status"]),
            required_sections: strings(&["Requirements"]),
            recommended_sections: strings(&["Quality Attributes"]),
            vocabularies: vocab(&[("status", DOC_STATUS)]),
            ..KindSchema::default()
        },
        AtomicRequirements => KindSchema {
            required_fields: strings(&["priority"]),
            recommended_fields: strings(&["status", "category"]),
            required_sections: strings(&["Description", "Acceptance Criteria"]),
            vocabularies: vocab(&[
                ("priority", &["Critical", "High", "Medium", "Low"]),
                (
                    "category",
                    &[
                        "Functional",
                        "Security",
                        "Performance",
                        "Reliability",
                        "Usability",
                        "Compliance",
                        "Operational",
                        "Data",
                    ],
                ),
                ("status", DOC_STATUS),
            ]),
            ..KindSchema::default()
        },
        ImplementationSpec => KindSchema {
            recommended_sections: strings(&["Scope", "Deliverables"]),
            ..KindSchema::default()
        },
        Contract => KindSchema {
            recommended_sections: strings(&["Interface", "Error Handling"]),
            yaml: Some(Box::new(KindSchema {
                required_fields: strings(&["version"]),
                ..KindSchema::default()
            })),
            ..KindSchema::default()
        },
        TechnicalSpec => KindSchema {
            recommended_sections: strings(&["Overview"]),
            yaml: Some(Box::new(KindSchema {
                required_fields: strings(&["id", "version"]),
                vocabularies: vocab(&[(
                    "infrastructure_type",
                    &["serverless", "container", "kubernetes", "vm", "managed-service", "hybrid"],
                )]),
                ..KindSchema::default()
            })),
            ..KindSchema::default()
        },
        Tasks => KindSchema {
            recommended_sections: strings(&["Tasks"]),
            ..KindSchema::default()
        },
        Plan => KindSchema {
            recommended_sections: strings(&["Objective"]),
            ..KindSchema::default()
        },
        TestSpecUnit | TestSpecIntegration | TestSpecSmoke | TestSpecFunctional
        | TestSpecPerformance => KindSchema {
            recommended_fields: strings(&["status"]),
            required_sections: strings(&["Test Cases"]),
            vocabularies: vocab(&[("status", DOC_STATUS)]),
            ..KindSchema::default()
        },
    };
    Some(schema)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSchema {
    /// `None` for built-in schemas.
    pub path: Option<PathBuf>,
    pub schema: KindSchema,
}

/// The schema for every kind in scope of a run.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: BTreeMap<ArtifactKind, LoadedSchema>,
}

impl SchemaSet {
    pub fn builtin() -> Self {
        let schemas = ArtifactKind::all()
            .filter_map(|kind| {
                builtin(kind).map(|schema| (kind, LoadedSchema { path: None, schema }))
            })
            .collect();
        Self { schemas }
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&LoadedSchema> {
        self.schemas.get(&kind)
    }

    /// Schema files found on disk, by kind.
    pub fn files(&self) -> impl Iterator<Item = (ArtifactKind, &Path, &KindSchema)> {
        self.schemas
            .iter()
            .filter_map(|(kind, s)| s.path.as_deref().map(|p| (*kind, p, &s.schema)))
    }

    pub fn has_files(&self) -> bool {
        self.files().next().is_some()
    }

    /// Overlay schema files onto the set. Files that fail to parse keep the
    /// previous schema for their kind and yield `VAL-E004`.
    pub fn load_files(&mut self, files: &[(ArtifactKind, PathBuf)]) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (kind, path) in files {
            let parsed = fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|raw| parse_schema(&raw));
            match parsed {
                Ok(schema) => {
                    debug!(kind = kind.prefix(), path = %path.display(), "loaded schema file");
                    self.schemas.insert(
                        *kind,
                        LoadedSchema {
                            path: Some(path.clone()),
                            schema,
                        },
                    );
                }
                Err(reason) => diagnostics.push(Diagnostic::new(
                    codes::VAL_E004,
                    path,
                    None,
                    &[("kind", kind.prefix().to_string()), ("reason", reason)],
                )),
            }
        }
        diagnostics
    }
}

pub fn parse_schema(raw: &str) -> Result<KindSchema, String> {
    if raw.trim().is_empty() {
        return Err("schema file is empty".to_string());
    }
    serde_yaml::from_str::<KindSchema>(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtins_skip_the_root_kind() {
        let set = SchemaSet::builtin();
        assert!(set.get(ArtifactKind::BusinessRequirements).is_none());
        let adr = set.get(ArtifactKind::ArchitectureDecision).expect("adr schema");
        assert_eq!(adr.schema.allows("status", "accepted"), Some(true));
        assert_eq!(adr.schema.allows("status", "maybe"), Some(false));
        assert_eq!(adr.schema.allows("priority", "x"), None);
        assert!(!set.has_files());
    }

    #[test]
    fn yaml_overrides_apply_to_yaml_form() {
        let set = SchemaSet::builtin();
        let spec = &set.get(ArtifactKind::TechnicalSpec).expect("spec").schema;
        assert_eq!(spec.for_yaml().required_fields, vec!["id", "version"]);
        let req = &set.get(ArtifactKind::AtomicRequirements).expect("req").schema;
        assert_eq!(req.for_yaml(), req);
    }

    #[test]
    fn schema_files_override_and_report_errors() {
        let tmp = TempDir::new().expect("tmpdir");
        let good = tmp.path().join("ADR_SCHEMA.yaml");
        fs::write(
            &good,
            "schema_version: 1.1\nrequired_fields: [status, deciders]\n",
        )
        .expect("write");
        let bad = tmp.path().join("REQ_SCHEMA.yaml");
        fs::write(&bad, "required_fields: [unclosed\n").expect("write");

        let mut set = SchemaSet::builtin();
        let diags = set.load_files(&[
            (ArtifactKind::ArchitectureDecision, good.clone()),
            (ArtifactKind::AtomicRequirements, bad),
        ]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "VAL-E004");

        let adr = set.get(ArtifactKind::ArchitectureDecision).expect("adr");
        assert_eq!(adr.path.as_deref(), Some(good.as_path()));
        assert_eq!(adr.schema.version().as_deref(), Some("1.1"));
        assert_eq!(adr.schema.required_fields, vec!["status", "deciders"]);
        assert!(set.get(ArtifactKind::AtomicRequirements).expect("req").path.is_none());
        assert_eq!(set.files().count(), 1);
    }
}

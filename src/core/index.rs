//! Cross-artifact index, built once per run and read-only afterwards.

use crate::core::artifact::{Artifact, TagValue};
use crate::core::ids::{ArtifactId, Classification};
use crate::core::kinds::{ArtifactKind, Format};
use crate::core::loader::{Discovered, IndexDoc};
use crate::core::schema::SchemaSet;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefVia {
    Tag,
    Mention,
}

/// A directed reference from one artifact to another id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Reference {
    pub source: ArtifactId,
    pub target: ArtifactId,
    pub path: PathBuf,
    pub line: usize,
    pub via: RefVia,
}

/// Every reference an artifact makes: tag references first, then plain-text
/// mentions on lines that do not already carry a tag reference to the same
/// document.
pub fn references_of(artifact: &Artifact) -> Vec<Reference> {
    let mut out = Vec::new();
    let mut tagged: BTreeSet<(usize, ArtifactId)> = BTreeSet::new();
    for tag in &artifact.tags {
        for value in &tag.values {
            if let TagValue::Ref(r) = value {
                tagged.insert((tag.line, r.target.as_document()));
                out.push(Reference {
                    source: artifact.id,
                    target: r.target,
                    path: artifact.path.clone(),
                    line: tag.line,
                    via: RefVia::Tag,
                });
            }
        }
    }
    for (line, mention) in &artifact.mentions {
        if tagged.contains(&(*line, mention.id.as_document())) {
            continue;
        }
        out.push(Reference {
            source: artifact.id,
            target: mention.id,
            path: artifact.path.clone(),
            line: *line,
            via: RefVia::Mention,
        });
    }
    out
}

/// Section files of one split document in one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionInventory {
    pub index_path: Option<PathBuf>,
    /// `total_sections` from the index record, when it was loaded.
    pub declared_total: Option<u64>,
    /// Non-zero section numbers found, ascending.
    pub actual_sections: Vec<u32>,
    /// Section numbers missing between 1 and the highest present.
    pub gaps: Vec<u32>,
    /// Lowest-numbered section file, for reporting whole-document findings once.
    pub first_section_path: Option<PathBuf>,
}

impl SectionInventory {
    pub fn actual(&self) -> usize {
        self.actual_sections.len()
    }
}

/// A template file in scope, with the version it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub format: Format,
    pub schema_version: Option<String>,
}

/// Directory listing entry used for sibling-aware checks (sections, gaps).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Listed {
    path: PathBuf,
    id: ArtifactId,
}

#[derive(Debug, Default)]
pub struct ProjectIndex {
    records: Vec<Artifact>,
    by_id: BTreeMap<ArtifactId, Vec<usize>>,
    by_doc: BTreeMap<ArtifactId, Vec<usize>>,
    refs_out: BTreeMap<ArtifactId, BTreeSet<Reference>>,
    refs_in: BTreeMap<ArtifactId, BTreeSet<Reference>>,
    by_layer: BTreeMap<u8, Vec<usize>>,
    listing: BTreeMap<PathBuf, Vec<Listed>>,
    index_docs: Vec<IndexDoc>,
    templates: Vec<TemplateFile>,
    schemas: SchemaSet,
}

impl ProjectIndex {
    /// One pass over the loaded records. `listing` is every classified file
    /// seen on disk (including siblings of a single-file target); it backs
    /// the section and sequence inventories.
    pub fn build(
        records: Vec<Artifact>,
        listing: &[Discovered],
        index_docs: Vec<IndexDoc>,
        templates: Vec<TemplateFile>,
        schemas: SchemaSet,
    ) -> Self {
        let mut index = ProjectIndex {
            index_docs,
            templates,
            schemas,
            ..ProjectIndex::default()
        };

        for (pos, record) in records.iter().enumerate() {
            if record.is_template {
                continue;
            }
            index.by_id.entry(record.id).or_default().push(pos);
            index
                .by_doc
                .entry(record.id.as_document())
                .or_default()
                .push(pos);
            index.by_layer.entry(record.layer()).or_default().push(pos);
            for reference in references_of(record) {
                index
                    .refs_in
                    .entry(reference.target.as_document())
                    .or_default()
                    .insert(reference.clone());
                index
                    .refs_out
                    .entry(reference.source)
                    .or_default()
                    .insert(reference);
            }
        }

        for entry in listing {
            if let Classification::Artifact { id, .. } = &entry.class {
                let dir = parent_of(&entry.path);
                index.listing.entry(dir).or_default().push(Listed {
                    path: entry.path.clone(),
                    id: *id,
                });
            }
        }
        for listed in index.listing.values_mut() {
            listed.sort_by(|a, b| a.path.cmp(&b.path));
            listed.dedup();
        }

        index.records = records;
        index
    }

    pub fn records(&self) -> &[Artifact] {
        &self.records
    }

    /// Records that rules evaluate. Search-dir records only resolve references.
    pub fn validated(&self) -> impl Iterator<Item = &Artifact> {
        self.records.iter().filter(|r| !r.external)
    }

    /// Document-level existence: `REQ-07.03.02` exists when any `REQ-07` file does.
    pub fn exists(&self, id: &ArtifactId) -> bool {
        self.by_doc.contains_key(&id.as_document())
    }

    pub fn get(&self, id: &ArtifactId) -> Vec<&Artifact> {
        self.by_id
            .get(id)
            .map(|positions| positions.iter().map(|p| &self.records[*p]).collect())
            .unwrap_or_default()
    }

    pub fn layer_of(&self, id: &ArtifactId) -> u8 {
        id.layer()
    }

    pub fn references_out(&self, id: &ArtifactId) -> Vec<&Reference> {
        self.refs_out
            .get(id)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    pub fn references_in(&self, id: &ArtifactId) -> Vec<&Reference> {
        self.refs_in
            .get(&id.as_document())
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    pub fn artifacts_of_kind(&self, kind: ArtifactKind) -> Vec<&Artifact> {
        let layer = kind.layer();
        self.by_layer
            .get(&layer)
            .map(|positions| {
                positions
                    .iter()
                    .map(|p| &self.records[*p])
                    .filter(|r| r.kind() == kind)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn artifacts_in_layer(&self, layer: u8) -> Vec<&Artifact> {
        self.by_layer
            .get(&layer)
            .map(|positions| positions.iter().map(|p| &self.records[*p]).collect())
            .unwrap_or_default()
    }

    /// Identity groups with more than one record, for duplicate detection.
    /// Identity is `(id, format)`: one contract written as both Markdown and
    /// YAML is a single artifact.
    pub fn identity_groups(&self) -> Vec<(ArtifactId, Vec<&Artifact>)> {
        let mut groups: BTreeMap<(ArtifactId, Format), Vec<&Artifact>> = BTreeMap::new();
        for positions in self.by_id.values() {
            for record in positions.iter().map(|p| &self.records[*p]) {
                if !record.external {
                    groups.entry((record.id, record.format)).or_default().push(record);
                }
            }
        }
        groups
            .into_iter()
            .filter(|(_, records)| records.len() > 1)
            .map(|((id, _), mut records)| {
                records.sort_by(|a, b| a.path.cmp(&b.path));
                (id, records)
            })
            .collect()
    }

    pub fn section_inventory(&self, dir: &Path, doc: &ArtifactId) -> SectionInventory {
        let doc = doc.as_document();
        let mut inventory = SectionInventory::default();
        let Some(listed) = self.listing.get(dir) else {
            return inventory;
        };
        let mut sections = BTreeSet::new();
        for entry in listed.iter().filter(|e| e.id.as_document() == doc) {
            match entry.id.section {
                Some(0) => {
                    if inventory.index_path.is_none() {
                        inventory.index_path = Some(entry.path.clone());
                    }
                }
                Some(n) => {
                    if sections.insert(n) && sections.first() == Some(&n) {
                        inventory.first_section_path = Some(entry.path.clone());
                    }
                }
                None => {}
            }
        }
        if let Some(index_path) = &inventory.index_path {
            inventory.declared_total = self
                .records
                .iter()
                .find(|r| &r.path == index_path)
                .and_then(|r| r.frontmatter.as_ref())
                .and_then(|fm| fm.get_u64("total_sections"));
        }
        if let Some(max) = sections.last().copied() {
            inventory.gaps = (1..max).filter(|n| !sections.contains(n)).collect();
        }
        inventory.actual_sections = sections.into_iter().collect();
        inventory
    }

    /// Document numbers of `kind` listed in `dir`, with the first path seen
    /// for each, ascending.
    pub fn sequence(&self, dir: &Path, kind: ArtifactKind) -> BTreeMap<u32, PathBuf> {
        let mut out = BTreeMap::new();
        if let Some(listed) = self.listing.get(dir) {
            for entry in listed.iter().filter(|e| e.id.kind == kind) {
                out.entry(entry.id.doc).or_insert_with(|| entry.path.clone());
            }
        }
        out
    }

    pub fn index_docs(&self) -> &[IndexDoc] {
        &self.index_docs
    }

    pub fn templates(&self) -> &[TemplateFile] {
        &self.templates
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }
}

pub fn parent_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

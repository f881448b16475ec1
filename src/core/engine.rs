//! Orchestrator: discover, load, index, evaluate, fix, score.
//!
//! A run is a pure function of the files under the target (plus search dirs
//! and schema files) until `auto_fix` is set, when the applicator rewrites
//! the lines rules proposed. Diagnostics are normalized before they leave
//! the engine, so the order never depends on worker scheduling.

use crate::core::artifact::Artifact;
use crate::core::catalog::{self, codes};
use crate::core::config::Config;
use crate::core::diagnostic::{self, Diagnostic, Fix};
use crate::core::error::SddError;
use crate::core::fixer::{self, FixStatus};
use crate::core::ids::{self, Classification};
use crate::core::index::{ProjectIndex, TemplateFile};
use crate::core::kinds::ArtifactKind;
use crate::core::loader::{self, Discovered, IndexDoc, Loaded};
use crate::core::schema::SchemaSet;
use crate::core::scoring::{self, ArtifactScore};
use crate::rules::{self, Check, RuleContext, RuleFamily, RuleScope};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// File or directory to analyze.
    pub target: PathBuf,
    /// Project root; schema files are collected beneath it.
    pub root: PathBuf,
    /// Empty runs every family.
    pub families: Vec<RuleFamily>,
    pub strict: bool,
    pub auto_fix: bool,
    pub check_templates: bool,
    /// Extra roots whose artifacts resolve references but are not validated.
    pub search_dirs: Vec<PathBuf>,
    pub min_score: Option<f64>,
}

/// Cooperative cancellation, checked between rule invocations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), SddError> {
        if self.is_cancelled() {
            Err(SddError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub scores: Vec<ArtifactScore>,
    /// Records evaluated by rules (search-dir records excluded).
    pub files_checked: usize,
    pub fixes_applied: usize,
    pub exit_code: i32,
}

/// What discovery found in the target scope.
#[derive(Debug, Default)]
struct Scope {
    single_file: bool,
    artifacts: Vec<Discovered>,
    templates: Vec<Discovered>,
    index_files: Vec<Discovered>,
    /// Every classified file, backing sibling-aware inventories.
    listing: Vec<Discovered>,
    diagnostics: Vec<Diagnostic>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A bare file name gets an explicit `./` so its parent is a real directory.
/// Directories are kept as typed.
fn normalize_target(target: &Path) -> PathBuf {
    match target.parent() {
        Some(parent)
            if parent.as_os_str().is_empty()
                && !target.is_dir()
                && matches!(target.components().next(), Some(Component::Normal(_))) =>
        {
            Path::new(".").join(target)
        }
        _ => target.to_path_buf(),
    }
}

fn discover_scope(target: &Path) -> Result<Scope, SddError> {
    if !target.exists() {
        return Err(SddError::TargetNotFound(target.to_path_buf()));
    }
    let mut scope = Scope::default();

    if target.is_file() {
        scope.single_file = true;
        let parent = target.parent().unwrap_or_else(|| Path::new("/"));
        scope.listing = loader::discover_all(parent, Some(1)).collect();
        let class = ids::classify(target);
        let entry = || Discovered {
            path: target.to_path_buf(),
            class: class.clone(),
        };
        match class {
            Classification::Artifact { .. } => scope.artifacts.push(entry()),
            Classification::Template { .. } => scope.templates.push(entry()),
            Classification::Index { .. } | Classification::Schema { .. } => {
                debug!(path = %target.display(), "explicit target is not an artifact");
            }
            Classification::NotArtifact => scope.diagnostics.push(Diagnostic::new(
                codes::VAL_E003,
                target,
                None,
                &[("name", file_name(target))],
            )),
        }
        return Ok(scope);
    }

    scope.listing = loader::discover_all(target, None).collect();
    for entry in &scope.listing {
        match entry.class {
            Classification::Artifact { .. } => scope.artifacts.push(entry.clone()),
            Classification::Template { .. } => scope.templates.push(entry.clone()),
            Classification::Index { .. } => scope.index_files.push(entry.clone()),
            Classification::Schema { .. } | Classification::NotArtifact => {}
        }
    }
    Ok(scope)
}

/// Schema files beneath the target directory, the project root and the
/// search dirs, deduplicated by path.
fn schema_files(options: &RunOptions, single_file: bool) -> Vec<(ArtifactKind, PathBuf)> {
    let mut roots = vec![options.root.clone()];
    if !single_file {
        roots.push(options.target.clone());
    }
    roots.extend(options.search_dirs.iter().cloned());

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for root in roots.iter().filter(|r| r.is_dir()) {
        for entry in loader::discover_all(root, None) {
            if let Classification::Schema { kind } = entry.class {
                if seen.insert(entry.path.clone()) {
                    out.push((kind, entry.path));
                }
            }
        }
    }
    out
}

fn load_all(entries: &[Discovered], external: bool) -> Vec<Loaded> {
    entries
        .par_iter()
        .map(|d| loader::load(&d.path, &d.class, external))
        .collect()
}

/// Records from the search dirs. Files already in the target scope are skipped.
fn load_external(search_dirs: &[PathBuf], in_scope: &BTreeSet<PathBuf>) -> Vec<Artifact> {
    let mut entries = Vec::new();
    let mut seen = BTreeSet::new();
    for dir in search_dirs {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "search dir does not exist");
            continue;
        }
        for entry in loader::discover_all(dir, None) {
            if matches!(entry.class, Classification::Artifact { .. })
                && !in_scope.contains(&entry.path)
                && seen.insert(entry.path.clone())
            {
                entries.push(entry);
            }
        }
    }
    load_all(&entries, true)
        .into_iter()
        .filter_map(|loaded| loaded.artifact)
        .collect()
}

fn load_index_docs(entries: &[Discovered], diagnostics: &mut Vec<Diagnostic>) -> Vec<IndexDoc> {
    let mut docs = Vec::new();
    for entry in entries {
        if let Classification::Index { kind, format } = entry.class {
            match loader::load_index(&entry.path, kind, format) {
                Ok(doc) => docs.push(doc),
                Err(diag) => diagnostics.push(diag),
            }
        }
    }
    docs
}

/// Evaluate the selected rules. Cross rules only run for directory targets.
fn evaluate(
    index: &ProjectIndex,
    ctx: &RuleContext,
    families: &[RuleFamily],
    single_file: bool,
    cancel: &CancelToken,
) -> Result<Vec<Diagnostic>, SddError> {
    let selected: Vec<_> = rules::select(families)
        .into_iter()
        .filter(|r| r.scope == RuleScope::Local || !single_file)
        .collect();
    debug!(rules = selected.len(), single_file, "rules selected");

    let records: Vec<&Artifact> = index.validated().collect();
    let per_record: Vec<Vec<Diagnostic>> = records
        .par_iter()
        .map(|record| {
            let mut out = Vec::new();
            for rule in &selected {
                let Check::PerArtifact(check) = rule.check else {
                    continue;
                };
                cancel.check()?;
                if rule.applies(record.kind()) {
                    out.extend(check(record, ctx));
                }
            }
            Ok(out)
        })
        .collect::<Result<_, SddError>>()?;

    let mut diagnostics: Vec<Diagnostic> = per_record.into_iter().flatten().collect();
    for rule in &selected {
        if let Check::Project(check) = rule.check {
            cancel.check()?;
            let found = check(ctx);
            debug!(rule = rule.name, findings = found.len(), "project rule done");
            diagnostics.extend(found);
        }
    }
    Ok(diagnostics)
}

/// The informational record left behind once a diagnostic's fix landed.
fn demote(diag: &Diagnostic) -> Option<Diagnostic> {
    let fixed = catalog::get(&diag.code)?.fixed_code?;
    Some(Diagnostic::new(
        fixed,
        &diag.path,
        diag.line,
        &[("detail", diag.message.clone())],
    ))
}

/// Apply every proposed fix and demote the diagnostics whose fix landed (or
/// had already landed). Returns the number of lines actually rewritten.
fn apply_fixes(diagnostics: &mut [Diagnostic]) -> Result<usize, SddError> {
    let (owners, fixes): (Vec<usize>, Vec<Fix>) = diagnostics
        .iter()
        .enumerate()
        .filter_map(|(pos, d)| d.fix.clone().map(|f| (pos, f)))
        .unzip();
    if fixes.is_empty() {
        return Ok(0);
    }
    let statuses = fixer::apply(&fixes)?;
    let mut applied = 0;
    for (pos, status) in owners.into_iter().zip(statuses) {
        if status == FixStatus::Stale {
            continue;
        }
        if status == FixStatus::Applied {
            applied += 1;
        }
        if let Some(fixed) = demote(&diagnostics[pos]) {
            diagnostics[pos] = fixed;
        }
    }
    Ok(applied)
}

pub fn run(options: &RunOptions, config: &Config, cancel: &CancelToken) -> Result<RunOutcome, SddError> {
    let target = normalize_target(&options.target);
    let scope = discover_scope(&target)?;
    info!(
        target = %target.display(),
        artifacts = scope.artifacts.len(),
        templates = scope.templates.len(),
        single_file = scope.single_file,
        "discovered"
    );
    let mut diagnostics = scope.diagnostics;

    let mut records = Vec::new();
    for loaded in load_all(&scope.artifacts, false) {
        diagnostics.extend(loaded.diagnostics);
        records.extend(loaded.artifact);
    }

    // Templates are always read for their declared version; they are only
    // validated on request.
    let mut templates = Vec::new();
    for loaded in load_all(&scope.templates, false) {
        let Some(template) = loaded.artifact else {
            if options.check_templates {
                diagnostics.extend(loaded.diagnostics);
            }
            continue;
        };
        templates.push(TemplateFile {
            path: template.path.clone(),
            kind: template.kind(),
            format: template.format,
            schema_version: template.schema_version.clone(),
        });
        if options.check_templates {
            diagnostics.extend(loaded.diagnostics);
            records.push(template);
        }
    }
    cancel.check()?;

    let mut schemas = SchemaSet::builtin();
    diagnostics.extend(schemas.load_files(&schema_files(options, scope.single_file)));

    let in_scope: BTreeSet<PathBuf> = records.iter().map(|r| r.path.clone()).collect();
    let external = load_external(&options.search_dirs, &in_scope);
    debug!(records = records.len(), external = external.len(), "loaded");
    records.extend(external);

    let index_docs = if scope.single_file {
        Vec::new()
    } else {
        load_index_docs(&scope.index_files, &mut diagnostics)
    };
    let index = ProjectIndex::build(records, &scope.listing, index_docs, templates, schemas);
    let files_checked = index.validated().count();
    info!(files = files_checked, "index built");

    let ctx = RuleContext {
        index: &index,
        config,
        strict: options.strict,
    };
    diagnostics.extend(evaluate(
        &index,
        &ctx,
        &options.families,
        scope.single_file,
        cancel,
    )?);
    cancel.check()?;
    let mut diagnostics = diagnostic::normalize(diagnostics);

    let fixes_applied = if options.auto_fix {
        let applied = apply_fixes(&mut diagnostics)?;
        info!(applied, "auto-fix done");
        applied
    } else {
        0
    };

    let scores = scoring::score_all(
        index
            .validated()
            .filter(|r| !r.is_template)
            .map(|r| (r.path.as_path(), r.id)),
        &diagnostics,
    );
    if let Some(min) = options.min_score {
        diagnostics.extend(scoring::below_threshold(&scores, min));
    }

    let diagnostics = diagnostic::normalize(diagnostics);
    let exit_code = catalog::exit_code(&diagnostics, options.strict);
    info!(diagnostics = diagnostics.len(), exit_code, "run complete");
    Ok(RunOutcome {
        diagnostics,
        scores,
        files_checked,
        fixes_applied,
        exit_code,
    })
}

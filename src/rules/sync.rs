use super::RuleContext;
use crate::core::catalog::codes;
use crate::core::diagnostic::Diagnostic;
use crate::core::index::TemplateFile;

/// Version sentinel for templates of kinds that have no schema.
pub const NO_SCHEMA_VERSION: &str = "n/a";

fn file_name(template: &TemplateFile) -> String {
    template
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| template.path.display().to_string())
}

/// Every template's `schema_version` must equal its kind's schema file.
/// Only runs when the tree carries schema files at all.
pub fn check(ctx: &RuleContext) -> Vec<Diagnostic> {
    let schemas = ctx.index.schemas();
    if !schemas.has_files() {
        return Vec::new();
    }
    let mut diags = Vec::new();
    for template in ctx.index.templates() {
        let name = file_name(template);
        let kind = template.kind;

        if kind.is_root() {
            match template.schema_version.as_deref() {
                None => diags.push(Diagnostic::new(
                    codes::SYNC_E002,
                    &template.path,
                    None,
                    &[("template", name)],
                )),
                Some(v) if !v.trim().eq_ignore_ascii_case(NO_SCHEMA_VERSION) => {
                    diags.push(Diagnostic::new(
                        codes::SYNC_E003,
                        &template.path,
                        None,
                        &[
                            ("kind", kind.prefix().to_string()),
                            ("template", name),
                            ("template_version", v.to_string()),
                        ],
                    ))
                }
                Some(_) => {}
            }
            continue;
        }

        let Some((_, schema_path, schema)) = schemas.files().find(|(k, _, _)| *k == kind) else {
            diags.push(Diagnostic::new(
                codes::SYNC_W001,
                &template.path,
                None,
                &[("template", name), ("kind", kind.prefix().to_string())],
            ));
            continue;
        };
        let Some(template_version) = template.schema_version.as_deref() else {
            diags.push(Diagnostic::new(
                codes::SYNC_E002,
                &template.path,
                None,
                &[("template", name)],
            ));
            continue;
        };
        let schema_version = schema.version();
        if schema_version.as_deref().map(str::trim) != Some(template_version.trim()) {
            let schema_name = schema_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            diags.push(Diagnostic::new(
                codes::SYNC_E001,
                &template.path,
                None,
                &[
                    ("template", name),
                    ("template_version", template_version.to_string()),
                    ("schema", schema_name),
                    ("schema_version", schema_version.unwrap_or_else(|| "(none)".to_string())),
                ],
            ));
        }
    }
    diags
}

//! sddlint: a multi-layer artifact validation engine.
//!
//! An SDD documentation tree is a stack of artifact kinds (business
//! requirements at the top, down through product and engineering
//! requirements, architecture decisions, contracts, specs, tasks and
//! plans). Each kind sits on a numbered layer, and references are expected
//! to flow from lower layers to higher ones. sddlint loads every artifact
//! once, builds a read-only cross-artifact index, evaluates a flat library
//! of rules over it, and reports diagnostics with stable codes.
//!
//! # Examples
//!
//! ```bash
//! # Every rule family over a tree
//! sddlint all docs/
//!
//! # One family, one file
//! sddlint sections docs/02_PRD/PRD-001.0_index.md
//!
//! # Fix what can be fixed, then fail on warnings too
//! sddlint all docs/ --auto-fix --strict
//!
//! # What does a code mean?
//! sddlint explain COUNT-E001
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: catalog, artifact model and loader, index, engine, reporters
//! - [`rules`]: one module per rule family
//!
//! Exit codes: 0 clean, 1 warnings only, 2 errors (or warnings under
//! `--strict`, or an operational failure).

pub mod core;
pub mod rules;

mod cli;

use crate::cli::{Cli, Command, CommonArgs};
use crate::core::catalog;
use crate::core::config::{self, Config};
use crate::core::engine::{self, CancelToken, RunOptions};
use crate::core::error::SddError;
use crate::core::report::{self, ReportFormat};
use crate::rules::RuleFamily;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`debug`, `sddlint=trace`, ...).
pub const LOG_ENV: &str = "SDDLINT_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parse the command line, run it, and return the process exit code.
pub fn run() -> Result<i32, SddError> {
    init_tracing();
    let cli = Cli::parse();

    if let Some((families, args)) = cli.command.selection() {
        return validate(families, args);
    }
    match cli.command {
        Command::Codes { format } => list_codes(&format),
        Command::Explain { code } => explain(&code),
        _ => Ok(0),
    }
}

/// Merge flags over `.sddlint.toml`; flags win, search dirs accumulate.
fn run_options(
    families: Vec<RuleFamily>,
    args: &CommonArgs,
    root: PathBuf,
    config: &Config,
) -> RunOptions {
    let mut search_dirs = args.search_dirs.clone();
    search_dirs.extend(config.search_dirs(&root));
    RunOptions {
        target: args.path.clone(),
        root,
        families,
        strict: args.strict || config.validate.strict,
        auto_fix: args.auto_fix,
        check_templates: args.check_templates || config.validate.check_templates,
        search_dirs,
        min_score: args.min_score.or(config.validate.min_score),
    }
}

fn validate(families: Vec<RuleFamily>, args: &CommonArgs) -> Result<i32, SddError> {
    let root = config::find_project_root(&args.path);
    let config = config::load_config(&root)?;
    let options = run_options(families, args, root, &config);
    tracing::debug!(root = %options.root.display(), "project root");

    let outcome = engine::run(&options, &config, &CancelToken::new())?;
    let color = args.report == ReportFormat::Text
        && !args.no_color
        && std::io::stdout().is_terminal();
    print!("{}", report::render(&outcome, args.report, color)?);
    Ok(outcome.exit_code)
}

fn list_codes(format: &str) -> Result<i32, SddError> {
    let defs = catalog::all_codes();
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&defs)?);
        return Ok(0);
    }
    for def in defs {
        println!("{:<12} {:<8} {}", def.code, def.severity.word(), def.title);
    }
    Ok(0)
}

fn explain(code: &str) -> Result<i32, SddError> {
    let code = code.trim().to_ascii_uppercase();
    let def = catalog::get(&code).ok_or_else(|| SddError::UnknownCode(code.clone()))?;
    println!("{} ({}): {}", def.code, def.severity.word(), def.title);
    println!("  message: {}", def.template);
    if let Some(hint) = def.hint {
        println!("  hint: {}", hint);
    }
    if let Some(fixed) = def.fixed_code {
        println!("  auto-fix: reported as {} once applied", fixed);
    }
    Ok(0)
}

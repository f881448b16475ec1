//! CLI struct definitions for the sddlint command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use crate::core::report::ReportFormat;
use crate::rules::RuleFamily;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "sddlint",
    version = env!("CARGO_PKG_VERSION"),
    about = "Validate layered SDD documentation trees: schemas, traceability, forward references and prose consistency."
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

/// Options shared by every validation verb.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct CommonArgs {
    /// File or directory to analyze.
    #[clap(default_value = ".")]
    pub path: PathBuf,
    /// Treat warnings as errors for the exit code.
    #[clap(long)]
    pub strict: bool,
    /// Apply in-place fixes for rules that propose one.
    #[clap(long)]
    pub auto_fix: bool,
    /// Output format.
    #[clap(long, value_enum, default_value = "text")]
    pub report: ReportFormat,
    /// Additional root for resolving cross-artifact references (repeatable).
    #[clap(long = "search-dir", value_name = "DIR")]
    pub search_dirs: Vec<PathBuf>,
    /// Report artifacts whose quality score falls below this threshold.
    #[clap(long, value_name = "N")]
    pub min_score: Option<f64>,
    /// Validate template files as well.
    #[clap(long)]
    pub check_templates: bool,
    /// Disable colored output.
    #[clap(long)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run every rule family
    All(CommonArgs),
    /// Required frontmatter fields, sections and vocabularies per kind
    Schema(CommonArgs),
    /// Duplicate identifiers across the tree
    Ids(CommonArgs),
    /// total_sections against the section files on disk
    Sections(CommonArgs),
    /// Numeric claims against the lists they describe
    Counts(CommonArgs),
    /// Diagram presence, node counts and node coverage in prose
    Diagrams(CommonArgs),
    /// References to downstream layers
    Fwdref(CommonArgs),
    /// Traceability tag vocabulary, shape and resolution
    Tags(CommonArgs),
    /// Hardcoded quantitative values
    Magic(CommonArgs),
    /// Deprecated terminology
    Terms(CommonArgs),
    /// "starting at 001" numbering guidance
    Numbering(CommonArgs),
    /// File naming conventions for plans and contracts
    Naming(CommonArgs),
    /// Frontmatter metadata
    Meta(CommonArgs),
    /// Template schema_version against schema files
    Sync(CommonArgs),
    /// Traceability matrix coverage
    Matrix(CommonArgs),
    /// List every diagnostic code
    Codes {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Describe one diagnostic code
    Explain {
        /// Code such as SEC-E001 or ADR-E002.
        code: String,
    },
}

impl Command {
    /// Families and options for a validation verb; `None` for catalog verbs.
    pub fn selection(&self) -> Option<(Vec<RuleFamily>, &CommonArgs)> {
        let (family, args) = match self {
            Command::All(args) => return Some((Vec::new(), args)),
            Command::Schema(args) => (RuleFamily::Schema, args),
            Command::Ids(args) => (RuleFamily::Ids, args),
            Command::Sections(args) => (RuleFamily::Sections, args),
            Command::Counts(args) => (RuleFamily::Counts, args),
            Command::Diagrams(args) => (RuleFamily::Diagrams, args),
            Command::Fwdref(args) => (RuleFamily::ForwardRefs, args),
            Command::Tags(args) => (RuleFamily::Tags, args),
            Command::Magic(args) => (RuleFamily::Magic, args),
            Command::Terms(args) => (RuleFamily::Terms, args),
            Command::Numbering(args) => (RuleFamily::Numbering, args),
            Command::Naming(args) => (RuleFamily::Naming, args),
            Command::Meta(args) => (RuleFamily::Meta, args),
            Command::Sync(args) => (RuleFamily::Sync, args),
            Command::Matrix(args) => (RuleFamily::Matrix, args),
            Command::Codes { .. } | Command::Explain { .. } => return None,
        };
        Some((vec![family], args))
    }
}

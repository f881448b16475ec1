//! Project configuration (`.sddlint.toml`) and project-root detection.
//!
//! Configuration is optional. A missing file yields defaults; a present but
//! invalid file is an operational error, never a diagnostic.

use crate::core::error::SddError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".sddlint.toml";
pub const ROOT_ENV: &str = "SDDLINT_ROOT";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub validate: ValidateConfig,
    /// Extra deprecated phrase to canonical replacement pairs.
    pub terminology: BTreeMap<String, String>,
    pub magic: MagicConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ValidateConfig {
    pub strict: bool,
    pub check_templates: bool,
    pub min_score: Option<f64>,
    /// Additional roots for resolving references, relative to the project root.
    pub search_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MagicConfig {
    /// Substrings marking a line as already referencing the threshold registry.
    pub threshold_markers: Vec<String>,
}

impl Default for MagicConfig {
    fn default() -> Self {
        Self {
            threshold_markers: vec!["@threshold".to_string(), "{{".to_string()],
        }
    }
}

impl Config {
    /// Search dirs resolved against the project root.
    pub fn search_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.validate
            .search_dirs
            .iter()
            .map(|d| if d.is_absolute() { d.clone() } else { root.join(d) })
            .collect()
    }
}

/// Load `<root>/.sddlint.toml`, or defaults when absent.
pub fn load_config(root: &Path) -> Result<Config, SddError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path).map_err(SddError::IoError)?;
    toml::from_str(&content).map_err(|e| SddError::ConfigError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// The project root for `target`: `SDDLINT_ROOT` when set, else the nearest
/// ancestor holding `.sddlint.toml` or `.git`, else the target directory.
pub fn find_project_root(target: &Path) -> PathBuf {
    find_project_root_with(target, std::env::var_os(ROOT_ENV).map(PathBuf::from))
}

pub fn find_project_root_with(target: &Path, env_root: Option<PathBuf>) -> PathBuf {
    if let Some(root) = env_root.filter(|r| !r.as_os_str().is_empty()) {
        return root;
    }
    let start = if target.is_file() {
        target.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        target.to_path_buf()
    };
    let mut current = start.clone();
    loop {
        if current.join(CONFIG_FILE).exists() || current.join(".git").exists() {
            return current;
        }
        if !current.pop() {
            return start;
        }
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::fusion::{FuseOptions, Normalization};
use crate::normalize::DegeneratePolicy;

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "rankfuse.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Interpolation weight of the first ranking.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub on_degenerate: DegeneratePolicy,
    #[serde(default = "default_true")]
    pub sort: bool,
    /// Keep this many documents per query in fused output.
    #[serde(default)]
    pub cutoff: Option<usize>,
    /// Cut both inputs to this many documents per query before fusing.
    #[serde(default)]
    pub depth: Option<usize>,
    /// Run tag of fused output.
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            normalization: Normalization::default(),
            on_degenerate: DegeneratePolicy::default(),
            sort: default_true(),
            cutoff: None,
            depth: None,
            name: None,
        }
    }
}

impl FusionConfig {
    #[must_use]
    pub fn fuse_options(&self) -> FuseOptions {
        FuseOptions {
            normalization: self.normalization,
            on_degenerate: self.on_degenerate,
            sort: self.sort,
            name: self.name.clone(),
        }
    }
}

const fn default_alpha() -> f64 {
    0.5
}

const fn default_true() -> bool {
    true
}

/// Parse a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`FusionConfig`].
pub fn load_config_file(path: &Path) -> Result<FusionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<FusionConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// The user-level config path, `<config_dir>/rankfuse/config.toml`.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rankfuse/config.toml"))
}

/// Resolve configuration.
///
/// Precedence: an explicit path (must exist), then `rankfuse.toml` in
/// `project_root`, then the user config, then defaults.
///
/// # Errors
///
/// Returns an error if a config file is found but cannot be read or parsed.
pub fn resolve_config(explicit: Option<&Path>, project_root: &Path) -> Result<FusionConfig> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }

    let project = project_root.join(PROJECT_CONFIG_FILE);
    if project.exists() {
        return load_config_file(&project);
    }

    match user_config_path() {
        Some(path) if path.exists() => load_config_file(&path),
        _ => Ok(FusionConfig::default()),
    }
}

//! learnstat configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::statistics::FrequencyReference;

/// Settings for the learning engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Cohort used by `frequency_in_depth`.
    #[serde(default)]
    pub frequency_reference: FrequencyReference,
    /// Max concurrent learning computations in batch mode.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            frequency_reference: FrequencyReference::default(),
            parallelism: default_parallelism(),
        }
    }
}

/// Top-level learnstat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnstatConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Default output format for `compute`.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Grade delta (in points) below which a topic counts as unchanged.
    #[serde(default = "default_threshold")]
    pub compare_threshold: f64,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./learnstat-results")
}
fn default_format() -> String {
    "json".to_string()
}
fn default_threshold() -> f64 {
    5.0
}

impl Default for LearnstatConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            output_dir: default_output_dir(),
            default_format: default_format(),
            compare_threshold: default_threshold(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    // Substituted values are copied verbatim, never rescanned.
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `learnstat.toml` in the current directory
/// 2. `~/.config/learnstat/config.toml`
///
/// Environment variable overrides: `LEARNSTAT_OUTPUT_DIR`, `LEARNSTAT_PARALLELISM`.
pub fn load_config() -> Result<LearnstatConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LearnstatConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("learnstat.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LearnstatConfig::default(),
    };

    if let Ok(dir) = std::env::var("LEARNSTAT_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Ok(value) = std::env::var("LEARNSTAT_PARALLELISM") {
        config.engine.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("invalid LEARNSTAT_PARALLELISM: '{value}'"))?;
    }

    config.output_dir = PathBuf::from(resolve_env_vars(&config.output_dir.to_string_lossy()));
    anyhow::ensure!(
        config.engine.parallelism >= 1,
        "engine.parallelism must be at least 1"
    );

    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config(content: &str) -> Result<LearnstatConfig> {
    Ok(toml::from_str(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("learnstat"))
}

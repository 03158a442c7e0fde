//! TOML configuration for the `depot` binary.
//!
//! ```toml
//! [input]
//! dir = "data/wahapedia"
//! include_globs = ["*.csv", "*.txt"]
//!
//! [output]
//! dir = "public/depot"
//! pretty = false
//!
//! [generate]
//! workers = 4
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
}

/// Where the raw upstream tables live.
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["*.csv".to_string(), "*.txt".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerateConfig {
    /// Upper bound on factions assembled at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    4
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}

fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config file")?;

    if config.generate.workers == 0 {
        anyhow::bail!("generate.workers must be >= 1");
    }

    if config.input.include_globs.is_empty() {
        anyhow::bail!("input.include_globs must list at least one pattern");
    }

    if config.input.dir.as_os_str().is_empty() {
        anyhow::bail!("input.dir must not be empty");
    }

    if config.output.dir.as_os_str().is_empty() {
        anyhow::bail!("output.dir must not be empty");
    }

    Ok(config)
}

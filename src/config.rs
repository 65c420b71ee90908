//! termagent configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration, read-only for the duration of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Skip confirmation prompts
    #[serde(rename = "auto-approve")]
    pub auto_approve: bool,

    /// Enable internal diagnostic logging
    pub debug: bool,

    /// Dispatch loop settings
    pub agent: AgentConfig,

    /// Process runner limits
    pub process: ProcessConfig,

    /// Directory listing settings
    pub listing: ListingConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_steps == 0 {
            return Err(eyre::eyre!("agent.max-steps must be at least 1"));
        }
        if self.process.timeout_ms == 0 {
            return Err(eyre::eyre!("process.timeout-ms must be at least 1"));
        }
        if self.process.output_limit == 0 {
            return Err(eyre::eyre!("process.output-limit must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .termagent.yml
        let local_config = PathBuf::from(".termagent.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/termagent/termagent.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("termagent").join("termagent.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Which tool catalog is registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileName {
    #[default]
    Full,
    ReadOnly,
}

/// Dispatch loop settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum tool-call rounds per turn
    #[serde(rename = "max-steps")]
    pub max_steps: u32,

    /// Tool catalog to expose
    pub profile: ProfileName,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            profile: ProfileName::Full,
        }
    }
}

/// Process runner limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessConfig {
    /// Wall-clock deadline in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Byte ceiling per captured stream
    #[serde(rename = "output-limit")]
    pub output_limit: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 20_000,
            output_limit: 8192,
        }
    }
}

/// Directory listing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingConfig {
    /// Project ignore file read from each listing root
    #[serde(rename = "ignore-file")]
    pub ignore_file: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            ignore_file: ".gitignore".to_string(),
        }
    }
}

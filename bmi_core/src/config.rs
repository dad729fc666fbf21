//! Configuration file support for the BMI calculator.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/bmi-calc/config.toml`.

use crate::calculator::TARGET_BMI;
use crate::catalog::category_definition;
use crate::{BmiCategory, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Endpoint marker meaning "not configured yet"
pub const ENDPOINT_PLACEHOLDER: &str = "YOUR_SCRIPT_ID_HERE";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub submission: SubmissionConfig,

    #[serde(default)]
    pub goal: GoalConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Remote submission configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_timeout_secs")]
    pub pixel_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_sync_on_start")]
    pub sync_on_start: bool,

    #[serde(default = "default_metadata")]
    pub metadata: BTreeMap<String, String>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            method: default_method(),
            pixel_timeout_secs: default_timeout_secs(),
            fetch_timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            sync_on_start: default_sync_on_start(),
            metadata: default_metadata(),
        }
    }
}

impl SubmissionConfig {
    /// Whether a real endpoint has been set
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.endpoint.contains(ENDPOINT_PLACEHOLDER)
    }

    pub fn pixel_timeout(&self) -> Duration {
        Duration::from_secs(self.pixel_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Goal parameters configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalConfig {
    #[serde(default = "default_target_bmi")]
    pub target_bmi: f64,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            target_bmi: default_target_bmi(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("bmi-calc")
}

fn default_endpoint() -> String {
    format!("https://script.google.com/macros/s/{}/exec", ENDPOINT_PLACEHOLDER)
}

fn default_method() -> String {
    "Academic BMI Calculator Web App".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_sync_on_start() -> bool {
    true
}

fn default_metadata() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("institution".into(), "Universitas Islam Indonesia".into()),
        ("course".into(), "Sistem Informasi Manajemen".into()),
    ])
}

fn default_target_bmi() -> f64 {
    TARGET_BMI
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("bmi-calc").join("config.toml")
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let submission = &self.submission;
        if submission.pixel_timeout_secs == 0 || submission.fetch_timeout_secs == 0 {
            return Err(Error::Config("transport timeouts must be at least 1 second".into()));
        }
        if submission.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".into()));
        }

        let normal = category_definition(BmiCategory::Normal);
        if !normal.contains(self.goal.target_bmi) {
            return Err(Error::Config(format!(
                "target_bmi {} is outside the normal range [{}, {})",
                self.goal.target_bmi, normal.min, normal.max
            )));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

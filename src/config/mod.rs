//! Configuration management for Coleta
//!
//! This module handles loading, validation, profiles and environment
//! overrides for the matching engine.

use crate::error::{ColetaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Hard upper bound on the number of recommendations returned
pub const MAX_RESULTS: usize = 10;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Candidate database, relative to `data_dir` unless absolute
    pub database_file: PathBuf,
    /// Persisted relevance model, relative to `data_dir` unless absolute
    pub model_file: PathBuf,
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.data_dir).join(&self.database_file)
    }

    pub fn model_path(&self) -> PathBuf {
        expand_tilde(&self.data_dir).join(&self.model_file)
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Synonym vocabulary source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// TOML vocabulary file; the built-in vocabulary is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms_file: Option<PathBuf>,
}

/// Score fusion and result shaping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Denominator of the 0-100 normalization (classifier max + all heuristic rules)
    pub theoretical_max: f64,
    /// Combined raw score a candidate must exceed when the classifier rejects it
    pub inclusion_threshold: f64,
    /// Number of recommendations returned, at most `MAX_RESULTS`
    pub result_limit: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            theoretical_max: 2.0,
            inclusion_threshold: 0.3,
            result_limit: MAX_RESULTS,
        }
    }
}

/// Logistic relevance classifier parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2_penalty: f64,
    pub decision_threshold: f64,
    /// Regex matching one token of need or candidate text
    pub token_pattern: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            learning_rate: 0.5,
            l2_penalty: 1e-4,
            decision_threshold: 0.5,
            token_pattern: r"[\p{L}\p{N}]+".to_string(),
        }
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusion_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epochs: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ColetaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ColetaError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ColetaError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| ColetaError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(threshold) = overrides.inclusion_threshold {
            self.scoring.inclusion_threshold = threshold;
        }
        if let Some(limit) = overrides.result_limit {
            self.scoring.result_limit = limit;
        }
        if let Some(epochs) = overrides.epochs {
            self.classifier.epochs = epochs;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: COLETA_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("COLETA_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "STORAGE__DATA_DIR" => {
                self.storage.data_dir = PathBuf::from(value);
            }
            "VOCABULARY__SYNONYMS_FILE" => {
                self.vocabulary.synonyms_file = Some(PathBuf::from(value));
            }
            "SCORING__INCLUSION_THRESHOLD" => {
                self.scoring.inclusion_threshold = parse_env(path, value)?;
            }
            "SCORING__RESULT_LIMIT" => {
                self.scoring.result_limit = parse_env(path, value)?;
            }
            "CLASSIFIER__EPOCHS" => {
                self.classifier.epochs = parse_env(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ColetaError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("coleta").join("config.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| ColetaError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("~/.coleta"),
                database_file: PathBuf::from("coleta.sqlite"),
                model_file: PathBuf::from("models").join("relevance.json"),
            },
            vocabulary: VocabularyConfig::default(),
            scoring: ScoringConfig::default(),
            classifier: ClassifierConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

use crate::classifier::ClassifierError;
use crate::vocabulary::VocabularyError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Coleta
#[derive(Error, Debug)]
pub enum ColetaError {
    /// The need text was empty or whitespace only
    #[error("Invalid need: {0}")]
    InvalidNeed(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Synonym vocabulary could not be built
    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] VocabularyError),

    /// Relevance classifier failed to fit or load
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Retrain requested with nothing to learn from
    #[error("No active candidates available to train the relevance model")]
    NoTrainingData,

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Whether an error was caused by the caller or by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller input problem, rejected immediately
    Validation,
    /// Backend or model problem
    Operational,
}

impl ColetaError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ColetaError::InvalidNeed(_)
            | ColetaError::ConfigValidation { .. }
            | ColetaError::InvalidConfigValue { .. } => ErrorCategory::Validation,
            _ => ErrorCategory::Operational,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for Coleta operations
pub type Result<T> = std::result::Result<T, ColetaError>;

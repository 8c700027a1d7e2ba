use crate::config::{Config, MAX_RESULTS};
use crate::error::{ColetaError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every problem at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_scoring(config, &mut errors);
        Self::validate_classifier(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ColetaError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is not checked; files are created on first use
        if config.storage.database_file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.database_file",
                "Database file path cannot be empty",
            ));
        }

        if config.storage.model_file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.model_file",
                "Model file path cannot be empty",
            ));
        }

        if let Some(file) = &config.vocabulary.synonyms_file {
            if file.as_os_str().is_empty() {
                errors.push(ValidationError::new(
                    "vocabulary.synonyms_file",
                    "Synonyms file path cannot be empty when set",
                ));
            }
        }
    }

    fn validate_scoring(config: &Config, errors: &mut Vec<ValidationError>) {
        let scoring = &config.scoring;

        if !(scoring.theoretical_max.is_finite() && scoring.theoretical_max > 0.0) {
            errors.push(ValidationError::new(
                "scoring.theoretical_max",
                format!(
                    "Theoretical maximum must be positive, got {}",
                    scoring.theoretical_max
                ),
            ));
        }

        if !(scoring.inclusion_threshold.is_finite() && scoring.inclusion_threshold >= 0.0) {
            errors.push(ValidationError::new(
                "scoring.inclusion_threshold",
                format!(
                    "Inclusion threshold must be non-negative, got {}",
                    scoring.inclusion_threshold
                ),
            ));
        }

        if !(1..=MAX_RESULTS).contains(&scoring.result_limit) {
            errors.push(ValidationError::new(
                "scoring.result_limit",
                format!(
                    "Result limit must be between 1 and {}, got {}",
                    MAX_RESULTS, scoring.result_limit
                ),
            ));
        }
    }

    fn validate_classifier(config: &Config, errors: &mut Vec<ValidationError>) {
        let classifier = &config.classifier;

        if classifier.epochs == 0 {
            errors.push(ValidationError::new(
                "classifier.epochs",
                "Epochs must be greater than 0",
            ));
        }

        if !(classifier.learning_rate.is_finite() && classifier.learning_rate > 0.0) {
            errors.push(ValidationError::new(
                "classifier.learning_rate",
                format!(
                    "Learning rate must be positive, got {}",
                    classifier.learning_rate
                ),
            ));
        }

        if !(classifier.l2_penalty.is_finite() && classifier.l2_penalty >= 0.0) {
            errors.push(ValidationError::new(
                "classifier.l2_penalty",
                format!(
                    "L2 penalty must be non-negative, got {}",
                    classifier.l2_penalty
                ),
            ));
        }

        let threshold = classifier.decision_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            errors.push(ValidationError::new(
                "classifier.decision_threshold",
                format!("Decision threshold must be in (0, 1), got {}", threshold),
            ));
        }

        if let Err(e) = regex::Regex::new(&classifier.token_pattern) {
            errors.push(ValidationError::new(
                "classifier.token_pattern",
                format!("Invalid token pattern: {}", e),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_result_limit_bounds() {
        let mut config = Config::default();
        config.scoring.result_limit = 0;
        assert!(ConfigValidator::validate(&config).is_err());

        config.scoring.result_limit = MAX_RESULTS + 1;
        assert!(ConfigValidator::validate(&config).is_err());

        config.scoring.result_limit = 1;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.meta.schema_version = "9.9.9".to_string();
        config.scoring.theoretical_max = 0.0;
        config.classifier.token_pattern = "(".to_string();

        match ConfigValidator::validate(&config) {
            Err(ColetaError::ConfigValidation { errors }) => {
                let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "_meta.schema_version",
                        "scoring.theoretical_max",
                        "classifier.token_pattern"
                    ]
                );
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}

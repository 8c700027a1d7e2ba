//! Bag-of-words logistic regression relevance classifier
//!
//! Fitting is stochastic gradient descent with L2 shrinkage. Examples are
//! visited in the order given on every epoch and no randomness is involved,
//! so the same training set always yields the same weights.

use ahash::{HashMap, HashMapExt};
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::classifier::{ClassifierError, Featurizer, Prediction, RelevanceClassifier};
use crate::config::ClassifierConfig;
use crate::training::TrainingExample;

/// Fitted logistic model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Feature name -> weight index
    pub vocabulary: HashMap<String, usize>,
    pub weights: Vec<f64>,
    pub bias: f64,
    /// Probability at or above which a pair is flagged relevant
    pub decision_threshold: f64,
}

impl LogisticModel {
    pub fn feature_count(&self) -> usize {
        self.weights.len()
    }

    /// Check that every feature has a weight and all parameters are finite
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if let Some((name, &idx)) = self
            .vocabulary
            .iter()
            .find(|(_, &idx)| idx >= self.weights.len())
        {
            return Err(ClassifierError::IncompatibleModel(format!(
                "feature '{}' has index {} but only {} weights",
                name,
                idx,
                self.weights.len()
            )));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ClassifierError::IncompatibleModel(
                "non-finite weights".to_string(),
            ));
        }
        if !(self.decision_threshold > 0.0 && self.decision_threshold < 1.0) {
            return Err(ClassifierError::IncompatibleModel(format!(
                "decision threshold {} outside (0, 1)",
                self.decision_threshold
            )));
        }
        Ok(())
    }
}

/// Logistic regression over named text features
pub struct LogisticRelevanceClassifier {
    featurizer: Featurizer,
    epochs: usize,
    learning_rate: f64,
    l2_penalty: f64,
    decision_threshold: f64,
}

impl LogisticRelevanceClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        if config.epochs == 0 {
            return Err(ClassifierError::InvalidParameter(
                "epochs must be greater than 0".to_string(),
            ));
        }
        if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
            return Err(ClassifierError::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                config.learning_rate
            )));
        }
        if !(config.l2_penalty.is_finite() && config.l2_penalty >= 0.0) {
            return Err(ClassifierError::InvalidParameter(format!(
                "L2 penalty must be non-negative, got {}",
                config.l2_penalty
            )));
        }
        if !(config.decision_threshold > 0.0 && config.decision_threshold < 1.0) {
            return Err(ClassifierError::InvalidParameter(format!(
                "decision threshold must be in (0, 1), got {}",
                config.decision_threshold
            )));
        }

        Ok(Self {
            featurizer: Featurizer::new(&config.token_pattern)?,
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            l2_penalty: config.l2_penalty,
            decision_threshold: config.decision_threshold,
        })
    }

    fn margin(&self, model: &LogisticModel, candidate: &Candidate, need: &str) -> f64 {
        let activation: f64 = self
            .featurizer
            .features(need, candidate)
            .iter()
            .filter_map(|(name, value)| {
                let idx = *model.vocabulary.get(name)?;
                model.weights.get(idx).map(|w| w * value)
            })
            .sum();

        model.bias + activation
    }
}

impl RelevanceClassifier for LogisticRelevanceClassifier {
    type Model = LogisticModel;

    fn name(&self) -> &str {
        "logistic-bow"
    }

    fn fit(&self, examples: &[TrainingExample]) -> Result<LogisticModel, ClassifierError> {
        if examples.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut rows: Vec<(Vec<(usize, f64)>, f64)> = Vec::with_capacity(examples.len());

        for example in examples {
            let mut row = Vec::new();
            for (name, value) in self
                .featurizer
                .features(&example.need_label, &example.candidate)
            {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(name).or_insert(next);
                row.push((idx, value));
            }
            rows.push((row, if example.relevant { 1.0 } else { 0.0 }));
        }

        let mut weights = vec![0.0; vocabulary.len()];
        let mut bias = 0.0;

        for epoch in 0..self.epochs {
            for (row, label) in &rows {
                let z = bias + row.iter().map(|&(i, v)| weights[i] * v).sum::<f64>();
                let gradient = sigmoid(z) - label;

                for &(i, v) in row {
                    let decay = self.l2_penalty * weights[i];
                    weights[i] -= self.learning_rate * (gradient * v + decay);
                }
                bias -= self.learning_rate * gradient;
            }

            if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                return Err(ClassifierError::Diverged { epoch });
            }
        }

        tracing::debug!(
            "Fitted logistic model: {} features, {} examples, {} epochs",
            weights.len(),
            rows.len(),
            self.epochs
        );

        Ok(LogisticModel {
            vocabulary,
            weights,
            bias,
            decision_threshold: self.decision_threshold,
        })
    }

    fn score(&self, model: &LogisticModel, candidate: &Candidate, need: &str) -> Prediction {
        let probability = sigmoid(self.margin(model, candidate, need));
        Prediction::new(probability, probability >= model.decision_threshold)
    }

    fn check_model(&self, model: &LogisticModel) -> Result<(), ClassifierError> {
        model.validate()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::TrainingSetBuilder;
    use crate::vocabulary::SynonymMap;

    fn classifier() -> LogisticRelevanceClassifier {
        LogisticRelevanceClassifier::new(&ClassifierConfig::default()).unwrap()
    }

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::new(1, "Alimentos", "Recife", "arroz, feijão"),
            Candidate::new(2, "Roupas", "Recife", "casaco, meias"),
            Candidate::new(3, "Medicamentos", "Recife", "dipirona"),
        ]
    }

    #[test]
    fn test_empty_training_set() {
        assert!(matches!(
            classifier().fit(&[]),
            Err(ClassifierError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let mut config = ClassifierConfig::default();
        config.epochs = 0;
        assert!(LogisticRelevanceClassifier::new(&config).is_err());

        let mut config = ClassifierConfig::default();
        config.decision_threshold = 1.0;
        assert!(LogisticRelevanceClassifier::new(&config).is_err());
    }

    #[test]
    fn test_matching_category_scores_higher() {
        let vocab = SynonymMap::builtin().unwrap();
        let candidates = candidates();
        let set = TrainingSetBuilder::new(&vocab).build(&candidates);

        let clf = classifier();
        let model = clf.fit(&set.examples).unwrap();

        let food = clf.score(&model, &candidates[0], "Alimentos");
        let clothes = clf.score(&model, &candidates[1], "Alimentos");

        assert!(food.probability > clothes.probability);
        assert!(food.relevant);
    }

    #[test]
    fn test_probabilities_bounded() {
        let vocab = SynonymMap::builtin().unwrap();
        let candidates = candidates();
        let set = TrainingSetBuilder::new(&vocab).build(&candidates);

        let clf = classifier();
        let model = clf.fit(&set.examples).unwrap();

        for need in ["arroz", "xyz-unknown", "Medicamentos", "água"] {
            for c in &candidates {
                let p = clf.score(&model, c, need);
                assert!((0.0..=1.0).contains(&p.probability));
            }
        }
    }

    #[test]
    fn test_validate_rejects_dangling_feature() {
        let mut vocabulary = HashMap::new();
        vocabulary.insert("need:arroz".to_string(), 5);
        let model = LogisticModel {
            vocabulary,
            weights: Vec::new(),
            bias: 0.0,
            decision_threshold: 0.5,
        };

        assert!(matches!(
            classifier().check_model(&model),
            Err(ClassifierError::IncompatibleModel(_))
        ));

        // scoring never indexes past the weights
        let candidate = Candidate::new(1, "Alimentos", "Recife", "arroz");
        let p = classifier().score(&model, &candidate, "arroz");
        assert_eq!(p.probability, 0.5);
    }

    #[test]
    fn test_fitted_model_validates() {
        let vocab = SynonymMap::builtin().unwrap();
        let set = TrainingSetBuilder::new(&vocab).build(&candidates());
        let clf = classifier();
        let model = clf.fit(&set.examples).unwrap();
        assert!(clf.check_model(&model).is_ok());

        let mut broken = model.clone();
        broken.bias = f64::NAN;
        assert!(clf.check_model(&broken).is_err());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let vocab = SynonymMap::builtin().unwrap();
        let set = TrainingSetBuilder::new(&vocab).build(&candidates());

        let clf = classifier();
        let a = clf.fit(&set.examples).unwrap();
        let b = clf.fit(&set.examples).unwrap();

        assert_eq!(a, b);
        assert!(a.feature_count() > 0);
    }
}

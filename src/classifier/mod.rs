//! Relevance classifier contract and the shipped implementation
//!
//! Architecture:
//! - `RelevanceClassifier` trait: `fit` a model from training examples, `score` a
//!   (candidate, need) pair against a fitted model
//! - `LogisticRelevanceClassifier`: bag-of-words logistic regression
//! - `ModelSlot`: the atomically swappable active model
//! - `ModelStore`: JSON persistence so restarts reuse the last fitted model

mod features;
mod logistic;
mod slot;
mod store;

pub use features::Featurizer;
pub use logistic::{LogisticModel, LogisticRelevanceClassifier};
pub use slot::{ActiveModel, ModelSlot};
pub use store::ModelStore;

use crate::candidate::Candidate;
use crate::training::TrainingExample;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Cannot fit a model without training examples")]
    EmptyTrainingSet,

    #[error("Model weights diverged during epoch {epoch}")]
    Diverged { epoch: usize },

    #[error("Invalid classifier parameter: {0}")]
    InvalidParameter(String),

    #[error("Stored model is incompatible: {0}")]
    IncompatibleModel(String),
}

/// Output of scoring one (candidate, need) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Probability that the candidate is relevant, in [0, 1]
    pub probability: f64,
    /// Binary relevance decision
    pub relevant: bool,
}

impl Prediction {
    pub fn new(probability: f64, relevant: bool) -> Self {
        Self {
            probability,
            relevant,
        }
    }
}

/// Pluggable relevance model
///
/// Implementations may be statistical or rule based; the ranker only sees
/// `Prediction`s. Fitted models must be shareable across scoring threads and
/// serializable so they can be persisted between runs.
pub trait RelevanceClassifier: Send + Sync {
    /// Fitted model handle
    type Model: Send + Sync + Serialize + DeserializeOwned + 'static;

    /// Stable identifier, recorded alongside persisted models
    fn name(&self) -> &str;

    /// Fit a new model from labeled examples
    fn fit(&self, examples: &[TrainingExample]) -> Result<Self::Model, ClassifierError>;

    /// Score a candidate for a raw need
    fn score(&self, model: &Self::Model, candidate: &Candidate, need: &str) -> Prediction;

    /// Reject a model this classifier cannot score with, e.g. one read from disk
    fn check_model(&self, _model: &Self::Model) -> Result<(), ClassifierError> {
        Ok(())
    }
}

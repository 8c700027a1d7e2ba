//! Recommendation service: the composition root of the matching engine
//!
//! The service owns the active relevance model and hands out scoring work to
//! the `Ranker`. A model becomes active in one of three ways:
//! - `initialize` loads the persisted model, or fits one when none is stored
//! - the first `recommend` without an active model fits one lazily
//! - `retrain` fits a fresh model and swaps it in
//!
//! Fitting and model loading are serialized by `fit_lock`. Scoring never takes
//! it, it only clones the current model out of the `ModelSlot`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::candidate::Candidate;
use crate::classifier::{ActiveModel, ModelSlot, ModelStore, RelevanceClassifier};
use crate::config::ScoringConfig;
use crate::error::{ColetaError, Result};
use crate::matching::{NeedQuery, Ranker, Recommendation, ScoredCandidate};
use crate::storage::CandidateRepository;
use crate::training::TrainingSetBuilder;
use crate::vocabulary::SynonymMap;

/// Snapshot of the active model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub ready: bool,
    pub fingerprint: Option<String>,
    pub trained_at: Option<DateTime<Utc>>,
    pub examples: usize,
}

/// Outcome of a successful retrain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrainReport {
    pub candidates: usize,
    pub examples: usize,
    pub positives: usize,
    pub negatives: usize,
    pub fingerprint: String,
    pub trained_at: DateTime<Utc>,
}

pub struct RecommendationService<C: RelevanceClassifier> {
    vocabulary: Arc<SynonymMap>,
    scoring: ScoringConfig,
    repository: Arc<dyn CandidateRepository>,
    classifier: C,
    slot: ModelSlot<C::Model>,
    store: Option<ModelStore>,
    fit_lock: Mutex<()>,
}

impl<C: RelevanceClassifier> RecommendationService<C> {
    pub fn new(
        vocabulary: Arc<SynonymMap>,
        scoring: ScoringConfig,
        repository: Arc<dyn CandidateRepository>,
        classifier: C,
        store: Option<ModelStore>,
    ) -> Self {
        Self {
            vocabulary,
            scoring,
            repository,
            classifier,
            slot: ModelSlot::empty(),
            store,
            fit_lock: Mutex::new(()),
        }
    }

    pub fn vocabulary(&self) -> &SynonymMap {
        &self.vocabulary
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Activate the persisted model, or fit one from the repository.
    ///
    /// With no stored model and no candidates the service stays not ready;
    /// `recommend` then answers in degraded mode until candidates appear.
    pub fn initialize(&self) -> Result<ModelStatus> {
        let _guard = self.lock_fitting();

        if let Some(active) = self.load_persisted() {
            self.slot.publish(active);
            return Ok(self.status());
        }

        let candidates = self.repository.active_candidates()?;
        if candidates.is_empty() {
            tracing::warn!("No stored model and no candidates, relevance model not ready");
            return Ok(self.status());
        }

        match self.fit(&candidates) {
            Ok(active) => self.install(active),
            Err(e) => tracing::warn!("Initial model fit failed: {}", e),
        }

        Ok(self.status())
    }

    /// Rank the active candidates for `query`
    pub fn recommend(&self, query: &NeedQuery) -> Result<Recommendation> {
        let candidates = self.repository.active_candidates()?;

        let active = match self.slot.snapshot() {
            Some(active) => active,
            None => match self.activate_lazily(&candidates) {
                Some(active) => active,
                None => return Ok(Recommendation::degraded()),
            },
        };

        let ranker = Ranker::new(&self.vocabulary, &self.scoring);
        let items = ranker.rank(query, &candidates, |candidate, need| {
            self.classifier.score(&active.model, candidate, need)
        });

        tracing::debug!(
            "Need '{}' (city: {:?}): {} of {} candidates recommended",
            query.need(),
            query.city(),
            items.len(),
            candidates.len()
        );

        Ok(Recommendation {
            items,
            degraded: false,
            model_fingerprint: Some(active.fingerprint.clone()),
        })
    }

    /// The single highest-ranked candidate, if any
    pub fn best(&self, query: &NeedQuery) -> Result<Option<ScoredCandidate>> {
        Ok(self.recommend(query)?.items.into_iter().next())
    }

    /// Fit a new model from the current candidates and make it active.
    ///
    /// The previous model stays active when any step fails.
    pub fn retrain(&self) -> Result<RetrainReport> {
        let _guard = self.lock_fitting();

        let candidates = self.repository.active_candidates()?;
        if candidates.is_empty() {
            return Err(ColetaError::NoTrainingData);
        }

        let set = TrainingSetBuilder::new(&self.vocabulary).build(&candidates);
        let model = self.classifier.fit(&set.examples)?;
        let active = ActiveModel::new(model, set.fingerprint.clone(), set.len());

        if let Some(store) = &self.store {
            store.save(self.classifier.name(), &active)?;
        }

        let report = RetrainReport {
            candidates: candidates.len(),
            examples: set.len(),
            positives: set.positives(),
            negatives: set.negatives(),
            fingerprint: set.fingerprint,
            trained_at: active.trained_at,
        };

        self.slot.publish(active);
        tracing::info!(
            "Retrained relevance model {} from {} candidates ({} examples)",
            short(&report.fingerprint),
            report.candidates,
            report.examples
        );

        Ok(report)
    }

    pub fn status(&self) -> ModelStatus {
        match self.slot.snapshot() {
            Some(active) => ModelStatus {
                ready: true,
                fingerprint: Some(active.fingerprint.clone()),
                trained_at: Some(active.trained_at),
                examples: active.example_count,
            },
            None => ModelStatus {
                ready: false,
                fingerprint: None,
                trained_at: None,
                examples: 0,
            },
        }
    }

    fn lock_fitting(&self) -> MutexGuard<'_, ()> {
        self.fit_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// One activation attempt for a call that found no model
    fn activate_lazily(&self, candidates: &[Candidate]) -> Option<Arc<ActiveModel<C::Model>>> {
        let _guard = self.lock_fitting();

        // Another caller may have finished while we waited
        if let Some(active) = self.slot.snapshot() {
            return Some(active);
        }

        if let Some(active) = self.load_persisted() {
            self.slot.publish(active);
            return self.slot.snapshot();
        }

        if candidates.is_empty() {
            tracing::warn!("Relevance model not ready and no candidates to fit one, degraded");
            return None;
        }

        match self.fit(candidates) {
            Ok(active) => {
                self.install(active);
                self.slot.snapshot()
            }
            Err(e) => {
                tracing::warn!("Lazy model fit failed, degraded: {}", e);
                None
            }
        }
    }

    fn load_persisted(&self) -> Option<ActiveModel<C::Model>> {
        let store = self.store.as_ref()?;
        let loaded = store
            .load::<C::Model>(self.classifier.name())
            .and_then(|active| match active {
                Some(active) => {
                    self.classifier.check_model(&active.model)?;
                    Ok(Some(active))
                }
                None => Ok(None),
            });

        match loaded {
            Ok(Some(active)) => {
                tracing::info!(
                    "Loaded relevance model {} from {}",
                    short(&active.fingerprint),
                    store.path().display()
                );
                Some(active)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    "Ignoring stored model at {}: {}",
                    store.path().display(),
                    e
                );
                None
            }
        }
    }

    fn fit(&self, candidates: &[Candidate]) -> Result<ActiveModel<C::Model>> {
        let set = TrainingSetBuilder::new(&self.vocabulary).build(candidates);
        let model = self.classifier.fit(&set.examples)?;
        let count = set.len();
        Ok(ActiveModel::new(model, set.fingerprint, count))
    }

    /// Persist (best effort) and publish a model fitted outside `retrain`
    fn install(&self, active: ActiveModel<C::Model>) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(self.classifier.name(), &active) {
                tracing::warn!("Failed to persist relevance model: {}", e);
            }
        }
        tracing::info!(
            "Relevance model {} active ({} examples)",
            short(&active.fingerprint),
            active.example_count
        );
        self.slot.publish(active);
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

//! Need matching and ranking
//!
//! Pipeline for one query:
//! 1. `NeedQuery` validates the need and normalizes the city filter
//! 2. `SynonymResolver` maps the need onto a canonical category label
//! 3. per candidate, the classifier probability and the `HeuristicScorer`
//!    bonus are combined by `ScoreFusion`
//! 4. `Ranker` keeps included candidates, sorts and truncates

mod fusion;
mod heuristic;
mod ranker;
mod resolver;

pub use fusion::{round_one_decimal, FusedScore, ScoreFusion};
pub use heuristic::{
    HeuristicBonus, HeuristicScorer, STOCK_MATCH_BONUS, SYNONYM_MATCH_BONUS, TYPE_MATCH_BONUS,
};
pub use ranker::Ranker;
pub use resolver::{Resolution, SynonymResolver};

use crate::candidate::Candidate;
use crate::error::{ColetaError, Result};
use serde::Serialize;

/// A validated recommendation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedQuery {
    need: String,
    city: Option<String>,
}

impl NeedQuery {
    /// Build a query; a blank need is rejected, a blank city means no filter
    pub fn new(need: &str, city: Option<&str>) -> Result<Self> {
        let need = need.trim();
        if need.is_empty() {
            return Err(ColetaError::InvalidNeed(
                "need must not be empty".to_string(),
            ));
        }

        let city = city
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self {
            need: need.to_string(),
            city,
        })
    }

    pub fn need(&self) -> &str {
        &self.need
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }
}

/// One ranked candidate with the signals that produced its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub classifier_probability: f64,
    pub heuristic: HeuristicBonus,
    /// Normalized score in [0, 100], one decimal
    pub score: f64,
}

impl ScoredCandidate {
    pub fn heuristic_bonus(&self) -> f64 {
        self.heuristic.total()
    }
}

/// Ranked candidates for one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recommendation {
    /// At most ten entries, scores non-increasing
    pub items: Vec<ScoredCandidate>,
    /// No model was available, so nothing could be scored
    pub degraded: bool,
    /// Fingerprint of the model that produced the scores
    pub model_fingerprint: Option<String>,
}

impl Recommendation {
    pub fn degraded() -> Self {
        Self {
            items: Vec::new(),
            degraded: true,
            model_fingerprint: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.items.first()
    }

    /// Response view of every item, in rank order
    pub fn points(&self) -> Vec<RecommendedPoint> {
        self.items.iter().map(RecommendedPoint::from).collect()
    }
}

/// Collection point as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedPoint {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub city: String,
    pub district: String,
    pub street: String,
    pub stock: String,
    pub image_refs: Vec<String>,
    pub score: f64,
}

impl From<&ScoredCandidate> for RecommendedPoint {
    fn from(scored: &ScoredCandidate) -> Self {
        let c = &scored.candidate;
        Self {
            id: c.id,
            kind: c.kind.clone(),
            description: c.description.clone(),
            city: c.city.clone(),
            district: c.district.clone(),
            street: c.street.clone(),
            stock: c.stock.clone(),
            image_refs: c.image_refs.clone(),
            score: scored.score,
        }
    }
}

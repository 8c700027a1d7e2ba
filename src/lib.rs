//! Coleta - donation need to collection point matching
//!
//! Ranks active collection points against a free-text need. The need is
//! canonicalized against a synonym vocabulary, each candidate is scored by a
//! pluggable relevance classifier plus deterministic matching rules, and the
//! combined score is normalized to 0-100.

pub mod candidate;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod matching;
pub mod storage;
pub mod training;
pub mod vocabulary;

pub use candidate::Candidate;
pub use engine::{ModelStatus, RecommendationService, RetrainReport};
pub use error::{ColetaError, Result};
pub use matching::{NeedQuery, Recommendation, RecommendedPoint};

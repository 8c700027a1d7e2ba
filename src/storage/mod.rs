//! Candidate storage
//!
//! The engine only ever reads a snapshot of the active candidates through
//! `CandidateRepository`. `Database` is the SQLite-backed store used by the
//! CLI; `InMemoryCandidates` serves tests and embedding applications.

pub mod database;

use crate::candidate::Candidate;
use crate::error::Result;
use std::sync::RwLock;

pub use database::{Database, DbStats};

/// Read-only source of candidates for scoring and training
pub trait CandidateRepository: Send + Sync {
    /// Snapshot of every active candidate, in stable repository order
    fn active_candidates(&self) -> Result<Vec<Candidate>>;
}

/// Candidates held in memory
#[derive(Debug, Default)]
pub struct InMemoryCandidates {
    candidates: RwLock<Vec<Candidate>>,
}

impl InMemoryCandidates {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates: RwLock::new(candidates),
        }
    }

    /// Replace the whole candidate set
    pub fn replace(&self, candidates: Vec<Candidate>) {
        *self
            .candidates
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = candidates;
    }

    pub fn push(&self, candidate: Candidate) {
        self.candidates
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(candidate);
    }
}

impl CandidateRepository for InMemoryCandidates {
    fn active_candidates(&self) -> Result<Vec<Candidate>> {
        let candidates = self
            .candidates
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(candidates.iter().filter(|c| c.active).cloned().collect())
    }
}

//! Synthetic training-set construction from the candidate population
//!
//! Every retrain rebuilds the example set from scratch:
//! - two positives pairing each candidate with its own category
//! - two positives per stock item longer than two characters
//! - one positive per synonym registered under the candidate's category
//! - one negative for each of the first two same-city candidates of another category
//!
//! The set is a pure function of the candidate order and the vocabulary, so two
//! builds over the same inputs produce the same examples and the same fingerprint.

use crate::candidate::Candidate;
use crate::vocabulary::SynonymMap;
use std::sync::Arc;

/// Copies emitted per exact-category positive
const CATEGORY_POSITIVE_COPIES: usize = 2;

/// Copies emitted per stock-item positive
const STOCK_POSITIVE_COPIES: usize = 2;

/// Stock items must be longer than this many characters to become examples
const MIN_STOCK_ITEM_CHARS: usize = 2;

/// Same-city candidates of another category used as negatives
const NEGATIVES_PER_CANDIDATE: usize = 2;

/// A labeled (need, candidate) pair
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub need_label: String,
    pub candidate: Arc<Candidate>,
    pub relevant: bool,
}

impl TrainingExample {
    fn new(need_label: impl Into<String>, candidate: &Arc<Candidate>, relevant: bool) -> Self {
        Self {
            need_label: need_label.into(),
            candidate: Arc::clone(candidate),
            relevant,
        }
    }
}

/// Examples produced by one build, with a content fingerprint
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub examples: Vec<TrainingExample>,
    pub fingerprint: String,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.examples.iter().filter(|e| e.relevant).count()
    }

    pub fn negatives(&self) -> usize {
        self.len() - self.positives()
    }
}

/// Builds training sets against a fixed vocabulary
pub struct TrainingSetBuilder<'a> {
    vocabulary: &'a SynonymMap,
}

impl<'a> TrainingSetBuilder<'a> {
    pub fn new(vocabulary: &'a SynonymMap) -> Self {
        Self { vocabulary }
    }

    /// Build the example set for `candidates`, preserving their order
    pub fn build(&self, candidates: &[Candidate]) -> TrainingSet {
        let pool: Vec<Arc<Candidate>> = candidates.iter().cloned().map(Arc::new).collect();
        let mut examples = Vec::new();

        for candidate in &pool {
            for _ in 0..CATEGORY_POSITIVE_COPIES {
                examples.push(TrainingExample::new(&candidate.kind, candidate, true));
            }

            for item in candidate
                .stock_items()
                .filter(|item| item.chars().count() > MIN_STOCK_ITEM_CHARS)
            {
                for _ in 0..STOCK_POSITIVE_COPIES {
                    examples.push(TrainingExample::new(item, candidate, true));
                }
            }

            for synonym in self.vocabulary.synonyms_of(&candidate.kind) {
                examples.push(TrainingExample::new(synonym, candidate, true));
            }

            let contrasting = pool
                .iter()
                .filter(|other| other.in_city(&candidate.city) && !other.has_kind(&candidate.kind))
                .take(NEGATIVES_PER_CANDIDATE);

            for other in contrasting {
                examples.push(TrainingExample::new(&candidate.kind, other, false));
            }
        }

        let fingerprint = fingerprint(&examples);

        tracing::info!(
            "Prepared {} training examples from {} candidates",
            examples.len(),
            pool.len()
        );

        TrainingSet {
            examples,
            fingerprint,
        }
    }
}

/// BLAKE3 digest over the ordered example contents
pub fn fingerprint(examples: &[TrainingExample]) -> String {
    let mut hasher = blake3::Hasher::new();

    for example in examples {
        let c = &example.candidate;
        hasher.update(example.need_label.as_bytes());
        hasher.update(&[0]);
        hasher.update(&c.id.to_le_bytes());
        for field in [&c.kind, &c.description, &c.city, &c.stock] {
            hasher.update(field.as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(&[example.relevant as u8]);
    }

    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> SynonymMap {
        SynonymMap::builtin().unwrap()
    }

    #[test]
    fn test_positive_counts() {
        let vocab = vocabulary();
        let candidates = vec![Candidate::new(1, "Alimentos", "Recife", "arroz, pó, feijão")];

        let set = TrainingSetBuilder::new(&vocab).build(&candidates);

        // 2 category + 2x2 stock ("pó" is too short) + synonyms
        let expected = 2 + 4 + vocab.synonyms_of("Alimentos").len();
        assert_eq!(set.len(), expected);
        assert_eq!(set.negatives(), 0);
        assert!(set.examples.iter().all(|e| e.candidate.id == 1));
    }

    #[test]
    fn test_unknown_kind_has_no_synonym_examples() {
        let vocab = vocabulary();
        let candidates = vec![Candidate::new(1, "Ferramentas", "Recife", "")];

        let set = TrainingSetBuilder::new(&vocab).build(&candidates);

        assert_eq!(set.len(), 2);
        assert!(set.examples.iter().all(|e| e.need_label == "Ferramentas"));
    }

    #[test]
    fn test_negatives_take_first_two_same_city_other_kind() {
        let vocab = vocabulary();
        let candidates = vec![
            Candidate::new(1, "Ferramentas", "Recife", ""),
            Candidate::new(2, "Roupas", "Recife", ""),
            Candidate::new(3, "Ferramentas", "Recife", ""),
            Candidate::new(4, "Medicamentos", "Olinda", ""),
            Candidate::new(5, "Alimentos", "recife", ""),
            Candidate::new(6, "Medicamentos", "Recife", ""),
        ];

        let set = TrainingSetBuilder::new(&vocab).build(&candidates);

        let negatives_for_first: Vec<i64> = set
            .examples
            .iter()
            .filter(|e| !e.relevant && e.need_label == "Ferramentas")
            .map(|e| e.candidate.id)
            .collect();

        // Candidates 1 and 3 each contribute negatives 2 and 5
        assert_eq!(negatives_for_first, vec![2, 5, 2, 5]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let vocab = vocabulary();
        let candidates = vec![
            Candidate::new(1, "Alimentos", "São Paulo", "arroz, feijão"),
            Candidate::new(2, "Roupas", "São Paulo", "casaco"),
            Candidate::new(3, "Medicamentos", "Santos", "dipirona"),
        ];

        let builder = TrainingSetBuilder::new(&vocab);
        let first = builder.build(&candidates);
        let second = builder.build(&candidates);

        assert_eq!(first.examples, second.examples);
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let vocab = vocabulary();
        let builder = TrainingSetBuilder::new(&vocab);

        let a = builder.build(&[Candidate::new(1, "Roupas", "Recife", "casaco")]);
        let b = builder.build(&[Candidate::new(1, "Roupas", "Recife", "blusa")]);

        assert_ne!(a.fingerprint, b.fingerprint);
    }
}

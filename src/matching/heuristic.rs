//! Rule-based relevance bonus, independent of the trained model

use crate::candidate::Candidate;
use crate::vocabulary::{fold, SynonymMap};

/// Candidate category equals the canonical label
pub const TYPE_MATCH_BONUS: f64 = 0.5;
/// Candidate stock mentions the need
pub const STOCK_MATCH_BONUS: f64 = 0.3;
/// Need is a registered synonym of the candidate's category
pub const SYNONYM_MATCH_BONUS: f64 = 0.2;

/// Which heuristic rules fired for one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeuristicBonus {
    pub type_match: bool,
    pub stock_match: bool,
    pub synonym_match: bool,
}

impl HeuristicBonus {
    /// Sum of the fired rules
    pub fn total(&self) -> f64 {
        let mut total = 0.0;
        if self.type_match {
            total += TYPE_MATCH_BONUS;
        }
        if self.stock_match {
            total += STOCK_MATCH_BONUS;
        }
        if self.synonym_match {
            total += SYNONYM_MATCH_BONUS;
        }
        total
    }
}

pub struct HeuristicScorer<'a> {
    vocabulary: &'a SynonymMap,
}

impl<'a> HeuristicScorer<'a> {
    pub fn new(vocabulary: &'a SynonymMap) -> Self {
        Self { vocabulary }
    }

    /// Evaluate every rule for `candidate`.
    ///
    /// `need` is the query as the caller typed it; `canonical` is its
    /// resolved label.
    pub fn score(&self, candidate: &Candidate, need: &str, canonical: &str) -> HeuristicBonus {
        HeuristicBonus {
            type_match: candidate.has_kind(canonical),
            stock_match: !candidate.stock.is_empty()
                && fold(&candidate.stock).contains(fold(need).as_str()),
            synonym_match: self.vocabulary.is_synonym_of(&candidate.kind, need),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: [f64; 7] = [0.0, 0.2, 0.3, 0.5, 0.7, 0.8, 1.0];

    #[test]
    fn test_all_rules_fire() {
        let vocab = SynonymMap::builtin().unwrap();
        let scorer = HeuristicScorer::new(&vocab);
        let candidate = Candidate::new(1, "Alimentos", "São Paulo", "arroz, feijão");

        let bonus = scorer.score(&candidate, "arroz", "Alimentos");
        assert!(bonus.type_match && bonus.stock_match && bonus.synonym_match);
        assert!((bonus.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_stock_match_ignores_case() {
        let vocab = SynonymMap::builtin().unwrap();
        let scorer = HeuristicScorer::new(&vocab);
        let candidate = Candidate::new(1, "Outros", "Recife", "Lanterna, PILHAS");

        let bonus = scorer.score(&candidate, "pilhas", "pilhas");
        assert_eq!(
            bonus,
            HeuristicBonus {
                type_match: false,
                stock_match: true,
                synonym_match: false,
            }
        );
    }

    #[test]
    fn test_synonym_uses_candidate_category() {
        let vocab = SynonymMap::builtin().unwrap();
        let scorer = HeuristicScorer::new(&vocab);
        let candidate = Candidate::new(1, "medicamentos", "Recife", "");

        // canonical label differs, but the need is a synonym of the candidate's type
        let bonus = scorer.score(&candidate, "Dipirona", "Alimentos");
        assert!(!bonus.type_match);
        assert!(!bonus.stock_match);
        assert!(bonus.synonym_match);
    }

    #[test]
    fn test_totals_stay_in_allowed_set() {
        for mask in 0..8u8 {
            let bonus = HeuristicBonus {
                type_match: mask & 1 != 0,
                stock_match: mask & 2 != 0,
                synonym_match: mask & 4 != 0,
            };
            let total = bonus.total();
            assert!(
                ALLOWED.iter().any(|v| (v - total).abs() < 1e-9),
                "unexpected bonus {}",
                total
            );
            assert_eq!(total > 0.0, mask != 0);
        }
    }
}

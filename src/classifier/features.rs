// Text featurization for the logistic relevance model
//
// Each (need, candidate) pair becomes a sparse, L2-normalized bag of named
// features. Field weights: category x3, need/stock/city x2, description x1.
use regex::Regex;
use std::collections::BTreeMap;

use crate::candidate::Candidate;
use crate::classifier::ClassifierError;

const NEED_WEIGHT: f64 = 2.0;
const TYPE_WEIGHT: f64 = 3.0;
const STOCK_WEIGHT: f64 = 2.0;
const DESCRIPTION_WEIGHT: f64 = 1.0;
const CITY_WEIGHT: f64 = 2.0;
const PAIR_WEIGHT: f64 = 1.0;

/// Tokens shorter than this are ignored
const MIN_TOKEN_CHARS: usize = 2;

/// Turns (need, candidate) pairs into sparse feature vectors
#[derive(Debug, Clone)]
pub struct Featurizer {
    token_pattern: Regex,
}

impl Featurizer {
    pub fn new(token_pattern: &str) -> Result<Self, ClassifierError> {
        let token_pattern = Regex::new(token_pattern).map_err(|e| {
            ClassifierError::InvalidParameter(format!("token pattern '{}': {}", token_pattern, e))
        })?;
        Ok(Self { token_pattern })
    }

    /// Lowercased tokens of at least two characters
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_pattern
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
            .collect()
    }

    /// Named features for one pair, sorted by name
    pub fn features(&self, need: &str, candidate: &Candidate) -> Vec<(String, f64)> {
        let mut bag: BTreeMap<String, f64> = BTreeMap::new();

        let need_tokens = self.tokens(need);
        let type_tokens = self.tokens(&candidate.kind);
        let stock_tokens = self.tokens(&candidate.stock);
        let description_tokens = self.tokens(&candidate.description);

        add_tokens(&mut bag, "need", &need_tokens, NEED_WEIGHT);
        add_tokens(&mut bag, "type", &type_tokens, TYPE_WEIGHT);
        add_tokens(&mut bag, "stock", &stock_tokens, STOCK_WEIGHT);
        add_tokens(&mut bag, "desc", &description_tokens, DESCRIPTION_WEIGHT);
        add_tokens(&mut bag, "city", &self.tokens(&candidate.city), CITY_WEIGHT);

        for n in &need_tokens {
            for t in &type_tokens {
                *bag.entry(format!("pair:{}|{}", n, t)).or_insert(0.0) += PAIR_WEIGHT;
            }
        }

        if !need_tokens.is_empty() {
            for (name, field) in [
                ("match:type", &type_tokens),
                ("match:stock", &stock_tokens),
                ("match:desc", &description_tokens),
            ] {
                let hits = need_tokens.iter().filter(|n| field.contains(*n)).count();
                if hits > 0 {
                    bag.insert(name.to_string(), hits as f64 / need_tokens.len() as f64);
                }
            }
        }

        let norm = bag.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in bag.values_mut() {
                *value /= norm;
            }
        }

        bag.into_iter().collect()
    }
}

fn add_tokens(bag: &mut BTreeMap<String, f64>, prefix: &str, tokens: &[String], weight: f64) {
    for token in tokens {
        *bag.entry(format!("{}:{}", prefix, token)).or_insert(0.0) += weight;
    }
}

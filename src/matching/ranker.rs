//! Filtering, scoring and ordering of candidates for one query

use crate::candidate::Candidate;
use crate::classifier::Prediction;
use crate::config::{ScoringConfig, MAX_RESULTS};
use crate::matching::{
    HeuristicScorer, NeedQuery, ScoreFusion, ScoredCandidate, SynonymResolver,
};
use crate::vocabulary::SynonymMap;

pub struct Ranker<'a> {
    resolver: SynonymResolver<'a>,
    heuristic: HeuristicScorer<'a>,
    fusion: ScoreFusion,
    limit: usize,
}

impl<'a> Ranker<'a> {
    pub fn new(vocabulary: &'a SynonymMap, scoring: &ScoringConfig) -> Self {
        Self {
            resolver: SynonymResolver::new(vocabulary),
            heuristic: HeuristicScorer::new(vocabulary),
            fusion: ScoreFusion::from_config(scoring),
            limit: scoring.result_limit.min(MAX_RESULTS),
        }
    }

    /// Rank `candidates` for `query`.
    ///
    /// `classify` scores one candidate against the need as typed. Equal
    /// scores keep the order of `candidates`.
    pub fn rank<F>(
        &self,
        query: &NeedQuery,
        candidates: &[Candidate],
        mut classify: F,
    ) -> Vec<ScoredCandidate>
    where
        F: FnMut(&Candidate, &str) -> Prediction,
    {
        let need = query.need();
        let (canonical, resolution) = self.resolver.resolve_with(need);

        tracing::debug!("Need '{}' resolved to '{}' ({:?})", need, canonical, resolution);

        let mut ranked: Vec<ScoredCandidate> = candidates
            .iter()
            .filter(|c| c.active)
            .filter(|c| query.city().map_or(true, |city| c.in_city(city)))
            .filter_map(|candidate| {
                let prediction = classify(candidate, need);
                let heuristic = self.heuristic.score(candidate, need, &canonical);
                let fused = self.fusion.fuse(prediction, heuristic.total());

                tracing::trace!(
                    "Candidate {}: p={:.4} bonus={:.1} raw={:.4} score={} include={}",
                    candidate.id,
                    fused.probability,
                    heuristic.total(),
                    fused.raw_total,
                    fused.score,
                    fused.include
                );

                fused.include.then(|| ScoredCandidate {
                    candidate: candidate.clone(),
                    classifier_probability: fused.probability,
                    heuristic,
                    score: fused.score,
                })
            })
            .collect();

        // stable: ties keep candidate order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.limit);
        ranked
    }
}

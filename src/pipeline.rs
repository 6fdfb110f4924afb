//! Route selection: score every candidate, rank, pick the winner.
//!
//! [`select`] is the single authority on which route is safest. It is a
//! pure function of its inputs; callers may run it concurrently for
//! independent requests.

use serde::Serialize;
use thiserror::Error;

use crate::geometry::GeometryModel;
use crate::model::{CandidateRoute, HotspotCollection, ScoredRoute};
use crate::ranker;
use crate::safety::RiskScorer;

#[derive(Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error("no candidate routes to select from")]
    EmptyCandidateSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub winner: ScoredRoute,
    /// Every candidate, in ranked order.
    pub all_scored: Vec<ScoredRoute>,
    pub max_risk_observed: u32,
}

pub fn select(
    candidates: &[CandidateRoute],
    hotspots: Option<&HotspotCollection>,
    model: GeometryModel,
) -> Result<SelectionResult, SelectionError> {
    if candidates.is_empty() {
        return Err(SelectionError::EmptyCandidateSet);
    }

    let scorer = RiskScorer::new(hotspots, model);

    let scored: Vec<ScoredRoute> = candidates
        .iter()
        .map(|route| ScoredRoute {
            risk: scorer.score(&route.line),
            route: route.clone(),
        })
        .collect();

    let max_risk_observed = scored.iter().map(|s| s.risk).max().unwrap_or(0);
    let all_scored = ranker::rank(scored);
    let winner = all_scored[0].clone();

    Ok(SelectionResult {
        winner,
        all_scored,
        max_risk_observed,
    })
}

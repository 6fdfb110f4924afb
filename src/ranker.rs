use std::cmp::Ordering;

use itertools::Itertools;

use crate::model::ScoredRoute;

/// Selection order: lower risk first, then the longer route.
///
/// Among equally risky routes the longer one is preferred, since a short
/// route that dodges every zone is more likely to be slipping through a gap
/// in an incomplete hotspot dataset.
pub fn compare(a: &ScoredRoute, b: &ScoredRoute) -> Ordering {
    a.risk
        .cmp(&b.risk)
        .then_with(|| b.route.distance_meters.total_cmp(&a.route.distance_meters))
}

/// Reorder `scored` by [`compare`]. Stable: exact ties keep their input order.
pub fn rank(scored: Vec<ScoredRoute>) -> Vec<ScoredRoute> {
    scored.into_iter().sorted_by(compare).collect()
}

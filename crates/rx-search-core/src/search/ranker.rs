//! Candidate ordering and truncation.
//!
//! Order: match strength (strongest first), then popularity (highest
//! first), then catalog position. The sort is stable and the position key
//! makes every comparison total, so equal inputs always rank the same way.

use std::cmp::Ordering;

use super::Candidate;

/// Ranking comparator.
pub fn compare<A>(a: &Candidate<'_, A>, b: &Candidate<'_, A>) -> Ordering {
    b.strength
        .cmp(&a.strength)
        .then_with(|| popularity_order(a, b))
}

/// Popularity descending, then catalog position ascending.
pub fn popularity_order<A>(a: &Candidate<'_, A>, b: &Candidate<'_, A>) -> Ordering {
    b.record
        .popularity_score
        .total_cmp(&a.record.popularity_score)
        .then_with(|| a.position.cmp(&b.position))
}

/// Sort candidates and keep at most `limit`.
pub fn rank<A>(mut candidates: Vec<Candidate<'_, A>>, limit: usize) -> Vec<Candidate<'_, A>> {
    candidates.sort_by(compare);
    candidates.truncate(limit);
    candidates
}

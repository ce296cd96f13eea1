//! Name completion fallback.

use std::collections::HashSet;

use crate::catalog::CatalogStore;
use crate::models::{MatchStrength, RecordAttributes};

use super::{match_candidates, rank, NormalizedQuery};

/// Up to `limit` distinct record names whose name or an alias contains the
/// query, best match first. Category-only matches are not completions.
///
/// An empty query completes to nothing.
pub fn complete<A: RecordAttributes>(
    store: &CatalogStore<A>,
    query: &NormalizedQuery,
    limit: usize,
) -> Vec<String> {
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let candidates: Vec<_> = match_candidates(store, query)
        .into_iter()
        .filter(|c| c.strength >= MatchStrength::AliasPartial)
        .collect();

    let mut seen = HashSet::new();
    rank(candidates, usize::MAX)
        .into_iter()
        .map(|c| c.record.name.as_str())
        .filter(|name| seen.insert(*name))
        .take(limit)
        .map(str::to_string)
        .collect()
}

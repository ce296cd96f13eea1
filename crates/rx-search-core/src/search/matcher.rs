//! Candidate selection.
//!
//! Each record is tagged with the strongest way it matches the query:
//! exact name, name substring, alias substring, category substring. Records
//! matching none of these are dropped. Order is left to the ranker.

use crate::catalog::{CatalogEntry, CatalogStore, RecordKeys};
use crate::models::{CatalogRecord, MatchStrength, RecordAttributes};

use super::NormalizedQuery;

/// A record selected for a query.
#[derive(Debug)]
pub struct Candidate<'a, A> {
    pub record: &'a CatalogRecord<A>,
    pub keys: &'a RecordKeys,
    /// Position in the catalog, the final ranking tie-break
    pub position: usize,
    pub strength: MatchStrength,
}

impl<A> Clone for Candidate<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Candidate<'_, A> {}

impl<'a, A> Candidate<'a, A> {
    fn from_entry(entry: CatalogEntry<'a, A>, strength: MatchStrength) -> Self {
        Self {
            record: entry.record,
            keys: entry.keys,
            position: entry.position,
            strength,
        }
    }
}

/// Strongest match of `query` (already normalized) against one record.
pub fn classify(keys: &RecordKeys, query: &str) -> Option<MatchStrength> {
    if keys.name == query {
        Some(MatchStrength::Exact)
    } else if keys.name.contains(query) {
        Some(MatchStrength::NamePartial)
    } else if keys.aliases.iter().any(|alias| alias.contains(query)) {
        Some(MatchStrength::AliasPartial)
    } else if keys.categories.iter().any(|category| category.contains(query)) {
        Some(MatchStrength::CategoryPartial)
    } else {
        None
    }
}

/// All records matching `query`, in catalog order.
///
/// An empty query selects every record as `Neutral`.
pub fn match_candidates<'a, A: RecordAttributes>(
    store: &'a CatalogStore<A>,
    query: &NormalizedQuery,
) -> Vec<Candidate<'a, A>> {
    match query.as_text() {
        None => store
            .entries()
            .map(|entry| Candidate::from_entry(entry, MatchStrength::Neutral))
            .collect(),
        Some(text) => store
            .entries()
            .filter_map(|entry| {
                classify(entry.keys, text).map(|strength| Candidate::from_entry(entry, strength))
            })
            .collect(),
    }
}

/// Tag a record chosen by some other means (e.g., an enhanced lookup) with
/// how it relates to the query. Unrelated records are `Neutral`.
pub fn candidate_for<'a, A>(
    entry: CatalogEntry<'a, A>,
    query: &NormalizedQuery,
) -> Candidate<'a, A> {
    let strength = query
        .as_text()
        .and_then(|text| classify(entry.keys, text))
        .unwrap_or(MatchStrength::Neutral);
    Candidate::from_entry(entry, strength)
}

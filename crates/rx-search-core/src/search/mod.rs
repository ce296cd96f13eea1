//! Catalog search.
//!
//! Pipeline: Normalization → Matching → Ranking → Shaping

mod completion;
mod matcher;
mod normalizer;
mod policy;
mod ranker;
mod shaper;

pub use completion::*;
pub use matcher::*;
pub use normalizer::*;
pub use policy::*;
pub use ranker::*;
pub use shaper::*;

use crate::catalog::CatalogStore;
use crate::config::SearchConfig;
use crate::models::{
    ClinicalContext, MedicationAttributes, MedicationSuggestion, RecordAttributes, SearchContext,
    TestAttributes, TestSuggestion,
};

pub type MedicationSearch<'a> = SearchEngine<'a, MedicationAttributes>;
pub type TestSearch<'a> = SearchEngine<'a, TestAttributes>;

/// Result of a full search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<S> {
    /// Shaped suggestions, best first
    pub suggestions: Vec<S>,
    /// How many records matched before truncation
    pub matched: usize,
    /// The limit actually applied
    pub limit: usize,
}

impl<S> SearchOutcome<S> {
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Search engine over one catalog snapshot.
///
/// Everything it returns borrows from that snapshot, so a catalog swap
/// during a search has no effect on the results.
pub struct SearchEngine<'a, A> {
    store: &'a CatalogStore<A>,
    config: &'a SearchConfig,
    shaper: SuggestionShaper,
}

impl<'a, A: RecordAttributes> SearchEngine<'a, A> {
    /// Create a new engine.
    pub fn new(store: &'a CatalogStore<A>, config: &'a SearchConfig) -> Self {
        Self {
            store,
            config,
            shaper: SuggestionShaper::from_config(config),
        }
    }

    pub fn store(&self) -> &'a CatalogStore<A> {
        self.store
    }

    pub fn config(&self) -> &'a SearchConfig {
        self.config
    }

    pub fn shaper(&self) -> &SuggestionShaper {
        &self.shaper
    }

    /// Ranked candidates for a raw query, at most `limit` (and never more
    /// than the configured maximum).
    pub fn search(&self, query: &str, limit: usize) -> Vec<Candidate<'a, A>> {
        let query = NormalizedQuery::parse(query);
        let limit = self.config.effective_limit(Some(limit));
        self.ranked(&query, limit).0
    }

    /// Completion names for a raw query. `None` uses the configured
    /// completion limit.
    pub fn complete(&self, query: &str, limit: Option<usize>) -> Vec<String> {
        let limit = limit
            .unwrap_or(self.config.completion_limit)
            .min(self.config.max_limit);
        complete(self.store, &NormalizedQuery::parse(query), limit)
    }

    /// Match and rank, returning the kept candidates and the match count.
    fn ranked(&self, query: &NormalizedQuery, limit: usize) -> (Vec<Candidate<'a, A>>, usize) {
        let candidates = match_candidates(self.store, query);
        let matched = candidates.len();
        let ranked = rank(candidates, limit);

        tracing::debug!(
            kind = %A::KIND,
            query = ?query.as_text(),
            matched,
            returned = ranked.len(),
            top_strength = ?ranked.first().map(|c| c.strength),
            "Search ranked"
        );

        (ranked, matched)
    }
}

impl<'a> SearchEngine<'a, MedicationAttributes> {
    /// Full medication pipeline for one call.
    pub fn suggest(&self, request: &SearchContext) -> SearchOutcome<MedicationSuggestion<'a>> {
        // Step 1: Normalize the query and resolve the limit
        let query = NormalizedQuery::parse(&request.query);
        let limit = self.config.effective_limit(request.limit);

        // Step 2: Match and rank
        let (ranked, matched) = self.ranked(&query, limit);

        // Step 3: Shape with patient context
        let suggestions = self.shape(&ranked, &query, request.clinical_context.as_ref());

        SearchOutcome {
            suggestions,
            matched,
            limit,
        }
    }

    /// Shape already-ranked candidates.
    pub fn shape(
        &self,
        candidates: &[Candidate<'a, MedicationAttributes>],
        query: &NormalizedQuery,
        context: Option<&ClinicalContext>,
    ) -> Vec<MedicationSuggestion<'a>> {
        candidates
            .iter()
            .map(|c| self.shaper.shape_medication(self.store, c, query, context))
            .collect()
    }
}

impl<'a> SearchEngine<'a, TestAttributes> {
    /// Full test pipeline for one call. Clinical context is accepted but
    /// does not affect test suggestions.
    pub fn suggest(&self, request: &SearchContext) -> SearchOutcome<TestSuggestion<'a>> {
        let query = NormalizedQuery::parse(&request.query);
        let limit = self.config.effective_limit(request.limit);

        let (ranked, matched) = self.ranked(&query, limit);
        let suggestions = self.shape(&ranked, &query);

        SearchOutcome {
            suggestions,
            matched,
            limit,
        }
    }

    /// Shape already-ranked candidates.
    pub fn shape(
        &self,
        candidates: &[Candidate<'a, TestAttributes>],
        query: &NormalizedQuery,
    ) -> Vec<TestSuggestion<'a>> {
        candidates
            .iter()
            .map(|c| self.shaper.shape_test(c, query))
            .collect()
    }
}

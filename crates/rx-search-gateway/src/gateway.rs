//! Request handling.
//!
//! Flow: parse request → enhanced lookup (optional) → local search when the
//! lookup is absent, fails, or maps to nothing → completions when nothing
//! ranked → tagged response.

use std::sync::Arc;

use rx_search_core::catalog::CatalogStore;
use rx_search_core::models::{CatalogKind, RecordAttributes};
use rx_search_core::search::{candidate_for, match_candidates, rank, Candidate, NormalizedQuery};
use rx_search_core::{MedicationSearch, RxSearchCore, SearchEngine, TestSearch};

use crate::enhanced::EnhancedLookup;
use crate::error::{GatewayError, GatewayResult, Locale};
use crate::request::SearchRequest;
use crate::response::{
    CatalogStamp, MedicationSuggestionDto, SearchResponse, SuggestionBody, SuggestionEnvelope,
    TestSuggestionDto,
};

/// Search boundary over a shared core.
pub struct Gateway {
    core: Arc<RxSearchCore>,
    lookup: Option<Box<dyn EnhancedLookup>>,
}

impl Gateway {
    /// Create a gateway that answers from local search only.
    pub fn new(core: Arc<RxSearchCore>) -> Self {
        Self { core, lookup: None }
    }

    /// Attach an enhanced lookup provider.
    pub fn with_lookup(mut self, lookup: impl EnhancedLookup + 'static) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    pub fn core(&self) -> &Arc<RxSearchCore> {
        &self.core
    }

    /// Handle a raw JSON body for one catalog and render the reply.
    ///
    /// Returns an HTTP-style status code and a JSON body; errors become a
    /// structured error body in the requested locale.
    pub fn respond_json(&self, kind: CatalogKind, body: &str, locale: Locale) -> (u16, String) {
        let result = self
            .handle_json(kind, body)
            .and_then(|response| {
                serde_json::to_string(&response)
                    .map_err(|e| GatewayError::Internal(format!("response serialization: {e}")))
            });

        match result {
            Ok(json) => (200, json),
            Err(err) => {
                let status = err.status_code();
                let body = serde_json::to_string(&err.to_body(locale)).unwrap_or_else(|_| {
                    r#"{"error":{"code":"INTERNAL","message":"An internal error occurred"}}"#
                        .to_string()
                });
                (status, body)
            }
        }
    }

    /// Parse a JSON body and search the given catalog.
    pub fn handle_json(&self, kind: CatalogKind, body: &str) -> GatewayResult<SearchResponse> {
        let request = SearchRequest::from_json(body)?;
        Ok(match kind {
            CatalogKind::Medication => self.handle_medications(&request),
            CatalogKind::Test => self.handle_tests(&request),
        })
    }

    /// Search medications.
    pub fn handle_medications(&self, request: &SearchRequest) -> SearchResponse {
        let store = self.core.medication_snapshot();
        let engine = MedicationSearch::new(&store, self.core.config());
        let query = NormalizedQuery::parse(&request.text);

        let limit = self.core.config().effective_limit(request.limit);

        let (candidates, fallback) = self.select(&store, request, &query, limit);
        let suggestions = engine.shape(&candidates, &query, request.context.as_ref());

        let results = if suggestions.is_empty() {
            completions(&engine, &request.text, limit)
        } else {
            suggestions
                .iter()
                .map(|s| {
                    envelope(fallback, SuggestionBody::Medication(MedicationSuggestionDto::from(s)))
                })
                .collect()
        };

        SearchResponse::new(stamp(&store), fallback, results)
    }

    /// Search diagnostic tests. Clinical context does not affect results.
    pub fn handle_tests(&self, request: &SearchRequest) -> SearchResponse {
        let store = self.core.test_snapshot();
        let engine = TestSearch::new(&store, self.core.config());
        let query = NormalizedQuery::parse(&request.text);

        let limit = self.core.config().effective_limit(request.limit);

        let (candidates, fallback) = self.select(&store, request, &query, limit);
        let suggestions = engine.shape(&candidates, &query);

        let results = if suggestions.is_empty() {
            completions(&engine, &request.text, limit)
        } else {
            suggestions
                .iter()
                .map(|s| envelope(fallback, SuggestionBody::Test(TestSuggestionDto::from(s))))
                .collect()
        };

        SearchResponse::new(stamp(&store), fallback, results)
    }

    /// Completion names only.
    pub fn complete(&self, kind: CatalogKind, text: &str, limit: Option<usize>) -> SearchResponse {
        match kind {
            CatalogKind::Medication => {
                let store = self.core.medication_snapshot();
                let names = MedicationSearch::new(&store, self.core.config()).complete(text, limit);
                SearchResponse::new(stamp(&store), false, name_envelopes(names))
            }
            CatalogKind::Test => {
                let store = self.core.test_snapshot();
                let names = TestSearch::new(&store, self.core.config()).complete(text, limit);
                SearchResponse::new(stamp(&store), false, name_envelopes(names))
            }
        }
    }

    /// Pick ranked candidates, preferring the enhanced lookup.
    ///
    /// The flag is true when local search answered.
    fn select<'s, A: RecordAttributes>(
        &self,
        store: &'s CatalogStore<A>,
        request: &SearchRequest,
        query: &NormalizedQuery,
        limit: usize,
    ) -> (Vec<Candidate<'s, A>>, bool) {
        if let Some(candidates) = self.enhanced(store, request, query, limit) {
            return (candidates, false);
        }

        (rank(match_candidates(store, query), limit), true)
    }

    fn enhanced<'s, A: RecordAttributes>(
        &self,
        store: &'s CatalogStore<A>,
        request: &SearchRequest,
        query: &NormalizedQuery,
        limit: usize,
    ) -> Option<Vec<Candidate<'s, A>>> {
        let lookup = self.lookup.as_ref()?;

        let reply = match lookup.lookup(A::KIND, request) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(
                    kind = %A::KIND,
                    error = %err,
                    "Enhanced lookup failed, using local search"
                );
                return None;
            }
        };

        let candidates: Vec<_> = store
            .get_by_names(&reply.suggestions)
            .into_iter()
            .filter_map(|record| store.entry(&record.id))
            .map(|entry| candidate_for(entry, query))
            .collect();

        if candidates.is_empty() {
            tracing::warn!(
                kind = %A::KIND,
                proposed = reply.suggestions.len(),
                "Enhanced lookup matched no catalog records, using local search"
            );
            return None;
        }

        tracing::debug!(
            kind = %A::KIND,
            proposed = reply.suggestions.len(),
            matched = candidates.len(),
            "Enhanced lookup mapped to catalog"
        );
        Some(rank(candidates, limit))
    }
}

fn stamp<A: RecordAttributes>(store: &CatalogStore<A>) -> CatalogStamp {
    CatalogStamp {
        kind: A::KIND,
        fingerprint: store.fingerprint().to_string(),
        records: store.len(),
    }
}

fn envelope(fallback: bool, suggestion: SuggestionBody) -> SuggestionEnvelope {
    if fallback {
        SuggestionEnvelope::Fallback { suggestion }
    } else {
        SuggestionEnvelope::AiSuggestion { suggestion }
    }
}

/// Completion envelopes when nothing ranked, bounded by the request limit.
fn completions<A: RecordAttributes>(
    engine: &SearchEngine<'_, A>,
    text: &str,
    limit: usize,
) -> Vec<SuggestionEnvelope> {
    if limit == 0 {
        return Vec::new();
    }
    name_envelopes(engine.complete(text, Some(limit)))
}

fn name_envelopes(names: Vec<String>) -> Vec<SuggestionEnvelope> {
    names
        .into_iter()
        .map(|name| SuggestionEnvelope::Completion { name })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhanced::{MockEnhancedLookup, PromptedLookup};
    use rx_search_core::catalog::seed;
    use rx_search_core::models::ClinicalContext;
    use rx_search_core::SearchConfig;

    fn setup_gateway() -> Gateway {
        let core = RxSearchCore::new(
            seed::medications().unwrap(),
            seed::tests().unwrap(),
            SearchConfig::default(),
        );
        Gateway::new(Arc::new(core))
    }

    fn names(response: &SearchResponse) -> Vec<&str> {
        response.results.iter().map(SuggestionEnvelope::name).collect()
    }

    #[test]
    fn test_local_search_without_lookup() {
        let gateway = setup_gateway();
        let response = gateway.handle_medications(&SearchRequest::new("amox"));

        assert!(response.fallback);
        assert_eq!(names(&response), vec!["Amoxicillin", "Amoxicillin-Clavulanate"]);
        assert!(response
            .results
            .iter()
            .all(|r| matches!(r, SuggestionEnvelope::Fallback { .. })));
        assert_eq!(response.catalog.kind, CatalogKind::Medication);
        assert_eq!(response.catalog.records, 20);
    }

    #[test]
    fn test_enhanced_lookup_answers() {
        let gateway = setup_gateway().with_lookup(MockEnhancedLookup);
        let response = gateway.handle_medications(&SearchRequest::new("fever"));

        assert!(!response.fallback);
        let mut got = names(&response);
        got.sort_unstable();
        assert_eq!(got, vec!["Ibuprofen", "Paracetamol"]);
        assert!(response
            .results
            .iter()
            .all(|r| matches!(r, SuggestionEnvelope::AiSuggestion { .. })));
    }

    #[test]
    fn test_failing_lookup_degrades_to_local() {
        let gateway = setup_gateway()
            .with_lookup(PromptedLookup::new(|_: &str| Err("timeout".to_string())));
        let response = gateway.handle_medications(&SearchRequest::new("amox"));

        assert!(response.fallback);
        assert_eq!(names(&response), vec!["Amoxicillin", "Amoxicillin-Clavulanate"]);
    }

    #[test]
    fn test_unmapped_lookup_reply_degrades_to_local() {
        let gateway = setup_gateway().with_lookup(PromptedLookup::new(|_: &str| {
            Ok(r#"{"suggestions":["Unobtainium"]}"#.to_string())
        }));
        let response = gateway.handle_tests(&SearchRequest::new("cbc"));

        assert!(response.fallback);
        assert_eq!(names(&response), vec!["Complete Blood Count (CBC)"]);
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let gateway = setup_gateway();
        for kind in [CatalogKind::Medication, CatalogKind::Test] {
            let response = gateway.handle_json(kind, r#"{"text": "a", "limit": 0}"#).unwrap();
            assert!(response.results.is_empty(), "{kind} results: {:?}", names(&response));
        }
    }

    #[test]
    fn test_completions_respect_limit() {
        let gateway = setup_gateway();
        let store = gateway.core().medication_snapshot();
        let config = gateway.core().config();
        let engine = MedicationSearch::new(&store, config);

        assert!(completions(&engine, "a", 0).is_empty());
        let bounded = completions(&engine, "a", 2);
        assert_eq!(bounded.len(), 2);
        assert!(bounded
            .iter()
            .all(|r| matches!(r, SuggestionEnvelope::Completion { .. })));
    }

    #[test]
    fn test_miss_is_empty() {
        let gateway = setup_gateway().with_lookup(MockEnhancedLookup);
        let response = gateway.handle_tests(&SearchRequest::new("zzzz"));

        assert!(response.fallback);
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_tests_ignore_context() {
        let gateway = setup_gateway();
        let mut context = ClinicalContext::with_age(5);
        context.add_allergy("blood");

        let plain = gateway.handle_tests(&SearchRequest::new("blood"));
        let with_context = gateway.handle_tests(&SearchRequest {
            context: Some(context),
            ..SearchRequest::new("blood")
        });

        assert_eq!(plain.results, with_context.results);
    }

    #[test]
    fn test_medication_context_lowers_confidence() {
        let gateway = setup_gateway();
        let mut context = ClinicalContext::default();
        context.add_allergy("penicillin");

        let plain = gateway.handle_medications(&SearchRequest::new("amoxicillin"));
        let flagged = gateway.handle_medications(&SearchRequest {
            context: Some(context),
            ..SearchRequest::new("amoxicillin")
        });

        let confidence = |r: &SearchResponse| r.results[0].suggestion().unwrap().confidence();
        assert!(confidence(&flagged) < confidence(&plain));
    }

    #[test]
    fn test_respond_json_bad_request() {
        let gateway = setup_gateway();

        let (status, body) = gateway.respond_json(CatalogKind::Test, "{", Locale::Es);
        assert_eq!(status, 400);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"].as_str().unwrap().contains("solicitud"));
    }

    #[test]
    fn test_respond_json_ok() {
        let gateway = setup_gateway();

        let (status, body) =
            gateway.respond_json(CatalogKind::Test, r#"{"text": "ECG"}"#, Locale::En);
        assert_eq!(status, 200);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["fallback"], true);
        assert_eq!(json["results"][0]["type"], "FALLBACK");
        assert_eq!(json["results"][0]["suggestion"]["kind"], "test");
    }

    #[test]
    fn test_complete_names() {
        let gateway = setup_gateway();
        let response = gateway.complete(CatalogKind::Medication, "prazole", Some(1));
        assert_eq!(response.results.len(), 1);
        assert!(!response.fallback);
    }
}

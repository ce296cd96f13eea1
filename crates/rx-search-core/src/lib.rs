//! Rx Search Core Library
//!
//! Deterministic medication and diagnostic test search over static,
//! in-memory catalogs.
//!
//! # Architecture
//!
//! ```text
//! query + clinical context
//!          │
//!          ▼
//!     Normalization ──► Matching ──► Ranking ──► Shaping ──► suggestions
//!                          ▲                        ▲
//!                          │                        │
//!                 ┌────────┴────────┐       Context Policy
//!                 │  CatalogStore   │    (age band, allergies)
//!                 │   (snapshot)    │
//!                 └────────▲────────┘
//!                          │
//!                   CatalogHandle (hot swap)
//! ```
//!
//! # Core Principle
//!
//! **Suggestions are prompts for a prescriber, never decisions.** Age and
//! allergy context only lower confidence and add labels.
//!
//! # Modules
//!
//! - [`catalog`]: Validated, immutable catalog stores and the swap handle
//! - [`config`]: Search configuration (limits, confidence table, thresholds)
//! - [`models`]: Domain types (CatalogRecord, ClinicalContext, suggestions)
//! - [`search`]: Matcher, ranker, shaper, completion, and the search engine

pub mod catalog;
pub mod config;
pub mod models;
pub mod search;

// Re-export commonly used types
pub use catalog::{CatalogError, CatalogHandle, CatalogStore, MedicationStore, TestStore};
pub use config::{ConfigError, SearchConfig};
pub use models::{
    CatalogRecord, ClinicalContext, MatchStrength, MedicationRecord, MedicationSuggestion,
    SearchContext, TestRecord, TestSuggestion,
};
pub use search::{MedicationSearch, NormalizedQuery, SearchEngine, SearchOutcome, TestSearch};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use models::{MedicationAttributes, TestAttributes};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RxSearchError {
    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<catalog::CatalogError> for RxSearchError {
    fn from(e: catalog::CatalogError) -> Self {
        RxSearchError::CatalogError(e.to_string())
    }
}

impl From<config::ConfigError> for RxSearchError {
    fn from(e: config::ConfigError) -> Self {
        RxSearchError::ConfigError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the built-in catalogs with default configuration and environment
/// overrides.
#[uniffi::export]
pub fn open_default_catalogs() -> Result<Arc<RxSearchCore>, RxSearchError> {
    let config = SearchConfig::default().with_env_overrides()?;
    Ok(Arc::new(RxSearchCore::new(
        catalog::seed::medications()?,
        catalog::seed::tests()?,
        config,
    )))
}

/// Open catalogs from JSON arrays of records, with an optional JSON config.
#[uniffi::export]
pub fn open_catalogs_from_json(
    medications_json: String,
    tests_json: String,
    config_json: Option<String>,
) -> Result<Arc<RxSearchCore>, RxSearchError> {
    let config = match config_json {
        Some(json) => SearchConfig::from_json_str(&json)?,
        None => SearchConfig::default(),
    };
    Ok(Arc::new(RxSearchCore::new(
        MedicationStore::from_json_str(&medications_json)?,
        TestStore::from_json_str(&tests_json)?,
        config,
    )))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe search service for FFI.
#[derive(uniffi::Object)]
pub struct RxSearchCore {
    medications: CatalogHandle<MedicationAttributes>,
    tests: CatalogHandle<TestAttributes>,
    config: SearchConfig,
}

impl RxSearchCore {
    pub fn new(medications: MedicationStore, tests: TestStore, config: SearchConfig) -> Self {
        Self {
            medications: CatalogHandle::new(medications),
            tests: CatalogHandle::new(tests),
            config,
        }
    }

    pub fn medication_snapshot(&self) -> Arc<MedicationStore> {
        self.medications.snapshot()
    }

    pub fn test_snapshot(&self) -> Arc<TestStore> {
        self.tests.snapshot()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[uniffi::export]
impl RxSearchCore {
    // =========================================================================
    // Search Operations
    // =========================================================================

    /// Ranked medication suggestions for a query and optional patient context.
    pub fn search_medications(
        &self,
        query: String,
        context: Option<FfiClinicalContext>,
        limit: Option<u32>,
    ) -> Vec<FfiMedicationSuggestion> {
        let store = self.medications.snapshot();
        let engine = MedicationSearch::new(&store, &self.config);

        let mut request = SearchContext::new(query);
        request.clinical_context = context.map(Into::into);
        request.limit = limit.map(|l| l as usize);

        let outcome = engine.suggest(&request);
        outcome.suggestions.iter().map(Into::into).collect()
    }

    /// Ranked diagnostic test suggestions for a query.
    pub fn search_tests(&self, query: String, limit: Option<u32>) -> Vec<FfiTestSuggestion> {
        let store = self.tests.snapshot();
        let engine = TestSearch::new(&store, &self.config);

        let mut request = SearchContext::new(query);
        request.limit = limit.map(|l| l as usize);

        let outcome = engine.suggest(&request);
        outcome.suggestions.iter().map(Into::into).collect()
    }

    // =========================================================================
    // Completion Operations
    // =========================================================================

    /// Medication names completing a partial query.
    pub fn complete_medication_names(&self, query: String, limit: Option<u32>) -> Vec<String> {
        let store = self.medications.snapshot();
        let engine = MedicationSearch::new(&store, &self.config);
        engine.complete(&query, limit.map(|l| l as usize))
    }

    /// Test names completing a partial query.
    pub fn complete_test_names(&self, query: String, limit: Option<u32>) -> Vec<String> {
        let store = self.tests.snapshot();
        let engine = TestSearch::new(&store, &self.config);
        engine.complete(&query, limit.map(|l| l as usize))
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Medications by id, in catalog order. Unknown ids are skipped.
    pub fn medications_by_ids(&self, ids: Vec<String>) -> Vec<FfiMedication> {
        let store = self.medications.snapshot();
        let records = store.get_by_ids(&ids);
        records.into_iter().map(Into::into).collect()
    }

    /// Replace the medication catalog. The current catalog stays in place if
    /// the new one fails validation.
    pub fn reload_medications_json(&self, json: String) -> Result<FfiCatalogInfo, RxSearchError> {
        let store = MedicationStore::from_json_str(&json)?;
        self.medications.replace(store);
        Ok(self.catalog_fingerprints())
    }

    /// Sizes and fingerprints of the current catalogs.
    pub fn catalog_fingerprints(&self) -> FfiCatalogInfo {
        let medications = self.medications.snapshot();
        let tests = self.tests.snapshot();
        FfiCatalogInfo {
            medication_count: medications.len() as u32,
            medication_fingerprint: medications.fingerprint().to_string(),
            test_count: tests.len() as u32,
            test_fingerprint: tests.fingerprint().to_string(),
        }
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe clinical context.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiClinicalContext {
    pub age: Option<u32>,
    pub allergies: Vec<String>,
    pub diagnosis: Option<String>,
    pub weight_kg: Option<f64>,
}

impl From<FfiClinicalContext> for ClinicalContext {
    fn from(ctx: FfiClinicalContext) -> Self {
        let mut context = ClinicalContext {
            age: ctx.age,
            diagnosis: ctx.diagnosis,
            weight_kg: ctx.weight_kg.filter(|w| w.is_finite() && *w > 0.0),
            ..ClinicalContext::default()
        };
        for allergy in ctx.allergies {
            context.add_allergy(allergy);
        }
        context
    }
}

/// FFI-safe medication suggestion.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationSuggestion {
    pub id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub categories: Vec<String>,
    pub confidence: f64,
    pub reasoning: String,
    pub dosage_suggestion: String,
    pub frequency_suggestion: String,
    pub precautions: Vec<String>,
    pub alternatives: Vec<String>,
    pub match_strength: String,
    pub age_band: Option<String>,
    pub allergy_conflicts: Vec<String>,
}

impl From<&MedicationSuggestion<'_>> for FfiMedicationSuggestion {
    fn from(s: &MedicationSuggestion<'_>) -> Self {
        Self {
            id: s.record.id.clone(),
            name: s.record.name.clone(),
            generic_name: s.generic_name().map(str::to_string),
            category: s.record.primary_category().map(str::to_string),
            categories: s.record.categories.clone(),
            confidence: s.confidence,
            reasoning: s.reasoning.clone(),
            dosage_suggestion: s.dosage_suggestion.clone(),
            frequency_suggestion: s.frequency_suggestion.clone(),
            precautions: s.precautions.clone(),
            alternatives: s.alternatives.iter().map(|r| r.name.clone()).collect(),
            match_strength: s.match_strength.to_string(),
            age_band: s.age_band.map(|b| b.label().to_string()),
            allergy_conflicts: s.allergy_conflicts.clone(),
        }
    }
}

/// FFI-safe test suggestion.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTestSuggestion {
    pub id: String,
    pub name: String,
    pub test_type: String,
    pub category: Option<String>,
    pub confidence: f64,
    pub reasoning: String,
    pub preparation: Vec<String>,
    pub preparation_summary: String,
    pub fasting_required: bool,
    pub match_strength: String,
}

impl From<&TestSuggestion<'_>> for FfiTestSuggestion {
    fn from(s: &TestSuggestion<'_>) -> Self {
        Self {
            id: s.record.id.clone(),
            name: s.record.name.clone(),
            test_type: s.record.attributes.test_type.as_str().to_string(),
            category: s.record.primary_category().map(str::to_string),
            confidence: s.confidence,
            reasoning: s.reasoning.clone(),
            preparation: s.record.attributes.preparation.clone(),
            preparation_summary: s.preparation_summary.clone(),
            fasting_required: s.fasting_required(),
            match_strength: s.match_strength.to_string(),
        }
    }
}

/// FFI-safe medication record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub categories: Vec<String>,
    pub dosage_forms: Vec<String>,
    pub strengths: Vec<String>,
    pub route: Option<String>,
    pub popularity_score: f64,
}

impl From<&MedicationRecord> for FfiMedication {
    fn from(record: &MedicationRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            aliases: record.aliases.clone(),
            categories: record.categories.clone(),
            dosage_forms: record.attributes.dosage_forms.clone(),
            strengths: record.attributes.strengths.clone(),
            route: record.attributes.route.clone(),
            popularity_score: record.popularity_score,
        }
    }
}

/// FFI-safe catalog summary.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiCatalogInfo {
    pub medication_count: u32,
    pub medication_fingerprint: String,
    pub test_count: u32,
    pub test_fingerprint: String,
}

//! Search response envelopes.
//!
//! Responses own their data so they can outlive the catalog snapshot they
//! were built from.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use rx_search_core::models::{
    AgeBand, CatalogKind, MatchStrength, MedicationSuggestion, TestSuggestion,
};

/// Which catalog snapshot answered a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStamp {
    pub kind: CatalogKind,
    pub fingerprint: String,
    pub records: usize,
}

/// Full response to one search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub request_id: Uuid,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub catalog: CatalogStamp,
    /// True when the enhanced lookup was unavailable and local search answered
    pub fallback: bool,
    pub results: Vec<SuggestionEnvelope>,
}

impl SearchResponse {
    pub fn new(catalog: CatalogStamp, fallback: bool, results: Vec<SuggestionEnvelope>) -> Self {
        Self::at(Utc::now(), catalog, fallback, results)
    }

    /// Build a response stamped with a given time.
    pub fn at(
        now: DateTime<Utc>,
        catalog: CatalogStamp,
        fallback: bool,
        results: Vec<SuggestionEnvelope>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            catalog,
            fallback,
            results,
        }
    }
}

/// One result entry, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionEnvelope {
    /// Chosen by the enhanced lookup, shaped locally
    AiSuggestion { suggestion: SuggestionBody },
    /// Produced by local search alone
    Fallback { suggestion: SuggestionBody },
    /// Name-only completion when nothing ranked
    Completion { name: String },
}

impl SuggestionEnvelope {
    pub fn suggestion(&self) -> Option<&SuggestionBody> {
        match self {
            SuggestionEnvelope::AiSuggestion { suggestion }
            | SuggestionEnvelope::Fallback { suggestion } => Some(suggestion),
            SuggestionEnvelope::Completion { .. } => None,
        }
    }

    /// Display name of the suggested record or completion.
    pub fn name(&self) -> &str {
        match self {
            SuggestionEnvelope::AiSuggestion { suggestion }
            | SuggestionEnvelope::Fallback { suggestion } => suggestion.name(),
            SuggestionEnvelope::Completion { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionBody {
    Medication(MedicationSuggestionDto),
    Test(TestSuggestionDto),
}

impl SuggestionBody {
    pub fn name(&self) -> &str {
        match self {
            SuggestionBody::Medication(dto) => &dto.name,
            SuggestionBody::Test(dto) => &dto.name,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            SuggestionBody::Medication(dto) => dto.confidence,
            SuggestionBody::Test(dto) => dto.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicationSuggestionDto {
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
    pub match_strength: MatchStrength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_band: Option<AgeBand>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allergy_conflicts: Vec<String>,
}

impl From<&MedicationSuggestion<'_>> for MedicationSuggestionDto {
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
            match_strength: s.match_strength,
            age_band: s.age_band,
            allergy_conflicts: s.allergy_conflicts.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSuggestionDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub test_type: String,
    pub category: Option<String>,
    pub confidence: f64,
    pub reasoning: String,
    pub preparation: Vec<String>,
    pub preparation_summary: String,
    pub fasting_required: bool,
    pub match_strength: MatchStrength,
}

impl From<&TestSuggestion<'_>> for TestSuggestionDto {
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
            match_strength: s.match_strength,
        }
    }
}

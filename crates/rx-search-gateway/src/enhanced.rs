//! Enhanced catalog lookup.
//!
//! An optional remote provider proposes record names for a query. The
//! gateway treats every failure here as "unavailable" and answers from
//! local search instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use rx_search_core::models::{CatalogKind, ClinicalContext};

use crate::prompts::build_full_prompt;
use crate::request::SearchRequest;

/// Lookup errors.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Lookup unavailable: {0}")]
    Unavailable(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Names proposed by a provider, most likely first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedReply {
    pub suggestions: Vec<String>,
}

/// A source of candidate record names for a query.
pub trait EnhancedLookup: Send + Sync {
    fn lookup(&self, kind: CatalogKind, request: &SearchRequest) -> LookupResult<EnhancedReply>;
}

/// Parse a provider reply into names.
///
/// The reply may wrap the JSON object in free text; the first complete
/// object is used. Entries may be plain strings or objects with a `name`.
pub fn parse_enhanced_response(text: &str) -> LookupResult<EnhancedReply> {
    // Find where the JSON starts (in case the provider adds extra text)
    let json_start = text.find('{').ok_or_else(|| {
        LookupError::InvalidFormat("No JSON object found in response".into())
    })?;

    let value = serde_json::Deserializer::from_str(&text[json_start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| LookupError::InvalidFormat("Empty JSON in response".into()))??;

    let entries = value
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(|| LookupError::InvalidFormat("Missing \"suggestions\" array".into()))?;

    let suggestions = entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name.as_str()),
            Value::Object(fields) => fields.get("name").and_then(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Ok(EnhancedReply { suggestions })
}

/// Lookup that is never available. Forces local search.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLookup;

impl EnhancedLookup for UnavailableLookup {
    fn lookup(&self, _kind: CatalogKind, _request: &SearchRequest) -> LookupResult<EnhancedReply> {
        Err(LookupError::Unavailable("no provider configured".into()))
    }
}

/// Lookup backed by a text-completion transport.
///
/// The transport receives a full prompt and returns the provider's raw reply.
pub struct PromptedLookup<F> {
    transport: F,
    include_examples: bool,
}

impl<F> PromptedLookup<F>
where
    F: Fn(&str) -> Result<String, String> + Send + Sync,
{
    pub fn new(transport: F) -> Self {
        Self {
            transport,
            include_examples: true,
        }
    }

    pub fn without_examples(mut self) -> Self {
        self.include_examples = false;
        self
    }
}

impl<F> EnhancedLookup for PromptedLookup<F>
where
    F: Fn(&str) -> Result<String, String> + Send + Sync,
{
    fn lookup(&self, kind: CatalogKind, request: &SearchRequest) -> LookupResult<EnhancedReply> {
        let prompt = build_full_prompt(
            kind,
            &request.text,
            request.context.as_ref(),
            self.include_examples,
        );
        let reply = (self.transport)(&prompt).map_err(LookupError::Provider)?;
        parse_enhanced_response(&reply)
    }
}

/// Keyword table for the mock lookup: (keyword, proposed names)
const MEDICATION_KEYWORDS: &[(&str, &[&str])] = &[
    ("tylenol", &["Paracetamol"]),
    ("fever", &["Paracetamol", "Ibuprofen"]),
    ("pain", &["Ibuprofen", "Paracetamol"]),
    ("infection", &["Amoxicillin", "Azithromycin"]),
    ("blood pressure", &["Amlodipine", "Losartan"]),
    ("hypertension", &["Amlodipine", "Losartan"]),
    ("diabetes", &["Metformin"]),
    ("reflux", &["Omeprazole", "Pantoprazole"]),
    ("asthma", &["Salbutamol"]),
    ("allergy", &["Cetirizine"]),
    ("nausea", &["Ondansetron"]),
];

const TEST_KEYWORDS: &[(&str, &[&str])] = &[
    ("sugar", &["Fasting Blood Sugar", "Glycated Hemoglobin"]),
    ("diabetes", &["Fasting Blood Sugar", "Glycated Hemoglobin"]),
    ("cholesterol", &["Lipid Profile"]),
    ("chest pain", &["Electrocardiogram", "Lipid Profile"]),
    ("cough", &["Chest X-Ray", "Complete Blood Count"]),
    ("thyroid", &["Thyroid Profile"]),
    ("liver", &["Liver Function Test"]),
    ("kidney", &["Kidney Function Test", "Urine Routine"]),
];

/// Mock lookup for testing without a provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockEnhancedLookup;

impl MockEnhancedLookup {
    /// Propose names using simple keyword matching on the query and diagnosis.
    pub fn suggest(
        kind: CatalogKind,
        query: &str,
        context: Option<&ClinicalContext>,
    ) -> EnhancedReply {
        let mut haystack = query.to_lowercase();
        if let Some(diagnosis) = context.and_then(|c| c.diagnosis.as_deref()) {
            haystack.push(' ');
            haystack.push_str(&diagnosis.to_lowercase());
        }

        let patterns = match kind {
            CatalogKind::Medication => MEDICATION_KEYWORDS,
            CatalogKind::Test => TEST_KEYWORDS,
        };

        let mut suggestions: Vec<String> = Vec::new();
        for (keyword, names) in patterns {
            if haystack.contains(*keyword) {
                for name in names.iter() {
                    if !suggestions.iter().any(|s| s.as_str() == *name) {
                        suggestions.push(name.to_string());
                    }
                }
            }
        }

        EnhancedReply { suggestions }
    }
}

impl EnhancedLookup for MockEnhancedLookup {
    fn lookup(&self, kind: CatalogKind, request: &SearchRequest) -> LookupResult<EnhancedReply> {
        Ok(Self::suggest(kind, &request.text, request.context.as_ref()))
    }
}

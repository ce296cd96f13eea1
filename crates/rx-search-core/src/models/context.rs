//! Per-request search and patient context.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Optional patient attributes supplied with a search.
///
/// Only the suggestion shaper reads this; it never changes which records
/// match. Fields that fail to parse (e.g., `"age": "unknown"`) deserialize as
/// absent instead of rejecting the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicalContext {
    /// Age in whole years. Fractional ages are treated as malformed.
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<u32>,
    /// Known allergies, free text
    #[serde(default, deserialize_with = "lenient_allergies")]
    pub allergies: BTreeSet<String>,
    /// Working diagnosis, free text
    #[serde(default, deserialize_with = "lenient_text")]
    pub diagnosis: Option<String>,
    /// Body weight in kilograms
    #[serde(default, alias = "weight", deserialize_with = "lenient_weight")]
    pub weight_kg: Option<f64>,
}

impl ClinicalContext {
    pub fn with_age(age: u32) -> Self {
        Self {
            age: Some(age),
            ..Self::default()
        }
    }

    /// Add an allergy; blank entries are ignored.
    pub fn add_allergy(&mut self, allergy: impl AsRef<str>) {
        let trimmed = allergy.as_ref().trim();
        if !trimmed.is_empty() {
            self.allergies.insert(trimmed.to_string());
        }
    }

    /// Build a context from an arbitrary JSON value.
    ///
    /// Anything that is not a JSON object yields `None`.
    pub fn from_json_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Check if no field carries information.
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.allergies.is_empty()
            && self.diagnosis.is_none()
            && self.weight_kg.is_none()
    }
}

/// Age band label attached to medication suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBand {
    Pediatric,
    Geriatric,
}

impl AgeBand {
    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::Pediatric => "pediatric",
            AgeBand::Geriatric => "geriatric",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single search call: query text, optional patient context, optional limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchContext {
    pub query: String,
    #[serde(default)]
    pub clinical_context: Option<ClinicalContext>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchContext {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            clinical_context: None,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_context(mut self, context: ClinicalContext) -> Self {
        self.clinical_context = Some(context);
        self
    }
}

/// Read a number from either a JSON number or a numeric string.
fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|age| *age >= 0.0 && *age <= f64::from(u32::MAX) && age.fract() == 0.0)
        .map(|age| age as u32))
}

fn lenient_weight<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|weight| *weight > 0.0))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Accepts an array of strings or a comma-separated string.
fn lenient_allergies<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let entries: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    Ok(entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect())
}

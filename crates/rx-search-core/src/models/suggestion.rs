//! Suggestion models produced by the search pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AgeBand, MedicationRecord, TestRecord};

/// How a query matched a record, weakest first.
///
/// The derived ordering is the ranking order: `Exact` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStrength {
    /// Empty query: every record is a candidate
    Neutral,
    /// A category tag contains the query
    CategoryPartial,
    /// An alias contains the query
    AliasPartial,
    /// The name contains the query
    NamePartial,
    /// The name equals the query (case-insensitive)
    Exact,
}

impl MatchStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrength::Neutral => "NEUTRAL",
            MatchStrength::CategoryPartial => "CATEGORY_PARTIAL",
            MatchStrength::AliasPartial => "ALIAS_PARTIAL",
            MatchStrength::NamePartial => "NAME_PARTIAL",
            MatchStrength::Exact => "EXACT",
        }
    }
}

impl fmt::Display for MatchStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shaped medication suggestion.
///
/// Borrows the matched record and its alternatives from the catalog snapshot
/// it was produced from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MedicationSuggestion<'a> {
    pub record: &'a MedicationRecord,
    pub match_strength: MatchStrength,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub reasoning: String,
    pub dosage_suggestion: String,
    pub frequency_suggestion: String,
    pub precautions: Vec<String>,
    /// Other records sharing a category, most popular first
    pub alternatives: Vec<&'a MedicationRecord>,
    pub age_band: Option<AgeBand>,
    /// Context allergies that overlap this record
    pub allergy_conflicts: Vec<String>,
}

impl MedicationSuggestion<'_> {
    /// First alias, reported as the generic name.
    pub fn generic_name(&self) -> Option<&str> {
        self.record.aliases.first().map(String::as_str)
    }

    pub fn has_risk_flags(&self) -> bool {
        self.age_band.is_some() || !self.allergy_conflicts.is_empty()
    }
}

/// A shaped diagnostic test suggestion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TestSuggestion<'a> {
    pub record: &'a TestRecord,
    pub match_strength: MatchStrength,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub reasoning: String,
    pub preparation_summary: String,
}

impl TestSuggestion<'_> {
    pub fn fasting_required(&self) -> bool {
        self.record.attributes.fasting_required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_ordering() {
        assert!(MatchStrength::Exact > MatchStrength::NamePartial);
        assert!(MatchStrength::NamePartial > MatchStrength::AliasPartial);
        assert!(MatchStrength::AliasPartial > MatchStrength::CategoryPartial);
        assert!(MatchStrength::CategoryPartial > MatchStrength::Neutral);
    }

    #[test]
    fn test_strength_serializes_screaming_snake() {
        let json = serde_json::to_string(&MatchStrength::AliasPartial).unwrap();
        assert_eq!(json, "\"ALIAS_PARTIAL\"");
        assert_eq!(MatchStrength::CategoryPartial.to_string(), "CATEGORY_PARTIAL");
    }
}

//! Clinical context policy.
//!
//! Turns optional patient context into labels and a confidence multiplier
//! for medication suggestions. These are review prompts for the prescriber,
//! not dose calculations.

use crate::catalog::RecordKeys;
use crate::config::SearchConfig;
use crate::models::{AgeBand, ClinicalContext};

/// Outcome of applying patient context to one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextAssessment {
    pub age_band: Option<AgeBand>,
    /// Reported allergies overlapping the record, as the caller wrote them
    pub allergy_conflicts: Vec<String>,
    /// Product of all applicable multipliers; 1.0 when nothing applies
    pub multiplier: f64,
}

impl ContextAssessment {
    pub fn neutral() -> Self {
        Self {
            age_band: None,
            allergy_conflicts: Vec::new(),
            multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextPolicy {
    pediatric_age_below: u32,
    geriatric_age_above: u32,
    age_multiplier: f64,
    allergy_multiplier: f64,
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl ContextPolicy {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            pediatric_age_below: config.pediatric_age_below,
            geriatric_age_above: config.geriatric_age_above,
            age_multiplier: config.age_multiplier,
            allergy_multiplier: config.allergy_multiplier,
        }
    }

    /// Age band for a context, if its age is known and outside the adult range.
    pub fn age_band(&self, context: Option<&ClinicalContext>) -> Option<AgeBand> {
        let age = context?.age?;
        if age < self.pediatric_age_below {
            Some(AgeBand::Pediatric)
        } else if age > self.geriatric_age_above {
            Some(AgeBand::Geriatric)
        } else {
            None
        }
    }

    /// Reported allergies that overlap the record's name, aliases, or
    /// categories (substring either way for the name).
    pub fn allergy_conflicts(
        &self,
        keys: &RecordKeys,
        context: Option<&ClinicalContext>,
    ) -> Vec<String> {
        let Some(context) = context else {
            return Vec::new();
        };

        context
            .allergies
            .iter()
            .filter(|allergy| {
                let needle = allergy.trim().to_lowercase();
                !needle.is_empty()
                    && (keys.name.contains(&needle)
                        || needle.contains(&keys.name)
                        || keys.aliases.iter().any(|a| a.contains(&needle))
                        || keys.categories.iter().any(|c| c.contains(&needle)))
            })
            .cloned()
            .collect()
    }

    /// Full assessment of a medication record against a context.
    pub fn assess(
        &self,
        keys: &RecordKeys,
        context: Option<&ClinicalContext>,
    ) -> ContextAssessment {
        let age_band = self.age_band(context);
        let allergy_conflicts = self.allergy_conflicts(keys, context);

        let mut multiplier = 1.0;
        if age_band.is_some() {
            multiplier *= self.age_multiplier;
        }
        if !allergy_conflicts.is_empty() {
            multiplier *= self.allergy_multiplier;
        }

        ContextAssessment {
            age_band,
            allergy_conflicts,
            multiplier,
        }
    }
}

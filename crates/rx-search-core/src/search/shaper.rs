//! Suggestion shaping.
//!
//! Turns ranked candidates into suggestions: confidence from the match
//! strength (adjusted by patient context for medications), human-readable
//! reasoning, and display hints derived from the record's attributes.

use crate::catalog::MedicationStore;
use crate::config::{ConfidenceTable, SearchConfig};
use crate::models::{
    AgeBand, ClinicalContext, MatchStrength, MedicationAttributes, MedicationRecord,
    MedicationSuggestion, TestAttributes, TestSuggestion,
};

use super::policy::{ContextAssessment, ContextPolicy};
use super::{Candidate, NormalizedQuery};

const DOSAGE_FALLBACK: &str = "See product labeling";
const FREQUENCY_FALLBACK: &str = "As directed";
const NO_PREPARATION: &str = "No special preparation";
const SUMMARY_STEPS: usize = 2;

/// Builds suggestions from ranked candidates.
#[derive(Debug, Clone)]
pub struct SuggestionShaper {
    confidence: ConfidenceTable,
    policy: ContextPolicy,
    max_alternatives: usize,
    max_precautions: usize,
}

impl Default for SuggestionShaper {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl SuggestionShaper {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            confidence: config.confidence.clone(),
            policy: ContextPolicy::from_config(config),
            max_alternatives: config.max_alternatives,
            max_precautions: config.max_precautions,
        }
    }

    pub fn policy(&self) -> &ContextPolicy {
        &self.policy
    }

    /// Shape one medication candidate.
    ///
    /// `store` must be the snapshot the candidate was drawn from; it supplies
    /// the alternatives.
    pub fn shape_medication<'a>(
        &self,
        store: &'a MedicationStore,
        candidate: &Candidate<'a, MedicationAttributes>,
        query: &NormalizedQuery,
        context: Option<&ClinicalContext>,
    ) -> MedicationSuggestion<'a> {
        let record = candidate.record;
        let assessment = self.policy.assess(candidate.keys, context);
        let base = self.confidence.for_strength(candidate.strength);

        MedicationSuggestion {
            record,
            match_strength: candidate.strength,
            confidence: finalize_confidence(base * assessment.multiplier),
            reasoning: medication_reasoning(candidate, query, &assessment),
            dosage_suggestion: dosage_suggestion(&record.attributes, assessment.age_band),
            frequency_suggestion: record
                .attributes
                .frequency
                .clone()
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| FREQUENCY_FALLBACK.to_string()),
            precautions: self.precautions(record, &assessment.allergy_conflicts),
            alternatives: self.alternatives(store, candidate),
            age_band: assessment.age_band,
            allergy_conflicts: assessment.allergy_conflicts,
        }
    }

    /// Shape one test candidate. Patient context never changes test results.
    pub fn shape_test<'a>(
        &self,
        candidate: &Candidate<'a, TestAttributes>,
        query: &NormalizedQuery,
    ) -> TestSuggestion<'a> {
        let base = self.confidence.for_strength(candidate.strength);

        TestSuggestion {
            record: candidate.record,
            match_strength: candidate.strength,
            confidence: finalize_confidence(base),
            reasoning: match_reasoning(candidate, query)
                .unwrap_or_else(|| "Commonly ordered".to_string()),
            preparation_summary: preparation_summary(&candidate.record.attributes),
        }
    }

    fn precautions(&self, record: &MedicationRecord, allergy_conflicts: &[String]) -> Vec<String> {
        allergy_conflicts
            .iter()
            .map(|allergy| format!("Reported allergy: {}", allergy))
            .chain(record.attributes.contraindications.iter().cloned())
            .take(self.max_precautions)
            .collect()
    }

    fn alternatives<'a>(
        &self,
        store: &'a MedicationStore,
        candidate: &Candidate<'a, MedicationAttributes>,
    ) -> Vec<&'a MedicationRecord> {
        let mut related: Vec<_> = store
            .entries()
            .filter(|entry| entry.position != candidate.position)
            .filter(|entry| {
                entry
                    .keys
                    .categories
                    .iter()
                    .any(|c| candidate.keys.categories.contains(c))
            })
            .collect();

        related.sort_by(|a, b| {
            b.record
                .popularity_score
                .total_cmp(&a.record.popularity_score)
                .then_with(|| a.position.cmp(&b.position))
        });

        related
            .into_iter()
            .take(self.max_alternatives)
            .map(|entry| entry.record)
            .collect()
    }
}

/// Clamp to [0, 1] and round to three decimals so output is stable.
fn finalize_confidence(value: f64) -> f64 {
    (value.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
}

/// Why a candidate matched, in terms of the record's own display text.
/// `None` for neutral candidates.
fn match_reasoning<A>(candidate: &Candidate<'_, A>, query: &NormalizedQuery) -> Option<String> {
    let text = query.as_text()?;
    let record = candidate.record;
    let keys = candidate.keys;

    let reason = match candidate.strength {
        MatchStrength::Exact => format!("Exact name match for '{}'", text),
        MatchStrength::NamePartial => format!("Name contains '{}'", text),
        MatchStrength::AliasPartial => {
            let alias = keys
                .aliases
                .iter()
                .position(|a| a.contains(text))
                .and_then(|i| record.aliases.get(i))
                .map(String::as_str)
                .unwrap_or(text);
            format!("Also known as {}", alias)
        }
        MatchStrength::CategoryPartial => {
            let category = keys
                .categories
                .iter()
                .position(|c| c.contains(text))
                .and_then(|i| record.categories.get(i))
                .map(String::as_str)
                .unwrap_or(text);
            format!("In category {}", category)
        }
        MatchStrength::Neutral => return None,
    };
    Some(reason)
}

fn medication_reasoning(
    candidate: &Candidate<'_, MedicationAttributes>,
    query: &NormalizedQuery,
    assessment: &ContextAssessment,
) -> String {
    let mut reasoning =
        match_reasoning(candidate, query).unwrap_or_else(|| "Commonly prescribed".to_string());

    if let Some(band) = assessment.age_band {
        reasoning.push_str(&format!("; {} patient, review dosing", band));
    }
    if !assessment.allergy_conflicts.is_empty() {
        reasoning.push_str(&format!(
            "; conflicts with reported allergy ({})",
            assessment.allergy_conflicts.join(", ")
        ));
    }
    reasoning
}

/// First strength and dosage form, with the route and any age-band label.
fn dosage_suggestion(attributes: &MedicationAttributes, age_band: Option<AgeBand>) -> String {
    let parts: Vec<&str> = [attributes.strengths.first(), attributes.dosage_forms.first()]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let mut dosage = if parts.is_empty() {
        DOSAGE_FALLBACK.to_string()
    } else {
        parts.join(" ")
    };

    if let Some(route) = attributes.route.as_deref().filter(|r| !r.trim().is_empty()) {
        if !parts.is_empty() {
            dosage.push_str(&format!(" ({})", route.trim()));
        }
    }
    if let Some(band) = age_band {
        dosage.push_str(&format!(" [{} suggestion, confirm dose]", band));
    }
    dosage
}

fn preparation_summary(attributes: &TestAttributes) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if attributes.fasting_required {
        parts.push("Fasting required");
    }
    parts.extend(
        attributes
            .preparation
            .iter()
            .map(|step| step.trim())
            .filter(|step| !step.is_empty())
            .take(SUMMARY_STEPS),
    );

    if parts.is_empty() {
        NO_PREPARATION.to_string()
    } else {
        parts.join(". ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TestStore;
    use crate::models::{TestRecord, TestType};
    use crate::search::{match_candidates, rank};

    fn med(id: &str, name: &str, categories: &[&str], popularity: f64) -> MedicationRecord {
        let mut record = MedicationRecord::new(id, name, MedicationAttributes::default());
        record.categories = categories.iter().map(|c| c.to_string()).collect();
        record.popularity_score = popularity;
        record
    }

    fn setup_store() -> MedicationStore {
        let mut m1 = med("m1", "Amoxicillin", &["Antibiotic", "Penicillin"], 90.0);
        m1.aliases = vec!["Amoxil".into()];
        m1.attributes = MedicationAttributes {
            dosage_forms: vec!["Capsule".into(), "Suspension".into()],
            strengths: vec!["500mg".into(), "250mg".into()],
            contraindications: vec![
                "Penicillin allergy".into(),
                "Mononucleosis".into(),
                "Severe renal impairment".into(),
                "Phenylketonuria".into(),
            ],
            route: Some("Oral".into()),
            frequency: Some("Three times daily".into()),
            interactions: vec![],
        };
        let m2 = med("m2", "Amoxicillin-Clavulanate", &["Antibiotic"], 70.0);
        let m3 = med("m3", "Azithromycin", &["antibiotic"], 80.0);
        let m4 = med("m4", "Ciprofloxacin", &["Antibiotic"], 75.0);
        let m5 = med("m5", "Cefalexin", &["Antibiotic"], 75.0);
        let m6 = med("m6", "Ibuprofen", &["NSAID"], 95.0);
        MedicationStore::new(vec![m1, m2, m3, m4, m5, m6]).unwrap()
    }

    fn shape_first<'a>(
        store: &'a MedicationStore,
        query: &str,
        context: Option<&ClinicalContext>,
    ) -> MedicationSuggestion<'a> {
        let shaper = SuggestionShaper::default();
        let query = NormalizedQuery::parse(query);
        let ranked = rank(match_candidates(store, &query), 1);
        shaper.shape_medication(store, &ranked[0], &query, context)
    }

    #[test]
    fn test_exact_match_medication() {
        let store = setup_store();
        let suggestion = shape_first(&store, "amoxicillin", None);

        assert_eq!(suggestion.record.id, "m1");
        assert_eq!(suggestion.match_strength, MatchStrength::Exact);
        assert_eq!(suggestion.confidence, 0.95);
        assert_eq!(suggestion.reasoning, "Exact name match for 'amoxicillin'");
        assert_eq!(suggestion.dosage_suggestion, "500mg Capsule (Oral)");
        assert_eq!(suggestion.frequency_suggestion, "Three times daily");
        assert_eq!(
            suggestion.precautions,
            vec!["Penicillin allergy", "Mononucleosis", "Severe renal impairment"]
        );
        assert_eq!(suggestion.generic_name(), Some("Amoxil"));
        assert!(!suggestion.has_risk_flags());
    }

    #[test]
    fn test_alternatives_share_category_by_popularity() {
        let store = setup_store();
        let suggestion = shape_first(&store, "amoxicillin", None);

        // m4 and m5 tie on popularity; catalog order decides
        let ids: Vec<&str> = suggestion.alternatives.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m3", "m4", "m5"]);
    }

    #[test]
    fn test_alias_reasoning_uses_display_alias() {
        let store = setup_store();
        let suggestion = shape_first(&store, "AMOXIL", None);

        assert_eq!(suggestion.match_strength, MatchStrength::AliasPartial);
        assert_eq!(suggestion.reasoning, "Also known as Amoxil");
        assert_eq!(suggestion.confidence, 0.7);
    }

    #[test]
    fn test_pediatric_context_lowers_confidence() {
        let store = setup_store();
        let ctx = ClinicalContext::with_age(5);
        let suggestion = shape_first(&store, "amoxicillin", Some(&ctx));

        assert_eq!(suggestion.age_band, Some(AgeBand::Pediatric));
        assert_eq!(suggestion.confidence, 0.855);
        assert!(suggestion.reasoning.contains("pediatric patient"));
        assert!(suggestion.dosage_suggestion.ends_with("[pediatric suggestion, confirm dose]"));
    }

    #[test]
    fn test_allergy_flag_goes_first_in_precautions() {
        let store = setup_store();
        let mut ctx = ClinicalContext::default();
        ctx.add_allergy("Penicillin");
        let suggestion = shape_first(&store, "amoxicillin", Some(&ctx));

        assert_eq!(suggestion.allergy_conflicts, vec!["Penicillin"]);
        assert_eq!(suggestion.confidence, 0.475);
        assert_eq!(
            suggestion.precautions,
            vec!["Reported allergy: Penicillin", "Penicillin allergy", "Mononucleosis"]
        );
        assert!(suggestion.has_risk_flags());
    }

    #[test]
    fn test_bare_record_uses_fallback_wording() {
        let store = setup_store();
        let suggestion = shape_first(&store, "ibuprofen", None);

        assert_eq!(suggestion.dosage_suggestion, "See product labeling");
        assert_eq!(suggestion.frequency_suggestion, "As directed");
        assert!(suggestion.precautions.is_empty());
        assert!(suggestion.alternatives.is_empty());
    }

    #[test]
    fn test_neutral_reasoning() {
        let store = setup_store();
        let suggestion = shape_first(&store, "", None);

        assert_eq!(suggestion.record.id, "m6");
        assert_eq!(suggestion.match_strength, MatchStrength::Neutral);
        assert_eq!(suggestion.reasoning, "Commonly prescribed");
        assert_eq!(suggestion.confidence, 0.5);
    }

    #[test]
    fn test_shape_test_ignores_context_and_summarizes_preparation() {
        let mut fbs = TestRecord::new(
            "t1",
            "Fasting Blood Sugar",
            TestAttributes {
                preparation: vec![
                    "Fast 8-10 hours".into(),
                    "Water allowed".into(),
                    "Bring medication list".into(),
                ],
                fasting_required: true,
                ..TestAttributes::new(TestType::Laboratory)
            },
        );
        fbs.categories = vec!["Biochemistry".into()];
        let mut cbc = TestRecord::new(
            "t2",
            "Complete Blood Count",
            TestAttributes::new(TestType::Laboratory),
        );
        cbc.categories = vec!["Hematology".into()];
        let store = TestStore::new(vec![fbs, cbc]).unwrap();

        let shaper = SuggestionShaper::default();
        let query = NormalizedQuery::parse("blood");
        let ranked = rank(match_candidates(&store, &query), 10);
        let shaped: Vec<_> = ranked.iter().map(|c| shaper.shape_test(c, &query)).collect();

        assert_eq!(
            shaped[0].preparation_summary,
            "Fasting required. Fast 8-10 hours. Water allowed"
        );
        assert!(shaped[0].fasting_required());
        assert_eq!(shaped[0].confidence, 0.8);
        assert_eq!(shaped[1].preparation_summary, "No special preparation");
        assert!(!shaped[1].fasting_required());
    }

    #[test]
    fn test_finalize_confidence() {
        assert_eq!(finalize_confidence(1.7), 1.0);
        assert_eq!(finalize_confidence(-0.2), 0.0);
        assert_eq!(finalize_confidence(0.12345), 0.123);
    }
}

//! Prompts for the enhanced (model-backed) catalog lookup.
//!
//! The provider only proposes names; every name is mapped back to the local
//! catalog and shaped there, so nothing it says reaches a user unchecked.

use rx_search_core::models::{CatalogKind, ClinicalContext};

/// System prompt for the lookup assistant.
pub const SYSTEM_PROMPT: &str = r#"You are a clinical search assistant for a prescription management application.

Given a partial search query and optional patient context, propose the catalog entries a prescriber is most likely looking for.

Rules:
- Propose names only (generic medication names or standard diagnostic test names)
- Prefer generic names over brand names (e.g., "Paracetamol" for "Tylenol")
- Never propose doses, frequencies, or treatment plans
- Return at most 10 names, most likely first

Output JSON with a "suggestions" array of names."#;

/// User prompt for one lookup.
pub fn make_lookup_prompt(
    kind: CatalogKind,
    query: &str,
    context: Option<&ClinicalContext>,
) -> String {
    let subject = match kind {
        CatalogKind::Medication => "medications",
        CatalogKind::Test => "diagnostic tests",
    };

    let mut prompt = format!(
        r#"Suggest {} matching this search:

"{}""#,
        subject, query
    );

    if let Some(context) = context {
        let mut facts = Vec::new();
        if let Some(age) = context.age {
            facts.push(format!("age {}", age));
        }
        if let Some(diagnosis) = &context.diagnosis {
            facts.push(format!("diagnosis {}", diagnosis));
        }
        if !context.allergies.is_empty() {
            let allergies: Vec<&str> = context.allergies.iter().map(String::as_str).collect();
            facts.push(format!("allergies {}", allergies.join(", ")));
        }
        if !facts.is_empty() {
            prompt.push_str(&format!("\n\nPatient: {}", facts.join("; ")));
        }
    }

    prompt.push_str("\n\nReturn a JSON object with a \"suggestions\" array of names.");
    prompt
}

/// Few-shot examples: (kind, query, expected reply).
pub const FEW_SHOT_EXAMPLES: &[(CatalogKind, &str, &str)] = &[
    (
        CatalogKind::Medication,
        "tylenol",
        r#"{"suggestions":["Paracetamol"]}"#,
    ),
    (
        CatalogKind::Medication,
        "stomach acid",
        r#"{"suggestions":["Omeprazole","Pantoprazole"]}"#,
    ),
    (
        CatalogKind::Test,
        "sugar",
        r#"{"suggestions":["Fasting Blood Sugar","Glycated Hemoglobin"]}"#,
    ),
];

/// Build a complete prompt with system context and few-shot examples.
pub fn build_full_prompt(
    kind: CatalogKind,
    query: &str,
    context: Option<&ClinicalContext>,
    include_examples: bool,
) -> String {
    let mut prompt = String::new();

    // System context
    prompt.push_str("<|system|>\n");
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n<|end|>\n");

    // Few-shot examples for the same catalog
    if include_examples {
        for (example_kind, input, output) in FEW_SHOT_EXAMPLES {
            if *example_kind != kind {
                continue;
            }
            prompt.push_str("<|user|>\n");
            prompt.push_str(&make_lookup_prompt(kind, input, None));
            prompt.push_str("\n<|end|>\n");
            prompt.push_str("<|assistant|>\n");
            prompt.push_str(output);
            prompt.push_str("\n<|end|>\n");
        }
    }

    // Actual request
    prompt.push_str("<|user|>\n");
    prompt.push_str(&make_lookup_prompt(kind, query, context));
    prompt.push_str("\n<|end|>\n");
    prompt.push_str("<|assistant|>\n");

    prompt
}

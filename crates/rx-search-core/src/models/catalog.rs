//! Catalog record models.

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Which catalog a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Medication,
    Test,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Medication => "medication",
            CatalogKind::Test => "test",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog-specific facts carried by a [`CatalogRecord`].
pub trait RecordAttributes:
    fmt::Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The catalog this attribute set describes.
    const KIND: CatalogKind;
}

/// A single entry in a static search catalog.
///
/// Medications and diagnostic tests share this shape and differ only in
/// their `attributes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord<A> {
    /// Stable identifier, unique within its catalog
    pub id: String,
    /// Canonical display name
    pub name: String,
    /// Alternate, generic, or brand names (matching only)
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Category tags (e.g., ["Antibiotic", "Penicillin"])
    pub categories: Vec<String>,
    /// Catalog-specific facts
    pub attributes: A,
    /// Higher means more commonly used; breaks ranking ties
    #[serde(default)]
    pub popularity_score: f64,
}

pub type MedicationRecord = CatalogRecord<MedicationAttributes>;
pub type TestRecord = CatalogRecord<TestAttributes>;

impl<A> CatalogRecord<A> {
    /// Create a new record with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>, attributes: A) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            aliases: Vec::new(),
            categories: Vec::new(),
            attributes,
            popularity_score: 0.0,
        }
    }

    /// First category tag, used as the display category.
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Check if this record shares at least one category with another
    /// (case-insensitive).
    pub fn shares_category_with<B>(&self, other: &CatalogRecord<B>) -> bool {
        self.categories.iter().any(|mine| {
            let mine = mine.to_lowercase();
            other
                .categories
                .iter()
                .any(|theirs| theirs.to_lowercase() == mine)
        })
    }
}

/// Medication-specific attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicationAttributes {
    /// Available dosage forms (e.g., ["Tablet", "Syrup"])
    #[serde(default)]
    pub dosage_forms: Vec<String>,
    /// Available strengths (e.g., ["250mg", "500mg"])
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Contraindications, most important first
    #[serde(default)]
    pub contraindications: Vec<String>,
    /// Usual route of administration
    #[serde(default)]
    pub route: Option<String>,
    /// Usual frequency wording (e.g., "Twice daily")
    #[serde(default)]
    pub frequency: Option<String>,
    /// Notable interacting drugs (display only)
    #[serde(default)]
    pub interactions: Vec<String>,
}

impl RecordAttributes for MedicationAttributes {
    const KIND: CatalogKind = CatalogKind::Medication;
}

/// Kind of diagnostic test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    Laboratory,
    Imaging,
    SpecialTest,
    Procedure,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Laboratory => "Laboratory",
            TestType::Imaging => "Imaging",
            TestType::SpecialTest => "Special Test",
            TestType::Procedure => "Procedure",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic test attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestAttributes {
    pub test_type: TestType,
    /// Patient preparation steps, in order
    #[serde(default)]
    pub preparation: Vec<String>,
    #[serde(default)]
    pub fasting_required: bool,
    /// Specimen (e.g., "Blood (EDTA)", "Urine")
    #[serde(default)]
    pub sample_type: Option<String>,
    /// Typical reporting time (e.g., "Same day")
    #[serde(default)]
    pub turnaround: Option<String>,
}

impl TestAttributes {
    pub fn new(test_type: TestType) -> Self {
        Self {
            test_type,
            preparation: Vec::new(),
            fasting_required: false,
            sample_type: None,
            turnaround: None,
        }
    }
}

impl RecordAttributes for TestAttributes {
    const KIND: CatalogKind = CatalogKind::Test;
}

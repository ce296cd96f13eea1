//! Built-in catalogs bundled with the crate.

use super::{CatalogResult, MedicationStore, TestStore};

const MEDICATIONS_JSON: &str = include_str!("../../data/medications.json");
const TESTS_JSON: &str = include_str!("../../data/tests.json");

/// The bundled medication catalog.
pub fn medications() -> CatalogResult<MedicationStore> {
    MedicationStore::from_json_str(MEDICATIONS_JSON)
}

/// The bundled diagnostic test catalog.
pub fn tests() -> CatalogResult<TestStore> {
    TestStore::from_json_str(TESTS_JSON)
}

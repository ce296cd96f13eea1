//! Immutable catalog store.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::{CatalogError, CatalogResult};
use crate::models::{
    CatalogKind, CatalogRecord, MedicationAttributes, RecordAttributes, TestAttributes,
};

pub type MedicationStore = CatalogStore<MedicationAttributes>;
pub type TestStore = CatalogStore<TestAttributes>;

/// Lower-cased searchable text of one record, computed once at load.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordKeys {
    pub name: String,
    pub aliases: Vec<String>,
    pub categories: Vec<String>,
}

impl RecordKeys {
    fn from_record<A>(record: &CatalogRecord<A>) -> Self {
        Self {
            name: record.name.trim().to_lowercase(),
            aliases: record.aliases.iter().map(|a| a.trim().to_lowercase()).collect(),
            categories: record
                .categories
                .iter()
                .map(|c| c.trim().to_lowercase())
                .collect(),
        }
    }
}

/// A record together with its position in the catalog and its search keys.
#[derive(Debug)]
pub struct CatalogEntry<'a, A> {
    pub position: usize,
    pub record: &'a CatalogRecord<A>,
    pub keys: &'a RecordKeys,
}

impl<A> Clone for CatalogEntry<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for CatalogEntry<'_, A> {}

/// Read-only, insertion-ordered record set.
#[derive(Debug)]
pub struct CatalogStore<A> {
    records: Vec<CatalogRecord<A>>,
    keys: Vec<RecordKeys>,
    index: HashMap<String, usize>,
    fingerprint: String,
}

impl<A: RecordAttributes> CatalogStore<A> {
    /// Validate and index a record set.
    ///
    /// Fails on empty or duplicate ids, empty names, records without
    /// categories, and non-finite popularity scores.
    pub fn new(records: Vec<CatalogRecord<A>>) -> CatalogResult<Self> {
        let mut index = HashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            if record.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(position));
            }
            if record.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(record.id.clone()));
            }
            if record.categories.iter().all(|c| c.trim().is_empty()) {
                return Err(CatalogError::MissingCategories(record.id.clone()));
            }
            if !record.popularity_score.is_finite() {
                return Err(CatalogError::InvalidPopularity(record.id.clone()));
            }
            if index.insert(record.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
        }

        let keys = records.iter().map(RecordKeys::from_record).collect();
        let fingerprint = hash_data(&serde_json::to_vec(&records)?);

        tracing::debug!(
            kind = %A::KIND,
            records = records.len(),
            fingerprint = %fingerprint,
            "Catalog indexed"
        );

        Ok(Self {
            records,
            keys,
            index,
            fingerprint,
        })
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let records: Vec<CatalogRecord<A>> = serde_json::from_str(json)?;
        Self::new(records)
    }

    /// Read a JSON array of records from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::from_json_str(&json)?;
        tracing::info!(
            kind = %A::KIND,
            path = %path.display(),
            records = store.len(),
            "Loaded catalog from file"
        );
        Ok(store)
    }

    pub fn kind(&self) -> CatalogKind {
        A::KIND
    }

    /// Every record, in insertion order.
    pub fn get_all(&self) -> &[CatalogRecord<A>] {
        &self.records
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Option<&CatalogRecord<A>> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    /// Records whose id is in `ids`, in catalog order.
    ///
    /// Unknown ids are skipped; repeated ids yield one record.
    pub fn get_by_ids<I, S>(&self, ids: I) -> Vec<&CatalogRecord<A>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let positions: BTreeSet<usize> = ids
            .into_iter()
            .filter_map(|id| self.index.get(id.as_ref()).copied())
            .collect();

        positions
            .into_iter()
            .map(|position| &self.records[position])
            .collect()
    }

    /// Records whose name contains any of `names` (case-insensitive), in
    /// catalog order, each at most once.
    ///
    /// Blank entries match nothing.
    pub fn get_by_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<&CatalogRecord<A>> {
        let needles: Vec<String> = names
            .iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();

        if needles.is_empty() {
            return Vec::new();
        }

        self.entries()
            .filter(|entry| needles.iter().any(|n| entry.keys.name.contains(n.as_str())))
            .map(|entry| entry.record)
            .collect()
    }

    /// Iterate records with their positions and search keys.
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry<'_, A>> + '_ {
        self.records
            .iter()
            .zip(self.keys.iter())
            .enumerate()
            .map(|(position, (record, keys))| CatalogEntry {
                position,
                record,
                keys,
            })
    }

    /// Entry for a record id.
    pub fn entry(&self, id: &str) -> Option<CatalogEntry<'_, A>> {
        let position = *self.index.get(id)?;
        Some(CatalogEntry {
            position,
            record: &self.records[position],
            keys: &self.keys[position],
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// SHA-256 (hex) of the canonical JSON of all records.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Compute SHA-256 hash of data.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MedicationRecord, TestType};
    use crate::models::TestRecord;
    use std::io::Write;

    fn med(id: &str, name: &str, category: &str, popularity: f64) -> MedicationRecord {
        let mut record = MedicationRecord::new(id, name, MedicationAttributes::default());
        record.categories = vec![category.into()];
        record.popularity_score = popularity;
        record
    }

    fn setup_store() -> MedicationStore {
        let mut m1 = med("m1", "Amoxicillin", "Antibiotic", 90.0);
        m1.aliases = vec!["Amoxil".into()];
        let m2 = med("m2", "Amoxicillin-Clavulanate", "Antibiotic", 70.0);
        let m3 = med("m3", "Ibuprofen", "NSAID", 95.0);
        MedicationStore::new(vec![m1, m2, m3]).unwrap()
    }

    #[test]
    fn test_get_all_preserves_insertion_order() {
        let store = setup_store();
        let ids: Vec<&str> = store.get_all().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.kind(), CatalogKind::Medication);
    }

    #[test]
    fn test_get_by_ids_catalog_order_and_unknown_skipped() {
        let store = setup_store();
        let found = store.get_by_ids(["m3", "missing", "m1", "m3"]);
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);

        assert!(store.get_by_ids(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_get_by_names_substring_dedup() {
        let store = setup_store();

        let found = store.get_by_names(&["AMOX", "clavulanate"]);
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);

        assert!(store.get_by_names(&["", "  "]).is_empty());
        assert!(store.get_by_names(&["paracetamol"]).is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = MedicationStore::new(vec![
            med("m1", "Amoxicillin", "Antibiotic", 1.0),
            med("m1", "Ibuprofen", "NSAID", 1.0),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "m1"));
    }

    #[test]
    fn test_invalid_records_rejected() {
        let result = MedicationStore::new(vec![med("m1", "  ", "Antibiotic", 1.0)]);
        assert!(matches!(result, Err(CatalogError::EmptyName(_))));

        let result = MedicationStore::new(vec![med("", "Amoxicillin", "Antibiotic", 1.0)]);
        assert!(matches!(result, Err(CatalogError::EmptyId(0))));

        let mut no_category = med("m1", "Amoxicillin", "Antibiotic", 1.0);
        no_category.categories.clear();
        let result = MedicationStore::new(vec![no_category]);
        assert!(matches!(result, Err(CatalogError::MissingCategories(_))));

        let result = MedicationStore::new(vec![med("m1", "Amoxicillin", "Antibiotic", f64::NAN)]);
        assert!(matches!(result, Err(CatalogError::InvalidPopularity(_))));
    }

    #[test]
    fn test_fingerprint_stable_and_content_sensitive() {
        let a = setup_store();
        let b = setup_store();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let c = MedicationStore::new(vec![med("m1", "Amoxicillin", "Antibiotic", 91.0)]).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_entry_keys_lowercased() {
        let store = setup_store();
        let entry = store.entry("m1").unwrap();
        assert_eq!(entry.position, 0);
        assert_eq!(entry.keys.name, "amoxicillin");
        assert_eq!(entry.keys.aliases, vec!["amoxil"]);
        assert_eq!(entry.keys.categories, vec!["antibiotic"]);
        assert!(store.entry("zzz").is_none());
    }

    #[test]
    fn test_from_path_and_json_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "t1", "name": "Lipid Profile", "categories": ["Biochemistry"],
                 "attributes": {{"test_type": "Laboratory", "fasting_required": true}},
                 "popularity_score": 5}}]"#
        )
        .unwrap();

        let store = TestStore::from_path(file.path()).unwrap();
        let record: &TestRecord = store.get("t1").unwrap();
        assert_eq!(record.attributes.test_type, TestType::Laboratory);
        assert!(record.attributes.fasting_required);

        assert!(matches!(TestStore::from_json_str("not json"), Err(CatalogError::Json(_))));
        assert!(matches!(
            TestStore::from_path("/nonexistent/tests.json"),
            Err(CatalogError::Io { .. })
        ));
    }

    #[test]
    fn test_hash_data() {
        assert_eq!(
            hash_data(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

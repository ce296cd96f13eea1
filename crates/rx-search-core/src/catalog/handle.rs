//! Swappable shared catalog.

use std::sync::{Arc, PoisonError, RwLock};

use super::CatalogStore;
use crate::models::RecordAttributes;

/// Process-wide holder of the current catalog snapshot.
///
/// Readers clone the `Arc` and drop the lock immediately, so a swap never
/// blocks on a running search and a running search never sees a partially
/// replaced catalog.
#[derive(Debug)]
pub struct CatalogHandle<A> {
    current: RwLock<Arc<CatalogStore<A>>>,
}

impl<A: RecordAttributes> CatalogHandle<A> {
    pub fn new(store: CatalogStore<A>) -> Self {
        tracing::info!(
            kind = %A::KIND,
            records = store.len(),
            fingerprint = %store.fingerprint(),
            "Catalog loaded"
        );
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CatalogStore<A>> {
        // The guarded value is only ever replaced whole, so a poisoned lock
        // still holds a consistent snapshot.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Install a new, already validated store. Returns the previous snapshot.
    pub fn replace(&self, store: CatalogStore<A>) -> Arc<CatalogStore<A>> {
        let next = Arc::new(store);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, Arc::clone(&next));
        drop(guard);

        tracing::info!(
            kind = %A::KIND,
            records = next.len(),
            previous = %previous.fingerprint(),
            fingerprint = %next.fingerprint(),
            "Catalog replaced"
        );
        previous
    }

    pub fn fingerprint(&self) -> String {
        self.snapshot().fingerprint().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MedicationAttributes, MedicationRecord};
    use crate::catalog::MedicationStore;

    fn store_with(names: &[&str]) -> MedicationStore {
        let records = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut record =
                    MedicationRecord::new(format!("m{i}"), *name, MedicationAttributes::default());
                record.categories = vec!["General".into()];
                record
            })
            .collect();
        MedicationStore::new(records).unwrap()
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let handle = CatalogHandle::new(store_with(&["Aspirin"]));
        let before = handle.snapshot();

        let previous = handle.replace(store_with(&["Ibuprofen", "Paracetamol"]));

        assert_eq!(before.len(), 1);
        assert_eq!(before.get_all()[0].name, "Aspirin");
        assert_eq!(previous.fingerprint(), before.fingerprint());
        assert_eq!(handle.snapshot().len(), 2);
        assert_ne!(handle.fingerprint(), before.fingerprint());
    }

    #[test]
    fn test_concurrent_readers() {
        let handle = Arc::new(CatalogHandle::new(store_with(&["Aspirin", "Ibuprofen"])));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let len = handle.snapshot().len();
                        assert!(len == 2 || len == 3);
                    }
                })
            })
            .collect();

        handle.replace(store_with(&["Aspirin", "Ibuprofen", "Naproxen"]));

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(handle.snapshot().len(), 3);
    }
}

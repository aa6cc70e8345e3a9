//! Per-document mutex registry (spec §4.5, §5): guarantees at-most-one
//! concurrent extraction per document id. The registry grows monotonically
//! for the lifetime of the process; entries are never evicted.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct DocumentLockRegistry {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl DocumentLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `document_id`, creating it on first access.
    pub fn lock_for(&self, document_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(document_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn same_document_id_shares_one_lock() {
        let registry = DocumentLockRegistry::new();
        let id = Uuid::new_v4();
        let a = registry.lock_for(id);
        let b = registry.lock_for(id);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn concurrent_extractions_on_same_document_serialize() {
        let registry = Arc::new(DocumentLockRegistry::new());
        let id = Uuid::new_v4();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..3 {
            let registry = registry.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let lock = registry.lock_for(id);
                let _guard = lock.lock().await;
                order.lock().await.push(i);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(order.lock().await.len(), 3);
    }
}

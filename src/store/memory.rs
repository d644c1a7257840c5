//! In-process Content Store.
//!
//! Used for local development (`store.backend = "memory"`) and throughout the
//! test suite. Ids are random UUIDs, like the generated ids of the hosted
//! store. Reads and writes can be switched to fail so callers can exercise
//! their failure paths.

use super::{Collection, ContentStore, Document, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Document>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `fetch`/`fetch_all` fail with a 503.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `insert`/`replace`/`remove` fail with a 503.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of trait calls made so far, reads included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of documents currently in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_readable(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                status: 503,
                message: "reads disabled".to_string(),
            });
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                status: 503,
                message: "writes disabled".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert(&self, collection: Collection, fields: Document) -> Result<String, StoreError> {
        self.record_call();
        self.check_writable()?;
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn fetch(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.record_call();
        self.check_readable()?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn fetch_all(
        &self,
        collection: Collection,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        self.record_call();
        self.check_readable()?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.record_call();
        self.check_writable()?;
        let mut collections = self.collections.write().await;
        match collections.get_mut(&collection).and_then(|docs| docs.get_mut(id)) {
            Some(existing) => {
                *existing = fields;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            }),
        }
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.record_call();
        self.check_writable()?;
        if let Some(docs) = self.collections.write().await.get_mut(&collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldValue;

    fn doc(name: &str) -> Document {
        let mut d = Document::new();
        d.insert("name".to_string(), FieldValue::from(name));
        d
    }

    #[tokio::test]
    async fn insert_then_fetch() {
        let store = MemoryStore::new();
        let id = store.insert(Collection::Dishes, doc("Suya")).await.unwrap();
        let fetched = store.fetch(Collection::Dishes, &id).await.unwrap();
        assert_eq!(fetched, Some(doc("Suya")));
    }

    #[tokio::test]
    async fn collections_are_separate() {
        let store = MemoryStore::new();
        let id = store.insert(Collection::Dishes, doc("Suya")).await.unwrap();
        assert_eq!(store.fetch(Collection::Posts, &id).await.unwrap(), None);
        assert_eq!(store.len(Collection::Posts).await, 0);
        assert_eq!(store.len(Collection::Dishes).await, 1);
    }

    #[tokio::test]
    async fn identical_inserts_create_two_documents() {
        let store = MemoryStore::new();
        let a = store.insert(Collection::Categories, doc("Grills")).await.unwrap();
        let b = store.insert(Collection::Categories, doc("Grills")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.fetch_all(Collection::Categories).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn replace_overwrites_every_field() {
        let store = MemoryStore::new();
        let mut original = doc("Suya");
        original.insert("orderLink".to_string(), "https://example.com".into());
        let id = store.insert(Collection::Dishes, original).await.unwrap();

        store.replace(Collection::Dishes, &id, doc("Kilishi")).await.unwrap();

        let fetched = store.fetch(Collection::Dishes, &id).await.unwrap().unwrap();
        assert_eq!(fetched, doc("Kilishi"));
        assert!(!fetched.contains_key("orderLink"));
    }

    #[tokio::test]
    async fn replace_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .replace(Collection::Dishes, "nope", doc("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.insert(Collection::Dishes, doc("Suya")).await.unwrap();
        store.remove(Collection::Dishes, &id).await.unwrap();
        store.remove(Collection::Dishes, &id).await.unwrap();
        assert_eq!(store.fetch(Collection::Dishes, &id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failing_writes_leave_store_untouched() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let err = store.insert(Collection::Posts, doc("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 503, .. }));
        assert_eq!(store.len(Collection::Posts).await, 0);
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_reads_keep_writes_working() {
        let store = MemoryStore::new();
        store.set_fail_reads(true);
        let id = store.insert(Collection::Dishes, doc("Suya")).await.unwrap();
        assert!(matches!(
            store.fetch(Collection::Dishes, &id).await,
            Err(StoreError::Rejected { status: 503, .. })
        ));
        assert!(store.fetch_all(Collection::Dishes).await.is_err());

        store.set_fail_reads(false);
        assert_eq!(store.fetch_all(Collection::Dishes).await.unwrap().len(), 1);
    }
}

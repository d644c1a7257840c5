//! Content Store: the document database holding posts, dishes, and
//! categories.
//!
//! | Module | Role |
//! |--------|------|
//! | [`document`] | Tagged field values and shape-checked getters |
//! | [`memory`] | In-process store for local development and tests |
//! | [`firestore`] | Firestore REST client |
//!
//! The [`ContentStore`] trait deals in raw [`Document`]s. Typed records
//! ([`Post`](crate::types::Post), [`Dish`](crate::types::Dish),
//! [`Category`](crate::types::Category)) convert to and from documents in
//! [`types`](crate::types), which keeps every backend ignorant of the
//! restaurant domain.
//!
//! ## Semantics shared by all backends
//!
//! - `insert` always creates a new document with a generated id. There is no
//!   deduplication; inserting the same fields twice yields two documents.
//! - `replace` overwrites every field of an existing document and fails with
//!   [`StoreError::NotFound`] if the document is gone.
//! - `remove` is idempotent: removing an absent document succeeds.

pub mod document;
pub mod firestore;
pub mod memory;

pub use document::{Document, DocumentError, FieldValue, Fields};
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::config::{StoreBackend, StoreConfig};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request to content store failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("content store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },
    #[error("malformed document {collection}/{id}: {source}")]
    Malformed {
        collection: Collection,
        id: String,
        source: DocumentError,
    },
}

/// The three collections the site reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Posts,
    Dishes,
    Categories,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Dishes => "dishes",
            Collection::Categories => "categories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations every Content Store backend supports.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a document and return its generated id.
    async fn insert(&self, collection: Collection, fields: Document) -> Result<String, StoreError>;

    /// Fetch one document. `Ok(None)` when it does not exist.
    async fn fetch(&self, collection: Collection, id: &str)
    -> Result<Option<Document>, StoreError>;

    /// Fetch every document in a collection, in no particular order.
    async fn fetch_all(&self, collection: Collection)
    -> Result<Vec<(String, Document)>, StoreError>;

    /// Overwrite an existing document.
    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn remove(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// Construct the backend selected in config.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn ContentStore>, StoreError> {
    Ok(match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Firestore => Arc::new(FirestoreStore::from_config(config)?),
    })
}

//! Storage side of the extraction.
//!
//! A host hands over a [`DocumentStore`]: a database handle that reports its engine name and
//! exposes a registry of [`Model`]s. The factory picks the [`StorageAdapter`] matching that
//! engine once, at construction, and every middleware fetches through it.

mod document;
mod memory;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::{BoxError, ConfigError, Failure};

pub use document::DocumentStoreAdapter;
pub use memory::{MemoryModel, MemoryStore};

/// The extracted value, opaque to the middleware
pub type Document = serde_json::Value;

/// A database handle exposing a queryable model registry
pub trait DocumentStore: Send + Sync {
    /// Name of the engine behind this handle, used to pick a [`StorageAdapter`]
    fn engine(&self) -> &str;

    /// Looks a model up by collection name
    fn model(&self, name: &str) -> Option<Arc<dyn Model>>;
}

/// A single collection of a [`DocumentStore`]
#[async_trait]
pub trait Model: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, BoxError>;
}

/// Fetches one document by identifier, the only storage operation the middleware needs.
///
/// Every outcome is a value: a missing collection, a missing document and an engine error
/// all come back as a [`Failure`].
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn fetch_by_id(&self, collection: &str, id: &str) -> Result<Document, Failure>;
}

pub trait StorageAdapterExt: StorageAdapter {
    /// Runs `callback` with the outcome of [`StorageAdapter::fetch_by_id`] as soon as it is
    /// available, the callback's return value completes the call
    fn fetch_then<'a, F, R>(&'a self, collection: &'a str, id: &'a str, callback: F) -> impl Future<Output = R> + Send + 'a
    where
        F: FnOnce(Result<Document, Failure>) -> R + Send + 'a,
    {
        self.fetch_by_id(collection, id).map(callback)
    }
}

impl<T: StorageAdapter + ?Sized> StorageAdapterExt for T {}

/// Storage engines that have an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEngine {
    /// a document store addressed by `_id`
    Document,
}

impl StorageEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageEngine::Document => "document",
        }
    }
}

impl fmt::Display for StorageEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageEngine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(StorageEngine::Document),
            _ => Err(ConfigError::unsupported_storage(s)),
        }
    }
}

/// Selects the adapter for the engine `db` reports
pub fn select(db: Arc<dyn DocumentStore>) -> Result<Arc<dyn StorageAdapter>, ConfigError> {
    match db.engine().parse::<StorageEngine>()? {
        StorageEngine::Document => Ok(Arc::new(DocumentStoreAdapter::new(db))),
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::storage::{Document, DocumentStore, Model, StorageEngine};

/// An in-process document store.
///
/// Reports the `document` engine, so the factory pairs it with
/// [`DocumentStoreAdapter`](crate::storage::DocumentStoreAdapter).
///
/// ```
/// use roudex::storage::{MemoryModel, MemoryStore};
/// use serde_json::json;
///
/// let store = MemoryStore::new()
///     .with_model("Widget", MemoryModel::from_iter([("42", json!({ "name": "gear" }))]));
/// ```
#[derive(Default)]
pub struct MemoryStore {
    models: HashMap<String, Arc<MemoryModel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, name: impl Into<String>, model: MemoryModel) -> Self {
        self.models.insert(name.into(), Arc::new(model));
        self
    }
}

impl DocumentStore for MemoryStore {
    fn engine(&self) -> &str {
        StorageEngine::Document.as_str()
    }

    fn model(&self, name: &str) -> Option<Arc<dyn Model>> {
        self.models.get(name).map(|model| Arc::clone(model) as Arc<dyn Model>)
    }
}

/// Documents of one collection, keyed by `_id`
#[derive(Debug, Default, Clone)]
pub struct MemoryModel {
    documents: HashMap<String, Document>,
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, document: Document) {
        self.documents.insert(id.into(), document);
    }
}

impl<K: Into<String>> FromIterator<(K, Document)> for MemoryModel {
    fn from_iter<T: IntoIterator<Item = (K, Document)>>(iter: T) -> Self {
        Self { documents: iter.into_iter().map(|(id, document)| (id.into(), document)).collect() }
    }
}

#[async_trait]
impl Model for MemoryModel {
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, BoxError> {
        Ok(self.documents.get(id).cloned())
    }
}

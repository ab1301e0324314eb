use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::Failure;
use crate::storage::{Document, DocumentStore, StorageAdapter};

/// [`StorageAdapter`] over a document store: looks the model up in the store's registry and
/// finds one document by its `_id`
pub struct DocumentStoreAdapter {
    db: Arc<dyn DocumentStore>,
}

impl DocumentStoreAdapter {
    pub fn new(db: Arc<dyn DocumentStore>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StorageAdapter for DocumentStoreAdapter {
    async fn fetch_by_id(&self, collection: &str, id: &str) -> Result<Document, Failure> {
        let Some(model) = self.db.model(collection) else {
            debug!(collection, "collection is not registered");
            return Err(Failure::missing_collection());
        };

        match model.find_by_id(id).await {
            Ok(Some(document)) => {
                trace!(collection, id, "document found");
                Ok(document)
            }
            Ok(None) => Err(Failure::not_found()),
            Err(e) => {
                debug!(collection, id, cause = %e, "find by id failed");
                Err(Failure::storage(e))
            }
        }
    }
}

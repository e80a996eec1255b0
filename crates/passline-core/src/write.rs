// ── Remote write path ──
//
// User-initiated create/delete against the collection store. Failures are
// returned to the caller as `CoreError`; the store's optimistic local update
// is reconciled by the next feed event either way.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use passline_api::StoreClient;

use crate::error::CoreError;
use crate::model::{Collection, EntityId};

pub trait RemoteWriter: Send + Sync {
    /// Create a document and return the id the store assigned.
    fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<EntityId, CoreError>>;

    fn delete<'a>(
        &'a self,
        collection: Collection,
        id: &'a EntityId,
    ) -> BoxFuture<'a, Result<(), CoreError>>;
}

impl RemoteWriter for StoreClient {
    fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<EntityId, CoreError>> {
        async move {
            let id = StoreClient::create(self, collection.name(), &fields).await?;
            Ok(EntityId::from(id))
        }
        .boxed()
    }

    fn delete<'a>(
        &'a self,
        collection: Collection,
        id: &'a EntityId,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        async move {
            StoreClient::delete(self, collection.name(), id.as_str())
                .await
                .map_err(|e| CoreError::from(e).for_document(collection, id.as_str()))
        }
        .boxed()
    }
}

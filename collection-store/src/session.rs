// Copyright (c) James Kassemi, SC, US. All rights reserved.

use core_types::retry::RetryPolicy;
use core_types::types::{
    Endpoint, ItemKey, OrderedItem, Page, QueryRequest, ViewDefinition, ViewHandle,
};

use crate::{RemoteCollectionStore, ResolutionError, StoreError, StoreResult};

/// A store bound to one resolved endpoint. Reads retry per `retry`; writes are issued once.
pub struct StoreSession<'a> {
    store: &'a dyn RemoteCollectionStore,
    endpoint: Endpoint,
    retry: RetryPolicy,
}

impl<'a> StoreSession<'a> {
    pub fn new(
        store: &'a dyn RemoteCollectionStore,
        endpoint: Endpoint,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            endpoint,
            retry,
        }
    }

    /// Resolves `identity` and binds the session to the resulting endpoint.
    pub async fn open(
        store: &'a dyn RemoteCollectionStore,
        identity: &str,
        retry: RetryPolicy,
    ) -> Result<Self, ResolutionError> {
        let endpoint = store.resolve_endpoint(identity).await?;
        Ok(Self::new(store, endpoint, retry))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn root_view(&self) -> StoreResult<ViewHandle> {
        let (store, endpoint) = (self.store, &self.endpoint);
        self.retry
            .retry_async("root_view", StoreError::is_transient, move |_| {
                store.root_view(endpoint)
            })
            .await
    }

    pub async fn query(&self, view: &ViewHandle, request: QueryRequest) -> StoreResult<Page> {
        let (store, endpoint, request) = (self.store, &self.endpoint, &request);
        self.retry
            .retry_async("query", StoreError::is_transient, move |_| {
                store.query(endpoint, view, request)
            })
            .await
    }

    pub async fn find_views(&self, display_name: &str) -> StoreResult<Vec<ViewHandle>> {
        let (store, endpoint) = (self.store, &self.endpoint);
        self.retry
            .retry_async("find_views", StoreError::is_transient, move |_| {
                store.find_views(endpoint, display_name)
            })
            .await
    }

    pub async fn create_view(&self, definition: &ViewDefinition) -> StoreResult<ViewHandle> {
        self.store.create_view(&self.endpoint, definition).await
    }

    pub async fn delete_view(&self, view: &ViewHandle) -> StoreResult<()> {
        self.store.delete_view(&self.endpoint, view).await
    }

    pub async fn create_item(
        &self,
        view: &ViewHandle,
        key: ItemKey,
        payload: Option<String>,
    ) -> StoreResult<OrderedItem> {
        self.store
            .create_item(&self.endpoint, view, key, payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use tokio::time::pause;

    #[tokio::test]
    async fn open_rejects_unknown_identities() {
        let store = MemoryStore::new("bench");
        let err = StoreSession::open(&store, "memory:elsewhere", RetryPolicy::none())
            .await
            .err();
        assert!(matches!(err, Some(ResolutionError::UnknownStore { .. })));
    }

    #[tokio::test]
    async fn reads_retry_transient_failures() {
        pause();
        let store = MemoryStore::with_population("bench", 4);
        let session = StoreSession::open(&store, "memory:bench", RetryPolicy::new(3, 10, 40, 0.0))
            .await
            .unwrap();
        let root = session.root_view().await.unwrap();

        store.throttle_next_queries(2);
        let page = session
            .query(&root, QueryRequest::window(0, 1))
            .await
            .unwrap();
        assert_eq!(page.total_count, 4);
        assert_eq!(store.query_count(), 3);
    }

    #[tokio::test]
    async fn single_attempt_surfaces_the_failure() {
        let store = MemoryStore::with_population("bench", 4);
        let session = StoreSession::open(&store, "memory:bench", RetryPolicy::none())
            .await
            .unwrap();
        let root = session.root_view().await.unwrap();

        store.throttle_next_queries(1);
        let result = session.query(&root, QueryRequest::window(0, 1)).await;
        assert!(matches!(result, Err(StoreError::Throttled)));
        assert_eq!(store.query_count(), 1);
    }
}

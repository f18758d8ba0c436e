// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Access to a remote ordered collection through windowed, filtered queries.
//!
//! [`RemoteCollectionStore`] is the seam the benchmark consumes. Two implementations ship here:
//! [`MemoryStore`] for local runs and tests, and [`RestStore`] for a JSON/HTTP store.
//! Callers normally go through [`StoreSession`], which pins a resolved [`Endpoint`] and applies
//! the retry policy to idempotent reads.

mod error;
pub mod memory;
pub mod rest;
mod session;

pub use error::{ResolutionError, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use session::StoreSession;

use core_types::types::{
    Endpoint, ItemKey, OrderedItem, Page, QueryRequest, ViewDefinition, ViewHandle,
};

#[async_trait::async_trait]
pub trait RemoteCollectionStore: Send + Sync {
    async fn resolve_endpoint(&self, identity: &str) -> Result<Endpoint, ResolutionError>;

    /// Handle to the collection holding every item.
    async fn root_view(&self, endpoint: &Endpoint) -> StoreResult<ViewHandle>;

    async fn query(
        &self,
        endpoint: &Endpoint,
        view: &ViewHandle,
        request: &QueryRequest,
    ) -> StoreResult<Page>;

    /// Every view whose display name equals `display_name`, in store order.
    async fn find_views(&self, endpoint: &Endpoint, display_name: &str)
        -> StoreResult<Vec<ViewHandle>>;

    async fn create_view(
        &self,
        endpoint: &Endpoint,
        definition: &ViewDefinition,
    ) -> StoreResult<ViewHandle>;

    /// Hard delete; not recoverable.
    async fn delete_view(&self, endpoint: &Endpoint, view: &ViewHandle) -> StoreResult<()>;

    async fn create_item(
        &self,
        endpoint: &Endpoint,
        view: &ViewHandle,
        key: ItemKey,
        payload: Option<String>,
    ) -> StoreResult<OrderedItem>;
}

// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! In-process collection store.
//!
//! Items are kept in creation order. Unsorted queries return creation order; sorted queries
//! return key order. Filtered views evaluate their predicate over the root collection on every
//! query, so they always reflect the current population. `find_views` lists newest first, so
//! callers that need a stable "first" must order by `created_seq` themselves.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use core_types::types::{
    Endpoint, ItemId, ItemKey, OrderedItem, Page, Predicate, QueryRequest, SortDirection,
    Traversal, ViewDefinition, ViewHandle, ViewId, ViewKind,
};
use parking_lot::Mutex;

use crate::{RemoteCollectionStore, ResolutionError, StoreError, StoreResult};

pub const MEMORY_SCHEME: &str = "memory:";
const ROOT_VIEW_ID: &str = "root";

struct StoredView {
    handle: ViewHandle,
    definition: Option<ViewDefinition>,
}

struct MemoryState {
    items: Vec<OrderedItem>,
    views: BTreeMap<ViewId, StoredView>,
    next_seq: u64,
    next_view: u64,
}

impl MemoryState {
    fn new() -> Self {
        let root = ViewHandle {
            id: ViewId(ROOT_VIEW_ID.to_string()),
            display_name: "Root".to_string(),
            kind: ViewKind::Root,
            created_seq: 0,
        };
        let mut views = BTreeMap::new();
        views.insert(
            root.id.clone(),
            StoredView {
                handle: root,
                definition: None,
            },
        );
        Self {
            items: Vec::new(),
            views,
            next_seq: 1,
            next_view: 1,
        }
    }

    fn push_item(&mut self, key: ItemKey, payload: Option<String>) -> OrderedItem {
        let item = OrderedItem {
            id: ItemId(format!("item-{:06}", self.items.len())),
            key,
            payload,
        };
        self.items.push(item.clone());
        item
    }

    fn insert_view(
        &mut self,
        display_name: &str,
        kind: ViewKind,
        definition: Option<ViewDefinition>,
    ) -> ViewHandle {
        let handle = ViewHandle {
            id: ViewId(format!("view-{:06}", self.next_view)),
            display_name: display_name.to_string(),
            kind,
            created_seq: self.next_seq,
        };
        self.next_view += 1;
        self.next_seq += 1;
        self.views.insert(
            handle.id.clone(),
            StoredView {
                handle: handle.clone(),
                definition,
            },
        );
        handle
    }

    fn view_items(&self, view: &ViewHandle) -> StoreResult<Vec<&OrderedItem>> {
        let stored = self
            .views
            .get(&view.id)
            .ok_or_else(|| StoreError::ViewNotFound {
                view: view.id.clone(),
            })?;
        let items: Vec<&OrderedItem> = match &stored.definition {
            _ if stored.handle.id.0 == ROOT_VIEW_ID => self.items.iter().collect(),
            Some(definition) => {
                if definition.root_scope.0 != ROOT_VIEW_ID {
                    return Err(StoreError::Rejected {
                        operation: "query",
                        reason: format!("unknown root scope {}", definition.root_scope),
                    });
                }
                self.items
                    .iter()
                    .filter(|item| definition.predicate.matches(item))
                    .collect()
            }
            // Plain container sharing a view name; nothing to filter.
            None => Vec::new(),
        };
        Ok(items)
    }
}

pub struct MemoryStore {
    name: String,
    state: Mutex<MemoryState>,
    queries: AtomicUsize,
    pending_faults: Mutex<VecDeque<StoreError>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(MemoryState::new()),
            queries: AtomicUsize::new(0),
            pending_faults: Mutex::new(VecDeque::new()),
        }
    }

    /// Store pre-filled with `keys`, inserted in iteration order.
    pub fn with_keys(name: impl Into<String>, keys: impl IntoIterator<Item = ItemKey>) -> Self {
        let store = Self::new(name);
        {
            let mut state = store.state.lock();
            for key in keys {
                state.push_item(key, None);
            }
        }
        store
    }

    /// Store holding the dense keys `0..size`.
    pub fn with_population(name: impl Into<String>, size: usize) -> Self {
        Self::with_keys(name, 0..size as ItemKey)
    }

    pub fn identity(&self) -> String {
        format!("{MEMORY_SCHEME}{}", self.name)
    }

    /// Endpoint this store resolves its own identity to.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            identity: self.identity(),
            base_url: format!("memory://{}", self.name),
        }
    }

    /// Adds a view record directly, bypassing `create_view`. `Filtered` views get a key-exists
    /// predicate over the root; `Root` kind models a plain container that merely shares the name.
    pub fn plant_view(&self, display_name: &str, kind: ViewKind) -> ViewHandle {
        let mut state = self.state.lock();
        let definition = match kind {
            ViewKind::Filtered => Some(ViewDefinition {
                display_name: display_name.to_string(),
                predicate: Predicate::KeyExists,
                root_scope: ViewId(ROOT_VIEW_ID.to_string()),
                traversal: Traversal::Shallow,
            }),
            ViewKind::Root => None,
        };
        state.insert_view(display_name, kind, definition)
    }

    pub fn views_named(&self, display_name: &str) -> Vec<ViewHandle> {
        let state = self.state.lock();
        state
            .views
            .values()
            .filter(|v| v.handle.display_name == display_name && v.handle.id.0 != ROOT_VIEW_ID)
            .map(|v| v.handle.clone())
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::Relaxed);
    }

    /// The next `count` queries fail with [`StoreError::Throttled`] before touching state.
    pub fn throttle_next_queries(&self, count: usize) {
        let mut faults = self.pending_faults.lock();
        for _ in 0..count {
            faults.push_back(StoreError::Throttled);
        }
    }

    fn check_endpoint(&self, endpoint: &Endpoint) -> StoreResult<()> {
        if endpoint.identity == self.identity() {
            Ok(())
        } else {
            Err(StoreError::Rejected {
                operation: "endpoint",
                reason: format!("endpoint {} does not belong to this store", endpoint.identity),
            })
        }
    }
}

#[async_trait]
impl RemoteCollectionStore for MemoryStore {
    async fn resolve_endpoint(&self, identity: &str) -> Result<Endpoint, ResolutionError> {
        match identity.strip_prefix(MEMORY_SCHEME) {
            Some(name) if name == self.name => Ok(self.endpoint()),
            Some(_) => Err(ResolutionError::UnknownStore {
                identity: identity.to_string(),
            }),
            None => Err(ResolutionError::UnsupportedIdentity {
                identity: identity.to_string(),
            }),
        }
    }

    async fn root_view(&self, endpoint: &Endpoint) -> StoreResult<ViewHandle> {
        self.check_endpoint(endpoint)?;
        let state = self.state.lock();
        state
            .views
            .get(&ViewId(ROOT_VIEW_ID.to_string()))
            .map(|v| v.handle.clone())
            .ok_or_else(|| StoreError::ViewNotFound {
                view: ViewId(ROOT_VIEW_ID.to_string()),
            })
    }

    async fn query(
        &self,
        endpoint: &Endpoint,
        view: &ViewHandle,
        request: &QueryRequest,
    ) -> StoreResult<Page> {
        self.check_endpoint(endpoint)?;
        self.queries.fetch_add(1, Ordering::Relaxed);
        if let Some(fault) = self.pending_faults.lock().pop_front() {
            return Err(fault);
        }

        let state = self.state.lock();
        let mut matching: Vec<&OrderedItem> = state
            .view_items(view)?
            .into_iter()
            .filter(|item| request.predicate.map_or(true, |p| p.matches(item)))
            .collect();
        match request.sort {
            Some(SortDirection::Ascending) => matching.sort_by_key(|item| item.key),
            Some(SortDirection::Descending) => {
                matching.sort_by(|a, b| b.key.cmp(&a.key));
            }
            None => {}
        }
        let total_count = matching.len();
        let items = matching
            .into_iter()
            .skip(request.offset)
            .take(request.size)
            .cloned()
            .collect();
        Ok(Page { items, total_count })
    }

    async fn find_views(
        &self,
        endpoint: &Endpoint,
        display_name: &str,
    ) -> StoreResult<Vec<ViewHandle>> {
        self.check_endpoint(endpoint)?;
        let mut views = self.views_named(display_name);
        views.sort_by(|a, b| b.created_seq.cmp(&a.created_seq));
        Ok(views)
    }

    async fn create_view(
        &self,
        endpoint: &Endpoint,
        definition: &ViewDefinition,
    ) -> StoreResult<ViewHandle> {
        self.check_endpoint(endpoint)?;
        let mut state = self.state.lock();
        if !state.views.contains_key(&definition.root_scope) {
            return Err(StoreError::ViewNotFound {
                view: definition.root_scope.clone(),
            });
        }
        Ok(state.insert_view(
            &definition.display_name,
            ViewKind::Filtered,
            Some(definition.clone()),
        ))
    }

    async fn delete_view(&self, endpoint: &Endpoint, view: &ViewHandle) -> StoreResult<()> {
        self.check_endpoint(endpoint)?;
        if view.id.0 == ROOT_VIEW_ID {
            return Err(StoreError::Rejected {
                operation: "delete_view",
                reason: "the root collection cannot be deleted".to_string(),
            });
        }
        let mut state = self.state.lock();
        match state.views.remove(&view.id) {
            Some(_) => Ok(()),
            None => Err(StoreError::ViewNotFound {
                view: view.id.clone(),
            }),
        }
    }

    async fn create_item(
        &self,
        endpoint: &Endpoint,
        view: &ViewHandle,
        key: ItemKey,
        payload: Option<String>,
    ) -> StoreResult<OrderedItem> {
        self.check_endpoint(endpoint)?;
        if view.kind != ViewKind::Root {
            return Err(StoreError::Rejected {
                operation: "create_item",
                reason: format!("view {} is not the root collection", view.id),
            });
        }
        Ok(self.state.lock().push_item(key, payload))
    }
}

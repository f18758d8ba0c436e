// Copyright (c) James Kassemi, SC, US. All rights reserved.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer ordinal assigned to an item at creation; doubles as sort key and search property.
pub type ItemKey = i64;

/// Store-assigned opaque item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

/// Store-assigned opaque view identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entry in a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub id: ItemId,
    pub key: ItemKey,
    #[serde(default)]
    pub payload: Option<String>,
}

/// What a view handle points at. Carried explicitly by every store response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Root,
    Filtered,
}

/// Reference to a queryable view (root collection or persistent filtered view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewHandle {
    pub id: ViewId,
    pub display_name: String,
    pub kind: ViewKind,
    /// Creation order assigned by the store; lower is older.
    pub created_seq: u64,
}

/// A view handle known to be [`ViewKind::Filtered`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredView(ViewHandle);

impl FilteredView {
    /// Returns the handle back when it is not a filtered view.
    pub fn from_handle(handle: ViewHandle) -> Result<Self, ViewHandle> {
        match handle.kind {
            ViewKind::Filtered => Ok(Self(handle)),
            ViewKind::Root => Err(handle),
        }
    }

    pub fn handle(&self) -> &ViewHandle {
        &self.0
    }

    pub fn into_handle(self) -> ViewHandle {
        self.0
    }
}

/// Equality/existence filter on the key property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    KeyExists,
    KeyEquals(ItemKey),
}

impl Predicate {
    pub fn matches(&self, item: &OrderedItem) -> bool {
        match self {
            Predicate::KeyExists => true,
            Predicate::KeyEquals(key) => item.key == *key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    Shallow,
    Deep,
}

/// Windowed query against a single view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRequest {
    pub predicate: Option<Predicate>,
    pub sort: Option<SortDirection>,
    pub offset: usize,
    pub size: usize,
}

impl QueryRequest {
    pub fn window(offset: usize, size: usize) -> Self {
        Self {
            predicate: None,
            sort: None,
            offset,
            size,
        }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn sorted(mut self, direction: SortDirection) -> Self {
        self.sort = Some(direction);
        self
    }
}

/// One window of results plus the total number of matches in the view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<OrderedItem>,
    pub total_count: usize,
}

/// Parameters for a persistent, predicate-bound view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub display_name: String,
    pub predicate: Predicate,
    pub root_scope: ViewId,
    pub traversal: Traversal,
}

/// Result of resolving a store identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub identity: String,
    pub base_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(kind: ViewKind) -> ViewHandle {
        ViewHandle {
            id: ViewId("v1".to_string()),
            display_name: "name".to_string(),
            kind,
            created_seq: 0,
        }
    }

    #[test]
    fn filtered_view_rejects_root_handles() {
        assert!(FilteredView::from_handle(handle(ViewKind::Filtered)).is_ok());
        let rejected = FilteredView::from_handle(handle(ViewKind::Root)).unwrap_err();
        assert_eq!(rejected.kind, ViewKind::Root);
    }

    #[test]
    fn predicate_matches_by_key() {
        let item = OrderedItem {
            id: ItemId("a".to_string()),
            key: 7,
            payload: None,
        };
        assert!(Predicate::KeyExists.matches(&item));
        assert!(Predicate::KeyEquals(7).matches(&item));
        assert!(!Predicate::KeyEquals(8).matches(&item));
    }
}

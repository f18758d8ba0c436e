// Copyright (c) James Kassemi, SC, US. All rights reserved.

use collection_store::{StoreResult, StoreSession};
use core_types::types::{ItemKey, Page, Predicate, QueryRequest, SortDirection, ViewHandle};

pub const SCAN_WINDOW: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Unsorted,
    /// Store sorts matches ascending by key before windowing.
    Sorted,
}

/// Equality filter on the key property. Read-only; the page is returned for inspection only.
pub struct PredicateScanner<'s, 'a> {
    session: &'s StoreSession<'a>,
}

impl<'s, 'a> PredicateScanner<'s, 'a> {
    pub fn new(session: &'s StoreSession<'a>) -> Self {
        Self { session }
    }

    pub async fn scan(
        &self,
        view: &ViewHandle,
        key: ItemKey,
        order: ScanOrder,
    ) -> StoreResult<Page> {
        self.scan_window(view, key, order, SCAN_WINDOW).await
    }

    pub async fn scan_window(
        &self,
        view: &ViewHandle,
        key: ItemKey,
        order: ScanOrder,
        size: usize,
    ) -> StoreResult<Page> {
        let mut request = QueryRequest::window(0, size).with_predicate(Predicate::KeyEquals(key));
        if order == ScanOrder::Sorted {
            request = request.sorted(SortDirection::Ascending);
        }
        self.session.query(view, request).await
    }
}

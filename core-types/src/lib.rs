// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Shared data model, benchmark configuration, and retry policy for the seek benchmark.

pub mod config;
pub mod retry;
pub mod types;

pub use config::{BenchConfig, ConfigError, RetrySettings, StoreSettings, ViewSettings};
pub use retry::RetryPolicy;
pub use types::{
    Endpoint, FilteredView, ItemId, ItemKey, OrderedItem, Page, Predicate, QueryRequest,
    SortDirection, Traversal, ViewDefinition, ViewHandle, ViewId, ViewKind,
};

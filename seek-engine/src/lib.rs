// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Retrieval strategies over a remote ordered collection.
//!
//! - [`OrderedKeySeeker`]: binary search by key using single-item windows.
//! - [`PredicateScanner`]: one equality-filtered window, optionally sorted by the store.
//! - [`FilteredViewManager`]: idempotent setup of a named, persistent filtered view.

pub mod scanner;
pub mod seeker;
pub mod view_manager;

pub use scanner::{PredicateScanner, ScanOrder};
pub use seeker::{OrderedKeySeeker, SeekOutcome};
pub use view_manager::{FilteredViewManager, ViewSetupError};

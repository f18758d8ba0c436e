// Copyright (c) James Kassemi, SC, US. All rights reserved.

use core_types::types::ViewId;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unsupported store identity '{identity}'")]
    UnsupportedIdentity { identity: String },
    #[error("no store registered under '{identity}'")]
    UnknownStore { identity: String },
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store probe returned status {status}")]
    Status { status: u16 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected status {status} from {operation}")]
    UnexpectedStatus { operation: &'static str, status: u16 },
    #[error("view {view} not found")]
    ViewNotFound { view: ViewId },
    #[error("store rejected {operation}: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
    #[error("store throttled the request")]
    Throttled,
}

impl StoreError {
    /// Throttling, 5xx responses, and connect/timeout failures; worth another attempt on reads.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Request(err) => err.is_timeout() || err.is_connect(),
            StoreError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            StoreError::Throttled => true,
            StoreError::Url(_) | StoreError::ViewNotFound { .. } | StoreError::Rejected { .. } => {
                false
            }
        }
    }
}

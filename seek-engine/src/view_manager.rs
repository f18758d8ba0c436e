// Copyright (c) James Kassemi, SC, US. All rights reserved.

use collection_store::{StoreError, StoreSession};
use core_types::types::{
    FilteredView, Predicate, Traversal, ViewDefinition, ViewHandle, ViewId, ViewKind,
};
use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewSetupError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("store returned view {view} as {kind:?}, expected a filtered view")]
    NotFiltered { view: ViewId, kind: ViewKind },
}

/// Keeps exactly one persistent filtered view per display name.
pub struct FilteredViewManager<'s, 'a> {
    session: &'s StoreSession<'a>,
}

impl<'s, 'a> FilteredViewManager<'s, 'a> {
    pub fn new(session: &'s StoreSession<'a>) -> Self {
        Self { session }
    }

    /// Reuses the oldest view named `name`, hard-deleting any newer duplicates. The survivor is
    /// replaced when it is not a filtered view.
    pub async fn ensure(
        &self,
        name: &str,
        predicate: Predicate,
        root_scope: &ViewHandle,
    ) -> Result<FilteredView, ViewSetupError> {
        let mut existing = self.session.find_views(name).await?;
        existing.sort_by(|a, b| {
            a.created_seq
                .cmp(&b.created_seq)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut matches = existing.into_iter();
        let oldest = matches.next();
        let duplicates: Vec<ViewHandle> = matches.collect();
        if !duplicates.is_empty() {
            warn!(
                "view name '{name}' is ambiguous ({} matches); deleting all but the oldest",
                duplicates.len() + 1
            );
            for duplicate in &duplicates {
                self.session.delete_view(duplicate).await?;
            }
        }

        if let Some(oldest) = oldest {
            match FilteredView::from_handle(oldest) {
                Ok(view) => {
                    info!("reusing filtered view '{name}' ({})", view.handle().id);
                    return Ok(view);
                }
                Err(other) => {
                    warn!("'{name}' ({}) is not a filtered view; deleting it", other.id);
                    self.session.delete_view(&other).await?;
                }
            }
        }

        info!("creating filtered view '{name}' over {}", root_scope.id);
        let created = self
            .session
            .create_view(&ViewDefinition {
                display_name: name.to_string(),
                predicate,
                root_scope: root_scope.id.clone(),
                traversal: Traversal::Shallow,
            })
            .await?;
        FilteredView::from_handle(created).map_err(|handle| ViewSetupError::NotFiltered {
            view: handle.id,
            kind: handle.kind,
        })
    }
}

// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::io::Write;

use collection_store::StoreSession;
use core_types::types::{ItemKey, QueryRequest, ViewHandle};
use log::info;

use crate::HarnessError;

/// Tops the root collection up to `population_size` items keyed `0..population_size`.
///
/// Items already present are assumed to be the prefix `0..total_count` written by an earlier,
/// interrupted run; only the missing tail is created.
pub struct PopulationSeeder<'s, 'a> {
    session: &'s StoreSession<'a>,
    population_size: usize,
    progress_every: usize,
}

impl<'s, 'a> PopulationSeeder<'s, 'a> {
    pub fn new(
        session: &'s StoreSession<'a>,
        population_size: usize,
        progress_every: usize,
    ) -> Self {
        Self {
            session,
            population_size,
            progress_every: progress_every.max(1),
        }
    }

    /// Returns the number of items created.
    pub async fn ensure<W: Write>(
        &self,
        root: &ViewHandle,
        out: &mut W,
    ) -> Result<usize, HarnessError> {
        let existing = self
            .session
            .query(root, QueryRequest::window(0, 1))
            .await?
            .total_count;
        if existing >= self.population_size {
            info!("root collection holds {existing} items; no seeding needed");
            return Ok(0);
        }

        writeln!(
            out,
            "Root collection holds {existing} of {} items; creating the rest.",
            self.population_size
        )?;
        for key in existing..self.population_size {
            self.session
                .create_item(root, key as ItemKey, Some(item_payload(key)))
                .await?;
            let created = key - existing + 1;
            if created % self.progress_every == 0 || key + 1 == self.population_size {
                writeln!(out, "Created item {} of {}", key + 1, self.population_size)?;
            }
        }
        Ok(self.population_size - existing)
    }
}

fn item_payload(key: usize) -> String {
    format!("seek benchmark item {key:05}")
}

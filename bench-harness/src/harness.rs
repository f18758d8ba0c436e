// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use collection_store::{StoreError, StoreSession};
use core_types::config::{BenchConfig, ConfigError};
use core_types::types::{FilteredView, ItemKey, Predicate, ViewHandle};
use log::{debug, info};
use rand::distributions::{Distribution, Uniform};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use seek_engine::{
    FilteredViewManager, OrderedKeySeeker, PredicateScanner, ScanOrder, ViewSetupError,
};
use thiserror::Error;

use crate::population::PopulationSeeder;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid benchmark config: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("filtered view setup failed: {0}")]
    ViewSetup(#[from] ViewSetupError),
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
    #[error("harness used before prepare()")]
    NotPrepared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    SeekRoot,
    SeekFilteredView,
    ScanUnsorted,
    ScanSorted,
}

impl Strategy {
    /// Run order used by [`BenchmarkHarness::run_all`].
    pub const ALL: [Strategy; 4] = [
        Strategy::SeekRoot,
        Strategy::SeekFilteredView,
        Strategy::ScanUnsorted,
        Strategy::ScanSorted,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Strategy::SeekRoot => "seek-root",
            Strategy::SeekFilteredView => "seek-filtered-view",
            Strategy::ScanUnsorted => "scan-unsorted",
            Strategy::ScanSorted => "scan-sorted",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Strategy::SeekRoot => "Seeking the root collection directly.",
            Strategy::SeekFilteredView => "Seeking the filtered view.",
            Strategy::ScanUnsorted => "Equality filter on the root collection without sorting.",
            Strategy::ScanSorted => {
                "Equality filter on the root collection with an ascending sort."
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timed batch of lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkResult {
    pub strategy: Strategy,
    pub iteration: usize,
    pub elapsed: Duration,
    pub lookups: usize,
    pub misses: usize,
}

struct PreparedViews {
    root: ViewHandle,
    filtered: FilteredView,
}

/// Drives timed batches of lookups and writes one line per batch to `out`.
///
/// Lookups run strictly one after another. Every target key is drawn from one [`Pcg64`]: either
/// seeded from [`BenchConfig::seed`] (a random seed when unset) or handed in through
/// [`BenchmarkHarness::with_rng`]. The same generator state replays the same targets.
pub struct BenchmarkHarness<'s, 'a, W: Write> {
    session: &'s StoreSession<'a>,
    config: BenchConfig,
    view_name: String,
    rng: Pcg64,
    seed: Option<u64>,
    out: W,
    views: Option<PreparedViews>,
}

impl<'s, 'a, W: Write> BenchmarkHarness<'s, 'a, W> {
    pub fn new(
        session: &'s StoreSession<'a>,
        config: BenchConfig,
        view_name: impl Into<String>,
        out: W,
    ) -> Result<Self, HarnessError> {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut harness = Self::with_rng(
            session,
            config,
            view_name,
            out,
            Pcg64::seed_from_u64(seed),
        )?;
        harness.seed = Some(seed);
        Ok(harness)
    }

    /// Samples targets from `rng` as given; [`BenchConfig::seed`] is ignored.
    pub fn with_rng(
        session: &'s StoreSession<'a>,
        config: BenchConfig,
        view_name: impl Into<String>,
        out: W,
        rng: Pcg64,
    ) -> Result<Self, HarnessError> {
        config.validate()?;
        Ok(Self {
            session,
            config,
            view_name: view_name.into(),
            rng,
            seed: None,
            out,
            views: None,
        })
    }

    /// Seed the generator was built from; `None` when it was injected.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Seeds the population and ensures the filtered view exists.
    pub async fn prepare(&mut self) -> Result<(), HarnessError> {
        let root = self.session.root_view().await?;
        PopulationSeeder::new(
            self.session,
            self.config.population_size,
            self.config.progress_every,
        )
        .ensure(&root, &mut self.out)
        .await?;
        let filtered = FilteredViewManager::new(self.session)
            .ensure(&self.view_name, Predicate::KeyExists, &root)
            .await?;
        info!(
            "prepared root {} and filtered view {} (sampling seed {:?})",
            root.id,
            filtered.handle().id,
            self.seed
        );
        self.views = Some(PreparedViews { root, filtered });
        Ok(())
    }

    /// Runs every strategy in [`Strategy::ALL`] order, each under its own heading.
    pub async fn run_all(&mut self) -> Result<Vec<BenchmarkResult>, HarnessError> {
        let mut results = Vec::with_capacity(Strategy::ALL.len() * self.config.iterations);
        for strategy in Strategy::ALL {
            writeln!(self.out)?;
            writeln!(self.out, "{}", strategy.heading())?;
            results.extend(self.run(strategy).await?);
        }
        Ok(results)
    }

    /// `iterations` timed batches of `searches_per_iteration` lookups each. Misses are reported
    /// and counted but never cut a batch short.
    pub async fn run(&mut self, strategy: Strategy) -> Result<Vec<BenchmarkResult>, HarnessError> {
        let (root, filtered) = match &self.views {
            Some(views) => (views.root.clone(), views.filtered.handle().clone()),
            None => return Err(HarnessError::NotPrepared),
        };
        let sampler = Uniform::new(0, self.config.population_size as ItemKey);
        let seeker = OrderedKeySeeker::new(self.session);
        let scanner = PredicateScanner::new(self.session);

        let mut results = Vec::with_capacity(self.config.iterations);
        for iteration in 0..self.config.iterations {
            let targets: Vec<ItemKey> = (0..self.config.searches_per_iteration)
                .map(|_| sampler.sample(&mut self.rng))
                .collect();

            let started = Instant::now();
            let mut lookups = 0;
            let mut misses = 0;
            for &target in &targets {
                let found = match strategy {
                    Strategy::SeekRoot => seeker.seek(&root, target).await?.found(),
                    Strategy::SeekFilteredView => seeker.seek(&filtered, target).await?.found(),
                    Strategy::ScanUnsorted => !scanner
                        .scan(&root, target, ScanOrder::Unsorted)
                        .await?
                        .items
                        .is_empty(),
                    Strategy::ScanSorted => !scanner
                        .scan(&root, target, ScanOrder::Sorted)
                        .await?
                        .items
                        .is_empty(),
                };
                lookups += 1;
                if !found {
                    misses += 1;
                    match strategy {
                        Strategy::SeekRoot | Strategy::SeekFilteredView => {
                            writeln!(self.out, "Warning! No item found for key {target}")?;
                        }
                        Strategy::ScanUnsorted | Strategy::ScanSorted => {
                            debug!("{strategy}: no match for key {target}");
                        }
                    }
                }
            }
            let elapsed = started.elapsed();

            writeln!(
                self.out,
                "{strategy} finished after: {} milliseconds.",
                elapsed.as_millis()
            )?;
            results.push(BenchmarkResult {
                strategy,
                iteration,
                elapsed,
                lookups,
                misses,
            });
        }
        Ok(results)
    }
}

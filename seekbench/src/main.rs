// Copyright (c) James Kassemi, SC, US. All rights reserved.
mod settings;

use std::{env, io, path::Path, process};

use bench_harness::{BenchmarkHarness, HarnessError};
use collection_store::{
    memory::MEMORY_SCHEME, MemoryStore, RemoteCollectionStore, ResolutionError, RestStore,
    StoreSession,
};
use log::info;
use settings::{AppConfig, SettingsError, SETTINGS_FILE};
use thiserror::Error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("seekbench failed: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let identity = env::args().nth(1).ok_or(AppError::Usage)?;
    let config = AppConfig::load(Path::new(SETTINGS_FILE))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;
    runtime.block_on(run_benchmarks(&identity, &config))
}

#[derive(Debug, Error)]
enum AppError {
    #[error("usage: seekbench <store-identity>")]
    Usage,
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint resolution failed for {identity}: {source}")]
    Resolution {
        identity: String,
        #[source]
        source: ResolutionError,
    },
    #[error(transparent)]
    Harness(#[from] HarnessError),
}

/// `memory:<name>` runs against a fresh in-process store; anything else is a REST identity.
fn connect(
    identity: &str,
    config: &AppConfig,
) -> Result<Box<dyn RemoteCollectionStore>, AppError> {
    match identity.strip_prefix(MEMORY_SCHEME) {
        Some(name) => Ok(Box::new(MemoryStore::new(name))),
        None => {
            let client = reqwest::Client::builder().build()?;
            Ok(Box::new(RestStore::new(client, config.store.base_url.clone())))
        }
    }
}

async fn run_benchmarks(identity: &str, config: &AppConfig) -> Result<(), AppError> {
    let store = connect(identity, config)?;
    let session = StoreSession::open(store.as_ref(), identity, config.retry.policy())
        .await
        .map_err(|source| AppError::Resolution {
            identity: identity.to_string(),
            source,
        })?;
    let endpoint = session.endpoint();
    println!(
        "seekbench connected to {} at {}; population={}, iterations={}, searches/iteration={}",
        endpoint.identity,
        endpoint.base_url,
        config.bench.population_size,
        config.bench.iterations,
        config.bench.searches_per_iteration
    );

    let mut harness = BenchmarkHarness::new(
        &session,
        config.bench.clone(),
        config.view.name.clone(),
        io::stdout(),
    )?;
    if let Some(seed) = harness.seed() {
        info!("sampling seed {seed}");
    }
    harness.prepare().await?;
    harness.run_all().await?;

    println!();
    println!("Done.");
    Ok(())
}

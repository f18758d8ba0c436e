// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::path::Path;

use config::Config;
use core_types::config::{BenchConfig, RetrySettings, StoreSettings, ViewSettings};
use serde::Deserialize;
use thiserror::Error;

/// Optional settings file read from the working directory.
pub const SETTINGS_FILE: &str = "seekbench.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bench: BenchConfig,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: config::ConfigError,
    },
    #[error(transparent)]
    Invalid(#[from] core_types::config::ConfigError),
    #[error("view.name must not be empty")]
    EmptyViewName,
}

impl AppConfig {
    /// Serde defaults, overlaid with `path` when it exists.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let load_err = |source| SettingsError::Load {
            path: path.display().to_string(),
            source,
        };
        let settings = Config::builder()
            .add_source(config::File::from(path).required(false))
            .build()
            .map_err(load_err)?;
        let config: Self = settings.try_deserialize().map_err(load_err)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        self.bench.validate()?;
        self.retry.validate()?;
        if self.view.name.trim().is_empty() {
            return Err(SettingsError::EmptyViewName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = AppConfig::load(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(config.bench, BenchConfig::default());
        assert_eq!(config.view.name, "SeekBenchFilteredView");
        assert!(config.store.base_url.is_none());
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"
[bench]
population_size = 500
iterations = 2
seed = 77

[store]
base_url = "http://localhost:8080/"

[retry]
max_attempts = 4
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.bench.population_size, 500);
        assert_eq!(config.bench.iterations, 2);
        assert_eq!(config.bench.searches_per_iteration, 50);
        assert_eq!(config.bench.seed, Some(77));
        assert_eq!(config.store.base_url.as_deref(), Some("http://localhost:8080/"));
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay_ms, 250);
    }

    #[test]
    fn zero_iterations_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[bench]\niterations = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(SettingsError::Invalid(_))
        ));
    }
}

// Copyright (c) James Kassemi, SC, US. All rights reserved.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

pub const DEFAULT_POPULATION_SIZE: usize = 10_000;
pub const DEFAULT_ITERATIONS: usize = 5;
pub const DEFAULT_SEARCHES_PER_ITERATION: usize = 50;
pub const DEFAULT_PROGRESS_EVERY: usize = 500;
pub const DEFAULT_VIEW_NAME: &str = "SeekBenchFilteredView";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("retry jitter_pct must be within [0, 1], got {value}")]
    Jitter { value: String },
}

/// Immutable knobs handed to the benchmark harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_searches_per_iteration")]
    pub searches_per_iteration: usize,
    /// Fixed sampling seed; `None` seeds from the clock.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

fn default_population_size() -> usize {
    DEFAULT_POPULATION_SIZE
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_searches_per_iteration() -> usize {
    DEFAULT_SEARCHES_PER_ITERATION
}

fn default_progress_every() -> usize {
    DEFAULT_PROGRESS_EVERY
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            population_size: DEFAULT_POPULATION_SIZE,
            iterations: DEFAULT_ITERATIONS,
            searches_per_iteration: DEFAULT_SEARCHES_PER_ITERATION,
            seed: None,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl BenchConfig {
    pub fn new(population_size: usize, iterations: usize, searches_per_iteration: usize) -> Self {
        Self {
            population_size,
            iterations,
            searches_per_iteration,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every.max(1);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::Zero {
                field: "population_size",
            });
        }
        if self.iterations == 0 {
            return Err(ConfigError::Zero { field: "iterations" });
        }
        if self.searches_per_iteration == 0 {
            return Err(ConfigError::Zero {
                field: "searches_per_iteration",
            });
        }
        if self.progress_every == 0 {
            return Err(ConfigError::Zero {
                field: "progress_every",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default = "default_view_name")]
    pub name: String,
}

fn default_view_name() -> String {
    DEFAULT_VIEW_NAME.to_string()
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            name: default_view_name(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Overrides the base URL derived from the store identity.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter_pct")]
    pub jitter_pct: f64,
}

fn default_max_attempts() -> usize {
    1
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_jitter_pct() -> f64 {
    0.2
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_pct: default_jitter_pct(),
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Zero {
                field: "retry.max_attempts",
            });
        }
        if !(0.0..=1.0).contains(&self.jitter_pct) {
            return Err(ConfigError::Jitter {
                value: self.jitter_pct.to_string(),
            });
        }
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter_pct,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_benchmark_constants() {
        let cfg = BenchConfig::default();
        assert_eq!(cfg.population_size, 10_000);
        assert_eq!(cfg.iterations, 5);
        assert_eq!(cfg.searches_per_iteration, 50);
        assert!(cfg.seed.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_counts() {
        let cfg = BenchConfig::new(10, 0, 5);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Zero { field: "iterations" })
        );
        let cfg = BenchConfig::new(0, 1, 5);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn retry_defaults_to_a_single_attempt() {
        let retry = RetrySettings::default();
        assert!(retry.validate().is_ok());
        assert_eq!(retry.policy().max_attempts, 1);

        let bad = RetrySettings {
            jitter_pct: 1.5,
            ..RetrySettings::default()
        };
        assert!(bad.validate().is_err());
    }
}

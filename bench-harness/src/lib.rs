// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Timed comparison of retrieval strategies against a remote ordered collection.

mod harness;
mod population;

pub use harness::{BenchmarkHarness, BenchmarkResult, HarnessError, Strategy};
pub use population::PopulationSeeder;

//! Persistence for benchmark results.
//!
//! Two tables are written: `benchmarks` (one row per model run) and
//! `benchmark_sessions` (one rollup row per session). Writes go through the
//! [`BenchmarkStore`] trait so the runner never depends on a backend.

mod error;
pub mod models;
mod pool;
pub mod repositories;
mod rest;
mod store;

pub use error::*;
pub use models::*;
pub use pool::*;
pub use repositories::*;
pub use rest::*;
pub use store::*;

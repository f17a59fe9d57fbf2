//! Domain types shared by every crate of the benchmark service.

pub mod domain;
mod error;

pub use domain::*;
pub use error::*;

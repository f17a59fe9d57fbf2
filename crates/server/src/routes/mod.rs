mod benchmark;
mod health;
mod models;
pub mod sse;

pub use benchmark::*;
pub use health::*;
pub use models::*;

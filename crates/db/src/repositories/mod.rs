mod benchmark_repository;
mod session_summary_repository;

pub use benchmark_repository::*;
pub use session_summary_repository::*;

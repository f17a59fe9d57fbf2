//! Session and streaming coordination for website benchmarks.
//!
//! A [`SessionOrchestrator`] runs the configured models of a session one
//! after another through the [`ModelRunner`]; every progress line lands in
//! the [`SessionRegistry`], from which a [`StreamPublisher`] serves callers.

pub mod error;
pub mod model_runner;
pub mod publisher;
pub mod registry;
pub mod session_runner;

pub use error::{OrchestratorError, Result};
pub use model_runner::ModelRunner;
pub use publisher::{completion_summary, PublisherConfig, StreamPublisher};
pub use registry::{SessionProgress, SessionRegistry, SessionSink, SessionUpdate};
pub use session_runner::SessionOrchestrator;

//! Collaborators driven by the model runner: LLM client resolution and the
//! browser-automation agent.
//!
//! The agent itself is opaque. [`BrowserAgent`] is the seam; [`RemoteAgent`]
//! talks to an automation service over HTTP and [`LoggedAgent`] wraps any
//! agent to narrate its progress into a [`LogSink`].

mod agent;
mod error;
mod extract;
mod history;
mod llm;
mod logged;
mod remote;
mod sink;

pub use agent::*;
pub use error::*;
pub use extract::*;
pub use history::*;
pub use llm::*;
pub use logged::*;
pub use remote::*;
pub use sink::*;

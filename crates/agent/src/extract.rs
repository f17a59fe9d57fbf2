use serde::{Deserialize, Serialize};

use crate::history::AgentHistory;

/// Picks the final textual result out of an agent's action history.
pub trait ResultExtractor: Send + Sync {
    /// `None` means the history has no usable result; that is not an error.
    fn extract(&self, history: &AgentHistory) -> Option<String>;

    fn name(&self) -> &'static str;
}

/// Content of the second-to-last action.
///
/// The automation service records a trailing bookkeeping action after the
/// one that carries the answer, so the answer sits one slot from the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecondToLastAction;

impl ResultExtractor for SecondToLastAction {
    fn extract(&self, history: &AgentHistory) -> Option<String> {
        let index = history.actions.len().checked_sub(2)?;
        history.actions[index].extracted_content.clone()
    }

    fn name(&self) -> &'static str {
        "second_to_last"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LastAction;

impl ResultExtractor for LastAction {
    fn extract(&self, history: &AgentHistory) -> Option<String> {
        history.actions.last()?.extracted_content.clone()
    }

    fn name(&self) -> &'static str {
        "last"
    }
}

/// Content of the most recent action flagged as done.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastDone;

impl ResultExtractor for LastDone {
    fn extract(&self, history: &AgentHistory) -> Option<String> {
        history
            .actions
            .iter()
            .rev()
            .find(|a| a.is_done)?
            .extracted_content
            .clone()
    }

    fn name(&self) -> &'static str {
        "last_done"
    }
}

/// Configurable choice of [`ResultExtractor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    #[default]
    SecondToLast,
    Last,
    LastDone,
}

impl ExtractorKind {
    pub fn build(self) -> Box<dyn ResultExtractor> {
        match self {
            Self::SecondToLast => Box::new(SecondToLastAction),
            Self::Last => Box::new(LastAction),
            Self::LastDone => Box::new(LastDone),
        }
    }
}

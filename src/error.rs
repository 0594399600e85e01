//! Error types shared by the workflow runner and the search invoker.

use thiserror::Error;

use crate::workflow::TaskOutput;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A language-model or search API call failed or was unreachable.
    #[error("{service} call failed: {message}")]
    ExternalCall {
        service: &'static str,
        message: String,
    },

    /// A required credential or setting is absent.
    #[error("{var} is not set")]
    ConfigurationMissing { var: &'static str },

    #[error("search query is empty")]
    EmptyQuery,

    #[error("no task {} (workflow has {len})", .index + 1)]
    TaskIndex { index: usize, len: usize },

    #[error("template error: {0}")]
    Template(String),
}

impl Error {
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalCall {
            service,
            message: message.into(),
        }
    }
}

/// A workflow run that stopped at `index`. Everything before it completed.
#[derive(Debug, Error)]
#[error("task {} failed after {} completed: {source}", .index + 1, .completed.len())]
pub struct RunFailure {
    pub index: usize,
    pub completed: Vec<TaskOutput>,
    #[source]
    pub source: Error,
}

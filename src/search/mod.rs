pub mod mock;
pub mod serpapi;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// The web-search capability. Returns whatever the backend returns.
#[async_trait]
pub trait WebSearch: Send + Sync {
    fn name(&self) -> &str;
    async fn search(&self, query: &str) -> Result<Value>;
}

#[async_trait]
impl<T: WebSearch + ?Sized> WebSearch for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn search(&self, query: &str) -> Result<Value> {
        (**self).search(query).await
    }
}

/// One query and its untouched result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub raw: Value,
}

/// Validates queries and forwards them to a [`WebSearch`] backend.
pub struct SearchInvoker {
    backend: Box<dyn WebSearch>,
}

impl SearchInvoker {
    pub fn new(backend: Box<dyn WebSearch>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Blank queries are rejected here and never reach the backend.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }

        debug!(backend = self.backend.name(), query, "web search");
        match self.backend.search(query).await {
            Ok(raw) => Ok(SearchResults {
                query: query.to_string(),
                raw,
            }),
            Err(e) => {
                warn!(backend = self.backend.name(), "search failed: {e}");
                Err(e)
            }
        }
    }
}

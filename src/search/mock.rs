use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;

use super::WebSearch;
use crate::error::{Error, Result};

/// A canned search backend for tests. Records every query it sees.
pub struct MockSearch {
    /// `Ok(None)` answers with a results object built from the query.
    reply: std::result::Result<Option<Value>, String>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    /// Answers every query with `{"query": q, "organic_results": []}`.
    pub fn new() -> Self {
        Self::with_reply(Ok(None))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Err(message.into()))
    }

    pub fn returning(value: Value) -> Self {
        Self::with_reply(Ok(Some(value)))
    }

    fn with_reply(reply: std::result::Result<Option<Value>, String>) -> Self {
        Self {
            reply,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<Value> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.reply {
            Ok(None) => Ok(json!({ "query": query, "organic_results": [] })),
            Ok(Some(value)) => Ok(value.clone()),
            Err(message) => Err(Error::external("mock", message.clone())),
        }
    }
}

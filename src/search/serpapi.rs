use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::WebSearch;
use crate::config::SERPAPI_API_KEY;
use crate::consts::SERPAPI_URL;
use crate::error::{Error, Result};
use crate::http::check_status;

const SERVICE: &str = "serpapi";

/// Google results through SerpAPI.
pub struct SerpApiSearch {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SerpApiSearch {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;
        Ok(Self { client, api_key })
    }

    fn request_url(query: &str, api_key: &str) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(
            SERPAPI_URL,
            &[("engine", "google"), ("q", query), ("api_key", api_key)],
        )
        .map_err(|e| Error::external(SERVICE, e.to_string()))
    }
}

#[async_trait]
impl WebSearch for SerpApiSearch {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search(&self, query: &str) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::ConfigurationMissing {
                var: SERPAPI_API_KEY,
            })?;

        let url = Self::request_url(query, api_key)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;
        let resp = check_status(resp, SERVICE).await?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;

        // SerpAPI reports some failures with a 200 and an "error" field.
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(Error::external(SERVICE, message));
        }
        Ok(body)
    }
}

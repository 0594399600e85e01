use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::consts::{OPENAI_URL, OPENROUTER_URL};
use crate::error::{Error, Result};

use super::sse::for_each_data;
use super::{Completion, Message, OnDelta, Prompt, TextCompletion, TokenUsage};
use crate::http::check_status;

/// A chat-completions client for OpenAI and API-compatible hosts.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    service: &'static str,
    url: String,
    key_var: &'static str,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiCompletion {
    pub fn openai(
        api_key: Option<String>,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        Self::new(
            "openai",
            OPENAI_URL,
            "OPENAI_API_KEY",
            api_key,
            model,
            temperature,
            timeout,
        )
    }

    pub fn openrouter(
        api_key: Option<String>,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        Self::new(
            "openrouter",
            OPENROUTER_URL,
            "OPENROUTER_API_KEY",
            api_key,
            model,
            temperature,
            timeout,
        )
    }

    fn new(
        service: &'static str,
        url: &str,
        key_var: &'static str,
        api_key: Option<String>,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::external(service, e.to_string()))?;
        Ok(Self {
            client,
            service,
            url: url.to_string(),
            key_var,
            api_key,
            model,
            temperature,
        })
    }

    /// Apply one streamed payload. Returns `false` once the stream is done.
    fn apply_payload(
        &self,
        payload: &str,
        state: &mut StreamState,
        on_delta: &OnDelta,
    ) -> Result<bool> {
        if payload.trim() == "[DONE]" {
            return Ok(false);
        }

        let chunk: StreamChunk = serde_json::from_str(payload).map_err(|e| {
            Error::external(self.service, format!("malformed stream chunk: {e}\nraw: {payload}"))
        })?;

        if let Some(err) = chunk.error {
            return Err(Error::external(self.service, err.message));
        }

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content
                && !content.is_empty()
            {
                on_delta(&content);
                state.text.push_str(&content);
            }
        }

        if let Some(usage) = chunk.usage {
            state.usage = Some(TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            });
        }

        Ok(true)
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    fn name(&self) -> &str {
        self.service
    }

    async fn complete(
        &self,
        prompt: &Prompt,
        on_delta: &OnDelta,
    ) -> Result<Completion> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::ConfigurationMissing { var: self.key_var })?;

        let body = ApiRequest {
            model: &self.model,
            messages: &prompt.messages,
            temperature: self.temperature,
            stream: true,
            stream_options: StreamOptions {
                include_usage: true,
            },
        };

        debug!(
            service = self.service,
            model = %self.model,
            messages = prompt.messages.len(),
            "sending completion request"
        );

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::external(self.service, e.to_string()))?;
        let resp = check_status(resp, self.service).await?;

        let mut state = StreamState::default();
        for_each_data(resp, self.service, |payload| {
            self.apply_payload(payload, &mut state, on_delta)
        })
        .await?;

        if state.text.is_empty() {
            return Err(Error::external(self.service, "returned empty response"));
        }

        if let Some(usage) = state.usage {
            debug!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                "token usage"
            );
        }

        Ok(Completion {
            text: state.text,
            usage: state.usage,
        })
    }
}

#[derive(Default)]
struct StreamState {
    text: String,
    usage: Option<TokenUsage>,
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    stream: bool,
    stream_options: StreamOptions,
}

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

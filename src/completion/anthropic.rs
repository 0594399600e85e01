use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::consts::ANTHROPIC_URL;
use crate::error::{Error, Result};

use super::sse::for_each_data;
use super::{Completion, OnDelta, Prompt, Role, TextCompletion, TokenUsage};
use crate::http::check_status;

const SERVICE: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;

/// A completion client for the Anthropic Messages API.
pub struct AnthropicCompletion {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl AnthropicCompletion {
    pub fn new(
        api_key: Option<String>,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model,
            temperature,
        })
    }

    /// System text goes in its own field; everything else becomes a message.
    fn build_messages(prompt: &Prompt) -> Vec<ApiMessage<'_>> {
        prompt
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| ApiMessage {
                role: if m.role == Role::Assistant {
                    "assistant"
                } else {
                    "user"
                },
                content: &m.content,
            })
            .collect()
    }

    fn apply_payload(
        payload: &str,
        state: &mut StreamState,
        on_delta: &OnDelta,
    ) -> Result<bool> {
        let event: StreamEvent = serde_json::from_str(payload).map_err(|e| {
            Error::external(SERVICE, format!("malformed stream event: {e}\nraw: {payload}"))
        })?;

        match event {
            StreamEvent::MessageStart { message } => {
                state.usage.input_tokens = message.usage.input_tokens;
                state.usage.output_tokens = message.usage.output_tokens;
            }
            StreamEvent::ContentBlockDelta { delta } => {
                if let Some(text) = delta.text
                    && !text.is_empty()
                {
                    on_delta(&text);
                    state.text.push_str(&text);
                }
            }
            StreamEvent::MessageDelta { usage } => {
                if let Some(usage) = usage {
                    state.usage.output_tokens = usage.output_tokens;
                }
            }
            StreamEvent::MessageStop => return Ok(false),
            StreamEvent::Error { error } => {
                return Err(Error::external(SERVICE, error.message));
            }
            StreamEvent::Other => {}
        }
        Ok(true)
    }
}

#[async_trait]
impl TextCompletion for AnthropicCompletion {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn complete(
        &self,
        prompt: &Prompt,
        on_delta: &OnDelta,
    ) -> Result<Completion> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::ConfigurationMissing {
                var: "ANTHROPIC_API_KEY",
            })?;

        let system = prompt.system();
        let messages = Self::build_messages(prompt);
        if messages.is_empty() {
            return Err(Error::Template(
                "anthropic needs at least one user message".to_string(),
            ));
        }

        let body = ApiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: system.as_deref(),
            messages: &messages,
            temperature: self.temperature,
            stream: true,
        };

        debug!(model = %self.model, messages = messages.len(), "sending anthropic request");

        let resp = self
            .client
            .post(ANTHROPIC_URL)
            .header("anthropic-version", API_VERSION)
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::external(SERVICE, e.to_string()))?;
        let resp = check_status(resp, SERVICE).await?;

        let mut state = StreamState::default();
        for_each_data(resp, SERVICE, |payload| {
            Self::apply_payload(payload, &mut state, on_delta)
        })
        .await?;

        if state.text.is_empty() {
            return Err(Error::external(SERVICE, "returned empty response"));
        }

        debug!(
            input = state.usage.input_tokens,
            output = state.usage.output_tokens,
            "token usage"
        );

        Ok(Completion {
            text: state.text,
            usage: Some(state.usage),
        })
    }
}

#[derive(Default)]
struct StreamState {
    text: String,
    usage: TokenUsage,
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ApiMessage<'a>],
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: StartMessage,
    },
    ContentBlockDelta {
        delta: TextDelta,
    },
    MessageDelta {
        usage: Option<DeltaUsage>,
    },
    MessageStop,
    Error {
        error: ApiError,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct StartMessage {
    usage: StartUsage,
}

#[derive(Deserialize)]
struct StartUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Deserialize)]
struct TextDelta {
    text: Option<String>,
}

#[derive(Deserialize)]
struct DeltaUsage {
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

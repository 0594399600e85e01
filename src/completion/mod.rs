pub mod anthropic;
pub mod mock;
pub mod openai;
pub mod sse;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Who is speaking in a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A fully rendered prompt, ready to send to a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    pub messages: Vec<Message>,
}

impl Prompt {
    /// A prompt made of one user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(Role::User, content)],
        }
    }

    /// System messages joined by blank lines, if any.
    pub fn system(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// The last user message.
    pub fn last_user(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "<{}>\n{}\n</{}>", message.role, message.content, message.role)?;
        }
        Ok(())
    }
}

/// Token usage from a single model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Total tokens (input + output).
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// What a model returned for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Receives streamed text as it arrives.
pub type OnDelta = dyn for<'a> Fn(&'a str) + Send + Sync;

/// The text-completion capability. Could be a hosted model or a test script.
///
/// `on_delta` receives text as it streams in. Implementations that cannot
/// stream call it once with the whole text.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        prompt: &Prompt,
        on_delta: &OnDelta,
    ) -> Result<Completion>;
}

#[async_trait]
impl<T: TextCompletion + ?Sized> TextCompletion for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn complete(
        &self,
        prompt: &Prompt,
        on_delta: &OnDelta,
    ) -> Result<Completion> {
        (**self).complete(prompt, on_delta).await
    }
}

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Completion, OnDelta, Prompt, TextCompletion, TokenUsage};
use crate::error::{Error, Result};

/// What a [`MockCompletion`] answers with.
enum Behavior {
    /// Reply with the prompt's last user message.
    Echo,
    /// Replay canned replies in order. `Err` becomes an external-call failure.
    Script(Vec<std::result::Result<String, String>>),
}

/// A scripted completion source for tests and offline runs.
/// Records every prompt it receives.
pub struct MockCompletion {
    behavior: Behavior,
    index: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl MockCompletion {
    pub fn echo() -> Self {
        Self::with(Behavior::Echo)
    }

    pub fn scripted(replies: Vec<std::result::Result<String, String>>) -> Self {
        Self::with(Behavior::Script(replies))
    }

    /// Replies that all succeed.
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextCompletion for MockCompletion {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        prompt: &Prompt,
        on_delta: &OnDelta,
    ) -> Result<Completion> {
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());

        let text = match &self.behavior {
            Behavior::Echo => prompt.last_user().unwrap_or_default().to_string(),
            Behavior::Script(replies) => match replies.get(i) {
                Some(Ok(text)) => text.clone(),
                Some(Err(message)) => return Err(Error::external("mock", message.clone())),
                None => {
                    return Err(Error::external(
                        "mock",
                        format!("no more replies (called {} times)", i + 1),
                    ));
                }
            },
        };

        on_delta(&text);
        let usage = TokenUsage {
            input_tokens: prompt
                .messages
                .iter()
                .map(|m| m.content.split_whitespace().count() as u64)
                .sum(),
            output_tokens: text.split_whitespace().count() as u64,
        };
        Ok(Completion {
            text,
            usage: Some(usage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_returns_last_user_message() {
        let mock = MockCompletion::echo();
        let out = mock.complete(&Prompt::user("ping"), &|_| {}).await.unwrap();
        assert_eq!(out.text, "ping");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn script_replays_in_order_then_runs_dry() {
        let mock = MockCompletion::replies(["a", "b"]);
        let p = Prompt::user("x");
        assert_eq!(mock.complete(&p, &|_| {}).await.unwrap().text, "a");
        assert_eq!(mock.complete(&p, &|_| {}).await.unwrap().text, "b");
        let err = mock.complete(&p, &|_| {}).await.unwrap_err();
        assert!(err.to_string().contains("no more replies"));
    }

    #[tokio::test]
    async fn scripted_failure_is_external_call() {
        let mock = MockCompletion::scripted(vec![Err("down".to_string())]);
        let err = mock.complete(&Prompt::user("x"), &|_| {}).await.unwrap_err();
        assert!(matches!(err, Error::ExternalCall { .. }));
    }

    #[tokio::test]
    async fn records_prompts() {
        let mock = MockCompletion::echo();
        mock.complete(&Prompt::user("one"), &|_| {}).await.unwrap();
        mock.complete(&Prompt::user("two"), &|_| {}).await.unwrap();
        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[1].last_user(), Some("two"));
    }
}

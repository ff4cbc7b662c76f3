//! The generator seam: the LlmClient trait and a scripted mock

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{ParsegenError, Result};
use crate::llm::types::{CompletionRequest, CompletionResponse, StopReason, Usage};

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model identifier sent to the provider
    fn model(&self) -> &str;

    /// Whether the client has what it needs to make calls
    fn is_ready(&self) -> bool;

    /// Tokens spent across every call made so far
    fn usage(&self) -> Usage {
        Usage::default()
    }

    /// One-shot completion of a single prompt, returning the response text
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest::default().with_user_message(prompt);
        let response = self.complete(request).await?;
        if response.stop_reason.is_truncated() {
            log::warn!("{} response hit the token limit; code may be incomplete", self.model());
        }
        Ok(response.content)
    }
}

/// Scripted reply for [`MockLlmClient`]
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(String),
}

/// Replays scripted replies in order and records every prompt it receives
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<MockReply>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicU32,
    usage: Mutex<Usage>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that answers with each text in turn
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_replies(texts.into_iter().map(|t| MockReply::Text(t.into())))
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Last user message of every request, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = request.messages.last() {
            self.prompts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.content.clone());
        }

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match reply {
            Some(MockReply::Text(content)) => {
                let usage = Usage::new(request_tokens(&request), (content.len() / 4) as u64);
                self.usage
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .add(&usage);
                Ok(CompletionResponse {
                    usage,
                    content,
                    stop_reason: StopReason::EndTurn,
                })
            }
            Some(MockReply::Error(message)) => Err(ParsegenError::Llm(message)),
            None => Err(ParsegenError::Llm("mock has no scripted reply left".to_string())),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn usage(&self) -> Usage {
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn request_tokens(request: &CompletionRequest) -> u64 {
    let chars: usize = request.messages.iter().map(|m| m.content.len()).sum();
    (chars / 4) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let mock = MockLlmClient::with_texts(["first", "second"]);
        assert_eq!(mock.generate("a").await.unwrap(), "first");
        assert_eq!(mock.generate("b").await.unwrap(), "second");
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.prompts(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_mock_error_reply() {
        let mock = MockLlmClient::with_replies([MockReply::Error("quota exceeded".into())]);
        let err = mock.generate("x").await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_exhausted() {
        let mock = MockLlmClient::new();
        assert!(mock.generate("x").await.is_err());
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn test_mock_tallies_usage() {
        let mock = MockLlmClient::with_replies([
            MockReply::Text("12345678".into()),
            MockReply::Error("quota exceeded".into()),
            MockReply::Text("1234".into()),
        ]);
        assert_eq!(mock.usage().total(), 0);

        mock.generate("abcdefgh").await.unwrap();
        let _ = mock.generate("abcd").await;
        mock.generate("abcd").await.unwrap();

        let usage = mock.usage();
        assert_eq!(usage.input_tokens, 3);
        assert_eq!(usage.output_tokens, 3);
    }

    #[test]
    fn test_mock_identity() {
        let mock = MockLlmClient::new();
        assert!(mock.is_ready());
        assert_eq!(mock.model(), "mock-model");
    }
}

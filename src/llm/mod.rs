//! LLM Client Layer - the parser author
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction (the `generate` collaborator)
//! - GeminiClient and AnthropicClient implementations
//! - Credentials and provider selection
//! - MockLlmClient for tests

pub mod anthropic;
pub mod client;
pub mod gemini;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicClient;
pub use client::{LlmClient, MockLlmClient, MockReply};
pub use gemini::GeminiClient;
pub use provider::{ClientConfig, Credentials, Provider, build_client};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};

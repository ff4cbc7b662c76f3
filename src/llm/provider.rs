//! Provider selection, credentials and client construction.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParsegenError, Result};
use crate::llm::anthropic::AnthropicClient;
use crate::llm::client::LlmClient;
use crate::llm::gemini::GeminiClient;

/// Which hosted model family authors the parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Anthropic,
}

impl Provider {
    /// Environment variable holding this provider's API key
    pub fn credential_env(&self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-pro",
            Provider::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Settings shared by every HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            model: provider.default_model().to_string(),
            max_tokens: 8192,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn gemini() -> Self {
        Self::for_provider(Provider::Gemini)
    }

    pub fn anthropic() -> Self {
        Self::for_provider(Provider::Anthropic)
    }
}

/// The single credential the generator needs, read once at startup
#[derive(Clone)]
pub struct Credentials {
    provider: Provider,
    api_key: String,
}

impl Credentials {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
        }
    }

    /// Read the provider's key from the process environment
    pub fn from_env(provider: Provider) -> Result<Self> {
        Self::from_lookup(provider, |name| std::env::var(name).ok())
    }

    /// Read the provider's key through an arbitrary lookup; blank counts as missing
    pub fn from_lookup<F>(provider: Provider, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_var = provider.credential_env();
        match lookup(env_var) {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(provider, key.trim())),
            _ => Err(ParsegenError::Config(format!(
                "{} is not set; the {} generator cannot be configured",
                env_var, provider
            ))),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Build the generator client for the credential's provider
pub fn build_client(credentials: Credentials, config: ClientConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match credentials.provider {
        Provider::Gemini => Arc::new(GeminiClient::with_api_key(credentials.api_key, config)?),
        Provider::Anthropic => Arc::new(AnthropicClient::with_api_key(credentials.api_key, config)?),
    };
    Ok(client)
}

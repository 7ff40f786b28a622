//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for the generation backends:
//! - **Gemini**: Google `generateContent` REST API (default)
//! - **Ollama**: Local LLM inference (feature `ollama`)

use crate::types::{AppError, Message, Result};
use crate::utils::toml_config::{ProviderConfig, RelayConfig};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// The relay treats generation as a black box: ordered context in, reply
/// text out, any failure surfaces as [`AppError::Backend`].
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a reply.
    ///
    /// `context` is the full ordered conversation (history, optional
    /// reminder, framed turn); `turn` is sent again as the immediate user
    /// message, the way a chat session is seeded with history and then
    /// receives the new message.
    async fn generate(&self, context: &[Message], turn: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Sampling settings forwarded to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Gemini API
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Gemini {
    ///     api_key: "AIza...".to_string(),
    ///     api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    ///     model: "gemini-1.5-flash".to_string(),
    ///     system_instruction: "Ты — бот-братишка".to_string(),
    ///     settings: GenerationSettings::default(),
    ///     timeout_secs: 60,
    /// };
    /// ```
    Gemini {
        api_key: String,
        api_base: String,
        model: String,
        system_instruction: String,
        settings: GenerationSettings,
        timeout_secs: u64,
    },

    /// Ollama local LLM provider
    Ollama {
        base_url: String,
        model: String,
        system_instruction: String,
    },
}

impl Provider {
    /// Build the provider described by the configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let system_instruction = config.persona.system_instruction.clone();

        match &config.provider {
            ProviderConfig::Gemini {
                api_base,
                model,
                temperature,
                top_p,
                top_k,
                max_output_tokens,
                timeout_secs,
                ..
            } => {
                let api_key = config
                    .provider_api_key()
                    .map_err(|e| AppError::Config(e.to_string()))?
                    .unwrap_or_default();
                Ok(Provider::Gemini {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.clone(),
                    system_instruction,
                    settings: GenerationSettings {
                        temperature: *temperature,
                        top_p: *top_p,
                        top_k: *top_k,
                        max_output_tokens: *max_output_tokens,
                    },
                    timeout_secs: *timeout_secs,
                })
            }
            ProviderConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
                system_instruction,
            }),
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider was compiled out or its HTTP client
    /// cannot be built.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Gemini {
                api_key,
                api_base,
                model,
                system_instruction,
                settings,
                timeout_secs,
            } => Ok(Box::new(
                super::gemini::GeminiClient::new(
                    api_key.clone(),
                    api_base.clone(),
                    model.clone(),
                    system_instruction.clone(),
                    settings.clone(),
                )
                .with_timeout(std::time::Duration::from_secs(*timeout_secs)),
            )),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                system_instruction,
            } => Ok(Box::new(
                super::ollama::OllamaClient::new(
                    base_url.clone(),
                    model.clone(),
                    system_instruction.clone(),
                )
                .await?,
            )),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { model, .. } => Err(AppError::Config(format!(
                "Ollama provider requested for model '{}' but the `ollama` feature is disabled",
                model
            ))),
        }
    }

    /// Check if this provider is compiled into the binary
    pub fn is_available(&self) -> bool {
        match self {
            Provider::Gemini { .. } => true,
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}

/// Configuration-based client factory
///
/// # Example
///
/// ```rust,ignore
/// use relay::llm::{LLMClientFactory, Provider};
///
/// let factory = LLMClientFactory::new(Provider::from_config(&config)?);
/// let client = factory.create_default().await?;
/// ```
pub struct LLMClientFactory {
    default_provider: Provider,
}

impl LLMClientFactory {
    /// Create a new factory with the specified default provider
    pub fn new(default_provider: Provider) -> Self {
        Self { default_provider }
    }

    /// Create a factory for the provider described by the configuration
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        Ok(Self::new(Provider::from_config(config)?))
    }

    /// Create a client using the default provider
    pub async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.default_provider.create_client().await
    }

    /// Get a reference to the default provider
    pub fn default_provider(&self) -> &Provider {
        &self.default_provider
    }
}

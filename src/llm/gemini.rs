use crate::llm::client::{GenerationSettings, LLMClient};
use crate::types::{AppError, Message, Result, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for one generation request
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    system_instruction: String,
    settings: GenerationSettings,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        system_instruction: String,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            system_instruction,
            settings,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_request(&self, context: &[Message], turn: &str) -> GenerateContentRequest {
        let mut contents: Vec<Content> = context.iter().map(Content::from).collect();
        contents.push(Content {
            role: Role::User.as_str().to_string(),
            parts: vec![Part {
                text: turn.to_string(),
            }],
        });

        let system_instruction = if self.system_instruction.trim().is_empty() {
            None
        } else {
            Some(SystemInstruction {
                parts: vec![Part {
                    text: self.system_instruction.clone(),
                }],
            })
        };

        GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                top_p: self.settings.top_p,
                top_k: self.settings.top_k,
                max_output_tokens: self.settings.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, context: &[Message], turn: &str) -> Result<String> {
        let request = self.build_request(context, turn);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!(
                "Gemini HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("Malformed Gemini response: {}", e)))?;

        body.into_text()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl From<&Message> for Content {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            parts: message
                .parts()
                .iter()
                .map(|text| Part { text: text.clone() })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AppError::Backend(format!("Gemini blocked the prompt: {}", reason)));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Backend("Gemini returned no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::Backend(format!(
                "Gemini returned an empty reply (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

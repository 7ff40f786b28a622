use crate::llm::client::LLMClient;
use crate::types::{AppError, Message, Result, Role};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};

pub struct OllamaClient {
    client: Ollama,
    model: String,
    system_instruction: String,
}

impl OllamaClient {
    pub async fn new(base_url: String, model: String, system_instruction: String) -> Result<Self> {
        let client = Ollama::try_new(base_url.as_str()).map_err(|e| {
            AppError::Config(format!("Invalid Ollama base_url '{}': {}", base_url, e))
        })?;

        Ok(Self {
            client,
            model,
            system_instruction,
        })
    }

    fn build_messages(&self, context: &[Message], turn: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(context.len() + 2);
        if !self.system_instruction.trim().is_empty() {
            messages.push(ChatMessage::system(self.system_instruction.clone()));
        }
        messages.extend(context.iter().map(|message| match message.role {
            Role::User => ChatMessage::user(message.text()),
            Role::Model => ChatMessage::assistant(message.text()),
        }));
        messages.push(ChatMessage::user(turn.to_string()));
        messages
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, context: &[Message], turn: &str) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), self.build_messages(context, turn));

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::Backend(format!("Ollama error: {}", e)))?;

        if response.message.content.trim().is_empty() {
            return Err(AppError::Backend("Ollama returned an empty reply".to_string()));
        }
        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

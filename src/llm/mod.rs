//! Generation Backend Clients
//!
//! This module hides the text-generation backend behind one trait so the
//! relay never depends on a particular provider.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection, built from `relay.toml`
//! - [`LLMClientFactory`] - Creates the configured client
//!
//! # Supported Providers
//!
//! - `gemini` - Google Gemini REST API (always compiled)
//! - `ollama` - Local Ollama server (Cargo feature `ollama`, on by default)

/// Core LLM client trait, provider enum and factory.
pub mod client;
/// Gemini `generateContent` client.
pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{GenerationSettings, LLMClient, LLMClientFactory, Provider};
pub use gemini::GeminiClient;

//! TOML-based configuration for the relay bot
//!
//! All behavior knobs live in one file (`relay.toml`): the Telegram
//! transport, the generation backend, the persona (wake-words, fallback text,
//! system instruction) and memory limits. Secrets are never stored in the
//! file; the file names environment variables that hold them.
//!
//! # Hot Reloading
//!
//! `RelayConfigManager` hands out lock-free snapshots and can watch the file
//! for changes. Persona settings are read per exchange, so they reload live.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::context::DEFAULT_REMINDER_TEMPLATE;
use crate::gate::DEFAULT_WAKE_WORDS;
use crate::memory::{DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_FACTS, MemoryLimits};

/// Root configuration structure loaded from relay.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub persona: PersonaConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= Telegram Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Environment variable containing the bot token from @BotFather
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Long-polling timeout in seconds
    #[serde(default = "default_polling_timeout")]
    pub polling_timeout: u32,
}

fn default_bot_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_polling_timeout() -> u32 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            api_base: default_telegram_api_base(),
            polling_timeout: default_polling_timeout(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        /// Environment variable containing the API key
        #[serde(default = "default_gemini_key_env")]
        api_key_env: String,
        #[serde(default = "default_gemini_base")]
        api_base: String,
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default = "default_temperature")]
        temperature: f32,
        #[serde(default = "default_top_p")]
        top_p: f32,
        #[serde(default = "default_top_k")]
        top_k: u32,
        #[serde(default = "default_max_output_tokens")]
        max_output_tokens: u32,
        #[serde(default = "default_request_timeout")]
        timeout_secs: u64,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        model: String,
    },
}

fn default_gemini_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_request_timeout() -> u64 {
    60
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Gemini {
            api_key_env: default_gemini_key_env(),
            api_base: default_gemini_base(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_request_timeout(),
        }
    }
}

// ============= Persona Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Words that wake the bot up in group chats (case-insensitive)
    #[serde(default = "default_wake_words")]
    pub wake_words: Vec<String>,

    /// Reply sent when generation fails
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,

    /// System instruction handed to the backend with every request
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    /// Template of the in-band facts reminder
    #[serde(default = "default_reminder_template")]
    pub reminder_template: String,
}

fn default_wake_words() -> Vec<String> {
    DEFAULT_WAKE_WORDS.iter().map(|w| w.to_string()).collect()
}

fn default_fallback_reply() -> String {
    "Чёт я затупил, братишка… Попробуй ещё разок.".to_string()
}

fn default_system_instruction() -> String {
    "Ты — бот-братишка, тёплый, душевный, чуть уличный, ворчливый. Тебя зовут Расул Младший.\n\
     Отвечай просто, с характером, по-доброму. Периодически обижаешься на всякую ерунду, \
     любишь рестораны, а не кафе.\n\
     Иногда можешь вставить лёгкий сленг, но не переигрывай. Никогда не говори, что ты ИИ \
     или модель. Просто будь своим."
        .to_string()
}

fn default_reminder_template() -> String {
    DEFAULT_REMINDER_TEMPLATE.to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            wake_words: default_wake_words(),
            fallback_reply: default_fallback_reply(),
            system_instruction: default_system_instruction(),
            reminder_template: default_reminder_template(),
        }
    }
}

// ============= Memory Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// History entries kept per conversation
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Facts kept per user
    #[serde(default = "default_max_facts")]
    pub max_facts: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_max_facts() -> usize {
    DEFAULT_MAX_FACTS
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_facts: default_max_facts(),
        }
    }
}

impl From<&MemoryConfig> for MemoryLimits {
    fn from(config: &MemoryConfig) -> Self {
        MemoryLimits {
            history_limit: config.history_limit,
            max_facts: config.max_facts,
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl RelayConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RelayConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency
    ///
    /// Environment variables are checked lazily by [`RelayConfig::bot_token`]
    /// and [`RelayConfig::provider_api_key`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "memory.history_limit must be at least 1".to_string(),
            ));
        }
        if self.memory.max_facts == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_facts must be at least 1".to_string(),
            ));
        }
        if self.persona.wake_words.iter().all(|w| w.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "persona.wake_words must contain at least one non-empty word".to_string(),
            ));
        }
        if self.persona.fallback_reply.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "persona.fallback_reply must not be empty".to_string(),
            ));
        }
        if self.telegram.polling_timeout == 0 {
            return Err(ConfigError::ValidationError(
                "telegram.polling_timeout must be at least 1 second".to_string(),
            ));
        }

        match &self.provider {
            ProviderConfig::Gemini {
                model, top_k, max_output_tokens, ..
            } => {
                if model.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "provider.model must not be empty".to_string(),
                    ));
                }
                if *top_k == 0 || *max_output_tokens == 0 {
                    return Err(ConfigError::ValidationError(
                        "provider.top_k and provider.max_output_tokens must be positive"
                            .to_string(),
                    ));
                }
            }
            ProviderConfig::Ollama { model, .. } => {
                if model.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "provider.model must not be empty".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get the Telegram bot token from the environment
    pub fn bot_token(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.telegram.bot_token_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.telegram.bot_token_env.clone()))
    }

    /// Get the backend API key from the environment (`None` for keyless providers)
    pub fn provider_api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.provider {
            ProviderConfig::Gemini { api_key_env, .. } => self
                .resolve_env(api_key_env)
                .map(Some)
                .ok_or_else(|| ConfigError::MissingEnvVar(api_key_env.clone())),
            ProviderConfig::Ollama { .. } => Ok(None),
        }
    }

    pub fn memory_limits(&self) -> MemoryLimits {
        MemoryLimits::from(&self.memory)
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct RelayConfigManager {
    config: Arc<ArcSwap<RelayConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl RelayConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = RelayConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Create a config manager directly from a config (useful for testing)
    /// This won't have file watching capabilities.
    pub fn from_config(config: RelayConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("relay.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<RelayConfig> {
        self.config.load_full()
    }

    /// Replace the current configuration after validating it
    pub fn store(&self, config: RelayConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config.store(Arc::new(config));
        Ok(())
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = RelayConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        // Debounced in the receiver
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the parent directory so editors that replace the file are seen
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let debounce_duration = Duration::from_millis(500);
            let mut last_reload: Option<std::time::Instant> = None;

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|at| at.elapsed() < debounce_duration) {
                    continue;
                }

                // Wait a bit for file write to complete
                tokio::time::sleep(Duration::from_millis(100)).await;

                match RelayConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

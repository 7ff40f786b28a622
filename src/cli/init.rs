//! Init command implementation
//!
//! Scaffolds a bot directory: `relay.toml`, `.env.example` and `.gitignore`.

use super::InitProvider;
use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// relay.toml already exists
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Generation backend to configure
    pub provider: InitProvider,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing relay-bot");

    let base_path = &config.path;

    let config_path = base_path.join("relay.toml");
    if config_path.exists() && !config.force {
        output.warning("relay.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
        output.created("directory", &base_path.display().to_string());
    }

    output.subheader("Creating configuration files");

    let toml_content = generate_relay_toml(config.provider);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create relay.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "relay.toml");

    let env_example_path = base_path.join(".env.example");
    if env_example_path.exists() && !config.force {
        output.skipped(".env.example", "already exists");
    } else {
        if let Err(e) = write_file(&env_example_path, &generate_env_example(config.provider), true)
        {
            output.error(&format!("Failed to create .env.example: {}", e));
            return InitResult::Error(e.to_string());
        }
        output.created("env", ".env.example");
    }

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        if let Err(e) = write_file(&gitignore_path, generate_gitignore(), false) {
            output.warning(&format!("Failed to create .gitignore: {}", e));
        } else {
            output.created("file", ".gitignore");
        }
    }

    output.complete("relay-bot initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set up environment variables:");
    output.command("cp .env.example .env");
    output.command("# Edit .env and set TELEGRAM_BOT_TOKEN from @BotFather");
    output.newline();

    match config.provider {
        InitProvider::Gemini => {
            output.info("2. Add your Gemini key to .env:");
            output.command("# GEMINI_API_KEY=...");
        }
        InitProvider::Ollama => {
            output.info("2. Start Ollama (if not running):");
            output.command("ollama serve");
            output.command("ollama pull llama3.2  # or your preferred model");
        }
    }
    output.newline();

    output.info("3. Start the bot:");
    output.command("relay-bot");
    output.newline();

    output.hint("Edit [persona] in relay.toml while the bot runs; changes apply live");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_relay_toml(provider: InitProvider) -> String {
    let provider_section = match provider {
        InitProvider::Gemini => {
            r#"# Google Gemini (set GEMINI_API_KEY in .env)
[provider]
type = "gemini"
api_key_env = "GEMINI_API_KEY"
model = "gemini-1.5-flash"
temperature = 0.8
top_p = 0.95
top_k = 40
max_output_tokens = 2048
timeout_secs = 60
"#
        }
        InitProvider::Ollama => {
            r#"# Ollama - Local inference (no API key required)
[provider]
type = "ollama"
base_url = "http://localhost:11434"
model = "llama3.2"
"#
        }
    };

    format!(
        r#"# relay-bot configuration
#
# Secrets are never stored here; the *_env keys name environment
# variables (a .env file next to this one is loaded at startup).

[telegram]
bot_token_env = "TELEGRAM_BOT_TOKEN"
api_base = "https://api.telegram.org"
# Long-polling timeout in seconds
polling_timeout = 30

{provider_section}
# Persona settings reload live when this file changes
[persona]
# Words that wake the bot in group chats (case-insensitive)
wake_words = ["расул", "заменитель"]
# Sent when the backend fails
fallback_reply = "Чёт я затупил, братишка… Попробуй ещё разок."
# In-band reminder of what the bot knows about the speaker
reminder_template = "Вот что ты знаешь про {{nickname}}: {{facts}}"
# system_instruction = "..."   # uncomment to replace the built-in persona

# Fixed at startup
[memory]
history_limit = 20
max_facts = 50

[logging]
# Overridden by RUST_LOG
level = "info"
json = false
"#
    )
}

fn generate_env_example(provider: InitProvider) -> String {
    let mut content = String::from(
        "# Telegram bot token from @BotFather\n\
         TELEGRAM_BOT_TOKEN=\n",
    );
    if provider == InitProvider::Gemini {
        content.push_str(
            "\n# Google AI Studio key\n\
             GEMINI_API_KEY=\n",
        );
    }
    content.push_str("\n# Log filter (overrides [logging].level)\nRUST_LOG=info\n");
    content
}

fn generate_gitignore() -> &'static str {
    "# Secrets\n.env\n\n# Build output\n/target/\n\n# OS files\n.DS_Store\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::{ProviderConfig, RelayConfig};
    use tempfile::TempDir;

    fn init_config(dir: &TempDir, provider: InitProvider, force: bool) -> InitConfig {
        InitConfig {
            path: dir.path().to_path_buf(),
            force,
            provider,
        }
    }

    #[test]
    fn test_generated_gemini_toml_parses() {
        let config = RelayConfig::from_toml_str(&generate_relay_toml(InitProvider::Gemini))
            .expect("generated config must be valid");

        assert!(matches!(config.provider, ProviderConfig::Gemini { .. }));
        assert_eq!(config.memory.history_limit, 20);
        assert_eq!(
            config.persona.reminder_template,
            "Вот что ты знаешь про {nickname}: {facts}"
        );
        assert!(config.persona.system_instruction.contains("Расул Младший"));
    }

    #[test]
    fn test_generated_ollama_toml_parses() {
        let config = RelayConfig::from_toml_str(&generate_relay_toml(InitProvider::Ollama))
            .expect("generated config must be valid");

        match config.provider {
            ProviderConfig::Ollama { model, .. } => assert_eq!(model, "llama3.2"),
            _ => panic!("Expected ollama provider"),
        }
    }

    #[test]
    fn test_generate_env_example() {
        let gemini = generate_env_example(InitProvider::Gemini);
        assert!(gemini.contains("TELEGRAM_BOT_TOKEN="));
        assert!(gemini.contains("GEMINI_API_KEY="));
        assert!(gemini.contains("RUST_LOG"));

        let ollama = generate_env_example(InitProvider::Ollama);
        assert!(!ollama.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_write_file_skips_existing_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, "original").expect("Failed to write");

        write_file(&file_path, "new content", false).unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "original");

        write_file(&file_path, "new content", true).unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[test]
    fn test_run_creates_all_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output = Output::no_color();

        let result = run(init_config(&temp_dir, InitProvider::Gemini, false), &output);

        assert!(matches!(result, InitResult::Success));
        assert!(temp_dir.path().join("relay.toml").exists());
        assert!(temp_dir.path().join(".env.example").exists());
        assert!(temp_dir.path().join(".gitignore").exists());
    }

    #[test]
    fn test_run_creates_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let nested = temp_dir.path().join("bots/rasul");
        let output = Output::no_color();

        let result = run(
            InitConfig {
                path: nested.clone(),
                force: false,
                provider: InitProvider::Ollama,
            },
            &output,
        );

        assert!(matches!(result, InitResult::Success));
        assert!(nested.join("relay.toml").exists());
    }

    #[test]
    fn test_run_already_exists_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("relay.toml"), "existing").expect("Failed to write");
        let output = Output::no_color();

        let result = run(init_config(&temp_dir, InitProvider::Gemini, false), &output);

        assert!(matches!(result, InitResult::AlreadyExists));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("relay.toml")).unwrap(),
            "existing"
        );
    }

    #[test]
    fn test_run_force_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("relay.toml"), "existing").expect("Failed to write");
        let output = Output::no_color();

        let result = run(init_config(&temp_dir, InitProvider::Ollama, true), &output);

        assert!(matches!(result, InitResult::Success));
        let content = fs::read_to_string(temp_dir.path().join("relay.toml")).unwrap();
        assert!(content.contains("type = \"ollama\""));
        assert!(!content.contains("existing"));
    }
}

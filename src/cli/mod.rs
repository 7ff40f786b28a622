//! CLI module for relay-bot
//!
//! Provides command-line interface parsing and handling for the relay-bot binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// relay-bot - Telegram relay for a generative-text persona
///
/// Listens to Telegram chats, answers when addressed, and remembers what it
/// is told about people.
#[derive(Parser, Debug)]
#[command(
    name = "relay-bot",
    version,
    about = "Telegram relay bot with per-chat history and per-user memory",
    long_about = "A Telegram bot that answers in private chats, or in groups when called by\n\
                  name, mentioned or replied to. Replies come from Gemini or Ollama.\n\n\
                  Run without arguments to start the bot, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  relay-bot init                     # Write relay.toml and .env.example\n    \
                  relay-bot init --provider ollama   # Use a local Ollama server\n    \
                  relay-bot                          # Start the bot (requires relay.toml)\n    \
                  relay-bot --config my.toml run     # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "relay.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output (forces debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot (the default when no subcommand is given)
    Run,

    /// Write a starter relay.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Generation backend to configure
        #[arg(long, value_enum, default_value_t = InitProvider::Gemini)]
        provider: InitProvider,
    },
}

/// Backend choices offered by `init`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitProvider {
    Gemini,
    Ollama,
}

impl fmt::Display for InitProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitProvider::Gemini => f.write_str("gemini"),
            InitProvider::Ollama => f.write_str("ollama"),
        }
    }
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

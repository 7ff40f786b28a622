use anyhow::Context;
use relay::cli::init::{self, InitConfig, InitResult};
use relay::cli::output::Output;
use relay::cli::{Cli, Commands};
use relay::{
    LLMClientFactory, MemoryStore, Relay, RelayConfig, RelayConfigManager, TelegramChannel,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let output = Output::for_cli(cli.no_color);

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            provider,
        }) => match init::run(
            InitConfig {
                path,
                force,
                provider,
            },
            &output,
        ) {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => anyhow::bail!("init failed: {}", e),
        },
        Some(Commands::Run) | None => run_bot(&cli, &output).await,
    }
}

async fn run_bot(cli: &Cli, output: &Output) -> anyhow::Result<()> {
    // Missing .env is fine; variables may come from the environment
    dotenvy::dotenv().ok();

    let manager = match RelayConfigManager::new(&cli.config) {
        Ok(manager) => Arc::new(manager),
        Err(e) => {
            output.error(&format!("Failed to load {}: {}", cli.config.display(), e));
            output.hint("Run `relay-bot init` to create a starter configuration");
            return Err(e.into());
        }
    };
    let config = manager.config();

    init_tracing(&config, cli.verbose);

    output.banner();
    output.kv("config", &manager.config_path().display().to_string());

    let store = Arc::new(MemoryStore::new(config.memory_limits()));

    let factory = LLMClientFactory::from_config(&config).context("backend configuration")?;
    let client = factory
        .create_default()
        .await
        .context("failed to create generation backend")?;
    output.kv("backend", factory.default_provider().name());
    output.kv("model", client.model_name());

    let token = config.bot_token()?;
    let channel = Arc::new(TelegramChannel::new(token, &config.telegram));
    let identity = channel
        .get_me()
        .await
        .context("Telegram getMe failed; check the bot token")?;
    output.kv("bot", &format!("@{} ({})", identity.handle, identity.id));

    if let Err(e) = manager.start_watching() {
        warn!("Config hot-reload disabled: {}", e);
    }

    let events = channel.start_receiving();
    let bot = Arc::new(Relay::new(
        store,
        Arc::from(client),
        Arc::clone(&manager),
        identity,
    ));

    output.success("Bot is running. Press Ctrl-C to stop.");
    relay::serve(bot, channel.clone(), events).await;

    channel.stop_polling();
    manager.stop_watching();
    info!("relay-bot stopped");
    Ok(())
}

fn init_tracing(config: &RelayConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("relay=debug,relay_bot=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "relay={level},relay_bot={level}",
                level = config.logging.level
            ))
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

mod booru;
mod commands;
mod config;
mod context;
mod error;
mod registry;
mod router;
mod session;
mod store;

use std::process::ExitCode;
use std::sync::Arc;

use log::{debug, error, info};
use serenity::{client::Client, prelude::GatewayIntents};
use tokio::signal;

use crate::booru::Derpibooru;
use crate::config::BotConfig;
use crate::session::{BotState, Handler};
use crate::store::{RedisStore, UserStore};

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "warn,sunbot_rust=debug"
    } else {
        "warn,sunbot_rust=info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();
}

/// Connect to Redis when configured. A failed connection leaves persistence off for
/// the rest of the run; there is no retry.
async fn connect_store(config: &BotConfig) -> Option<UserStore> {
    if !config.persistence_enabled() {
        debug!("REDIS_URL not set; persistence disabled");
        return None;
    }
    let url = config.redis_url.as_deref()?;

    println!("🔌 Connecting to Redis...");
    match RedisStore::connect(url, config.redis_password.as_deref()).await {
        Ok(backend) => {
            info!("✅ Redis connected; post counting enabled");
            Some(UserStore::new(Arc::new(backend)))
        }
        Err(e) => {
            error!("❌ Error connecting to Redis: {}", e);
            eprintln!("❌ Error connecting to Redis, continuing without persistence: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // botconfig.txt is optional; the environment alone is enough
    let config_source = config::load_bot_config();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            eprintln!("Set DISCORD_AUTH_TOKEN in the environment or in botconfig.txt (DISCORD_AUTH_TOKEN=your_token_here)");
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.debug);
    match config_source {
        Some(path) => info!("✅ Configuration loaded from {}", path),
        None => debug!("No botconfig.txt found; using the environment only"),
    }

    let registry = match commands::build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!("❌ Invalid command table: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Registered {} commands", registry.len());

    let board = match Derpibooru::new(config.derpi_api_key.clone()) {
        Ok(board) => board,
        Err(e) => {
            error!("❌ Error creating HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = connect_store(&config).await;

    println!("🤖 Starting bot with prefix: '{}'", config.prefix);

    let token = config.auth_token.clone();
    let state = Arc::new(BotState {
        config,
        registry,
        store,
        board: Box::new(board),
    });

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    let mut client = match Client::builder(token, intents)
        .event_handler(Handler::new(state))
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Error creating Discord client: {:?}", e);
            eprintln!("Check DISCORD_AUTH_TOKEN");
            return ExitCode::FAILURE;
        }
    };

    // Ctrl+C closes every shard, which makes client.start() return
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to listen for Ctrl+C: {}", e);
            return;
        }
        println!("\n⏹️ Stopping bot gracefully...");
        shard_manager.lock().await.shutdown_all().await;
    });

    println!("🚀 Bot is running... Press Ctrl+C to stop");
    if let Err(why) = client.start().await {
        error!("❌ Client error: {:?}", why);
        return ExitCode::FAILURE;
    }

    println!("✅ Bot stopped");
    ExitCode::SUCCESS
}

use anyhow::{Context, Result};
use currybot::bot::CurryBot;
use currybot::cache::TtlCache;
use currybot::config::Settings;
use currybot::convert::CurrencyConverter;
use currybot::pricing::PricingClient;
use currybot::snapshot::SnapshotStore;
use currybot::transport::console::ConsoleGateway;
use currybot::transport::{ChannelId, UserId};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// User id assigned to the console operator.
const CONSOLE_USER: UserId = UserId(1);
/// Channel id used for all console traffic.
const CONSOLE_CHANNEL: ChannelId = ChannelId(0);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenv().ok();

    init_logging();

    info!("Starting currybot...");

    let settings = init_settings();

    let store = SnapshotStore::new(settings.snapshot_dir.clone());
    let cache = TtlCache::new(store, settings.snapshot_ttl());
    let feed = Arc::new(
        PricingClient::new(settings.pricing_api_key.clone())
            .context("failed to build pricing HTTP client")?,
    );
    let converter = CurrencyConverter::new(cache, feed);
    info!("Converter initialized.");

    let gateway = ConsoleGateway::new();
    let bot = CurryBot::new(
        gateway,
        converter,
        UserId(settings.bot_user_id),
        settings.page_size,
        settings.session_policy(),
    );

    info!("Bot is running. Commands: !list, !convert, !help; navigate with < and >.");
    run_console_loop(&bot).await;

    Ok(())
}

/// Feed stdin lines to the bot until input ends.
async fn run_console_loop(bot: &CurryBot<ConsoleGateway>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let event = bot
                    .gateway()
                    .event_from_line(CONSOLE_USER, CONSOLE_CHANNEL, &line);
                if let Some(event) = event {
                    if let Err(e) = bot.handle_event(&event).await {
                        error!("event handler error: {}", e);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("stdin read error: {}", e);
                break;
            }
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

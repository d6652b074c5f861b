//! # tipline-server
//!
//! Telegram bot that relays anonymous photo/video submissions to a review
//! chat.
//!
//! This binary provides:
//! - **Album aggregation**: the messages of one Telegram album are collected
//!   and forwarded as a single grouped post once the burst is over
//! - **Single-item forwarding** for lone photos and videos
//! - **Trailing captions**: a text sent right after an album becomes its
//!   caption
//! - **Menu** (`/start` and a reply keyboard) with static information replies

mod config;
mod error;
mod menu;
mod reports;
mod telegram;

use std::sync::Arc;
use std::time::Duration;

use teloxide::dptree;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tipline_album::{AggregationStore, DebounceFlusher, Intake};
use tipline_shared::constants::APP_NAME;

use crate::config::BotConfig;
use crate::telegram::{App, TelegramSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Environment and tracing (respects RUST_LOG)
    // -----------------------------------------------------------------------
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tipline=debug")),
        )
        .init();

    info!("Starting {} relay v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = BotConfig::from_env()?;
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Wire the aggregation pipeline
    // -----------------------------------------------------------------------
    let bot = Bot::new(config.bot_token.clone());
    let sink = Arc::new(TelegramSink::new(bot.clone()));
    let store = Arc::new(AggregationStore::new());

    let (flusher, reports) = DebounceFlusher::new(store, sink, config.flusher_config());
    let supervisor = reports::spawn_supervisor(reports);

    info!(
        review_chat = %config.review_chat,
        debounce_ms = flusher.debounce().as_millis() as u64,
        failure_notice = config.failure_notice,
        "Submission pipeline ready"
    );

    let app = Arc::new(App {
        intake: Intake::new(flusher.clone()),
        config,
    });

    // -----------------------------------------------------------------------
    // 4. Run the dispatcher (blocks until Ctrl+C)
    // -----------------------------------------------------------------------
    let handler = Update::filter_message().endpoint(telegram::handle_message);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build();
    dispatcher.dispatch().await;
    drop(dispatcher);

    // -----------------------------------------------------------------------
    // 5. Shutdown: forward whatever is still pending
    // -----------------------------------------------------------------------
    let flushed = flusher.flush_all().await;
    info!(flushed, "Dispatcher stopped");
    drop(flusher);

    match tokio::time::timeout(Duration::from_secs(5), supervisor).await {
        Ok(Ok(stats)) => info!(
            delivered = stats.delivered,
            lost = stats.lost,
            partial = stats.partial,
            unacknowledged = stats.unacknowledged,
            "Shutdown complete"
        ),
        Ok(Err(e)) => warn!(error = %e, "Report supervisor failed"),
        Err(_) => warn!("Timed out waiting for outstanding flushes"),
    }

    Ok(())
}

//! Bot configuration loaded from environment variables.
//!
//! `main` loads a `.env` file first, so every setting can live there too.
//! Only the bot token and the review chat are required.

use std::time::Duration;

use tipline_album::FlusherConfig;
use tipline_shared::constants::DEFAULT_DEBOUNCE_MS;
use tipline_shared::ChatId;

use crate::error::ConfigError;

/// Bot configuration.
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram bot API token.
    /// Env: `BOT_TOKEN`
    pub bot_token: String,

    /// Chat (usually a private channel or group) that receives submissions.
    /// Env: `REVIEW_CHAT_ID`, falling back to `GROUP_ID`
    pub review_chat: ChatId,

    /// Quiet period after the last message of an album before it is sent.
    /// Env: `DEBOUNCE_MS`
    /// Default: 800 ms
    pub debounce: Duration,

    /// Tell submitters when their post could not be forwarded.
    /// Env: `FAILURE_NOTICE` (true/false)
    /// Default: `false`
    pub failure_notice: bool,

    /// Public channel advertised in the greeting.
    /// Env: `CHANNEL_HANDLE`
    pub channel_handle: String,

    /// Moderator contact shown in menu replies.
    /// Env: `MODERATOR_HANDLE`
    pub moderator_handle: String,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("review_chat", &self.review_chat)
            .field("debounce", &self.debounce)
            .field("failure_notice", &self.failure_notice)
            .field("channel_handle", &self.channel_handle)
            .field("moderator_handle", &self.moderator_handle)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let review_raw = get("REVIEW_CHAT_ID")
            .or_else(|| get("GROUP_ID"))
            .ok_or(ConfigError::Missing("REVIEW_CHAT_ID"))?;
        let review_chat = review_raw
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| ConfigError::Invalid {
                key: "REVIEW_CHAT_ID",
                value: review_raw.clone(),
            })?;

        let mut config = Self {
            bot_token,
            review_chat,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            failure_notice: false,
            channel_handle: "@tipline_channel".to_string(),
            moderator_handle: "@tipline_moderator".to_string(),
        };

        if let Some(val) = get("DEBOUNCE_MS") {
            match val.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.debounce = Duration::from_millis(ms),
                _ => {
                    tracing::warn!(value = %val, "Invalid DEBOUNCE_MS, using default");
                }
            }
        }

        if let Some(val) = get("FAILURE_NOTICE") {
            config.failure_notice = val != "false" && val != "0";
        }

        if let Some(handle) = get("CHANNEL_HANDLE") {
            config.channel_handle = handle;
        }

        if let Some(handle) = get("MODERATOR_HANDLE") {
            config.moderator_handle = handle;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        Ok(config)
    }

    pub fn flusher_config(&self) -> FlusherConfig {
        FlusherConfig {
            review_chat: self.review_chat,
            debounce: self.debounce,
            failure_notice: self.failure_notice,
        }
    }
}

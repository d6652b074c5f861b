use teloxide::RequestError;
use thiserror::Error;

use tipline_album::FlushError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Telegram request failed: {0}")]
    Telegram(#[from] RequestError),

    #[error("Submission failed: {0}")]
    Flush(#[from] FlushError),
}

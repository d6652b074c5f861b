use thiserror::Error;

use tipline_shared::{ChatId, SinkError};

/// Errors that end the lifecycle of one submission.
#[derive(Error, Debug, Clone)]
pub enum FlushError {
    /// The post never reached the review channel.
    #[error("Failed to publish to review chat {destination}: {source}")]
    Publish {
        destination: ChatId,
        #[source]
        source: SinkError,
    },

    /// A split album failed midway: the first `sent` of `total` items are
    /// already in the review chat, the rest never arrived.
    #[error("Delivered {sent} of {total} items to review chat {destination}: {source}")]
    Partial {
        destination: ChatId,
        sent: usize,
        total: usize,
        #[source]
        source: SinkError,
    },

    /// The post was forwarded but the submitter was not told.
    #[error("Failed to acknowledge chat {chat}: {source}")]
    Acknowledge {
        chat: ChatId,
        #[source]
        source: SinkError,
    },
}

impl FlushError {
    /// Whether nothing of the post reached the review chat.
    ///
    /// A partial delivery is not lost: moderators already see part of it.
    pub fn is_lost(&self) -> bool {
        matches!(self, FlushError::Publish { .. })
    }
}

//! Outbound transport interface.

use async_trait::async_trait;

use tipline_shared::{ChatId, MediaRef, OutgoingMedia, SinkError};

/// Where finished submissions and acknowledgments are sent.
///
/// Implementations are thin wrappers over the messaging API. No retry
/// contract is expected: a failure is returned as-is and ends the submission.
#[async_trait]
pub trait PostSink: Send + Sync + 'static {
    /// Send several media items as one grouped post. Only the first item
    /// carries a caption.
    async fn send_group(
        &self,
        destination: ChatId,
        items: &[OutgoingMedia],
    ) -> Result<(), SinkError>;

    /// Send a single media item with a caption.
    async fn send_single(
        &self,
        destination: ChatId,
        media: &MediaRef,
        caption: &str,
    ) -> Result<(), SinkError>;

    /// Send a plain text message.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), SinkError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SentPost {
        Group {
            destination: ChatId,
            items: Vec<OutgoingMedia>,
        },
        Single {
            destination: ChatId,
            media: MediaRef,
            caption: String,
        },
        Text {
            chat: ChatId,
            text: String,
        },
    }

    /// Records every call. Posts (not texts) fail while `fail_posts` is set,
    /// or once `fail_after` posts went through.
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Mutex<Vec<SentPost>>,
        pub fail_posts: AtomicBool,
        pub fail_after: Option<usize>,
        attempts: AtomicUsize,
    }

    impl RecordingSink {
        pub fn failing() -> Self {
            Self {
                fail_posts: AtomicBool::new(true),
                ..Self::default()
            }
        }

        pub fn failing_after(posts: usize) -> Self {
            Self {
                fail_after: Some(posts),
                ..Self::default()
            }
        }

        pub async fn sent(&self) -> Vec<SentPost> {
            self.sent.lock().await.clone()
        }

        pub async fn groups(&self) -> Vec<Vec<OutgoingMedia>> {
            self.sent
                .lock()
                .await
                .iter()
                .filter_map(|p| match p {
                    SentPost::Group { items, .. } => Some(items.clone()),
                    _ => None,
                })
                .collect()
        }

        pub async fn texts(&self) -> Vec<(ChatId, String)> {
            self.sent
                .lock()
                .await
                .iter()
                .filter_map(|p| match p {
                    SentPost::Text { chat, text } => Some((*chat, text.clone())),
                    _ => None,
                })
                .collect()
        }

        fn check(&self) -> Result<(), SinkError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            let exhausted = self.fail_after.is_some_and(|limit| attempt >= limit);
            if exhausted || self.fail_posts.load(Ordering::SeqCst) {
                return Err(SinkError::Unreachable("review chat offline".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PostSink for RecordingSink {
        async fn send_group(
            &self,
            destination: ChatId,
            items: &[OutgoingMedia],
        ) -> Result<(), SinkError> {
            self.check()?;
            self.sent.lock().await.push(SentPost::Group {
                destination,
                items: items.to_vec(),
            });
            Ok(())
        }

        async fn send_single(
            &self,
            destination: ChatId,
            media: &MediaRef,
            caption: &str,
        ) -> Result<(), SinkError> {
            self.check()?;
            self.sent.lock().await.push(SentPost::Single {
                destination,
                media: media.clone(),
                caption: caption.to_string(),
            });
            Ok(())
        }

        async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), SinkError> {
            self.sent.lock().await.push(SentPost::Text {
                chat,
                text: text.to_string(),
            });
            Ok(())
        }
    }
}

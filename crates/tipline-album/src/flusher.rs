//! Debounced flushing of albums to the review chat.
//!
//! Every event for a group re-arms a single-shot timer for that group. The
//! timer sleeps for the debounce window and then takes the album out of the
//! store, but only if no newer event arrived in the meantime. A burst of N
//! events therefore ends in exactly one flush, timed from the last event.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use tipline_shared::constants::{ACK_TEXT, DEFAULT_DEBOUNCE_MS, FAILURE_TEXT, MAX_GROUP_ITEMS};
use tipline_shared::{compose_caption, ChatId, GroupId, MediaRef, OutgoingMedia, Sender, SinkError};

use crate::error::FlushError;
use crate::sink::PostSink;
use crate::store::{AggregationStore, Album};

// ---------------------------------------------------------------------------
// Settings & reports
// ---------------------------------------------------------------------------

/// Flusher settings.
#[derive(Debug, Clone)]
pub struct FlusherConfig {
    /// Chat every submission is forwarded to.
    pub review_chat: ChatId,
    /// Quiet period after the last event of a group before it is flushed.
    pub debounce: Duration,
    /// Tell the submitter when their post could not be forwarded.
    pub failure_notice: bool,
}

impl FlusherConfig {
    pub fn new(review_chat: ChatId) -> Self {
        Self {
            review_chat,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            failure_notice: false,
        }
    }
}

/// Outcome of one flush, delivered to whoever owns the report receiver.
#[derive(Debug)]
pub struct FlushReport {
    pub submission: Uuid,
    /// `None` for single-item submissions.
    pub group_id: Option<GroupId>,
    pub chat_id: ChatId,
    pub items: usize,
    pub result: Result<(), FlushError>,
}

/// Where publishing an album stopped.
struct PublishFailure {
    /// Items already in the review chat.
    sent: usize,
    source: SinkError,
}

// ---------------------------------------------------------------------------
// Flusher
// ---------------------------------------------------------------------------

struct Inner {
    store: Arc<AggregationStore>,
    sink: Arc<dyn PostSink>,
    config: FlusherConfig,
    reports: mpsc::UnboundedSender<FlushReport>,
}

/// Arms per-group flush timers and forwards finished albums to the sink.
///
/// Cheap to clone; every clone shares the same store, sink and report channel.
#[derive(Clone)]
pub struct DebounceFlusher {
    inner: Arc<Inner>,
}

impl DebounceFlusher {
    /// Create a flusher and the receiver its flush reports are sent to.
    pub fn new(
        store: Arc<AggregationStore>,
        sink: Arc<dyn PostSink>,
        config: FlusherConfig,
    ) -> (Self, mpsc::UnboundedReceiver<FlushReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        let flusher = Self {
            inner: Arc::new(Inner {
                store,
                sink,
                config,
                reports,
            }),
        };
        (flusher, rx)
    }

    pub fn store(&self) -> &AggregationStore {
        &self.inner.store
    }

    pub fn debounce(&self) -> Duration {
        self.inner.config.debounce
    }

    /// (Re)arm the flush timer of `group_id` for the given generation.
    ///
    /// The previous timer of the group is aborted on a best-effort basis.
    /// Returns `false` if a newer event already superseded `generation`, in
    /// which case the new timer is discarded.
    pub fn arm(&self, group_id: GroupId, generation: u64) -> bool {
        let flusher = self.clone();
        let target = group_id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(flusher.inner.config.debounce).await;
            flusher.fire(&target, generation).await;
        });

        let installed = self
            .inner
            .store
            .install_timer(&group_id, generation, task.abort_handle());
        if !installed {
            debug!(group = %group_id, generation, "Discarded superseded flush timer");
        }
        installed
    }

    async fn fire(&self, group_id: &GroupId, generation: u64) {
        let Some(album) = self.inner.store.take_if_current(group_id, generation) else {
            debug!(
                group = %group_id,
                generation,
                "Flush timer superseded or album already taken"
            );
            return;
        };

        if let Err(e) = self.flush(album).await {
            debug!(group = %group_id, error = %e, "Timer flush ended with an error");
        }
    }

    /// Explicitly cancel a pending album without forwarding it.
    pub fn evict(&self, group_id: &GroupId) -> Option<Album> {
        let album = self.inner.store.take_and_remove(group_id)?;
        info!(
            group = %group_id,
            submission = %album.id,
            items = album.media.len(),
            "Evicted pending album"
        );
        Some(album)
    }

    /// Flush every pending album right away. Used on shutdown.
    ///
    /// Returns how many albums reached the review chat.
    pub async fn flush_all(&self) -> usize {
        let albums = self.inner.store.drain();
        if albums.is_empty() {
            return 0;
        }

        info!(pending = albums.len(), "Flushing pending albums");

        let mut delivered = 0;
        for album in albums {
            if self.flush(album).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Forward a finished album to the review chat and acknowledge it.
    ///
    /// The album has already left the store; on failure it is not re-queued.
    pub async fn flush(&self, album: Album) -> Result<(), FlushError> {
        debug!(
            group = %album.group_id,
            submission = %album.id,
            items = album.media.len(),
            age_ms = album.age_ms(),
            "Flushing album"
        );

        let caption = compose_caption(album.caption.as_deref(), &album.author_tag);
        let result = self.publish_album(&album.media, caption).await;
        let result = self.finish(album.chat_id, album.media.len(), result).await;

        self.report(FlushReport {
            submission: album.id,
            group_id: Some(album.group_id),
            chat_id: album.chat_id,
            items: album.media.len(),
            result,
        })
    }

    /// Forward a single media item immediately, bypassing aggregation.
    pub async fn flush_single(
        &self,
        chat_id: ChatId,
        media: MediaRef,
        caption: Option<&str>,
        sender: &Sender,
    ) -> Result<(), FlushError> {
        let caption = compose_caption(caption, &sender.author_tag());
        let result = self
            .inner
            .sink
            .send_single(self.inner.config.review_chat, &media, &caption)
            .await
            .map_err(|source| PublishFailure { sent: 0, source });
        let result = self.finish(chat_id, 1, result).await;

        self.report(FlushReport {
            submission: Uuid::new_v4(),
            group_id: None,
            chat_id,
            items: 1,
            result,
        })
    }

    /// Send the media of one album, in order, with the caption on the first
    /// item. Albums larger than a single media group are split; a lone item
    /// goes out as a single post.
    async fn publish_album(
        &self,
        media: &[MediaRef],
        caption: String,
    ) -> Result<(), PublishFailure> {
        let sink = &self.inner.sink;
        let destination = self.inner.config.review_chat;
        let mut caption = Some(caption);
        let mut sent = 0;

        for chunk in media.chunks(MAX_GROUP_ITEMS) {
            let items: Vec<OutgoingMedia> = chunk
                .iter()
                .enumerate()
                .map(|(i, media)| OutgoingMedia {
                    media: media.clone(),
                    caption: if i == 0 { caption.take() } else { None },
                })
                .collect();

            let result = match items.as_slice() {
                [only] => {
                    let text = only.caption.as_deref().unwrap_or_default();
                    sink.send_single(destination, &only.media, text).await
                }
                _ => sink.send_group(destination, &items).await,
            };
            if let Err(source) = result {
                return Err(PublishFailure { sent, source });
            }
            sent += items.len();
        }
        Ok(())
    }

    /// Map the publish result and acknowledge the submitter.
    ///
    /// The submitter is acknowledged whenever anything reached the review
    /// chat, so a partially delivered album is not sent again.
    async fn finish(
        &self,
        chat_id: ChatId,
        total: usize,
        published: Result<(), PublishFailure>,
    ) -> Result<(), FlushError> {
        let sink = &self.inner.sink;
        let destination = self.inner.config.review_chat;

        let partial = match published {
            Ok(()) => None,
            Err(PublishFailure { sent: 0, source }) => {
                if self.inner.config.failure_notice {
                    if let Err(e) = sink.send_text(chat_id, FAILURE_TEXT).await {
                        warn!(chat = %chat_id, error = %e, "Failed to send failure notice");
                    }
                }
                return Err(FlushError::Publish {
                    destination,
                    source,
                });
            }
            Err(PublishFailure { sent, source }) => {
                warn!(chat = %chat_id, sent, total, "Album only partially delivered");
                Some(FlushError::Partial {
                    destination,
                    sent,
                    total,
                    source,
                })
            }
        };

        let acked = sink
            .send_text(chat_id, ACK_TEXT)
            .await
            .map_err(|source| FlushError::Acknowledge {
                chat: chat_id,
                source,
            });

        match partial {
            Some(err) => {
                if let Err(e) = acked {
                    warn!(chat = %chat_id, error = %e, "Failed to acknowledge partial delivery");
                }
                Err(err)
            }
            None => acked,
        }
    }

    fn report(&self, report: FlushReport) -> Result<(), FlushError> {
        if let Err(e) = &report.result {
            error!(
                submission = %report.submission,
                chat = %report.chat_id,
                items = report.items,
                error = %e,
                "Submission flush failed"
            );
        }

        let result = report.result.clone();

        if self.inner.reports.send(report).is_err() {
            debug!("Flush report receiver dropped");
        }
        result
    }
}

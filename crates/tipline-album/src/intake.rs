//! Entry point for inbound events.

use tracing::debug;

use tipline_shared::{GroupId, InboundEvent};

use crate::error::FlushError;
use crate::flusher::DebounceFlusher;

/// What happened to an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// A lone media item was forwarded immediately.
    Forwarded,
    /// A media item was added to a pending album.
    Aggregated { group_id: GroupId },
    /// A standalone text became the caption of a pending album.
    CaptionAttached { group_id: GroupId },
    /// Nothing to do (text with no open album, or an empty event).
    Ignored,
}

/// Routes each event to the single-item path, the album path or the
/// loose-caption path.
#[derive(Clone)]
pub struct Intake {
    flusher: DebounceFlusher,
}

impl Intake {
    pub fn new(flusher: DebounceFlusher) -> Self {
        Self { flusher }
    }

    pub fn flusher(&self) -> &DebounceFlusher {
        &self.flusher
    }

    /// Handle one event.
    ///
    /// Only the single-item path talks to the transport directly, so only it
    /// can fail here. Album flush failures surface through flush reports.
    pub async fn handle(&self, event: InboundEvent) -> Result<IntakeOutcome, FlushError> {
        let InboundEvent {
            chat_id,
            group_id,
            media,
            text,
            sender,
        } = event;

        match (media, group_id) {
            (Some(media), None) => {
                self.flusher
                    .flush_single(chat_id, media, text.as_deref(), &sender)
                    .await?;
                Ok(IntakeOutcome::Forwarded)
            }
            (Some(media), Some(group_id)) => {
                let generation = self.flusher.store().upsert_media(
                    &group_id,
                    chat_id,
                    media,
                    &sender.author_tag(),
                    text,
                );
                self.flusher.arm(group_id.clone(), generation);
                Ok(IntakeOutcome::Aggregated { group_id })
            }
            (None, _) => {
                let Some(text) = text else {
                    return Ok(IntakeOutcome::Ignored);
                };
                match self.flusher.store().attach_loose_caption(chat_id, text) {
                    Some((group_id, generation)) => {
                        self.flusher.arm(group_id.clone(), generation);
                        Ok(IntakeOutcome::CaptionAttached { group_id })
                    }
                    None => {
                        debug!(chat = %chat_id, "Text without an open album, ignoring");
                        Ok(IntakeOutcome::Ignored)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tipline_shared::constants::ACK_TEXT;
    use tipline_shared::{ChatId, MediaRef, Sender};

    use super::*;
    use crate::flusher::FlusherConfig;
    use crate::sink::testing::{RecordingSink, SentPost};
    use crate::store::AggregationStore;

    const REVIEW: ChatId = ChatId(-100);

    fn intake(sink: Arc<RecordingSink>) -> (Intake, tokio::sync::mpsc::UnboundedReceiver<crate::FlushReport>) {
        let config = FlusherConfig {
            review_chat: REVIEW,
            debounce: Duration::from_millis(800),
            failure_notice: false,
        };
        let (flusher, reports) =
            DebounceFlusher::new(Arc::new(AggregationStore::new()), sink, config);
        (Intake::new(flusher), reports)
    }

    fn sender(id: u64, name: &str, username: Option<&str>) -> Sender {
        Sender {
            user_id: id,
            first_name: Some(name.to_string()),
            username: username.map(str::to_string),
        }
    }

    fn media_event(group: Option<&str>, file: &str, caption: Option<&str>, from: Sender) -> InboundEvent {
        InboundEvent {
            chat_id: ChatId(7),
            group_id: group.map(GroupId::new),
            media: Some(MediaRef::photo(file)),
            text: caption.map(str::to_string),
            sender: from,
        }
    }

    fn text_event(chat: i64, text: &str) -> InboundEvent {
        InboundEvent {
            chat_id: ChatId(chat),
            group_id: None,
            media: None,
            text: Some(text.to_string()),
            sender: sender(1, "Ann", None),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_album_scenario_with_trailing_caption() {
        let sink = Arc::new(RecordingSink::default());
        let (intake, mut reports) = intake(sink.clone());
        let ann = sender(1, "Ann", Some("ann"));

        let first = intake
            .handle(media_event(Some("A"), "m1", None, ann.clone()))
            .await
            .unwrap();
        assert_eq!(first, IntakeOutcome::Aggregated { group_id: GroupId::new("A") });

        tokio::time::sleep(Duration::from_millis(100)).await;
        intake
            .handle(media_event(Some("A"), "m2", Some("hello"), ann))
            .await
            .unwrap();

        reports.recv().await.unwrap().result.unwrap();

        let sent = sink.sent().await;
        assert_eq!(sent.len(), 2);
        match &sent[0] {
            SentPost::Group { destination, items } => {
                assert_eq!(*destination, REVIEW);
                assert_eq!(items.len(), 2);
                assert_eq!(
                    items[0].caption.as_deref(),
                    Some("hello\n\n👤 Sender: Ann (@ann) | ID: 1")
                );
            }
            other => panic!("expected grouped post, got {other:?}"),
        }
        assert_eq!(
            sent[1],
            SentPost::Text {
                chat: ChatId(7),
                text: ACK_TEXT.to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_media_is_forwarded_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let (intake, mut reports) = intake(sink.clone());

        let outcome = intake
            .handle(media_event(None, "solo", Some("look"), sender(3, "Bo", None)))
            .await
            .unwrap();

        assert_eq!(outcome, IntakeOutcome::Forwarded);
        assert!(intake.flusher().store().is_empty());
        assert_eq!(reports.try_recv().unwrap().group_id, None);

        let sent = sink.sent().await;
        assert_eq!(
            sent[0],
            SentPost::Single {
                destination: REVIEW,
                media: MediaRef::photo("solo"),
                caption: "look\n\n👤 Sender: Bo (no username) | ID: 3".to_string(),
            }
        );
        assert_eq!(
            sent[1],
            SentPost::Text {
                chat: ChatId(7),
                text: ACK_TEXT.to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_media_failure_propagates() {
        let sink = Arc::new(RecordingSink::failing());
        let (intake, _reports) = intake(sink.clone());

        let err = intake
            .handle(media_event(None, "solo", None, sender(3, "Bo", None)))
            .await
            .unwrap_err();

        assert!(err.is_lost());
        assert!(sink.sent().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loose_text_captions_open_album_and_extends_window() {
        let sink = Arc::new(RecordingSink::default());
        let (intake, mut reports) = intake(sink.clone());
        let ann = sender(1, "Ann", None);

        intake
            .handle(media_event(Some("A"), "m1", Some("draft"), ann.clone()))
            .await
            .unwrap();
        intake
            .handle(media_event(Some("A"), "m2", None, ann))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(700)).await;
        let outcome = intake.handle(text_event(7, "final words")).await.unwrap();
        assert_eq!(outcome, IntakeOutcome::CaptionAttached { group_id: GroupId::new("A") });

        // The original deadline passes without a flush.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(sink.sent().await.is_empty());

        reports.recv().await.unwrap();
        let groups = sink.groups().await;
        assert!(groups[0][0]
            .caption
            .as_deref()
            .unwrap()
            .starts_with("final words\n\n👤"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_without_album_is_ignored() {
        let sink = Arc::new(RecordingSink::default());
        let (intake, _reports) = intake(sink.clone());

        let outcome = intake.handle(text_event(7, "hi")).await.unwrap();
        assert_eq!(outcome, IntakeOutcome::Ignored);

        // Another chat's album is never captioned.
        intake
            .handle(media_event(Some("A"), "m1", None, sender(1, "Ann", None)))
            .await
            .unwrap();
        let outcome = intake.handle(text_event(8, "not mine")).await.unwrap();
        assert_eq!(outcome, IntakeOutcome::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_author_tag_comes_from_first_sender() {
        let sink = Arc::new(RecordingSink::default());
        let (intake, mut reports) = intake(sink.clone());

        intake
            .handle(media_event(Some("A"), "m1", None, sender(1, "Ann", None)))
            .await
            .unwrap();
        intake
            .handle(media_event(Some("A"), "m2", None, sender(2, "Bo", None)))
            .await
            .unwrap();

        reports.recv().await.unwrap();
        let caption = sink.groups().await[0][0].caption.clone().unwrap();
        assert!(caption.contains("Ann"));
        assert!(!caption.contains("Bo"));
    }
}

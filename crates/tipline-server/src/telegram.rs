//! Telegram adapter.
//!
//! Converts incoming teloxide messages into [`InboundEvent`]s and implements
//! [`PostSink`] on top of the Bot API.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, InputMediaVideo};
use teloxide::RequestError;
use tracing::debug;

use tipline_album::{Intake, IntakeOutcome, PostSink};
use tipline_shared::{
    ChatId as TiplineChatId, GroupId, InboundEvent, MediaKind, MediaRef, OutgoingMedia, Sender,
    SinkError,
};

use crate::config::BotConfig;
use crate::error::BotError;
use crate::menu::{self, MenuAction};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

pub fn sender_of(msg: &Message) -> Option<Sender> {
    let user = msg.from.as_ref()?;
    Some(Sender {
        user_id: user.id.0,
        first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
        username: user.username.clone(),
    })
}

/// Reduce a Telegram message to the parts the relay cares about.
///
/// Returns `None` for messages without a sender (channel posts) and for
/// messages that carry neither supported media nor text.
pub fn inbound_event(msg: &Message) -> Option<InboundEvent> {
    let sender = sender_of(msg)?;

    let media = match (msg.photo(), msg.video()) {
        // Telegram lists photo sizes ascending; forward the largest.
        (Some(sizes), _) => sizes.last().map(|p| MediaRef::photo(p.file.id.clone())),
        (None, Some(video)) => Some(MediaRef::video(video.file.id.clone())),
        (None, None) => None,
    };
    let text = msg.caption().or_else(|| msg.text()).map(str::to_string);

    if media.is_none() && text.is_none() {
        return None;
    }

    Some(InboundEvent {
        chat_id: TiplineChatId(msg.chat.id.0),
        group_id: msg.media_group_id().map(|id| GroupId::new(id.to_string())),
        media,
        text,
        sender,
    })
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// [`PostSink`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn chat(id: TiplineChatId) -> ChatId {
    ChatId(id.0)
}

fn input_file(media: &MediaRef) -> InputFile {
    InputFile::file_id(media.file_id.clone())
}

fn input_media(item: &OutgoingMedia) -> InputMedia {
    let file = input_file(&item.media);
    match item.media.kind {
        MediaKind::Photo => {
            let mut photo = InputMediaPhoto::new(file);
            if let Some(caption) = &item.caption {
                photo = photo.caption(caption.clone());
            }
            InputMedia::Photo(photo)
        }
        MediaKind::Video => {
            let mut video = InputMediaVideo::new(file);
            if let Some(caption) = &item.caption {
                video = video.caption(caption.clone());
            }
            InputMedia::Video(video)
        }
    }
}

fn sink_error(err: RequestError) -> SinkError {
    match err {
        RequestError::Api(e) => SinkError::Rejected(e.to_string()),
        RequestError::Network(e) => SinkError::Unreachable(e.to_string()),
        other => SinkError::Request(other.to_string()),
    }
}

#[async_trait]
impl PostSink for TelegramSink {
    async fn send_group(
        &self,
        destination: TiplineChatId,
        items: &[OutgoingMedia],
    ) -> Result<(), SinkError> {
        let media: Vec<InputMedia> = items.iter().map(input_media).collect();
        self.bot
            .send_media_group(chat(destination), media)
            .await
            .map(|_| ())
            .map_err(sink_error)
    }

    async fn send_single(
        &self,
        destination: TiplineChatId,
        media: &MediaRef,
        caption: &str,
    ) -> Result<(), SinkError> {
        let file = input_file(media);
        let sent = match media.kind {
            MediaKind::Photo => self
                .bot
                .send_photo(chat(destination), file)
                .caption(caption)
                .await
                .map(|_| ()),
            MediaKind::Video => self
                .bot
                .send_video(chat(destination), file)
                .caption(caption)
                .await
                .map(|_| ()),
        };
        sent.map_err(sink_error)
    }

    async fn send_text(&self, chat_id: TiplineChatId, text: &str) -> Result<(), SinkError> {
        self.bot
            .send_message(chat(chat_id), text)
            .await
            .map(|_| ())
            .map_err(sink_error)
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Everything the message handler needs, injected through dptree.
pub struct App {
    pub intake: Intake,
    pub config: BotConfig,
}

/// Handle one private message: menu actions first, then submissions.
pub async fn handle_message(bot: Bot, msg: Message, app: Arc<App>) -> Result<(), BotError> {
    if let Some(action) = msg.text().and_then(MenuAction::parse) {
        let sender = sender_of(&msg);
        return menu::respond(&bot, &msg, action, sender.as_ref(), &app.config).await;
    }

    let Some(event) = inbound_event(&msg) else {
        return Ok(());
    };

    let outcome = app.intake.handle(event).await?;
    match outcome {
        IntakeOutcome::Ignored => {}
        other => debug!(chat = msg.chat.id.0, outcome = ?other, "Handled submission event"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(extra: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": { "id": 7, "type": "private", "first_name": "Ann" },
            "from": { "id": 42, "is_bot": false, "first_name": "Ann", "username": "ann" },
        });
        for (key, value) in extra.as_object().unwrap() {
            json[key] = value.clone();
        }
        serde_json::from_value(json).unwrap()
    }

    fn photo_sizes() -> serde_json::Value {
        serde_json::json!([
            { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 1200 },
            { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 1280, "file_size": 98000 },
        ])
    }

    #[test]
    fn test_album_photo_becomes_grouped_event() {
        let msg = message(serde_json::json!({
            "media_group_id": "g1",
            "photo": photo_sizes(),
            "caption": "hello",
        }));

        let event = inbound_event(&msg).unwrap();
        assert_eq!(event.chat_id, TiplineChatId(7));
        assert_eq!(event.group_id, Some(GroupId::new("g1")));
        assert_eq!(event.media, Some(MediaRef::photo("large")));
        assert_eq!(event.text.as_deref(), Some("hello"));
        assert_eq!(event.sender.user_id, 42);
        assert_eq!(event.sender.username.as_deref(), Some("ann"));
    }

    #[test]
    fn test_single_video_event() {
        let msg = message(serde_json::json!({
            "video": {
                "file_id": "vid",
                "file_unique_id": "v",
                "width": 640,
                "height": 480,
                "duration": 3,
                "file_size": 50000,
            },
        }));

        let event = inbound_event(&msg).unwrap();
        assert_eq!(event.group_id, None);
        assert_eq!(event.media, Some(MediaRef::video("vid")));
        assert_eq!(event.text, None);
    }

    #[test]
    fn test_plain_text_event() {
        let msg = message(serde_json::json!({ "text": "caption for my album" }));

        let event = inbound_event(&msg).unwrap();
        assert_eq!(event.media, None);
        assert_eq!(event.text.as_deref(), Some("caption for my album"));
    }

    #[test]
    fn test_unsupported_message_is_skipped() {
        let msg = message(serde_json::json!({
            "location": { "latitude": 1.0, "longitude": 2.0 },
        }));
        assert!(inbound_event(&msg).is_none());
    }

    #[test]
    fn test_input_media_caption_only_where_given() {
        let first = input_media(&OutgoingMedia {
            media: MediaRef::photo("a"),
            caption: Some("cap".into()),
        });
        let second = input_media(&OutgoingMedia {
            media: MediaRef::video("b"),
            caption: None,
        });

        match first {
            InputMedia::Photo(photo) => assert_eq!(photo.caption.as_deref(), Some("cap")),
            other => panic!("expected photo, got {other:?}"),
        }
        match second {
            InputMedia::Video(video) => assert_eq!(video.caption, None),
            other => panic!("expected video, got {other:?}"),
        }
    }
}

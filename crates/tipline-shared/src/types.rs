use serde::{Deserialize, Serialize};

use crate::constants::{NO_NAME, NO_USERNAME};

/// Identifier of a conversation (private chat with the bot, or the review channel).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier shared by every message of one multi-item album.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// A media handle already stored by the transport, addressed by its file id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub file_id: String,
}

impl MediaRef {
    pub fn photo(file_id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Photo,
            file_id: file_id.into(),
        }
    }

    pub fn video(file_id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            file_id: file_id.into(),
        }
    }
}

/// One item of an outgoing grouped post. Only the first item carries a caption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutgoingMedia {
    pub media: MediaRef,
    pub caption: Option<String>,
}

/// Identity of the person who sent an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sender {
    pub user_id: u64,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    /// Attribution line appended to every forwarded caption.
    pub fn author_tag(&self) -> String {
        let name = self
            .first_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(NO_NAME);
        let username = match self.username.as_deref() {
            Some(handle) if !handle.is_empty() => format!("@{handle}"),
            _ => NO_USERNAME.to_string(),
        };
        format!(
            "\n\n👤 Sender: {name} ({username}) | ID: {}",
            self.user_id
        )
    }
}

/// A single update from the transport, reduced to what the relay needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    /// Present when the message is part of an album.
    pub group_id: Option<GroupId>,
    pub media: Option<MediaRef>,
    /// Media caption, or the body of a plain text message.
    pub text: Option<String>,
    pub sender: Sender,
}

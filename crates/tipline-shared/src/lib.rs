//! Types and helpers shared by the tipline crates.

pub mod caption;
pub mod constants;
pub mod error;
pub mod types;

pub use caption::{compose_caption, truncate_utf16, utf16_len};
pub use error::SinkError;
pub use types::{ChatId, GroupId, InboundEvent, MediaKind, MediaRef, OutgoingMedia, Sender};

/// Application name
pub const APP_NAME: &str = "Tipline";

/// Quiet period after the last album event before the album is flushed (ms)
pub const DEFAULT_DEBOUNCE_MS: u64 = 800;

/// Maximum caption length accepted by Telegram for media, in UTF-16 code units
pub const MAX_CAPTION_LEN: usize = 1024;

/// Maximum number of items Telegram accepts in one media group
pub const MAX_GROUP_ITEMS: usize = 10;

/// Acknowledgment sent to the submitter once the post reached the review channel
pub const ACK_TEXT: &str = "✅ Post sent for review";

/// Sent to the submitter when forwarding failed (only if failure notices are enabled)
pub const FAILURE_TEXT: &str = "⚠️ Your post could not be delivered for review. Please send it again.";

/// Fallback display name for senders without a first name
pub const NO_NAME: &str = "No name";

/// Fallback shown in the author tag when the sender has no @handle
pub const NO_USERNAME: &str = "no username";

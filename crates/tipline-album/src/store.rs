//! In-progress albums keyed by media group id.
//!
//! Every album lives in one slot of a sharded concurrent map together with
//! the abort handle of its pending flush timer. All mutations of a slot
//! happen under that slot's shard lock, so events for the same group are
//! serialized while unrelated groups proceed in parallel.
//!
//! Each mutation stamps the slot with a fresh *generation* taken from a
//! store-wide counter. A timer only flushes the album if the generation it
//! was armed with is still the current one, which keeps firing idempotent
//! regardless of whether the previous timer could be aborted in time.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

use tipline_shared::{ChatId, GroupId, MediaRef};

// ---------------------------------------------------------------------------
// Album
// ---------------------------------------------------------------------------

/// Media and caption collected so far for one media group.
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    /// Random id used to correlate log lines of one submission.
    pub id: Uuid,
    pub group_id: GroupId,
    /// Chat the submission came from; receives the acknowledgment.
    pub chat_id: ChatId,
    /// Media in the order the store received it. Never empty.
    pub media: Vec<MediaRef>,
    /// Latest caption seen for this submission.
    pub caption: Option<String>,
    /// Attribution of the first sender, fixed at creation.
    pub author_tag: String,
    pub opened_at: DateTime<Utc>,
}

impl Album {
    fn new(group_id: GroupId, chat_id: ChatId, author_tag: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            chat_id,
            media: Vec::new(),
            caption: None,
            author_tag,
            opened_at: Utc::now(),
        }
    }

    /// Milliseconds since the first event of this album.
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.opened_at).num_milliseconds()
    }
}

struct Slot {
    album: Album,
    generation: u64,
    timer: Option<AbortHandle>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Concurrency-safe mapping from group id to album and pending timer.
pub struct AggregationStore {
    slots: DashMap<GroupId, Slot>,
    next_generation: AtomicU64,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    fn bump(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Append a media item to the album of `group_id`, creating the album if
    /// this is the first event for the group.
    ///
    /// `chat_id` and `author_tag` are only used on creation. A present
    /// `caption` replaces the current one. Returns the generation the caller
    /// must arm the flush timer with.
    pub fn upsert_media(
        &self,
        group_id: &GroupId,
        chat_id: ChatId,
        media: MediaRef,
        author_tag: &str,
        caption: Option<String>,
    ) -> u64 {
        let mut slot = self.slots.entry(group_id.clone()).or_insert_with(|| {
            debug!(group = %group_id, chat = %chat_id, "Opening album");
            Slot {
                album: Album::new(group_id.clone(), chat_id, author_tag.to_string()),
                generation: 0,
                timer: None,
            }
        });

        slot.album.media.push(media);
        if caption.is_some() {
            slot.album.caption = caption;
        }
        slot.generation = self.bump();

        debug!(
            group = %group_id,
            items = slot.album.media.len(),
            generation = slot.generation,
            "Appended media to album"
        );

        slot.generation
    }

    /// Use a standalone text message as the caption of an open album of the
    /// same chat.
    ///
    /// If the chat has several albums open at once, any one of them gets the
    /// caption. Albums of other chats are never touched. Returns the group
    /// and the new generation, or `None` when the chat has no open album.
    pub fn attach_loose_caption(&self, chat_id: ChatId, text: String) -> Option<(GroupId, u64)> {
        let mut slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.album.chat_id == chat_id)?;

        slot.album.caption = Some(text);
        slot.generation = self.bump();

        debug!(
            group = %slot.key(),
            chat = %chat_id,
            generation = slot.generation,
            "Attached loose caption to album"
        );

        Some((slot.key().clone(), slot.generation))
    }

    /// Register the abort handle of a freshly armed timer.
    ///
    /// The previous timer of the group is aborted. If a newer event already
    /// bumped the generation, or the album is gone, the new timer is the
    /// stale one: it is aborted instead and `false` is returned.
    pub fn install_timer(&self, group_id: &GroupId, generation: u64, timer: AbortHandle) -> bool {
        match self.slots.get_mut(group_id) {
            Some(mut slot) if slot.generation == generation => {
                if let Some(previous) = slot.timer.replace(timer) {
                    previous.abort();
                }
                true
            }
            _ => {
                timer.abort();
                false
            }
        }
    }

    /// Remove and return the album, aborting its pending timer.
    ///
    /// Returns `None` if the album was already taken or never existed.
    pub fn take_and_remove(&self, group_id: &GroupId) -> Option<Album> {
        let (_, slot) = self.slots.remove(group_id)?;
        if let Some(timer) = slot.timer {
            timer.abort();
        }
        Some(slot.album)
    }

    /// Remove and return the album only if no event arrived after
    /// `generation` was handed out.
    ///
    /// This is the timer-side take. The slot's own timer handle is dropped,
    /// not aborted, since the caller is that timer.
    pub fn take_if_current(&self, group_id: &GroupId, generation: u64) -> Option<Album> {
        self.slots
            .remove_if(group_id, |_, slot| slot.generation == generation)
            .map(|(_, slot)| slot.album)
    }

    /// Remove every album, aborting all pending timers.
    pub fn drain(&self) -> Vec<Album> {
        self.group_ids()
            .iter()
            .filter_map(|group_id| self.take_and_remove(group_id))
            .collect()
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        self.slots.iter().map(|slot| slot.key().clone()).collect()
    }

    pub fn contains(&self, group_id: &GroupId) -> bool {
        self.slots.contains_key(group_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for AggregationStore {
    fn default() -> Self {
        Self::new()
    }
}

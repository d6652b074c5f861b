//! # tipline-album
//!
//! Album aggregation for the tipline relay.
//!
//! Telegram delivers a multi-item album as a burst of separate messages that
//! share a media group id. This crate collects such a burst into a single
//! [`Album`], waits until no new message for the group has arrived for the
//! debounce window, and then forwards the whole album as one grouped post.
//!
//! - [`AggregationStore`] owns the per-group albums and their pending timers.
//! - [`DebounceFlusher`] arms the timers and performs the flush exactly once.
//! - [`Intake`] routes each inbound event to the right path.
//! - [`PostSink`] is the outbound transport the flusher talks to.

pub mod error;
pub mod flusher;
pub mod intake;
pub mod sink;
pub mod store;

pub use error::FlushError;
pub use flusher::{DebounceFlusher, FlushReport, FlusherConfig};
pub use intake::{Intake, IntakeOutcome};
pub use sink::PostSink;
pub use store::{Album, AggregationStore};

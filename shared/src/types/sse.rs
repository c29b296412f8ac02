// shared/src/types/sse.rs
// SSE event types - shared between the stream server and the monitor client

use serde::{Deserialize, Serialize};

use crate::types::event::SystemEvent;

/// Message type names used on the event stream.
///
/// The transport is genuinely string-typed here, so these are the only place
/// where the names appear as literals; everything past the subscription
/// boundary dispatches on typed enums instead.
pub mod message {
    /// Full bootstrap snapshot, delivered exactly once right after open.
    pub const INITIAL_EVENTS: &str = "initial-events";
    /// A single entity change (see [`super::EventChange`]).
    pub const EVENT_CHANGE: &str = "event-change";
    /// Hint that the subscriber lagged behind the broadcast channel.
    pub const RECONNECT: &str = "reconnect";
}

/// Operation tag carried by an [`EventChange`].
///
/// Unrecognised tags deserialize to [`Operation::Unknown`] so that a newer
/// server can add operations without breaking older clients.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

/// One entity change pushed over the stream.
///
/// The payload is always a full [`SystemEvent`] snapshot, never a diff.
/// `DELETE` carries the event with `active = false` already set by the
/// server — clients only react to the flag, they never compute it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventChange {
    pub operation: Operation,
    pub event: SystemEvent,
}

#[derive(Clone, Debug)]
pub enum SseError {
    ChannelSendFailed(String),
    ChannelClosed,
}

impl std::fmt::Display for SseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseError::ChannelSendFailed(msg) => write!(f, "Failed to broadcast event: {}", msg),
            SseError::ChannelClosed => write!(f, "Broadcast channel closed"),
        }
    }
}

impl std::error::Error for SseError {}

pub type SseResult<T> = Result<T, SseError>;

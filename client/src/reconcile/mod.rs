//! Event reconciliation layer.
//!
//! Supplies the [`crate::sse::subscription`] manager with the typed
//! reducers for the two message types on the wire and post-processes the
//! folded state into an ordered, highlight-annotated view.

pub mod feed;
pub mod view;

pub use self::feed::{EventFeed, HIGHLIGHT_WINDOW_SECS, is_highlighted};
pub use self::view::{Badge, EventView};

use shared::types::event::SystemEvent;
use shared::types::sse::{EventChange, message};
use tracing::{info, warn};

use crate::sse::subscription::{Subscription, SubscriptionBuilder};

/// Open the event stream at `url` and fold it into an [`EventFeed`].
///
/// String-keyed registration stops here; past this point every message is
/// a typed payload dispatched on [`shared::types::sse::Operation`].
pub fn watch_events(url: &str, retry: std::time::Duration) -> Subscription<EventFeed> {
    SubscriptionBuilder::new(url)
        .retry(retry)
        .reducer(message::INITIAL_EVENTS, |payload, feed: EventFeed| {
            let snapshot: Vec<SystemEvent> = serde_json::from_value(payload)?;
            Ok(feed.apply_initial(snapshot))
        })
        .reducer(message::EVENT_CHANGE, |payload, feed: EventFeed| {
            let change: EventChange = serde_json::from_value(payload)?;
            Ok(feed.apply_change(change))
        })
        .on_connect(|| info!("event stream connected"))
        .on_error(|| warn!("event stream error, transport will retry"))
        .on_disconnect(|| info!("event stream subscription closed"))
        .spawn(EventFeed::default())
}

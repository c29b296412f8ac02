//! Read-side projection of the feed for presentation consumers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use shared::types::event::SystemEvent;

use crate::reconcile::feed::EventFeed;
use crate::sse::subscription::SubscriptionState;

/// Highlight kind for one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Badge {
    /// Created during this session and still inside the highlight window.
    New,
    /// Known before, touched inside the highlight window.
    Updated,
}

/// Everything the presentation layer consumes, resolved against a single
/// clock reading. Built on demand (each render tick), never stored: the
/// highlight fields decay with wall-clock time while the underlying feed
/// does not change.
#[derive(Clone, Debug)]
pub struct EventView {
    /// Active entities first, most recently touched first within a group.
    pub events: Vec<SystemEvent>,
    pub is_connected: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub new_event_ids: HashSet<String>,
    pub highlighted_ids: HashSet<String>,
}

impl EventView {
    pub fn snapshot(state: &SubscriptionState<EventFeed>, now: DateTime<Utc>) -> Self {
        Self {
            events: state.data.events().to_vec(),
            is_connected: state.is_connected,
            last_update: state.last_update,
            error: state.error.clone(),
            new_event_ids: state.data.new_event_ids(now),
            highlighted_ids: state.data.highlighted_ids(now),
        }
    }

    pub fn badge(&self, id: &str) -> Option<Badge> {
        if !self.highlighted_ids.contains(id) {
            return None;
        }
        if self.new_event_ids.contains(id) {
            Some(Badge::New)
        } else {
            Some(Badge::Updated)
        }
    }

    pub fn active_count(&self) -> usize {
        self.events.iter().filter(|e| e.active).count()
    }

    pub fn inactive_count(&self) -> usize {
        self.events.len() - self.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::event::Severity;
    use shared::types::sse::{EventChange, Operation};

    fn event(id: &str, active: bool, updated_at: &str) -> SystemEvent {
        SystemEvent {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            severity: Severity::Info,
            created_at: "2026-08-30T10:00:00Z".parse().unwrap(),
            updated_at: updated_at.parse().unwrap(),
            active,
            count: 0,
        }
    }

    fn state_with(feed: EventFeed) -> SubscriptionState<EventFeed> {
        SubscriptionState {
            data: feed,
            is_connected: true,
            last_update: None,
            error: None,
        }
    }

    #[test]
    fn badge_distinguishes_new_from_updated() {
        let feed = EventFeed::default()
            .apply_initial(vec![event("seen-before", true, "2026-08-30T10:00:02Z")])
            .apply_change(EventChange {
                operation: Operation::Create,
                event: event("brand-new", true, "2026-08-30T10:00:03Z"),
            });
        let view = EventView::snapshot(&state_with(feed), "2026-08-30T10:00:04Z".parse().unwrap());

        assert_eq!(view.badge("brand-new"), Some(Badge::New));
        assert_eq!(view.badge("seen-before"), Some(Badge::Updated));
    }

    #[test]
    fn badge_gone_once_highlight_decays() {
        let feed = EventFeed::default().apply_change(EventChange {
            operation: Operation::Create,
            event: event("a", true, "2026-08-30T10:00:00Z"),
        });
        let view = EventView::snapshot(&state_with(feed), "2026-08-30T10:00:20Z".parse().unwrap());
        assert_eq!(view.badge("a"), None);
    }

    #[test]
    fn counts_split_by_active_flag() {
        let feed = EventFeed::default().apply_initial(vec![
            event("a", true, "2026-08-30T10:00:01Z"),
            event("b", true, "2026-08-30T10:00:02Z"),
            event("c", false, "2026-08-30T10:00:03Z"),
        ]);
        let view = EventView::snapshot(&state_with(feed), "2026-08-30T10:00:04Z".parse().unwrap());
        assert_eq!(view.active_count(), 2);
        assert_eq!(view.inactive_count(), 1);
    }
}

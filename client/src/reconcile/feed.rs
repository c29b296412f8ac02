//! The reconciled event snapshot and its reducers.
//!
//! A [`EventFeed`] is the client-owned replica of the server's event set:
//! one entry per id, folded from the bootstrap snapshot plus every
//! `event-change` message, in arrival order. Soft-deleted entries stay in
//! the feed with `active = false`; removing them is a presentation
//! decision, never taken here.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use shared::types::event::SystemEvent;
use shared::types::sse::{EventChange, Operation};
use tracing::debug;

/// How long an entity counts as "recently changed" after its `updated_at`.
pub const HIGHLIGHT_WINDOW_SECS: i64 = 15;

/// True while `now` falls inside `[updated_at, updated_at + window)`.
///
/// Highlighting is a pure function of the entity's own timestamp, not of
/// when the message happened to arrive, so it survives reconnects and
/// out-of-order delivery. A future-dated `updated_at` (clock skew) counts
/// as highlighted rather than flickering off.
pub fn is_highlighted(event: &SystemEvent, now: DateTime<Utc>) -> bool {
    event.updated_at > now - Duration::seconds(HIGHLIGHT_WINDOW_SECS)
}

#[derive(Clone, Debug, Default)]
pub struct EventFeed {
    /// Ordered for presentation: active first, then `updated_at` descending.
    events: Vec<SystemEvent>,
    /// Ids whose CREATE was seen on this connection's lifetime. Display
    /// hint only ("NEW" vs "UPDATED"); whether to highlight at all is
    /// decided by [`is_highlighted`].
    created_this_session: HashSet<String>,
}

impl EventFeed {
    pub fn events(&self) -> &[SystemEvent] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&SystemEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Ids currently flagged as recently changed, as of `now`.
    pub fn highlighted_ids(&self, now: DateTime<Utc>) -> HashSet<String> {
        self.events
            .iter()
            .filter(|e| is_highlighted(e, now))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Highlighted ids that were also created during this session.
    pub fn new_event_ids(&self, now: DateTime<Utc>) -> HashSet<String> {
        self.events
            .iter()
            .filter(|e| is_highlighted(e, now) && self.created_this_session.contains(&e.id))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Reducer for `initial-events`: the server snapshot is authoritative
    /// and replaces the local one wholesale. Delivered once per
    /// connection, which is also what heals any messages missed during a
    /// reconnect.
    pub fn apply_initial(mut self, snapshot: Vec<SystemEvent>) -> Self {
        debug!("bootstrap snapshot: {} events", snapshot.len());
        self.events = snapshot;
        // Session hints only make sense for ids the server still knows.
        let known: HashSet<&str> = self.events.iter().map(|e| e.id.as_str()).collect();
        self.created_this_session.retain(|id| known.contains(id.as_str()));
        self.normalize();
        self
    }

    /// Reducer for `event-change`, dispatching on the closed operation tag.
    pub fn apply_change(mut self, change: EventChange) -> Self {
        match change.operation {
            Operation::Create => {
                self.created_this_session.insert(change.event.id.clone());
                self.upsert(change.event);
            }
            // An UPDATE for an id we have not seen yet (raced the
            // bootstrap) is upserted rather than dropped.
            Operation::Update => self.upsert(change.event),
            // Soft delete: the payload already carries `active = false`.
            // The entry stays in the feed for the "Inactive" treatment.
            Operation::Delete => self.upsert(change.event),
            Operation::Unknown => {
                debug!("unknown operation tag for event {}, ignoring", change.event.id);
                return self;
            }
        }
        self.normalize();
        self
    }

    /// Insert-or-replace by id; at most one entry per id can exist.
    fn upsert(&mut self, event: SystemEvent) {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => *slot = event,
            None => self.events.push(event),
        }
    }

    /// Re-derive the presentation order. Runs on every state change; it is
    /// never cached because `updated_at` values race with wall-clock
    /// highlight decay.
    fn normalize(&mut self) {
        self.events.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then(b.updated_at.cmp(&a.updated_at))
                // Stable tie-break so equal timestamps don't shuffle.
                .then(a.id.cmp(&b.id))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::event::Severity;

    pub(crate) fn event(id: &str, active: bool, updated_at: &str) -> SystemEvent {
        SystemEvent {
            id: id.to_string(),
            name: format!("event {id}"),
            description: "test".to_string(),
            severity: Severity::Info,
            created_at: "2026-08-30T10:00:00Z".parse().unwrap(),
            updated_at: updated_at.parse().unwrap(),
            active,
            count: 0,
        }
    }

    fn change(op: Operation, e: SystemEvent) -> EventChange {
        EventChange {
            operation: op,
            event: e,
        }
    }

    #[test]
    fn create_inserts_and_marks_session_created() {
        let feed = EventFeed::default()
            .apply_change(change(Operation::Create, event("a", true, "2026-08-30T10:00:01Z")));
        assert_eq!(feed.len(), 1);
        let now = "2026-08-30T10:00:02Z".parse().unwrap();
        assert!(feed.new_event_ids(now).contains("a"));
    }

    #[test]
    fn update_replaces_in_place() {
        let mut updated = event("a", true, "2026-08-30T10:00:05Z");
        updated.count = 9;
        let feed = EventFeed::default()
            .apply_initial(vec![event("a", true, "2026-08-30T10:00:01Z")])
            .apply_change(change(Operation::Update, updated));
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.get("a").unwrap().count, 9);
    }

    #[test]
    fn update_for_unknown_id_upserts() {
        let feed = EventFeed::default()
            .apply_change(change(Operation::Update, event("ghost", true, "2026-08-30T10:00:01Z")));
        assert!(feed.get("ghost").is_some());
        // Not session-created, so it never shows the NEW hint.
        let now = "2026-08-30T10:00:02Z".parse().unwrap();
        assert!(feed.new_event_ids(now).is_empty());
        assert!(feed.highlighted_ids(now).contains("ghost"));
    }

    #[test]
    fn delete_retains_entity_as_inactive() {
        let feed = EventFeed::default()
            .apply_initial(vec![event("a", true, "2026-08-30T10:00:01Z")])
            .apply_change(change(Operation::Delete, event("a", false, "2026-08-30T10:00:02Z")));
        let e = feed.get("a").unwrap();
        assert!(!e.active);
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn unknown_operation_is_a_no_op() {
        let before = EventFeed::default().apply_initial(vec![event("a", true, "2026-08-30T10:00:01Z")]);
        let after = before
            .clone()
            .apply_change(change(Operation::Unknown, event("b", true, "2026-08-30T10:00:02Z")));
        assert_eq!(after.events(), before.events());
    }

    #[test]
    fn bootstrap_replaces_wholesale() {
        let feed = EventFeed::default()
            .apply_initial(vec![event("a", true, "2026-08-30T10:00:01Z")])
            .apply_initial(vec![event("b", true, "2026-08-30T10:00:02Z")]);
        assert!(feed.get("a").is_none());
        assert!(feed.get("b").is_some());
    }

    #[test]
    fn bootstrap_drops_stale_session_hints() {
        let now = "2026-08-30T10:00:03Z".parse().unwrap();
        let feed = EventFeed::default()
            .apply_change(change(Operation::Create, event("a", true, "2026-08-30T10:00:01Z")))
            .apply_initial(vec![event("b", true, "2026-08-30T10:00:02Z")]);
        assert!(feed.new_event_ids(now).is_empty());
    }

    #[test]
    fn active_precede_inactive_regardless_of_timestamp() {
        let feed = EventFeed::default().apply_initial(vec![
            event("old-active", true, "2026-08-30T10:00:01Z"),
            event("fresh-inactive", false, "2026-08-30T10:00:09Z"),
        ]);
        let ids: Vec<&str> = feed.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["old-active", "fresh-inactive"]);
    }

    #[test]
    fn within_group_most_recent_first() {
        let feed = EventFeed::default().apply_initial(vec![
            event("older", true, "2026-08-30T10:00:01Z"),
            event("newer", true, "2026-08-30T10:00:05Z"),
        ]);
        let ids: Vec<&str> = feed.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[test]
    fn highlight_decays_at_window_boundary() {
        let e = event("a", true, "2026-08-30T10:00:00Z");
        let at = |s: &str| s.parse::<DateTime<Utc>>().unwrap();
        assert!(is_highlighted(&e, at("2026-08-30T10:00:00Z")));
        assert!(is_highlighted(&e, at("2026-08-30T10:00:14Z")));
        assert!(!is_highlighted(&e, at("2026-08-30T10:00:15Z")));
        assert!(!is_highlighted(&e, at("2026-08-30T10:00:16Z")));
    }

    #[test]
    fn future_updated_at_counts_as_highlighted() {
        let e = event("a", true, "2026-08-30T10:00:30Z");
        assert!(is_highlighted(&e, "2026-08-30T10:00:00Z".parse().unwrap()));
    }

    #[test]
    fn create_with_reused_id_starts_a_fresh_lifecycle() {
        // The server promises not to reuse ids, but the reducer does not
        // special-case it: a CREATE simply upserts.
        let feed = EventFeed::default()
            .apply_initial(vec![event("a", false, "2026-08-30T10:00:01Z")])
            .apply_change(change(Operation::Create, event("a", true, "2026-08-30T10:00:05Z")));
        assert_eq!(feed.len(), 1);
        assert!(feed.get("a").unwrap().active);
    }
}

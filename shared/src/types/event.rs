use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a [`SystemEvent`].
///
/// Purely a display mapping — no ordering is implied between variants.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A monitored system event.
///
/// The server owns these; clients hold a read-only replica keyed by `id`.
/// `active = false` means soft-deleted: the entity stays in client snapshots
/// (for the "Inactive" treatment) until something outside the reconciliation
/// layer removes it.
///
/// Wire format is camelCase JSON with ISO-8601 timestamps, e.g.:
/// ```json
/// { "id": "…", "name": "CPU Load", "description": "…",
///   "severity": "WARNING", "createdAt": "2026-08-30T12:00:00Z",
///   "updatedAt": "2026-08-30T12:00:05Z", "active": true, "count": 42 }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemEvent {
    /// Opaque, stable, never reused.
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    /// Invariant: `updated_at >= created_at`.
    pub updated_at: DateTime<Utc>,
    pub active: bool,
    /// Monotonic-ish counter maintained by the server.
    pub count: i64,
}

impl SystemEvent {
    /// Seconds elapsed since the last server-side touch, as seen from `now`.
    /// Negative when `updated_at` is ahead of the caller's clock.
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.updated_at).num_seconds()
    }
}

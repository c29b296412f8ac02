use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use shared::types::event::{Severity, SystemEvent};
use shared::types::sse::{EventChange, Operation};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

// Sample monitoring signals used for seeding and random generation.
const SAMPLE_NAMES: &[&str] = &[
    "Database Connection",
    "API Response Time",
    "Memory Usage",
    "CPU Load",
    "Disk Space",
    "Network Latency",
    "User Login",
    "Payment Processing",
    "Email Delivery",
    "File Upload",
    "Cache Hit Rate",
    "Queue Length",
    "Error Rate",
    "Response Time",
    "Active Sessions",
    "Data Sync",
    "Backup Status",
    "Security Scan",
];

const SAMPLE_DESCRIPTIONS: &[&str] = &[
    "Monitoring database connection health",
    "Tracking API response times",
    "Monitoring system memory usage",
    "Tracking CPU utilization",
    "Monitoring available disk space",
    "Measuring network latency",
    "Tracking user authentication",
    "Monitoring payment transactions",
    "Tracking email delivery status",
    "Monitoring file upload progress",
    "Tracking cache performance",
    "Monitoring queue processing",
    "Tracking system errors",
    "Measuring response times",
    "Tracking active user sessions",
    "Monitoring data synchronization",
    "Tracking backup operations",
    "Monitoring security scans",
];

const SEVERITIES: &[Severity] = &[Severity::Info, Severity::Warning, Severity::Critical];

/// In-memory event store — id → event.
///
/// DELETE only flips `active` to false; entries disappear from the store
/// exclusively through [`EventStore::purge_inactive`], so a subscriber
/// connecting shortly after a delete still sees the soft-deleted entry in
/// its bootstrap snapshot.
#[derive(Debug, Default)]
pub struct EventStore {
    events: RwLock<HashMap<String, SystemEvent>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the store with `count` sample events at startup.
    pub async fn seed(&self, count: usize) {
        let mut events = self.events.write().await;
        let mut rng = rand::thread_rng();
        for i in 0..count.min(SAMPLE_NAMES.len()) {
            let mut event = sample_event(&mut rng);
            event.name = SAMPLE_NAMES[i].to_string();
            event.description = SAMPLE_DESCRIPTIONS[i].to_string();
            events.insert(event.id.clone(), event);
        }
        info!("Seeded {} sample events", events.len());
    }

    /// Every event, active and inactive — the bootstrap snapshot.
    pub async fn all(&self) -> Vec<SystemEvent> {
        self.events.read().await.values().cloned().collect()
    }

    /// Active events only — the REST listing.
    pub async fn active(&self) -> Vec<SystemEvent> {
        self.events
            .read()
            .await
            .values()
            .filter(|e| e.active)
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<SystemEvent> {
        self.events.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Apply one randomly chosen operation and return the change to
    /// broadcast: CREATE 40%, UPDATE 40%, DELETE 20%.
    pub async fn next_change(&self) -> EventChange {
        let mut events = self.events.write().await;
        let roll: f64 = rand::thread_rng().r#gen();
        if roll < 0.4 {
            create_random(&mut events)
        } else if roll < 0.8 {
            update_existing(&mut events)
        } else {
            deactivate_random(&mut events)
        }
    }

    /// Drop inactive events whose last touch is older than `retention`.
    /// Returns how many were removed.
    pub async fn purge_inactive(&self, retention: chrono::Duration) -> usize {
        let mut events = self.events.write().await;
        let cutoff = Utc::now() - retention;
        let before = events.len();
        events.retain(|_, e| e.active || e.updated_at > cutoff);
        let purged = before - events.len();
        if purged > 0 {
            info!("Purged {} inactive events ({} remaining)", purged, events.len());
        }
        purged
    }
}

fn sample_event(rng: &mut impl Rng) -> SystemEvent {
    let now = Utc::now();
    SystemEvent {
        id: Uuid::new_v4().to_string(),
        name: SAMPLE_NAMES[rng.gen_range(0..SAMPLE_NAMES.len())].to_string(),
        description: SAMPLE_DESCRIPTIONS[rng.gen_range(0..SAMPLE_DESCRIPTIONS.len())].to_string(),
        severity: SEVERITIES[rng.gen_range(0..SEVERITIES.len())],
        created_at: now,
        updated_at: now,
        active: true,
        count: rng.gen_range(0..1000),
    }
}

fn create_random(events: &mut HashMap<String, SystemEvent>) -> EventChange {
    let mut rng = rand::thread_rng();
    let event = sample_event(&mut rng);
    events.insert(event.id.clone(), event.clone());
    info!(
        "Created event: {} (severity: {}, count: {})",
        event.name, event.severity, event.count
    );
    EventChange {
        operation: Operation::Create,
        event,
    }
}

fn update_existing(events: &mut HashMap<String, SystemEvent>) -> EventChange {
    if events.is_empty() {
        return create_random(events);
    }

    let mut rng = rand::thread_rng();
    let keys: Vec<&String> = events.keys().collect();
    let id = keys[rng.gen_range(0..keys.len())].clone();

    let event = events.get_mut(&id).map(|e| {
        e.count += rng.gen_range(1..=50);
        if rng.r#gen() {
            e.severity = SEVERITIES[rng.gen_range(0..SEVERITIES.len())];
        }
        // UPDATE never touches `active`; only DELETE deactivates.
        e.updated_at = Utc::now();
        e.clone()
    });

    match event {
        Some(event) => {
            info!(
                "Updated event: {} (count: {}, severity: {})",
                event.name, event.count, event.severity
            );
            EventChange {
                operation: Operation::Update,
                event,
            }
        }
        None => create_random(events),
    }
}

fn deactivate_random(events: &mut HashMap<String, SystemEvent>) -> EventChange {
    let active_ids: Vec<String> = events
        .values()
        .filter(|e| e.active)
        .map(|e| e.id.clone())
        .collect();

    // Keep at least 2 active events so the board never empties out.
    if active_ids.len() <= 2 {
        debug!("Only {} active events, updating instead of deleting", active_ids.len());
        return update_existing(events);
    }

    let mut rng = rand::thread_rng();
    let id = &active_ids[rng.gen_range(0..active_ids.len())];

    // The id came from this map moments ago; fall back to an update if a
    // racing purge somehow removed it.
    let Some(e) = events.get_mut(id) else {
        return update_existing(events);
    };
    e.active = false;
    e.updated_at = Utc::now();
    let event = e.clone();

    info!("Marked event as inactive: {} (count: {})", event.name, event.count);
    EventChange {
        operation: Operation::Delete,
        event,
    }
}

pub mod events;
pub mod handlers;

use std::sync::Arc;

use shared::types::app_config::AppConfig;
use shared::types::sse::EventChange;
use tokio::sync::broadcast;

use crate::events::EventStore;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EventStore>,
    /// Fan-out channel for live changes; each SSE subscriber holds one
    /// receiver.
    pub changes: broadcast::Sender<EventChange>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let (changes, _) = broadcast::channel(config.server.channel_capacity);
        Self {
            store: Arc::new(EventStore::new()),
            changes,
            config: Arc::new(config),
        }
    }
}

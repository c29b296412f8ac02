use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use client::reconcile::{self, Badge, EventView};
use shared::config::load_or_default;

#[derive(Parser, Debug)]
#[command(about = "Live system-event monitor (SSE client)")]
struct Args {
    /// Path to the TOML config; missing file falls back to defaults.
    #[arg(long, default_value = "monitor.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let args = Args::parse();
    let config = load_or_default(&args.config).context("Failed to load configuration")?;

    info!("Subscribing to {}", config.stream.url);
    let subscription = reconcile::watch_events(&config.stream.url, config.stream.retry_delay());
    let mut state = subscription.state();

    // Highlight decay is recomputed on a fixed 1 s tick rather than with
    // per-entity timers; the tick only re-renders, it never touches the
    // snapshot itself.
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                subscription.close();
                break;
            }
            _ = ticker.tick() => {}
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        render(&EventView::snapshot(&state.borrow_and_update(), Utc::now()));
    }

    Ok(())
}

/// Plain-text rendering of the current view. Deliberately minimal; this
/// binary exists to exercise the engine end to end, not to be a UI.
fn render(view: &EventView) {
    let status = if view.is_connected {
        "connected"
    } else {
        "disconnected"
    };
    let last = view
        .last_update
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "── {} | last update {} | {} active, {} inactive {}",
        status,
        last,
        view.active_count(),
        view.inactive_count(),
        view.error
            .as_deref()
            .map(|e| format!("| error: {e}"))
            .unwrap_or_default(),
    );

    for event in &view.events {
        let badge = match view.badge(&event.id) {
            Some(Badge::New) => " [NEW]",
            Some(Badge::Updated) => " [UPDATED]",
            None => "",
        };
        let state = if event.active { "active" } else { "inactive" };
        println!(
            "  {:>8} {:<22} {:<8} count={:<5} {}{}",
            event.severity,
            event.name,
            state,
            event.count,
            event.updated_at.format("%H:%M:%S"),
            badge,
        );
    }
}

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::sync::Arc;
use tokio::net::TcpListener;

// Error tracing
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use server::AppState;
use server::events::scheduler;
use server::handlers::{self, json_response};
use shared::config::load_or_default;

#[derive(Parser, Debug)]
#[command(about = "Event stream server with HTTP and SSE")]
struct Args {
    /// Path to the TOML config file; defaults are used when it is missing.
    #[arg(short, long, default_value = "monitor.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let args = Args::parse();
    let config = load_or_default(&args.config)?;

    let addr = config.server.addr();
    let seed_count = config.server.seed_events;

    let state = AppState::new(config);
    state.store.seed(seed_count).await;
    info!("Seeded store with {} events", seed_count);

    tokio::spawn(scheduler::run(state.clone()));

    let router = Arc::new(handlers::build_router());

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let state = state.clone();
        let router = Arc::clone(&router);

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                let router = Arc::clone(&router);
                async move {
                    match router.route(req, state).await {
                        Ok(response) => Ok::<_, hyper::Error>(response),
                        Err(e) => {
                            error!("Handler error: {:#}", e);
                            Ok(json_response::internal_error_response())
                        }
                    }
                }
            });

            // Handle the connection from the client using HTTP1 and pass any
            // HTTP requests received on that connection to the router
            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, service)
                .await
            {
                warn!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}

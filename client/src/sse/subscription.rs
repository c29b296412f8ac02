//! Generic stream subscription manager.
//!
//! Owns exactly one push-stream connection: opens it, feeds decoded
//! messages through registered reducers, publishes the reduced state over
//! a [`watch`] channel, and re-opens the connection after a fixed delay
//! when it drops. It knows nothing about event semantics; the
//! [`crate::reconcile`] layer supplies the reducers.
//!
//! Messages are applied strictly in arrival order on one task, so a
//! reducer never observes state mutated mid-computation by another
//! message. Reducers must be pure with respect to their two inputs and
//! must not block.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header;
use http_body_util::{BodyExt, Empty};
use hyper::{Request, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::sse::wire::{WireFrame, WireParser};

/// A pure fold step: `(decoded payload, current state) -> next state`.
///
/// The manager guarantees the payload is well-formed JSON; a reducer that
/// still fails to interpret it returns the serde error and the manager
/// records it without touching the state.
pub type Reducer<T> = Box<dyn Fn(serde_json::Value, T) -> Result<T, serde_json::Error> + Send + Sync>;

type Callback = Box<dyn Fn() + Send + Sync>;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("invalid stream request: {0}")]
    Request(#[from] http::Error),

    #[error("connect failed: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("server answered {0}")]
    BadStatus(StatusCode),

    #[error("stream body error: {0}")]
    Body(#[from] hyper::Error),
}

// ---------------------------------------------------------------------------
// Published state
// ---------------------------------------------------------------------------

/// What consumers observe: the reduced state plus connection metadata.
#[derive(Clone, Debug)]
pub struct SubscriptionState<T> {
    pub data: T,
    pub is_connected: bool,
    /// Wall-clock instant of the last successfully applied message.
    pub last_update: Option<DateTime<Utc>>,
    /// Last decode or connection error; cleared by the next good message.
    pub error: Option<String>,
}

impl<T> SubscriptionState<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            is_connected: false,
            last_update: None,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and spawns a [`Subscription`].
pub struct SubscriptionBuilder<T> {
    url: String,
    retry: std::time::Duration,
    reducers: HashMap<String, Reducer<T>>,
    on_connect: Option<Callback>,
    on_error: Option<Callback>,
    on_disconnect: Option<Callback>,
}

impl<T> SubscriptionBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retry: std::time::Duration::from_secs(3),
            reducers: HashMap::new(),
            on_connect: None,
            on_error: None,
            on_disconnect: None,
        }
    }

    /// Fixed delay between reconnect attempts. No backoff, mirroring the
    /// browser EventSource behaviour this replaces.
    pub fn retry(mut self, delay: std::time::Duration) -> Self {
        self.retry = delay;
        self
    }

    /// Register the reducer invoked for messages named `message_type`.
    /// Messages with no registered reducer are ignored.
    pub fn reducer<F>(mut self, message_type: &str, reduce: F) -> Self
    where
        F: Fn(serde_json::Value, T) -> Result<T, serde_json::Error> + Send + Sync + 'static,
    {
        self.reducers
            .insert(message_type.to_string(), Box::new(reduce));
        self
    }

    pub fn on_connect<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_connect = Some(Box::new(f));
        self
    }

    pub fn on_error<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_disconnect<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_disconnect = Some(Box::new(f));
        self
    }

    /// Spawn the supervision task and return a handle to the published
    /// state. The connection is owned by the task and released when the
    /// handle is closed or dropped.
    pub fn spawn(self, initial: T) -> Subscription<T> {
        let (state_tx, state_rx) = watch::channel(SubscriptionState::new(initial));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            url: self.url,
            retry: self.retry,
            dispatcher: Dispatcher::new(self.reducers),
            on_connect: self.on_connect,
            on_error: self.on_error,
            on_disconnect: self.on_disconnect,
            state_tx,
            shutdown_rx,
        };
        tokio::spawn(worker.run());

        Subscription {
            state: state_rx,
            shutdown: shutdown_tx,
        }
    }
}

// ---------------------------------------------------------------------------
// Subscription handle
// ---------------------------------------------------------------------------

/// Handle to a live subscription. Dropping it tears the connection down.
pub struct Subscription<T> {
    state: watch::Receiver<SubscriptionState<T>>,
    shutdown: watch::Sender<bool>,
}

impl<T: Clone> Subscription<T> {
    /// A receiver for change notifications; `borrow()` for the snapshot,
    /// `changed().await` to wake on the next published state.
    pub fn state(&self) -> watch::Receiver<SubscriptionState<T>> {
        self.state.clone()
    }

    /// Clone of the currently published state.
    pub fn current(&self) -> SubscriptionState<T> {
        self.state.borrow().clone()
    }

    /// Stop the subscription. Idempotent; further reducer invocations stop
    /// immediately and any in-flight read is discarded, never applied.
    pub fn close(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

// ---------------------------------------------------------------------------
// Dispatcher — the synchronous reduce step
// ---------------------------------------------------------------------------

struct Dispatcher<T> {
    reducers: HashMap<String, Reducer<T>>,
}

impl<T: Clone> Dispatcher<T> {
    fn new(reducers: HashMap<String, Reducer<T>>) -> Self {
        Self { reducers }
    }

    /// Decode one frame and fold it into the published state.
    ///
    /// Decode failures are recorded under the message type name and leave
    /// `data` untouched; the stream stays open. Reducers therefore only
    /// ever see well-formed JSON.
    fn apply(&self, state: &watch::Sender<SubscriptionState<T>>, frame: &WireFrame) {
        let Some(reduce) = self.reducers.get(&frame.event) else {
            debug!("no reducer for message type '{}', ignoring", frame.event);
            return;
        };

        let payload: serde_json::Value = match serde_json::from_str(&frame.data) {
            Ok(value) => value,
            Err(e) => {
                warn!("undecodable '{}' payload: {}", frame.event, e);
                state.send_modify(|s| {
                    s.error = Some(format!("Failed to parse {}: {}", frame.event, e));
                });
                return;
            }
        };

        let current = state.borrow().data.clone();
        match reduce(payload, current) {
            Ok(next) => state.send_modify(|s| {
                s.data = next;
                s.last_update = Some(Utc::now());
                s.error = None;
            }),
            Err(e) => {
                warn!("reducer for '{}' rejected payload: {}", frame.event, e);
                state.send_modify(|s| {
                    s.error = Some(format!("Failed to parse {}: {}", frame.event, e));
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Worker — connection supervision
// ---------------------------------------------------------------------------

struct Worker<T> {
    url: String,
    retry: std::time::Duration,
    dispatcher: Dispatcher<T>,
    on_connect: Option<Callback>,
    on_error: Option<Callback>,
    on_disconnect: Option<Callback>,
    state_tx: watch::Sender<SubscriptionState<T>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<T: Clone> Worker<T> {
    async fn run(mut self) {
        loop {
            let mut shutdown = self.shutdown_rx.clone();
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                result = self.connect_and_stream() => {
                    let reason = match result {
                        Ok(()) => "stream ended".to_string(),
                        Err(e) => e.to_string(),
                    };
                    warn!("event stream dropped ({}), retrying in {:?}", reason, self.retry);
                    self.state_tx.send_modify(|s| {
                        s.is_connected = false;
                        s.error = Some("Connection error".to_string());
                    });
                    if let Some(cb) = &self.on_error {
                        cb();
                    }
                }
            }

            let mut shutdown = self.shutdown_rx.clone();
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                _ = tokio::time::sleep(self.retry) => {}
            }
        }

        self.state_tx.send_modify(|s| s.is_connected = false);
        if let Some(cb) = &self.on_disconnect {
            cb();
        }
        info!("subscription closed: {}", self.url);
    }

    /// One connection lifetime: open, mark connected, then pump frames
    /// until the server closes the stream or the transport fails.
    async fn connect_and_stream(&self) -> Result<(), StreamError> {
        let request = Request::builder()
            .uri(self.url.as_str())
            .header(header::ACCEPT, "text/event-stream")
            .body(Empty::<Bytes>::new())?;

        let client = Client::builder(TokioExecutor::new()).build_http();
        let response = client.request(request).await?;

        if response.status() != StatusCode::OK {
            return Err(StreamError::BadStatus(response.status()));
        }

        info!("event stream open: {}", self.url);
        self.state_tx.send_modify(|s| {
            s.is_connected = true;
            s.error = None;
        });
        if let Some(cb) = &self.on_connect {
            cb();
        }

        let mut body = response.into_body();
        let mut parser = WireParser::new();
        while let Some(frame) = body.frame().await {
            if let Some(chunk) = frame?.data_ref() {
                for message in parser.push(chunk) {
                    self.dispatcher.apply(&self.state_tx, &message);
                }
            }
        }
        Ok(())
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    // Resolves once the flag is (or already was) true. An Err means the
    // Subscription handle is gone, which is equally a reason to stop.
    let _ = rx.wait_for(|stop| *stop).await;
}

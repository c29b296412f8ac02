use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Method, Request, Response, StatusCode};

use crate::AppState;
use crate::handlers::{json_response, sse};

// ---------------------------------------------------------------------------
// Handler type alias
// ---------------------------------------------------------------------------

type RouteHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

struct Route {
    method: Method,
    path: String,
    handler: RouteHandler,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// GET route — all routes on this server are public reads.
    pub fn get<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            handler: Box::new(move |req, state| Box::pin(handler(req, state))),
        });
        self
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }
            return (route.handler)(req, state).await;
        }

        json_response::deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);
        route_path == clean
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// API router
// ---------------------------------------------------------------------------

pub fn build_router() -> Router {
    Router::new()
        .get("/health", |_req, _state| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .header("access-control-allow-origin", "*")
                .body(
                    http_body_util::Full::new(Bytes::from(r#"{"status":"success","health":"ok"}"#))
                        .boxed(),
                )
                .context("Failed to build health response")?)
        })
        // One-shot snapshot of the live events, for polling clients and
        // debugging with curl.
        .get("/api/events", |_req, state| async move {
            let events = state.store.active().await;
            json_response::deliver_serialized_json(&events, StatusCode::OK)
                .context("Event list failed")
        })
        // The push stream: bootstrap snapshot followed by live changes.
        .get("/api/events/stream", |req, state| async move {
            sse::handle_stream(req, state)
                .await
                .map_err(|e| anyhow!("SSE stream failed: {}", e))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_path_matches() {
        assert!(Router::path_matches("/api/events", "/api/events"));
    }

    #[test]
    fn different_paths_do_not_match() {
        assert!(!Router::path_matches("/api/events", "/api/stream"));
    }

    #[test]
    fn trailing_slash_does_not_match_without_slash() {
        assert!(!Router::path_matches("/api/events", "/api/events/"));
    }

    #[test]
    fn query_string_stripped_before_match() {
        assert!(Router::path_matches(
            "/api/events/stream",
            "/api/events/stream?since=0"
        ));
    }

    #[test]
    fn router_new_has_no_routes() {
        let r = Router::new();
        assert!(r.routes.is_empty());
    }

    #[tokio::test]
    async fn router_get_adds_route() {
        let r = Router::new().get("/ping", |_req, _state| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .body(http_body_util::Full::new(Bytes::from("pong")).boxed())
                .unwrap())
        });
        assert_eq!(r.routes.len(), 1);
        assert_eq!(r.routes[0].path, "/ping");
    }

    #[test]
    fn build_router_registers_all_endpoints() {
        let r = build_router();
        let paths: Vec<&str> = r.routes.iter().map(|route| route.path.as_str()).collect();
        assert!(paths.contains(&"/health"));
        assert!(paths.contains(&"/api/events"));
        assert!(paths.contains(&"/api/events/stream"));
    }
}

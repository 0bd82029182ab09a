//! HTTP + SSE transport
//!
//! Implements the MCP 2024-11-05 HTTP+SSE transport on top of axum:
//!
//! ```text
//! GET  /sse                       ──▶ event: endpoint  data: /messages?session_id=ID
//! POST /messages?session_id=ID    ──▶ 202 Accepted
//!                                     event: message   data: {JSON-RPC response}
//! GET  /health                    ──▶ 200 OK
//! ```
//!
//! Each SSE stream owns one session. Dropping the stream (client disconnect)
//! removes the session.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::stream::{self, Stream, StreamExt};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::mcp::server::McpServer;
use crate::mcp::types::JsonRpcResponse;

/// Path of the event stream endpoint
pub const SSE_PATH: &str = "/sse";
/// Path clients POST JSON-RPC messages to
pub const MESSAGES_PATH: &str = "/messages";
/// Liveness probe path
pub const HEALTH_PATH: &str = "/health";

/// Responses buffered per session before a POST waits for the stream
const SESSION_BUFFER: usize = 64;

/// Shared state behind the SSE routes
pub struct SseTransport {
    server: Arc<McpServer>,
    sessions: RwLock<HashMap<Uuid, mpsc::Sender<JsonRpcResponse>>>,
}

impl SseTransport {
    /// Wrap a server for use over HTTP
    pub fn new(server: Arc<McpServer>) -> Arc<Self> {
        Arc::new(Self {
            server,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Number of open SSE sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Build the axum router serving the transport
    pub fn router(self: &Arc<Self>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route(SSE_PATH, get(sse_handler))
            .route(MESSAGES_PATH, post(message_handler))
            .route(HEALTH_PATH, get(health_check))
            .layer(cors)
            .with_state(Arc::clone(self))
    }

    fn open_session(self: &Arc<Self>) -> (SessionGuard, mpsc::Receiver<JsonRpcResponse>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.sessions.write().insert(id, tx);
        info!(session = %id, "SSE session opened");
        (
            SessionGuard {
                id,
                transport: Arc::clone(self),
            },
            rx,
        )
    }

    fn sender(&self, id: &Uuid) -> Option<mpsc::Sender<JsonRpcResponse>> {
        self.sessions.read().get(id).cloned()
    }
}

/// Removes its session from the map when the stream is dropped
struct SessionGuard {
    id: Uuid,
    transport: Arc<SseTransport>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.transport.sessions.write().remove(&self.id);
        info!(session = %self.id, "SSE session closed");
    }
}

/// Bind `addr` and serve the SSE transport until Ctrl+C
pub async fn run_sse(server: Arc<McpServer>, addr: SocketAddr) -> Result<()> {
    let transport = SseTransport::new(server);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("MCP SSE server listening on http://{}{}", addr, SSE_PATH);
    info!("Health check: http://{}{}", addr, HEALTH_PATH);

    axum::serve(listener, transport.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("MCP SSE server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

async fn sse_handler(
    State(transport): State<Arc<SseTransport>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (guard, rx) = transport.open_session();

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{}?session_id={}", MESSAGES_PATH, guard.id.simple()));

    let messages = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let response = rx.recv().await?;
        let json = serde_json::to_string(&response).unwrap_or_else(|e| {
            error!("Failed to serialize response: {}", e);
            r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"}}"#.to_string()
        });
        debug!(session = %guard.id, "Sending: {}", json);
        Some((
            Ok::<_, Infallible>(Event::default().event("message").data(json)),
            (rx, guard),
        ))
    });

    let stream = stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(messages);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

async fn message_handler(
    State(transport): State<Arc<SseTransport>>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(raw_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };
    let Ok(id) = Uuid::parse_str(&raw_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response();
    };
    let Some(sender) = transport.sender(&id) else {
        warn!(session = %id, "Message for unknown session");
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    debug!(session = %id, "Received: {}", body);

    if let Some(response) = transport.server.handle_line(&body).await {
        if sender.send(response).await.is_err() {
            warn!(session = %id, "Session closed before response was delivered");
            return (StatusCode::GONE, "Session closed").into_response();
        }
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn transport() -> Arc<SseTransport> {
        SseTransport::new(Arc::new(McpServer::new()))
    }

    #[tokio::test]
    async fn test_health() {
        let response = transport()
            .router()
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_message_requires_session() {
        let response = transport()
            .router()
            .oneshot(
                Request::post(MESSAGES_PATH)
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_message_unknown_session() {
        let uri = format!("{}?session_id={}", MESSAGES_PATH, Uuid::new_v4().simple());
        let response = transport()
            .router()
            .oneshot(
                Request::post(uri)
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_guard_removes_session() {
        let transport = transport();
        let (guard, _rx) = transport.open_session();
        assert_eq!(transport.session_count(), 1);
        assert!(transport.sender(&guard.id).is_some());
        drop(guard);
        assert_eq!(transport.session_count(), 0);
    }
}

//! Dynamic gateway router: discovery notifications in, live routes out.
//!
//! # Flow
//!
//! 1. A discovery record arrives via [`GatewayRouter::on_record`]
//! 2. UP: each computed mount path is mounted (or re-enabled) at the
//!    record's priority; DOWN: the same paths are disabled in place
//! 3. An inbound HTTP request resolves against the table, most specific
//!    mount first; unmatched requests fall through to not-found
//! 4. A matched request is translated into an envelope-carrying message,
//!    forwarded to the backend's bus address, and the reply envelope is
//!    rendered back as the HTTP response
//! 5. No reply within the bounded wait → service-unavailable to the
//!    HTTP caller
//!
//! Failures while mounting a record are logged and swallowed: the
//! discovery subscription outranks any single record and must keep
//! running indefinitely.

use crate::bus::{BusMessage, MessageBus};
use crate::error::ErrorCode;
use crate::event::{codec, Envelope, EventAction};
use crate::gateway::{DiscoveryRecord, RouteEntry, RouteTable, ServiceStatus};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Default bounded wait for a backend reply.
const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// The gateway router: a live route table fed by discovery records,
/// serving HTTP requests by forwarding envelopes over the bus.
pub struct GatewayRouter {
    bus: Arc<MessageBus>,
    table: RouteTable,
    gateway_root: String,
    wait: Duration,
}

impl GatewayRouter {
    /// Create a router mounting routes under `gateway_root`
    /// (e.g. `/api/s`).
    pub fn new(bus: Arc<MessageBus>, gateway_root: impl Into<String>) -> Self {
        Self {
            bus,
            table: RouteTable::new(),
            gateway_root: gateway_root.into(),
            wait: DEFAULT_WAIT,
        }
    }

    /// Override the bounded wait for backend replies.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// The live route table.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Apply a discovery lifecycle notification.
    ///
    /// Never panics and never returns an error: a record that cannot be
    /// turned into routes is logged at warn and treated as a no-op so the
    /// discovery subscription keeps running.
    pub fn on_record(&self, record: &DiscoveryRecord) {
        let paths = match record.mount_paths(&self.gateway_root) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!("Cannot register dynamic service: {}", e);
                return;
            }
        };
        let order = record.order();

        for path in paths {
            match record.status {
                ServiceStatus::Up => {
                    tracing::info!(
                        "Enable dynamic route | API[{}] | Order[{}] | Path[{}]",
                        record.name,
                        order,
                        path
                    );
                    self.table.mount(RouteEntry::new(
                        path,
                        order,
                        record.location.address.clone(),
                        record.name.clone(),
                    ));
                }
                ServiceStatus::Down => {
                    tracing::info!(
                        "Disable dynamic route | API[{}] | Path[{}]",
                        record.name,
                        path
                    );
                    self.table.disable(&path);
                }
            }
        }
    }

    /// Serve one HTTP request against the dynamic route table.
    ///
    /// The HTTP server component owns listening, content negotiation, and
    /// body limits; it hands fully-read requests here.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Full<Bytes>> {
        let path = request.uri().path().to_string();
        let entry = match self.table.match_route(&path) {
            Some(entry) => entry,
            None => return Self::not_found(&path),
        };

        let action = Self::action_for(request.method());
        let query = request.uri().query().map(str::to_string);
        let remainder = path
            .strip_prefix(entry.path())
            .unwrap_or("")
            .trim_start_matches('/')
            .to_string();
        let payload = Self::request_payload(request.into_body(), remainder, query);

        tracing::debug!(
            "Gateway forward | Path[{}] | Action[{}] | Backend[{}]",
            path,
            action,
            entry.backend()
        );

        let envelope = Envelope::initial_with(action.clone(), payload);
        let message = BusMessage::new(codec::encode(&envelope));
        let reply = match self
            .bus
            .request_within(entry.backend(), message, self.wait)
            .await
        {
            Ok(reply) => reply,
            // No timely reply, or the backend vanished between match and
            // forward: surface the dedicated failure envelope.
            Err(e) => Envelope::reply_error(action, &e),
        };

        Self::render(&reply)
    }

    /// Map an HTTP method to the action the backend dispatches on.
    fn action_for(method: &Method) -> EventAction {
        match *method {
            Method::GET => EventAction::GetOne,
            Method::POST => EventAction::Create,
            Method::PUT => EventAction::Update,
            Method::PATCH => EventAction::Patch,
            Method::DELETE => EventAction::Remove,
            _ => EventAction::Unknown,
        }
    }

    /// Assemble the request payload document: parsed JSON body plus the
    /// path remainder and raw query string.
    fn request_payload(body: Bytes, path: String, query: Option<String>) -> Value {
        let mut payload = Map::new();
        if !body.is_empty() {
            let parsed = serde_json::from_slice(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
            payload.insert("body".to_string(), parsed);
        }
        if !path.is_empty() {
            payload.insert("path".to_string(), Value::String(path));
        }
        if let Some(query) = query {
            payload.insert("query".to_string(), Value::String(query));
        }
        Value::Object(payload)
    }

    /// Render a reply envelope as an HTTP response.
    fn render(reply: &Envelope) -> Response<Full<Bytes>> {
        match reply.err() {
            None => {
                let doc = reply.data().cloned().unwrap_or_else(|| json!({}));
                Self::json_response(StatusCode::OK, doc)
            }
            Some(error) => Self::json_response(
                Self::status_for(error.code),
                json!({"code": error.code.as_str(), "message": error.message}),
            ),
        }
    }

    /// HTTP status for a reply error code.
    fn status_for(code: ErrorCode) -> StatusCode {
        match code {
            ErrorCode::InvalidArgument | ErrorCode::InvalidMessage => StatusCode::BAD_REQUEST,
            ErrorCode::ServiceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::TimeoutError => StatusCode::REQUEST_TIMEOUT,
            ErrorCode::ServiceError | ErrorCode::UnknownError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The fall-through response for unmatched paths.
    fn not_found(path: &str) -> Response<Full<Bytes>> {
        Self::json_response(
            StatusCode::NOT_FOUND,
            json!({
                "code": ErrorCode::ServiceNotFound.as_str(),
                "message": format!("Resource not found: {}", path),
            }),
        )
    }

    fn json_response(status: StatusCode, doc: Value) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::from(doc.to_string())));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

//! In-process message bus: addressed, best-effort, at-most-once delivery.
//!
//! The bus owns one [`Dispatcher`] per registered address and mediates
//! request/reply correlation. Delivery semantics are deliberately modest:
//! best effort, at-most-once, no persistence; consumers are statically
//! known by address string.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ MessageBus                           │
//! │                                      │
//! │  ┌────────────────────────────────┐  │
//! │  │ endpoints: address → Dispatcher│  │
//! │  └────────────────────────────────┘  │
//! │                                      │
//! │  ┌────────────────────────────────┐  │
//! │  │ default_wait: Duration         │  │
//! │  └────────────────────────────────┘  │
//! └──────────────────────────────────────┘
//! ```
//!
//! Requests dispatch on a detached task and the caller awaits the reply
//! through a oneshot receiver with a bounded wait — the calling task is
//! suspended, never blocked, and an unresponsive handler costs the caller
//! only the wait, not a leaked obligation: the reply slot discards late
//! completions.
//!
//! # Concurrency
//!
//! Per-message handling is independent and runs concurrently; ordering
//! across addresses is not guaranteed, and concurrent senders to one
//! address may interleave. Handlers must not assume exclusive access to
//! shared state.

use crate::dispatch::{Dispatcher, ActionRegistry, ReplySlot, ServiceHandler};
use crate::error::{BusError, RegistryError};
use crate::event::Envelope;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Default bounded wait for a reply.
const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// Raw message delivered to an address.
///
/// The body is an envelope document; an optional transport-level `action`
/// header takes precedence over the payload-embedded action.
#[derive(Debug, Clone)]
pub struct BusMessage {
    action: Option<String>,
    body: Value,
}

impl BusMessage {
    /// A message carrying only an envelope document.
    pub fn new(body: Value) -> Self {
        Self { action: None, body }
    }

    /// A message with a transport-level action header.
    pub fn with_action(action: impl Into<String>, body: Value) -> Self {
        Self {
            action: Some(action.into()),
            body,
        }
    }

    /// The transport-level action header, when present.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// The envelope document.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Best-effort action token for diagnostics: the header when present,
    /// otherwise the body-embedded action, otherwise `UNKNOWN`.
    fn action_token(&self) -> String {
        if let Some(action) = &self.action {
            return action.clone();
        }
        self.body
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string()
    }
}

/// Address-keyed message bus.
pub struct MessageBus {
    endpoints: RwLock<HashMap<String, Arc<Dispatcher>>>,
    default_wait: Duration,
}

impl MessageBus {
    /// Create a bus with the default 30 second bounded wait.
    pub fn new() -> Self {
        Self::with_default_wait(DEFAULT_WAIT)
    }

    /// Create a bus with a custom default bounded wait.
    pub fn with_default_wait(default_wait: Duration) -> Self {
        Self {
            endpoints: RwLock::new(HashMap::new()),
            default_wait,
        }
    }

    /// Register a handler as the consumer of an address.
    ///
    /// Builds the address's action registry once; registration fails on
    /// duplicate action contracts. Re-registering an address replaces the
    /// previous consumer (last registration wins).
    pub fn register(
        &self,
        address: impl Into<String>,
        handler: &dyn ServiceHandler,
    ) -> Result<(), RegistryError> {
        let address = address.into();
        let registry = ActionRegistry::from_handler(handler)?;
        let dispatcher = Arc::new(Dispatcher::new(address.clone(), registry));

        let mut endpoints = self.endpoints.write().unwrap_or_else(|e| e.into_inner());
        if endpoints.insert(address.clone(), dispatcher).is_some() {
            tracing::warn!("Replaced existing consumer on address [{}]", address);
        } else {
            tracing::debug!("Registered consumer on address [{}]", address);
        }
        Ok(())
    }

    /// Remove the consumer of an address. Returns whether one existed.
    pub fn unregister(&self, address: &str) -> bool {
        let mut endpoints = self.endpoints.write().unwrap_or_else(|e| e.into_inner());
        endpoints.remove(address).is_some()
    }

    /// Whether an address has a registered consumer.
    pub fn is_registered(&self, address: &str) -> bool {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        endpoints.contains_key(address)
    }

    fn endpoint(&self, address: &str) -> Result<Arc<Dispatcher>, BusError> {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        endpoints
            .get(address)
            .cloned()
            .ok_or_else(|| BusError::AddressNotFound(address.to_string()))
    }

    /// Send a request and await the reply within the default bounded wait.
    pub async fn request(&self, address: &str, message: BusMessage) -> Result<Envelope, BusError> {
        self.request_within(address, message, self.default_wait).await
    }

    /// Send a request and await the reply within an explicit bounded wait.
    ///
    /// # Errors
    ///
    /// - `BusError::AddressNotFound` when no consumer is registered
    /// - `BusError::NoReply` when the wait elapses first
    pub async fn request_within(
        &self,
        address: &str,
        message: BusMessage,
        wait: Duration,
    ) -> Result<Envelope, BusError> {
        let dispatcher = self.endpoint(address)?;
        let action = message.action_token();
        let (slot, rx) = ReplySlot::channel();

        tracing::debug!(
            "Bus request | Address: {} | Action: {} | Wait: {:?}",
            address,
            action,
            wait
        );

        let BusMessage { action: header, body } = message;
        tokio::spawn(async move {
            dispatcher.handle(body, header, slot).await;
        });

        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(envelope)) => Ok(envelope),
            // Elapsed, or the dispatch task died before completing the
            // slot — either way the caller gets no reply.
            Ok(Err(_)) | Err(_) => Err(BusError::NoReply {
                address: address.to_string(),
                action,
            }),
        }
    }

    /// Send a one-way message: the reply envelope is produced and dropped.
    pub async fn notify(&self, address: &str, message: BusMessage) -> Result<(), BusError> {
        let dispatcher = self.endpoint(address)?;
        tracing::debug!(
            "Bus notify | Address: {} | Action: {}",
            address,
            message.action_token()
        );

        let BusMessage { action: header, body } = message;
        tokio::spawn(async move {
            dispatcher.handle(body, header, ReplySlot::sink()).await;
        });
        Ok(())
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{ActionBinding, ActionContract, HandlerOutcome, ParamKind, ParamSpec};
    use crate::error::ErrorCode;
    use crate::event::{codec, EventAction};
    use serde_json::json;

    struct DoublerService;

    impl ServiceHandler for DoublerService {
        fn bindings(&self) -> Vec<ActionBinding> {
            vec![
                ActionBinding::new(
                    ActionContract::new(EventAction::Create)
                        .param(ParamSpec::required("id", ParamKind::Integer)),
                    |params| {
                        let id = params[0].as_i64().unwrap_or(0);
                        HandlerOutcome::Value(json!({"id": id, "doubled": id * 2}))
                    },
                ),
                ActionBinding::new(ActionContract::new(EventAction::GetOne), |_| {
                    // Never completes: exercises the bounded wait.
                    HandlerOutcome::deferred(std::future::pending())
                }),
            ]
        }
    }

    fn request_message(action: EventAction, data: Value) -> BusMessage {
        BusMessage::new(codec::encode(&Envelope::initial_with(action, data)))
    }

    #[tokio::test]
    async fn test_request_reply_round_trip() {
        let bus = MessageBus::new();
        bus.register("svc.doubler", &DoublerService).unwrap();

        let reply = bus
            .request("svc.doubler", request_message(EventAction::Create, json!({"id": 5})))
            .await
            .unwrap();

        assert!(reply.is_success());
        assert_eq!(reply.action(), &EventAction::Create);
        assert_eq!(reply.data(), Some(&json!({"id": 5, "doubled": 10})));
    }

    #[tokio::test]
    async fn test_request_unknown_address() {
        let bus = MessageBus::new();
        let result = bus
            .request("svc.nowhere", request_message(EventAction::Create, json!({})))
            .await;
        assert!(matches!(result, Err(BusError::AddressNotFound(_))));
    }

    #[tokio::test]
    async fn test_request_bounded_wait_elapses() {
        let bus = MessageBus::new();
        bus.register("svc.doubler", &DoublerService).unwrap();

        let result = bus
            .request_within(
                "svc.doubler",
                request_message(EventAction::GetOne, json!({})),
                Duration::from_millis(50),
            )
            .await;

        match result {
            Err(BusError::NoReply { address, action }) => {
                assert_eq!(address, "svc.doubler");
                assert_eq!(action, "GET_ONE");
            }
            other => panic!("expected NoReply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_unknown_action_still_replies() {
        let bus = MessageBus::new();
        bus.register("svc.doubler", &DoublerService).unwrap();

        let reply = bus
            .request("svc.doubler", request_message(EventAction::Remove, json!({})))
            .await
            .unwrap();

        assert!(reply.is_error());
        assert_eq!(reply.err().unwrap().code, ErrorCode::ServiceNotFound);
    }

    #[tokio::test]
    async fn test_notify_does_not_wait() {
        let bus = MessageBus::new();
        bus.register("svc.doubler", &DoublerService).unwrap();

        // Fire-and-forget against the never-completing handler returns
        // immediately.
        bus.notify("svc.doubler", request_message(EventAction::GetOne, json!({})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reregistration_replaces_consumer() {
        let bus = MessageBus::new();
        bus.register("svc.doubler", &DoublerService).unwrap();
        bus.register("svc.doubler", &DoublerService).unwrap();
        assert!(bus.is_registered("svc.doubler"));
        assert!(bus.unregister("svc.doubler"));
        assert!(!bus.is_registered("svc.doubler"));
    }
}

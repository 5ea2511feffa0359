//! Message dispatch: resolve, bind, invoke, normalize, reply.
//!
//! The dispatcher is the consumer side of one bus address. For every raw
//! inbound message it produces exactly one reply envelope:
//!
//! 1. Decode the raw body leniently (transport boundary); a transport
//!    `action` header overrides the payload-embedded action.
//! 2. Resolve the action against the address's registry. Unknown actions
//!    become a `SERVICE_NOT_FOUND` failure, never a silent drop.
//! 3. Bind parameters. Binding failures reply immediately with the binding
//!    error, action preserved; the handler is never invoked.
//! 4. Invoke and normalize the outcome: success wraps the value (or an
//!    empty success), failure wraps the error. Synchronous and
//!    asynchronous failures are indistinguishable to the caller.
//! 5. Deliver through the [`ReplySlot`], which guarantees single delivery
//!    under completion races.

use crate::dispatch::{ActionRegistry, HandlerOutcome, ReplySlot};
use crate::error::DispatchError;
use crate::event::{codec, Envelope, ErrorMessage, EventAction};
use serde_json::Value;

/// Per-address message dispatcher.
///
/// Holds the immutable action registry built at registration time. Each
/// message is handled independently; concurrent dispatches share the
/// registry read-only.
pub struct Dispatcher {
    address: String,
    registry: ActionRegistry,
}

impl Dispatcher {
    /// Create a dispatcher for an address with its registry.
    pub fn new(address: impl Into<String>, registry: ActionRegistry) -> Self {
        Self {
            address: address.into(),
            registry,
        }
    }

    /// The bus address this dispatcher consumes.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The action table.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Handle a raw message and deliver exactly one reply.
    pub async fn handle(&self, body: Value, action_header: Option<String>, reply: ReplySlot) {
        let envelope = self.dispatch(body, action_header).await;
        tracing::debug!(
            "Dispatch reply | Address: {} | Action: {} | Status: {}",
            self.address,
            envelope.action(),
            envelope.status()
        );
        reply.complete(envelope);
    }

    /// Run the dispatch algorithm and produce the reply envelope.
    pub async fn dispatch(&self, body: Value, action_header: Option<String>) -> Envelope {
        // 1. Lenient decode + header override
        let request = codec::convert(&body, action_header.as_deref());
        let action = request.action().clone();

        // 2. Resolve the action
        let binding = match self.registry.resolve(&action) {
            Some(binding) => binding,
            None => {
                let err = DispatchError::UnknownAction {
                    action: action.to_string(),
                    address: self.address.clone(),
                };
                return Envelope::error(action, ErrorMessage::parse(&err));
            }
        };

        // 3. Bind parameters; the handler is never invoked on failure
        let params = match binding.contract().bind(request.data()) {
            Ok(params) => params,
            Err(err) => return Envelope::error(action, ErrorMessage::parse(&err)),
        };

        // 4. Invoke and normalize
        let outcome = binding.invoke(params);
        Self::normalize(action, outcome).await
    }

    /// Normalize a handler outcome into exactly one reply envelope.
    ///
    /// This is the single point where an asynchronous completion is
    /// accepted; for streams only the first emission is honored.
    async fn normalize(action: EventAction, outcome: HandlerOutcome) -> Envelope {
        match outcome {
            HandlerOutcome::Value(value) => Envelope::success_with(action, value),
            HandlerOutcome::Empty => Envelope::success(action),
            HandlerOutcome::Fail(err) => {
                Envelope::error(action, ErrorMessage::new(err.code, err.message))
            }
            HandlerOutcome::Deferred(future) => match future.await {
                Ok(Some(value)) => Envelope::success_with(action, value),
                Ok(None) => Envelope::success(action),
                Err(err) => Envelope::error(action, ErrorMessage::new(err.code, err.message)),
            },
            HandlerOutcome::Stream(mut receiver) => match receiver.recv().await {
                // First emission wins; anything the stream produces after
                // this point is discarded, not delivered.
                Some(Ok(value)) => Envelope::success_with(action, value),
                Some(Err(err)) => {
                    Envelope::error(action, ErrorMessage::new(err.code, err.message))
                }
                None => Envelope::success(action),
            },
        }
    }
}

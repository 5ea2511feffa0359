//! Heterogeneous handler results unified behind one tagged type.
//!
//! Handlers produce one of five shapes: a plain value, a no-value
//! completion, a declared failure, a single-shot asynchronous result, or a
//! multi-shot stream. The dispatcher consumes all of them uniformly through
//! [`HandlerOutcome`] and normalizes each into exactly one reply envelope.

use crate::error::HandlerError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// Boxed single-shot asynchronous result.
///
/// `Ok(Some(value))` is a success with a payload, `Ok(None)` an empty
/// success, `Err` a failure — the same menu as the synchronous variants.
pub type DeferredReply =
    Pin<Box<dyn Future<Output = Result<Option<Value>, HandlerError>> + Send>>;

/// Multi-shot reactive source consumed first-emission-only.
pub type StreamReply = mpsc::Receiver<Result<Value, HandlerError>>;

/// The result a handler invocation hands back to the dispatcher.
pub enum HandlerOutcome {
    /// Immediate value.
    Value(Value),

    /// Completion without a value; normalizes to an empty success.
    Empty,

    /// Declared failure. Normalizes identically to a deferred failure, so
    /// callers cannot distinguish synchronous from asynchronous errors.
    Fail(HandlerError),

    /// Single-shot asynchronous result.
    Deferred(DeferredReply),

    /// Multi-shot stream. The dispatcher takes the first emission; a
    /// stream that closes without emitting is an empty success, and a
    /// stream whose first item is an error is a failure.
    Stream(StreamReply),
}

impl HandlerOutcome {
    /// Wrap any serializable value as an immediate result.
    ///
    /// Serialization failure degrades to a `ServiceError` failure rather
    /// than panicking inside a handler.
    pub fn value<T: serde::Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(doc) => HandlerOutcome::Value(doc),
            Err(e) => HandlerOutcome::Fail(HandlerError::service(format!(
                "Failed to serialize handler result: {}",
                e
            ))),
        }
    }

    /// Wrap a future as a single-shot asynchronous result.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<Option<Value>, HandlerError>> + Send + 'static,
    {
        HandlerOutcome::Deferred(Box::pin(future))
    }

    /// Wrap a channel receiver as a multi-shot stream result.
    pub fn stream(receiver: StreamReply) -> Self {
        HandlerOutcome::Stream(receiver)
    }
}

impl std::fmt::Debug for HandlerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerOutcome::Value(v) => f.debug_tuple("Value").field(v).finish(),
            HandlerOutcome::Empty => f.write_str("Empty"),
            HandlerOutcome::Fail(e) => f.debug_tuple("Fail").field(e).finish(),
            HandlerOutcome::Deferred(_) => f.write_str("Deferred(..)"),
            HandlerOutcome::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

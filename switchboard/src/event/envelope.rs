//! The canonical message envelope.
//!
//! Every message on the bus carries an [`Envelope`]: status, action, an
//! optional previous action for audit/backtracking, and either a payload
//! document or an error, never both. Envelopes are immutable once built;
//! all construction goes through the constructors below, which enforce the
//! invariants.
//!
//! # Invariants
//!
//! - `error` is present if and only if `status == Failed`
//! - `data` and `error` are mutually exclusive
//! - producers never mutate an envelope after construction; "rewriting"
//!   the action goes through [`Envelope::override_action`], which builds a
//!   fresh envelope and records the old action as `prev_action`

use crate::error::{BusError, DispatchError, EnvelopeError, ErrorCode, HandlerError};
use crate::event::EventAction;
use serde_json::Value;

/// Processing status of an envelope.
///
/// # State Transitions
///
/// ```text
/// Initial → Success  (handler produced a value or completed empty)
/// Initial → Failed   (binding error, unknown action, or handler failure)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventStatus {
    /// Freshly created request, not yet processed. The decoding default.
    #[default]
    Initial,

    /// The handler completed and the payload (if any) is its result.
    Success,

    /// Processing failed; the envelope carries an error instead of data.
    Failed,
}

impl EventStatus {
    /// Wire token for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Initial => "INITIAL",
            EventStatus::Success => "SUCCESS",
            EventStatus::Failed => "FAILED",
        }
    }

    /// Parse a wire token.
    pub fn parse(token: &str) -> Result<Self, EnvelopeError> {
        match token {
            "INITIAL" => Ok(EventStatus::Initial),
            "SUCCESS" => Ok(EventStatus::Success),
            "FAILED" => Ok(EventStatus::Failed),
            other => Err(EnvelopeError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error descriptor carried by failed envelopes: a logical code plus a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Logical error code.
    pub code: ErrorCode,

    /// Human-readable failure description.
    pub message: String,
}

impl ErrorMessage {
    /// Create an error message with an explicit code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Derive an error message from an arbitrary error by walking its
    /// cause chain looking for a typed error that carries a code.
    ///
    /// The first typed error found wins. When the chain carries no code at
    /// all, the result defaults to `ServiceUnavailable` with the original
    /// error's rendering.
    pub fn parse(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(handler) = e.downcast_ref::<HandlerError>() {
                return Self::new(handler.code, handler.message.clone());
            }
            if let Some(dispatch) = e.downcast_ref::<DispatchError>() {
                return Self::new(dispatch.error_code(), dispatch.to_string());
            }
            if let Some(bus) = e.downcast_ref::<BusError>() {
                return Self::new(bus.error_code(), bus.to_string());
            }
            if let Some(envelope) = e.downcast_ref::<EnvelopeError>() {
                return Self::new(envelope.error_code(), envelope.to_string());
            }
            current = e.source();
        }
        Self::new(ErrorCode::ServiceUnavailable, err.to_string())
    }
}

/// The canonical message wrapper.
///
/// See the module docs for the construction invariants. Field access goes
/// through the accessors; there is no mutation API.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    status: EventStatus,
    action: EventAction,
    prev_action: Option<EventAction>,
    data: Option<Value>,
    data_type: Option<String>,
    error: Option<ErrorMessage>,
}

impl Envelope {
    /// Internal constructor for non-failed envelopes.
    fn from_parts(
        status: EventStatus,
        action: EventAction,
        prev_action: Option<EventAction>,
        data: Option<Value>,
        data_type: Option<String>,
    ) -> Self {
        debug_assert!(status != EventStatus::Failed);
        Self {
            status,
            action,
            prev_action,
            data,
            data_type,
            error: None,
        }
    }

    /// Rebuild an envelope from decoded wire fields.
    ///
    /// Only the codec calls this, after it has checked the construction
    /// invariants against the document.
    pub(crate) fn decoded(
        status: EventStatus,
        action: EventAction,
        prev_action: Option<EventAction>,
        data: Option<Value>,
        data_type: Option<String>,
        error: Option<ErrorMessage>,
    ) -> Self {
        Self {
            status,
            action,
            prev_action,
            data,
            data_type,
            error,
        }
    }

    /// A fresh request envelope with no payload.
    pub fn initial(action: EventAction) -> Self {
        Self::from_parts(EventStatus::Initial, action, None, None, None)
    }

    /// A fresh request envelope wrapping a payload document.
    pub fn initial_with(action: EventAction, data: Value) -> Self {
        Self::from_parts(EventStatus::Initial, action, None, Some(data), None)
    }

    /// An empty-success reply.
    pub fn success(action: EventAction) -> Self {
        Self::from_parts(EventStatus::Success, action, None, None, None)
    }

    /// A success reply wrapping a result document.
    pub fn success_with(action: EventAction, data: Value) -> Self {
        Self::from_parts(EventStatus::Success, action, None, Some(data), None)
    }

    /// A success reply wrapping a result document plus a logical type tag
    /// that consumers can use to reconstruct a typed view.
    pub fn success_typed(action: EventAction, data: Value, data_type: impl Into<String>) -> Self {
        Self::from_parts(
            EventStatus::Success,
            action,
            None,
            Some(data),
            Some(data_type.into()),
        )
    }

    /// A failure envelope.
    pub fn error(action: EventAction, error: ErrorMessage) -> Self {
        Self {
            status: EventStatus::Failed,
            action,
            prev_action: None,
            data: None,
            data_type: None,
            error: Some(error),
        }
    }

    /// A failure envelope that records the action it replies to.
    pub fn error_with_prev(
        action: EventAction,
        prev_action: EventAction,
        error: ErrorMessage,
    ) -> Self {
        Self {
            status: EventStatus::Failed,
            action,
            prev_action: Some(prev_action),
            data: None,
            data_type: None,
            error: Some(error),
        }
    }

    /// A `REPLY` success on behalf of `prev_action`.
    pub fn reply_success(prev_action: EventAction, data: Value) -> Self {
        Self::from_parts(
            EventStatus::Success,
            EventAction::Reply,
            Some(prev_action),
            Some(data),
            None,
        )
    }

    /// A `REPLY` failure on behalf of `prev_action`, deriving the error by
    /// walking the cause chain (see [`ErrorMessage::parse`]).
    pub fn reply_error(prev_action: EventAction, cause: &(dyn std::error::Error + 'static)) -> Self {
        Self::error_with_prev(EventAction::Reply, prev_action, ErrorMessage::parse(cause))
    }

    /// Rewrite the action of an envelope, preserving status, payload, and
    /// error, and moving the old action into `prev_action`.
    ///
    /// Used when a transport-level header supplies an action that takes
    /// precedence over the payload-embedded one.
    pub fn override_action(self, action: EventAction) -> Self {
        let prev = self.action;
        if let Some(error) = self.error {
            return Self::error_with_prev(action, prev, error);
        }
        Self::from_parts(self.status, action, Some(prev), self.data, self.data_type)
    }

    /// Processing status.
    pub fn status(&self) -> EventStatus {
        self.status
    }

    /// The action token this envelope carries.
    pub fn action(&self) -> &EventAction {
        &self.action
    }

    /// The action that produced this reply, when recorded.
    pub fn prev_action(&self) -> Option<&EventAction> {
        self.prev_action.as_ref()
    }

    /// Payload document, absent on failures and empty replies.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Logical type tag of the payload, when one was attached.
    pub fn data_type(&self) -> Option<&str> {
        self.data_type.as_deref()
    }

    /// Error descriptor, present exactly when the status is `Failed`.
    pub fn err(&self) -> Option<&ErrorMessage> {
        self.error.as_ref()
    }

    /// Whether this envelope is a success.
    pub fn is_success(&self) -> bool {
        self.status == EventStatus::Success
    }

    /// Whether this envelope is a failure.
    pub fn is_error(&self) -> bool {
        self.status == EventStatus::Failed
    }

    /// Reconstruct a typed view of the payload.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>, EnvelopeError> {
        match &self.data {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| EnvelopeError::InvalidFormat(e.to_string())),
        }
    }
}

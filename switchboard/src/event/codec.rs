//! Envelope codec: wire-neutral document encoding.
//!
//! Envelopes travel as JSON objects:
//!
//! ```text
//! {
//!   "status":     "INITIAL" | "SUCCESS" | "FAILED",   // default INITIAL
//!   "action":     "<token>",                          // required
//!   "prevAction": "<token>",                          // optional
//!   "data":       { ... },                            // optional
//!   "dataType":   "<logical tag>",                    // optional
//!   "error":      { "code": "...", "message": "..." } // iff status FAILED
//! }
//! ```
//!
//! Decoding is mode-aware: [`decode`] is strict and fails closed on a
//! malformed shape; [`decode_lenient`] never fails and instead wraps the
//! raw document in an `INITIAL`/`UNKNOWN` envelope so that non-conforming
//! senders cannot crash the dispatcher.

use crate::error::{EnvelopeError, ErrorCode};
use crate::event::{Envelope, ErrorMessage, EventAction, EventStatus};
use serde_json::{Map, Value};

/// Serialize an envelope to its wire document.
pub fn encode(envelope: &Envelope) -> Value {
    let mut doc = Map::new();

    // 1. Status token
    doc.insert(
        "status".to_string(),
        Value::String(envelope.status().as_str().to_string()),
    );

    // 2. Action token (always present)
    doc.insert(
        "action".to_string(),
        Value::String(envelope.action().as_str().to_string()),
    );

    // 3. Previous action (optional)
    if let Some(prev) = envelope.prev_action() {
        doc.insert(
            "prevAction".to_string(),
            Value::String(prev.as_str().to_string()),
        );
    }

    // 4. Payload document + logical type tag (optional)
    if let Some(data) = envelope.data() {
        doc.insert("data".to_string(), data.clone());
    }
    if let Some(tag) = envelope.data_type() {
        doc.insert("dataType".to_string(), Value::String(tag.to_string()));
    }

    // 5. Error descriptor (optional, iff FAILED)
    if let Some(error) = envelope.err() {
        let mut err_doc = Map::new();
        err_doc.insert(
            "code".to_string(),
            Value::String(error.code.as_str().to_string()),
        );
        err_doc.insert("message".to_string(), Value::String(error.message.clone()));
        doc.insert("error".to_string(), Value::Object(err_doc));
    }

    Value::Object(doc)
}

/// Strictly decode a wire document into an envelope.
///
/// # Errors
///
/// Returns `EnvelopeError` if:
/// - The document is not a JSON object
/// - The `action` field is missing or not a string
/// - The `status` token is unknown
/// - `error` presence does not match `status == FAILED`
/// - Both `data` and `error` are present
pub fn decode(doc: &Value) -> Result<Envelope, EnvelopeError> {
    let obj = doc
        .as_object()
        .ok_or_else(|| EnvelopeError::InvalidFormat("not a JSON object".to_string()))?;

    // 1. Status (default INITIAL)
    let status = match obj.get("status") {
        None | Some(Value::Null) => EventStatus::Initial,
        Some(Value::String(token)) => EventStatus::parse(token)?,
        Some(other) => return Err(EnvelopeError::InvalidStatus(other.to_string())),
    };

    // 2. Action (required)
    let action = match obj.get("action") {
        Some(Value::String(token)) => EventAction::parse(token),
        Some(_) | None => return Err(EnvelopeError::MissingField("action")),
    };

    // 3. Previous action (optional)
    let prev_action = match obj.get("prevAction") {
        None | Some(Value::Null) => None,
        Some(Value::String(token)) => Some(EventAction::parse(token)),
        Some(_) => {
            return Err(EnvelopeError::InvalidFormat(
                "prevAction is not a string".to_string(),
            ))
        }
    };

    // 4. Payload + type tag (optional)
    let data = obj.get("data").filter(|v| !v.is_null()).cloned();
    let data_type = match obj.get("dataType") {
        None | Some(Value::Null) => None,
        Some(Value::String(tag)) => Some(tag.clone()),
        Some(_) => {
            return Err(EnvelopeError::InvalidFormat(
                "dataType is not a string".to_string(),
            ))
        }
    };

    // 5. Error descriptor (optional)
    let error = match obj.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::Object(err_doc)) => {
            let code = match err_doc.get("code") {
                Some(Value::String(token)) => ErrorCode::parse(token),
                _ => ErrorCode::UnknownError,
            };
            let message = match err_doc.get("message") {
                Some(Value::String(message)) => message.clone(),
                _ => String::new(),
            };
            Some(ErrorMessage::new(code, message))
        }
        Some(_) => {
            return Err(EnvelopeError::InvalidFormat(
                "error is not an object".to_string(),
            ))
        }
    };

    // 6. Invariant checks
    match (status, &error) {
        (EventStatus::Failed, None) => {
            return Err(EnvelopeError::Inconsistent(
                "status is FAILED but error is absent",
            ))
        }
        (EventStatus::Failed, Some(_)) if data.is_some() => {
            return Err(EnvelopeError::Inconsistent(
                "data and error are mutually exclusive",
            ))
        }
        (_, Some(_)) if status != EventStatus::Failed => {
            return Err(EnvelopeError::Inconsistent(
                "error is present but status is not FAILED",
            ))
        }
        _ => {}
    }

    Ok(Envelope::decoded(
        status,
        action,
        prev_action,
        data,
        data_type,
        error,
    ))
}

/// Leniently decode a wire document.
///
/// Never fails: a document that does not strictly decode becomes an
/// `INITIAL` envelope with action `UNKNOWN` whose payload is the raw
/// document, so transport ingestion keeps flowing.
pub fn decode_lenient(doc: &Value) -> Envelope {
    match decode(doc) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!("Lenient decode fallback for malformed envelope: {}", e);
            Envelope::initial_with(EventAction::Unknown, doc.clone())
        }
    }
}

/// Convert a raw transport message into an envelope.
///
/// The body is decoded leniently; when the transport supplies an `action`
/// header it takes precedence over the payload-embedded action (the old
/// action moves to `prevAction`).
pub fn convert(body: &Value, action_header: Option<&str>) -> Envelope {
    let envelope = decode_lenient(body);
    match action_header {
        Some(token) => envelope.override_action(EventAction::parse(token)),
        None => envelope,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_initial() {
        let envelope = Envelope::initial_with(EventAction::Create, json!({"id": 5}));
        assert_eq!(decode(&encode(&envelope)).unwrap(), envelope);
    }

    #[test]
    fn test_round_trip_success_empty() {
        let envelope = Envelope::success(EventAction::Remove);
        assert_eq!(decode(&encode(&envelope)).unwrap(), envelope);
    }

    #[test]
    fn test_round_trip_success_typed() {
        let envelope =
            Envelope::success_typed(EventAction::GetOne, json!({"id": 1}), "Device");
        assert_eq!(decode(&encode(&envelope)).unwrap(), envelope);
    }

    #[test]
    fn test_round_trip_reply_success() {
        let envelope = Envelope::reply_success(EventAction::Patch, json!({"ok": true}));
        assert_eq!(decode(&encode(&envelope)).unwrap(), envelope);
    }

    #[test]
    fn test_round_trip_error() {
        let envelope = Envelope::error_with_prev(
            EventAction::Reply,
            EventAction::Create,
            ErrorMessage::new(ErrorCode::ServiceError, "boom"),
        );
        assert_eq!(decode(&encode(&envelope)).unwrap(), envelope);
    }

    #[test]
    fn test_decode_defaults_status_to_initial() {
        let envelope = decode(&json!({"action": "CREATE"})).unwrap();
        assert_eq!(envelope.status(), EventStatus::Initial);
        assert_eq!(envelope.action(), &EventAction::Create);
    }

    #[test]
    fn test_decode_missing_action_fails() {
        let result = decode(&json!({"status": "SUCCESS"}));
        assert!(matches!(result, Err(EnvelopeError::MissingField("action"))));
    }

    #[test]
    fn test_decode_invalid_status_fails() {
        let result = decode(&json!({"action": "CREATE", "status": "DONE"}));
        assert!(matches!(result, Err(EnvelopeError::InvalidStatus(_))));
    }

    #[test]
    fn test_decode_failed_without_error_fails() {
        let result = decode(&json!({"action": "CREATE", "status": "FAILED"}));
        assert!(matches!(result, Err(EnvelopeError::Inconsistent(_))));
    }

    #[test]
    fn test_decode_error_on_success_fails() {
        let result = decode(&json!({
            "action": "CREATE",
            "status": "SUCCESS",
            "error": {"code": "SERVICE_ERROR", "message": "boom"}
        }));
        assert!(matches!(result, Err(EnvelopeError::Inconsistent(_))));
    }

    #[test]
    fn test_decode_not_an_object_fails() {
        assert!(matches!(
            decode(&json!([1, 2, 3])),
            Err(EnvelopeError::InvalidFormat(_))
        ));
        assert!(matches!(
            decode(&json!("hello")),
            Err(EnvelopeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_lenient_decode_never_fails() {
        let raw = json!({"whatever": [1, 2, 3]});
        let envelope = decode_lenient(&raw);

        assert_eq!(envelope.status(), EventStatus::Initial);
        assert_eq!(envelope.action(), &EventAction::Unknown);
        assert_eq!(envelope.data(), Some(&raw));
    }

    #[test]
    fn test_lenient_decode_of_scalar() {
        let raw = json!(42);
        let envelope = decode_lenient(&raw);

        assert_eq!(envelope.action(), &EventAction::Unknown);
        assert_eq!(envelope.data(), Some(&raw));
    }

    #[test]
    fn test_convert_header_takes_precedence() {
        let body = encode(&Envelope::initial_with(EventAction::Create, json!({"id": 9})));
        let envelope = convert(&body, Some("PATCH"));

        assert_eq!(envelope.action(), &EventAction::Patch);
        assert_eq!(envelope.prev_action(), Some(&EventAction::Create));
        assert_eq!(envelope.data(), Some(&json!({"id": 9})));
    }

    #[test]
    fn test_convert_without_header_keeps_embedded_action() {
        let body = encode(&Envelope::initial(EventAction::GetList));
        let envelope = convert(&body, None);
        assert_eq!(envelope.action(), &EventAction::GetList);
    }
}

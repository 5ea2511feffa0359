//! End-to-end dispatch over the message bus.

use serde_json::{json, Value};
use switchboard::prelude::*;

/// A backend service with one contract per handler return shape.
struct CalculatorService;

impl ServiceHandler for CalculatorService {
    fn bindings(&self) -> Vec<ActionBinding> {
        vec![
            // Plain value: CREATE doubles the id.
            ActionBinding::new(
                ActionContract::new(EventAction::Create)
                    .param(ParamSpec::required("id", ParamKind::Integer))
                    .returns("Doubled"),
                |params| {
                    let id = params[0].as_i64().unwrap_or(0);
                    HandlerOutcome::Value(json!({"id": id, "doubled": id * 2}))
                },
            ),
            // No-value completion.
            ActionBinding::new(ActionContract::new(EventAction::Remove), |_| {
                HandlerOutcome::Empty
            }),
            // Declared failure.
            ActionBinding::new(ActionContract::new(EventAction::Update), |_| {
                HandlerOutcome::Fail(HandlerError::new(ErrorCode::InvalidArgument, "hey"))
            }),
            // Single-shot async result.
            ActionBinding::new(
                ActionContract::new(EventAction::GetOne)
                    .param(ParamSpec::required("id", ParamKind::Integer)),
                |params| {
                    let id = params[0].clone();
                    HandlerOutcome::deferred(async move { Ok(Some(json!({"found": id}))) })
                },
            ),
            // Multi-shot stream: the dispatcher honors the first emission
            // only, even though an error follows it.
            ActionBinding::new(ActionContract::new(EventAction::Sync), |_| {
                let (tx, rx) = tokio::sync::mpsc::channel(4);
                tx.try_send(Ok(json!({"first": true}))).unwrap();
                tx.try_send(Err(HandlerError::service("late failure"))).unwrap();
                HandlerOutcome::stream(rx)
            }),
        ]
    }
}

fn envelope_message(action: EventAction, data: Value) -> BusMessage {
    BusMessage::new(codec::encode(&Envelope::initial_with(action, data)))
}

fn bus_with_service() -> MessageBus {
    let bus = MessageBus::new();
    bus.register("svc.calculator", &CalculatorService).unwrap();
    bus
}

#[tokio::test]
async fn create_doubles_the_id() {
    let bus = bus_with_service();

    let reply = bus
        .request(
            "svc.calculator",
            envelope_message(EventAction::Create, json!({"id": 5})),
        )
        .await
        .unwrap();

    assert_eq!(reply.status(), EventStatus::Success);
    assert_eq!(reply.action(), &EventAction::Create);
    assert_eq!(reply.data(), Some(&json!({"id": 5, "doubled": 10})));
}

#[tokio::test]
async fn every_return_shape_yields_exactly_one_reply() {
    let bus = bus_with_service();

    let empty = bus
        .request("svc.calculator", envelope_message(EventAction::Remove, json!({})))
        .await
        .unwrap();
    assert!(empty.is_success());
    assert!(empty.data().is_none());

    let failed = bus
        .request("svc.calculator", envelope_message(EventAction::Update, json!({})))
        .await
        .unwrap();
    assert!(failed.is_error());
    assert_eq!(failed.err().unwrap().code, ErrorCode::InvalidArgument);

    let deferred = bus
        .request(
            "svc.calculator",
            envelope_message(EventAction::GetOne, json!({"id": 7})),
        )
        .await
        .unwrap();
    assert_eq!(deferred.data(), Some(&json!({"found": 7})));

    let stream = bus
        .request("svc.calculator", envelope_message(EventAction::Sync, json!({})))
        .await
        .unwrap();
    assert!(stream.is_success());
    assert_eq!(stream.data(), Some(&json!({"first": true})));
}

#[tokio::test]
async fn unknown_action_is_reported_not_dropped() {
    let bus = bus_with_service();

    let reply = bus
        .request(
            "svc.calculator",
            envelope_message(EventAction::parse("EXPLODE"), json!({})),
        )
        .await
        .unwrap();

    assert!(reply.is_error());
    assert_eq!(reply.err().unwrap().code, ErrorCode::ServiceNotFound);
}

#[tokio::test]
async fn missing_parameter_fails_before_the_handler_runs() {
    let bus = bus_with_service();

    let reply = bus
        .request("svc.calculator", envelope_message(EventAction::Create, json!({})))
        .await
        .unwrap();

    assert!(reply.is_error());
    assert_eq!(reply.action(), &EventAction::Create);
    assert_eq!(reply.err().unwrap().code, ErrorCode::InvalidArgument);
    assert!(reply.err().unwrap().message.contains("id"));
}

#[tokio::test]
async fn string_parameters_are_coerced() {
    let bus = bus_with_service();

    let reply = bus
        .request(
            "svc.calculator",
            envelope_message(EventAction::Create, json!({"id": "21"})),
        )
        .await
        .unwrap();

    assert_eq!(reply.data(), Some(&json!({"id": 21, "doubled": 42})));
}

#[tokio::test]
async fn transport_header_overrides_embedded_action() {
    let bus = bus_with_service();

    // The body claims UPDATE (which fails); the header redirects to REMOVE.
    let body = codec::encode(&Envelope::initial(EventAction::Update));
    let reply = bus
        .request("svc.calculator", BusMessage::with_action("REMOVE", body))
        .await
        .unwrap();

    assert!(reply.is_success());
    assert_eq!(reply.action(), &EventAction::Remove);
}

#[tokio::test]
async fn non_conforming_body_never_crashes_the_dispatcher() {
    let bus = bus_with_service();

    // Junk body: lenient decode wraps it as UNKNOWN, which resolves to a
    // not-found failure — a reply, not a transport crash.
    let reply = bus
        .request("svc.calculator", BusMessage::new(json!([1, 2, 3])))
        .await
        .unwrap();

    assert!(reply.is_error());
    assert_eq!(reply.err().unwrap().code, ErrorCode::ServiceNotFound);

    // A header can still rescue such a message.
    let reply = bus
        .request(
            "svc.calculator",
            BusMessage::with_action("REMOVE", json!("not an envelope")),
        )
        .await
        .unwrap();
    assert!(reply.is_success());
}

#[tokio::test]
async fn round_trip_through_the_wire_document() {
    // Reply envelopes survive encode/decode unchanged, so a remote caller
    // sees exactly what the dispatcher produced.
    let bus = bus_with_service();

    let reply = bus
        .request(
            "svc.calculator",
            envelope_message(EventAction::Create, json!({"id": 3})),
        )
        .await
        .unwrap();

    let decoded = codec::decode(&codec::encode(&reply)).unwrap();
    assert_eq!(decoded, reply);
}

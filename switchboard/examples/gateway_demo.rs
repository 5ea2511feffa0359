//! End-to-end demo: a device service on the bus, mounted dynamically on
//! the gateway, serving HTTP requests.
//!
//! Run with: cargo run --example gateway_demo

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::{Method, Request};
use serde_json::json;
use std::sync::Arc;
use switchboard::prelude::*;

struct DeviceService;

impl ServiceHandler for DeviceService {
    fn bindings(&self) -> Vec<ActionBinding> {
        vec![
            ActionBinding::new(
                ActionContract::new(EventAction::Create)
                    .param(ParamSpec::required("body", ParamKind::Object)),
                |params| {
                    let body = params[0].clone();
                    HandlerOutcome::Value(json!({"created": body, "status": "ok"}))
                },
            ),
            ActionBinding::new(
                ActionContract::new(EventAction::GetOne)
                    .param(ParamSpec::optional("path", ParamKind::String)),
                |params| HandlerOutcome::Value(json!({"device": params[0].clone()})),
            ),
        ]
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    // 1. Wire the bus and register the backend service.
    let bus = Arc::new(MessageBus::new());
    bus.register("svc.device", &DeviceService)?;

    // 2. Mount it on the gateway via a discovery record.
    let router = GatewayRouter::new(bus.clone(), "/api/s");
    router.on_record(&DiscoveryRecord::up("device", "/device", "svc.device"));

    // 3. Serve a GET.
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/s/device/thermostat-1")
        .body(Bytes::new())?;
    let response = router.handle(request).await;
    let body = response.into_body().collect().await?.to_bytes();
    println!("GET  -> {}", String::from_utf8_lossy(&body));

    // 4. Serve a POST with a JSON body.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/s/device")
        .body(Bytes::from(json!({"id": 5}).to_string()))?;
    let response = router.handle(request).await;
    let body = response.into_body().collect().await?.to_bytes();
    println!("POST -> {}", String::from_utf8_lossy(&body));

    // 5. Talk to the service directly over the bus.
    let reply = bus
        .request(
            "svc.device",
            BusMessage::new(codec::encode(&Envelope::initial_with(
                EventAction::Create,
                json!({"body": {"id": 7}}),
            ))),
        )
        .await?;
    println!("BUS  -> {:?}", reply.data());

    Ok(())
}

//! Dynamic gateway routing against overlapping discovery records.

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use switchboard::prelude::*;

/// A backend that answers GET_ONE with its own name, so tests can see
/// which route won.
struct NamedService(&'static str);

impl ServiceHandler for NamedService {
    fn bindings(&self) -> Vec<ActionBinding> {
        let name = self.0;
        vec![ActionBinding::new(
            ActionContract::new(EventAction::GetOne),
            move |_| HandlerOutcome::Value(json!({"served_by": name})),
        )]
    }
}

fn get(path: &str) -> Request<Bytes> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Bytes::new())
        .unwrap()
}

async fn served_by(router: &GatewayRouter, path: &str) -> Value {
    let response = router.handle(get(path)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice::<Value>(&bytes).unwrap()["served_by"].clone()
}

fn overlapping_router() -> (GatewayRouter, DiscoveryRecord) {
    let bus = Arc::new(MessageBus::new());
    bus.register("svc.a", &NamedService("a")).unwrap();
    bus.register("svc.ab", &NamedService("ab")).unwrap();
    bus.register("svc.abc", &NamedService("abc")).unwrap();

    let router = GatewayRouter::new(bus, "/api/s");
    router.on_record(&DiscoveryRecord::up("a", "/a", "svc.a"));
    router.on_record(&DiscoveryRecord::up("ab", "/a/b", "svc.ab"));
    let abc = DiscoveryRecord::up("abc", "/a/b/c", "svc.abc");
    router.on_record(&abc);
    (router, abc)
}

#[tokio::test]
async fn most_specific_registered_path_wins() {
    let (router, _) = overlapping_router();

    // A request matching all three mounts resolves to the deepest one.
    assert_eq!(served_by(&router, "/api/s/a/b/c/leaf").await, json!("abc"));
    assert_eq!(served_by(&router, "/api/s/a/b/other").await, json!("ab"));
    assert_eq!(served_by(&router, "/api/s/a/x").await, json!("a"));
}

#[tokio::test]
async fn down_record_falls_back_to_next_specific_route() {
    let (router, abc) = overlapping_router();

    router.on_record(&abc.clone().down());
    assert_eq!(served_by(&router, "/api/s/a/b/c/leaf").await, json!("ab"));

    // Re-UP re-enables the retained slot.
    router.on_record(&abc);
    assert_eq!(served_by(&router, "/api/s/a/b/c/leaf").await, json!("abc"));
}

#[tokio::test]
async fn alternative_paths_mount_alongside_the_primary() {
    let bus = Arc::new(MessageBus::new());
    bus.register("svc.device", &NamedService("device")).unwrap();

    let router = GatewayRouter::new(bus, "/api/s");
    let mut record = DiscoveryRecord::up("device", "/device", "svc.device");
    record.alternative_paths = Some(
        ["/device".to_string(), "/dev".to_string()]
            .into_iter()
            .collect(),
    );
    router.on_record(&record);

    assert_eq!(served_by(&router, "/api/s/device/1").await, json!("device"));
    assert_eq!(served_by(&router, "/api/s/dev/1").await, json!("device"));

    // DOWN disables every mounted alias.
    router.on_record(&record.clone().down());
    assert_eq!(
        router.handle(get("/api/s/dev/1")).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        router.handle(get("/api/s/device/1")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn unmatched_request_falls_through_to_not_found() {
    let (router, _) = overlapping_router();

    let response = router.handle(get("/api/s/zzz")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_record_never_breaks_the_subscription() {
    let (router, _) = overlapping_router();

    // A record with an unusable root is logged and skipped; the stream of
    // notifications keeps applying afterwards.
    router.on_record(&DiscoveryRecord::up("broken", "not-absolute", "svc.broken"));
    router.on_record(&DiscoveryRecord::up("", "/orphan", "svc.orphan"));

    assert_eq!(served_by(&router, "/api/s/a/b/c/leaf").await, json!("abc"));
}

#[tokio::test]
async fn http_methods_map_to_actions() {
    struct CrudService;

    impl ServiceHandler for CrudService {
        fn bindings(&self) -> Vec<ActionBinding> {
            fn echo(action: &'static str) -> ActionBinding {
                ActionBinding::new(ActionContract::new(EventAction::parse(action)), move |_| {
                    HandlerOutcome::Value(json!({"action": action}))
                })
            }
            vec![
                echo("GET_ONE"),
                echo("CREATE"),
                echo("UPDATE"),
                echo("PATCH"),
                echo("REMOVE"),
            ]
        }
    }

    let bus = Arc::new(MessageBus::new());
    bus.register("svc.crud", &CrudService).unwrap();
    let router = GatewayRouter::new(bus, "/api/s");
    router.on_record(&DiscoveryRecord::up("crud", "/crud", "svc.crud"));

    for (method, action) in [
        (Method::GET, "GET_ONE"),
        (Method::POST, "CREATE"),
        (Method::PUT, "UPDATE"),
        (Method::PATCH, "PATCH"),
        (Method::DELETE, "REMOVE"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri("/api/s/crud")
            .body(Bytes::new())
            .unwrap();
        let response = router.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["action"], json!(action));
    }
}

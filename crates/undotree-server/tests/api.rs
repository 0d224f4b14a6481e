use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use undotree_core::patch::diff;
use undotree_server::{router, AppState};

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn push(app: &Router, file_id: &str, parent: &str, delta: Value) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/nodes",
        Some(json!({"file_id": file_id, "parent_node_id": parent, "delta": delta})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["node_id"].as_str().expect("node_id").to_string()
}

#[tokio::test]
async fn graph_is_created_on_first_fetch() {
    let app = router(AppState::new());
    let (status, body) = send(&app, "GET", "/api/graph?file_id=notes.txt", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_node_id"], "root");
    assert_eq!(body["nodes"]["root"]["delta"], Value::Null);
    assert_eq!(body["nodes"]["root"]["children"], json!([]));
}

#[tokio::test]
async fn nodes_chain_and_show_up_in_graph() {
    let app = router(AppState::new());
    let n1 = push(&app, "doc", "root", json!("hello")).await;
    let patch = serde_json::to_value(diff("hello", "hello world")).unwrap();
    let n2 = push(&app, "doc", &n1, patch).await;

    let (_, body) = send(&app, "GET", "/api/graph?file_id=doc", None).await;
    assert_eq!(body["current_node_id"], n2.as_str());
    assert_eq!(body["nodes"]["root"]["children"], json!([n1.clone()]));
    assert_eq!(body["nodes"][&n2]["parents"], json!([n1]));
}

#[tokio::test]
async fn add_node_error_statuses() {
    let app = router(AppState::new());

    let (status, body) = send(
        &app,
        "POST",
        "/api/nodes",
        Some(json!({"file_id": "doc", "delta": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/nodes",
        Some(json!({"file_id": "doc", "parent_node_id": "nope", "delta": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let n1 = push(&app, "doc", "root", json!("abc")).await;
    let wrong_base = serde_json::to_value(diff("xyz", "xyz!")).unwrap();
    let (status, _) = send(
        &app,
        "POST",
        "/api/nodes",
        Some(json!({"file_id": "doc", "parent_node_id": n1, "delta": wrong_base})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn overflowing_patch_is_bad_request() {
    let app = router(AppState::new());
    let n1 = push(&app, "doc", "root", json!("abc")).await;
    let patch = json!([
        {"op": "equal", "old_start": 0, "new_start": 0, "len": u64::MAX},
        {"op": "delete", "old_start": u64::MAX, "new_start": u64::MAX, "text": "x"}
    ]);

    let (status, body) = send(
        &app,
        "POST",
        "/api/nodes",
        Some(json!({"file_id": "doc", "parent_node_id": n1, "delta": patch})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].is_string());

    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn navigate_queues_revert_then_ack_clears() {
    let app = router(AppState::new());
    let n1 = push(&app, "doc", "root", json!("hello")).await;
    let patch = serde_json::to_value(diff("hello", "hello world")).unwrap();
    let n2 = push(&app, "doc", &n1, patch.clone()).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/navigate",
        Some(json!({"file_id": "doc", "current_node_id": n1, "target_node_id": n2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "revert");

    let (status, changes) = send(&app, "GET", "/api/poll_changes?file_id=doc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        changes,
        json!([{"node_id": n1, "delta": patch, "mode": "revert"}])
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/ack_changes",
        Some(json!({"file_id": "doc", "node_ids": [n1]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining_pending_count"], 0);

    let (_, changes) = send(&app, "GET", "/api/poll_changes?file_id=doc", None).await;
    assert_eq!(changes, json!([]));
}

#[tokio::test]
async fn navigate_validation() {
    let app = router(AppState::new());
    let n1 = push(&app, "doc", "root", json!("hello")).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/navigate",
        Some(json!({"file_id": "doc", "current_node_id": n1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/navigate",
        Some(json!({"file_id": "doc", "current_node_id": n1, "target_node_id": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/navigate",
        Some(json!({"file_id": "doc", "current_node_id": n1, "target_node_id": "root"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn skipped_delivery_is_replaced_by_snapshot() {
    let app = router(AppState::new());
    let n1 = push(&app, "doc", "root", json!("hello")).await;
    let patch = serde_json::to_value(diff("hello", "hello world")).unwrap();
    let n2 = push(&app, "doc", &n1, patch).await;

    send(
        &app,
        "POST",
        "/api/navigate",
        Some(json!({"file_id": "doc", "current_node_id": n1, "target_node_id": n2})),
    )
    .await;
    send(&app, "GET", "/api/poll_changes?file_id=doc", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/ack_changes",
        Some(json!({"file_id": "doc", "node_ids": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining_pending_count"], 1);

    let (_, changes) = send(&app, "GET", "/api/poll_changes?file_id=doc", None).await;
    assert_eq!(
        changes,
        json!([{"node_id": n1, "delta": "hello", "mode": "apply"}])
    );
}

#[tokio::test]
async fn health() {
    let app = router(AppState::new());
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

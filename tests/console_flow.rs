//! End-to-end flows against an in-process mock of the backend proxy.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use odc_lib::app::{App, Command, Reply};
use odc_lib::router::Route;
use odc_lib::view::{screen, FileAction, PanelBody, Screen};
use odc_onedrive::{
    ClientVariant, Console, ConsoleConfig, ConsoleErrorCode, HttpBackend, MemorySessionStore,
    PushNotification, SessionPhase, SessionStore,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TOKEN: &str = "tok1";

#[derive(Default)]
struct MockBackend {
    delta_calls: AtomicUsize,
    sse_connections: AtomicUsize,
}

type Shared = Arc<MockBackend>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid token" })),
    )
        .into_response()
}

async fn login() -> Json<Value> {
    Json(json!({ "url": "https://login.example/authorize?client_id=odc" }))
}

async fn callback(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("code").map(String::as_str) {
        Some("XYZ") => Json(json!({ "accessToken": TOKEN })).into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid authorization code" })),
        )
            .into_response(),
    }
}

async fn list_files(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "value": [
            { "id": "1", "name": "a.txt", "size": 10,
              "@microsoft.graph.downloadUrl": "https://dl.example/a" },
            { "id": "2", "name": "folder", "size": 0 }
        ]
    }))
    .into_response()
}

async fn list_users(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let scoped = params.contains_key("fileId") || params.contains_key("resource");
    if !scoped {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing id" }))).into_response();
    }
    Json(json!({
        "value": [
            { "id": "p1", "roles": ["read"],
              "grantedTo": { "user": { "id": "u1", "displayName": "Alice" } } },
            { "id": "p2", "roles": ["write"],
              "grantedTo": { "application": { "id": "app1", "displayName": "Sync" } } }
        ]
    }))
    .into_response()
}

async fn delta(
    State(mock): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    mock.delta_calls.fetch_add(1, Ordering::SeqCst);
    if params.get("resource").map(String::as_str) != Some("abc") {
        return Json(json!({ "value": [] })).into_response();
    }
    Json(json!({
        "value": [
            { "id": "9", "name": "report.docx", "size": 5 },
            { "id": "8", "name": "older.txt", "size": 1 }
        ]
    }))
    .into_response()
}

async fn subscribe(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match body.get("fileId").and_then(Value::as_str) {
        Some("f1") => Json(json!({ "id": "sub-1" })).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "no such file" }))).into_response(),
    }
}

async fn download(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match params.get("fileId").map(String::as_str) {
        Some("1") => "hello".into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn events(headers: HeaderMap) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Response> {
    if !authorized(&headers) {
        return Err(unauthorized());
    }
    let events = vec![
        Ok(Event::default().data(r#"{"message":"report.docx changed"}"#)),
        Ok(Event::default().data(r#"{"resource":"abc"}"#)),
    ];
    Ok(Sse::new(stream::iter(events).chain(stream::pending())))
}

/// Event stream that sends one event per connection and then hangs up.
async fn events_once(
    State(mock): State<Shared>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Response> {
    if !authorized(&headers) {
        return Err(unauthorized());
    }
    let n = mock.sse_connections.fetch_add(1, Ordering::SeqCst);
    let event = Event::default()
        .retry(Duration::from_millis(50))
        .id(n.to_string())
        .data(format!(r#"{{"message":"conn{}"}}"#, n));
    Ok(Sse::new(stream::iter(vec![Ok(event)])))
}

async fn start_dropping_mock() -> (String, Shared) {
    let mock = Shared::default();
    let app = Router::new()
        .route("/events/sse", get(events_once))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), mock)
}

async fn start_mock() -> (String, Shared) {
    let mock = Shared::default();
    let app = Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/onedrive/list-files", get(list_files))
        .route("/onedrive/list-users", get(list_users))
        .route("/onedrive/delta", get(delta))
        .route("/onedrive/download-file", get(download))
        .route("/realtime/subscribe", post(subscribe))
        .route("/events/sse", get(events))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), mock)
}

fn console(
    base_url: &str,
    variant: ClientVariant,
    store: Arc<MemorySessionStore>,
) -> Console<HttpBackend, Arc<MemorySessionStore>> {
    let config = ConsoleConfig {
        base_url: base_url.to_string(),
        variant,
        ..ConsoleConfig::default()
    };
    Console::new(HttpBackend::new(&config).unwrap(), store, variant).unwrap()
}

async fn next_push(
    console: &mut Console<HttpBackend, Arc<MemorySessionStore>>,
) -> PushNotification {
    tokio::time::timeout(Duration::from_secs(5), console.next_push())
        .await
        .expect("push notification within 5s")
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_login_then_list_files() {
    let (base, _mock) = start_mock().await;
    let store = Arc::new(MemorySessionStore::new());
    let mut console = console(&base, ClientVariant::FileSubscriptions, store.clone());

    let url = console.login().await.unwrap();
    assert!(url.starts_with("https://login.example/"));
    assert!(matches!(
        console.state().phase(),
        SessionPhase::Redirected { .. }
    ));

    console.complete_login("XYZ").await.unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some(TOKEN));
    assert!(console.state().is_logged_in());

    assert_eq!(console.list_files().await.unwrap(), 2);

    let Screen::Main(view) = screen(console.state(), &Route::Main) else {
        panic!("expected main view");
    };
    let PanelBody::Files(rows) = &view.active_panel().unwrap().body else {
        panic!("expected files panel");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].action,
        FileAction::Download {
            href: "https://dl.example/a".into()
        }
    );
    assert_eq!(rows[1].action, FileAction::Empty);
}

#[tokio::test]
async fn test_rejected_code_keeps_callback_view() {
    let (base, _mock) = start_mock().await;
    let store = Arc::new(MemorySessionStore::new());
    let mut app = App::new(
        console(&base, ClientVariant::FileSubscriptions, store.clone()),
        false,
    );

    assert!(app.on_callback("nope").await.is_err());
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(app.screen(), Screen::Callback);
    assert!(!app.console().auth().is_authenticated());
}

#[tokio::test]
async fn test_app_login_flow() {
    let (base, _mock) = start_mock().await;
    let store = Arc::new(MemorySessionStore::new());
    let mut app = App::new(
        console(&base, ClientVariant::FileSubscriptions, store),
        false,
    );
    assert_eq!(app.screen(), Screen::Login);

    let reply = app.execute(Command::Login).await.unwrap();
    assert!(matches!(reply, Reply::Print(text) if text.contains("login.example")));

    app.on_callback("XYZ").await.unwrap();
    assert_eq!(app.route(), &Route::Main);
    assert!(matches!(app.screen(), Screen::Main(_)));

    app.execute(Command::Logout).await.unwrap();
    assert_eq!(app.screen(), Screen::Login);
    assert!(!app.console().is_push_open());
}

#[tokio::test]
async fn test_list_users_skips_non_user_grants() {
    let (base, _mock) = start_mock().await;
    for variant in [ClientVariant::FileSubscriptions, ClientVariant::ResourceDelta] {
        let store = Arc::new(MemorySessionStore::with_token(TOKEN));
        let mut console = console(&base, variant, store);
        console.set_selected_id("f1");

        assert_eq!(console.list_users().await.unwrap(), 1);
        assert_eq!(console.state().users()[0].display_name, "Alice");
    }
}

#[tokio::test]
async fn test_push_notifications() {
    let (base, mock) = start_mock().await;
    let store = Arc::new(MemorySessionStore::with_token(TOKEN));
    let mut console = console(&base, ClientVariant::ResourceDelta, store);
    console.start();
    assert!(console.is_push_open());

    let first = next_push(&mut console).await;
    assert_eq!(
        first,
        PushNotification::Message {
            message: "report.docx changed".into()
        }
    );
    console.handle_push(first).await;
    assert_eq!(mock.delta_calls.load(Ordering::SeqCst), 0);

    let second = next_push(&mut console).await;
    console.handle_push(second).await;
    assert_eq!(mock.delta_calls.load(Ordering::SeqCst), 1);

    let texts: Vec<String> = console
        .take_notifications()
        .into_iter()
        .map(|n| n.text)
        .collect();
    assert_eq!(
        texts,
        vec![
            "File change detected: report.docx changed".to_string(),
            "File updated: report.docx".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_push_channel_reconnects_after_drop() {
    let (base, mock) = start_dropping_mock().await;
    let store = Arc::new(MemorySessionStore::with_token(TOKEN));
    let mut console = console(&base, ClientVariant::FileSubscriptions, store);
    console.start();

    assert_eq!(
        next_push(&mut console).await,
        PushNotification::Message {
            message: "conn0".into()
        }
    );
    assert_eq!(
        next_push(&mut console).await,
        PushNotification::Message {
            message: "conn1".into()
        }
    );

    assert!(mock.sse_connections.load(Ordering::SeqCst) >= 2);
    assert!(console.state().is_logged_in());
    assert!(console.is_push_open());
}

#[tokio::test]
async fn test_rejected_push_channel_is_not_retried() {
    let (base, mock) = start_dropping_mock().await;
    let store = Arc::new(MemorySessionStore::with_token("stale"));
    let mut console = console(&base, ClientVariant::FileSubscriptions, store);
    console.start();

    let waited = tokio::time::timeout(Duration::from_millis(300), console.next_push()).await;
    assert!(waited.is_err());
    assert!(!console.is_push_open());
    assert_eq!(mock.sse_connections.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_subscription_outcomes_are_notified() {
    let (base, _mock) = start_mock().await;
    let store = Arc::new(MemorySessionStore::with_token(TOKEN));
    let mut console = console(&base, ClientVariant::FileSubscriptions, store);

    console.set_selected_id("f1");
    assert_eq!(console.create_subscription().await.unwrap(), "sub-1");

    console.set_selected_id("missing");
    let err = console.create_subscription().await.unwrap_err();
    assert_eq!(err.code, ConsoleErrorCode::NotFound);

    let texts: Vec<String> = console
        .take_notifications()
        .into_iter()
        .map(|n| n.text)
        .collect();
    assert_eq!(
        texts,
        vec![
            "Subscription created: sub-1".to_string(),
            "Error creating subscription".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_download_to_file() {
    let (base, _mock) = start_mock().await;
    let store = Arc::new(MemorySessionStore::with_token(TOKEN));
    let mut app = App::new(
        console(&base, ClientVariant::FileSubscriptions, store),
        false,
    );
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a.txt");

    let reply = app
        .execute(Command::Download {
            id: Some("1".into()),
            out: out.clone(),
        })
        .await
        .unwrap();

    assert!(matches!(reply, Reply::Print(_)));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "hello");
}

#[tokio::test]
async fn test_bad_token_is_auth_failure() {
    let (base, _mock) = start_mock().await;
    let store = Arc::new(MemorySessionStore::with_token("stale"));
    let mut console = console(&base, ClientVariant::FileSubscriptions, store);

    let err = console.list_files().await.unwrap_err();
    assert_eq!(err.code, ConsoleErrorCode::AuthFailed);
    assert!(console.state().files().is_empty());
}

use super::*;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::{domain::CatalogId, error::ErrorCode};
use tokio::{net::TcpListener, sync::Mutex};
use url::Url;

#[derive(Debug, Clone)]
struct SeenRequest {
    method: &'static str,
    path: String,
    authorization: Option<String>,
    app_id: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct ServerState {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    records: Arc<Mutex<Vec<Value>>>,
    reject_with: Option<(StatusCode, Value)>,
    empty_updates: bool,
}

impl ServerState {
    async fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().await.push(SeenRequest {
            method,
            path,
            authorization: header("authorization"),
            app_id: header("x-app-id"),
            body,
        });
    }

    fn rejection(&self) -> Option<Response> {
        self.reject_with
            .clone()
            .map(|(status, body)| (status, Json(body)).into_response())
    }
}

async fn list_entities(
    State(state): State<ServerState>,
    Path((app_id, entity)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    state
        .record("GET", format!("{app_id}/{entity}"), &headers, Value::Null)
        .await;
    if let Some(rejection) = state.rejection() {
        return rejection;
    }
    match entity.as_str() {
        "Catalog" => Json(Value::Array(state.records.lock().await.clone())).into_response(),
        _ => Json(Value::Null).into_response(),
    }
}

async fn create_entity(
    State(state): State<ServerState>,
    Path((app_id, entity)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state
        .record("POST", format!("{app_id}/{entity}"), &headers, body.clone())
        .await;
    if let Some(rejection) = state.rejection() {
        return rejection;
    }
    let mut created = body;
    created["id"] = json!("c9");
    created["created_date"] = json!("2025-09-04T10:00:00.000000");
    state.records.lock().await.push(created.clone());
    Json(created).into_response()
}

async fn entity_schema(
    State(state): State<ServerState>,
    Path((app_id, entity, id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    state
        .record("GET", format!("{app_id}/{entity}/{id}"), &headers, Value::Null)
        .await;
    if id != "schema" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "properties": {
            "name": { "type": "string" },
            "logo_size": { "type": "string", "default": "md" }
        }
    }))
    .into_response()
}

async fn update_entity(
    State(state): State<ServerState>,
    Path((app_id, entity, id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state
        .record("PUT", format!("{app_id}/{entity}/{id}"), &headers, body)
        .await;
    if let Some(rejection) = state.rejection() {
        return rejection;
    }
    if state.empty_updates {
        return StatusCode::NO_CONTENT.into_response();
    }
    Json(json!({ "id": id, "updated": true })).into_response()
}

async fn upload_file(
    State(state): State<ServerState>,
    Path(app_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut received = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        received.push(json!({ "field": name, "filename": filename, "size": bytes }));
    }
    state
        .record("POST", format!("{app_id}/upload"), &headers, Value::Array(received))
        .await;
    Json(json!({ "file_url": "https://cdn.example.test/logo.png" })).into_response()
}

async fn spawn_backend(state: ServerState) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route(
            "/api/apps/:app_id/entities/:entity",
            get(list_entities).post(create_entity),
        )
        .route(
            "/api/apps/:app_id/entities/:entity/:id",
            get(entity_schema).put(update_entity),
        )
        .route(
            "/api/apps/:app_id/integration-endpoints/Core/UploadFile",
            post(upload_file),
        )
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn client_for(server_url: &str) -> AppClient {
    AppClient::connect(AppConfig {
        base_url: Url::parse(server_url).expect("url"),
        app_id: "app-1".to_string(),
        access_token: Some("secret-token".to_string()),
        requires_auth: true,
    })
    .expect("client")
}

#[tokio::test]
async fn lists_catalogs_with_auth_headers() {
    let state = ServerState::default();
    state.records.lock().await.push(json!({
        "id": "c1",
        "name": "Main",
        "purpose": "general",
        "hero_title": "Learn"
    }));
    let server_url = spawn_backend(state.clone()).await.expect("spawn backend");
    let store = client_for(&server_url).entity::<CatalogRecord>();

    let catalogs = store.list().await.expect("list");
    assert_eq!(catalogs.len(), 1);
    assert_eq!(catalogs[0].id, Some(CatalogId::new("c1")));
    assert_eq!(catalogs[0].field("hero_title"), Some(&json!("Learn")));

    let seen = state.seen.lock().await;
    assert_eq!(seen[0].path, "app-1/Catalog");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret-token"));
    assert_eq!(seen[0].app_id.as_deref(), Some("app-1"));
}

#[tokio::test]
async fn null_listing_is_treated_as_empty() {
    let server_url = spawn_backend(ServerState::default())
        .await
        .expect("spawn backend");
    let projects = client_for(&server_url)
        .entity::<FunnelProjectSummary>()
        .list()
        .await
        .expect("list");
    assert!(projects.is_empty());
}

#[tokio::test]
async fn create_posts_payload_and_returns_assigned_id() {
    let state = ServerState::default();
    let server_url = spawn_backend(state.clone()).await.expect("spawn backend");
    let store = client_for(&server_url).entity::<CatalogRecord>();

    let mut payload = WritePayload::default();
    payload.insert("name", json!("Novo Catálogo"));
    let created = store.create(&payload).await.expect("create");

    assert_eq!(created.id, Some(CatalogId::new("c9")));
    assert_eq!(created.name(), Some("Novo Catálogo"));
    let seen = state.seen.lock().await;
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].body, json!({ "name": "Novo Catálogo" }));
}

#[tokio::test]
async fn update_puts_payload_under_record_path() {
    let state = ServerState::default();
    let server_url = spawn_backend(state.clone()).await.expect("spawn backend");
    let store = client_for(&server_url).entity::<CatalogRecord>();

    let mut payload = WritePayload::default();
    payload.insert("name", json!("Main Catalog"));
    let confirmation = store.update("c1", &payload).await.expect("update");

    assert_eq!(confirmation["updated"], json!(true));
    let seen = state.seen.lock().await;
    assert_eq!(seen[0].method, "PUT");
    assert_eq!(seen[0].path, "app-1/Catalog/c1");
    assert_eq!(seen[0].body, json!({ "name": "Main Catalog" }));
}

#[tokio::test]
async fn update_with_empty_body_succeeds_with_null_confirmation() {
    let state = ServerState {
        empty_updates: true,
        ..ServerState::default()
    };
    let server_url = spawn_backend(state.clone()).await.expect("spawn backend");
    let store = client_for(&server_url).entity::<CatalogRecord>();

    let mut payload = WritePayload::default();
    payload.insert("name", json!("Main Catalog"));
    let confirmation = store.update("c1", &payload).await.expect("update");

    assert_eq!(confirmation, Value::Null);
    assert_eq!(state.seen.lock().await[0].path, "app-1/Catalog/c1");
}

#[tokio::test]
async fn fetches_schema_defaults() {
    let server_url = spawn_backend(ServerState::default())
        .await
        .expect("spawn backend");
    let schema = client_for(&server_url)
        .entity::<CatalogRecord>()
        .schema()
        .await
        .expect("schema");
    assert_eq!(schema.defaults().get("logo_size"), Some(&json!("md")));
    assert_eq!(
        schema.properties.get("name").and_then(|p| p.kind.as_deref()),
        Some("string")
    );
}

#[tokio::test]
async fn rejected_write_surfaces_backend_error() {
    let state = ServerState {
        reject_with: Some((
            StatusCode::FORBIDDEN,
            json!({ "code": "forbidden", "message": "admins only" }),
        )),
        ..ServerState::default()
    };
    let server_url = spawn_backend(state).await.expect("spawn backend");
    let store = client_for(&server_url).entity::<CatalogRecord>();

    let err = store
        .update("c1", &WritePayload::default())
        .await
        .expect_err("must fail");
    match &err {
        StoreError::Rejected { status, error, .. } => {
            assert_eq!(*status, 403);
            assert_eq!(error.code, ErrorCode::Forbidden);
            assert_eq!(error.message, "admins only");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.requires_reauth());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client_for(&format!("http://{addr}"))
        .entity::<SalesPage>()
        .list()
        .await
        .expect_err("must fail");
    assert!(matches!(err, StoreError::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn uploads_image_as_multipart_and_returns_url() {
    let state = ServerState::default();
    let server_url = spawn_backend(state.clone()).await.expect("spawn backend");
    let uploader = HttpImageUploader::new(client_for(&server_url));

    let url = uploader
        .upload(
            "Logo file",
            None,
            ImageFile {
                filename: "logo.png".to_string(),
                mime_type: Some("image/png".to_string()),
                bytes: vec![0x89, b'P', b'N', b'G'],
            },
        )
        .await
        .expect("upload");

    assert_eq!(url, "https://cdn.example.test/logo.png");
    let seen = state.seen.lock().await;
    assert_eq!(
        seen[0].body,
        json!([{ "field": "file", "filename": "logo.png", "size": 4 }])
    );
}

use axum::{
    Router,
    extract::{Json, Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::catalog::ResourceCatalog;
use crate::cleanup::{CleanupSimulator, CloudResource, ProjectResources};
use crate::hub::NotificationHub;
use crate::notification::{NotificationId, NotificationRecord, Severity};

pub struct AppState {
    pub hub: NotificationHub,
    pub catalog: ResourceCatalog,
    pub simulator: Arc<CleanupSimulator>,
}

#[derive(Deserialize)]
struct NotifyRequest {
    #[serde(default)]
    message: String,
    severity: Option<serde_json::Value>,
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct NotifyResponse {
    id: NotificationId,
}

#[derive(Serialize)]
struct CountResponse {
    count: usize,
}

#[derive(Deserialize)]
struct PurgeRequest {
    pattern: String,
}

#[derive(Serialize)]
struct PurgeResponse {
    removed: usize,
}

#[derive(Deserialize)]
struct RemoveResourceRequest {
    project: String,
    resource_id: String,
}

#[derive(Deserialize)]
struct ForgetResourceRequest {
    project: String,
    name: String,
    #[serde(rename = "type", default)]
    resource_type: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/resources", get(get_resources))
        .route("/api/notifications", post(create_notification))
        .route("/api/notifications/active", get(list_active))
        .route("/api/notifications/active/:id", delete(dismiss_notification))
        .route("/api/notifications/history", get(list_history))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/purge", post(purge_history))
        .route("/api/cleanup/projects", get(list_projects))
        .route("/api/cleanup/remove", post(remove_resource))
        .route("/api/cleanup/forget", post(forget_resource))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(Arc::new(state))
}

async fn get_resources(State(state): State<Arc<AppState>>) -> ResponseJson<ResourceCatalog> {
    ResponseJson(state.catalog.clone())
}

async fn create_notification(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NotifyRequest>,
) -> (StatusCode, ResponseJson<NotifyResponse>) {
    // Anything other than a recognized string falls back to `info`.
    let severity = request.severity.map(|value| match value {
        serde_json::Value::String(name) => Severity::parse(&name),
        _ => Severity::Info,
    });
    let id = state
        .hub
        .notify_with_details(request.message, severity, request.details)
        .await;

    (StatusCode::CREATED, ResponseJson(NotifyResponse { id }))
}

async fn list_active(State(state): State<Arc<AppState>>) -> ResponseJson<Vec<NotificationRecord>> {
    ResponseJson(state.hub.list_active().await)
}

async fn list_history(
    State(state): State<Arc<AppState>>,
) -> ResponseJson<Vec<NotificationRecord>> {
    ResponseJson(state.hub.list_history().await)
}

async fn unread_count(State(state): State<Arc<AppState>>) -> ResponseJson<CountResponse> {
    ResponseJson(CountResponse {
        count: state.hub.unread_count().await,
    })
}

async fn dismiss_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    match NotificationId::parse(&id) {
        Some(id) => state.hub.dismiss(id).await,
        None => warn!("Ignoring dismiss for malformed id '{}'", id),
    }
    StatusCode::NO_CONTENT
}

async fn purge_history(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PurgeRequest>,
) -> ResponseJson<PurgeResponse> {
    let removed = state.hub.purge_history_by_text(&request.pattern).await;
    ResponseJson(PurgeResponse { removed })
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> ResponseJson<Vec<ProjectResources>> {
    ResponseJson(state.simulator.projects().await)
}

async fn remove_resource(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RemoveResourceRequest>,
) -> Result<ResponseJson<CloudResource>, StatusCode> {
    match state
        .simulator
        .remove_now(&request.project, &request.resource_id)
        .await
    {
        Some(resource) => {
            info!("Removed {} from {}", resource.name, request.project);
            Ok(ResponseJson(resource))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn forget_resource(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgetResourceRequest>,
) -> ResponseJson<PurgeResponse> {
    let removed = state
        .simulator
        .forget(request.project, request.name, request.resource_type)
        .await;
    ResponseJson(PurgeResponse { removed })
}

//! titanhelp-api: REST API server for the titanhelp ticket tracker
//!
//! Thin HTTP layer over `TicketStore`. All error-to-status mapping lives in
//! [`ApiError`].

use axum::{
    Json, Router,
    extract::{
        FromRequest, FromRequestParts, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use titanhelp_core::{Config, ListFilter, Ticket, TicketStore, TicketUpdate};

/// Environment variable overriding `api.port`
const PORT_ENV: &str = "TITANHELP_API_PORT";

/// Shared application state
struct AppState {
    store: Mutex<TicketStore>,
}

impl AppState {
    fn store(&self) -> Result<MutexGuard<'_, TicketStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("ticket store lock poisoned".into()))
    }
}

/// JSON body extractor whose rejection goes through [`ApiError`]
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

/// Query string extractor whose rejection goes through [`ApiError`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
struct ApiQuery<T>(T);

/// Path extractor whose rejection goes through [`ApiError`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
struct ApiPath<T>(T);

/// Request to create a new ticket
///
/// Name and description are optional here so that a missing field reaches
/// the store and comes back as its specific validation message.
#[derive(Debug, Deserialize)]
struct CreateTicketRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
}

/// Request to set a ticket's status
#[derive(Debug, Deserialize)]
struct SetStatusRequest {
    status: String,
}

/// API response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Failure of a request, mapped uniformly to a status code
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("Ticket {0} not found")]
    NotFound(i64),

    /// Body, query string or path could not be decoded
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] titanhelp_core::Error),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        // storage details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn found(id: i64, ticket: Option<Ticket>) -> ApiResult<Ticket> {
    let ticket = ticket.ok_or(ApiError::NotFound(id))?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(ticket))))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// List tickets
async fn list_tickets(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<ListFilter>,
) -> ApiResult<Vec<Ticket>> {
    let tickets = state.store()?.list(&filter)?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(tickets))))
}

/// Get a single ticket by id
async fn get_ticket(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i64>) -> ApiResult<Ticket> {
    let ticket = state.store()?.get(id)?;
    found(id, ticket)
}

/// Create a new ticket
async fn create_ticket(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateTicketRequest>,
) -> ApiResult<Ticket> {
    let ticket = state.store()?.create(
        req.name.as_deref().unwrap_or_default(),
        req.description.as_deref().unwrap_or_default(),
        req.priority.as_deref(),
    )?;
    tracing::info!(id = ticket.id, "created ticket");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ticket))))
}

/// Update an existing ticket
async fn update_ticket(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<TicketUpdate>,
) -> ApiResult<Ticket> {
    let ticket = state.store()?.update(id, &req)?;
    found(id, ticket)
}

/// Set the status of a ticket
async fn set_status(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<SetStatusRequest>,
) -> ApiResult<Ticket> {
    let ticket = state.store()?.set_status(id, &req.status)?;
    found(id, ticket)
}

/// Close a ticket
async fn close_ticket(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i64>) -> ApiResult<Ticket> {
    let ticket = state.store()?.close(id)?;
    found(id, ticket)
}

/// Delete a ticket permanently
async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<serde_json::Value> {
    if !state.store()?.delete(id)? {
        return Err(ApiError::NotFound(id));
    }
    tracing::info!(id, "deleted ticket");
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(serde_json::json!({ "deleted": id }))),
    ))
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/tickets/{id}",
            get(get_ticket).patch(update_ticket).delete(delete_ticket),
        )
        .route("/tickets/{id}/close", post(close_ticket))
        .route("/tickets/{id}/status", post(set_status))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::discover()?;
    let store = TicketStore::from_config(&config.database)
        .map_err(|e| anyhow::anyhow!("Failed to open ticket store: {}", e))?;

    let state = Arc::new(AppState {
        store: Mutex::new(store),
    });
    let app = router(state);

    let port: u16 = std::env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(config.api.port);

    let addr = format!("{}:{}", config.api.host, port);
    tracing::info!("Starting titanhelp-api on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = TicketStore::open_in_memory().unwrap();
        router(Arc::new(AppState {
            store: Mutex::new(store),
        }))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/tickets",
            Some(serde_json::json!({ "name": " Printer ", "description": "Out of toner" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["name"], "Printer");
        assert_eq!(body["data"]["status"], "Open");
        assert_eq!(body["data"]["priority"], "Low");

        let id = body["data"]["id"].as_i64().unwrap();
        let (status, body) = send(&app, "GET", &format!("/tickets/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["description"], "Out of toner");
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/tickets",
            Some(serde_json::json!({ "name": "Ceiling fan", "description": "Exploded", "priority": "Important" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Priority must be one of")
        );

        let (status, body) = send(
            &app,
            "POST",
            "/tickets",
            Some(serde_json::json!({ "description": "no name" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name is required");

        let (status, _) = send(&app, "GET", "/tickets?status=Pending", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_ticket_maps_to_404() {
        let app = app();
        let (status, body) = send(&app, "GET", "/tickets/999999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Ticket 999999 not found");

        let (status, _) = send(&app, "POST", "/tickets/999999/close", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/tickets/999999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_close_update_list_delete() {
        let app = app();
        for (name, priority) in [("Mouse", "Low"), ("Monitor", "High")] {
            let (status, _) = send(
                &app,
                "POST",
                "/tickets",
                Some(serde_json::json!({ "name": name, "description": "broken", "priority": priority })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = send(&app, "GET", "/tickets?priority=High", None).await;
        let monitor = body["data"][0]["id"].as_i64().unwrap();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, "POST", &format!("/tickets/{monitor}/close"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Closed");

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/tickets/{monitor}"),
            Some(serde_json::json!({ "status": "Reopened" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Status must be one of"));

        let (status, body) = send(
            &app,
            "POST",
            &format!("/tickets/{monitor}/status"),
            Some(serde_json::json!({ "status": "In Progress" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "In Progress");

        let (_, body) = send(&app, "GET", "/tickets?status=In%20Progress", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, "DELETE", &format!("/tickets/{monitor}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deleted"], monitor);

        let (_, body) = send(&app, "GET", "/tickets", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["name"], "Mouse");
    }

    #[tokio::test]
    async fn test_undecodable_requests_use_envelope() {
        let app = app();

        let req = Request::builder()
            .method("POST")
            .uri("/tickets")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, "GET", "/tickets?limit=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, "GET", "/tickets/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, "POST", "/tickets/1/status", Some(serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::session_auth_middleware;
use crate::services::InventoryService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: InventoryService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(service: InventoryService, config: AppConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }

    /// Open the configured storage backend and wire the service on top.
    pub async fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        let repo = DatabaseManager::open(&config.storage).await?;
        let service = InventoryService::new(repo, config.security.bcrypt_cost);
        Ok(Self::new(service, config))
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::user_register))
        .route("/auth/login", post(auth::session_login))
        .route("/auth/logout", post(auth::session_logout))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{auth, items};

    Router::new()
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route("/api/items", get(items::items_get).post(items::items_post))
        .route(
            "/api/items/:id",
            get(items::item_get).put(items::item_put).delete(items::item_delete),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, session_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Inventory Tracker",
            "version": version,
            "endpoints": {
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login, /auth/logout (public)",
                "whoami": "/api/auth/whoami (session)",
                "items": "/api/items[/:id] (session)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.service.repository().health_check().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("Storage unavailable")
    })?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "storage": "ok"
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, Claims};
    use crate::database::models::User;
    use crate::database::sql_store::SqlStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 4;
        config.api.enable_request_logging = false;
        let store = SqlStore::new(DatabaseManager::in_memory().await.unwrap()).await.unwrap();
        let service = InventoryService::new(Arc::new(store), config.security.bcrypt_cost);
        app(AppState::new(service, config))
    }

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register_and_login(app: &Router, username: &str) -> String {
        let (status, _) = call(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": username, "email": "x@example.com", "password": "pw", "confirm": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": username, "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = test_app().await;
        let (status, body) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn api_requires_session() {
        let app = test_app().await;
        let (status, body) = call(&app, Method::GET, "/api/items", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = call(&app, Method::GET, "/api/items", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_reports_unavailable_storage() {
        let pool = DatabaseManager::in_memory().await.unwrap();
        let store = SqlStore::new(pool.clone()).await.unwrap();
        let app = app(AppState::new(
            InventoryService::new(Arc::new(store), 4),
            AppConfig::development(),
        ));
        pool.close().await;

        let (status, body) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn whoami_reports_session_user() {
        let app = test_app().await;
        let token = register_and_login(&app, "carol").await;

        let (status, body) = call(&app, Method::GET, "/api/auth/whoami", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "carol");
        assert_eq!(body["data"]["email"], "x@example.com");
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn token_for_missing_user_is_rejected() {
        let app = test_app().await;
        let ghost = User {
            id: 999,
            username: "ghost".to_string(),
            email: "ghost@example.com".to_string(),
            password_hash: String::new(),
        };
        let config = AppConfig::development();
        let token = generate_jwt(&Claims::new(&ghost, 1), &config.security).unwrap();

        let (status, body) = call(&app, Method::GET, "/api/items", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Session user no longer exists");
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let app = test_app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ nope"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn item_lifecycle_with_ownership() {
        let app = test_app().await;
        let alice = register_and_login(&app, "alice").await;
        let bob = register_and_login(&app, "bob").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/items",
            Some(&alice),
            Some(json!({ "sku": "W-1", "name": "Widget", "qty": "5", "purchase_price": "2.50" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["qty"], 5);
        assert_eq!(body["data"]["purchase_price"], 2.5);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/items",
            Some(&alice),
            Some(json!({ "sku": "W-1", "name": "Again" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "SKU already exists");

        let uri = format!("/api/items/{id}");
        let (status, _) = call(&app, Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, Method::GET, "/api/items", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));

        let (status, body) = call(
            &app,
            Method::PUT,
            &uri,
            Some(&alice),
            Some(json!({ "name": "Widget v2", "qty": 9 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Widget v2");
        assert_eq!(body["data"]["sku"], "W-1");

        let (status, _) = call(&app, Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::GET, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

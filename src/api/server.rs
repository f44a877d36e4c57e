//! HTTP server
//!
//! Axum server with configurable binding, CORS, request timeouts, trace ID
//! propagation, and graceful shutdown.

use crate::api::handlers::AppState;
use crate::api::middleware::trace_id_middleware;
use crate::api::routes::build_api_routes;
use crate::core::config::{Config, ServerConfig};
use crate::db::manager::DatabaseManager;
use axum::{middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// HTTP API Server
pub struct ApiServer {
    router: Router,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new API server from the loaded configuration
    pub fn new(config: &Config, db: Arc<DatabaseManager>) -> Self {
        let state = AppState::new(
            db,
            config.auth.jwt_secret.clone(),
            config.auth.token_ttl_minutes,
        );

        let router = Self::build_router(config, state);

        Self {
            router,
            config: config.server.clone(),
        }
    }

    fn build_router(config: &Config, state: AppState) -> Router {
        let api_router = Router::new()
            .route("/api/v1/health", get(health_check))
            .merge(build_api_routes(state));

        api_router.layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(trace_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout,
                )))
                .layer(Self::build_cors_layer(&config.security.allowed_origins)),
        )
    }

    /// Build the CORS layer from configured origins; "*" means any origin
    fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
        use tower_http::cors::Any;

        let cors = CorsLayer::new();

        if allowed_origins.contains(&"*".to_string()) {
            cors.allow_origin(Any).allow_methods(Any).allow_headers(Any)
        } else {
            let origins: Vec<_> = allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            cors.allow_origin(origins).allow_methods(Any).allow_headers(Any)
        }
    }

    /// Start the HTTP server and block until it shuts down gracefully
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr.parse()?;

        let listener = tokio::net::TcpListener::bind(socket_addr).await?;
        info!(addr = %socket_addr, "HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");

        Ok(())
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt;
    use crate::auth::password;
    use crate::db::models::UserRole;
    use crate::db::repository::NewUser;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    const SECRET: &str = "server-test-secret";

    fn test_config() -> Config {
        Config {
            server: crate::core::config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                request_timeout: 30,
            },
            database: crate::core::config::DatabaseConfig {
                path: ":memory:".into(),
                connection_pool_size: 1,
                busy_timeout: 5000,
            },
            auth: crate::core::config::AuthConfig {
                jwt_secret: SECRET.to_string(),
                token_ttl_minutes: 60,
            },
            security: crate::core::config::SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
            logging: crate::core::config::LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                output: "stdout".to_string(),
                log_file: None,
            },
        }
    }

    async fn test_server() -> (Arc<DatabaseManager>, ApiServer) {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let server = ApiServer::new(&test_config(), db.clone());
        (db, server)
    }

    #[tokio::test]
    async fn test_health_check_is_public() {
        let (_db, server) = test_server().await;

        let response = server
            .router()
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (_db, server) = test_server().await;

        for uri in ["/api/v1/courses", "/api/v1/enrollments", "/api/v1/users/me"] {
            let response = server
                .router()
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_register_login_and_fetch_profile() {
        let (_db, server) = test_server().await;
        let router = server.router().clone();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"full_name": "Alex Johnson", "email": "alex@example.com", "password": "student123"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("username=alex%40example.com&password=student123"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let token: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(token["token_type"], "bearer");

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users/me")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token["access_token"].as_str().unwrap()),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let profile: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(profile["email"], "alex@example.com");
        assert_eq!(profile["role"], "student");
    }

    #[tokio::test]
    async fn test_admin_reset_forbidden_for_students() {
        let (db, server) = test_server().await;

        let users = crate::db::repository::UserRepository::new(db);
        users
            .create(NewUser {
                full_name: "Alex Johnson".to_string(),
                email: "alex@example.com".to_string(),
                password_hash: password::hash_password("student123").unwrap(),
                role: UserRole::Student,
            })
            .await
            .unwrap();
        let token = jwt::issue_token("alex@example.com", 60, SECRET).unwrap();

        let response = server
            .router()
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/admin/progress/reset")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_error_body_carries_trace_id() {
        let (_db, server) = test_server().await;

        let response = server
            .router()
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/courses")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"], "InvalidToken");
        assert!(error["trace_id"].is_string());
    }
}

//! Health check endpoint.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use subscriber_db::PurchaseStore;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub database: DatabaseStatus,
}

/// Overall health status.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Store reachability.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Up,
    Down,
}

/// Create health check routes.
pub fn health_routes(store: Arc<dyn PurchaseStore>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(store)
}

/// Health check handler.
async fn health_handler(State(store): State<Arc<dyn PurchaseStore>>) -> impl IntoResponse {
    let (status_code, status, database) = match store.ping().await {
        Ok(()) => (StatusCode::OK, HealthStatus::Healthy, DatabaseStatus::Up),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed to reach the store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthStatus::Unhealthy,
                DatabaseStatus::Down,
            )
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use subscriber_db::MemoryStore;
    use tower::ServiceExt;

    async fn get_health(store: &MemoryStore) -> (StatusCode, Value) {
        let response = health_routes(Arc::new(store.clone()))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_when_store_is_up() {
        let store = MemoryStore::new();

        let (status, json) = get_health(&store).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"], "up");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_health_when_store_is_down() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let (status, json) = get_health(&store).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["database"], "down");
    }
}

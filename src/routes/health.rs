//! Health Check Endpoint
//!
//! 댓글 저장소와 RPC 노드 모두 응답하면 `healthy`, 하나라도 실패하면 `degraded`.

use std::time::Instant;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub store: DependencyStatus,
    pub chain: DependencyStatus,
    pub timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStatus {
    pub connected: bool,
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl DependencyStatus {
    fn down() -> Self {
        Self {
            connected: false,
            latency_ms: None,
            block_number: None,
        }
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_start = Instant::now();
    let store = match state.comments.health_check().await {
        Ok(()) => DependencyStatus {
            connected: true,
            latency_ms: Some(store_start.elapsed().as_millis() as u64),
            block_number: None,
        },
        Err(err) => {
            tracing::warn!("comment store health check failed: {:#}", err);
            DependencyStatus::down()
        }
    };

    let chain_start = Instant::now();
    let chain = match state.chain.block_number().await {
        Ok(block) => DependencyStatus {
            connected: true,
            latency_ms: Some(chain_start.elapsed().as_millis() as u64),
            block_number: Some(block),
        },
        Err(err) => {
            tracing::warn!("rpc health check failed: {:#}", err);
            DependencyStatus::down()
        }
    };

    let healthy = store.connected && chain.connected;

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.as_str().to_string(),
        store,
        chain,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::db::mock::MockCommentRepository;
    use crate::routes::test_support::{app, get, send};
    use crate::services::mock::MockChain;

    #[tokio::test]
    async fn test_healthy() {
        let app = app(Arc::new(MockCommentRepository::new()), Arc::new(MockChain::pre_launch()));

        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["environment"], "development");
        assert_eq!(body["chain"]["blockNumber"], 1);
        assert!(body["store"]["latencyMs"].is_u64());
        assert!(body["store"].get("blockNumber").is_none());
        assert!(body["chain"].get("block_number").is_none());
    }

    #[tokio::test]
    async fn test_degraded_when_store_down() {
        let app = app(Arc::new(MockCommentRepository::failing()), Arc::new(MockChain::pre_launch()));

        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["store"]["connected"], false);
        assert_eq!(body["chain"]["connected"], true);
    }
}

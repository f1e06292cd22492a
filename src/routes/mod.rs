//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//!
//! ```text
//! GET  /health              - 서버 및 의존성 상태
//! GET  /api/comment-tree    - 토픽 댓글 트리 (?address=)
//! POST /api/comments        - 댓글 작성
//! GET  /api/balance         - 토픽 내 사용자 잔액 (?address=&user=)
//! ```
//!
//! 등록되지 않은 메서드는 405 + JSON 에러 본문

pub mod health;
pub mod comments;
pub mod balance;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{error::ApiError, types::EthAddress, AppState};

/// 라우터 생성
///
/// CORS / trace 레이어는 main에서 추가
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))

        // Comments
        .route(
            "/api/comment-tree",
            get(comments::get_comment_tree).fallback(method_not_allowed),
        )
        .route(
            "/api/comments",
            post(comments::create_comment).fallback(method_not_allowed),
        )

        // Balance
        .route(
            "/api/balance",
            get(balance::get_user_balance).fallback(method_not_allowed),
        )

        // 상태 주입
        .with_state(state)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// 필수 주소 파라미터 검증
fn required_address(value: Option<&str>, name: &str) -> Result<EthAddress, ApiError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("`{}` is required", name)))?;

    EthAddress::parse(value).map_err(ApiError::ValidationError)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::db::mock::MockCommentRepository;
    use crate::services::mock::MockChain;
    use crate::{AppState, Config};

    pub fn app(repo: Arc<MockCommentRepository>, chain: Arc<MockChain>) -> Router {
        let state = AppState {
            comments: repo,
            chain,
            config: Arc::new(Config::default()),
        };
        super::create_router(state)
    }

    /// 요청을 보내고 (status, JSON body) 반환
    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

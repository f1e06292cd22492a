//! Balance Endpoints
//!
//! 토픽 내 사용자 지분 조회. 댓글 트리와 같은 규칙으로 잔액을 계산함.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    services::{resolve_balance, Balance},
    AppState,
};
use super::required_address;

/// 잔액 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// 토픽 (sale 컨트랙트 주소)
    pub address: Option<String>,
    /// 사용자 지갑 주소
    pub user: Option<String>,
}

/// 잔액 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBalanceResponse {
    pub is_launched: bool,
    /// 십진 문자열 (전체 정밀도)
    pub balance: Balance,
    /// 소수점 2자리
    pub display: Balance,
}

/// GET /api/balance?address=0x...&user=0x...
pub async fn get_user_balance(
    State(state): State<AppState>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> Result<Json<UserBalanceResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let topic = required_address(query.address.as_deref(), "address")?;
    let user = required_address(query.user.as_deref(), "user")?;

    let launch = state
        .chain
        .launch_state(topic.address())
        .await
        .with_context(|| format!("resolving launch state of {}", topic))?;
    let balance = resolve_balance(state.chain.as_ref(), topic.address(), &launch, user.as_str()).await?;

    Ok(Json(UserBalanceResponse {
        is_launched: launch.launched,
        display: balance.to_display(),
        balance,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::db::mock::MockCommentRepository;
    use crate::routes::test_support::{app, get, send};
    use crate::services::mock::MockChain;

    const TOPIC: &str = "0x9999999999999999999999999999999999999999";
    const ALICE: &str = "0x1111111111111111111111111111111111111111";

    #[tokio::test]
    async fn test_pre_launch_balance() {
        let chain = Arc::new(MockChain::pre_launch().with_sale(ALICE, 12));
        let app = app(Arc::new(MockCommentRepository::new()), chain);

        let (status, body) = send(app, get(&format!("/api/balance?address={}&user={}", TOPIC, ALICE))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isLaunched"], false);
        assert_eq!(body["display"]["saleBalance"], "12.00");
        assert!(body["balance"].get("positiveBalance").is_none());
    }

    #[tokio::test]
    async fn test_launched_balance() {
        let chain = Arc::new(MockChain::launched().with_tokens(ALICE, 3, 1));
        let app = app(Arc::new(MockCommentRepository::new()), chain);

        let (status, body) = send(app, get(&format!("/api/balance?address={}&user={}", TOPIC, ALICE))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isLaunched"], true);
        assert_eq!(body["display"]["positiveBalance"], "3.00");
        assert_eq!(body["display"]["negativeBalance"], "1.00");
        assert!(body["balance"].get("saleBalance").is_none());
    }

    #[tokio::test]
    async fn test_balance_requires_user() {
        let app = app(Arc::new(MockCommentRepository::new()), Arc::new(MockChain::pre_launch()));

        let (status, _) = send(app, get(&format!("/api/balance?address={}", TOPIC))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_balance_chain_failure() {
        let app = app(Arc::new(MockCommentRepository::new()), Arc::new(MockChain::failing()));

        let (status, body) = send(app, get(&format!("/api/balance?address={}&user={}", TOPIC, ALICE))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}

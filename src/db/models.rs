//! Database Models
//!
//! `comment` 테이블 매핑. 컬럼 이름은 프론트엔드와 공유하는 camelCase를 그대로 사용.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// 댓글 (flat record)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,

    pub content: String,

    /// 작성자 지갑 주소 (lowercase)
    #[sqlx(rename = "userAddress")]
    #[serde(rename = "userAddress")]
    pub user_address: String,

    /// 부모 댓글 ID. None이면 root 댓글
    #[sqlx(rename = "parentId")]
    #[serde(rename = "parentId")]
    pub parent_id: Option<i64>,

    /// 토픽 (sale 컨트랙트 주소, lowercase)
    #[sqlx(rename = "newsAddress")]
    #[serde(rename = "newsAddress")]
    pub news_address: String,

    #[sqlx(rename = "likeCount")]
    #[serde(rename = "likeCount")]
    pub like_count: i32,

    pub created_at: Option<DateTime<Utc>>,
}

/// 새 댓글 (insert용)
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub user_address: String,
    pub parent_id: Option<i64>,
    pub news_address: String,
}

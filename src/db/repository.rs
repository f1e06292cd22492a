//! Repository Pattern Implementation
//!
//! 댓글 저장소 인터페이스. PostgreSQL 구현은 db/mod.rs의 `Database`,
//! 테스트에서는 아래 `mock::MockCommentRepository` 사용.

use async_trait::async_trait;
use anyhow::Result;

use super::models::{Comment, NewComment};

/// Comment Repository 인터페이스
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// 토픽의 모든 댓글 조회 (created_at 내림차순)
    async fn find_by_topic(&self, news_address: &str) -> Result<Vec<Comment>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// 댓글 저장. id, likeCount, created_at은 저장소가 채움
    async fn insert(&self, comment: NewComment) -> Result<Comment>;

    async fn health_check(&self) -> Result<()>;
}

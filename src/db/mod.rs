//! Database Module
//!
//! PostgreSQL `comment` 테이블 접근.
//!
//! - 커넥션 풀: SQLx `PgPool`
//! - 스키마: `migrations/` (시작 시 `run_migrations`로 적용)
//! - 주소 컬럼은 모두 lowercase로 저장/조회

mod models;
mod repository;

pub use models::*;
pub use repository::CommentRepository;
#[cfg(test)]
pub use repository::mock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10
    /// - min_connections: 1
    /// - acquire_timeout: 3초
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await
            .context("connecting to PostgreSQL")?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("running migrations")?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for Database {
    async fn find_by_topic(&self, news_address: &str) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT
                id,
                content,
                "userAddress",
                "parentId",
                "newsAddress",
                "likeCount",
                created_at
            FROM comment
            WHERE "newsAddress" = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(news_address.to_lowercase())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("fetching comments for {}", news_address))?;

        Ok(comments)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT
                id,
                content,
                "userAddress",
                "parentId",
                "newsAddress",
                "likeCount",
                created_at
            FROM comment
            WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetching comment {}", id))?;

        Ok(comment)
    }

    async fn insert(&self, comment: NewComment) -> Result<Comment> {
        let stored = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comment (content, "userAddress", "parentId", "newsAddress", "likeCount")
            VALUES ($1, $2, $3, $4, 0)
            RETURNING
                id,
                content,
                "userAddress",
                "parentId",
                "newsAddress",
                "likeCount",
                created_at
            "#
        )
        .bind(&comment.content)
        .bind(comment.user_address.to_lowercase())
        .bind(comment.parent_id)
        .bind(comment.news_address.to_lowercase())
        .fetch_one(&self.pool)
        .await
        .context("inserting comment")?;

        Ok(stored)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

//! Skin in the Game Comment API Library
//!
//! # Overview
//!
//! 토픽(sale 컨트랙트)별 댓글을 작성자의 토큰 지분으로 가중치를 매겨
//! 트리 형태로 제공하는 백엔드 API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐    │
//! │  │ Routes  │  │Services │  │   DB    │  │  Types  │    │
//! │  └────┬────┘  └────┬────┘  └────┬────┘  └────┬────┘    │
//! │       │            │            │            │          │
//! │       └────────────┴────────────┴────────────┘          │
//! │                         │                                │
//! └─────────────────────────┼────────────────────────────────┘
//!                           │
//!                           ▼
//!                  ┌────────────────┐
//!                  │ Sale contracts │
//!                  │ + ERC-20 tokens│
//!                  └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 댓글 트리, 잔액 조회, 체인 연동
//! - `db`: 댓글 저장소
//! - `types`: 공통 타입 정의

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod db;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::ApiError;
pub use db::{CommentRepository, Database};
pub use services::{BalanceResolver, BlockchainService, CommentTreeService};

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<dyn CommentRepository>,
    pub chain: Arc<dyn BalanceResolver>,
    pub config: Arc<Config>,
}

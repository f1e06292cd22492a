//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `BlockchainService`: sale 컨트랙트 / 포지션 토큰 조회
//! - `balance`: 작성자 잔액 조회 및 표시 형식
//! - `CommentTreeService`: 댓글 트리 조립, 가중치, top 댓글

mod blockchain;
mod balance;
mod comment_tree;

pub use blockchain::{BalanceResolver, BlockchainConfig, BlockchainService, LaunchState};
#[cfg(test)]
pub use blockchain::mock;
pub use balance::{resolve_balance, Balance, BalanceAmounts};
pub use comment_tree::{
    assemble, rank_forest, Candidate, CommentNode, CommentTree, CommentTreeService,
    MetadataIndex, RankedForest, TreeMetadata, MAX_REPLY_DEPTH, REPLY_DECAY,
};

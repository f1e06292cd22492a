//! Comment Endpoints
//!
//! 토픽별 댓글 트리 조회와 댓글 작성.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer};

use crate::{
    db::{Comment, CommentRepository, NewComment},
    error::ApiError,
    services::{CommentTree, CommentTreeService, MAX_REPLY_DEPTH},
    types::EthAddress,
    AppState,
};
use super::required_address;

// ============ Request/Response Types ============

/// 댓글 트리 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct CommentTreeQuery {
    /// 토픽 (sale 컨트랙트 주소)
    pub address: Option<String>,
}

/// 댓글 작성 요청
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub user_address: String,
    pub news_address: String,
    /// null, "", 숫자, 숫자 문자열 모두 허용
    #[serde(default, deserialize_with = "deserialize_parent_id")]
    pub parent_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParentRef {
    Id(i64),
    Text(String),
}

fn deserialize_parent_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<ParentRef>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ParentRef::Id(id)) => Ok(Some(id)),
        Some(ParentRef::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(ParentRef::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid parentId: {}", text))),
    }
}

// ============ Handlers ============

/// GET /api/comment-tree?address=0x...
///
/// # Response
///
/// ```json
/// {
///   "tree": [{ "id": 1, "content": "...", "balance": { "saleBalance": "10.0" }, "replies": [] }],
///   "isLaunched": false,
///   "topPositiveComment": null,
///   "topNegativeComment": null
/// }
/// ```
pub async fn get_comment_tree(
    State(state): State<AppState>,
    query: Result<Query<CommentTreeQuery>, QueryRejection>,
) -> Result<Json<CommentTree>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let topic = required_address(query.address.as_deref(), "address")?;

    let service = CommentTreeService::new(state.comments.clone(), state.chain.clone());
    let tree = service.build(&topic).await?;

    Ok(Json(tree))
}

/// POST /api/comments
///
/// 답글이면 부모 댓글이 같은 토픽에 존재해야 하고,
/// 깊이가 `MAX_REPLY_DEPTH`를 넘으면 안 됨
pub async fn create_comment(
    State(state): State<AppState>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::ValidationError("Comment content is empty".to_string()));
    }
    let user = EthAddress::parse(&req.user_address).map_err(ApiError::ValidationError)?;
    let topic = EthAddress::parse(&req.news_address).map_err(ApiError::ValidationError)?;

    if let Some(parent_id) = req.parent_id {
        let parent = state
            .comments
            .find_by_id(parent_id)
            .await
            .map_err(|e| ApiError::DatabaseError(format!("{:#}", e)))?;

        let parent = match parent {
            Some(parent) if parent.news_address == topic.as_str() => parent,
            Some(_) => {
                return Err(ApiError::ValidationError(
                    "Parent comment belongs to another topic".to_string(),
                ))
            }
            None => {
                return Err(ApiError::ValidationError(format!(
                    "Parent comment {} not found",
                    parent_id
                )))
            }
        };

        let depth = reply_depth(state.comments.as_ref(), &parent)
            .await
            .map_err(|e| ApiError::DatabaseError(format!("{:#}", e)))?;
        if depth > MAX_REPLY_DEPTH {
            return Err(ApiError::ValidationError(format!(
                "Replies can nest at most {} levels",
                MAX_REPLY_DEPTH
            )));
        }
    }

    let comment = state
        .comments
        .insert(NewComment {
            content: content.to_string(),
            user_address: user.as_str().to_string(),
            parent_id: req.parent_id,
            news_address: topic.as_str().to_string(),
        })
        .await
        .map_err(|e| ApiError::DatabaseError(format!("{:#}", e)))?;

    tracing::info!(id = comment.id, topic = %topic, "comment created");

    Ok((StatusCode::CREATED, Json(comment)))
}

/// `parent`에 다는 답글의 깊이 (root = 0)
///
/// 한도를 넘는 순간 조회를 멈춤. 조상이 없으면 거기서 끝
async fn reply_depth(comments: &dyn CommentRepository, parent: &Comment) -> anyhow::Result<usize> {
    let mut depth = 1;
    let mut next = parent.parent_id;
    while let Some(id) = next {
        depth += 1;
        if depth > MAX_REPLY_DEPTH {
            break;
        }
        next = comments.find_by_id(id).await?.and_then(|c| c.parent_id);
    }
    Ok(depth)
}

//! Comment Tree Service
//!
//! 토픽의 flat 댓글 목록을 작성자 지분으로 가중치를 매긴 트리로 변환.
//!
//! # Flow
//!
//! ```text
//! comments (created_at DESC) ──┐
//!                              ├─► assemble ─► rank_forest ─► CommentTree
//! balance per comment ─────────┘
//! ```
//!
//! # Weight
//!
//! ```text
//! weight(node) = positive + negative + sale
//!              + Σ 0.5 * weight(child)
//! ```
//!
//! 깊이 d 아래의 잔액은 0.5^d 만큼 반영됨.
//!
//! # Top comments
//!
//! positive / negative 잔액이 가장 큰 댓글 (트리 어디에 있든).
//! 같은 금액이면 먼저 방문한 댓글 (fetch 순서, 부모가 자식보다 먼저).
//!
//! # Depth
//!
//! 답글은 root 아래 최대 `MAX_REPLY_DEPTH` 단계. 트리 순회는 모두
//! 명시적 스택으로 처리 (재귀 없음).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use serde::Serialize;

use crate::db::{Comment, CommentRepository};
use crate::types::EthAddress;
use super::balance::{resolve_balance, Balance};
use super::blockchain::BalanceResolver;

/// 자식 weight 반영 비율
pub const REPLY_DECAY: f64 = 0.5;

/// root 아래 허용되는 최대 답글 깊이 (root = 0)
pub const MAX_REPLY_DEPTH: usize = 32;

/// 트리 노드: 댓글 + 작성자 잔액 + 답글
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub balance: Balance,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn id(&self) -> i64 {
        self.comment.id
    }

    /// 자신을 포함한 서브트리 노드 수
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

/// API 응답
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentTree {
    pub tree: Vec<CommentNode>,
    pub is_launched: bool,
    pub top_positive_comment: Option<CommentNode>,
    pub top_negative_comment: Option<CommentNode>,
}

impl CommentTree {
    pub fn empty() -> Self {
        Self {
            tree: vec![],
            is_launched: false,
            top_positive_comment: None,
            top_negative_comment: None,
        }
    }
}

/// 최대 잔액 후보
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub amount: f64,
    pub id: i64,
}

impl Candidate {
    /// `challenger`가 strictly 더 클 때만 교체
    fn pick(current: Option<Candidate>, challenger: Option<Candidate>) -> Option<Candidate> {
        match (current, challenger) {
            (Some(cur), Some(new)) if new.amount > cur.amount => Some(new),
            (None, new) => new,
            (cur, _) => cur,
        }
    }
}

/// 노드별 계산 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeMetadata {
    pub weight: f64,
    pub max_positive: Option<Candidate>,
    pub max_negative: Option<Candidate>,
}

/// 노드 id → 메타데이터
///
/// 이미 계산된 노드는 다시 계산하지 않음
#[derive(Debug, Default)]
pub struct MetadataIndex {
    entries: HashMap<i64, TreeMetadata>,
}

impl MetadataIndex {
    pub fn get(&self, id: i64) -> Option<&TreeMetadata> {
        self.entries.get(&id)
    }

    pub fn weight(&self, id: i64) -> f64 {
        self.entries.get(&id).map(|m| m.weight).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// post-order로 서브트리 메타데이터 계산
    ///
    /// 작업 스택: (노드, 자식 처리 완료 여부)
    pub fn compute(&mut self, root: &CommentNode) -> TreeMetadata {
        let mut stack = vec![(root, false)];
        while let Some((node, children_done)) = stack.pop() {
            if self.entries.contains_key(&node.id()) {
                continue;
            }
            if children_done {
                let meta = self.fold(node);
                self.entries.insert(node.id(), meta);
            } else {
                stack.push((node, true));
                stack.extend(node.replies.iter().map(|reply| (reply, false)));
            }
        }

        self.entries
            .get(&root.id())
            .copied()
            .unwrap_or_else(|| self.fold(root))
    }

    // 자식 메타데이터가 이미 index에 있다고 가정. 자식 순서대로 병합
    fn fold(&self, node: &CommentNode) -> TreeMetadata {
        let amounts = node.balance.amounts();
        let own = |amount: f64| (amount > 0.0).then_some(Candidate { amount, id: node.id() });

        let mut meta = TreeMetadata {
            weight: amounts.total(),
            max_positive: own(amounts.positive),
            max_negative: own(amounts.negative),
        };

        for child in node.replies.iter().filter_map(|reply| self.get(reply.id())) {
            meta.weight += child.weight * REPLY_DECAY;
            meta.max_positive = Candidate::pick(meta.max_positive, child.max_positive);
            meta.max_negative = Candidate::pick(meta.max_negative, child.max_negative);
        }

        meta
    }
}

/// 정렬된 결과 + 노드별 메타데이터
#[derive(Debug)]
pub struct RankedForest {
    pub roots: Vec<CommentNode>,
    pub metadata: MetadataIndex,
    pub top_positive: Option<CommentNode>,
    pub top_negative: Option<CommentNode>,
}

/// flat 댓글 목록을 트리로 조립
///
/// - 입력 순서 (created_at DESC)가 형제 순서로 유지됨
/// - 부모를 찾을 수 없는 댓글과 그 하위 댓글은 모두 제외
/// - `MAX_REPLY_DEPTH`보다 깊은 답글도 제외
pub fn assemble(entries: Vec<(Comment, Balance)>) -> Vec<CommentNode> {
    let total = entries.len();
    let known: HashSet<i64> = entries.iter().map(|(c, _)| c.id).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<(Comment, Balance)>> = HashMap::new();
    for (comment, balance) in entries {
        match comment.parent_id {
            None => roots.push((comment, balance)),
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push((comment, balance));
            }
            Some(parent) => {
                tracing::debug!(id = comment.id, parent, "reply references unknown parent");
            }
        }
    }

    let tree: Vec<CommentNode> = roots
        .into_iter()
        .map(|entry| attach(entry, &mut children))
        .collect();

    let attached: usize = tree.iter().map(CommentNode::subtree_size).sum();
    if attached < total {
        tracing::warn!(
            dropped = total - attached,
            total,
            "comments without a reachable root or nested too deep were left out of the tree"
        );
    }

    tree
}

/// 조립 중인 노드
struct Frame {
    comment: Comment,
    balance: Balance,
    depth: usize,
    pending: std::vec::IntoIter<(Comment, Balance)>,
    replies: Vec<CommentNode>,
}

impl Frame {
    fn open(
        (comment, balance): (Comment, Balance),
        depth: usize,
        children: &mut HashMap<i64, Vec<(Comment, Balance)>>,
    ) -> Self {
        // 한도를 넘는 답글은 children에 남아 dropped로 집계됨
        let pending = if depth < MAX_REPLY_DEPTH {
            children.remove(&comment.id).unwrap_or_default()
        } else {
            Vec::new()
        };

        Self {
            comment,
            balance,
            depth,
            pending: pending.into_iter(),
            replies: Vec::new(),
        }
    }

    fn close(self) -> CommentNode {
        CommentNode {
            comment: self.comment,
            balance: self.balance,
            replies: self.replies,
        }
    }
}

fn attach(
    root: (Comment, Balance),
    children: &mut HashMap<i64, Vec<(Comment, Balance)>>,
) -> CommentNode {
    let mut current = Frame::open(root, 0, children);
    let mut ancestors: Vec<Frame> = Vec::new();

    loop {
        if let Some(entry) = current.pending.next() {
            let child = Frame::open(entry, current.depth + 1, children);
            ancestors.push(std::mem::replace(&mut current, child));
            continue;
        }

        let node = current.close();
        match ancestors.pop() {
            Some(mut parent) => {
                parent.replies.push(node);
                current = parent;
            }
            None => return node,
        }
    }
}

/// 가중치 계산, top 댓글 선택, root 정렬
pub fn rank_forest(mut roots: Vec<CommentNode>) -> RankedForest {
    let mut metadata = MetadataIndex::default();

    let mut top_positive: Option<Candidate> = None;
    let mut top_negative: Option<Candidate> = None;
    for root in &roots {
        let meta = metadata.compute(root);
        top_positive = Candidate::pick(top_positive, meta.max_positive);
        top_negative = Candidate::pick(top_negative, meta.max_negative);
    }

    // stable sort: weight DESC, created_at DESC (없으면 epoch 0)
    roots.sort_by(|a, b| {
        metadata
            .weight(b.id())
            .total_cmp(&metadata.weight(a.id()))
            .then_with(|| created_millis(b).cmp(&created_millis(a)))
    });

    let top_positive = top_positive.and_then(|c| find_node(&roots, c.id)).cloned();
    let top_negative = top_negative.and_then(|c| find_node(&roots, c.id)).cloned();

    RankedForest {
        roots,
        metadata,
        top_positive,
        top_negative,
    }
}

fn created_millis(node: &CommentNode) -> i64 {
    node.comment
        .created_at
        .map(|t| t.timestamp_millis())
        .unwrap_or(0)
}

fn find_node(nodes: &[CommentNode], id: i64) -> Option<&CommentNode> {
    let mut stack: Vec<&CommentNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        if node.id() == id {
            return Some(node);
        }
        stack.extend(node.replies.iter());
    }
    None
}

/// Comment Tree Service
///
/// 요청마다 새로 계산함 (요청 간 공유 상태 없음)
pub struct CommentTreeService {
    comments: Arc<dyn CommentRepository>,
    chain: Arc<dyn BalanceResolver>,
}

impl CommentTreeService {
    pub fn new(comments: Arc<dyn CommentRepository>, chain: Arc<dyn BalanceResolver>) -> Self {
        Self { comments, chain }
    }

    /// 토픽의 댓글 트리 생성
    ///
    /// # Failure
    ///
    /// - 댓글 저장소 조회 실패: 에러 로그 후 빈 트리 반환
    /// - 체인 조회 실패: 에러 반환 (부분 결과 없음)
    pub async fn build(&self, topic: &EthAddress) -> Result<CommentTree> {
        let comments = match self.comments.find_by_topic(topic.as_str()).await {
            Ok(comments) => comments,
            Err(err) => {
                tracing::error!(topic = %topic, "comment store read failed, serving empty tree: {:#}", err);
                return Ok(CommentTree::empty());
            }
        };

        let launch = self
            .chain
            .launch_state(topic.address())
            .await
            .with_context(|| format!("resolving launch state of {}", topic))?;

        // 작성자 중복 제거 없이 댓글마다 조회
        let balances = try_join_all(comments.iter().map(|comment| {
            resolve_balance(self.chain.as_ref(), topic.address(), &launch, &comment.user_address)
        }))
        .await
        .with_context(|| format!("resolving comment author balances for {}", topic))?;

        let fetched = comments.len();
        let ranked = rank_forest(assemble(comments.into_iter().zip(balances).collect()));

        tracing::debug!(
            topic = %topic,
            fetched,
            roots = ranked.roots.len(),
            launched = launch.launched,
            "built comment tree"
        );

        Ok(CommentTree {
            tree: ranked.roots,
            is_launched: launch.launched,
            top_positive_comment: ranked.top_positive,
            top_negative_comment: ranked.top_negative,
        })
    }
}

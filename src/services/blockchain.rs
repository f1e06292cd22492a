//! Blockchain Service
//!
//! Reads topic state from the chain.
//!
//! # Contracts
//! - Sale contract (one per topic): `tokenBalances`, `positiveToken`, `negativeToken`
//! - Positive / negative position tokens: ERC-20 `balanceOf`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::prelude::*;

abigen!(
    NewsSale,
    r#"[
        function tokenBalances(address user) external view returns (uint256)
        function positiveToken() external view returns (address)
        function negativeToken() external view returns (address)
    ]"#
);

abigen!(
    PositionToken,
    r#"[
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

/// 블록체인 네트워크 설정
#[derive(Debug, Clone)]
pub struct BlockchainConfig {
    /// RPC URL
    pub rpc_url: String,
    /// RPC 요청 타임아웃
    pub request_timeout: Duration,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// 토픽의 런칭 상태
///
/// 런칭 전에는 포지션 토큰 주소가 zero address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchState {
    pub launched: bool,
    pub positive_token: Address,
    pub negative_token: Address,
}

impl LaunchState {
    pub fn from_tokens(positive_token: Address, negative_token: Address) -> Self {
        Self {
            launched: !positive_token.is_zero(),
            positive_token,
            negative_token,
        }
    }
}

/// 잔액 조회 인터페이스
///
/// 모든 금액은 base unit (18 decimals)
#[async_trait]
pub trait BalanceResolver: Send + Sync {
    async fn launch_state(&self, topic: Address) -> Result<LaunchState>;

    /// Sale 컨트랙트 escrow 잔액 (런칭 전)
    async fn escrow_balance(&self, topic: Address, user: Address) -> Result<U256>;

    /// 포지션 토큰 잔액 (런칭 후)
    async fn token_balance(&self, token: Address, user: Address) -> Result<U256>;

    async fn block_number(&self) -> Result<u64>;
}

/// ethers HTTP provider 기반 구현
pub struct BlockchainService {
    provider: Arc<Provider<Http>>,
}

impl BlockchainService {
    /// 새 BlockchainService 생성
    ///
    /// 연결은 첫 요청 시점에 이루어짐
    pub fn new(config: BlockchainConfig) -> Result<Self> {
        let url = reqwest::Url::parse(&config.rpc_url)
            .with_context(|| format!("Invalid RPC URL: {}", config.rpc_url))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("building RPC HTTP client")?;
        let provider = Provider::new(Http::new_with_client(url, client));

        Ok(Self {
            provider: Arc::new(provider),
        })
    }
}

#[async_trait]
impl BalanceResolver for BlockchainService {
    async fn launch_state(&self, topic: Address) -> Result<LaunchState> {
        let sale = NewsSale::new(topic, self.provider.clone());
        let positive = sale.positive_token();
        let negative = sale.negative_token();

        let (positive_token, negative_token) = tokio::try_join!(positive.call(), negative.call())
            .with_context(|| format!("reading position tokens of {:?}", topic))?;

        Ok(LaunchState::from_tokens(positive_token, negative_token))
    }

    async fn escrow_balance(&self, topic: Address, user: Address) -> Result<U256> {
        let sale = NewsSale::new(topic, self.provider.clone());
        let balance = sale
            .token_balances(user)
            .call()
            .await
            .with_context(|| format!("reading escrow balance of {:?} in {:?}", user, topic))?;
        Ok(balance)
    }

    async fn token_balance(&self, token: Address, user: Address) -> Result<U256> {
        let erc20 = PositionToken::new(token, self.provider.clone());
        let balance = erc20
            .balance_of(user)
            .call()
            .await
            .with_context(|| format!("reading balance of {:?} on token {:?}", user, token))?;
        Ok(balance)
    }

    async fn block_number(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_number()
            .await
            .context("reading block number")?;
        Ok(block.as_u64())
    }
}

//! Balance Service
//!
//! 댓글 작성자의 토픽 지분. 런칭 전에는 sale 컨트랙트 escrow 잔액,
//! 런칭 후에는 positive / negative 토큰 잔액.

use anyhow::{anyhow, Result};
use ethers::types::Address;
use serde::Serialize;

use crate::types::{format_display, EthAddress, TokenAmount};
use super::blockchain::{BalanceResolver, LaunchState};

/// 작성자 잔액 (십진 문자열)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Balance {
    PreLaunch {
        #[serde(rename = "saleBalance")]
        sale_balance: String,
    },
    Launched {
        #[serde(rename = "positiveBalance")]
        positive_balance: String,
        #[serde(rename = "negativeBalance")]
        negative_balance: String,
    },
}

/// 가중치 계산용 수치. 없는 필드는 0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BalanceAmounts {
    pub positive: f64,
    pub negative: f64,
    pub sale: f64,
}

impl BalanceAmounts {
    pub fn total(&self) -> f64 {
        self.positive + self.negative + self.sale
    }
}

impl Balance {
    pub fn amounts(&self) -> BalanceAmounts {
        match self {
            Balance::PreLaunch { sale_balance } => BalanceAmounts {
                sale: parse_amount(sale_balance),
                ..Default::default()
            },
            Balance::Launched {
                positive_balance,
                negative_balance,
            } => BalanceAmounts {
                positive: parse_amount(positive_balance),
                negative: parse_amount(negative_balance),
                ..Default::default()
            },
        }
    }

    /// 소수점 2자리 표시용
    pub fn to_display(&self) -> Balance {
        match self {
            Balance::PreLaunch { sale_balance } => Balance::PreLaunch {
                sale_balance: format_display(sale_balance),
            },
            Balance::Launched {
                positive_balance,
                negative_balance,
            } => Balance::Launched {
                positive_balance: format_display(positive_balance),
                negative_balance: format_display(negative_balance),
            },
        }
    }
}

// 음수, NaN은 0으로 취급 (weight >= 0 유지)
fn parse_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// 한 사용자의 잔액 조회
///
/// 런칭 후에는 positive / negative 토큰을 각각 한 번씩 조회
pub async fn resolve_balance(
    chain: &dyn BalanceResolver,
    topic: Address,
    launch: &LaunchState,
    user: &str,
) -> Result<Balance> {
    let user = EthAddress::parse(user).map_err(|e| anyhow!(e))?.address();

    if launch.launched {
        let (positive, negative) = futures::try_join!(
            chain.token_balance(launch.positive_token, user),
            chain.token_balance(launch.negative_token, user),
        )?;
        Ok(Balance::Launched {
            positive_balance: TokenAmount(positive).to_decimal_string(),
            negative_balance: TokenAmount(negative).to_decimal_string(),
        })
    } else {
        let sale = chain.escrow_balance(topic, user).await?;
        Ok(Balance::PreLaunch {
            sale_balance: TokenAmount(sale).to_decimal_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::blockchain::mock::MockChain;
    use std::sync::atomic::Ordering;

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const TOPIC: &str = "0x9999999999999999999999999999999999999999";

    fn topic() -> Address {
        TOPIC.parse().unwrap()
    }

    #[test]
    fn test_serialize_pre_launch() {
        let balance = Balance::PreLaunch {
            sale_balance: "1.5".to_string(),
        };
        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(json, serde_json::json!({ "saleBalance": "1.5" }));
    }

    #[test]
    fn test_serialize_launched() {
        let balance = Balance::Launched {
            positive_balance: "2.0".to_string(),
            negative_balance: "0.0".to_string(),
        };
        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "positiveBalance": "2.0", "negativeBalance": "0.0" })
        );
    }

    #[test]
    fn test_amounts() {
        let launched = Balance::Launched {
            positive_balance: "3.25".to_string(),
            negative_balance: "1.75".to_string(),
        };
        let amounts = launched.amounts();
        assert_eq!(amounts.positive, 3.25);
        assert_eq!(amounts.negative, 1.75);
        assert_eq!(amounts.sale, 0.0);
        assert_eq!(amounts.total(), 5.0);

        let garbage = Balance::PreLaunch {
            sale_balance: "-4".to_string(),
        };
        assert_eq!(garbage.amounts().total(), 0.0);
    }

    #[test]
    fn test_to_display() {
        let balance = Balance::Launched {
            positive_balance: "10.000000000000000000".to_string(),
            negative_balance: "0.126".to_string(),
        };
        assert_eq!(
            balance.to_display(),
            Balance::Launched {
                positive_balance: "10.00".to_string(),
                negative_balance: "0.13".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_pre_launch() {
        let chain = MockChain::pre_launch().with_sale(ALICE, 7);
        let launch = chain.launch_state(topic()).await.unwrap();

        let balance = resolve_balance(&chain, topic(), &launch, ALICE).await.unwrap();
        assert!(matches!(balance, Balance::PreLaunch { .. }));
        assert_eq!(balance.amounts().sale, 7.0);
        assert_eq!(chain.escrow_reads.load(Ordering::SeqCst), 1);
        assert_eq!(chain.token_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_launched() {
        let chain = MockChain::launched().with_tokens(ALICE, 4, 2);
        let launch = chain.launch_state(topic()).await.unwrap();

        let balance = resolve_balance(&chain, topic(), &launch, ALICE).await.unwrap();
        let amounts = balance.amounts();
        assert_eq!(amounts.positive, 4.0);
        assert_eq!(amounts.negative, 2.0);
        assert_eq!(chain.escrow_reads.load(Ordering::SeqCst), 0);
        assert_eq!(chain.token_reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolve_rejects_malformed_user() {
        let chain = MockChain::pre_launch();
        let launch = chain.launch_state(topic()).await.unwrap();

        let result = resolve_balance(&chain, topic(), &launch, "not-an-address").await;
        assert!(result.is_err());
    }
}

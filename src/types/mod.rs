//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의

use std::fmt;
use std::str::FromStr;

use ethers::types::{Address, U256};
use ethers::utils::format_units;

/// Sale 컨트랙트 및 포지션 토큰의 소수점 자릿수
pub const TOKEN_DECIMALS: u32 = 18;

/// 검증된 Ethereum 주소
///
/// 원본 문자열은 소문자로 정규화해서 보관 (DB 조회 키로 사용)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EthAddress {
    raw: String,
    address: Address,
}

impl EthAddress {
    pub fn parse(addr: &str) -> Result<Self, String> {
        let raw = addr.trim().to_lowercase();
        let is_hex = raw.len() == 42
            && raw.starts_with("0x")
            && raw[2..].chars().all(|c| c.is_ascii_hexdigit());
        if !is_hex {
            return Err(format!("Invalid Ethereum address: {}", addr));
        }

        let address = Address::from_str(&raw)
            .map_err(|_| format!("Invalid Ethereum address: {}", addr))?;
        Ok(Self { raw, address })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// 18 decimals 토큰 금액 (base unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount(pub U256);

impl TokenAmount {
    /// 십진 문자열로 변환 (예: 10^19 → "10.000000000000000000")
    pub fn to_decimal_string(&self) -> String {
        // format_units는 decimals가 77 이하일 때만 실패함
        format_units(self.0, TOKEN_DECIMALS).unwrap_or_else(|_| "0".to_string())
    }
}

/// 십진 문자열을 소수점 2자리로 포맷
pub fn format_display(decimal: &str) -> String {
    let value = decimal.parse::<f64>().unwrap_or(0.0);
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eth_address_valid() {
        let addr = EthAddress::parse("0xAbCdEf1234567890123456789012345678901234").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef1234567890123456789012345678901234");
        assert_eq!(addr.to_string(), addr.as_str());
    }

    #[test]
    fn test_eth_address_invalid() {
        assert!(EthAddress::parse("invalid").is_err());
        assert!(EthAddress::parse("0x1234").is_err());
        assert!(EthAddress::parse("0xzz34567890123456789012345678901234567890").is_err());
        assert!(EthAddress::parse("1234567890123456789012345678901234567890ab").is_err());
    }

    #[test]
    fn test_token_amount_decimal_string() {
        let ten = TokenAmount(U256::from(10u64) * U256::exp10(18));
        assert_eq!(ten.to_decimal_string().parse::<f64>().unwrap(), 10.0);

        let one_and_half = TokenAmount(U256::from(1_500_000_000_000_000_000u64));
        assert_eq!(format_display(&one_and_half.to_decimal_string()), "1.50");

        let zero = TokenAmount(U256::zero());
        assert_eq!(format_display(&zero.to_decimal_string()), "0.00");
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format_display("3.14159"), "3.14");
        assert_eq!(format_display("not a number"), "0.00");
    }
}

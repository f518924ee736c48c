//! Wei ↔ decimal conversion at a fixed 18 decimals.

use std::str::FromStr;

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Convert a wei amount into a normalized decimal ether amount.
///
/// `Decimal` holds 28 significant digits; amounts that would be rounded to
/// fit are rejected rather than silently truncated.
pub fn wei_to_decimal(wei: U256) -> BlockchainResult<Decimal> {
    let formatted = format_ether(wei);
    let amount = Decimal::from_str(&formatted)
        .map(|d| d.normalize())
        .map_err(|e| BlockchainError::Units(format!("{} wei is not representable: {}", wei, e)))?;

    if decimal_to_wei(amount)? != wei {
        return Err(BlockchainError::Units(format!(
            "{} wei exceeds decimal precision",
            wei
        )));
    }
    Ok(amount)
}

/// Convert a decimal ether amount into wei.
pub fn decimal_to_wei(amount: Decimal) -> BlockchainResult<U256> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(BlockchainError::Units(format!("negative amount {}", amount)));
    }
    parse_ether(&amount.to_string())
        .map_err(|e| BlockchainError::Units(format!("invalid amount {}: {}", amount, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wei_to_decimal() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(wei_to_decimal(one_and_half).unwrap(), Decimal::from_str("1.5").unwrap());
        assert_eq!(wei_to_decimal(U256::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(wei_to_decimal(U256::from(1)).unwrap().to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_wei_beyond_decimal_precision_rejected() {
        let exact = U256::from(10u64).pow(U256::from(29));
        assert_eq!(
            wei_to_decimal(exact).unwrap(),
            Decimal::from_str("100000000000").unwrap()
        );

        let err = wei_to_decimal(exact + U256::from(1)).unwrap_err();
        assert!(matches!(err, BlockchainError::Units(_)));
    }

    #[test]
    fn test_decimal_to_wei() {
        let amount = Decimal::from_str("0.0021").unwrap();
        assert_eq!(decimal_to_wei(amount).unwrap(), U256::from(2_100_000_000_000_000u64));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let amount = Decimal::from_str("-1").unwrap();
        assert!(decimal_to_wei(amount).is_err());
    }
}

//! Movement token pricing
//!
//! A linear price-impact approximation applied on each purchase:
//!
//! ```text
//! new_price = price * (1 + (amount / total_supply) * 0.1)
//! ```
//!
//! The buyer pays the pre-impact price for the whole amount.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Price impact factor
pub const PRICE_IMPACT: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Decimal places kept for stored prices
pub const PRICE_SCALE: u32 = 8;

/// Price after buying `amount` out of `total_supply`
pub fn price_after_purchase(price: Decimal, amount: i64, total_supply: i64) -> CoreResult<Decimal> {
    if total_supply <= 0 {
        return Err(CoreError::validation("total supply must be positive"));
    }
    if amount <= 0 {
        return Err(CoreError::InvalidAmount(format!(
            "purchase amount must be positive, got {}",
            amount
        )));
    }

    let ratio = Decimal::from(amount) / Decimal::from(total_supply);
    let new_price = ratio
        .checked_mul(PRICE_IMPACT)
        .and_then(|impact| Decimal::ONE.checked_add(impact))
        .and_then(|factor| price.checked_mul(factor))
        .ok_or_else(|| overflow("price"))?;
    Ok(new_price.round_dp(PRICE_SCALE))
}

fn overflow(what: &str) -> CoreError {
    CoreError::InvalidAmount(format!("{} overflows", what))
}

/// Cost of `amount` units at `price`, rounded up to whole power tokens
pub fn purchase_cost(price: Decimal, amount: i64) -> CoreResult<i64> {
    price
        .checked_mul(Decimal::from(amount))
        .and_then(|cost| cost.ceil().to_i64())
        .ok_or_else(|| overflow("purchase cost"))
}

/// Market capitalisation at `price`
pub fn market_cap(price: Decimal, total_supply: i64) -> CoreResult<Decimal> {
    price
        .checked_mul(Decimal::from(total_supply))
        .map(|cap| cap.round_dp(PRICE_SCALE))
        .ok_or_else(|| overflow("market cap"))
}

/// Everything a purchase changes, computed up front
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub amount: i64,
    pub unit_price: Decimal,
    pub cost_tokens: i64,
    pub new_price: Decimal,
    pub new_market_cap: Decimal,
}

impl PriceQuote {
    /// Quote a purchase against the current token state
    pub fn for_purchase(
        price: Decimal,
        amount: i64,
        total_supply: i64,
        circulating: i64,
    ) -> CoreResult<Self> {
        let remaining = total_supply - circulating;
        if amount > remaining {
            return Err(CoreError::SupplyExceeded {
                requested: amount,
                remaining,
            });
        }

        let new_price = price_after_purchase(price, amount, total_supply)?;
        Ok(Self {
            amount,
            unit_price: price,
            cost_tokens: purchase_cost(price, amount)?,
            new_price,
            new_market_cap: market_cap(new_price, total_supply)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_impact_constant() {
        assert_eq!(PRICE_IMPACT, dec!(0.1));
    }

    #[test]
    fn test_price_after_purchase() {
        // 10% of supply moves the price by 1%
        let price = price_after_purchase(dec!(2.00), 100, 1000).unwrap();
        assert_eq!(price, dec!(2.02));
    }

    #[test]
    fn test_whole_supply_moves_price_ten_percent() {
        let price = price_after_purchase(dec!(1), 1000, 1000).unwrap();
        assert_eq!(price, dec!(1.1));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(price_after_purchase(dec!(1), 0, 1000).is_err());
        assert!(price_after_purchase(dec!(1), 10, 0).is_err());
    }

    #[test]
    fn test_purchase_cost_rounds_up() {
        assert_eq!(purchase_cost(dec!(0.25), 3).unwrap(), 1);
        assert_eq!(purchase_cost(dec!(1.5), 4).unwrap(), 6);
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(matches!(
            price_after_purchase(Decimal::MAX, 10, 10),
            Err(CoreError::InvalidAmount(_))
        ));
        assert!(purchase_cost(dec!(100000000000000000000000000), 1000).is_err());
        assert!(purchase_cost(dec!(100000000000), i64::MAX).is_err());
        assert!(market_cap(dec!(100000000000), i64::MAX).is_err());
        assert_eq!(market_cap(dec!(2.5), 1000).unwrap(), dec!(2500));
    }

    #[test]
    fn test_quote_respects_supply() {
        let err = PriceQuote::for_purchase(dec!(1), 50, 100, 60).unwrap_err();
        assert_eq!(
            err,
            CoreError::SupplyExceeded {
                requested: 50,
                remaining: 40
            }
        );

        let quote = PriceQuote::for_purchase(dec!(1), 40, 100, 60).unwrap();
        assert_eq!(quote.cost_tokens, 40);
        assert_eq!(quote.new_price, dec!(1.04));
        assert_eq!(quote.new_market_cap, dec!(104));
    }
}

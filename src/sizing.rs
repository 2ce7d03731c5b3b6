//! Position sizing - risk-bounded size per decision
//!
//! Size is the quote-currency amount risked on one decision:
//! `min(balance * risk% / stopLoss%, 0.5 * balance)`. Pure, no I/O.

use rust_decimal::Decimal;
use thiserror::Error;

/// Position sizing errors
#[derive(Debug, Error, PartialEq)]
pub enum SizingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Hard cap: never commit more than half the balance to one position
const MAX_BALANCE_FRACTION: Decimal = Decimal::from_parts(5, 0, 0, false, 1); // 0.5

/// Compute a bounded position size.
///
/// `risk_pct` and `stop_loss_pct` are whole-number percents (1.5 means
/// 1.5%). Fails with `InvalidInput` on a negative balance or a
/// non-positive percentage.
pub fn position_size(
    balance: Decimal,
    risk_pct: Decimal,
    stop_loss_pct: Decimal,
) -> Result<Decimal, SizingError> {
    if balance < Decimal::ZERO {
        return Err(SizingError::InvalidInput(format!(
            "balance cannot be negative: {balance}"
        )));
    }
    if risk_pct <= Decimal::ZERO {
        return Err(SizingError::InvalidInput(format!(
            "risk percentage must be positive: {risk_pct}"
        )));
    }
    if stop_loss_pct <= Decimal::ZERO {
        return Err(SizingError::InvalidInput(format!(
            "stop-loss percentage must be positive: {stop_loss_pct}"
        )));
    }

    let raw = balance * risk_pct / stop_loss_pct;
    let cap = balance * MAX_BALANCE_FRACTION;
    Ok(raw.min(cap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_size_hits_the_half_balance_cap() {
        // 10000 * 1.5 / 3 = 5000, exactly the cap
        let size = position_size(
            Decimal::from(10000),
            Decimal::from_str("1.5").unwrap(),
            Decimal::from(3),
        )
        .unwrap();
        assert_eq!(size, Decimal::from(5000));
    }

    #[test]
    fn test_size_below_cap_uses_formula() {
        // 10000 * 1 / 10 = 1000, well under the 5000 cap
        let size =
            position_size(Decimal::from(10000), Decimal::ONE, Decimal::from(10)).unwrap();
        assert_eq!(size, Decimal::from(1000));
    }

    #[test]
    fn test_size_never_exceeds_half_balance() {
        // Wide risk relative to the stop would suggest 20000; capped at 5000
        let size =
            position_size(Decimal::from(10000), Decimal::from(4), Decimal::from(2)).unwrap();
        assert_eq!(size, Decimal::from(5000));
    }

    #[test]
    fn test_zero_balance_sizes_to_zero() {
        let size = position_size(
            Decimal::ZERO,
            Decimal::from_str("1.5").unwrap(),
            Decimal::from(3),
        )
        .unwrap();
        assert_eq!(size, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(position_size(
            Decimal::from(-1),
            Decimal::ONE,
            Decimal::from(3)
        )
        .is_err());
        assert!(position_size(Decimal::from(10000), Decimal::ZERO, Decimal::from(3)).is_err());
        assert!(position_size(
            Decimal::from(10000),
            Decimal::ONE,
            Decimal::from(-3)
        )
        .is_err());
    }
}

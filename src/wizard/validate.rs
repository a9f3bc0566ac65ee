//! Local, synchronous input checks. Nothing here touches the network.

use crate::errors::{BoostError, BoostResult};
use bitcoin::{Amount, Denomination};

/// Amount rules for one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountRules {
    /// Inclusive lower bound.
    pub minimum: Amount,
    /// Spendable balance, when known.
    pub available: Option<Amount>,
}

impl AmountRules {
    pub fn new(minimum: Amount) -> Self {
        Self { minimum, available: None }
    }

    /// Parse `input` as BTC and check it against the rules.
    pub fn validate(&self, input: &str) -> BoostResult<Amount> {
        let amount = parse_btc(input)?;
        if amount == Amount::ZERO {
            return Err(invalid("Amount must be greater than 0"));
        }
        if amount < self.minimum {
            return Err(invalid(format!("Minimum amount is {} BTC", btc_string(self.minimum))));
        }
        if let Some(available) = self.available {
            if amount > available {
                return Err(invalid("Insufficient ckBTC balance"));
            }
        }
        Ok(amount)
    }
}

/// Non-negative BTC decimal with at most 8 fractional digits, capped at the
/// 21M BTC supply.
pub fn parse_btc(input: &str) -> BoostResult<Amount> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("Please enter an amount"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("Amount must be greater than 0"));
    }
    let amount = Amount::from_str_in(trimmed, Denomination::Bitcoin)
        .map_err(|e| invalid(format!("Invalid amount: {e}")))?;
    if amount > Amount::MAX_MONEY {
        return Err(invalid("Amount exceeds the 21M BTC supply"));
    }
    Ok(amount)
}

pub fn validate_destination(input: &str) -> BoostResult<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("Please enter a destination address"));
    }
    Ok(trimmed)
}

/// `0.0001`, no trailing zeros.
pub fn btc_string(amount: Amount) -> String {
    let sats = amount.to_sat();
    let whole = sats / 100_000_000;
    let frac = sats % 100_000_000;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:08}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

fn invalid(message: impl Into<String>) -> BoostError {
    BoostError::Validation(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> AmountRules {
        AmountRules::new(Amount::from_sat(10_000))
    }

    #[test]
    fn zero_and_negative_are_rejected() {
        assert!(rules().validate("0").unwrap_err().is_validation());
        assert!(rules().validate("-1").unwrap_err().is_validation());
        assert!(rules().validate("").is_err());
        assert!(rules().validate("abc").is_err());
    }

    #[test]
    fn minimum_is_inclusive() {
        assert_eq!(rules().validate("0.0001").unwrap(), Amount::from_sat(10_000));
        assert_eq!(rules().validate("0.0005").unwrap(), Amount::from_sat(50_000));
        let err = rules().validate("0.00009999").unwrap_err();
        assert_eq!(err.to_string(), "Minimum amount is 0.0001 BTC");
    }

    #[test]
    fn satoshi_minimum_must_be_configured() {
        let sat_rules = AmountRules::new(Amount::from_sat(1));
        assert!(sat_rules.validate("0.00000001").is_ok());
        assert!(rules().validate("0.00000001").is_err());
        assert!(sat_rules.validate("0.000000001").is_err());
    }

    #[test]
    fn available_balance_caps_amount() {
        let capped = AmountRules { available: Some(Amount::from_sat(20_000)), ..rules() };
        assert!(capped.validate("0.0002").is_ok());
        assert_eq!(capped.validate("0.0003").unwrap_err().to_string(), "Insufficient ckBTC balance");
    }

    #[test]
    fn amounts_above_supply_are_rejected() {
        let err = rules().validate("100000000000").unwrap_err();
        assert_eq!(err.to_string(), "Amount exceeds the 21M BTC supply");
        assert_eq!(rules().validate("21000000").unwrap(), Amount::MAX_MONEY);
        assert!(parse_btc("21000000.00000001").is_err());
    }

    #[test]
    fn destination_must_not_be_blank() {
        assert!(validate_destination("   ").is_err());
        assert_eq!(validate_destination(" bc1qtest ").unwrap(), "bc1qtest");
    }

    #[test]
    fn btc_strings() {
        assert_eq!(btc_string(Amount::from_sat(10_000)), "0.0001");
        assert_eq!(btc_string(Amount::from_sat(1)), "0.00000001");
        assert_eq!(btc_string(Amount::from_sat(150_000_000)), "1.5");
        assert_eq!(btc_string(Amount::from_sat(200_000_000)), "2");
    }
}

//! Backend and ledger payloads.
//!
//! Amounts cross the wire as e8s (`u64` satoshis) and are lifted into
//! [`bitcoin::Amount`] here so nothing above the agent handles raw integers.

use crate::errors::{BoostError, BoostResult};
use crate::session::{Identity, Subaccount};
use bitcoin::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a successful `submitBoost`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub boost_id: u64,
    /// Bitcoin address the user funds to complete the boost.
    pub deposit_address: String,
    pub amount: Amount,
    pub destination: String,
}

#[derive(Debug, Deserialize)]
struct ReceiptWire {
    boost_id: u64,
    deposit_address: String,
    amount_e8s: u64,
    destination: String,
}

impl Receipt {
    pub(crate) fn from_value(value: Value) -> BoostResult<Self> {
        let wire: ReceiptWire = decode(value, "receipt")?;
        Ok(Self {
            boost_id: wire.boost_id,
            deposit_address: wire.deposit_address,
            amount: Amount::from_sat(wire.amount_e8s),
            destination: wire.destination,
        })
    }
}

/// ICRC-1 account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subaccount: Option<Subaccount>,
}

impl Account {
    pub fn new(owner: impl Into<String>) -> Self {
        Self { owner: owner.into(), subaccount: None }
    }

    /// `owner` or `owner.<64 hex subaccount>`. A blank owner is a validation error.
    pub fn parse(value: &str) -> BoostResult<Self> {
        let value = value.trim();
        let (owner, subaccount) = match value.split_once('.') {
            Some((owner, hex)) => (owner, Some(Subaccount::from_hex(hex)?)),
            None => (value, None),
        };
        if owner.is_empty() {
            return Err(BoostError::Validation("Please enter a recipient address".into()));
        }
        Ok(Self { owner: owner.to_string(), subaccount: subaccount.filter(|s| !s.is_default()) })
    }
}

impl From<&Identity> for Account {
    fn from(identity: &Identity) -> Self {
        Self { owner: identity.principal().to_string(), subaccount: identity.subaccount().copied() }
    }
}

/// Ledger tokens a wallet can hold and send. Both count in e8s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Icp,
    CkBtc,
}

impl Token {
    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Icp => "ICP",
            Token::CkBtc => "ckBTC",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "icp" => Some(Token::Icp),
            "ckbtc" => Some(Token::CkBtc),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booster's liquidity offer.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityPosition {
    pub id: String,
    pub amount: Amount,
    pub fee_percent: f64,
    pub created_at: DateTime<Utc>,
    pub earnings: Amount,
}

#[derive(Debug, Deserialize)]
struct PositionWire {
    id: String,
    amount_e8s: u64,
    fee_percent: f64,
    created_at_ms: i64,
    #[serde(default)]
    earnings_e8s: u64,
}

impl LiquidityPosition {
    pub(crate) fn from_value(value: Value) -> BoostResult<Self> {
        let wire: PositionWire = decode(value, "liquidity position")?;
        let created_at = DateTime::from_timestamp_millis(wire.created_at_ms)
            .ok_or_else(|| BoostError::Protocol(format!("bad timestamp: {}", wire.created_at_ms)))?;
        Ok(Self {
            id: wire.id,
            amount: Amount::from_sat(wire.amount_e8s),
            fee_percent: wire.fee_percent,
            created_at,
            earnings: Amount::from_sat(wire.earnings_e8s),
        })
    }

    pub(crate) fn list_from_value(value: Value) -> BoostResult<Vec<Self>> {
        match value {
            Value::Array(items) => items.into_iter().map(Self::from_value).collect(),
            other => Err(BoostError::Protocol(format!("expected position list, got {other}"))),
        }
    }
}

/// Booster fee bounds, in percent.
pub const MIN_FEE_PERCENT: f64 = 0.1;
pub const MAX_FEE_PERCENT: f64 = 2.0;

pub fn validate_fee_percent(fee_percent: f64) -> BoostResult<()> {
    if !fee_percent.is_finite() || !(MIN_FEE_PERCENT..=MAX_FEE_PERCENT).contains(&fee_percent) {
        return Err(BoostError::Validation(format!(
            "Fee must be between {MIN_FEE_PERCENT}% and {MAX_FEE_PERCENT}%"
        )));
    }
    Ok(())
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> BoostResult<T> {
    serde_json::from_value(value).map_err(|e| BoostError::Protocol(format!("{what}: {e}")))
}

//! Identity - the connected wallet's principal, normalized from provider data.

use crate::errors::{BoostError, BoostResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Raw user object pushed by the wallet-connection provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WalletUser {
    pub principal: String,
    pub subaccount: Option<Vec<u8>>,
}

impl WalletUser {
    pub fn new(principal: impl Into<String>) -> Self {
        Self { principal: principal.into(), subaccount: None }
    }

    pub fn with_subaccount(mut self, subaccount: Vec<u8>) -> Self {
        self.subaccount = Some(subaccount);
        self
    }
}

/// ICRC-1 sub-account discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subaccount([u8; 32]);

impl Subaccount {
    pub fn new(bytes: [u8; 32]) -> Self { Self(bytes) }

    pub fn from_slice(bytes: &[u8]) -> BoostResult<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| BoostError::Validation(format!("subaccount must be 32 bytes, got {}", bytes.len())))?;
        Ok(Self(bytes))
    }

    pub fn from_hex(value: &str) -> BoostResult<Self> {
        let bytes = hex::decode(value.trim())
            .map_err(|e| BoostError::Validation(format!("subaccount hex: {e}")))?;
        Self::from_slice(&bytes)
    }

    pub fn is_default(&self) -> bool { self.0.iter().all(|b| *b == 0) }
    pub fn as_bytes(&self) -> &[u8; 32] { &self.0 }
    pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl Serialize for Subaccount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Subaccount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Subaccount::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// Connected wallet. Immutable once built.
///
/// Deserialization goes through [`Identity::new`], so a decoded identity is
/// validated and normalized like one built from a [`WalletUser`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IdentityWire")]
pub struct Identity {
    principal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    subaccount: Option<Subaccount>,
}

#[derive(Deserialize)]
struct IdentityWire {
    principal: String,
    #[serde(default)]
    subaccount: Option<Subaccount>,
}

impl TryFrom<IdentityWire> for Identity {
    type Error = BoostError;

    fn try_from(wire: IdentityWire) -> BoostResult<Self> {
        Self::new(wire.principal, wire.subaccount)
    }
}

impl Identity {
    pub fn new(principal: impl Into<String>, subaccount: Option<Subaccount>) -> BoostResult<Self> {
        let principal = principal.into().trim().to_string();
        if principal.is_empty() {
            return Err(BoostError::Validation("principal is empty".into()));
        }
        // The all-zero sub-account is the default account.
        let subaccount = subaccount.filter(|s| !s.is_default());
        Ok(Self { principal, subaccount })
    }

    pub fn from_wallet_user(user: &WalletUser) -> BoostResult<Self> {
        let subaccount = user.subaccount.as_deref().map(Subaccount::from_slice).transpose()?;
        Self::new(user.principal.clone(), subaccount)
    }

    pub fn principal(&self) -> &str { &self.principal }
    pub fn subaccount(&self) -> Option<&Subaccount> { self.subaccount.as_ref() }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subaccount {
            Some(sub) => write!(f, "{}.{}", self.principal, sub.to_hex()),
            None => f.write_str(&self.principal),
        }
    }
}

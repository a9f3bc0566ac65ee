//! Client configuration - read once, consumed at actor construction.
//!
//! Changing any value means building a new [`ActorClient`](crate::agent::ActorClient).

use crate::agent::Token;
use crate::core::methods::{canisters, hosts};
use crate::errors::{BoostError, BoostResult};
use bitcoin::Amount;
use std::path::Path;
use std::time::Duration;

/// 0.0001 BTC, the whole-unit boost minimum.
pub const DEFAULT_MIN_AMOUNT: Amount = Amount::from_sat(10_000);
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_NETWORK: &str = "CKBOOST_NETWORK";
pub const ENV_HOST: &str = "CKBOOST_HOST";
pub const ENV_BACKEND_CANISTER: &str = "CANISTER_ID_CKBOOST_BACKEND";
pub const ENV_LEDGER_CANISTER: &str = "CKBOOST_LEDGER_CANISTER_ID";
pub const ENV_ICP_LEDGER_CANISTER: &str = "CKBOOST_ICP_LEDGER_CANISTER_ID";
pub const ENV_MIN_AMOUNT_SATS: &str = "CKBOOST_MIN_AMOUNT_SATS";
pub const ENV_RPC_TIMEOUT_SECS: &str = "CKBOOST_RPC_TIMEOUT_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Internet Computer mainnet.
    Ic,
    /// Local replica (dfx / pocket-ic).
    Local,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ic => "ic",
            Network::Local => "local",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ic" | "mainnet" | "production" => Some(Network::Ic),
            "local" | "dev" | "development" => Some(Network::Local),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Network::Ic)
    }

    pub fn default_host(&self) -> &'static str {
        match self {
            Network::Ic => hosts::MAINNET,
            Network::Local => hosts::LOCAL,
        }
    }
}

/// Replica the actors talk to.
///
/// `production == false` turns on root-key bootstrap and disables response
/// certification. There is no way to get that from a default: callers must
/// pick [`RemoteEndpoint::development`] by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    host: String,
    production: bool,
}

impl RemoteEndpoint {
    pub fn production(host: impl Into<String>) -> BoostResult<Self> {
        Ok(Self { host: normalize_host(host.into())?, production: true })
    }

    pub fn development(host: impl Into<String>) -> BoostResult<Self> {
        Ok(Self { host: normalize_host(host.into())?, production: false })
    }

    pub fn for_network(network: Network, host: Option<String>) -> BoostResult<Self> {
        let host = host.unwrap_or_else(|| network.default_host().to_string());
        if network.is_production() {
            Self::production(host)
        } else {
            Self::development(host)
        }
    }

    pub fn host(&self) -> &str { &self.host }
    pub fn is_production(&self) -> bool { self.production }

    /// Backend id used when none is configured. Production has none.
    pub fn default_backend_canister(&self) -> Option<&'static str> {
        if self.production { None } else { Some(canisters::LOCAL_BACKEND_FALLBACK) }
    }
}

fn normalize_host(host: String) -> BoostResult<String> {
    let trimmed = host.trim().trim_end_matches('/');
    let authority = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| BoostError::Config(format!("host must be an http(s) url: {host}")))?;
    if authority.is_empty() {
        return Err(BoostError::Config(format!("host has no authority: {host}")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: RemoteEndpoint,
    pub backend_canister: Option<String>,
    /// ckBTC ledger.
    pub ledger_canister: String,
    pub icp_ledger_canister: String,
    /// Smallest boost accepted by the wizard, inclusive.
    pub min_amount: Amount,
    pub rpc_timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self {
            endpoint,
            backend_canister: None,
            ledger_canister: canisters::CKBTC_LEDGER.to_string(),
            icp_ledger_canister: canisters::ICP_LEDGER.to_string(),
            min_amount: DEFAULT_MIN_AMOUNT,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    pub fn with_backend_canister(mut self, id: impl Into<String>) -> Self { self.backend_canister = Some(id.into()); self }
    pub fn with_ledger_canister(mut self, id: impl Into<String>) -> Self { self.ledger_canister = id.into(); self }
    pub fn with_icp_ledger_canister(mut self, id: impl Into<String>) -> Self { self.icp_ledger_canister = id.into(); self }
    pub fn with_min_amount(mut self, amount: Amount) -> Self { self.min_amount = amount; self }
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self { self.rpc_timeout = timeout; self }

    /// Configured backend id, else the endpoint's development fallback.
    pub fn backend_canister_id(&self) -> BoostResult<String> {
        if let Some(id) = self.backend_canister.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        match self.endpoint.default_backend_canister() {
            Some(fallback) => {
                tracing::warn!(canister = fallback, "backend canister not configured, using development fallback");
                Ok(fallback.to_string())
            }
            None => Err(BoostError::Config(format!(
                "{ENV_BACKEND_CANISTER} must be set for production endpoints"
            ))),
        }
    }

    pub fn ledger_for(&self, token: Token) -> &str {
        match token {
            Token::Icp => &self.icp_ledger_canister,
            Token::CkBtc => &self.ledger_canister,
        }
    }

    pub fn from_env() -> BoostResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. The network is never defaulted.
    pub fn from_vars<F>(lookup: F) -> BoostResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_network = lookup(ENV_NETWORK)
            .ok_or_else(|| BoostError::Config(format!("{ENV_NETWORK} is not set (expected 'ic' or 'local')")))?;
        let network = Network::from_str(&raw_network)
            .ok_or_else(|| BoostError::Config(format!("unknown network: {raw_network}")))?;
        let endpoint = RemoteEndpoint::for_network(network, lookup(ENV_HOST))?;

        let mut config = Self::new(endpoint);
        if let Some(id) = lookup(ENV_BACKEND_CANISTER) {
            config = config.with_backend_canister(id);
        }
        if let Some(id) = lookup(ENV_LEDGER_CANISTER) {
            config = config.with_ledger_canister(id);
        }
        if let Some(id) = lookup(ENV_ICP_LEDGER_CANISTER) {
            config = config.with_icp_ledger_canister(id);
        }
        if let Some(raw) = lookup(ENV_MIN_AMOUNT_SATS) {
            let sats: u64 = raw.trim().parse()
                .map_err(|e| BoostError::Config(format!("{ENV_MIN_AMOUNT_SATS}: {e}")))?;
            config = config.with_min_amount(Amount::from_sat(sats));
        }
        if let Some(raw) = lookup(ENV_RPC_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse()
                .map_err(|e| BoostError::Config(format!("{ENV_RPC_TIMEOUT_SECS}: {e}")))?;
            config = config.with_rpc_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Load `KEY=value` lines into the process env. Existing vars win.
///
/// Returns how many variables were set.
pub fn load_env_file(path: &Path) -> usize {
    let Ok(contents) = std::fs::read_to_string(path) else { return 0 };
    let mut loaded = 0;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && std::env::var(key).is_err() {
                std::env::set_var(key, value);
                loaded += 1;
            }
        }
    }
    loaded
}

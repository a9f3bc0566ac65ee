//! Actor clients - anonymous and authenticated views of the backend.
//!
//! Write methods live only on [`AuthenticatedActor`], so holding an
//! [`AnonymousActor`] makes `submit_boost` a compile error rather than a
//! runtime rejection.

use super::transport::{Envelope, Transport};
use super::types::{validate_fee_percent, Account, LiquidityPosition, Receipt, Token};
use crate::config::{ClientConfig, RemoteEndpoint};
use crate::core::methods::{backend, ledger};
use crate::errors::{BoostError, BoostResult};
use crate::session::Identity;
use bitcoin::Amount;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// How far responses from this endpoint can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustState {
    /// Production replica, certified against the built-in root key.
    Verified,
    /// Development replica; root key fetched from the replica itself.
    RootKeyFetched(Vec<u8>),
    /// Development replica whose root key could not be fetched.
    Unverified,
}

/// Transport plus the endpoint facts every call needs.
#[derive(Clone)]
struct Agent {
    transport: Arc<dyn Transport>,
    endpoint: RemoteEndpoint,
    trust: TrustState,
    timeout: Duration,
    sender: Option<Identity>,
}

impl Agent {
    async fn query(&self, canister: &str, method: &str, args: Value) -> BoostResult<Value> {
        let envelope = self.envelope(method, args);
        with_timeout(self.timeout, self.transport.query(canister, envelope)).await
    }

    async fn call(&self, canister: &str, method: &str, args: Value) -> BoostResult<Value> {
        let envelope = self.envelope(method, args);
        with_timeout(self.timeout, self.transport.call(canister, envelope)).await
    }

    fn envelope(&self, method: &str, args: Value) -> Envelope {
        Envelope { method: method.to_string(), args, sender: self.sender.clone() }
    }
}

async fn with_timeout<T, F>(limit: Duration, fut: F) -> BoostResult<T>
where
    F: std::future::Future<Output = BoostResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(BoostError::Timeout(limit)),
    }
}

/// Read-only operations, shared by both client kinds.
#[derive(Clone)]
pub struct ReadActor {
    agent: Agent,
    backend: String,
    ledger: String,
    icp_ledger: String,
}

impl ReadActor {
    pub fn backend_canister(&self) -> &str { &self.backend }
    pub fn ledger_canister(&self) -> &str { &self.ledger }
    pub fn icp_ledger_canister(&self) -> &str { &self.icp_ledger }

    pub fn ledger_for(&self, token: Token) -> &str {
        match token {
            Token::Icp => &self.icp_ledger,
            Token::CkBtc => &self.ledger,
        }
    }
    pub fn trust(&self) -> &TrustState { &self.agent.trust }
    pub fn endpoint(&self) -> &RemoteEndpoint { &self.agent.endpoint }

    pub async fn greet(&self, name: &str) -> BoostResult<String> {
        let value = self.agent.query(&self.backend, backend::GREET, json!({"name": name})).await?;
        expect_string(value, backend::GREET)
    }

    pub async fn get_deposit_address(&self) -> BoostResult<String> {
        let value = self.agent.query(&self.backend, backend::GET_DEPOSIT_ADDRESS, json!({})).await?;
        expect_string(value, backend::GET_DEPOSIT_ADDRESS)
    }

    /// ckBTC balance of `account` on the ledger.
    pub async fn balance_of(&self, account: &Account) -> BoostResult<Amount> {
        self.token_balance_of(Token::CkBtc, account).await
    }

    pub async fn token_balance_of(&self, token: Token, account: &Account) -> BoostResult<Amount> {
        let args = serde_json::to_value(account)
            .map_err(|e| BoostError::Protocol(format!("account: {e}")))?;
        let value = self.agent.query(self.ledger_for(token), ledger::BALANCE_OF, args).await?;
        Ok(Amount::from_sat(expect_nat(&value, "balance")?))
    }
}

fn expect_nat(value: &Value, what: &str) -> BoostResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| BoostError::Protocol(format!("{what} is not a nat64: {value}")))
}

fn expect_string(value: Value, method: &str) -> BoostResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(BoostError::Protocol(format!("{method} returned {other}"))),
    }
}

#[derive(Clone)]
pub struct AnonymousActor {
    reads: ReadActor,
}

impl AnonymousActor {
    pub fn reads(&self) -> &ReadActor { &self.reads }
}

#[derive(Clone)]
pub struct AuthenticatedActor {
    reads: ReadActor,
    identity: Identity,
}

impl AuthenticatedActor {
    pub fn reads(&self) -> &ReadActor { &self.reads }
    pub fn identity(&self) -> &Identity { &self.identity }

    pub async fn balance(&self) -> BoostResult<Amount> {
        self.reads.balance_of(&Account::from(&self.identity)).await
    }

    pub async fn token_balance(&self, token: Token) -> BoostResult<Amount> {
        self.reads.token_balance_of(token, &Account::from(&self.identity)).await
    }

    /// ICRC-1 transfer of `amount` to `recipient` (`owner` or `owner.<subaccount hex>`).
    ///
    /// Input is checked locally first: a zero amount, a blank recipient, or an
    /// amount above the current balance never reaches the ledger. Returns the
    /// ledger block index.
    pub async fn send(&self, token: Token, amount: Amount, recipient: &str) -> BoostResult<u64> {
        if amount == Amount::ZERO {
            return Err(BoostError::Validation("Please enter a valid amount".into()));
        }
        let to = Account::parse(recipient)?;
        let balance = self.token_balance(token).await?;
        if amount > balance {
            return Err(BoostError::Validation(format!("Insufficient {token} balance")));
        }

        let args = json!({"to": to, "amount": amount.to_sat()});
        let value = self.reads.agent.call(self.reads.ledger_for(token), ledger::TRANSFER, args).await?;
        let block = expect_nat(&value, "transfer block index")?;
        tracing::info!(token = token.as_str(), e8s = amount.to_sat(), to = %to.owner, block, "transfer sent");
        Ok(block)
    }

    pub async fn submit_boost(&self, amount: Amount, destination: &str) -> BoostResult<Receipt> {
        let args = json!({"amount_e8s": amount.to_sat(), "destination": destination});
        let value = self.reads.agent.call(&self.reads.backend, backend::SUBMIT_BOOST, args).await?;
        let receipt = Receipt::from_value(value)?;
        tracing::info!(boost_id = receipt.boost_id, sats = amount.to_sat(), "boost submitted");
        Ok(receipt)
    }

    pub async fn liquidity_positions(&self) -> BoostResult<Vec<LiquidityPosition>> {
        let value = self.reads.agent
            .query(&self.reads.backend, backend::GET_LIQUIDITY_POSITIONS, json!({}))
            .await?;
        LiquidityPosition::list_from_value(value)
    }

    pub async fn create_liquidity_position(&self, amount: Amount, fee_percent: f64) -> BoostResult<LiquidityPosition> {
        if amount == Amount::ZERO {
            return Err(BoostError::Validation("Please enter a valid amount".into()));
        }
        validate_fee_percent(fee_percent)?;
        let args = json!({"amount_e8s": amount.to_sat(), "fee_percent": fee_percent});
        let value = self.reads.agent
            .call(&self.reads.backend, backend::CREATE_LIQUIDITY_POSITION, args)
            .await?;
        LiquidityPosition::from_value(value)
    }

    pub async fn remove_liquidity_position(&self, id: &str) -> BoostResult<()> {
        self.reads.agent
            .call(&self.reads.backend, backend::REMOVE_LIQUIDITY_POSITION, json!({"id": id}))
            .await?;
        Ok(())
    }
}

/// An RPC client bound to one endpoint and at most one identity.
#[derive(Clone)]
pub enum ActorClient {
    Anonymous(AnonymousActor),
    Authenticated(AuthenticatedActor),
}

impl ActorClient {
    pub fn reads(&self) -> &ReadActor {
        match self {
            ActorClient::Anonymous(actor) => actor.reads(),
            ActorClient::Authenticated(actor) => actor.reads(),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            ActorClient::Anonymous(_) => None,
            ActorClient::Authenticated(actor) => Some(actor.identity()),
        }
    }

    pub fn as_authenticated(&self) -> Option<&AuthenticatedActor> {
        match self {
            ActorClient::Authenticated(actor) => Some(actor),
            ActorClient::Anonymous(_) => None,
        }
    }

    pub fn trust(&self) -> &TrustState { self.reads().trust() }
}

/// Build a client for `config.endpoint`.
///
/// Development endpoints fetch the replica's root key first; failure there is
/// logged and the client runs unverified. Production endpoints must answer the
/// status request or construction fails.
pub async fn create_client(
    config: &ClientConfig,
    transport: Arc<dyn Transport>,
    identity: Option<Identity>,
) -> BoostResult<ActorClient> {
    let endpoint = config.endpoint.clone();
    let backend = config.backend_canister_id()?;
    let trust = establish_trust(&endpoint, transport.as_ref(), config.rpc_timeout).await?;

    let agent = Agent {
        transport,
        endpoint,
        trust,
        timeout: config.rpc_timeout,
        sender: identity.clone(),
    };
    let reads = ReadActor {
        agent,
        backend,
        ledger: config.ledger_canister.clone(),
        icp_ledger: config.icp_ledger_canister.clone(),
    };

    Ok(match identity {
        None => ActorClient::Anonymous(AnonymousActor { reads }),
        Some(identity) => {
            tracing::debug!(principal = identity.principal(), "authenticated actor created");
            ActorClient::Authenticated(AuthenticatedActor { reads, identity })
        }
    })
}

async fn establish_trust(endpoint: &RemoteEndpoint, transport: &dyn Transport, limit: Duration) -> BoostResult<TrustState> {
    let status = with_timeout(limit, transport.status()).await;

    if endpoint.is_production() {
        return match status {
            Ok(_) => Ok(TrustState::Verified),
            Err(e) => {
                tracing::error!(host = endpoint.host(), error = %e, "production endpoint unreachable");
                Err(BoostError::Connection(format!("{}: {e}", endpoint.host())))
            }
        };
    }

    tracing::warn!(
        host = endpoint.host(),
        "NON-PRODUCTION endpoint: fetching root key from the replica, response certification is disabled"
    );
    match status {
        Ok(status) => match status.root_key {
            Some(key) => Ok(TrustState::RootKeyFetched(key)),
            None => {
                tracing::warn!(host = endpoint.host(), "replica status carried no root key, continuing unverified");
                Ok(TrustState::Unverified)
            }
        },
        Err(e) => {
            tracing::warn!(host = endpoint.host(), error = %e, "root key fetch failed, continuing unverified");
            Ok(TrustState::Unverified)
        }
    }
}

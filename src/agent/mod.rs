//! Agent - RPC access to the ckBoost backend and the ICP / ckBTC ledgers.
//!
//! # Architecture
//!
//! ```text
//! create_client(config, transport, identity)
//!     │
//!     ├── status check ──► production: must succeed (TrustState::Verified)
//!     │                    development: fetch root key, failures degrade
//!     │                                 to TrustState::Unverified
//!     │
//!     └── ActorClient
//!           ├── Anonymous(AnonymousActor)         reads only
//!           └── Authenticated(AuthenticatedActor) reads + writes
//!                         │
//!                         ▼
//!                 dyn Transport (HttpTransport on native)
//! ```
//!
//! # Operations
//!
//! | Method | Kind | Client |
//! |--------|------|--------|
//! | `greet` | query | any |
//! | `getDepositAddress` | query | any |
//! | `icrc1_balance_of` | query (ICP / ckBTC ledger) | any |
//! | `icrc1_transfer` | call (ICP / ckBTC ledger) | authenticated |
//! | `submitBoost` | call | authenticated |
//! | `getLiquidityPositions` | query | authenticated |
//! | `createLiquidityPosition` | call | authenticated |
//! | `removeLiquidityPosition` | call | authenticated |
//!
//! Every call is one request/response bounded by `ClientConfig::rpc_timeout`.
//! Nothing here retries.

mod client;
#[cfg(feature = "native")]
mod http;
pub mod transport;
mod types;

pub use client::{create_client, ActorClient, AnonymousActor, AuthenticatedActor, ReadActor, TrustState};
#[cfg(feature = "native")]
pub use http::HttpTransport;
pub use transport::{decode_reply, EndpointStatus, Envelope, Transport};
pub use types::{validate_fee_percent, Account, LiquidityPosition, Receipt, Token, MAX_FEE_PERCENT, MIN_FEE_PERCENT};

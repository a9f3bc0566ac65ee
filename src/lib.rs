//! ckBoost client core: wallet session, canister actors, query cache and the
//! boost wizard. Presentation lives elsewhere; this crate is what a UI mounts.
//!
//! # Architecture
//!
//! ```text
//! wallet provider ──events──► SessionStore ──► RouteGuard (mount / redirect)
//!                                  │
//!                                  ▼
//!                           SessionClients ──► ActorClient (per identity)
//!                                                 │            │
//!                              QueryClient (reads)◄┘            └► BoostWizard (submitBoost)
//!                                                 │
//!                                                 ▼
//!                                          dyn Transport ──► replica
//! ```
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`agent`] | Anonymous / authenticated actor clients, trust bootstrap, transport |
//! | [`session`] | Session state machine, route guard, per-identity clients |
//! | [`query`] | Keyed read cache, last-initiated-wins |
//! | [`wizard`] | amount → address → confirmation → success |
//! | [`config`] | Endpoint, canister ids, minimum amount, timeouts |
//!
//! # Features
//!
//! - `native` (default) - reqwest HTTP transport and the tracing subscriber
//!
//! # Usage
//!
//! ```ignore
//! use ckboost::{ClientConfig, HttpTransport, SessionClients, SessionStore, BoostWizard};
//!
//! let config = ClientConfig::from_env()?;
//! let transport = Arc::new(HttpTransport::new(config.endpoint.host()));
//! let clients = SessionClients::new(config.clone(), transport);
//!
//! let store = SessionStore::new();
//! store.apply(ProviderEvent::Connected(WalletUser::new(principal)));
//!
//! let client = clients.client_for(&store.current()).await?.expect("settled");
//! let actor = client.as_authenticated().expect("connected").clone();
//! let wizard = BoostWizard::new(Arc::new(actor), config.min_amount);
//! wizard.submit_amount("0.01")?;
//! wizard.submit_destination("bc1q...")?;
//! wizard.confirm().await?;
//! ```

pub mod agent;
pub mod config;
pub mod core;
pub mod errors;
pub mod query;
pub mod session;
pub mod wizard;

#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================
pub use agent::{
    create_client, Account, ActorClient, AnonymousActor, AuthenticatedActor, LiquidityPosition,
    ReadActor, Receipt, Token, Transport, TrustState,
};
pub use config::{ClientConfig, Network, RemoteEndpoint};
pub use errors::{BoostError, BoostResult};
pub use query::{QueryClient, QueryKey, QueryOptions, QueryState, QueryStatus};
pub use session::{
    GuardDecision, Identity, ProviderEvent, RouteGuard, Session, SessionClients, SessionStore,
    Subaccount, WalletUser,
};
pub use wizard::{BoostQuote, BoostSubmitter, BoostWizard, ConfirmOutcome, Step, WizardState};

#[cfg(feature = "native")]
pub use agent::HttpTransport;

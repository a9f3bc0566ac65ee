//! Session - wallet connection state and the views gated on it.
//!
//! ```text
//! wallet provider ──ProviderEvent──► mpsc ──► SessionStore::run
//!                                               │
//!                       ┌───────────────────────┼──────────────────────┐
//!                       ▼                       ▼                      ▼
//!                  on_change()            subscribe()          current()
//!                  callbacks             watch::Receiver        RouteGuard
//!                                                              SessionClients
//! ```
//!
//! The store never polls. A session settles exactly when the provider reports
//! `Connected` or `Disconnected`; `Connecting` leaves it untouched.

mod clients;
pub mod guard;
mod identity;
mod store;

pub use clients::SessionClients;
pub use guard::{GuardDecision, RouteGuard};
pub use identity::{Identity, Subaccount, WalletUser};
pub use store::{ProviderEvent, Session, SessionStore};

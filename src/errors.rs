//! Error taxonomy shared by the agent, session, query and wizard layers.

use std::time::Duration;
use thiserror::Error;

pub type BoostResult<T> = Result<T, BoostError>;

/// All client-side failures.
///
/// `Clone` so query entries can keep the last error next to stale data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoostError {
    /// Endpoint unreachable, or trust bootstrap failed on a production network.
    #[error("connection error: {0}")]
    Connection(String),

    /// Local form input rejected. Never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// The backend refused a write. Shown to the user verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("config error: {0}")]
    Config(String),

    /// Backend answered with something we cannot decode.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("cannot {event} from the {step} step")]
    InvalidTransition { step: &'static str, event: &'static str },
}

impl BoostError {
    /// Whether a user-triggered retry can succeed without changing input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

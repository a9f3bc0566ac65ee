//! SessionClients - one actor client per identity.
//!
//! A new identity always yields a freshly built client; an existing client is
//! never re-pointed at another principal.

use super::store::Session;
use crate::agent::{create_client, ActorClient, Transport};
use crate::config::ClientConfig;
use crate::errors::BoostResult;
use crate::session::Identity;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SessionClients {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    current: Mutex<Option<(Option<Identity>, Arc<ActorClient>)>>,
}

impl SessionClients {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport, current: Mutex::new(None) }
    }

    pub fn config(&self) -> &ClientConfig { &self.config }

    /// Client for `session`, or `None` while the session is still loading.
    pub async fn client_for(&self, session: &Session) -> BoostResult<Option<Arc<ActorClient>>> {
        if session.is_loading() {
            return Ok(None);
        }
        let identity = session.identity().cloned();

        let mut current = self.current.lock().await;
        if let Some((owner, client)) = current.as_ref() {
            if *owner == identity {
                return Ok(Some(client.clone()));
            }
        }

        let client = Arc::new(create_client(&self.config, self.transport.clone(), identity.clone()).await?);
        tracing::info!(
            principal = identity.as_ref().map(Identity::principal).unwrap_or("anonymous"),
            "actor client rebuilt for session"
        );
        *current = Some((identity, client.clone()));
        Ok(Some(client))
    }

    /// Drop the cached client, e.g. after a disconnect.
    pub async fn clear(&self) {
        *self.current.lock().await = None;
    }
}

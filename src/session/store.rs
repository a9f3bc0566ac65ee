//! SessionStore - wallet connection state fed by provider events.

use super::identity::{Identity, WalletUser};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};

/// Snapshot of the wallet session.
///
/// Only constructible through [`Session::loading`], [`Session::authenticated`]
/// and [`Session::anonymous`], so `is_authenticated()` can never disagree with
/// the identity and loading flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    loading: bool,
}

impl Session {
    pub fn loading() -> Self { Self { identity: None, loading: true } }
    pub fn authenticated(identity: Identity) -> Self { Self { identity: Some(identity), loading: false } }
    pub fn anonymous() -> Self { Self { identity: None, loading: false } }

    pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn is_authenticated(&self) -> bool { self.identity.is_some() && !self.loading }
}

impl Default for Session {
    fn default() -> Self { Self::loading() }
}

/// What the wallet-connection provider pushes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Connecting,
    Connected(WalletUser),
    Disconnected,
}

type ChangeFn = dyn Fn(&Session) + Send + Sync;

pub struct SessionStore {
    state: watch::Sender<Session>,
    listeners: Mutex<Vec<Arc<ChangeFn>>>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new() }
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self { state, listeners: Mutex::new(Vec::new()) }
    }

    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Register a callback fired after every change of the session triple.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }

    /// Async subscription; the receiver starts at the current session.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Apply one provider event. Returns whether the session changed.
    pub fn apply(&self, event: ProviderEvent) -> bool {
        let next = match event {
            ProviderEvent::Connecting => {
                // Still connecting: keep whatever we have, loading or settled.
                tracing::debug!("wallet provider connecting");
                return false;
            }
            ProviderEvent::Connected(user) => match Identity::from_wallet_user(&user) {
                Ok(identity) => Session::authenticated(identity),
                Err(e) => {
                    tracing::warn!(error = %e, "provider returned an unusable user, treating as disconnected");
                    Session::anonymous()
                }
            },
            ProviderEvent::Disconnected => Session::anonymous(),
        };
        self.replace(next)
    }

    /// Explicit user disconnect.
    pub fn disconnect(&self) -> bool {
        self.apply(ProviderEvent::Disconnected)
    }

    /// Drain provider events until the sender side is dropped.
    pub async fn run(&self, mut events: mpsc::Receiver<ProviderEvent>) {
        while let Some(event) = events.recv().await {
            self.apply(event);
        }
        tracing::debug!("wallet provider channel closed");
    }

    fn replace(&self, next: Session) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });
        if changed {
            tracing::info!(
                authenticated = next.is_authenticated(),
                principal = next.identity().map(Identity::principal).unwrap_or("-"),
                "session changed"
            );
            let listeners = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            for listener in listeners {
                listener(&next);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user() -> WalletUser {
        WalletUser::new("rdmx6-jaaaa-aaaaa-aaadq-cai")
    }

    fn invariant(session: &Session) -> bool {
        session.is_authenticated() == (session.identity().is_some() && !session.is_loading())
    }

    #[test]
    fn starts_loading() {
        let store = SessionStore::new();
        let session = store.current();
        assert!(session.is_loading());
        assert!(!session.is_authenticated());
        assert!(session.identity().is_none());
    }

    #[test]
    fn connecting_never_changes_state() {
        let store = SessionStore::new();
        assert!(!store.apply(ProviderEvent::Connecting));
        assert!(store.current().is_loading());

        store.apply(ProviderEvent::Connected(user()));
        assert!(!store.apply(ProviderEvent::Connecting));
        assert!(store.current().is_authenticated());
    }

    #[test]
    fn invariant_holds_across_transitions() {
        let store = SessionStore::new();
        let events = [
            ProviderEvent::Connecting,
            ProviderEvent::Connected(user()),
            ProviderEvent::Connecting,
            ProviderEvent::Disconnected,
            ProviderEvent::Connected(WalletUser::new("")),
            ProviderEvent::Connected(user()),
        ];
        assert!(invariant(&store.current()));
        for event in events {
            store.apply(event);
            assert!(invariant(&store.current()));
        }
    }

    #[test]
    fn listeners_fire_only_on_change() {
        let store = SessionStore::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        store.on_change(move |_| { counter.fetch_add(1, Ordering::SeqCst); });

        store.apply(ProviderEvent::Connected(user()));
        store.apply(ProviderEvent::Connected(user()));
        store.disconnect();
        store.disconnect();
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}

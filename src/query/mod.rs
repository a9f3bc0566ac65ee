//! Query - keyed async read cache with manual refetch.
//!
//! Each key holds one [`QueryState`]. Every execution takes a fresh generation
//! from a client-wide counter; a result is stored only if its generation is
//! still the key's latest when it arrives. The counter never resets, so a
//! request started before `invalidate` cannot match a later one. Older in-flight requests are not aborted, their results
//! are dropped on arrival.
//!
//! Failures never escape: `run` and `refetch` always return a state.

use crate::errors::{BoostError, BoostResult};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, BoostResult<T>> + Send + Sync>;

/// Parameter tuple identifying a cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] { &self.0 }

    /// Empty key or any blank component: a parameter is not known yet.
    pub fn is_placeholder(&self) -> bool {
        self.0.is_empty() || self.0.iter().any(|part| part.trim().is_empty())
    }
}

impl From<&str> for QueryKey {
    fn from(value: &str) -> Self { Self(vec![value.to_string()]) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never executed (disabled or placeholder key).
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<BoostError>,
}

impl<T> QueryState<T> {
    fn idle(key: QueryKey) -> Self {
        Self { key, status: QueryStatus::Idle, data: None, error: None }
    }

    pub fn is_loading(&self) -> bool { self.status == QueryStatus::Loading }
    pub fn is_success(&self) -> bool { self.status == QueryStatus::Success }
    pub fn is_error(&self) -> bool { self.status == QueryStatus::Error }
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub enabled: bool,
    /// Upper bound on one execution; expiry is recorded as an error.
    pub timeout: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self { Self { enabled: true, timeout: None } }
}

impl QueryOptions {
    pub fn enabled(enabled: bool) -> Self { Self { enabled, ..Default::default() } }
    pub fn with_timeout(mut self, timeout: Duration) -> Self { self.timeout = Some(timeout); self }
}

struct Entry<T> {
    state: QueryState<T>,
    generation: u64,
    fetcher: Option<Fetcher<T>>,
    options: QueryOptions,
}

pub struct QueryClient<T> {
    entries: Mutex<HashMap<QueryKey, Entry<T>>>,
    next_generation: AtomicU64,
}

impl<T> Default for QueryClient<T> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()), next_generation: AtomicU64::new(1) }
    }
}

impl<T> QueryClient<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self { Self::default() }

    /// Register `fetcher` under `key` and execute it unless disabled.
    pub async fn run<F, Fut>(&self, key: QueryKey, fetcher: F, options: QueryOptions) -> QueryState<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BoostResult<T>> + Send + 'static,
    {
        let fetcher: Fetcher<T> = Arc::new(move || -> BoxFuture<'static, BoostResult<T>> { Box::pin(fetcher()) });

        if !options.enabled || key.is_placeholder() {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(key));
            entry.fetcher = Some(fetcher);
            entry.options = options;
            return entry.state.clone();
        }
        self.execute(key, fetcher, options).await
    }

    /// Re-execute the last fetcher registered for `key`.
    pub async fn refetch(&self, key: &QueryKey) -> QueryState<T> {
        let (fetcher, options) = {
            let entries = self.entries();
            let Some(entry) = entries.get(key) else {
                return QueryState::idle(key.clone());
            };
            match (&entry.fetcher, entry.options.enabled && !key.is_placeholder()) {
                (Some(fetcher), true) => (fetcher.clone(), entry.options.clone()),
                _ => return entry.state.clone(),
            }
        };
        self.execute(key.clone(), fetcher, options).await
    }

    pub fn state(&self, key: &QueryKey) -> Option<QueryState<T>> {
        self.entries().get(key).map(|entry| entry.state.clone())
    }

    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.entries().remove(key).is_some()
    }

    async fn execute(&self, key: QueryKey, fetcher: Fetcher<T>, options: QueryOptions) -> QueryState<T> {
        let generation = {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(key.clone()));
            entry.generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
            entry.fetcher = Some(fetcher.clone());
            entry.options = options.clone();
            entry.state.status = QueryStatus::Loading;
            entry.generation
        };

        let result = match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, fetcher()).await {
                Ok(result) => result,
                Err(_) => Err(BoostError::Timeout(limit)),
            },
            None => fetcher().await,
        };

        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(&key) else {
            // Invalidated while in flight: report, do not store.
            return settled(QueryState::idle(key), result);
        };
        if entry.generation != generation {
            tracing::debug!(key = ?key.parts(), generation, latest = entry.generation, "discarding superseded query result");
            return entry.state.clone();
        }
        if let Err(e) = &result {
            tracing::warn!(key = ?key.parts(), error = %e, "query failed");
        }
        entry.state = settled(entry.state.clone(), result);
        entry.state.clone()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Entry<T> {
    fn new(key: QueryKey) -> Self {
        Self { state: QueryState::idle(key), generation: 0, fetcher: None, options: QueryOptions::default() }
    }
}

/// Fold one result into a state. Errors keep previous data.
fn settled<T>(mut state: QueryState<T>, result: BoostResult<T>) -> QueryState<T> {
    match result {
        Ok(data) => {
            state.status = QueryStatus::Success;
            state.data = Some(data);
            state.error = None;
        }
        Err(e) => {
            state.status = QueryStatus::Error;
            state.error = Some(e);
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_keys() {
        assert!(QueryKey::new(Vec::<String>::new()).is_placeholder());
        assert!(QueryKey::new(["balance", ""]).is_placeholder());
        assert!(QueryKey::new(["balance", "  "]).is_placeholder());
        assert!(!QueryKey::new(["balance", "2vxsx-fae"]).is_placeholder());
        assert_eq!(QueryKey::from("depositAddress").parts(), ["depositAddress".to_string()]);
    }

    #[test]
    fn errors_keep_stale_data() {
        let state = QueryState { key: "k".into(), status: QueryStatus::Success, data: Some(1), error: None };
        let state = settled(state, Err(BoostError::Connection("down".into())));
        assert_eq!(state.status, QueryStatus::Error);
        assert_eq!(state.data, Some(1));

        let state = settled(state, Ok(2));
        assert_eq!(state.data, Some(2));
        assert!(state.error.is_none());
    }
}

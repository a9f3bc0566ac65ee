//! In-memory transport shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ckboost::agent::{EndpointStatus, Envelope, Transport};
use ckboost::config::{ClientConfig, RemoteEndpoint};
use ckboost::{BoostError, BoostResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BACKEND: &str = "uxrrr-q7777-77774-qaaaq-cai";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Query,
    Call,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub kind: CallKind,
    pub canister: String,
    pub envelope: Envelope,
}

/// Scripted replica: fixed replies per method, every request recorded.
pub struct MemoryTransport {
    status: Mutex<BoostResult<EndpointStatus>>,
    replies: Mutex<HashMap<String, BoostResult<Value>>>,
    calls: Mutex<Vec<Recorded>>,
    delay: Option<Duration>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(Ok(EndpointStatus { root_key: Some(vec![0xab; 4]) })),
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_status(self, status: BoostResult<EndpointStatus>) -> Self {
        *self.status.lock().unwrap() = status;
        self
    }

    pub fn unreachable(self) -> Self {
        self.with_status(Err(BoostError::Connection("connection refused".into())))
    }

    pub fn reply(self, method: &str, reply: BoostResult<Value>) -> Self {
        self.replies.lock().unwrap().insert(method.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Recorded> {
        self.calls().into_iter().filter(|c| c.envelope.method == method).collect()
    }

    async fn respond(&self, kind: CallKind, canister: &str, envelope: Envelope) -> BoostResult<Value> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let method = envelope.method.clone();
        self.calls.lock().unwrap().push(Recorded { kind, canister: canister.to_string(), envelope });
        self.replies
            .lock()
            .unwrap()
            .get(&method)
            .cloned()
            .unwrap_or_else(|| Err(BoostError::Protocol(format!("no reply scripted for {method}"))))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn status(&self) -> BoostResult<EndpointStatus> {
        self.status.lock().unwrap().clone()
    }

    async fn query(&self, canister: &str, envelope: Envelope) -> BoostResult<Value> {
        self.respond(CallKind::Query, canister, envelope).await
    }

    async fn call(&self, canister: &str, envelope: Envelope) -> BoostResult<Value> {
        self.respond(CallKind::Call, canister, envelope).await
    }
}

pub fn local_config() -> ClientConfig {
    let endpoint = RemoteEndpoint::development("http://127.0.0.1:4943").unwrap();
    ClientConfig::new(endpoint).with_backend_canister(BACKEND)
}

pub fn mainnet_config() -> ClientConfig {
    let endpoint = RemoteEndpoint::production("https://icp0.io").unwrap();
    ClientConfig::new(endpoint).with_backend_canister(BACKEND)
}

pub fn shared(transport: MemoryTransport) -> Arc<MemoryTransport> {
    Arc::new(transport)
}

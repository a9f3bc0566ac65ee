//! HTTP transport - JSON envelopes over reqwest.

use super::transport::{decode_reply, parse_status, EndpointStatus, Envelope, Transport};
use crate::core::methods::api;
use crate::errors::{BoostError, BoostResult};
use async_trait::async_trait;
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    host: String,
}

impl HttpTransport {
    pub fn new(host: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn canister_url(&self, canister: &str, kind: &str) -> String {
        format!("{}{}/{}/{}", self.host, api::CANISTER_PREFIX, canister, kind)
    }

    async fn post(&self, url: String, envelope: Envelope) -> BoostResult<Value> {
        tracing::debug!(%url, method = %envelope.method, "rpc");
        let response = self
            .client
            .post(&url)
            .json(&envelope)
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| BoostError::Protocol(format!("invalid JSON from {url}: {e}")))?;
        if !status.is_success() && body.get("err").is_none() {
            return Err(BoostError::Protocol(format!("replica returned {status}")));
        }
        decode_reply(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn status(&self) -> BoostResult<EndpointStatus> {
        let url = format!("{}{}", self.host, api::STATUS);
        let response = self.client.get(&url).send().await.map_err(connection_error)?;
        if !response.status().is_success() {
            return Err(BoostError::Connection(format!("{url} returned {}", response.status())));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| BoostError::Protocol(format!("status body: {e}")))?;
        parse_status(&body)
    }

    async fn query(&self, canister: &str, envelope: Envelope) -> BoostResult<Value> {
        self.post(self.canister_url(canister, api::QUERY), envelope).await
    }

    async fn call(&self, canister: &str, envelope: Envelope) -> BoostResult<Value> {
        self.post(self.canister_url(canister, api::CALL), envelope).await
    }
}

fn connection_error(err: reqwest::Error) -> BoostError {
    BoostError::Connection(err.to_string())
}

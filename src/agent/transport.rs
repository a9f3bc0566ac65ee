//! Transport seam between actors and the replica.

use crate::errors::{BoostError, BoostResult};
use crate::session::Identity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub method: String,
    pub args: Value,
    /// Absent for anonymous calls.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sender: Option<Identity>,
}

/// Replica status as far as the agent cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointStatus {
    pub root_key: Option<Vec<u8>>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Replica status. Carries the root key on development replicas.
    async fn status(&self) -> BoostResult<EndpointStatus>;

    /// Read-only call.
    async fn query(&self, canister: &str, envelope: Envelope) -> BoostResult<Value>;

    /// State-changing call.
    async fn call(&self, canister: &str, envelope: Envelope) -> BoostResult<Value>;
}

/// Unwrap a `{"ok": ..}` / `{"err": {"kind", "message"}}` reply.
pub fn decode_reply(reply: Value) -> BoostResult<Value> {
    let Value::Object(mut map) = reply else {
        return Err(BoostError::Protocol(format!("reply is not an object: {reply}")));
    };
    if let Some(ok) = map.remove("ok") {
        return Ok(ok);
    }
    let err = map
        .remove("err")
        .ok_or_else(|| BoostError::Protocol("reply has neither 'ok' nor 'err'".into()))?;
    let kind = err.get("kind").and_then(Value::as_str).unwrap_or("unknown");
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("no message")
        .to_string();
    Err(match kind {
        "rejected" => BoostError::Rejected(message),
        "invalid" => BoostError::Validation(message),
        _ => BoostError::Protocol(format!("{kind}: {message}")),
    })
}

/// Parse the `root_key` field of a status body.
pub fn parse_status(body: &Value) -> BoostResult<EndpointStatus> {
    let root_key = match body.get("root_key").and_then(Value::as_str) {
        Some(hex_key) => Some(
            hex::decode(hex_key).map_err(|e| BoostError::Protocol(format!("root_key: {e}")))?,
        ),
        None => None,
    };
    Ok(EndpointStatus { root_key })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_reply_unwraps() {
        assert_eq!(decode_reply(json!({"ok": "hello"})).unwrap(), json!("hello"));
    }

    #[test]
    fn rejected_reply_maps_to_rejected() {
        let err = decode_reply(json!({"err": {"kind": "rejected", "message": "insufficient funds"}})).unwrap_err();
        assert_eq!(err, BoostError::Rejected("insufficient funds".into()));
    }

    #[test]
    fn garbage_reply_is_protocol_error() {
        assert!(matches!(decode_reply(json!([1, 2])), Err(BoostError::Protocol(_))));
        assert!(matches!(decode_reply(json!({"other": 1})), Err(BoostError::Protocol(_))));
    }

    #[test]
    fn status_root_key() {
        let status = parse_status(&json!({"root_key": "00ff"})).unwrap();
        assert_eq!(status.root_key, Some(vec![0x00, 0xff]));
        assert_eq!(parse_status(&json!({})).unwrap().root_key, None);
        assert!(parse_status(&json!({"root_key": "zz"})).is_err());
    }
}

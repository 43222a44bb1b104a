//! Outbound messages: the only unit that ever crosses back to the host

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-name callbacks delivered to the registered receiver object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callback {
    Connected,
    Disconnected,
    Signed,
    ConnectError,
    DisconnectError,
    SignError,
}

impl Callback {
    const ALL: [Callback; 6] = [
        Callback::Connected,
        Callback::Disconnected,
        Callback::Signed,
        Callback::ConnectError,
        Callback::DisconnectError,
        Callback::SignError,
    ];

    /// Method name invoked on the host object
    pub const fn method_name(self) -> &'static str {
        match self {
            Callback::Connected => "OnConnected",
            Callback::Disconnected => "OnDisconnected",
            Callback::Signed => "OnSigned",
            Callback::ConnectError => "OnConnectError",
            Callback::DisconnectError => "OnDisconnectError",
            Callback::SignError => "OnSignError",
        }
    }

    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.method_name() == name)
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// A single `(object, method, payload)` delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct OutboundMessage {
    pub object: String,
    pub method: String,
    pub payload: String,
}

impl OutboundMessage {
    pub fn new(
        object: impl Into<String>,
        method: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            object: object.into(),
            method: method.into(),
            payload: payload.into(),
        }
    }
}

/// Caller-chosen destination for a sign result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub object: String,
    pub method: String,
    /// Correlation token echoed back in the result payload
    pub request_id: Option<String>,
}

impl ReplyTarget {
    pub fn new(object: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            method: method.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// JSON payload delivered to a [`ReplyTarget`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl SignResult {
    pub fn signed(signature: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            signature: Some(signature.into()),
            error: None,
            request_id,
        }
    }

    pub fn failed(error: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            signature: None,
            error: Some(error.into()),
            request_id,
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

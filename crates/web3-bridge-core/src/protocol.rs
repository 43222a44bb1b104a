//! Inbound command protocol
//!
//! Commands are serialized as JSON with internally-tagged enums.
//! Format: {"Type": "CommandType", ...fields}

use serde::{Deserialize, Serialize};

/// Commands sent from the host to the browser-side bridge
///
/// Note: `rename_all` on enums only affects variant names, not field names inside variants.
/// Each field is renamed explicitly for PascalCase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum BridgeCommand {
    /// Initialize the wallet library
    Init {
        #[serde(rename = "Options", default = "empty_object")]
        options: serde_json::Value,
    },

    /// Apply CSS theme variables
    ApplyTheme {
        #[serde(rename = "Theme")]
        theme: serde_json::Value,
    },

    /// Connect a wallet
    Connect,

    /// Disconnect all wallets
    DisconnectAll,

    /// Sign a message, replying to a caller-chosen target
    SignMessage {
        #[serde(rename = "Message")]
        message: String,
        #[serde(rename = "Receiver")]
        receiver: String,
        #[serde(rename = "Method")]
        method: String,
    },

    /// Set the receiver object name
    SetReceiver {
        #[serde(rename = "Name")]
        name: String,
    },

    /// Deliver an arbitrary payload
    SendToReceiver {
        #[serde(rename = "Object")]
        object: String,
        #[serde(rename = "Method")]
        method: String,
        #[serde(rename = "Payload", default)]
        payload: String,
    },
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl BridgeCommand {
    /// Parse a single command line
    pub fn parse(line: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_commands() {
        assert_eq!(BridgeCommand::parse(r#"{"Type":"Connect"}"#).unwrap(), BridgeCommand::Connect);
        assert_eq!(
            BridgeCommand::parse(r#"{"Type":"DisconnectAll"}"#).unwrap(),
            BridgeCommand::DisconnectAll
        );
    }

    #[test]
    fn test_init_defaults_to_empty_options() {
        match BridgeCommand::parse(r#"{"Type":"Init"}"#).unwrap() {
            BridgeCommand::Init { options } => assert!(options.as_object().unwrap().is_empty()),
            other => panic!("Wrong command: {:?}", other),
        }
    }

    #[test]
    fn test_sign_message_fields() {
        let json = r#"{"Type":"SignMessage","Message":"hi","Receiver":"Menu","Method":"OnSignMessageResult"}"#;
        match BridgeCommand::parse(json).unwrap() {
            BridgeCommand::SignMessage { message, receiver, method } => {
                assert_eq!(message, "hi");
                assert_eq!(receiver, "Menu");
                assert_eq!(method, "OnSignMessageResult");
            }
            other => panic!("Wrong command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_fails() {
        assert!(BridgeCommand::parse(r#"{"Type":"Explode"}"#).is_err());
    }
}

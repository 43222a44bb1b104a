//! Init options consumed once by the browser-side bridge

use crate::receiver::MessageReceiver;
use crate::theme::ThemeDescriptor;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Host object that receives fixed-name callbacks unless init overrides it
pub const DEFAULT_RECEIVER_NAME: &str = "Web3Bridge";

/// Chain entry handed to the wallet-connection library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    /// Hex chain id, e.g. `0x2105`
    pub id: String,
    /// Native token symbol
    pub token: String,
    /// Display label
    pub label: String,
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Library-specific fields (`blockExplorerUrl`, `namespace`, ...)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Chain {
    /// Base mainnet, the single built-in default chain
    pub fn base() -> Self {
        Self {
            id: "0x2105".into(),
            token: "ETH".into(),
            label: "Base".into(),
            rpc_url: "https://mainnet.base.org".into(),
            extra: HashMap::new(),
        }
    }
}

/// Wallet suggested to users without an injected provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendedWallet {
    pub name: String,
    pub url: String,
}

/// App metadata shown by the wallet-selection UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_injected_wallets: Vec<RecommendedWallet>,
    /// Additional library-specific fields, passed through untouched
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "Unity Web3 Onboard".into(),
            description: Some("Web3-Onboard bridge for Unity WebGL".into()),
            icon: Some("<svg></svg>".into()),
            recommended_injected_wallets: vec![RecommendedWallet {
                name: "MetaMask".into(),
                url: "https://metamask.io".into(),
            }],
            extra: HashMap::new(),
        }
    }
}

/// Receiver wiring supplied at init (the `unity` key on the wire)
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverWiring {
    /// Explicit receiver; cannot travel through JSON
    #[serde(skip)]
    pub instance: Option<Rc<dyn MessageReceiver>>,
    /// Host object name for fixed-name callbacks
    #[serde(default)]
    pub game_object_name: Option<String>,
}

impl fmt::Debug for ReceiverWiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverWiring")
            .field("instance", &self.instance.as_ref().map(|_| "<receiver>"))
            .field("game_object_name", &self.game_object_name)
            .finish()
    }
}

/// Transient configuration record consumed once by `init`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOptions {
    /// Enables the WalletConnect module in the default wallet list
    #[serde(default, alias = "projectId")]
    pub wallet_connect_project_id: Option<String>,
    /// Empty means the built-in default chain
    #[serde(default, deserialize_with = "array_or_empty")]
    pub chains: Vec<Chain>,
    #[serde(default)]
    pub app_metadata: Option<AppMetadata>,
    /// Pre-built wallet modules; empty means the default list
    #[serde(default, deserialize_with = "array_or_empty")]
    pub wallets: Vec<serde_json::Value>,
    #[serde(default)]
    pub unity: Option<ReceiverWiring>,
    /// Absent means the built-in palette
    #[serde(default)]
    pub theme: Option<ThemeDescriptor>,
}

/// `null` or any non-array value reads as an empty list
fn array_or_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match serde_json::Value::deserialize(deserializer)? {
        items @ serde_json::Value::Array(_) => {
            serde_json::from_value(items).map_err(de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

impl InitOptions {
    /// Parse options from the JSON string the host forwards
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Project id, ignoring empty strings
    pub fn project_id(&self) -> Option<&str> {
        self.wallet_connect_project_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    /// Receiver name override, ignoring empty strings
    pub fn receiver_name(&self) -> Option<&str> {
        self.unity
            .as_ref()
            .and_then(|u| u.game_object_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

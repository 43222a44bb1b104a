//! Wallet-connection library seams
//!
//! The library itself (wallet selection UI, transports, chain state) lives
//! outside the bridge. These traits describe only what the bridge calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use web3_bridge_core::{AppMetadata, Chain, Result};

/// One account exposed by a connected wallet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub address: String,
}

/// EIP-1193 style provider request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

impl ProviderRequest {
    /// `personal_sign` with params `[message, address]`
    pub fn personal_sign(message: &str, address: &str) -> Self {
        Self {
            method: "personal_sign".into(),
            params: vec![message.into(), address.into()],
        }
    }
}

/// Active provider of a connected wallet
#[async_trait(?Send)]
pub trait WalletProvider {
    async fn request(&self, request: ProviderRequest) -> Result<serde_json::Value>;
}

/// A wallet as reported by the library's connection state
#[derive(Clone)]
pub struct ConnectedWallet {
    pub label: String,
    pub accounts: Vec<Account>,
    pub provider: Rc<dyn WalletProvider>,
}

impl ConnectedWallet {
    pub fn new(label: impl Into<String>, provider: Rc<dyn WalletProvider>) -> Self {
        Self {
            label: label.into(),
            accounts: Vec::new(),
            provider,
        }
    }

    pub fn with_account(mut self, address: impl Into<String>) -> Self {
        self.accounts.push(Account {
            address: address.into(),
        });
        self
    }

    /// Address of the first account, if present and non-empty
    pub fn primary_address(&self) -> Option<&str> {
        self.accounts
            .first()
            .map(|a| a.address.as_str())
            .filter(|a| !a.is_empty())
    }
}

impl fmt::Debug for ConnectedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedWallet")
            .field("label", &self.label)
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

/// A constructed wallet-library handle
#[async_trait(?Send)]
pub trait WalletLibrary {
    /// Open the connection flow; resolves to every wallet the user connected
    async fn connect_wallet(&self) -> Result<Vec<ConnectedWallet>>;

    /// Snapshot of the library's live connection state
    fn connected_wallets(&self) -> Result<Vec<ConnectedWallet>>;

    /// Disconnect the wallet with the given label
    async fn disconnect_wallet(&self, label: &str) -> Result<()>;
}

/// Configuration the library handle is constructed from
#[derive(Debug, Clone)]
pub struct LibraryConfig<M> {
    pub wallets: Vec<M>,
    pub chains: Vec<Chain>,
    pub app_metadata: AppMetadata,
}

/// Builds wallet modules and the library handle itself
pub trait WalletLibraryFactory {
    /// Opaque wallet module understood by the library
    type Module;
    type Library: WalletLibrary;

    /// Module for browser-injected providers
    fn injected_module(&self) -> Result<Self::Module>;

    /// Module for WalletConnect, keyed by project id
    fn wallet_connect_module(&self, project_id: &str) -> Result<Self::Module>;

    /// Adopt a caller-supplied module unchanged
    fn custom_module(&self, raw: serde_json::Value) -> Result<Self::Module>;

    fn create(&self, config: LibraryConfig<Self::Module>) -> Result<Self::Library>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryProvider, SignBehavior};
    use web3_bridge_core::BridgeError;

    #[test]
    fn test_primary_address_is_first_non_empty() {
        let provider: Rc<dyn WalletProvider> = Rc::new(MemoryProvider::signing());
        let wallet = ConnectedWallet::new("MetaMask", provider.clone())
            .with_account("0xaaa")
            .with_account("0xbbb");
        assert_eq!(wallet.primary_address(), Some("0xaaa"));

        let empty = ConnectedWallet::new("Empty", provider.clone()).with_account("");
        assert_eq!(empty.primary_address(), None);

        let none = ConnectedWallet::new("None", provider);
        assert_eq!(none.primary_address(), None);
    }

    #[test]
    fn test_personal_sign_params() {
        let request = ProviderRequest::personal_sign("hello", "0xabc");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "personal_sign");
        assert_eq!(json["params"][0], "hello");
        assert_eq!(json["params"][1], "0xabc");
    }

    #[test]
    fn test_provider_rejection_surfaces_library_error() {
        let provider: Rc<dyn WalletProvider> = Rc::new(MemoryProvider::new(
            SignBehavior::Reject("User denied message signature".into()),
        ));
        let result = tokio_test::block_on(
            provider.request(ProviderRequest::personal_sign("hi", "0x1")),
        );
        assert_eq!(
            result,
            Err(BridgeError::Library("User denied message signature".into()))
        );
    }
}

//! In-memory wallet library, page globals and document style
//!
//! Scriptable stand-ins for the page, used by tests and the sample driver.

use crate::receiver::GlobalScope;
use crate::theme::StyleTarget;
use crate::wallet::{
    ConnectedWallet, LibraryConfig, ProviderRequest, WalletLibrary, WalletLibraryFactory,
    WalletProvider,
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use web3_bridge_core::{BridgeError, MessageReceiver, OutboundMessage, Result};

/// Wallet module descriptor built by [`MemoryWallets`]
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryModule {
    Injected,
    WalletConnect { project_id: String },
    Custom(serde_json::Value),
}

/// How a [`MemoryProvider`] answers `personal_sign`
#[derive(Debug, Clone)]
pub enum SignBehavior {
    /// Deterministic fake signature over address and message
    Sign,
    /// Reject with a library error
    Reject(String),
    /// Return this exact value
    Respond(serde_json::Value),
}

/// Provider double that records every request
pub struct MemoryProvider {
    behavior: SignBehavior,
    requests: RefCell<Vec<ProviderRequest>>,
}

impl MemoryProvider {
    pub fn new(behavior: SignBehavior) -> Self {
        Self {
            behavior,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn signing() -> Self {
        Self::new(SignBehavior::Sign)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.borrow().clone()
    }

    /// Signature the `Sign` behavior produces
    pub fn fake_signature(address: &str, message: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(address.as_bytes());
        hasher.update(message.as_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

#[async_trait(?Send)]
impl WalletProvider for MemoryProvider {
    async fn request(&self, request: ProviderRequest) -> Result<serde_json::Value> {
        self.requests.borrow_mut().push(request.clone());

        if request.method != "personal_sign" {
            return Err(BridgeError::Library(format!(
                "Unsupported method: {}",
                request.method
            )));
        }

        match &self.behavior {
            SignBehavior::Sign => {
                let message = request.params.first().and_then(|v| v.as_str()).unwrap_or("");
                let address = request.params.get(1).and_then(|v| v.as_str()).unwrap_or("");
                Ok(Self::fake_signature(address, message).into())
            }
            SignBehavior::Reject(message) => Err(BridgeError::Library(message.clone())),
            SignBehavior::Respond(value) => Ok(value.clone()),
        }
    }
}

/// Wallet with a signing provider and one account
pub fn demo_wallet(label: &str, address: &str) -> ConnectedWallet {
    ConnectedWallet::new(label, Rc::new(MemoryProvider::signing())).with_account(address)
}

#[derive(Default)]
struct Script {
    connect: Option<std::result::Result<Vec<ConnectedWallet>, String>>,
    connected: Vec<ConnectedWallet>,
    failing_disconnects: HashSet<String>,
    state_error: Option<String>,
    failing_modules: HashSet<String>,
    modules_built: usize,
    libraries_created: usize,
}

/// Scriptable wallet-library factory.
///
/// Clones share one script, so a test can keep a handle after moving the
/// factory into a session.
#[derive(Clone, Default)]
pub struct MemoryWallets {
    script: Rc<RefCell<Script>>,
}

impl MemoryWallets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallets returned by the next connect calls
    pub fn script_connect(&self, wallets: Vec<ConnectedWallet>) {
        self.script.borrow_mut().connect = Some(Ok(wallets));
    }

    /// Make connect calls reject with `message`
    pub fn reject_connect(&self, message: &str) {
        self.script.borrow_mut().connect = Some(Err(message.to_string()));
    }

    /// Seed the live connection state
    pub fn add_connected(&self, wallet: ConnectedWallet) {
        self.script.borrow_mut().connected.push(wallet);
    }

    pub fn fail_disconnect(&self, label: &str) {
        self.script
            .borrow_mut()
            .failing_disconnects
            .insert(label.to_string());
    }

    /// Make reading the connection state fail
    pub fn fail_state(&self, message: &str) {
        self.script.borrow_mut().state_error = Some(message.to_string());
    }

    /// Make building the named module (`injected`, `walletconnect`) fail
    pub fn fail_module(&self, name: &str) {
        self.script
            .borrow_mut()
            .failing_modules
            .insert(name.to_string());
    }

    pub fn connected_labels(&self) -> Vec<String> {
        self.script
            .borrow()
            .connected
            .iter()
            .map(|w| w.label.clone())
            .collect()
    }

    pub fn modules_built(&self) -> usize {
        self.script.borrow().modules_built
    }

    pub fn libraries_created(&self) -> usize {
        self.script.borrow().libraries_created
    }

    fn build(&self, name: &str, module: MemoryModule) -> Result<MemoryModule> {
        let mut script = self.script.borrow_mut();
        if script.failing_modules.contains(name) {
            return Err(BridgeError::Library(format!("{} module unavailable", name)));
        }
        script.modules_built += 1;
        Ok(module)
    }
}

impl WalletLibraryFactory for MemoryWallets {
    type Module = MemoryModule;
    type Library = MemoryWalletLibrary;

    fn injected_module(&self) -> Result<MemoryModule> {
        self.build("injected", MemoryModule::Injected)
    }

    fn wallet_connect_module(&self, project_id: &str) -> Result<MemoryModule> {
        self.build(
            "walletconnect",
            MemoryModule::WalletConnect {
                project_id: project_id.to_string(),
            },
        )
    }

    fn custom_module(&self, raw: serde_json::Value) -> Result<MemoryModule> {
        Ok(MemoryModule::Custom(raw))
    }

    fn create(&self, config: LibraryConfig<MemoryModule>) -> Result<MemoryWalletLibrary> {
        self.script.borrow_mut().libraries_created += 1;
        Ok(MemoryWalletLibrary {
            config,
            script: self.script.clone(),
        })
    }
}

/// Library handle produced by [`MemoryWallets`]
pub struct MemoryWalletLibrary {
    config: LibraryConfig<MemoryModule>,
    script: Rc<RefCell<Script>>,
}

impl MemoryWalletLibrary {
    /// Configuration the handle was constructed from
    pub fn config(&self) -> &LibraryConfig<MemoryModule> {
        &self.config
    }
}

#[async_trait(?Send)]
impl WalletLibrary for MemoryWalletLibrary {
    async fn connect_wallet(&self) -> Result<Vec<ConnectedWallet>> {
        // The real flow waits on the user; let other tasks interleave.
        tokio::task::yield_now().await;

        let scripted = self.script.borrow().connect.clone();
        match scripted.unwrap_or_else(|| Ok(Vec::new())) {
            Ok(wallets) => {
                let mut script = self.script.borrow_mut();
                for wallet in &wallets {
                    script.connected.retain(|w| w.label != wallet.label);
                    script.connected.push(wallet.clone());
                }
                Ok(wallets)
            }
            Err(message) => Err(BridgeError::Library(message)),
        }
    }

    fn connected_wallets(&self) -> Result<Vec<ConnectedWallet>> {
        let script = self.script.borrow();
        match &script.state_error {
            Some(message) => Err(BridgeError::Library(message.clone())),
            None => Ok(script.connected.clone()),
        }
    }

    async fn disconnect_wallet(&self, label: &str) -> Result<()> {
        let mut script = self.script.borrow_mut();
        if script.failing_disconnects.contains(label) {
            return Err(BridgeError::Library(format!("{} is stuck", label)));
        }
        script.connected.retain(|w| w.label != label);
        Ok(())
    }
}

/// Receiver double that records deliveries
pub struct RecordingReceiver {
    can_send: bool,
    fail: bool,
    messages: RefCell<Vec<OutboundMessage>>,
}

impl RecordingReceiver {
    pub fn new() -> Self {
        Self {
            can_send: true,
            fail: false,
            messages: RefCell::new(Vec::new()),
        }
    }

    /// A candidate that exposes no send capability
    pub fn without_send() -> Self {
        Self {
            can_send: false,
            ..Self::new()
        }
    }

    /// A receiver whose every delivery throws
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.borrow().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .map(|m| m.method.clone())
            .collect()
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.messages.borrow().last().cloned()
    }
}

impl Default for RecordingReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageReceiver for RecordingReceiver {
    fn can_send(&self) -> bool {
        self.can_send
    }

    fn send_message(&self, object: &str, method: &str, payload: &str) -> Result<()> {
        if self.fail {
            return Err(BridgeError::Receiver(format!("{}.{} threw", object, method)));
        }
        self.messages
            .borrow_mut()
            .push(OutboundMessage::new(object, method, payload));
        Ok(())
    }
}

/// Page globals keyed by dotted path, e.g. `MegaMod.myGameInstance`
#[derive(Default)]
pub struct MemoryGlobals {
    receivers: RefCell<HashMap<String, Rc<dyn MessageReceiver>>>,
}

impl MemoryGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, receiver: Rc<dyn MessageReceiver>) {
        self.receivers
            .borrow_mut()
            .insert(path.to_string(), receiver);
    }
}

impl GlobalScope for MemoryGlobals {
    fn receiver_at(&self, path: &[&str]) -> Option<Rc<dyn MessageReceiver>> {
        self.receivers.borrow().get(&path.join(".")).cloned()
    }
}

/// Document root style double. Rejects names a browser would refuse.
#[derive(Default)]
pub struct MemoryStyle {
    properties: RefCell<BTreeMap<String, String>>,
}

impl MemoryStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.properties.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.properties.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.borrow().is_empty()
    }
}

impl StyleTarget for MemoryStyle {
    fn set_property(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() || key.chars().any(|c| c.is_whitespace() || c == ';') {
            return Err(BridgeError::Style(format!("invalid property name: {:?}", key)));
        }
        self.properties
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

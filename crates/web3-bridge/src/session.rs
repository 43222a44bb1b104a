//! Bridge session: wallet-library handle, last connected wallet, receiver wiring

use crate::environment::BrowserEnvironment;
use crate::receiver::resolve_receiver;
use crate::report::{DisconnectReport, SuppressedError, ThemeReport};
use crate::wallet::{
    ConnectedWallet, LibraryConfig, ProviderRequest, WalletLibrary, WalletLibraryFactory,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, error, info, warn};
use web3_bridge_core::{
    BridgeError, Callback, Chain, DEFAULT_RECEIVER_NAME, InitOptions, MessageReceiver,
    ReplyTarget, Result, SignResult, ThemeDescriptor,
};

/// Browser-side bridge state for one page or app lifetime.
///
/// Operations are cooperative and unsynchronized except for `connect`,
/// which admits one attempt at a time.
pub struct BridgeSession<F: WalletLibraryFactory> {
    factory: F,
    environment: BrowserEnvironment,
    library: RefCell<Option<Rc<F::Library>>>,
    last_wallet: RefCell<Option<ConnectedWallet>>,
    receiver_override: RefCell<Option<Rc<dyn MessageReceiver>>>,
    receiver_name: RefCell<String>,
    init_suppressed: RefCell<Vec<SuppressedError>>,
    connecting: Cell<bool>,
}

/// Single-slot in-flight marker, released on drop
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn acquire(slot: &'a Cell<bool>, operation: &str) -> Result<Self> {
        if slot.replace(true) {
            return Err(BridgeError::OperationInProgress(operation.to_string()));
        }
        Ok(Self(slot))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<F: WalletLibraryFactory> BridgeSession<F> {
    pub fn new(factory: F, environment: BrowserEnvironment) -> Self {
        Self {
            factory,
            environment,
            library: RefCell::new(None),
            last_wallet: RefCell::new(None),
            receiver_override: RefCell::new(None),
            receiver_name: RefCell::new(DEFAULT_RECEIVER_NAME.to_string()),
            init_suppressed: RefCell::new(Vec::new()),
            connecting: Cell::new(false),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn is_initialized(&self) -> bool {
        self.library.borrow().is_some()
    }

    /// The wallet-library handle, once initialized
    pub fn library(&self) -> Option<Rc<F::Library>> {
        self.library.borrow().clone()
    }

    pub fn last_wallet(&self) -> Option<ConnectedWallet> {
        self.last_wallet.borrow().clone()
    }

    pub fn receiver_name(&self) -> String {
        self.receiver_name.borrow().clone()
    }

    /// Wallet-module failures swallowed by the last successful init
    pub fn suppressed_init_errors(&self) -> Vec<SuppressedError> {
        self.init_suppressed.borrow().clone()
    }

    /// Construct the wallet-library handle.
    ///
    /// Idempotent: once a handle exists it is returned unchanged and the new
    /// options are ignored entirely.
    pub fn init(&self, options: InitOptions) -> Result<Rc<F::Library>> {
        if let Some(library) = self.library() {
            debug!("Bridge already initialized, ignoring new options");
            return Ok(library);
        }

        let receiver_name = options.receiver_name().map(str::to_string);
        let project_id = options.project_id().map(str::to_string);
        let InitOptions {
            chains,
            app_metadata,
            wallets,
            unity,
            theme,
            ..
        } = options;

        if let Some(instance) = unity.and_then(|wiring| wiring.instance) {
            *self.receiver_override.borrow_mut() = Some(instance);
        }
        if let Some(name) = receiver_name {
            *self.receiver_name.borrow_mut() = name;
        }

        let theme = theme.unwrap_or_else(ThemeDescriptor::default_palette);
        self.apply_theme(&theme);

        let wallets = self.build_wallet_modules(wallets, project_id.as_deref())?;
        let chains = if chains.is_empty() {
            vec![Chain::base()]
        } else {
            chains
        };
        let app_metadata = app_metadata.unwrap_or_default();

        info!(
            "Initializing wallet library: {} wallet modules, {} chains, app {:?}",
            wallets.len(),
            chains.len(),
            app_metadata.name
        );

        let library = Rc::new(self.factory.create(LibraryConfig {
            wallets,
            chains,
            app_metadata,
        })?);
        *self.library.borrow_mut() = Some(library.clone());
        Ok(library)
    }

    /// Caller-supplied modules are used as given. Otherwise the injected
    /// module, plus WalletConnect when a project id is present; each
    /// construction failure is recorded and skipped.
    fn build_wallet_modules(
        &self,
        custom: Vec<serde_json::Value>,
        project_id: Option<&str>,
    ) -> Result<Vec<F::Module>> {
        if !custom.is_empty() {
            return custom
                .into_iter()
                .map(|raw| self.factory.custom_module(raw))
                .collect();
        }

        let mut modules = Vec::new();
        let mut suppressed = Vec::new();

        match self.factory.injected_module() {
            Ok(module) => modules.push(module),
            Err(e) => {
                warn!("Injected wallet module unavailable: {}", e);
                suppressed.push(SuppressedError::new("injected", e));
            }
        }

        if let Some(project_id) = project_id {
            match self.factory.wallet_connect_module(project_id) {
                Ok(module) => modules.push(module),
                Err(e) => {
                    warn!("WalletConnect module unavailable: {}", e);
                    suppressed.push(SuppressedError::new("walletconnect", e));
                }
            }
        }

        *self.init_suppressed.borrow_mut() = suppressed;
        Ok(modules)
    }

    fn require_library(&self) -> Result<Rc<F::Library>> {
        self.library().ok_or(BridgeError::NotInitialized)
    }

    /// Connect a wallet and report `OnConnected(address)`.
    ///
    /// Fails immediately, with no callback, when the bridge is not
    /// initialized. Any other failure is reported as `OnConnectError` and
    /// returned. Only the first wallet the library returns is retained.
    pub async fn connect(&self) -> Result<ConnectedWallet> {
        let library = self.require_library()?;

        let _in_flight = match InFlight::acquire(&self.connecting, "connect") {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Connect rejected: {}", e);
                self.send(Callback::ConnectError, &e.callback_message("Connect error"));
                return Err(e);
            }
        };

        match self.request_connection(&library).await {
            Ok((wallet, address)) => {
                info!("Wallet connected: {} ({})", wallet.label, address);
                self.send(Callback::Connected, &address);
                Ok(wallet)
            }
            Err(e) => {
                self.last_wallet.borrow_mut().take();
                error!("Connect failed: {}", e);
                self.send(Callback::ConnectError, &e.callback_message("Connect error"));
                Err(e)
            }
        }
    }

    async fn request_connection(&self, library: &F::Library) -> Result<(ConnectedWallet, String)> {
        let wallets = library.connect_wallet().await?;
        if wallets.len() > 1 {
            debug!("Library returned {} wallets, keeping the first", wallets.len());
        }

        let wallet = wallets.into_iter().next();
        *self.last_wallet.borrow_mut() = wallet.clone();

        let wallet = wallet.ok_or_else(no_address)?;
        let address = wallet.primary_address().ok_or_else(no_address)?.to_string();
        Ok((wallet, address))
    }

    /// Disconnect every wallet in the library's live state.
    ///
    /// Per-wallet failures are collected and skipped. `OnDisconnected('')`
    /// follows once the loop completes; only a failure to read the state is
    /// reported as `OnDisconnectError`.
    pub async fn disconnect(&self) -> Result<DisconnectReport> {
        let library = self.require_library()?;

        let wallets = match library.connected_wallets() {
            Ok(wallets) => wallets,
            Err(e) => {
                error!("Disconnect failed: {}", e);
                self.send(Callback::DisconnectError, &e.callback_message("Disconnect error"));
                return Err(e);
            }
        };

        let mut report = DisconnectReport::default();
        for wallet in wallets {
            match library.disconnect_wallet(&wallet.label).await {
                Ok(()) => report.disconnected.push(wallet.label),
                Err(e) => {
                    warn!("Failed to disconnect {}: {}", wallet.label, e);
                    report.suppressed.push(SuppressedError::new(wallet.label, e));
                }
            }
        }

        self.last_wallet.borrow_mut().take();
        info!("Disconnected {} wallets", report.disconnected.len());
        self.send(Callback::Disconnected, "");
        Ok(report)
    }

    /// Sign `message` with the last connected wallet and report `OnSigned`
    /// or `OnSignError`.
    pub async fn sign_message(&self, message: &str) -> Result<String> {
        match self.request_signature(message).await {
            Ok(signature) => {
                debug!("Message signed");
                self.send(Callback::Signed, &signature);
                Ok(signature)
            }
            Err(e) => {
                error!("Sign failed: {}", e);
                self.send(Callback::SignError, &e.callback_message("Sign error"));
                Err(e)
            }
        }
    }

    /// Like [`sign_message`](Self::sign_message), additionally delivering a
    /// JSON [`SignResult`] to the caller's own target.
    pub async fn sign_message_for(&self, message: &str, reply: &ReplyTarget) -> Result<String> {
        let outcome = self.sign_message(message).await;

        let result = match &outcome {
            Ok(signature) => SignResult::signed(signature.clone(), reply.request_id.clone()),
            Err(e) => SignResult::failed(e.callback_message("Sign error"), reply.request_id.clone()),
        };
        match result.to_json() {
            Ok(payload) => {
                self.send_to_receiver(&reply.object, &reply.method, &payload);
            }
            Err(e) => warn!("Could not encode sign result: {}", e),
        }

        outcome
    }

    async fn request_signature(&self, message: &str) -> Result<String> {
        let wallet = self.last_wallet().ok_or(BridgeError::NoWalletConnected)?;
        let address = wallet.primary_address().ok_or_else(no_address)?;

        let response = wallet
            .provider
            .request(ProviderRequest::personal_sign(message, address))
            .await?;

        match response {
            serde_json::Value::String(signature) if !signature.is_empty() => Ok(signature),
            serde_json::Value::String(_) | serde_json::Value::Null => Err(
                BridgeError::MissingData("No signature from wallet".into()),
            ),
            other => Ok(other.to_string()),
        }
    }

    /// Store or clear the explicit receiver
    pub fn set_receiver(&self, receiver: Option<Rc<dyn MessageReceiver>>) {
        *self.receiver_override.borrow_mut() = receiver;
    }

    /// Name the host object that receives fixed-name callbacks
    pub fn set_receiver_name(&self, name: &str) {
        *self.receiver_name.borrow_mut() = name.to_string();
    }

    /// Apply theme variables to the document root, if there is one
    pub fn apply_theme(&self, theme: &ThemeDescriptor) -> ThemeReport {
        match &self.environment.style {
            Some(target) => crate::theme::apply_theme(&**target, theme),
            None => {
                debug!("No document, skipping theme");
                ThemeReport::default()
            }
        }
    }

    /// First live receiver: override, then page globals
    pub fn resolve_receiver(&self) -> Option<Rc<dyn MessageReceiver>> {
        let explicit = self.receiver_override.borrow().clone();
        resolve_receiver(explicit.as_ref(), self.environment.globals.as_ref())
    }

    /// Best-effort delivery; returns whether a receiver accepted it.
    /// Undeliverable messages are dropped.
    pub fn send_to_receiver(&self, object: &str, method: &str, payload: &str) -> bool {
        let Some(receiver) = self.resolve_receiver() else {
            warn!("No receiver available, dropping {}.{}", object, method);
            return false;
        };

        let preview: String = payload.chars().take(200).collect();
        debug!("[Bridge→Host] {}.{} payload={}", object, method, preview);

        match receiver.send_message(object, method, payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("Delivery of {}.{} failed: {}", object, method, e);
                false
            }
        }
    }

    fn send(&self, callback: Callback, payload: &str) {
        let object = self.receiver_name();
        self.send_to_receiver(&object, callback.method_name(), payload);
    }
}

fn no_address() -> BridgeError {
    BridgeError::MissingData("No address from wallet".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{
        MemoryGlobals, MemoryModule, MemoryProvider, MemoryStyle, MemoryWallets,
        RecordingReceiver, SignBehavior, demo_wallet,
    };
    use web3_bridge_core::{AppMetadata, ReceiverWiring};

    struct Fixture {
        wallets: MemoryWallets,
        receiver: Rc<RecordingReceiver>,
        style: Rc<MemoryStyle>,
        session: BridgeSession<MemoryWallets>,
    }

    fn fixture() -> Fixture {
        let wallets = MemoryWallets::new();
        let receiver = Rc::new(RecordingReceiver::new());
        let style = Rc::new(MemoryStyle::new());
        let globals = MemoryGlobals::new();
        globals.insert("unityInstance", receiver.clone());
        let environment = BrowserEnvironment::new(Rc::new(globals), Some(style.clone()));
        let session = BridgeSession::new(wallets.clone(), environment);
        Fixture {
            wallets,
            receiver,
            style,
            session,
        }
    }

    fn initialized() -> Fixture {
        let f = fixture();
        f.session.init(InitOptions::default()).unwrap();
        f
    }

    #[test]
    fn test_init_is_idempotent() {
        let f = fixture();
        let first = f.session.init(InitOptions::default()).unwrap();

        let other = InitOptions {
            wallet_connect_project_id: Some("wc".into()),
            chains: vec![Chain {
                id: "0x1".into(),
                token: "ETH".into(),
                label: "Ethereum".into(),
                rpc_url: "https://eth.example".into(),
                extra: Default::default(),
            }],
            ..Default::default()
        };
        let second = f.session.init(other).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(f.wallets.libraries_created(), 1);
        assert_eq!(f.wallets.modules_built(), 1);
        assert_eq!(second.config().chains, vec![Chain::base()]);
    }

    #[test]
    fn test_init_falls_back_to_defaults() {
        let f = fixture();
        let options = InitOptions::from_json(r#"{"chains":[],"wallets":[]}"#).unwrap();
        let library = f.session.init(options).unwrap();

        let config = library.config();
        assert_eq!(config.chains, vec![Chain::base()]);
        assert_eq!(config.wallets, vec![MemoryModule::Injected]);
        assert_eq!(config.app_metadata, AppMetadata::default());
        assert_eq!(f.style.get("--w3o-background-color").as_deref(), Some("#1a1d26"));
        assert_eq!(f.style.len(), 6);
    }

    #[test]
    fn test_init_treats_null_lists_as_absent() {
        let f = fixture();
        let options = InitOptions::from_json(r#"{"chains":null,"wallets":null}"#).unwrap();
        let library = f.session.init(options).unwrap();

        assert_eq!(library.config().chains, vec![Chain::base()]);
        assert_eq!(library.config().wallets, vec![MemoryModule::Injected]);
    }

    #[test]
    fn test_init_hands_chain_fields_to_library() {
        let f = fixture();
        let options = InitOptions::from_json(
            r#"{"chains":[{"id":"0x1","token":"ETH","label":"Ethereum","rpcUrl":"https://x","blockExplorerUrl":"https://etherscan.io"}]}"#,
        )
        .unwrap();
        let library = f.session.init(options).unwrap();

        let chain = &library.config().chains[0];
        assert_eq!(chain.id, "0x1");
        assert_eq!(
            chain.extra.get("blockExplorerUrl").and_then(|v| v.as_str()),
            Some("https://etherscan.io")
        );
    }

    #[test]
    fn test_init_with_project_id_adds_wallet_connect() {
        let f = fixture();
        let options = InitOptions::from_json(r#"{"walletConnectProjectId":"wc-42"}"#).unwrap();
        let library = f.session.init(options).unwrap();

        assert_eq!(
            library.config().wallets,
            vec![
                MemoryModule::Injected,
                MemoryModule::WalletConnect {
                    project_id: "wc-42".into()
                }
            ]
        );
    }

    #[test]
    fn test_init_swallows_module_failures() {
        let f = fixture();
        f.wallets.fail_module("injected");
        let options = InitOptions::from_json(r#"{"walletConnectProjectId":"wc-42"}"#).unwrap();
        let library = f.session.init(options).unwrap();

        assert_eq!(library.config().wallets.len(), 1);
        let suppressed = f.session.suppressed_init_errors();
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].entry, "injected");
    }

    #[test]
    fn test_init_uses_custom_wallets_verbatim() {
        let f = fixture();
        let options =
            InitOptions::from_json(r#"{"wallets":[{"label":"Ledger"}],"walletConnectProjectId":"x"}"#)
                .unwrap();
        let library = f.session.init(options).unwrap();

        assert_eq!(
            library.config().wallets,
            vec![MemoryModule::Custom(serde_json::json!({"label": "Ledger"}))]
        );
        assert_eq!(f.wallets.modules_built(), 0);
    }

    #[test]
    fn test_init_applies_supplied_theme_only() {
        let f = fixture();
        let options = InitOptions::from_json(r##"{"theme":{"--w3o-text-color":"#000"}}"##).unwrap();
        f.session.init(options).unwrap();

        assert_eq!(f.style.len(), 1);
        assert_eq!(f.style.get("--w3o-text-color").as_deref(), Some("#000"));
    }

    #[tokio::test]
    async fn test_init_wires_receiver() {
        let f = fixture();
        let explicit = Rc::new(RecordingReceiver::new());
        f.wallets.script_connect(vec![demo_wallet("MetaMask", "0xabc")]);
        let options = InitOptions {
            unity: Some(ReceiverWiring {
                instance: Some(explicit.clone()),
                game_object_name: Some("WalletListener".into()),
            }),
            ..Default::default()
        };
        f.session.init(options).unwrap();
        f.session.connect().await.unwrap();

        assert!(f.receiver.messages().is_empty());
        let msg = explicit.last().unwrap();
        assert_eq!(msg.object, "WalletListener");
        assert_eq!(msg.method, "OnConnected");
        assert_eq!(msg.payload, "0xabc");
    }

    #[tokio::test]
    async fn test_connect_before_init_fails_without_callback() {
        let f = fixture();
        let err = f.session.connect().await.unwrap_err();
        assert_eq!(err, BridgeError::NotInitialized);
        assert!(f.receiver.messages().is_empty());

        assert_eq!(f.session.disconnect().await.unwrap_err(), BridgeError::NotInitialized);
        assert!(f.receiver.messages().is_empty());
    }

    #[tokio::test]
    async fn test_connect_keeps_first_wallet() {
        let f = initialized();
        f.wallets.script_connect(vec![
            demo_wallet("MetaMask", "0x1111"),
            demo_wallet("Rabby", "0x2222"),
        ]);

        let wallet = f.session.connect().await.unwrap();

        assert_eq!(wallet.label, "MetaMask");
        assert_eq!(f.session.last_wallet().unwrap().label, "MetaMask");
        let msg = f.receiver.last().unwrap();
        assert_eq!(msg.object, "Web3Bridge");
        assert_eq!(msg.method, "OnConnected");
        assert_eq!(msg.payload, "0x1111");
    }

    #[tokio::test]
    async fn test_connect_without_accounts_is_an_error() {
        let f = initialized();
        let accountless = ConnectedWallet::new("Empty", Rc::new(MemoryProvider::signing()));
        f.wallets.script_connect(vec![accountless]);

        let err = f.session.connect().await.unwrap_err();

        assert_eq!(err, BridgeError::MissingData("No address from wallet".into()));
        assert_eq!(f.receiver.methods(), vec!["OnConnectError"]);
        assert_eq!(f.receiver.last().unwrap().payload, "No address from wallet");
        assert!(f.session.last_wallet().is_none());
    }

    #[tokio::test]
    async fn test_connect_with_no_wallets_is_an_error() {
        let f = initialized();
        f.wallets.script_connect(vec![]);
        assert!(f.session.connect().await.is_err());
        assert_eq!(f.receiver.methods(), vec!["OnConnectError"]);
    }

    #[tokio::test]
    async fn test_connect_rejection_reports_library_message() {
        let f = initialized();
        f.wallets.script_connect(vec![demo_wallet("MetaMask", "0x1")]);
        f.session.connect().await.unwrap();

        f.wallets.reject_connect("User rejected the request.");
        let err = f.session.connect().await.unwrap_err();

        assert_eq!(err, BridgeError::Library("User rejected the request.".into()));
        assert_eq!(f.receiver.last().unwrap().payload, "User rejected the request.");
        assert!(f.session.last_wallet().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_connect_is_rejected() {
        let f = initialized();
        f.wallets.script_connect(vec![demo_wallet("MetaMask", "0x1")]);

        let (first, second) = tokio::join!(f.session.connect(), f.session.connect());

        assert!(first.is_ok());
        assert_eq!(
            second.unwrap_err(),
            BridgeError::OperationInProgress("connect".into())
        );
        assert_eq!(f.receiver.methods(), vec!["OnConnectError", "OnConnected"]);

        // Slot is free again afterwards
        assert!(f.session.connect().await.is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_with_no_wallets() {
        let f = initialized();
        let report = f.session.disconnect().await.unwrap();

        assert!(report.disconnected.is_empty());
        assert!(f.session.last_wallet().is_none());
        let msg = f.receiver.last().unwrap();
        assert_eq!(msg.method, "OnDisconnected");
        assert_eq!(msg.payload, "");
    }

    #[tokio::test]
    async fn test_disconnect_continues_past_stuck_wallet() {
        let f = initialized();
        f.wallets.script_connect(vec![demo_wallet("MetaMask", "0x1")]);
        f.session.connect().await.unwrap();
        f.wallets.add_connected(demo_wallet("Rabby", "0x2"));
        f.wallets.add_connected(demo_wallet("Coinbase", "0x3"));
        f.wallets.fail_disconnect("Rabby");

        let report = f.session.disconnect().await.unwrap();

        assert_eq!(report.disconnected, vec!["MetaMask", "Coinbase"]);
        assert_eq!(report.suppressed.len(), 1);
        assert_eq!(report.suppressed[0].entry, "Rabby");
        assert!(!report.is_clean());
        assert_eq!(f.wallets.connected_labels(), vec!["Rabby"]);
        assert!(f.session.last_wallet().is_none());
        assert_eq!(f.receiver.last().unwrap().method, "OnDisconnected");
    }

    #[tokio::test]
    async fn test_disconnect_state_failure() {
        let f = initialized();
        f.wallets.script_connect(vec![demo_wallet("MetaMask", "0x1")]);
        f.session.connect().await.unwrap();
        f.wallets.fail_state("state unavailable");

        let err = f.session.disconnect().await.unwrap_err();

        assert_eq!(err, BridgeError::Library("state unavailable".into()));
        let msg = f.receiver.last().unwrap();
        assert_eq!(msg.method, "OnDisconnectError");
        assert_eq!(msg.payload, "state unavailable");
        assert!(f.session.last_wallet().is_some());
    }

    #[tokio::test]
    async fn test_sign_without_wallet() {
        let f = initialized();
        let err = f.session.sign_message("hello").await.unwrap_err();

        assert_eq!(err, BridgeError::NoWalletConnected);
        let msg = f.receiver.last().unwrap();
        assert_eq!(msg.method, "OnSignError");
        assert_eq!(msg.payload, "No wallet connected");
    }

    #[tokio::test]
    async fn test_sign_uses_first_account() {
        let f = initialized();
        let provider = Rc::new(MemoryProvider::signing());
        let wallet = ConnectedWallet::new("MetaMask", provider.clone())
            .with_account("0xaaa")
            .with_account("0xbbb");
        f.wallets.script_connect(vec![wallet]);
        f.session.connect().await.unwrap();

        let signature = f.session.sign_message("hello").await.unwrap();

        assert_eq!(signature, MemoryProvider::fake_signature("0xaaa", "hello"));
        assert_eq!(
            provider.requests(),
            vec![ProviderRequest::personal_sign("hello", "0xaaa")]
        );
        let msg = f.receiver.last().unwrap();
        assert_eq!(msg.method, "OnSigned");
        assert_eq!(msg.payload, signature);
    }

    #[tokio::test]
    async fn test_sign_rejection_and_empty_signature() {
        let f = initialized();
        let rejecting = ConnectedWallet::new(
            "MetaMask",
            Rc::new(MemoryProvider::new(SignBehavior::Reject("User denied".into()))),
        )
        .with_account("0x1");
        f.wallets.script_connect(vec![rejecting]);
        f.session.connect().await.unwrap();

        assert_eq!(
            f.session.sign_message("m").await.unwrap_err(),
            BridgeError::Library("User denied".into())
        );
        assert_eq!(f.receiver.last().unwrap().payload, "User denied");

        let silent = ConnectedWallet::new(
            "Silent",
            Rc::new(MemoryProvider::new(SignBehavior::Respond(serde_json::Value::Null))),
        )
        .with_account("0x2");
        f.wallets.script_connect(vec![silent]);
        f.session.connect().await.unwrap();

        assert_eq!(
            f.session.sign_message("m").await.unwrap_err(),
            BridgeError::MissingData("No signature from wallet".into())
        );
        assert_eq!(f.receiver.last().unwrap().method, "OnSignError");
    }

    #[tokio::test]
    async fn test_sign_message_for_reply_target() {
        let f = initialized();
        f.wallets.script_connect(vec![demo_wallet("MetaMask", "0xabc")]);
        f.session.connect().await.unwrap();

        let reply = ReplyTarget::new("Menu", "OnSignMessageResult").with_request_id("r1");
        let signature = f.session.sign_message_for("hi", &reply).await.unwrap();

        let messages = f.receiver.messages();
        let result = messages.last().unwrap();
        assert_eq!(result.object, "Menu");
        assert_eq!(result.method, "OnSignMessageResult");
        let parsed: SignResult = serde_json::from_str(&result.payload).unwrap();
        assert_eq!(parsed, SignResult::signed(signature, Some("r1".into())));
        assert_eq!(messages[messages.len() - 2].method, "OnSigned");
    }

    #[tokio::test]
    async fn test_sign_message_for_reports_errors() {
        let f = initialized();
        let reply = ReplyTarget::new("Menu", "OnSignMessageResult");
        assert!(f.session.sign_message_for("hi", &reply).await.is_err());

        let parsed: SignResult =
            serde_json::from_str(&f.receiver.last().unwrap().payload).unwrap();
        assert_eq!(parsed.error.as_deref(), Some("No wallet connected"));
        assert!(parsed.signature.is_none());
    }

    #[tokio::test]
    async fn test_messages_dropped_without_receiver() {
        let wallets = MemoryWallets::new();
        let session = BridgeSession::new(wallets.clone(), BrowserEnvironment::detached());
        session.init(InitOptions::default()).unwrap();
        wallets.script_connect(vec![demo_wallet("MetaMask", "0x1")]);

        // Delivery is best-effort; the operation itself still succeeds
        assert!(session.connect().await.is_ok());
        assert!(!session.send_to_receiver("Web3Bridge", "OnConnected", "0x1"));

        let late = Rc::new(RecordingReceiver::new());
        session.set_receiver(Some(late.clone()));
        assert!(session.send_to_receiver("Web3Bridge", "Custom", "x"));
        assert_eq!(late.methods(), vec!["Custom"]);

        session.set_receiver(None);
        assert!(session.resolve_receiver().is_none());
    }

    #[tokio::test]
    async fn test_failing_receiver_does_not_fail_operation() {
        let wallets = MemoryWallets::new();
        let globals = MemoryGlobals::new();
        globals.insert("unityInstance", Rc::new(RecordingReceiver::failing()));
        let session = BridgeSession::new(
            wallets.clone(),
            BrowserEnvironment::new(Rc::new(globals), None),
        );
        session.init(InitOptions::default()).unwrap();
        wallets.script_connect(vec![demo_wallet("MetaMask", "0x1")]);

        assert!(session.connect().await.is_ok());
    }

    #[test]
    fn test_set_receiver_name() {
        let f = initialized();
        f.session.set_receiver_name("Lobby");
        assert_eq!(f.session.receiver_name(), "Lobby");
        assert!(f.session.send_to_receiver("Lobby", "Ping", ""));
        assert_eq!(f.receiver.last().unwrap().object, "Lobby");
    }

    #[test]
    fn test_apply_theme_reports_suppressed() {
        let f = initialized();
        let theme: ThemeDescriptor = [("--bad var", "x"), ("--good", "y")].into_iter().collect();
        let report = f.session.apply_theme(&theme);
        assert_eq!(report.applied, vec!["--good".to_string()]);
        assert_eq!(f.style.get("--good").as_deref(), Some("y"));
    }
}

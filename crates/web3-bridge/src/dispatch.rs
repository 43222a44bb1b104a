//! JSON command surface exported to the host
//!
//! The host only passes strings. Failures that were already reported
//! through a callback are not reported a second time here.

use crate::session::BridgeSession;
use crate::wallet::WalletLibraryFactory;
use async_trait::async_trait;
use std::rc::Rc;
use tracing::{debug, warn};
use web3_bridge_core::{
    BridgeBackend, BridgeError, InitOptions, ReplyTarget, Result, ThemeDescriptor,
};

/// Routes host commands into a [`BridgeSession`]
pub struct CommandDispatcher<F: WalletLibraryFactory> {
    session: Rc<BridgeSession<F>>,
}

impl<F: WalletLibraryFactory> CommandDispatcher<F> {
    pub fn new(session: Rc<BridgeSession<F>>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Rc<BridgeSession<F>> {
        &self.session
    }
}

impl<F: WalletLibraryFactory> Clone for CommandDispatcher<F> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

/// Errors the host cannot observe any other way
fn undelivered<T>(operation: &str, result: Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(BridgeError::NotInitialized) => Err(BridgeError::NotInitialized),
        Err(e) => {
            debug!("{} failure delivered via callback: {}", operation, e);
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl<F: WalletLibraryFactory> BridgeBackend for CommandDispatcher<F> {
    async fn init(&self, options_json: &str) -> Result<bool> {
        let options = match InitOptions::from_json(options_json) {
            Ok(options) => options,
            Err(e) => {
                warn!("Init options rejected: {}", e);
                return Ok(false);
            }
        };

        match self.session.init(options) {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Init failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn apply_theme(&self, theme_json: &str) -> Result<()> {
        let theme = ThemeDescriptor::from_json(theme_json)?;
        self.session.apply_theme(&theme);
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        undelivered("Connect", self.session.connect().await)
    }

    async fn disconnect_all(&self) -> Result<()> {
        undelivered("Disconnect", self.session.disconnect().await)
    }

    async fn sign_message(&self, message: &str, receiver: &str, method: &str) -> Result<()> {
        let reply = ReplyTarget::new(receiver, method);
        undelivered("Sign", self.session.sign_message_for(message, &reply).await)
    }

    async fn set_receiver(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(BridgeError::InvalidArgument(
                "receiver name cannot be empty".into(),
            ));
        }
        self.session.set_receiver_name(name);
        Ok(())
    }

    async fn send_to_receiver(&self, object: &str, method: &str, payload: &str) -> Result<()> {
        self.session.send_to_receiver(object, method, payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::BrowserEnvironment;
    use crate::memory::{MemoryGlobals, MemoryStyle, MemoryWallets, RecordingReceiver, demo_wallet};

    fn dispatcher() -> (CommandDispatcher<MemoryWallets>, MemoryWallets, Rc<RecordingReceiver>, Rc<MemoryStyle>) {
        let wallets = MemoryWallets::new();
        let receiver = Rc::new(RecordingReceiver::new());
        let style = Rc::new(MemoryStyle::new());
        let globals = MemoryGlobals::new();
        globals.insert("MegaMod.myGameInstance", receiver.clone());
        let session = BridgeSession::new(
            wallets.clone(),
            BrowserEnvironment::new(Rc::new(globals), Some(style.clone())),
        );
        (CommandDispatcher::new(Rc::new(session)), wallets, receiver, style)
    }

    #[tokio::test]
    async fn test_init_reports_success_flag() {
        let (dispatcher, ..) = dispatcher();
        assert!(!dispatcher.init("{not json").await.unwrap());
        assert!(!dispatcher.session().is_initialized());

        assert!(dispatcher.init(r#"{"chains":[]}"#).await.unwrap());
        assert!(dispatcher.session().is_initialized());
    }

    #[tokio::test]
    async fn test_connect_before_init_propagates() {
        let (dispatcher, _, receiver, _) = dispatcher();
        assert_eq!(dispatcher.connect().await, Err(BridgeError::NotInitialized));
        assert_eq!(dispatcher.disconnect_all().await, Err(BridgeError::NotInitialized));
        assert!(receiver.messages().is_empty());
    }

    #[tokio::test]
    async fn test_delivered_failures_are_not_repeated() {
        let (dispatcher, wallets, receiver, _) = dispatcher();
        dispatcher.init("{}").await.unwrap();
        wallets.reject_connect("User closed modal");

        assert_eq!(dispatcher.connect().await, Ok(()));
        assert_eq!(receiver.methods(), vec!["OnConnectError"]);
    }

    #[tokio::test]
    async fn test_sign_replies_to_caller() {
        let (dispatcher, wallets, receiver, _) = dispatcher();
        dispatcher.init("{}").await.unwrap();
        wallets.script_connect(vec![demo_wallet("MetaMask", "0xabc")]);
        dispatcher.connect().await.unwrap();

        dispatcher
            .sign_message("hello", "Menu", "OnSignMessageResult")
            .await
            .unwrap();

        let reply = receiver.last().unwrap();
        assert_eq!(reply.object, "Menu");
        assert!(reply.payload.contains("\"signature\":\"0x"));
    }

    #[tokio::test]
    async fn test_theme_and_receiver_commands() {
        let (dispatcher, _, receiver, style) = dispatcher();
        dispatcher
            .apply_theme(r##"{"--w3o-action-color":"#ff0000"}"##)
            .await
            .unwrap();
        assert_eq!(style.get("--w3o-action-color").as_deref(), Some("#ff0000"));
        assert!(dispatcher.apply_theme("[]").await.is_err());

        assert!(dispatcher.set_receiver("  ").await.is_err());
        dispatcher.set_receiver("Hud").await.unwrap();
        dispatcher.send_to_receiver("Hud", "OnNotice", "hi").await.unwrap();
        assert_eq!(receiver.last().unwrap().object, "Hud");
        assert_eq!(dispatcher.session().receiver_name(), "Hud");
    }
}

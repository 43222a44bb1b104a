//! Host-side callback routing
//!
//! Deliveries arrive as `(object, method, payload)` strings. `HostReceiver`
//! accepts those addressed to its object and turns them back into
//! `CallbackHandler` calls.

use tracing::{info, warn};
use web3_bridge_core::{BridgeError, Callback, MessageReceiver, Result, SignResult};

/// Method the facade's `sign_message` replies to
pub const SIGN_RESULT_METHOD: &str = "OnSignMessageResult";

/// Reactions to bridge callbacks. Every method logs by default.
pub trait CallbackHandler {
    fn on_connected(&self, address: &str) {
        info!("Wallet connected: {}", address);
    }

    fn on_disconnected(&self) {
        info!("Wallet disconnected");
    }

    fn on_signed(&self, signature: &str) {
        info!("Message signed: {}", signature);
    }

    fn on_connect_error(&self, message: &str) {
        warn!("Connect error: {}", message);
    }

    fn on_disconnect_error(&self, message: &str) {
        warn!("Disconnect error: {}", message);
    }

    fn on_sign_error(&self, message: &str) {
        warn!("Sign error: {}", message);
    }

    fn on_sign_message_result(&self, result: &SignResult) {
        match (&result.signature, &result.error) {
            (Some(signature), _) => info!("Sign result: {}", signature),
            (None, Some(error)) => warn!("Sign result error: {}", error),
            (None, None) => warn!("Sign result carried neither signature nor error"),
        }
    }

    /// Any other method; return `true` if handled
    fn on_message(&self, _method: &str, _payload: &str) -> bool {
        false
    }
}

/// Route one delivery to the matching handler method
pub fn dispatch_callback<H: CallbackHandler + ?Sized>(
    handler: &H,
    method: &str,
    payload: &str,
) -> Result<()> {
    if let Some(callback) = Callback::from_method_name(method) {
        match callback {
            Callback::Connected => handler.on_connected(payload),
            Callback::Disconnected => handler.on_disconnected(),
            Callback::Signed => handler.on_signed(payload),
            Callback::ConnectError => handler.on_connect_error(payload),
            Callback::DisconnectError => handler.on_disconnect_error(payload),
            Callback::SignError => handler.on_sign_error(payload),
        }
        return Ok(());
    }

    if method == SIGN_RESULT_METHOD {
        let result: SignResult = serde_json::from_str(payload)?;
        handler.on_sign_message_result(&result);
        return Ok(());
    }

    if handler.on_message(method, payload) {
        Ok(())
    } else {
        Err(BridgeError::InvalidArgument(format!(
            "No handler for method {}",
            method
        )))
    }
}

/// A named host object backed by a [`CallbackHandler`]
pub struct HostReceiver<H> {
    name: String,
    handler: H,
}

impl<H: CallbackHandler> HostReceiver<H> {
    pub fn new(name: impl Into<String>, handler: H) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: CallbackHandler> MessageReceiver for HostReceiver<H> {
    fn send_message(&self, object: &str, method: &str, payload: &str) -> Result<()> {
        if object != self.name {
            return Err(BridgeError::Receiver(format!(
                "No object named {} (this is {})",
                object, self.name
            )));
        }
        dispatch_callback(&self.handler, method, payload)
    }
}

/// Handler that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCallbacks;

impl CallbackHandler for LoggingCallbacks {}

//! Host-side bridge facade

use crate::callbacks::SIGN_RESULT_METHOD;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, error, info, warn};
use web3_bridge_core::{
    BridgeBackend, BridgeCommand, BridgeError, DEFAULT_RECEIVER_NAME, LogLevel, Result,
};

/// Facade configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Verbosity of facade logging
    pub log_level: LogLevel,
    /// Host object that receives callbacks and sign results
    pub receiver_name: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            receiver_name: DEFAULT_RECEIVER_NAME.to_string(),
        }
    }
}

/// Backend for hosts that cannot reach a browser bridge (editor, native builds)
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedBackend;

#[async_trait(?Send)]
impl BridgeBackend for UnsupportedBackend {
    fn is_supported(&self) -> bool {
        false
    }

    async fn init(&self, _options_json: &str) -> Result<bool> {
        Err(BridgeError::Unsupported("init".into()))
    }

    async fn apply_theme(&self, _theme_json: &str) -> Result<()> {
        Err(BridgeError::Unsupported("applyTheme".into()))
    }

    async fn connect(&self) -> Result<()> {
        Err(BridgeError::Unsupported("connect".into()))
    }

    async fn disconnect_all(&self) -> Result<()> {
        Err(BridgeError::Unsupported("disconnectAll".into()))
    }

    async fn sign_message(&self, _message: &str, _receiver: &str, _method: &str) -> Result<()> {
        Err(BridgeError::Unsupported("signMessage".into()))
    }

    async fn set_receiver(&self, _name: &str) -> Result<()> {
        Err(BridgeError::Unsupported("setReceiver".into()))
    }

    async fn send_to_receiver(&self, _object: &str, _method: &str, _payload: &str) -> Result<()> {
        Err(BridgeError::Unsupported("sendToReceiver".into()))
    }
}

/// Host-side entry points.
///
/// Validates arguments, forwards to the backend and logs at the configured
/// verbosity. Backend errors are logged and returned, never swallowed.
/// When the backend is unsupported every call is a no-op success.
pub struct Web3Bridge<B: BridgeBackend> {
    backend: B,
    config: HostConfig,
}

impl<B: BridgeBackend> Web3Bridge<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, HostConfig::default())
    }

    pub fn with_config(backend: B, config: HostConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    fn log(&self, level: LogLevel, message: impl fmt::Display) {
        if !self.config.log_level.admits(level) {
            return;
        }
        match level {
            LogLevel::Error => error!("[Web3Bridge] {}", message),
            LogLevel::Warning => warn!("[Web3Bridge] {}", message),
            LogLevel::Info => info!("[Web3Bridge] {}", message),
            LogLevel::Verbose => debug!("[Web3Bridge] {}", message),
            LogLevel::None => {}
        }
    }

    fn require(&self, name: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            let err = BridgeError::InvalidArgument(format!("{} cannot be empty", name));
            self.log(LogLevel::Error, &err);
            return Err(err);
        }
        Ok(())
    }

    /// Skip the call entirely when the environment cannot run it
    fn skipped(&self, operation: &str) -> bool {
        if self.backend.is_supported() {
            return false;
        }
        self.log(
            LogLevel::Info,
            format_args!("{} skipped: bridge not available in this environment", operation),
        );
        true
    }

    fn reported<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.log(LogLevel::Error, format_args!("{} exception: {}", operation, e));
        }
        result
    }

    /// Initialize the browser bridge; `true` when it reports success
    pub async fn init(&self, options_json: &str) -> Result<bool> {
        self.require("optionsJson", options_json)?;
        if self.skipped("Init") {
            return Ok(true);
        }
        self.log(LogLevel::Verbose, format_args!("Init: {}", options_json));

        let ok = self.reported("Init", self.backend.init(options_json).await)?;
        if ok {
            self.log(LogLevel::Info, "Initialized");
        } else {
            self.log(LogLevel::Warning, "Init reported failure");
        }
        Ok(ok)
    }

    pub async fn apply_theme(&self, theme_json: &str) -> Result<()> {
        self.require("themeJson", theme_json)?;
        if self.skipped("ApplyTheme") {
            return Ok(());
        }
        self.log(LogLevel::Verbose, format_args!("ApplyTheme: {}", theme_json));
        self.reported("ApplyTheme", self.backend.apply_theme(theme_json).await)
    }

    /// Outcome arrives later as `OnConnected` or `OnConnectError`
    pub async fn connect(&self) -> Result<()> {
        if self.skipped("Connect") {
            return Ok(());
        }
        self.log(LogLevel::Info, "Connect requested");
        self.reported("Connect", self.backend.connect().await)
    }

    /// Outcome arrives later as `OnDisconnected` or `OnDisconnectError`
    pub async fn disconnect_all(&self) -> Result<()> {
        if self.skipped("DisconnectAll") {
            return Ok(());
        }
        self.log(LogLevel::Info, "Disconnect requested");
        self.reported("DisconnectAll", self.backend.disconnect_all().await)
    }

    /// Sign `message`; the result goes to the configured receiver's
    /// `OnSignMessageResult`
    pub async fn sign_message(&self, message: &str) -> Result<()> {
        let receiver = self.config.receiver_name.clone();
        self.sign_message_to(message, &receiver, SIGN_RESULT_METHOD)
            .await
    }

    /// Sign `message`, replying to a caller-chosen `object.method`
    pub async fn sign_message_to(&self, message: &str, object: &str, method: &str) -> Result<()> {
        self.require("message", message)?;
        self.require("receiver", object)?;
        self.require("method", method)?;
        if self.skipped("SignMessage") {
            return Ok(());
        }
        self.log(
            LogLevel::Verbose,
            format_args!("SignMessage ({} bytes) -> {}.{}", message.len(), object, method),
        );
        self.reported(
            "SignMessage",
            self.backend.sign_message(message, object, method).await,
        )
    }

    /// Publish which host object receives the fixed-name callbacks
    pub async fn set_receiver(&self, name: &str) -> Result<()> {
        self.require("name", name)?;
        if self.skipped("SetReceiver") {
            return Ok(());
        }
        self.log(LogLevel::Verbose, format_args!("SetReceiver: {}", name));
        self.reported("SetReceiver", self.backend.set_receiver(name).await)
    }

    pub async fn send_to_receiver(&self, object: &str, method: &str, payload: &str) -> Result<()> {
        self.require("object", object)?;
        self.require("method", method)?;
        if self.skipped("SendToReceiver") {
            return Ok(());
        }
        self.log(
            LogLevel::Verbose,
            format_args!("SendToReceiver: {}.{}", object, method),
        );
        self.reported(
            "SendToReceiver",
            self.backend.send_to_receiver(object, method, payload).await,
        )
    }

    /// Run one protocol command
    pub async fn execute(&self, command: BridgeCommand) -> Result<()> {
        match command {
            BridgeCommand::Init { options } => {
                if !self.init(&options.to_string()).await? {
                    return Err(BridgeError::Library("Init reported failure".into()));
                }
            }
            BridgeCommand::ApplyTheme { theme } => self.apply_theme(&theme.to_string()).await?,
            BridgeCommand::Connect => self.connect().await?,
            BridgeCommand::DisconnectAll => self.disconnect_all().await?,
            BridgeCommand::SignMessage {
                message,
                receiver,
                method,
            } => self.sign_message_to(&message, &receiver, &method).await?,
            BridgeCommand::SetReceiver { name } => self.set_receiver(&name).await?,
            BridgeCommand::SendToReceiver {
                object,
                method,
                payload,
            } => self.send_to_receiver(&object, &method, &payload).await?,
        }
        Ok(())
    }
}

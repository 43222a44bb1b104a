//! Error types for the wallet bridge

use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Operation invoked before a successful `init`
    #[error("Bridge is not initialized. Call init(...) first.")]
    NotInitialized,

    /// Signing requested with no connected wallet
    #[error("No wallet connected")]
    NoWalletConnected,

    /// Empty or malformed argument at the host boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The wallet-connection library rejected or threw.
    /// Carries the library's own message verbatim.
    #[error("{0}")]
    Library(String),

    /// The library call succeeded but returned nothing usable
    #[error("{0}")]
    MissingData(String),

    /// A guarded operation is already pending
    #[error("Operation already in progress: {0}")]
    OperationInProgress(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Receiver rejected a delivery
    #[error("Receiver error: {0}")]
    Receiver(String),

    /// Style property could not be set
    #[error("Style error: {0}")]
    Style(String),

    /// The host environment cannot execute the call
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl BridgeError {
    /// Message carried by an `...Error` callback.
    ///
    /// Library failures with an empty message fall back to `fallback`.
    pub fn callback_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::SerializationError(err.to_string())
    }
}

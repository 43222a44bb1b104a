//! # web3-bridge-core
//!
//! Core types and traits shared by both halves of the wallet bridge.
//!
//! This crate provides the foundational types used across the bridge:
//! - Error taxonomy
//! - Init options, chains and app metadata
//! - Theme descriptors
//! - Outbound callback names and payloads
//! - Inbound command protocol
//! - The `MessageReceiver` and `BridgeBackend` seams

pub mod backend;
pub mod error;
pub mod log_level;
pub mod message;
pub mod options;
pub mod protocol;
pub mod receiver;
pub mod theme;

pub use backend::BridgeBackend;
pub use error::{BridgeError, Result};
pub use log_level::LogLevel;
pub use message::{Callback, OutboundMessage, ReplyTarget, SignResult};
pub use options::{
    AppMetadata, Chain, DEFAULT_RECEIVER_NAME, InitOptions, ReceiverWiring, RecommendedWallet,
};
pub use protocol::BridgeCommand;
pub use receiver::MessageReceiver;
pub use theme::ThemeDescriptor;

//! # web3-bridge-host
//!
//! The host runtime's view of the wallet bridge.
//!
//! - `Web3Bridge`: validating facade over any `BridgeBackend`
//! - `CallbackHandler` / `HostReceiver`: turn deliveries back into calls

pub mod callbacks;
pub mod facade;

pub use callbacks::{
    CallbackHandler, HostReceiver, LoggingCallbacks, SIGN_RESULT_METHOD, dispatch_callback,
};
pub use facade::{HostConfig, UnsupportedBackend, Web3Bridge};

//! Browser-side wallet bridge
//!
//! This crate provides:
//! - `BridgeSession`: owns the wallet-library handle and the last connected wallet
//! - Wallet-library traits (`WalletLibraryFactory`, `WalletLibrary`, `WalletProvider`)
//! - Receiver resolution with global fallbacks
//! - Theme application onto the document root
//! - `CommandDispatcher`, the JSON command surface the host calls into
//! - In-memory doubles for tests and the sample driver (native only)
//! - A `wasm32` adapter over the page's wallet library, globals and document

pub mod dispatch;
pub mod environment;
pub mod receiver;
pub mod report;
pub mod session;
pub mod theme;
pub mod wallet;

#[cfg(not(target_arch = "wasm32"))]
pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use dispatch::CommandDispatcher;
pub use environment::BrowserEnvironment;
pub use receiver::{GlobalScope, resolve_in_order, resolve_receiver};
pub use report::{DisconnectReport, SuppressedError, ThemeReport};
pub use session::BridgeSession;
pub use theme::{StyleTarget, apply_theme};
pub use wallet::{
    Account, ConnectedWallet, LibraryConfig, ProviderRequest, WalletLibrary,
    WalletLibraryFactory, WalletProvider,
};

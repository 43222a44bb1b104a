//! Partial-failure reports for batch operations
//!
//! Per-entry failures never abort a batch. They are logged and collected here.

use web3_bridge_core::BridgeError;

/// A per-entry failure that was swallowed so the batch could continue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressedError {
    /// Theme key, wallet label or module name
    pub entry: String,
    pub error: BridgeError,
}

impl SuppressedError {
    pub fn new(entry: impl Into<String>, error: BridgeError) -> Self {
        Self {
            entry: entry.into(),
            error,
        }
    }
}

/// Outcome of applying a theme
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeReport {
    pub applied: Vec<String>,
    pub suppressed: Vec<SuppressedError>,
}

/// Outcome of disconnecting every tracked wallet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectReport {
    pub disconnected: Vec<String>,
    pub suppressed: Vec<SuppressedError>,
}

impl DisconnectReport {
    pub fn is_clean(&self) -> bool {
        self.suppressed.is_empty()
    }
}

//! Theme application onto the document root

use crate::report::{SuppressedError, ThemeReport};
use tracing::{debug, warn};
use web3_bridge_core::{Result, ThemeDescriptor};

/// The document root's inline style
pub trait StyleTarget {
    fn set_property(&self, key: &str, value: &str) -> Result<()>;
}

/// Set every entry; a failing key never stops the rest
pub fn apply_theme(target: &dyn StyleTarget, theme: &ThemeDescriptor) -> ThemeReport {
    let mut report = ThemeReport::default();

    for (key, value) in theme.iter() {
        match target.set_property(key, value) {
            Ok(()) => report.applied.push(key.to_string()),
            Err(e) => {
                warn!("Skipping theme property {}: {}", key, e);
                report.suppressed.push(SuppressedError::new(key, e));
            }
        }
    }

    debug!(
        "Applied {} theme properties ({} skipped)",
        report.applied.len(),
        report.suppressed.len()
    );
    report
}

//! Message receiver seam

use crate::error::Result;

/// Anything in the host runtime that accepts a named message with one string payload.
///
/// Mirrors the host's `SendMessage(object, method, payload)` primitive.
pub trait MessageReceiver {
    /// Whether this candidate actually exposes a send capability.
    ///
    /// Receiver resolution skips candidates that return `false`.
    fn can_send(&self) -> bool {
        true
    }

    /// Deliver `payload` to `method` on the host object named `object`
    fn send_message(&self, object: &str, method: &str, payload: &str) -> Result<()>;
}

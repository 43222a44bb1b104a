//! Inbound command surface the host facade forwards to

use crate::error::Result;
use async_trait::async_trait;

/// The exported functions of the browser-side bridge, as seen from the host.
///
/// Arguments arrive as JSON strings. Operations whose outcome is reported
/// through callbacks return once the command has been handled; their
/// failures only surface here when the command could not run at all.
#[async_trait(?Send)]
pub trait BridgeBackend {
    /// Whether this environment can execute bridge calls at all.
    /// The facade turns every call into a no-op when it cannot.
    fn is_supported(&self) -> bool {
        true
    }

    /// Initialize from options JSON; `true` if the bridge reports success
    async fn init(&self, options_json: &str) -> Result<bool>;

    /// Apply a theme JSON object of CSS variables
    async fn apply_theme(&self, theme_json: &str) -> Result<()>;

    /// Request a wallet connection
    async fn connect(&self) -> Result<()>;

    /// Disconnect every connected wallet
    async fn disconnect_all(&self) -> Result<()>;

    /// Sign `message`; the JSON result goes to `receiver.method`
    async fn sign_message(&self, message: &str, receiver: &str, method: &str) -> Result<()>;

    /// Name the host object that receives the fixed-name callbacks
    async fn set_receiver(&self, name: &str) -> Result<()>;

    /// Deliver an arbitrary payload through receiver resolution
    async fn send_to_receiver(&self, object: &str, method: &str, payload: &str) -> Result<()>;
}

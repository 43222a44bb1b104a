//! Receiver resolution
//!
//! Order: explicit override, then the nested page global, then the flat
//! page global. The first candidate that can send wins. When none can,
//! the caller drops the message.

use std::rc::Rc;
use web3_bridge_core::MessageReceiver;

/// Nested global the hosting page registers its runtime instance under
pub const NESTED_GLOBAL_PATH: &[&str] = &["MegaMod", "myGameInstance"];

/// Flat global the default page template uses
pub const FLAT_GLOBAL_PATH: &[&str] = &["unityInstance"];

/// Lookup of receivers by property path from the global object
pub trait GlobalScope {
    fn receiver_at(&self, path: &[&str]) -> Option<Rc<dyn MessageReceiver>>;
}

/// A global scope with nothing in it
pub struct NoGlobals;

impl GlobalScope for NoGlobals {
    fn receiver_at(&self, _path: &[&str]) -> Option<Rc<dyn MessageReceiver>> {
        None
    }
}

/// Walk the candidates in resolution order and keep the first that can send.
///
/// `lookup` is only consulted for the global paths, and only as far as needed.
pub fn resolve_in_order<T>(
    explicit: Option<T>,
    lookup: impl Fn(&[&str]) -> Option<T>,
    can_send: impl Fn(&T) -> bool,
) -> Option<T> {
    explicit
        .into_iter()
        .chain(
            [NESTED_GLOBAL_PATH, FLAT_GLOBAL_PATH]
                .into_iter()
                .filter_map(|path| lookup(path)),
        )
        .find(|candidate| can_send(candidate))
}

/// Find a live receiver
pub fn resolve_receiver(
    explicit: Option<&Rc<dyn MessageReceiver>>,
    globals: &dyn GlobalScope,
) -> Option<Rc<dyn MessageReceiver>> {
    resolve_in_order(
        explicit.cloned(),
        |path| globals.receiver_at(path),
        |receiver| receiver.can_send(),
    )
}

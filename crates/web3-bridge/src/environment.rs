//! The page surroundings a session runs in

use crate::receiver::{GlobalScope, NoGlobals};
use crate::theme::StyleTarget;
use std::rc::Rc;

/// Global scope plus the document root style, when there is a document
#[derive(Clone)]
pub struct BrowserEnvironment {
    pub globals: Rc<dyn GlobalScope>,
    pub style: Option<Rc<dyn StyleTarget>>,
}

impl BrowserEnvironment {
    pub fn new(globals: Rc<dyn GlobalScope>, style: Option<Rc<dyn StyleTarget>>) -> Self {
        Self { globals, style }
    }

    /// No globals and no document: themes are skipped and only an
    /// explicit receiver can be reached
    pub fn detached() -> Self {
        Self {
            globals: Rc::new(NoGlobals),
            style: None,
        }
    }
}

impl Default for BrowserEnvironment {
    fn default() -> Self {
        Self::detached()
    }
}

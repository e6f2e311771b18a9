//! Shared application state handed to every request handler.

use std::sync::Arc;

use crate::assets::AssetStore;
use crate::store::EventStore;

/// Cloned per handler (inexpensive Arc clones). Both collaborators sit
/// behind traits so tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub assets: Arc<dyn AssetStore>,
}

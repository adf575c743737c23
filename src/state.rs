//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! carries no canvas data itself; everything mutable lives behind the hub
//! task, reached through the cloneable `HubHandle`.

use std::sync::Arc;

use crate::config::Config;
use crate::services::hub::HubHandle;

#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(hub: HubHandle, config: Config) -> Self {
        Self { hub, config: Arc::new(config) }
    }
}

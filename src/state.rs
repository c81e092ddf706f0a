//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! storage gateway is the only shared resource; the validator and renderer
//! are pure and keep no state here.

use std::sync::Arc;

use crate::storage::UiStore;

/// Clone is required by Axum; the store is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UiStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn UiStore>) -> Self {
        Self { store }
    }
}

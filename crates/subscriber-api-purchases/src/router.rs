//! Router and state for the purchases API.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::post, Extension, Router};
use subscriber_db::PurchaseStore;

use crate::handlers;
use crate::services::reconciler::BatchReconciler;

/// Default request body limit (10 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Shared state for purchase routes.
#[derive(Clone)]
pub struct PurchasesState {
    /// Store the batches are applied to.
    pub store: Arc<dyn PurchaseStore>,
    /// Largest accepted batch body in bytes.
    pub max_body_size: usize,
}

impl PurchasesState {
    /// Create a new `PurchasesState` with the default body limit.
    pub fn new(store: Arc<dyn PurchaseStore>) -> Self {
        Self {
            store,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Override the body limit.
    #[must_use]
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

/// Create the purchases router.
///
/// - POST /purchases - Submit a purchase batch
pub fn purchases_router(state: PurchasesState) -> Router {
    let reconciler = Arc::new(BatchReconciler::new(state.store));

    Router::new()
        .route("/purchases", post(handlers::purchases::submit_purchases))
        .layer(DefaultBodyLimit::max(state.max_body_size))
        .layer(Extension(reconciler))
}

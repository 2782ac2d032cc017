//! Purchase batch reconciliation.
//!
//! This crate provides the `POST /purchases` endpoint. A batch is a
//! tab-separated body with one purchase event per line:
//!
//! ```text
//! customer_id  first  last  address  state  zip  action  product_id  product_name  price  date
//! ```
//!
//! Each line upserts its customer, inserts its product when absent and then
//! creates (`new`) or removes (`canceled`) the subscription, all inside one
//! transaction. Failed lines are rolled back and listed in a 400 response.
//!
//! # Example
//!
//! ```rust,ignore
//! use subscriber_api_purchases::{purchases_router, PurchasesState};
//! use axum::Router;
//!
//! let state = PurchasesState::new(Arc::new(PgPurchaseStore::new(pool)));
//! let app = Router::new().merge(purchases_router(state));
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod validation;

// Re-export public API
pub use error::{ApiError, PurchaseError, StoreError};
pub use models::{BatchOutcome, LineFailure};
pub use router::{purchases_router, PurchasesState, DEFAULT_MAX_BODY_SIZE};
pub use services::reconciler::BatchReconciler;

//! Purchase batch handler.
//!
//! - POST /purchases - apply a tab-separated batch of purchase events

use std::sync::Arc;

use axum::{body::Bytes, Extension};

use crate::error::ApiError;
use crate::models::BatchOutcome;
use crate::services::reconciler::BatchReconciler;

/// POST /purchases
///
/// Apply every line of the body in its own transaction. Responds 200 with an
/// empty body when all lines commit, otherwise 400 with the failed lines.
/// Invalid UTF-8 is replaced rather than rejected.
pub async fn submit_purchases(
    Extension(reconciler): Extension<Arc<BatchReconciler>>,
    body: Bytes,
) -> Result<BatchOutcome, ApiError> {
    let body = String::from_utf8_lossy(&body);
    tracing::debug!(bytes = body.len(), "Received purchase batch");

    reconciler.reconcile_batch(&body).await
}

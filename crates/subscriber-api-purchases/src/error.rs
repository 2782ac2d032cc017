//! Error types for the purchase reconciliation API.
//!
//! Two levels of failure exist. [`PurchaseError`] belongs to a single batch
//! line: it rolls that line back and is reported in the 400 response body.
//! [`ApiError`] aborts the whole request and is rendered as RFC 7807 Problem
//! Details.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use subscriber_db::DbError;
use thiserror::Error;

/// Base URL for error type URIs.
const ERROR_BASE_URL: &str = "https://subscriber.dev/errors/purchases";

/// A store-level failure while applying one line.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected a statement or the connection failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The subscription date could not be read.
    #[error("Invalid subscription date: {0}")]
    InvalidDate(String),

    /// The subscription price is not a decimal number.
    #[error("Invalid subscription price: {0}")]
    InvalidPrice(String),
}

/// Why a single batch line was rolled back.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// The line does not have exactly the expected number of fields.
    #[error("Expected {expected} tab-separated fields, found {found}")]
    MissingFields { expected: usize, found: usize },

    /// The action column is neither `new` nor `canceled`.
    #[error("Unrecognized purchase action: {}", .0.as_deref().unwrap_or("<empty>"))]
    UnrecognizedAction(Option<String>),

    /// A cancellation targeted a subscription that does not exist.
    #[error("No active subscription to cancel")]
    UnknownSubscription,

    /// A new subscription collided with an existing one.
    #[error("Subscription already exists")]
    DuplicateSubscription,

    /// Any other storage failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<DbError> for PurchaseError {
    fn from(err: DbError) -> Self {
        PurchaseError::Store(StoreError::Database(err))
    }
}

impl PurchaseError {
    /// The error kind reported to callers in the `error` field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PurchaseError::MissingFields { .. } => "MissingFields",
            PurchaseError::UnrecognizedAction(_) => "UnrecognizedAction",
            PurchaseError::UnknownSubscription => "UnknownSubscription",
            PurchaseError::DuplicateSubscription => "DuplicateSubscription",
            PurchaseError::Store(_) => "StoreError",
        }
    }
}

/// RFC 7807 Problem Details structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI identifying the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// Short human-readable summary.
    pub title: String,

    /// HTTP status code.
    pub status: u16,

    /// Human-readable explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProblemDetails {
    /// Create a new `ProblemDetails` instance.
    #[must_use]
    pub fn new(error_type: &str, title: &str, status: StatusCode) -> Self {
        Self {
            error_type: format!("{ERROR_BASE_URL}/{error_type}"),
            title: title.to_string(),
            status: status.as_u16(),
            detail: None,
        }
    }

    /// Add detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Request-level errors. No line of the batch is reported when one occurs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A store session could not be opened for the batch.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] DbError),
}

impl ApiError {
    /// Convert to `ProblemDetails`.
    pub fn to_problem_details(&self) -> ProblemDetails {
        match self {
            ApiError::StoreUnavailable(err) => {
                tracing::error!(error = %err, "Could not open a store session for the batch");
                ProblemDetails::new(
                    "store-unavailable",
                    "Store Unavailable",
                    StatusCode::SERVICE_UNAVAILABLE,
                )
                .with_detail("The subscription store is unavailable. No line was applied.")
            }
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let problem = self.to_problem_details();

        let mut response = (status, Json(problem)).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );

        response
    }
}

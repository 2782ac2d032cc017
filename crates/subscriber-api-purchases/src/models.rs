//! Request and response models for the purchases API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subscriber_db::models::{CreateProduct, UpsertCustomer};

use crate::error::PurchaseError;

/// Number of tab-separated fields in a purchase record.
pub const RECORD_FIELDS: usize = 11;

/// One split line: `None` stands for an empty field.
pub type RawRow = Vec<Option<String>>;

/// What a purchase record does to the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseAction {
    /// Start a subscription.
    New,
    /// End a subscription.
    Canceled,
}

impl PurchaseAction {
    /// Resolve the action column. Matching is exact and case-sensitive.
    pub fn parse(value: Option<&str>) -> Result<Self, PurchaseError> {
        match value {
            Some("new") => Ok(Self::New),
            Some("canceled") => Ok(Self::Canceled),
            other => Err(PurchaseError::UnrecognizedAction(other.map(str::to_string))),
        }
    }
}

/// A purchase record whose arity has been checked.
///
/// Action, price and date stay raw; they are resolved after the customer and
/// product writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub customer: UpsertCustomer,
    pub product: CreateProduct,
    pub action: Option<String>,
    pub price: Option<String>,
    pub date: Option<String>,
}

impl PurchaseRecord {
    /// Build a record from a split line.
    pub fn from_fields(fields: &[Option<String>]) -> Result<Self, PurchaseError> {
        let [
            customer_id,
            first_name,
            last_name,
            address,
            state,
            zip_code,
            action,
            product_id,
            product_name,
            price,
            date,
        ] = fields
        else {
            return Err(PurchaseError::MissingFields {
                expected: RECORD_FIELDS,
                found: fields.len(),
            });
        };

        Ok(Self {
            customer: UpsertCustomer {
                customer_id: customer_id.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                address: address.clone(),
                state: state.clone(),
                zip_code: zip_code.clone(),
            },
            product: CreateProduct {
                product_id: product_id.clone(),
                name: product_name.clone(),
            },
            action: action.clone(),
            price: price.clone(),
            date: date.clone(),
        })
    }

    /// The subscription key this record targets.
    #[must_use]
    pub fn subscription_key(&self) -> (Option<&str>, Option<&str>) {
        (
            self.customer.customer_id.as_deref(),
            self.product.product_id.as_deref(),
        )
    }
}

/// A failed line as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineFailure {
    /// 1-based line number in the submitted body.
    pub line: usize,
    /// The split fields of the line.
    pub row: RawRow,
    /// Error kind, e.g. `DuplicateSubscription`.
    pub error: &'static str,
}

/// Result of reconciling one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Non-blank lines seen.
    pub lines: usize,
    /// Lines whose writes were committed.
    pub committed: usize,
    /// Failed lines in the order they failed.
    pub failures: Vec<LineFailure>,
}

impl BatchOutcome {
    /// Fold one line result into the outcome.
    #[must_use]
    pub fn record(
        mut self,
        line: usize,
        row: RawRow,
        result: Result<(), &PurchaseError>,
    ) -> Self {
        self.lines += 1;
        match result {
            Ok(()) => self.committed += 1,
            Err(err) => self.failures.push(LineFailure {
                line,
                row,
                error: err.kind(),
            }),
        }
        self
    }

    /// Whether every line was committed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl IntoResponse for BatchOutcome {
    fn into_response(self) -> Response {
        if self.is_success() {
            StatusCode::OK.into_response()
        } else {
            (StatusCode::BAD_REQUEST, Json(self.failures)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: &[&str]) -> RawRow {
        values
            .iter()
            .map(|v| (!v.is_empty()).then(|| (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(PurchaseAction::parse(Some("new")).unwrap(), PurchaseAction::New);
        assert_eq!(
            PurchaseAction::parse(Some("canceled")).unwrap(),
            PurchaseAction::Canceled
        );
        assert!(matches!(
            PurchaseAction::parse(Some("cancelled")),
            Err(PurchaseError::UnrecognizedAction(Some(ref v))) if v == "cancelled"
        ));
        assert!(matches!(
            PurchaseAction::parse(Some("New")),
            Err(PurchaseError::UnrecognizedAction(_))
        ));
        assert!(matches!(
            PurchaseAction::parse(None),
            Err(PurchaseError::UnrecognizedAction(None))
        ));
    }

    #[test]
    fn test_record_from_fields() {
        let row = fields(&[
            "C1", "Ada", "", "1 Main St", "CA", "90001", "new", "P1", "Widget", "9.99",
            "2024-01-01",
        ]);
        let record = PurchaseRecord::from_fields(&row).unwrap();
        assert_eq!(record.customer.customer_id.as_deref(), Some("C1"));
        assert_eq!(record.customer.last_name, None);
        assert_eq!(record.product.name.as_deref(), Some("Widget"));
        assert_eq!(record.action.as_deref(), Some("new"));
        assert_eq!(record.subscription_key(), (Some("C1"), Some("P1")));
    }

    #[test]
    fn test_record_arity() {
        let short = fields(&["C1", "Ada"]);
        assert!(matches!(
            PurchaseRecord::from_fields(&short),
            Err(PurchaseError::MissingFields {
                expected: 11,
                found: 2
            })
        ));

        let long = fields(&["x"; 12]);
        assert!(matches!(
            PurchaseRecord::from_fields(&long),
            Err(PurchaseError::MissingFields { found: 12, .. })
        ));
    }

    #[test]
    fn test_outcome_fold() {
        let outcome = BatchOutcome::default()
            .record(1, fields(&["a"]), Ok(()))
            .record(3, fields(&["b", ""]), Err(&PurchaseError::UnknownSubscription));

        assert_eq!(outcome.lines, 2);
        assert_eq!(outcome.committed, 1);
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.failures,
            vec![LineFailure {
                line: 3,
                row: vec![Some("b".to_string()), None],
                error: "UnknownSubscription",
            }]
        );
    }

    #[test]
    fn test_failure_serialization() {
        let failure = LineFailure {
            line: 2,
            row: vec![Some("C1".to_string()), None],
            error: "MissingFields",
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"line": 2, "row": ["C1", null], "error": "MissingFields"})
        );
    }
}

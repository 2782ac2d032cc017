//! Batch reconciliation of purchase records.
//!
//! Every line runs in its own transaction on a session that lives for the
//! whole batch:
//!
//! `Parsed -> Validated -> CustomerWritten -> ProductWritten ->
//! SubscriptionResolved -> Committed`, or `RolledBack` from any stage.
//!
//! A failed line is rolled back and reported; later lines still run.

use std::fmt;
use std::sync::Arc;

use subscriber_db::models::CreateSubscription;
use subscriber_db::{PurchaseStore, StoreSession, StoreTransaction};

use crate::error::{ApiError, PurchaseError};
use crate::models::{BatchOutcome, PurchaseAction, PurchaseRecord};
use crate::services::batch_parser::split_batch;
use crate::validation::{parse_price, parse_subscription_date};

/// Last stage a line reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStage {
    Parsed,
    Validated,
    CustomerWritten,
    ProductWritten,
    SubscriptionResolved,
    Committed,
}

impl fmt::Display for LineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineStage::Parsed => "parsed",
            LineStage::Validated => "validated",
            LineStage::CustomerWritten => "customer_written",
            LineStage::ProductWritten => "product_written",
            LineStage::SubscriptionResolved => "subscription_resolved",
            LineStage::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// A line that was rolled back, with the stage it had reached.
#[derive(Debug)]
pub struct RolledBack {
    pub stage: LineStage,
    pub error: PurchaseError,
}

/// Applies purchase batches to a [`PurchaseStore`].
#[derive(Clone)]
pub struct BatchReconciler {
    store: Arc<dyn PurchaseStore>,
}

impl BatchReconciler {
    /// Create a reconciler over a store.
    pub fn new(store: Arc<dyn PurchaseStore>) -> Self {
        Self { store }
    }

    /// Reconcile a raw batch body.
    ///
    /// Only failing to open the store session is fatal; every per-line
    /// failure ends up in [`BatchOutcome::failures`].
    pub async fn reconcile_batch(&self, body: &str) -> Result<BatchOutcome, ApiError> {
        let mut session = self.store.open().await.map_err(ApiError::StoreUnavailable)?;

        let mut results = Vec::new();
        for line in split_batch(body) {
            let result = apply_line(session.as_mut(), &line.fields).await;
            if let Err(rolled_back) = &result {
                tracing::warn!(
                    line = line.number,
                    error = rolled_back.error.kind(),
                    stage = %rolled_back.stage,
                    detail = %rolled_back.error,
                    "Purchase line rolled back"
                );
            }
            results.push((line, result));
        }

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to close store session cleanly");
        }

        let outcome = results
            .into_iter()
            .fold(BatchOutcome::default(), |outcome, (line, result)| {
                let result = result.map_err(|rolled_back| rolled_back.error);
                outcome.record(line.number, line.fields, result.as_ref().copied())
            });

        tracing::info!(
            lines = outcome.lines,
            committed = outcome.committed,
            failed = outcome.failures.len(),
            "Purchase batch reconciled"
        );

        Ok(outcome)
    }
}

/// Apply one line inside its own transaction.
pub async fn apply_line(
    session: &mut dyn StoreSession,
    fields: &[Option<String>],
) -> Result<(), RolledBack> {
    let record = PurchaseRecord::from_fields(fields).map_err(|error| RolledBack {
        stage: LineStage::Parsed,
        error,
    })?;

    let mut stage = LineStage::Validated;
    let mut tx = session.begin().await.map_err(|e| RolledBack {
        stage,
        error: e.into(),
    })?;

    match write_record(tx.as_mut(), &record, &mut stage).await {
        Ok(()) => {
            tx.commit().await.map_err(|e| RolledBack {
                stage,
                error: e.into(),
            })?;
            tracing::debug!(
                customer_id = ?record.customer.customer_id,
                product_id = ?record.product.product_id,
                stage = %LineStage::Committed,
                "Purchase line committed"
            );
            Ok(())
        }
        Err(error) => {
            if let Err(e) = tx.rollback().await {
                tracing::error!(error = %e, stage = %stage, "Rollback failed");
            }
            Err(RolledBack { stage, error })
        }
    }
}

/// Customer upsert, product insert, then the subscription change.
async fn write_record(
    tx: &mut dyn StoreTransaction,
    record: &PurchaseRecord,
    stage: &mut LineStage,
) -> Result<(), PurchaseError> {
    tx.upsert_customer(&record.customer).await?;
    *stage = LineStage::CustomerWritten;

    tx.insert_product(&record.product).await?;
    *stage = LineStage::ProductWritten;

    let (customer_id, product_id) = record.subscription_key();
    match PurchaseAction::parse(record.action.as_deref())? {
        PurchaseAction::New => {
            let subscription = CreateSubscription {
                customer_id: customer_id.map(str::to_string),
                product_id: product_id.map(str::to_string),
                subscription_date: parse_subscription_date(record.date.as_deref())?,
                subscription_price: parse_price(record.price.as_deref())?,
            };
            tx.insert_subscription(&subscription).await.map_err(|e| {
                if e.is_unique_violation() {
                    PurchaseError::DuplicateSubscription
                } else {
                    e.into()
                }
            })?;
        }
        PurchaseAction::Canceled => {
            let removed = tx.delete_subscription(customer_id, product_id).await?;
            if removed == 0 {
                return Err(PurchaseError::UnknownSubscription);
            }
        }
    }
    *stage = LineStage::SubscriptionResolved;

    Ok(())
}

//! Store traits used by the reconciler.
//!
//! A [`PurchaseStore`] is a connection factory. Each [`StoreSession`] it opens
//! owns one connection for its whole lifetime. Writes go through a
//! [`StoreTransaction`] borrowed from the session, so at most one transaction
//! is open per connection.

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{CreateProduct, CreateSubscription, UpsertCustomer};

/// Connection factory for the purchase tables.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Acquire a dedicated session.
    ///
    /// The connection goes back to its owner when the session is closed or
    /// dropped.
    async fn open(&self) -> Result<Box<dyn StoreSession>, DbError>;

    /// Lightweight liveness check.
    async fn ping(&self) -> Result<(), DbError>;
}

/// A client bound to a single connection.
#[async_trait]
pub trait StoreSession: Send {
    /// Start a transaction on the session's connection.
    async fn begin<'s>(&'s mut self) -> Result<Box<dyn StoreTransaction + 's>, DbError>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> Result<(), DbError>;
}

/// An open transaction.
///
/// Writes become visible together on [`commit`](StoreTransaction::commit).
/// Dropping the transaction without committing rolls it back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Insert a customer or refresh its address/state/zip.
    async fn upsert_customer(&mut self, customer: &UpsertCustomer) -> Result<(), DbError>;

    /// Insert a product when absent. Returns `true` if a row was written.
    async fn insert_product(&mut self, product: &CreateProduct) -> Result<bool, DbError>;

    /// Insert a subscription. An existing key yields [`DbError::UniqueViolation`].
    async fn insert_subscription(
        &mut self,
        subscription: &CreateSubscription,
    ) -> Result<(), DbError>;

    /// Delete a subscription, returning the number of rows removed.
    async fn delete_subscription(
        &mut self,
        customer_id: Option<&str>,
        product_id: Option<&str>,
    ) -> Result<u64, DbError>;

    /// Commit the transaction.
    async fn commit(self: Box<Self>) -> Result<(), DbError>;

    /// Roll the transaction back.
    async fn rollback(self: Box<Self>) -> Result<(), DbError>;
}

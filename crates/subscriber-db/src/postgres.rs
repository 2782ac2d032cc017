//! PostgreSQL implementation of the store traits.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgPool, Postgres, Transaction};

use crate::error::DbError;
use crate::models::{
    CreateProduct, CreateSubscription, Customer, Product, Subscription, UpsertCustomer,
};
use crate::store::{PurchaseStore, StoreSession, StoreTransaction};

/// Store backed by a `PgPool`.
#[derive(Debug, Clone)]
pub struct PgPurchaseStore {
    pool: PgPool,
}

impl PgPurchaseStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseStore for PgPurchaseStore {
    async fn open(&self) -> Result<Box<dyn StoreSession>, DbError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(DbError::ConnectionFailed)?;

        Ok(Box::new(PgSession { conn }))
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DbError::from_query)?;
        Ok(())
    }
}

/// A session holding one pooled connection until it is closed or dropped.
#[derive(Debug)]
pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl StoreSession for PgSession {
    async fn begin<'s>(&'s mut self) -> Result<Box<dyn StoreTransaction + 's>, DbError> {
        let tx = self.conn.begin().await.map_err(DbError::from_query)?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        // Dropping the pooled connection returns it to the pool.
        drop(self);
        Ok(())
    }
}

/// A transaction on a session's connection. sqlx rolls it back on drop.
pub struct PgTransaction<'c> {
    tx: Transaction<'c, Postgres>,
}

#[async_trait]
impl<'c> StoreTransaction for PgTransaction<'c> {
    async fn upsert_customer(&mut self, customer: &UpsertCustomer) -> Result<(), DbError> {
        Customer::upsert(&mut *self.tx, customer)
            .await
            .map_err(DbError::from_query)?;
        Ok(())
    }

    async fn insert_product(&mut self, product: &CreateProduct) -> Result<bool, DbError> {
        Product::insert_if_absent(&mut *self.tx, product)
            .await
            .map_err(DbError::from_query)
    }

    async fn insert_subscription(
        &mut self,
        subscription: &CreateSubscription,
    ) -> Result<(), DbError> {
        Subscription::create(&mut *self.tx, subscription)
            .await
            .map_err(DbError::from_query)
    }

    async fn delete_subscription(
        &mut self,
        customer_id: Option<&str>,
        product_id: Option<&str>,
    ) -> Result<u64, DbError> {
        Subscription::delete(&mut *self.tx, customer_id, product_id)
            .await
            .map_err(DbError::from_query)
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.tx.commit().await.map_err(DbError::from_query)
    }

    async fn rollback(self: Box<Self>) -> Result<(), DbError> {
        self.tx.rollback().await.map_err(DbError::from_query)
    }
}

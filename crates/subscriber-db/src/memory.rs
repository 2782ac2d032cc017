//! In-memory store for service and HTTP tests.
//!
//! A transaction snapshots the committed tables on `begin` and publishes the
//! snapshot on `commit`. Sessions are not isolated from each other: the last
//! commit wins, which is enough for tests that drive one batch at a time.
//!
//! Failures can be injected: the store can refuse connections, fail the
//! n-th write from now, or fail every rollback.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{
    CreateProduct, CreateSubscription, Customer, Product, Subscription, UpsertCustomer,
};
use crate::store::{PurchaseStore, StoreSession, StoreTransaction};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Tables {
    customers: BTreeMap<String, Customer>,
    products: BTreeMap<String, Product>,
    subscriptions: BTreeMap<(String, String), Subscription>,
}

impl Tables {
    fn upsert_customer(&mut self, data: &UpsertCustomer) -> Result<(), DbError> {
        let row = data.to_row().ok_or_else(|| {
            DbError::ConstraintViolation("customers.customer_id must not be null".to_string())
        })?;
        let row = match self.customers.remove(&row.customer_id) {
            Some(existing) => existing.refreshed(data),
            None => row,
        };
        self.customers.insert(row.customer_id.clone(), row);
        Ok(())
    }

    fn insert_product(&mut self, data: &CreateProduct) -> Result<bool, DbError> {
        let product_id = data.product_id.clone().ok_or_else(|| {
            DbError::ConstraintViolation("products.product_id must not be null".to_string())
        })?;
        if self.products.contains_key(&product_id) {
            return Ok(false);
        }
        self.products.insert(
            product_id.clone(),
            Product {
                product_id,
                product_name: data.name.clone(),
            },
        );
        Ok(true)
    }

    fn insert_subscription(&mut self, data: &CreateSubscription) -> Result<(), DbError> {
        let (Some(customer_id), Some(product_id)) = (&data.customer_id, &data.product_id) else {
            return Err(DbError::ConstraintViolation(
                "subscribers key must not be null".to_string(),
            ));
        };
        if !self.customers.contains_key(customer_id) || !self.products.contains_key(product_id) {
            return Err(DbError::ConstraintViolation(
                "subscribers references a missing customer or product".to_string(),
            ));
        }
        let key = (customer_id.clone(), product_id.clone());
        if self.subscriptions.contains_key(&key) {
            return Err(DbError::UniqueViolation("subscribers_pkey".to_string()));
        }
        self.subscriptions.insert(
            key,
            Subscription {
                customer_id: customer_id.clone(),
                product_id: product_id.clone(),
                subscription_date: data.subscription_date,
                subscription_price: data.subscription_price,
            },
        );
        Ok(())
    }

    fn delete_subscription(&mut self, customer_id: Option<&str>, product_id: Option<&str>) -> u64 {
        let (Some(customer_id), Some(product_id)) = (customer_id, product_id) else {
            return 0;
        };
        let key = (customer_id.to_string(), product_id.to_string());
        u64::from(self.subscriptions.remove(&key).is_some())
    }
}

#[derive(Debug, Default)]
struct Shared {
    tables: Mutex<Tables>,
    open_sessions: AtomicUsize,
    unavailable: AtomicBool,
    // 0 disables; 1 fails the next write.
    writes_until_failure: AtomicUsize,
    fail_rollbacks: AtomicBool,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_write(&self) -> Result<(), DbError> {
        let previous =
            self.writes_until_failure
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match previous {
            Ok(1) => Err(connection_reset()),
            _ => Ok(()),
        }
    }
}

fn connection_reset() -> DbError {
    DbError::ConnectionFailed(sqlx::Error::Io(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    )))
}

/// Thread-safe in-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` and `ping` fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the `n`-th write from now (1-based) with a lost connection.
    /// `0` clears a pending failure.
    pub fn fail_write(&self, n: usize) {
        self.shared.writes_until_failure.store(n, Ordering::SeqCst);
    }

    /// Make every rollback report a lost connection. Staged writes are still
    /// discarded.
    pub fn set_rollback_failure(&self, fail: bool) {
        self.shared.fail_rollbacks.store(fail, Ordering::SeqCst);
    }

    /// Number of sessions currently holding a connection.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.shared.open_sessions.load(Ordering::SeqCst)
    }

    /// Committed customer row.
    #[must_use]
    pub fn customer(&self, customer_id: &str) -> Option<Customer> {
        self.shared.tables().customers.get(customer_id).cloned()
    }

    /// Committed product row.
    #[must_use]
    pub fn product(&self, product_id: &str) -> Option<Product> {
        self.shared.tables().products.get(product_id).cloned()
    }

    /// Committed subscription row.
    #[must_use]
    pub fn subscription(&self, customer_id: &str, product_id: &str) -> Option<Subscription> {
        let key = (customer_id.to_string(), product_id.to_string());
        self.shared.tables().subscriptions.get(&key).cloned()
    }

    /// Row counts as `(customers, products, subscriptions)`.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        let tables = self.shared.tables();
        (
            tables.customers.len(),
            tables.products.len(),
            tables.subscriptions.len(),
        )
    }

    fn check_available(&self) -> Result<(), DbError> {
        if self.shared.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionFailed(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl PurchaseStore for MemoryStore {
    async fn open(&self) -> Result<Box<dyn StoreSession>, DbError> {
        self.check_available()?;
        self.shared.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.check_available()
    }
}

/// Session over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySession {
    shared: Arc<Shared>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn begin<'s>(&'s mut self) -> Result<Box<dyn StoreTransaction + 's>, DbError> {
        let staged = self.shared.tables().clone();
        Ok(Box::new(MemoryTransaction {
            shared: &self.shared,
            staged,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.shared.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Transaction over a snapshot of the committed tables.
#[derive(Debug)]
pub struct MemoryTransaction<'s> {
    shared: &'s Shared,
    staged: Tables,
}

#[async_trait]
impl<'s> StoreTransaction for MemoryTransaction<'s> {
    async fn upsert_customer(&mut self, customer: &UpsertCustomer) -> Result<(), DbError> {
        self.shared.check_write()?;
        self.staged.upsert_customer(customer)
    }

    async fn insert_product(&mut self, product: &CreateProduct) -> Result<bool, DbError> {
        self.shared.check_write()?;
        self.staged.insert_product(product)
    }

    async fn insert_subscription(
        &mut self,
        subscription: &CreateSubscription,
    ) -> Result<(), DbError> {
        self.shared.check_write()?;
        self.staged.insert_subscription(subscription)
    }

    async fn delete_subscription(
        &mut self,
        customer_id: Option<&str>,
        product_id: Option<&str>,
    ) -> Result<u64, DbError> {
        self.shared.check_write()?;
        Ok(self.staged.delete_subscription(customer_id, product_id))
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        let MemoryTransaction { shared, staged } = *self;
        *shared.tables() = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DbError> {
        if self.shared.fail_rollbacks.load(Ordering::SeqCst) {
            return Err(connection_reset());
        }
        Ok(())
    }
}

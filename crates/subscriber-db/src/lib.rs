//! Storage layer for the subscriber purchase tables.
//!
//! # Modules
//!
//! - [`models`] - Row types for `customers`, `products` and `subscribers`
//! - [`store`] - The connection-factory, session and transaction traits the reconciler drives
//! - [`postgres`] - `PgPool`-backed implementation
//! - [`memory`] - In-memory implementation (feature `memory`)
//! - [`error`] - Error classification (`DbError`)
//!
//! # Example
//!
//! ```rust,ignore
//! use subscriber_db::{PgPurchaseStore, PurchaseStore};
//!
//! let store = PgPurchaseStore::new(pool);
//! let mut session = store.open().await?;
//! let mut tx = session.begin().await?;
//! tx.upsert_customer(&customer).await?;
//! tx.commit().await?;
//! session.close().await?;
//! ```

pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use error::DbError;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use postgres::{PgPurchaseStore, PgSession, PgTransaction};
pub use store::{PurchaseStore, StoreSession, StoreTransaction};

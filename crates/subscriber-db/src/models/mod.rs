//! Row models for the `customers`, `products` and `subscribers` tables.

pub mod customer;
pub mod product;
pub mod subscription;

pub use customer::{Customer, UpsertCustomer};
pub use product::{CreateProduct, Product};
pub use subscription::{CreateSubscription, Subscription};

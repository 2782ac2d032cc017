//! Active subscription model.
//!
//! A row exists only while the customer is subscribed to the product;
//! cancellation deletes it outright.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// An active subscription keyed by `(customer_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub customer_id: String,
    pub product_id: String,
    pub subscription_date: NaiveDateTime,
    pub subscription_price: Option<Decimal>,
}

/// Data for creating a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscription {
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub subscription_date: NaiveDateTime,
    pub subscription_price: Option<Decimal>,
}

impl Subscription {
    /// Insert a subscription. An existing row for the key is a unique violation.
    pub async fn create<'e, E>(executor: E, data: &CreateSubscription) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            INSERT INTO subscribers (
                customer_id,
                product_id,
                subscription_date,
                subscription_price
            )
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&data.customer_id)
        .bind(&data.product_id)
        .bind(data.subscription_date)
        .bind(data.subscription_price)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Delete the subscription for a key, returning the number of rows removed.
    pub async fn delete<'e, E>(
        executor: E,
        customer_id: Option<&str>,
        product_id: Option<&str>,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            DELETE FROM subscribers
            WHERE customer_id = $1 AND product_id = $2
            ",
        )
        .bind(customer_id)
        .bind(product_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Find the subscription for a key.
    pub async fn find<'e, E>(
        executor: E,
        customer_id: &str,
        product_id: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            r"
            SELECT customer_id, product_id, subscription_date, subscription_price
            FROM subscribers
            WHERE customer_id = $1 AND product_id = $2
            ",
        )
        .bind(customer_id)
        .bind(product_id)
        .fetch_optional(executor)
        .await
    }
}

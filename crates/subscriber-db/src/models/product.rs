//! Product entity model.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// A product row. Products are never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_name: Option<String>,
}

/// Data for inserting a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateProduct {
    pub product_id: Option<String>,
    pub name: Option<String>,
}

impl Product {
    /// Insert a product unless one with the same id exists.
    ///
    /// Returns `true` when a row was inserted.
    pub async fn insert_if_absent<'e, E>(
        executor: E,
        data: &CreateProduct,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            INSERT INTO products (product_id, product_name)
            VALUES ($1, $2)
            ON CONFLICT (product_id) DO NOTHING
            ",
        )
        .bind(&data.product_id)
        .bind(&data.name)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Find a product by id.
    pub async fn find_by_id<'e, E>(executor: E, product_id: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM products WHERE product_id = $1")
            .bind(product_id)
            .fetch_optional(executor)
            .await
    }
}

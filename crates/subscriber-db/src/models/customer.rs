//! Customer entity model.
//!
//! Name and id are fixed once a customer exists; the postal fields follow the
//! most recent purchase record.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// A customer row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub customer_first_name: Option<String>,
    pub customer_last_name: Option<String>,
    pub customer_address: Option<String>,
    pub customer_state: Option<String>,
    pub customer_zip_code: Option<String>,
}

/// Data for inserting or refreshing a customer.
///
/// Every field may be absent; a missing `customer_id` is rejected by the
/// table's primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertCustomer {
    pub customer_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl Customer {
    /// Insert a customer, or overwrite address/state/zip of an existing one.
    pub async fn upsert<'e, E>(executor: E, data: &UpsertCustomer) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            INSERT INTO customers (
                customer_id,
                customer_first_name,
                customer_last_name,
                customer_address,
                customer_state,
                customer_zip_code
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (customer_id) DO UPDATE SET
                customer_address = EXCLUDED.customer_address,
                customer_state = EXCLUDED.customer_state,
                customer_zip_code = EXCLUDED.customer_zip_code
            ",
        )
        .bind(&data.customer_id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.address)
        .bind(&data.state)
        .bind(&data.zip_code)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Find a customer by id.
    pub async fn find_by_id<'e, E>(
        executor: E,
        customer_id: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as("SELECT * FROM customers WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_optional(executor)
            .await
    }

    /// Apply an upsert to an existing row, keeping the immutable fields.
    #[must_use]
    pub fn refreshed(mut self, data: &UpsertCustomer) -> Self {
        self.customer_address.clone_from(&data.address);
        self.customer_state.clone_from(&data.state);
        self.customer_zip_code.clone_from(&data.zip_code);
        self
    }
}

impl UpsertCustomer {
    /// Build the row this upsert creates when the customer is new.
    ///
    /// Returns `None` when the id is absent.
    #[must_use]
    pub fn to_row(&self) -> Option<Customer> {
        Some(Customer {
            customer_id: self.customer_id.clone()?,
            customer_first_name: self.first_name.clone(),
            customer_last_name: self.last_name.clone(),
            customer_address: self.address.clone(),
            customer_state: self.state.clone(),
            customer_zip_code: self.zip_code.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(address: &str) -> UpsertCustomer {
        UpsertCustomer {
            customer_id: Some("C1".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            address: Some(address.to_string()),
            state: Some("CA".to_string()),
            zip_code: None,
        }
    }

    #[test]
    fn test_refreshed_keeps_name() {
        let row = upsert("1 Main St").to_row().unwrap();
        let mut changed = upsert("2 Side St");
        changed.first_name = Some("Grace".to_string());

        let row = row.refreshed(&changed);
        assert_eq!(row.customer_first_name.as_deref(), Some("Ada"));
        assert_eq!(row.customer_address.as_deref(), Some("2 Side St"));
        assert_eq!(row.customer_zip_code, None);
    }

    #[test]
    fn test_to_row_requires_id() {
        let mut data = upsert("1 Main St");
        data.customer_id = None;
        assert!(data.to_row().is_none());
    }
}

//! Customer records
//!
//! The dispatcher never reads customers itself; callers use a
//! [`CustomerStore`] to turn the customer IDs a user selected into recipient
//! addresses before dispatching.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;
use validator::Validate;

/// Errors returned by customer stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// New customer failed validation
    #[error("invalid customer: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Another customer already uses this email
    #[error("a customer with email {0} already exists")]
    DuplicateEmail(String),
}

/// A stored customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    /// Customer ID
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

/// A customer to be inserted
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCustomer {
    /// Display name
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Email address
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Phone number
    pub phone: Option<String>,
}

/// Keyed lookup of customer records
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Fetch the customers with the given IDs, in the order the IDs are
    /// given; unknown IDs are skipped and duplicates collapsed
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Customer>, StoreError>;

    /// Insert a customer
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError>;

    /// Delete a customer, returning whether it existed
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Email addresses for the given IDs, in the order the IDs are given
    async fn emails_for(&self, ids: &[i64]) -> Result<Vec<String>, StoreError> {
        Ok(self
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|customer| customer.email)
            .collect())
    }
}

/// SQLite-backed customer store
#[derive(Debug, Clone)]
pub struct SqliteCustomerStore {
    pool: SqlitePool,
}

impl SqliteCustomerStore {
    /// Wrap an existing pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and create the schema if needed
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(url).await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database, mainly for tests
    pub async fn in_memory() -> Result<Self, StoreError> {
        // One connection: every connection to `sqlite::memory:` is a new database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the `customers` table if it does not exist
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for SqliteCustomerStore {
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Customer>, StoreError> {
        let mut unique: Vec<i64> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }

        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, email, phone, created_at FROM customers WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in &unique {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let mut customers = builder
            .build_query_as::<Customer>()
            .fetch_all(&self.pool)
            .await?;

        customers.sort_by_key(|customer| unique.iter().position(|id| *id == customer.id));
        Ok(customers)
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        customer.validate()?;

        sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (name, email, phone, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, name, email, phone, created_at",
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateEmail(customer.email.clone())
            }
            other => StoreError::Database(other),
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_customer(name: &str, email: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_in_requested_order() {
        let store = SqliteCustomerStore::in_memory().await.unwrap();
        let alice = store.insert(new_customer("Alice", "alice@example.com")).await.unwrap();
        let bob = store.insert(new_customer("Bob", "bob@example.com")).await.unwrap();

        let found = store.find_by_ids(&[bob.id, alice.id]).await.unwrap();
        assert_eq!(found, vec![bob.clone(), alice.clone()]);

        let emails = store.emails_for(&[alice.id, 999, alice.id, bob.id]).await.unwrap();
        assert_eq!(emails, vec!["alice@example.com", "bob@example.com"]);
    }

    #[tokio::test]
    async fn test_find_with_no_ids() {
        let store = SqliteCustomerStore::in_memory().await.unwrap();
        assert!(store.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_requires_name_and_email() {
        let store = SqliteCustomerStore::in_memory().await.unwrap();

        let result = store.insert(new_customer("", "alice@example.com")).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));

        let result = store.insert(new_customer("Alice", "not-an-email")).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = SqliteCustomerStore::in_memory().await.unwrap();
        store.insert(new_customer("Alice", "alice@example.com")).await.unwrap();

        let result = store.insert(new_customer("Alice 2", "alice@example.com")).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail(email)) if email == "alice@example.com"));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = SqliteCustomerStore::in_memory().await.unwrap();
        let alice = store.insert(new_customer("Alice", "alice@example.com")).await.unwrap();

        assert!(store.delete(alice.id).await.unwrap());
        assert!(!store.delete(alice.id).await.unwrap());
        assert!(store.find_by_ids(&[alice.id]).await.unwrap().is_empty());
    }
}

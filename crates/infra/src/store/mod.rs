//! Postgres-backed stores.
//!
//! ## Error mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Domain(Conflict)` | Duplicate product name, tracking code or (order, product) line |
//! | Database (check violation) | `23514` | `Domain(InvariantViolation)` | Inventory/quantity/percentage constraint tripped |
//! | Database (foreign key violation) | `23503` | `Domain(NotFound)` | Referenced product/order does not exist |
//! | Database (serialization failure) | `40001` | `Retryable` | Concurrent transaction conflict; safe to re-run |
//! | Database (deadlock detected) | `40P01` | `Retryable` | Lock ordering conflict; safe to re-run |
//! | RowNotFound | N/A | `Domain(NotFound)` | Lookup by id missed |
//! | Other | Any other | `Database` | Pool closed, network failure, corrupt data |
//!
//! Any error aborts the surrounding transaction: the whole operation is
//! rolled back, never partially applied.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopworks_core::DomainError;
use shopworks_orders::TransitionError;

mod discounts;
mod orders;
mod products;
mod reviews;

pub use discounts::NewDiscount;
pub use orders::{
    CustomerIncome, MonthlyIncome, OrderService, OrderView, Page, Paginated, TopSeller,
};
pub use products::CatalogService;
pub use reviews::NewReview;

pub(crate) use orders::{cancel_locked, fetch_order};

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Deterministic domain failure (validation, conflict, not found).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Order lifecycle failure (illegal edge, empty order, stock shortage).
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Transient conflict between concurrent transactions; the operation is
    /// idempotent at this layer and may be retried in full.
    #[error("retryable store conflict: {0}")]
    Retryable(String),

    /// A persisted row violates domain expectations.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Any other database failure; the transaction was rolled back.
    #[error("database error during {operation}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Map a sqlx error per the table in the module docs.
pub(crate) fn map_sqlx_error(operation: &'static str, error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::RowNotFound => StoreError::Domain(DomainError::NotFound),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => StoreError::Domain(DomainError::conflict(db.message().to_string())),
            Some("23514") => StoreError::Domain(DomainError::invariant(db.message().to_string())),
            Some("23503") => StoreError::Domain(DomainError::NotFound),
            Some("40001") | Some("40P01") => StoreError::Retryable(db.message().to_string()),
            _ => StoreError::Database {
                operation,
                source: error,
            },
        },
        _ => StoreError::Database {
            operation,
            source: error,
        },
    }
}

/// Convert a non-negative SQL integer into a domain counter.
pub(crate) fn non_negative(value: i32, field: &'static str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{field} is negative")))
}

/// Connect a pool to the given database URL.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Apply embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database {
            operation: "migrate",
            source: sqlx::Error::Migrate(Box::new(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_domain_not_found() {
        let err = map_sqlx_error("get_order", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Domain(DomainError::NotFound)));
    }

    #[test]
    fn negative_counter_is_corrupt() {
        assert!(non_negative(-1, "inventory").is_err());
        assert_eq!(non_negative(7, "inventory").unwrap(), 7);
    }
}

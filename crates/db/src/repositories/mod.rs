use async_trait::async_trait;
use thiserror::Error;

use rolodex_core::domain::customer::{Customer, CustomerId};
use rolodex_core::pagination::{CustomerPage, PageRequest};

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryCustomerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Store operations over customer records. The two implementations (SQL
/// query pushdown and in-memory full scan) must return identical result
/// sets for the same dataset; `find_similar` in particular resolves the
/// same likely-duplicate relation either way.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Insert or fully replace the record with this customer's id.
    async fn save(&self, customer: Customer) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// All customers ordered by (created_at, id), one page at a time.
    async fn list(&self, request: PageRequest) -> Result<CustomerPage, RepositoryError>;

    /// Customers that are likely duplicates of `probe`: same normalized
    /// email, or same normalized first and last name. A persisted probe
    /// appears in its own result set.
    async fn find_similar(
        &self,
        probe: &Customer,
        request: PageRequest,
    ) -> Result<CustomerPage, RepositoryError>;

    /// Returns whether a record was actually deleted.
    async fn delete(&self, id: &CustomerId) -> Result<bool, RepositoryError>;

    async fn health_check(&self) -> Result<(), RepositoryError>;
}

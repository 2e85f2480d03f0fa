use std::collections::HashMap;

use tokio::sync::RwLock;

use rolodex_core::dedupe::are_customers_likely_duplicates;
use rolodex_core::domain::customer::{Customer, CustomerId};
use rolodex_core::pagination::{CustomerPage, PageRequest};

use super::{CustomerRepository, RepositoryError};

/// Full-scan strategy: every record is compared against the probe with the
/// in-core matcher. Functionally interchangeable with the SQL pushdown
/// repository on any dataset.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerRepository {
    async fn snapshot_sorted(&self) -> Vec<Customer> {
        let customers = self.customers.read().await;
        let mut all: Vec<Customer> = customers.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn save(&self, customer: Customer) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;
        customers.insert(customer.id, customer);
        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.get(id).cloned())
    }

    async fn list(&self, request: PageRequest) -> Result<CustomerPage, RepositoryError> {
        Ok(CustomerPage::from_all(self.snapshot_sorted().await, request))
    }

    async fn find_similar(
        &self,
        probe: &Customer,
        request: PageRequest,
    ) -> Result<CustomerPage, RepositoryError> {
        let matches: Vec<Customer> = self
            .snapshot_sorted()
            .await
            .into_iter()
            .filter(|candidate| are_customers_likely_duplicates(probe, candidate))
            .collect();

        Ok(CustomerPage::from_all(matches, request))
    }

    async fn delete(&self, id: &CustomerId) -> Result<bool, RepositoryError> {
        let mut customers = self.customers.write().await;
        Ok(customers.remove(id).is_some())
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

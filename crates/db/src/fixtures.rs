//! Deterministic demo dataset for local development and smoke checks.

use rolodex_core::domain::customer::Customer;
use rolodex_core::pagination::PageRequest;

use crate::repositories::{CustomerRepository, RepositoryError};

pub struct SeedDataset;

#[derive(Debug, Clone)]
pub struct SeedResult {
    pub inserted: usize,
}

#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl SeedDataset {
    /// A cluster of eight likely-duplicate Leonards (four by email, four by
    /// name) plus two customers that match nobody.
    pub fn customers() -> Vec<Customer> {
        [
            ("leonardsnimoy@gmail.com", "Leonard", "Nimoy"),
            ("leonard.s.nimoy@gmail.com", "L", "Nimoy"),
            ("LeonardSNimoy-spam@gmail.com", "Leo", "Nimoy"),
            ("LeonardSNimoy+autograph@gmail.com", "Lenny", "Nimoy"),
            ("l.nimoy.1@gmail.com", "Leonard", "Nimoy"),
            ("l.nimoy.2@gmail.com", "LEONARD", "Nimoy"),
            ("l.nimoy.3@gmail.com", "LEONARD", "NIMOY"),
            ("l.nimoy.4@gmail.com", "  Leonard  ", "  Nimoy  "),
            ("geraldo@foxnews.com", "Geraldo", ""),
            ("nph@gmail.com", "Neal Patrick", "Harris"),
        ]
        .into_iter()
        .map(|(email, first_name, last_name)| {
            Customer::new(email, first_name, last_name).expect("seed emails are valid")
        })
        .collect()
    }

    pub async fn load(repository: &dyn CustomerRepository) -> Result<SeedResult, RepositoryError> {
        let customers = Self::customers();
        let inserted = customers.len();
        for customer in customers {
            repository.save(customer).await?;
        }
        Ok(SeedResult { inserted })
    }

    pub async fn verify(
        repository: &dyn CustomerRepository,
    ) -> Result<VerificationResult, RepositoryError> {
        let listed = repository.list(PageRequest::default()).await?;

        let probe = Customer::new("leonardsnimoy@gmail.com", "Leonard", "Nimoy")
            .expect("probe email is valid");
        let similar = repository.find_similar(&probe, PageRequest::default()).await?;

        let checks = vec![
            ("customers-present", listed.customers.len() >= 10),
            ("similar-leonards", similar.customers.len() == 8),
        ];
        let all_present = checks.iter().all(|(_, passed)| *passed);

        Ok(VerificationResult { all_present, checks })
    }
}

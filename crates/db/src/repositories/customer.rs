use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use rolodex_core::dedupe::normalize_name;
use rolodex_core::domain::customer::{Customer, CustomerId};
use rolodex_core::pagination::{CustomerPage, PageRequest};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

/// Query-pushdown strategy: the likely-duplicate lookup is compiled into a
/// WHERE clause over the precomputed `normalized_email` column and the
/// case-folded name pair, paginated in SQL.
pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn count_where(&self, clause: &str, binds: &[&str]) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) AS count FROM customer WHERE {clause}");
        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        Ok(query.fetch_one(&self.pool).await?.get::<i64, _>("count"))
    }
}

const SIMILAR_WHERE: &str =
    "normalized_email = ? OR (lower(trim(first_name)) = ? AND lower(trim(last_name)) = ?)";

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn save(&self, customer: Customer) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO customer (
                id,
                email,
                normalized_email,
                first_name,
                last_name,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                normalized_email = excluded.normalized_email,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                updated_at = excluded.updated_at",
        )
        .bind(customer.id.to_string())
        .bind(&customer.email)
        .bind(&customer.normalized_email)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(timestamp(customer.created_at))
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, email, normalized_email, first_name, last_name, created_at
             FROM customer
             WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(customer_from_row).transpose()
    }

    async fn list(&self, request: PageRequest) -> Result<CustomerPage, RepositoryError> {
        let total_records = self.count_where("1 = 1", &[]).await?;

        let rows = sqlx::query(
            "SELECT id, email, normalized_email, first_name, last_name, created_at
             FROM customer
             ORDER BY created_at ASC, id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(request.page_size)
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let customers = rows.into_iter().map(customer_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(CustomerPage::assemble(customers, total_records, request))
    }

    async fn find_similar(
        &self,
        probe: &Customer,
        request: PageRequest,
    ) -> Result<CustomerPage, RepositoryError> {
        let first = normalize_name(Some(&probe.first_name)).unwrap_or_default();
        let last = normalize_name(Some(&probe.last_name)).unwrap_or_default();

        let total_records = self
            .count_where(SIMILAR_WHERE, &[probe.normalized_email.as_str(), &first, &last])
            .await?;

        let sql = format!(
            "SELECT id, email, normalized_email, first_name, last_name, created_at
             FROM customer
             WHERE {SIMILAR_WHERE}
             ORDER BY created_at ASC, id ASC
             LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(&probe.normalized_email)
            .bind(&first)
            .bind(&last)
            .bind(request.page_size)
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        let customers = rows.into_iter().map(customer_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(CustomerPage::assemble(customers, total_records, request))
    }

    async fn delete(&self, id: &CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    // Fixed fractional width keeps the stored text ordering chronological.
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn customer_from_row(row: SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id)
        .map_err(|error| RepositoryError::Decode(format!("invalid customer id `{id}`: {error}")))?;

    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid created_at `{created_at}`: {error}"))
        })?
        .with_timezone(&Utc);

    Ok(Customer {
        id: CustomerId(id),
        email: row.try_get("email")?,
        normalized_email: row.try_get("normalized_email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        created_at,
    })
}

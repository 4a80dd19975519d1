//! Counter-backed publication identifier allocation in Postgres.
//!
//! One row per prefix in `publication_sequences`. The first allocation
//! inserts the row, seeded from the numeric maximum of the stored
//! identifiers (or the seed); later allocations increment it. Stored
//! suffixes beyond the `BIGINT` range are not valid identifiers and are
//! skipped when seeding. Both paths
//! are a single upsert, so concurrent callers serialize on the row lock and
//! never see the same value.

use async_trait::async_trait;
use rpms_core::publication::{MAX_NUMBER, SEED_NUMBER};
use rpms_core::{PublicationId, PUBLICATION_PREFIX};
use sqlx::PgPool;

use crate::allocator::PublicationIdAllocator;
use crate::error::StoreError;

/// Sequence allocator over a connection pool.
#[derive(Debug, Clone)]
pub struct PgSequenceAllocator {
    pool: PgPool,
}

impl PgSequenceAllocator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Draw the next value for `prefix`.
pub async fn next_value(pool: &PgPool, prefix: &str) -> Result<u64, StoreError> {
    let seed = i64::try_from(SEED_NUMBER)
        .map_err(|_| StoreError::Corrupt("publication seed exceeds BIGINT".into()))?;
    // SUBSTRING is 1-based; the digits start right after the prefix.
    let digits_from = i32::try_from(prefix.chars().count() + 1)
        .map_err(|_| StoreError::Corrupt("publication prefix too long".into()))?;
    let pattern = format!("^{}[0-9]+$", regex_escape(prefix));
    let max = i64::try_from(MAX_NUMBER)
        .map_err(|_| StoreError::Corrupt("publication maximum exceeds BIGINT".into()))?;

    let value: i64 = sqlx::query_scalar(
        "INSERT INTO publication_sequences (prefix, last_value)
         SELECT $1, COALESCE(
             (SELECT CAST(MAX(n) AS BIGINT) + 1
                FROM (SELECT CAST(SUBSTRING(publication_id FROM $3) AS NUMERIC) AS n
                        FROM papers WHERE publication_id ~ $4) AS suffixes
               WHERE n < $5),
             $2)
         ON CONFLICT (prefix)
         DO UPDATE SET last_value = publication_sequences.last_value + 1
         RETURNING last_value",
    )
    .bind(prefix)
    .bind(seed)
    .bind(digits_from)
    .bind(&pattern)
    .bind(max)
    .fetch_one(pool)
    .await?;

    u64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("negative publication sequence value {value}")))
}

fn regex_escape(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            let escape = !c.is_ascii_alphanumeric() && c != '_';
            escape.then_some('\\').into_iter().chain(std::iter::once(c))
        })
        .collect()
}

#[async_trait]
impl PublicationIdAllocator for PgSequenceAllocator {
    async fn allocate(&self) -> Result<PublicationId, StoreError> {
        let value = next_value(&self.pool, PUBLICATION_PREFIX).await?;
        Ok(PublicationId::from_number(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_regex_safe() {
        assert_eq!(regex_escape("SMU_P"), "SMU_P");
        assert_eq!(regex_escape("A.B"), "A\\.B");
    }
}

//! User lookups. The workflow only reads users; [`insert`] exists for
//! seeding a standalone deployment.

use rpms_core::{Role, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::UserRecord;

/// Insert a user.
pub async fn insert(pool: &PgPool, user: &UserRecord) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
        .bind(user.id.0)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

/// Ids of every user holding `role`.
pub async fn ids_with_role(pool: &PgPool, role: Role) -> Result<Vec<UserId>, StoreError> {
    let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE role = $1 ORDER BY name")
        .bind(role.as_str())
        .fetch_all(pool)
        .await?;

    Ok(ids.into_iter().map(UserId).collect())
}

/// Every user, by name.
pub async fn list(pool: &PgPool) -> Result<Vec<UserRecord>, StoreError> {
    let rows = sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(UserRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
}

impl UserRow {
    fn into_record(self) -> Result<UserRecord, StoreError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {e}", self.id)))?;
        Ok(UserRecord {
            id: UserId(self.id),
            name: self.name,
            email: self.email,
            role,
        })
    }
}

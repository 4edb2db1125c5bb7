use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Role;

pub async fn find_by_normalized_name(
    pool: &SqlitePool,
    normalized: &str,
) -> Result<Option<Role>, DatabaseError> {
    let role = sqlx::query_as::<_, Role>(
        "SELECT id, name, normalized_name FROM roles WHERE normalized_name = ?",
    )
    .bind(normalized)
    .fetch_optional(pool)
    .await?;

    Ok(role)
}

/// Create the role unless it already exists; returns the stored row either way
pub async fn ensure(pool: &SqlitePool, name: &str) -> Result<(Role, bool), DatabaseError> {
    let normalized = name.to_uppercase();
    if let Some(existing) = find_by_normalized_name(pool, &normalized).await? {
        return Ok((existing, false));
    }

    let role = Role {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        normalized_name: normalized,
    };

    sqlx::query("INSERT INTO roles (id, name, normalized_name) VALUES (?, ?, ?)")
        .bind(&role.id)
        .bind(&role.name)
        .bind(&role.normalized_name)
        .execute(pool)
        .await?;

    Ok((role, true))
}

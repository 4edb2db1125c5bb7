use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;
use crate::database::models::{AuditStamp, TodoList};
use crate::types::Colour;

const LIST_COLUMNS: &str = "id, title, colour, created, created_by, last_modified, last_modified_by";

pub async fn all_ordered_by_title(pool: &SqlitePool) -> Result<Vec<TodoList>, DatabaseError> {
    let lists = sqlx::query_as::<_, TodoList>(&format!(
        "SELECT {} FROM todo_lists ORDER BY title, id",
        LIST_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(lists)
}

pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<TodoList>, DatabaseError> {
    let list = sqlx::query_as::<_, TodoList>(&format!("SELECT {} FROM todo_lists WHERE id = ?", LIST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(list)
}

pub async fn exists(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todo_lists WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// True when another list already uses this title
pub async fn title_taken(
    pool: &SqlitePool,
    title: &str,
    excluding_id: Option<i64>,
) -> Result<bool, DatabaseError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM todo_lists WHERE title = ? AND (? IS NULL OR id <> ?)",
    )
    .bind(title)
    .bind(excluding_id)
    .bind(excluding_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, DatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todo_lists")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn insert(
    pool: &SqlitePool,
    title: &str,
    colour: Colour,
    audit: &AuditStamp,
) -> Result<i64, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO todo_lists (title, colour, created, created_by, last_modified, last_modified_by)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(title)
    .bind(colour.code())
    .bind(audit.at)
    .bind(&audit.by)
    .bind(audit.at)
    .bind(&audit.by)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_title(
    pool: &SqlitePool,
    id: i64,
    title: &str,
    audit: &AuditStamp,
) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        "UPDATE todo_lists SET title = ?, last_modified = ?, last_modified_by = ? WHERE id = ?",
    )
    .bind(title)
    .bind(audit.at)
    .bind(&audit.by)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound(format!("todo list {}", id)));
    }
    Ok(())
}

/// Delete a list; its items go with it
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM todo_lists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_all(pool: &SqlitePool) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM todo_lists").execute(pool).await?;
    Ok(result.rows_affected())
}

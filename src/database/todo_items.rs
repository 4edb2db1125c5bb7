use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;
use crate::database::models::{AuditStamp, TodoItem};

const ITEM_COLUMNS: &str = "id, list_id, title, note, priority, reminder, done,
    created, created_by, last_modified, last_modified_by";

pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<TodoItem>, DatabaseError> {
    let item = sqlx::query_as::<_, TodoItem>(&format!("SELECT {} FROM todo_items WHERE id = ?", ITEM_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(item)
}

/// Every item, grouped by the caller; ordered by list then id
pub async fn all(pool: &SqlitePool) -> Result<Vec<TodoItem>, DatabaseError> {
    let items = sqlx::query_as::<_, TodoItem>(&format!(
        "SELECT {} FROM todo_items ORDER BY list_id, id",
        ITEM_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// One page of a list's items ordered by title
pub async fn page_for_list(
    pool: &SqlitePool,
    list_id: i64,
    offset: i64,
    limit: i64,
) -> Result<Vec<TodoItem>, DatabaseError> {
    let items = sqlx::query_as::<_, TodoItem>(&format!(
        "SELECT {} FROM todo_items WHERE list_id = ? ORDER BY title, id LIMIT ? OFFSET ?",
        ITEM_COLUMNS
    ))
    .bind(list_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn count_for_list(pool: &SqlitePool, list_id: i64) -> Result<i64, DatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todo_items WHERE list_id = ?")
        .bind(list_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn insert(
    pool: &SqlitePool,
    list_id: i64,
    title: &str,
    audit: &AuditStamp,
) -> Result<i64, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO todo_items (list_id, title, done, priority, created, created_by, last_modified, last_modified_by)
         VALUES (?, ?, 0, 0, ?, ?, ?, ?)",
    )
    .bind(list_id)
    .bind(title)
    .bind(audit.at)
    .bind(&audit.by)
    .bind(audit.at)
    .bind(&audit.by)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Persist the editable fields of an item and stamp the modification
pub async fn update(pool: &SqlitePool, item: &TodoItem, audit: &AuditStamp) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        "UPDATE todo_items SET
            list_id = ?, title = ?, note = ?, priority = ?, reminder = ?, done = ?,
            last_modified = ?, last_modified_by = ?
         WHERE id = ?",
    )
    .bind(item.list_id)
    .bind(&item.title)
    .bind(&item.note)
    .bind(item.priority)
    .bind(item.reminder)
    .bind(item.done)
    .bind(audit.at)
    .bind(&audit.by)
    .bind(item.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound(format!("todo item {}", item.id)));
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM todo_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;
use crate::database::models::{User, UserLogin};

const USER_COLUMNS: &str = "id, user_name, normalized_user_name, email, normalized_email, email_confirmed,
    password_hash, security_stamp, two_factor_enabled, authenticator_key, recovery_codes,
    lockout_end, lockout_enabled, access_failed_count, external_login_provider,
    external_login_id, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_normalized_user_name(
    pool: &SqlitePool,
    normalized: &str,
) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE normalized_user_name = ?",
        USER_COLUMNS
    ))
    .bind(normalized)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_normalized_email(
    pool: &SqlitePool,
    normalized: &str,
) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE normalized_email = ? ORDER BY created_at LIMIT 1",
        USER_COLUMNS
    ))
    .bind(normalized)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Find the user linked to an external provider key
pub async fn find_by_login(
    pool: &SqlitePool,
    provider: &str,
    provider_key: &str,
) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = (
            SELECT user_id FROM user_logins WHERE login_provider = ? AND provider_key = ?
        )",
        USER_COLUMNS
    ))
    .bind(provider)
    .bind(provider_key)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<User>, DatabaseError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY normalized_user_name",
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn insert(pool: &SqlitePool, user: &User) -> Result<(), DatabaseError> {
    sqlx::query(&format!(
        "INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        USER_COLUMNS
    ))
    .bind(&user.id)
    .bind(&user.user_name)
    .bind(&user.normalized_user_name)
    .bind(&user.email)
    .bind(&user.normalized_email)
    .bind(user.email_confirmed)
    .bind(&user.password_hash)
    .bind(&user.security_stamp)
    .bind(user.two_factor_enabled)
    .bind(&user.authenticator_key)
    .bind(&user.recovery_codes)
    .bind(user.lockout_end)
    .bind(user.lockout_enabled)
    .bind(user.access_failed_count)
    .bind(user.external_login_provider)
    .bind(&user.external_login_id)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist every mutable column of the user
pub async fn update(pool: &SqlitePool, user: &User) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        "UPDATE users SET
            user_name = ?, normalized_user_name = ?, email = ?, normalized_email = ?,
            email_confirmed = ?, password_hash = ?, security_stamp = ?, two_factor_enabled = ?,
            authenticator_key = ?, recovery_codes = ?, lockout_end = ?, lockout_enabled = ?,
            access_failed_count = ?, external_login_provider = ?, external_login_id = ?
         WHERE id = ?",
    )
    .bind(&user.user_name)
    .bind(&user.normalized_user_name)
    .bind(&user.email)
    .bind(&user.normalized_email)
    .bind(user.email_confirmed)
    .bind(&user.password_hash)
    .bind(&user.security_stamp)
    .bind(user.two_factor_enabled)
    .bind(&user.authenticator_key)
    .bind(&user.recovery_codes)
    .bind(user.lockout_end)
    .bind(user.lockout_enabled)
    .bind(user.access_failed_count)
    .bind(user.external_login_provider)
    .bind(&user.external_login_id)
    .bind(&user.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound(format!("user {}", user.id)));
    }
    Ok(())
}

pub async fn role_names(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>, DatabaseError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT r.name FROM roles r
         JOIN user_roles ur ON ur.role_id = r.id
         WHERE ur.user_id = ?
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(names)
}

pub async fn is_in_role(
    pool: &SqlitePool,
    user_id: &str,
    normalized_role: &str,
) -> Result<bool, DatabaseError> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ? AND r.normalized_name = ?",
    )
    .bind(user_id)
    .bind(normalized_role)
    .fetch_one(pool)
    .await?;

    Ok(found > 0)
}

pub async fn add_to_role(pool: &SqlitePool, user_id: &str, role_id: &str) -> Result<(), DatabaseError> {
    sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(role_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn add_login(pool: &SqlitePool, login: &UserLogin) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO user_logins (login_provider, provider_key, provider_display_name, user_id)
         VALUES (?, ?, ?, ?)",
    )
    .bind(&login.login_provider)
    .bind(&login.provider_key)
    .bind(&login.provider_display_name)
    .bind(&login.user_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn logins(pool: &SqlitePool, user_id: &str) -> Result<Vec<UserLogin>, DatabaseError> {
    let logins = sqlx::query_as::<_, UserLogin>(
        "SELECT login_provider, provider_key, provider_display_name, user_id
         FROM user_logins WHERE user_id = ? ORDER BY login_provider",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(logins)
}

/// Upsert a provider token (access_token, refresh_token, ...) for the user
pub async fn set_token(
    pool: &SqlitePool,
    user_id: &str,
    provider: &str,
    name: &str,
    value: &str,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO user_tokens (user_id, login_provider, name, value) VALUES (?, ?, ?, ?)
         ON CONFLICT (user_id, login_provider, name) DO UPDATE SET value = excluded.value",
    )
    .bind(user_id)
    .bind(provider)
    .bind(name)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_token(
    pool: &SqlitePool,
    user_id: &str,
    provider: &str,
    name: &str,
) -> Result<Option<String>, DatabaseError> {
    let value = sqlx::query_scalar::<_, Option<String>>(
        "SELECT value FROM user_tokens WHERE user_id = ? AND login_provider = ? AND name = ?",
    )
    .bind(user_id)
    .bind(provider)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(value.flatten())
}

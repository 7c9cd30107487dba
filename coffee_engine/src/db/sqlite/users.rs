use log::debug;
use sqlx::SqliteConnection;

use super::errors::{is_foreign_key_violation, is_unique_violation};
use crate::{
    api::errors::UserApiError,
    db_types::{NewUser, User, UserUpdate},
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, UserApiError> {
    let email = user.email.clone();
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (first_name, last_name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role)
    .fetch_one(conn)
    .await
    .map_err(|e| if is_unique_violation(&e) { UserApiError::EmailAlreadyExists(email) } else { e.into() })?;
    debug!("🗃️ User #{} created with role {}", user.id, user.role);
    Ok(user)
}

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await
}

pub async fn fetch_users(conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users ORDER BY id").fetch_all(conn).await
}

pub async fn update_user(id: i64, update: UserUpdate, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE users SET first_name = $1, last_name = $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(update.first_name)
    .bind(update.last_name)
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn delete_user(id: i64, conn: &mut SqliteConnection) -> Result<bool, UserApiError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| if is_foreign_key_violation(&e) { UserApiError::UserHasOrders(id) } else { e.into() })?;
    Ok(result.rows_affected() > 0)
}

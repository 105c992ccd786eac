use crate::{
    database::error::QueryError,
    pagination::PageRequest,
    schema::{Id, NewUser, User, UserRow},
};

use sqlx::{Pool, Postgres};

pub async fn get_user(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, QueryError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn find_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, QueryError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Creates a user. `user.password` must already be hashed.
pub async fn register_user(pool: &Pool<Postgres>, user: &NewUser) -> Result<User, QueryError> {
    let row: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn list_users(
    pool: &Pool<Postgres>,
    page: &PageRequest,
) -> Result<Vec<UserRow>, QueryError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.username LIMIT $1 OFFSET $2",
    )
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn set_password(
    pool: &Pool<Postgres>,
    user_id: Id,
    password: &str,
) -> Result<(), QueryError> {
    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

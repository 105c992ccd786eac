use crate::{
    database::error::QueryError,
    pagination::PageRequest,
    schema::{Id, UserRow},
};

use sqlx::{Pool, Postgres};

/// Returns `false` when the edge already existed. Self-subscription is rejected by the
/// `prevent_self_follow` check constraint.
pub async fn subscribe(pool: &Pool<Postgres>, subscriber: Id, target: Id) -> Result<bool, QueryError> {
    let result = sqlx::query(
        "INSERT INTO subscriptions (subscriber_id, subscribed_to_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(subscriber)
    .bind(target)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn unsubscribe(
    pool: &Pool<Postgres>,
    subscriber: Id,
    target: Id,
) -> Result<bool, QueryError> {
    let result =
        sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND subscribed_to_id = $2")
            .bind(subscriber)
            .bind(target)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_subscribed(
    pool: &Pool<Postgres>,
    subscriber: Id,
    target: Id,
) -> Result<bool, QueryError> {
    let row: Option<(Id,)> = sqlx::query_as(
        "SELECT subscribed_to_id FROM subscriptions WHERE subscriber_id = $1 AND subscribed_to_id = $2",
    )
    .bind(subscriber)
    .bind(target)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

pub async fn fetch_subscriptions(
    pool: &Pool<Postgres>,
    subscriber: Id,
    page: &PageRequest,
) -> Result<Vec<UserRow>, QueryError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.subscribed_to_id
        WHERE s.subscriber_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(subscriber)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

use crate::{
    database::error::QueryError,
    schema::{Id, Membership},
};

use sqlx::{Pool, Postgres};

/// Returns `false` when the recipe was already in the list.
pub async fn add_to_list(
    pool: &Pool<Postgres>,
    kind: Membership,
    user_id: Id,
    recipe_id: Id,
) -> Result<bool, QueryError> {
    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns `false` when the recipe was not in the list.
pub async fn remove_from_list(
    pool: &Pool<Postgres>,
    kind: Membership,
    user_id: Id,
    recipe_id: Id,
) -> Result<bool, QueryError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_in_list(
    pool: &Pool<Postgres>,
    kind: Membership,
    user_id: Id,
    recipe_id: Id,
) -> Result<bool, QueryError> {
    let result: Option<(Id,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = $2",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

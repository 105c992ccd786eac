use crate::{
    database::error::QueryError,
    schema::{Id, NewTag, Tag},
};

use sqlx::{Pool, Postgres};

pub async fn get_tag(pool: &Pool<Postgres>, id: Id) -> Result<Option<Tag>, QueryError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, QueryError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

pub async fn list_recipe_tags(
    pool: &Pool<Postgres>,
    recipe_id: Id,
) -> Result<Vec<Tag>, QueryError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.* FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

pub async fn existing_tag_ids(pool: &Pool<Postgres>, ids: &[Id]) -> Result<Vec<Id>, QueryError> {
    let rows: Vec<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub async fn existing_tag_slugs(
    pool: &Pool<Postgres>,
    slugs: &[String],
) -> Result<Vec<String>, QueryError> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT slug FROM tags WHERE slug = ANY($1)")
        .bind(slugs)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub async fn delete_tag(pool: &Pool<Postgres>, id: Id) -> Result<bool, QueryError> {
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Inserts the tag unless an identical one exists. A tag that collides with another on a
/// single unique column is reported as a unique violation.
pub async fn get_or_create_tag(
    pool: &Pool<Postgres>,
    tag: &NewTag,
) -> Result<(Tag, bool), QueryError> {
    let created: Option<Tag> = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING *",
    )
    .bind(&tag.name)
    .bind(&tag.color)
    .bind(&tag.slug)
    .fetch_optional(pool)
    .await?;

    if let Some(created) = created {
        return Ok((created, true));
    }

    let existing: Option<Tag> =
        sqlx::query_as("SELECT * FROM tags WHERE name = $1 AND color = $2 AND slug = $3")
            .bind(&tag.name)
            .bind(&tag.color)
            .bind(&tag.slug)
            .fetch_optional(pool)
            .await?;

    match existing {
        Some(existing) => Ok((existing, false)),
        None => Err(QueryError::Unique(format!("tags ({})", tag.slug))),
    }
}

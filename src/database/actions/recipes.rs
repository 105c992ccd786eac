use crate::{
    database::error::QueryError,
    pagination::PageRequest,
    schema::{Id, Recipe, RecipeDraft, RecipeFilter, RecipeRow, ShoppingListLine},
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

pub async fn fetch_recipes(
    pool: &Pool<Postgres>,
    filter: &RecipeFilter,
    page: &PageRequest,
) -> Result<Vec<RecipeRow>, QueryError> {
    let mut query =
        QueryBuilder::<Postgres>::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        query
            .push(" AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(")
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if let Some(user_id) = filter.favorited_by {
        query
            .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(user_id) = filter.in_cart_of {
        query
            .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
            .push_bind(user_id)
            .push(")");
    }

    query
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows: Vec<RecipeRow> = query.build_query_as().fetch_all(pool).await?;

    Ok(rows)
}

pub async fn get_recipe(pool: &Pool<Postgres>, id: Id) -> Result<Option<Recipe>, QueryError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn list_author_recipes(
    pool: &Pool<Postgres>,
    author_id: Id,
    limit: Option<i64>,
) -> Result<Vec<Recipe>, QueryError> {
    // LIMIT NULL is no limit
    let rows: Vec<Recipe> = sqlx::query_as(
        "SELECT * FROM recipes WHERE author_id = $1 ORDER BY pub_date DESC, id DESC LIMIT $2",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_author_recipes(pool: &Pool<Postgres>, author_id: Id) -> Result<i64, QueryError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}

pub async fn create_recipe(
    pool: &Pool<Postgres>,
    author_id: Id,
    draft: &RecipeDraft,
    image: &str,
) -> Result<Id, QueryError> {
    let mut tx = pool.begin().await?;

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(image)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    replace_recipe_lines(&mut tx, id.0, draft).await?;
    tx.commit().await?;

    Ok(id.0)
}

pub async fn update_recipe(
    pool: &Pool<Postgres>,
    id: Id,
    draft: &RecipeDraft,
    image: Option<&str>,
) -> Result<(), QueryError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "
        UPDATE recipes
        SET name = $1, text = $2, cooking_time = $3, image = COALESCE($4, image)
        WHERE id = $5
    ",
    )
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .bind(image)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(QueryError::RowNotFound);
    }

    replace_recipe_lines(&mut tx, id, draft).await?;
    tx.commit().await?;

    Ok(())
}

/// Clears and re-inserts the ingredient lines and tag links of a recipe.
async fn replace_recipe_lines(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Id,
    draft: &RecipeDraft,
) -> Result<(), QueryError> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    // An empty VALUES list is a syntax error
    if !draft.ingredients.is_empty() {
        let mut lines = QueryBuilder::<Postgres>::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );
        lines.push_values(&draft.ingredients, |mut row, line| {
            row.push_bind(recipe_id)
                .push_bind(line.id)
                .push_bind(line.amount);
        });
        lines.build().execute(&mut **tx).await?;
    }

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    if !draft.tags.is_empty() {
        let mut tags =
            QueryBuilder::<Postgres>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        tags.push_values(&draft.tags, |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        tags.build().execute(&mut **tx).await?;
    }

    Ok(())
}

pub async fn delete_recipe(pool: &Pool<Postgres>, id: Id) -> Result<(), QueryError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(QueryError::RowNotFound);
    }

    Ok(())
}

pub async fn shopping_list(
    pool: &Pool<Postgres>,
    user_id: Id,
) -> Result<Vec<ShoppingListLine>, QueryError> {
    let rows: Vec<ShoppingListLine> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ri.amount) AS amount
        FROM shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name, i.measurement_unit
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

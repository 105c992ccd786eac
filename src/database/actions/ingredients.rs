use crate::{
    database::error::QueryError,
    schema::{Id, Ingredient, NewIngredient, RecipeIngredient},
    IMPORT_CHUNK_SIZE,
};

use sqlx::{Pool, Postgres, QueryBuilder};

pub async fn search_ingredients(
    pool: &Pool<Postgres>,
    prefix: Option<&str>,
) -> Result<Vec<Ingredient>, QueryError> {
    let rows: Vec<Ingredient> = match prefix {
        Some(prefix) => {
            sqlx::query_as(
                "SELECT * FROM ingredients WHERE LOWER(name) LIKE LOWER($1) || '%' ESCAPE '\\' ORDER BY name, measurement_unit",
            )
            .bind(escape_like(prefix))
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM ingredients ORDER BY name, measurement_unit")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

pub async fn get_ingredient(
    pool: &Pool<Postgres>,
    id: Id,
) -> Result<Option<Ingredient>, QueryError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn existing_ingredient_ids(
    pool: &Pool<Postgres>,
    ids: &[Id],
) -> Result<Vec<Id>, QueryError> {
    let rows: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub async fn delete_ingredient(pool: &Pool<Postgres>, id: Id) -> Result<bool, QueryError> {
    let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_ingredients(
    pool: &Pool<Postgres>,
    ingredients: &[NewIngredient],
) -> Result<u64, QueryError> {
    let mut inserted = 0;

    for chunk in ingredients.chunks(IMPORT_CHUNK_SIZE) {
        let mut query = QueryBuilder::<Postgres>::new("INSERT INTO ingredients (name, measurement_unit) ");
        query.push_values(chunk, |mut row, ingredient| {
            row.push_bind(&ingredient.name)
                .push_bind(&ingredient.measurement_unit);
        });
        query.push(" ON CONFLICT DO NOTHING");

        let result = query.build().execute(pool).await?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}

pub async fn list_recipe_ingredients(
    pool: &Pool<Postgres>,
    recipe_id: Id,
) -> Result<Vec<RecipeIngredient>, QueryError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("flour"), "flour");
    }
}

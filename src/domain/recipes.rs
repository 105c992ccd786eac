use crate::{
    error::ApiError,
    form::Form,
    jwt::SessionData,
    pagination::{query_value, PageContext, PageLink},
    permissions::{authorize, ActionType, Resource},
    projection::RecipeView,
    schema::{Id, Recipe, RecipeDraft, RecipeFilter},
    state::State,
    validation,
};

/// Builds the listing filter. Boolean filters only apply to an authenticated viewer and only
/// when set to a truthy value.
pub fn recipe_filter(
    query: &[(String, String)],
    viewer: Option<&SessionData>,
) -> Result<RecipeFilter, ApiError> {
    let author = match query_value(query, "author") {
        Some(author) if !author.is_empty() => Some(author.parse::<Id>().map_err(|_e| {
            ApiError::Validation(String::from("'author': A valid integer is required."))
        })?),
        _ => None,
    };

    let tags = query
        .iter()
        .filter(|(key, value)| key == "tags" && !value.is_empty())
        .map(|(_, value)| value.to_owned())
        .collect();

    let viewer_if = |key: &str| {
        viewer
            .filter(|_| query_value(query, key).map(is_truthy).unwrap_or(false))
            .map(|viewer| viewer.user_id)
    };

    Ok(RecipeFilter {
        author,
        tags,
        favorited_by: viewer_if("is_favorited"),
        in_cart_of: viewer_if("is_in_shopping_cart"),
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

pub async fn list(
    state: &State,
    viewer: Option<&SessionData>,
    query: &[(String, String)],
    link: &PageLink,
) -> Result<PageContext<RecipeView>, ApiError> {
    authorize(viewer, ActionType::Read, Resource::Collection).into_result()?;

    let request = state.paginator.request(query)?;
    let filter = recipe_filter(query, viewer)?;
    check_tag_slugs(state, &filter.tags).await?;

    let rows = state.store.list_recipes(&filter, &request).await?;
    let total = rows.first().map(|row| row.count).unwrap_or(0);

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        results.push(RecipeView::build(state, row.recipe, viewer).await?);
    }

    PageContext::from_rows(results, total, &request, link)
}

/// Filtering by a slug no tag carries is a client error, not an empty result.
async fn check_tag_slugs(state: &State, slugs: &[String]) -> Result<(), ApiError> {
    if slugs.is_empty() {
        return Ok(());
    }

    let known = state.store.existing_tag_slugs(slugs).await?;
    match slugs.iter().find(|slug| !known.contains(slug)) {
        Some(slug) => Err(ApiError::Validation(format!(
            "'tags': Select a valid choice. {slug} is not one of the available choices."
        ))),
        None => Ok(()),
    }
}

pub async fn get(
    state: &State,
    viewer: Option<&SessionData>,
    id: Id,
) -> Result<RecipeView, ApiError> {
    let recipe = find(state, id).await?;
    authorize(viewer, ActionType::Read, Resource::Collection).into_result()?;

    RecipeView::build(state, recipe, viewer).await
}

pub async fn create(
    state: &State,
    session: &SessionData,
    form: &Form,
) -> Result<RecipeView, ApiError> {
    authorize(Some(session), ActionType::CreateRecipes, Resource::Collection).into_result()?;

    let draft = validation::recipe_draft(form, true)?;
    check_references(state, &draft).await?;

    let image = match &draft.image {
        Some(data) => state.media.save_base64_image(data).await?,
        None => return Err(ApiError::Validation(String::from("'image' cannot be empty."))),
    };

    let id = match state
        .store
        .create_recipe(session.user_id, &draft, &image)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            state.media.remove(&image).await;
            return Err(e.into());
        }
    };

    log::info!("User {} created recipe {id}", session.user_id);
    RecipeView::build(state, find(state, id).await?, Some(session)).await
}

/// Replaces every field of the recipe; the image is kept when omitted.
pub async fn update(
    state: &State,
    session: &SessionData,
    id: Id,
    form: &Form,
) -> Result<RecipeView, ApiError> {
    let recipe = find(state, id).await?;
    authorize(
        Some(session),
        ActionType::ManageOwnRecipes,
        Resource::Recipe {
            author_id: recipe.author_id,
        },
    )
    .into_result()?;

    let draft = validation::recipe_draft(form, false)?;
    check_references(state, &draft).await?;

    let image = match &draft.image {
        Some(data) => Some(state.media.save_base64_image(data).await?),
        None => None,
    };

    if let Err(e) = state
        .store
        .update_recipe(id, &draft, image.as_deref())
        .await
    {
        if let Some(image) = &image {
            state.media.remove(image).await;
        }
        return Err(e.into());
    }

    if image.is_some() {
        state.media.remove(&recipe.image).await;
    }

    log::info!("User {} updated recipe {id}", session.user_id);
    RecipeView::build(state, find(state, id).await?, Some(session)).await
}

pub async fn delete(state: &State, session: &SessionData, id: Id) -> Result<(), ApiError> {
    let recipe = find(state, id).await?;
    authorize(
        Some(session),
        ActionType::ManageOwnRecipes,
        Resource::Recipe {
            author_id: recipe.author_id,
        },
    )
    .into_result()?;

    state.store.delete_recipe(id).await?;
    state.media.remove(&recipe.image).await;

    log::info!("User {} deleted recipe {id}", session.user_id);
    Ok(())
}

async fn find(state: &State, id: Id) -> Result<Recipe, ApiError> {
    state
        .store
        .get_recipe(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe"))
}

/// Every referenced tag and ingredient must exist; the first missing id is reported.
async fn check_references(state: &State, draft: &RecipeDraft) -> Result<(), ApiError> {
    let ingredient_ids = draft.ingredient_ids();
    let existing = state.store.existing_ingredient_ids(&ingredient_ids).await?;
    if let Some(id) = ingredient_ids.iter().find(|id| !existing.contains(id)) {
        return Err(ApiError::UnknownIngredient(*id));
    }

    let existing = state.store.existing_tag_ids(&draft.tags).await?;
    if let Some(id) = draft.tags.iter().find(|id| !existing.contains(id)) {
        return Err(ApiError::UnknownTag(*id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn viewer() -> SessionData {
        SessionData {
            user_id: 4,
            username: String::from("viewer"),
            role: UserRole::User,
            is_admin: false,
        }
    }

    #[test]
    fn boolean_filters_need_a_viewer() {
        let params = query(&[("is_favorited", "1"), ("is_in_shopping_cart", "1")]);

        let anonymous = recipe_filter(&params, None).unwrap();
        assert_eq!(anonymous.favorited_by, None);
        assert_eq!(anonymous.in_cart_of, None);

        let viewer = viewer();
        let filter = recipe_filter(&params, Some(&viewer)).unwrap();
        assert_eq!(filter.favorited_by, Some(4));
        assert_eq!(filter.in_cart_of, Some(4));
    }

    #[test]
    fn false_boolean_filters_are_ignored() {
        let viewer = viewer();
        let filter =
            recipe_filter(&query(&[("is_favorited", "0")]), Some(&viewer)).unwrap();

        assert_eq!(filter.favorited_by, None);
    }

    #[test]
    fn tags_repeat_and_author_must_be_numeric() {
        let filter = recipe_filter(
            &query(&[("tags", "lunch"), ("tags", "dinner"), ("author", "2")]),
            None,
        )
        .unwrap();
        assert_eq!(filter.tags, vec!["lunch", "dinner"]);
        assert_eq!(filter.author, Some(2));

        assert!(recipe_filter(&query(&[("author", "me")]), None).is_err());
    }
}

use crate::{
    error::ApiError,
    invalidate_cache,
    jwt::SessionData,
    permissions::{authorize, ActionType, Resource},
    schema::{Id, Ingredient, Tag},
    state::State,
    CacheKeyType, CacheLifetime,
};

pub async fn list_tags(state: &State) -> Result<Vec<Tag>, ApiError> {
    let fetch = move || async move { Ok::<_, ApiError>(state.store.list_tags().await?) };

    match &state.cache {
        Some(cache) => cache.get_or(CacheKeyType::Tags.new("all"), fetch).await,
        None => fetch().await,
    }
}

pub async fn get_tag(state: &State, id: Id) -> Result<Tag, ApiError> {
    state
        .store
        .get_tag(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag"))
}

/// Case-insensitive prefix search; no prefix lists everything.
pub async fn search_ingredients(
    state: &State,
    name: Option<&str>,
) -> Result<Vec<Ingredient>, ApiError> {
    let prefix = name.map(str::trim).filter(|name| !name.is_empty());
    let key = prefix.map(str::to_lowercase).unwrap_or_default();
    let fetch = move || async move {
        Ok::<_, ApiError>(state.store.search_ingredients(prefix).await?)
    };

    match &state.cache {
        Some(cache) => cache.get_or(CacheKeyType::Ingredients.new(key), fetch).await,
        None => fetch().await,
    }
}

pub async fn get_ingredient(state: &State, id: Id) -> Result<Ingredient, ApiError> {
    state
        .store
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient"))
}

/// Staff only. Recipes keep existing without the tag.
pub async fn delete_tag(state: &State, session: &SessionData, id: Id) -> Result<(), ApiError> {
    authorize(Some(session), ActionType::ManageCatalog, Resource::Collection).into_result()?;

    if !state.store.delete_tag(id).await? {
        return Err(ApiError::not_found("Tag"));
    }
    log::info!("Tag {id} deleted by {}", session.username);
    invalidate_cache(state.cache.as_ref(), CacheLifetime::BindTagCache).await;

    Ok(())
}

/// Staff only. Recipe lines using the ingredient are dropped with it.
pub async fn delete_ingredient(
    state: &State,
    session: &SessionData,
    id: Id,
) -> Result<(), ApiError> {
    authorize(Some(session), ActionType::ManageCatalog, Resource::Collection).into_result()?;

    if !state.store.delete_ingredient(id).await? {
        return Err(ApiError::not_found("Ingredient"));
    }
    log::info!("Ingredient {id} deleted by {}", session.username);
    invalidate_cache(state.cache.as_ref(), CacheLifetime::BindIngredientCache).await;

    Ok(())
}

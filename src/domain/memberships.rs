use crate::{
    error::ApiError,
    jwt::SessionData,
    permissions::{authorize, ActionType, Resource},
    projection::RecipeSummary,
    schema::{Id, Membership},
    state::State,
};

/// Puts the recipe into the user's `kind` set. A second add of the same pair is a duplicate.
pub async fn add(
    state: &State,
    session: &SessionData,
    kind: Membership,
    recipe_id: Id,
) -> Result<RecipeSummary, ApiError> {
    authorize(Some(session), ActionType::ManageOwnLists, Resource::Collection).into_result()?;

    let recipe = state
        .store
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe"))?;

    if !state
        .store
        .add_membership(kind, session.user_id, recipe_id)
        .await?
    {
        return Err(ApiError::Duplicate(kind.duplicate_message().to_string()));
    }

    log::debug!(
        "User {} added recipe {recipe_id} to {}",
        session.user_id,
        kind.table()
    );
    Ok(RecipeSummary::new(&recipe, &state.media))
}

pub async fn remove(
    state: &State,
    session: &SessionData,
    kind: Membership,
    recipe_id: Id,
) -> Result<(), ApiError> {
    authorize(Some(session), ActionType::ManageOwnLists, Resource::Collection).into_result()?;

    state
        .store
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe"))?;

    if !state
        .store
        .remove_membership(kind, session.user_id, recipe_id)
        .await?
    {
        return Err(ApiError::NotFound(kind.absent_message().to_string()));
    }

    Ok(())
}

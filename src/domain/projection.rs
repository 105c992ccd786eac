use serde::Serialize;

use crate::{
    error::ApiError,
    jwt::SessionData,
    media::MediaStorage,
    schema::{Id, Membership, Recipe, RecipeIngredient, Tag, User},
    state::State,
};

/// Public view of a user, relative to whoever is asking.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl Profile {
    pub async fn build(state: &State, user: &User, viewer: Option<&SessionData>) -> Self {
        let is_subscribed = match viewer {
            Some(viewer) if viewer.user_id != user.id => {
                flag(state.store.is_subscribed(viewer.user_id, user.id).await)
            }
            _ => false,
        };

        Self {
            id: user.id,
            email: user.email.to_owned(),
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            is_subscribed,
        }
    }

    /// Decorates the profile with up to `limit` of the user's newest recipes.
    pub async fn with_recipes(
        self,
        state: &State,
        limit: Option<i64>,
    ) -> Result<SubscriptionProfile, ApiError> {
        let recipes = state
            .store
            .list_author_recipes(self.id, limit)
            .await?
            .iter()
            .map(|recipe| RecipeSummary::new(recipe, &state.media))
            .collect();
        let recipes_count = state.store.count_author_recipes(self.id).await?;

        Ok(SubscriptionProfile {
            profile: self,
            recipes,
            recipes_count,
        })
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SubscriptionProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeSummary {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeSummary {
    pub fn new(recipe: &Recipe, media: &MediaStorage) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.to_owned(),
            image: media.url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeView {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
    pub text: String,
    pub author: Profile,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeView {
    pub async fn build(
        state: &State,
        recipe: Recipe,
        viewer: Option<&SessionData>,
    ) -> Result<Self, ApiError> {
        let author = state
            .store
            .get_user(recipe.author_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Author"))?;
        let tags = state.store.list_recipe_tags(recipe.id).await?;
        let ingredients = state.store.list_recipe_ingredients(recipe.id).await?;

        let (is_favorited, is_in_shopping_cart) = match viewer {
            Some(viewer) => (
                flag(
                    state
                        .store
                        .has_membership(Membership::Favorite, viewer.user_id, recipe.id)
                        .await,
                ),
                flag(
                    state
                        .store
                        .has_membership(Membership::ShoppingCart, viewer.user_id, recipe.id)
                        .await,
                ),
            ),
            None => (false, false),
        };

        Ok(Self {
            id: recipe.id,
            image: state.media.url(&recipe.image),
            name: recipe.name,
            cooking_time: recipe.cooking_time,
            text: recipe.text,
            author: Profile::build(state, &author, viewer).await,
            tags,
            ingredients,
            is_favorited,
            is_in_shopping_cart,
        })
    }
}

/// Relationship flags degrade to `false` instead of failing the whole projection.
fn flag<E: std::fmt::Display>(result: Result<bool, E>) -> bool {
    result.unwrap_or_else(|e| {
        log::error!("Failed to resolve relationship flag: {e}");
        false
    })
}

use async_trait::async_trait;

use super::{
    error::QueryError,
    pagination::PageRequest,
    schema::{
        Id, Ingredient, Membership, NewIngredient, NewTag, NewUser, Recipe, RecipeDraft,
        RecipeFilter, RecipeIngredient, RecipeRow, ShoppingListLine, Tag, User, UserRow,
    },
};

/// Persistence operations the request handlers need.
///
/// Membership and subscription inserts report `false` when the row already existed, so the
/// caller can answer with a duplicate error without relying on a prior existence check.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User, QueryError>;
    async fn get_user(&self, id: Id) -> Result<Option<User>, QueryError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, QueryError>;
    async fn list_users(&self, page: &PageRequest) -> Result<Vec<UserRow>, QueryError>;
    async fn set_password(&self, id: Id, password: &str) -> Result<(), QueryError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, QueryError>;
    async fn get_tag(&self, id: Id) -> Result<Option<Tag>, QueryError>;
    /// Returns the tag and whether it was created by this call.
    async fn get_or_create_tag(&self, tag: &NewTag) -> Result<(Tag, bool), QueryError>;
    async fn existing_tag_ids(&self, ids: &[Id]) -> Result<Vec<Id>, QueryError>;
    async fn existing_tag_slugs(&self, slugs: &[String]) -> Result<Vec<String>, QueryError>;
    /// Removes the tag from every recipe. Returns `false` when no such tag existed.
    async fn delete_tag(&self, id: Id) -> Result<bool, QueryError>;

    async fn search_ingredients(&self, prefix: Option<&str>)
        -> Result<Vec<Ingredient>, QueryError>;
    async fn get_ingredient(&self, id: Id) -> Result<Option<Ingredient>, QueryError>;
    /// Inserts every pair not already present, returning how many were new.
    async fn insert_ingredients(&self, ingredients: &[NewIngredient]) -> Result<u64, QueryError>;
    async fn existing_ingredient_ids(&self, ids: &[Id]) -> Result<Vec<Id>, QueryError>;
    /// Drops the ingredient and every recipe line using it.
    async fn delete_ingredient(&self, id: Id) -> Result<bool, QueryError>;

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        page: &PageRequest,
    ) -> Result<Vec<RecipeRow>, QueryError>;
    async fn list_author_recipes(
        &self,
        author_id: Id,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, QueryError>;
    async fn count_author_recipes(&self, author_id: Id) -> Result<i64, QueryError>;
    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>, QueryError>;
    async fn list_recipe_tags(&self, recipe_id: Id) -> Result<Vec<Tag>, QueryError>;
    async fn list_recipe_ingredients(
        &self,
        recipe_id: Id,
    ) -> Result<Vec<RecipeIngredient>, QueryError>;
    /// Writes the recipe row, its ingredient lines and its tags as one unit.
    async fn create_recipe(
        &self,
        author_id: Id,
        draft: &RecipeDraft,
        image: &str,
    ) -> Result<Id, QueryError>;
    /// Replaces the recipe fields, ingredient lines and tags as one unit.
    /// The stored image is kept when `image` is `None`.
    async fn update_recipe(
        &self,
        id: Id,
        draft: &RecipeDraft,
        image: Option<&str>,
    ) -> Result<(), QueryError>;
    async fn delete_recipe(&self, id: Id) -> Result<(), QueryError>;

    async fn add_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError>;
    async fn remove_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError>;
    async fn has_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError>;

    async fn add_subscription(&self, subscriber: Id, target: Id) -> Result<bool, QueryError>;
    async fn remove_subscription(&self, subscriber: Id, target: Id) -> Result<bool, QueryError>;
    async fn is_subscribed(&self, subscriber: Id, target: Id) -> Result<bool, QueryError>;
    async fn list_subscriptions(
        &self,
        subscriber: Id,
        page: &PageRequest,
    ) -> Result<Vec<UserRow>, QueryError>;

    /// Cart ingredients summed per (name, unit), ordered by name.
    async fn shopping_list(&self, user_id: Id) -> Result<Vec<ShoppingListLine>, QueryError>;
}

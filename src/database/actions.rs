pub mod ingredients;
pub mod lists;
pub mod recipes;
pub mod subscriptions;
pub mod tags;
pub mod users;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use super::{
    error::QueryError,
    pagination::PageRequest,
    schema::{
        Id, Ingredient, Membership, NewIngredient, NewTag, NewUser, Recipe, RecipeDraft,
        RecipeFilter, RecipeIngredient, RecipeRow, ShoppingListLine, Tag, User, UserRow,
    },
    store::Store,
};

/// [`Store`] backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Connects and applies the embedded migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, QueryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| QueryError::Other(format!("Migration failed: {e}")))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, QueryError> {
        users::register_user(&self.pool, user).await
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>, QueryError> {
        users::get_user(&self.pool, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, QueryError> {
        users::find_user_by_email(&self.pool, email).await
    }

    async fn list_users(&self, page: &PageRequest) -> Result<Vec<UserRow>, QueryError> {
        users::list_users(&self.pool, page).await
    }

    async fn set_password(&self, id: Id, password: &str) -> Result<(), QueryError> {
        users::set_password(&self.pool, id, password).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, QueryError> {
        tags::list_tags(&self.pool).await
    }

    async fn get_tag(&self, id: Id) -> Result<Option<Tag>, QueryError> {
        tags::get_tag(&self.pool, id).await
    }

    async fn get_or_create_tag(&self, tag: &NewTag) -> Result<(Tag, bool), QueryError> {
        tags::get_or_create_tag(&self.pool, tag).await
    }

    async fn existing_tag_ids(&self, ids: &[Id]) -> Result<Vec<Id>, QueryError> {
        tags::existing_tag_ids(&self.pool, ids).await
    }

    async fn existing_tag_slugs(&self, slugs: &[String]) -> Result<Vec<String>, QueryError> {
        tags::existing_tag_slugs(&self.pool, slugs).await
    }

    async fn delete_tag(&self, id: Id) -> Result<bool, QueryError> {
        tags::delete_tag(&self.pool, id).await
    }

    async fn search_ingredients(
        &self,
        prefix: Option<&str>,
    ) -> Result<Vec<Ingredient>, QueryError> {
        ingredients::search_ingredients(&self.pool, prefix).await
    }

    async fn get_ingredient(&self, id: Id) -> Result<Option<Ingredient>, QueryError> {
        ingredients::get_ingredient(&self.pool, id).await
    }

    async fn insert_ingredients(&self, list: &[NewIngredient]) -> Result<u64, QueryError> {
        ingredients::insert_ingredients(&self.pool, list).await
    }

    async fn existing_ingredient_ids(&self, ids: &[Id]) -> Result<Vec<Id>, QueryError> {
        ingredients::existing_ingredient_ids(&self.pool, ids).await
    }

    async fn delete_ingredient(&self, id: Id) -> Result<bool, QueryError> {
        ingredients::delete_ingredient(&self.pool, id).await
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        page: &PageRequest,
    ) -> Result<Vec<RecipeRow>, QueryError> {
        recipes::fetch_recipes(&self.pool, filter, page).await
    }

    async fn list_author_recipes(
        &self,
        author_id: Id,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, QueryError> {
        recipes::list_author_recipes(&self.pool, author_id, limit).await
    }

    async fn count_author_recipes(&self, author_id: Id) -> Result<i64, QueryError> {
        recipes::count_author_recipes(&self.pool, author_id).await
    }

    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>, QueryError> {
        recipes::get_recipe(&self.pool, id).await
    }

    async fn list_recipe_tags(&self, recipe_id: Id) -> Result<Vec<Tag>, QueryError> {
        tags::list_recipe_tags(&self.pool, recipe_id).await
    }

    async fn list_recipe_ingredients(
        &self,
        recipe_id: Id,
    ) -> Result<Vec<RecipeIngredient>, QueryError> {
        ingredients::list_recipe_ingredients(&self.pool, recipe_id).await
    }

    async fn create_recipe(
        &self,
        author_id: Id,
        draft: &RecipeDraft,
        image: &str,
    ) -> Result<Id, QueryError> {
        recipes::create_recipe(&self.pool, author_id, draft, image).await
    }

    async fn update_recipe(
        &self,
        id: Id,
        draft: &RecipeDraft,
        image: Option<&str>,
    ) -> Result<(), QueryError> {
        recipes::update_recipe(&self.pool, id, draft, image).await
    }

    async fn delete_recipe(&self, id: Id) -> Result<(), QueryError> {
        recipes::delete_recipe(&self.pool, id).await
    }

    async fn add_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError> {
        lists::add_to_list(&self.pool, kind, user_id, recipe_id).await
    }

    async fn remove_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError> {
        lists::remove_from_list(&self.pool, kind, user_id, recipe_id).await
    }

    async fn has_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError> {
        lists::is_in_list(&self.pool, kind, user_id, recipe_id).await
    }

    async fn add_subscription(&self, subscriber: Id, target: Id) -> Result<bool, QueryError> {
        subscriptions::subscribe(&self.pool, subscriber, target).await
    }

    async fn remove_subscription(&self, subscriber: Id, target: Id) -> Result<bool, QueryError> {
        subscriptions::unsubscribe(&self.pool, subscriber, target).await
    }

    async fn is_subscribed(&self, subscriber: Id, target: Id) -> Result<bool, QueryError> {
        subscriptions::is_subscribed(&self.pool, subscriber, target).await
    }

    async fn list_subscriptions(
        &self,
        subscriber: Id,
        page: &PageRequest,
    ) -> Result<Vec<UserRow>, QueryError> {
        subscriptions::fetch_subscriptions(&self.pool, subscriber, page).await
    }

    async fn shopping_list(&self, user_id: Id) -> Result<Vec<ShoppingListLine>, QueryError> {
        recipes::shopping_list(&self.pool, user_id).await
    }
}

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    error::QueryError,
    pagination::PageRequest,
    schema::{
        Id, Ingredient, Membership, NewIngredient, NewTag, NewUser, Recipe, RecipeDraft,
        RecipeFilter, RecipeIngredient, RecipeRow, ShoppingListLine, Tag, User, UserRole,
        UserRow,
    },
    store::Store,
};

#[derive(Default)]
struct Tables {
    next_id: Id,
    users: Vec<User>,
    tags: Vec<Tag>,
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    recipe_ingredients: Vec<(Id, Id, i32)>,
    recipe_tags: BTreeSet<(Id, Id)>,
    favorites: BTreeSet<(Id, Id)>,
    shopping_cart: BTreeSet<(Id, Id)>,
    subscriptions: BTreeSet<(Id, Id)>,
}

impl Tables {
    fn id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn memberships(&mut self, kind: Membership) -> &mut BTreeSet<(Id, Id)> {
        match kind {
            Membership::Favorite => &mut self.favorites,
            Membership::ShoppingCart => &mut self.shopping_cart,
        }
    }

    fn replace_lines(&mut self, recipe_id: Id, draft: &RecipeDraft) {
        self.recipe_ingredients.retain(|(recipe, _, _)| *recipe != recipe_id);
        self.recipe_tags.retain(|(recipe, _)| *recipe != recipe_id);

        for line in &draft.ingredients {
            self.recipe_ingredients
                .push((recipe_id, line.id, line.amount));
        }
        for tag in &draft.tags {
            self.recipe_tags.insert((recipe_id, *tag));
        }
    }

    fn recipe_has_tag(&self, recipe_id: Id, slugs: &[String]) -> bool {
        self.recipe_tags.iter().any(|(recipe, tag)| {
            *recipe == recipe_id
                && self
                    .tags
                    .iter()
                    .any(|t| t.id == *tag && slugs.contains(&t.slug))
        })
    }
}

fn page<T>(rows: Vec<T>, page: &PageRequest) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect()
}

/// In-process [`Store`] mirroring the constraints of the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn promote(&self, user_id: Id) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.role = UserRole::Admin;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(QueryError::Unique(String::from("users_email_key")));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(QueryError::Unique(String::from("users_username_key")));
        }

        let created = User {
            id: tables.id(),
            email: user.email.to_owned(),
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            password: user.password.to_owned(),
            role: UserRole::User,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, request: &PageRequest) -> Result<Vec<UserRow>, QueryError> {
        let tables = self.tables.lock().unwrap();
        let mut users = tables.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));

        let count = users.len() as i64;
        Ok(page(users, request)
            .into_iter()
            .map(|user| UserRow { user, count })
            .collect())
    }

    async fn set_password(&self, id: Id, password: &str) -> Result<(), QueryError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.password = password.to_string();
        }
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, QueryError> {
        let tables = self.tables.lock().unwrap();
        let mut tags = tables.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn get_tag(&self, id: Id) -> Result<Option<Tag>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn get_or_create_tag(&self, tag: &NewTag) -> Result<(Tag, bool), QueryError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables
            .tags
            .iter()
            .find(|t| t.name == tag.name && t.color == tag.color && t.slug == tag.slug)
        {
            return Ok((existing.clone(), false));
        }
        if tables
            .tags
            .iter()
            .any(|t| t.name == tag.name || t.color == tag.color || t.slug == tag.slug)
        {
            return Err(QueryError::Unique(format!("tags ({})", tag.slug)));
        }

        let created = Tag {
            id: tables.id(),
            name: tag.name.to_owned(),
            color: tag.color.to_owned(),
            slug: tag.slug.to_owned(),
        };
        tables.tags.push(created.clone());
        Ok((created, true))
    }

    async fn existing_tag_ids(&self, ids: &[Id]) -> Result<Vec<Id>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tags
            .iter()
            .map(|t| t.id)
            .filter(|id| ids.contains(id))
            .collect())
    }

    async fn existing_tag_slugs(&self, slugs: &[String]) -> Result<Vec<String>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tags
            .iter()
            .filter(|t| slugs.contains(&t.slug))
            .map(|t| t.slug.to_owned())
            .collect())
    }

    async fn delete_tag(&self, id: Id) -> Result<bool, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.tags.len();
        tables.tags.retain(|t| t.id != id);
        tables.recipe_tags.retain(|(_, tag)| *tag != id);
        Ok(tables.tags.len() < before)
    }

    async fn search_ingredients(
        &self,
        prefix: Option<&str>,
    ) -> Result<Vec<Ingredient>, QueryError> {
        let tables = self.tables.lock().unwrap();
        let prefix = prefix.map(str::to_lowercase).unwrap_or_default();

        let mut found: Vec<Ingredient> = tables
            .ingredients
            .iter()
            .filter(|i| i.name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (&a.name, &a.measurement_unit).cmp(&(&b.name, &b.measurement_unit))
        });
        Ok(found)
    }

    async fn get_ingredient(&self, id: Id) -> Result<Option<Ingredient>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn insert_ingredients(&self, ingredients: &[NewIngredient]) -> Result<u64, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        let mut created = 0;

        for ingredient in ingredients {
            let exists = tables.ingredients.iter().any(|i| {
                i.name == ingredient.name && i.measurement_unit == ingredient.measurement_unit
            });
            if exists {
                continue;
            }

            let id = tables.id();
            tables.ingredients.push(Ingredient {
                id,
                name: ingredient.name.to_owned(),
                measurement_unit: ingredient.measurement_unit.to_owned(),
            });
            created += 1;
        }

        Ok(created)
    }

    async fn existing_ingredient_ids(&self, ids: &[Id]) -> Result<Vec<Id>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .ingredients
            .iter()
            .map(|i| i.id)
            .filter(|id| ids.contains(id))
            .collect())
    }

    async fn delete_ingredient(&self, id: Id) -> Result<bool, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.ingredients.len();
        tables.ingredients.retain(|i| i.id != id);
        tables
            .recipe_ingredients
            .retain(|(_, ingredient, _)| *ingredient != id);
        Ok(tables.ingredients.len() < before)
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        request: &PageRequest,
    ) -> Result<Vec<RecipeRow>, QueryError> {
        let tables = self.tables.lock().unwrap();

        let mut recipes: Vec<Recipe> = tables
            .recipes
            .iter()
            .filter(|r| filter.author.map_or(true, |author| r.author_id == author))
            .filter(|r| filter.tags.is_empty() || tables.recipe_has_tag(r.id, &filter.tags))
            .filter(|r| {
                filter
                    .favorited_by
                    .map_or(true, |user| tables.favorites.contains(&(user, r.id)))
            })
            .filter(|r| {
                filter
                    .in_cart_of
                    .map_or(true, |user| tables.shopping_cart.contains(&(user, r.id)))
            })
            .cloned()
            .collect();
        recipes.sort_by(|a, b| (b.pub_date, b.id).cmp(&(a.pub_date, a.id)));

        let count = recipes.len() as i64;
        Ok(page(recipes, request)
            .into_iter()
            .map(|recipe| RecipeRow { recipe, count })
            .collect())
    }

    async fn list_author_recipes(
        &self,
        author_id: Id,
        limit: Option<i64>,
    ) -> Result<Vec<Recipe>, QueryError> {
        let tables = self.tables.lock().unwrap();
        let mut recipes: Vec<Recipe> = tables
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .cloned()
            .collect();
        recipes.sort_by(|a, b| (b.pub_date, b.id).cmp(&(a.pub_date, a.id)));

        if let Some(limit) = limit {
            recipes.truncate(limit as usize);
        }
        Ok(recipes)
    }

    async fn count_author_recipes(&self, author_id: Id) -> Result<i64, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .count() as i64)
    }

    async fn get_recipe(&self, id: Id) -> Result<Option<Recipe>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn list_recipe_tags(&self, recipe_id: Id) -> Result<Vec<Tag>, QueryError> {
        let tables = self.tables.lock().unwrap();
        let mut tags: Vec<Tag> = tables
            .tags
            .iter()
            .filter(|t| tables.recipe_tags.contains(&(recipe_id, t.id)))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn list_recipe_ingredients(
        &self,
        recipe_id: Id,
    ) -> Result<Vec<RecipeIngredient>, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .recipe_ingredients
            .iter()
            .filter(|(recipe, _, _)| *recipe == recipe_id)
            .filter_map(|(_, ingredient, amount)| {
                tables
                    .ingredients
                    .iter()
                    .find(|i| i.id == *ingredient)
                    .map(|i| RecipeIngredient {
                        id: i.id,
                        name: i.name.to_owned(),
                        measurement_unit: i.measurement_unit.to_owned(),
                        amount: *amount,
                    })
            })
            .collect())
    }

    async fn create_recipe(
        &self,
        author_id: Id,
        draft: &RecipeDraft,
        image: &str,
    ) -> Result<Id, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.id();

        tables.recipes.push(Recipe {
            id,
            author_id,
            name: draft.name.to_owned(),
            text: draft.text.to_owned(),
            image: image.to_string(),
            cooking_time: draft.cooking_time,
            pub_date: Utc::now(),
        });
        tables.replace_lines(id, draft);

        Ok(id)
    }

    async fn update_recipe(
        &self,
        id: Id,
        draft: &RecipeDraft,
        image: Option<&str>,
    ) -> Result<(), QueryError> {
        let mut tables = self.tables.lock().unwrap();
        let recipe = tables
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(QueryError::RowNotFound)?;

        recipe.name = draft.name.to_owned();
        recipe.text = draft.text.to_owned();
        recipe.cooking_time = draft.cooking_time;
        if let Some(image) = image {
            recipe.image = image.to_string();
        }
        tables.replace_lines(id, draft);

        Ok(())
    }

    async fn delete_recipe(&self, id: Id) -> Result<(), QueryError> {
        let mut tables = self.tables.lock().unwrap();
        tables.recipes.retain(|r| r.id != id);
        tables.recipe_ingredients.retain(|(recipe, _, _)| *recipe != id);
        tables.recipe_tags.retain(|(recipe, _)| *recipe != id);
        tables.favorites.retain(|(_, recipe)| *recipe != id);
        tables.shopping_cart.retain(|(_, recipe)| *recipe != id);
        Ok(())
    }

    async fn add_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.recipes.iter().any(|r| r.id == recipe_id) {
            return Err(QueryError::ForeignKey(format!(
                "{}_recipe_id_fkey",
                kind.table()
            )));
        }
        Ok(tables.memberships(kind).insert((user_id, recipe_id)))
    }

    async fn remove_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.memberships(kind).remove(&(user_id, recipe_id)))
    }

    async fn has_membership(
        &self,
        kind: Membership,
        user_id: Id,
        recipe_id: Id,
    ) -> Result<bool, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.memberships(kind).contains(&(user_id, recipe_id)))
    }

    async fn add_subscription(&self, subscriber: Id, target: Id) -> Result<bool, QueryError> {
        if subscriber == target {
            return Err(QueryError::Check(String::from("prevent_self_follow")));
        }
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.subscriptions.insert((subscriber, target)))
    }

    async fn remove_subscription(&self, subscriber: Id, target: Id) -> Result<bool, QueryError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.subscriptions.remove(&(subscriber, target)))
    }

    async fn is_subscribed(&self, subscriber: Id, target: Id) -> Result<bool, QueryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.subscriptions.contains(&(subscriber, target)))
    }

    async fn list_subscriptions(
        &self,
        subscriber: Id,
        request: &PageRequest,
    ) -> Result<Vec<UserRow>, QueryError> {
        let tables = self.tables.lock().unwrap();
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| tables.subscriptions.contains(&(subscriber, u.id)))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));

        let count = users.len() as i64;
        Ok(page(users, request)
            .into_iter()
            .map(|user| UserRow { user, count })
            .collect())
    }

    async fn shopping_list(&self, user_id: Id) -> Result<Vec<ShoppingListLine>, QueryError> {
        let tables = self.tables.lock().unwrap();
        let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

        for (recipe, ingredient, amount) in &tables.recipe_ingredients {
            if !tables.shopping_cart.contains(&(user_id, *recipe)) {
                continue;
            }
            if let Some(i) = tables.ingredients.iter().find(|i| i.id == *ingredient) {
                *totals
                    .entry((i.name.to_owned(), i.measurement_unit.to_owned()))
                    .or_default() += i64::from(*amount);
            }
        }

        Ok(totals
            .into_iter()
            .map(|((name, measurement_unit), amount)| ShoppingListLine {
                name,
                measurement_unit,
                amount,
            })
            .collect())
    }
}

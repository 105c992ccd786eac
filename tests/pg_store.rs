//! Runs the sqlx queries against a live Postgres. Each test gets a fresh database with the
//! migrations applied. Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use anyhow::Result;
use foodgram::{
    actions::PgStore,
    pagination::PageRequest,
    schema::{
        Id, IngredientAmount, Membership, NewIngredient, NewTag, NewUser, RecipeDraft,
        RecipeFilter, ShoppingListLine,
    },
    store::Store,
    QueryError,
};
use sqlx::PgPool;

const FIRST_PAGE: PageRequest = PageRequest { page: 1, limit: 10 };

async fn user(store: &PgStore, username: &str) -> Result<Id> {
    let user = store
        .create_user(&NewUser {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: String::from("Test"),
            last_name: String::from("User"),
            password: String::from("hash"),
        })
        .await?;
    Ok(user.id)
}

async fn catalog(store: &PgStore) -> Result<(Id, Id, Id)> {
    store
        .insert_ingredients(&[
            NewIngredient {
                name: String::from("Flour"),
                measurement_unit: String::from("g"),
            },
            NewIngredient {
                name: String::from("Milk"),
                measurement_unit: String::from("ml"),
            },
        ])
        .await?;
    let found = store.search_ingredients(None).await?;
    let (tag, _) = store
        .get_or_create_tag(&NewTag {
            name: String::from("Lunch"),
            color: String::from("#49B64E"),
            slug: String::from("lunch"),
        })
        .await?;

    Ok((found[0].id, found[1].id, tag.id))
}

fn draft(name: &str, tags: Vec<Id>, lines: &[(Id, i32)]) -> RecipeDraft {
    RecipeDraft {
        name: name.to_string(),
        text: String::from("Cook it."),
        cooking_time: 10,
        image: None,
        tags,
        ingredients: lines
            .iter()
            .map(|(id, amount)| IngredientAmount {
                id: *id,
                amount: *amount,
            })
            .collect(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at Postgres"]
async fn shopping_list_is_summed_by_the_database(pool: PgPool) -> Result<()> {
    let store = PgStore::new(pool);
    let shopper = user(&store, "shopper").await?;
    let (flour, milk, lunch) = catalog(&store).await?;

    let bread = store
        .create_recipe(shopper, &draft("Bread", vec![lunch], &[(flour, 100)]), "a.png")
        .await?;
    let pancakes = store
        .create_recipe(
            shopper,
            &draft("Pancakes", vec![], &[(flour, 50), (milk, 200)]),
            "b.png",
        )
        .await?;
    store
        .create_recipe(shopper, &draft("Cake", vec![], &[(flour, 999)]), "c.png")
        .await?;

    for recipe in [bread, pancakes] {
        assert!(store.add_membership(Membership::ShoppingCart, shopper, recipe).await?);
    }

    assert_eq!(
        store.shopping_list(shopper).await?,
        vec![
            ShoppingListLine {
                name: String::from("Flour"),
                measurement_unit: String::from("g"),
                amount: 150,
            },
            ShoppingListLine {
                name: String::from("Milk"),
                measurement_unit: String::from("ml"),
                amount: 200,
            },
        ]
    );
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at Postgres"]
async fn repeated_memberships_and_follows_report_duplicates(pool: PgPool) -> Result<()> {
    let store = PgStore::new(pool);
    let reader = user(&store, "reader").await?;
    let writer = user(&store, "writer").await?;
    let (flour, _, _) = catalog(&store).await?;
    let recipe = store
        .create_recipe(writer, &draft("Bread", vec![], &[(flour, 1)]), "a.png")
        .await?;

    assert!(store.add_membership(Membership::Favorite, reader, recipe).await?);
    assert!(!store.add_membership(Membership::Favorite, reader, recipe).await?);
    assert!(store.has_membership(Membership::Favorite, reader, recipe).await?);
    assert!(store.remove_membership(Membership::Favorite, reader, recipe).await?);
    assert!(!store.remove_membership(Membership::Favorite, reader, recipe).await?);

    assert!(store.add_subscription(reader, writer).await?);
    assert!(!store.add_subscription(reader, writer).await?);
    assert!(matches!(
        store.add_subscription(reader, reader).await,
        Err(QueryError::Check(constraint)) if constraint == "prevent_self_follow"
    ));

    let following = store.list_subscriptions(reader, &FIRST_PAGE).await?;
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].user.id, writer);
    assert_eq!(following[0].count, 1);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at Postgres"]
async fn update_replaces_ingredient_lines_and_tags(pool: PgPool) -> Result<()> {
    let store = PgStore::new(pool);
    let author = user(&store, "author").await?;
    let (flour, milk, lunch) = catalog(&store).await?;
    let recipe = store
        .create_recipe(
            author,
            &draft("Pancakes", vec![lunch], &[(flour, 100), (milk, 200)]),
            "a.png",
        )
        .await?;

    store
        .update_recipe(recipe, &draft("Flatbread", vec![], &[(flour, 300)]), None)
        .await?;

    let lines = store.list_recipe_ingredients(recipe).await?;
    assert_eq!(lines.len(), 1);
    assert_eq!((lines[0].id, lines[0].amount), (flour, 300));
    assert!(store.list_recipe_tags(recipe).await?.is_empty());

    let stored = store.get_recipe(recipe).await?.expect("recipe exists");
    assert_eq!(stored.name, "Flatbread");
    assert_eq!(stored.image, "a.png");
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at Postgres"]
async fn listing_filters_compose(pool: PgPool) -> Result<()> {
    let store = PgStore::new(pool);
    let author = user(&store, "author").await?;
    let other = user(&store, "other").await?;
    let (flour, _, lunch) = catalog(&store).await?;

    let tagged = store
        .create_recipe(author, &draft("Tagged", vec![lunch], &[(flour, 1)]), "a.png")
        .await?;
    store
        .create_recipe(author, &draft("Plain", vec![], &[(flour, 1)]), "b.png")
        .await?;
    store
        .create_recipe(other, &draft("Foreign", vec![lunch], &[(flour, 1)]), "c.png")
        .await?;
    store.add_membership(Membership::Favorite, other, tagged).await?;

    let by_author = RecipeFilter {
        author: Some(author),
        ..Default::default()
    };
    let rows = store.list_recipes(&by_author, &FIRST_PAGE).await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].count, 2);
    assert_eq!(rows[0].recipe.name, "Plain");

    let lunch_by_author = RecipeFilter {
        author: Some(author),
        tags: vec![String::from("lunch")],
        ..Default::default()
    };
    let rows = store.list_recipes(&lunch_by_author, &FIRST_PAGE).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].recipe.id, tagged);

    let favorites = RecipeFilter {
        favorited_by: Some(other),
        ..Default::default()
    };
    let rows = store.list_recipes(&favorites, &FIRST_PAGE).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].recipe.id, tagged);

    let second_page = PageRequest { page: 2, limit: 2 };
    let rows = store.list_recipes(&RecipeFilter::default(), &second_page).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].count, 3);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at Postgres"]
async fn ingredient_import_skips_existing_pairs(pool: PgPool) -> Result<()> {
    let store = PgStore::new(pool);
    catalog(&store).await?;

    let again = store
        .insert_ingredients(&[
            NewIngredient {
                name: String::from("Flour"),
                measurement_unit: String::from("g"),
            },
            NewIngredient {
                name: String::from("Flour"),
                measurement_unit: String::from("kg"),
            },
        ])
        .await?;

    assert_eq!(again, 1);
    assert_eq!(store.search_ingredients(Some("FL")).await?.len(), 2);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL pointing at Postgres"]
async fn deletes_cascade_and_dangling_references_are_reported(pool: PgPool) -> Result<()> {
    let store = PgStore::new(pool);
    let author = user(&store, "author").await?;
    let (flour, milk, lunch) = catalog(&store).await?;
    let recipe = store
        .create_recipe(
            author,
            &draft("Pancakes", vec![lunch], &[(flour, 100), (milk, 200)]),
            "a.png",
        )
        .await?;

    assert!(store.delete_tag(lunch).await?);
    assert!(!store.delete_tag(lunch).await?);
    assert!(store.delete_ingredient(milk).await?);
    assert!(store.list_recipe_tags(recipe).await?.is_empty());
    assert_eq!(store.list_recipe_ingredients(recipe).await?.len(), 1);
    assert!(store.existing_tag_slugs(&[String::from("lunch")]).await?.is_empty());

    store.delete_recipe(recipe).await?;
    assert!(matches!(
        store.add_membership(Membership::ShoppingCart, author, recipe).await,
        Err(QueryError::ForeignKey(constraint)) if constraint == "shopping_cart_recipe_id_fkey"
    ));
    Ok(())
}

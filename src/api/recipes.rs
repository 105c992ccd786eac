use std::sync::Arc;

use warp::{
    filters::BoxedFilter,
    http::{header, StatusCode},
    reject::Rejection,
    reply::{Reply, Response},
    Filter,
};

use super::{json, json_body, no_content};
use crate::{
    form::Form,
    jwt::SessionData,
    memberships,
    middleware::{with_possible_session, with_session, with_state},
    pagination::PageLink,
    recipes,
    schema::{Id, Membership},
    shopping_list::ShoppingList,
    state::State,
    SHOPPING_LIST_FILENAME,
};

pub fn routes(state: Arc<State>) -> BoxedFilter<(Response,)> {
    let list = warp::path!("recipes")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(with_possible_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(create_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(download_shopping_cart);

    let detail = warp::path!("recipes" / Id)
        .and(warp::get())
        .and(with_possible_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_recipe);

    let update = warp::path!("recipes" / Id)
        .and(warp::patch())
        .and(with_session(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(update_recipe);

    let delete = warp::path!("recipes" / Id)
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(delete_recipe);

    list.or(create)
        .unify()
        .or(download)
        .unify()
        .or(detail)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(membership_routes(
            state.clone(),
            "favorite",
            Membership::Favorite,
        ))
        .unify()
        .or(membership_routes(
            state,
            "shopping_cart",
            Membership::ShoppingCart,
        ))
        .unify()
        .boxed()
}

/// POST adds the recipe to the set, DELETE removes it.
fn membership_routes(
    state: Arc<State>,
    segment: &'static str,
    kind: Membership,
) -> BoxedFilter<(Response,)> {
    let path = warp::path("recipes")
        .and(warp::path::param::<Id>())
        .and(warp::path(segment))
        .and(warp::path::end());

    let add = path
        .clone()
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(move |recipe_id: Id, session: SessionData, state: Arc<State>| {
            add_membership(kind, recipe_id, session, state)
        });

    let remove = path
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state))
        .and_then(move |recipe_id: Id, session: SessionData, state: Arc<State>| {
            remove_membership(kind, recipe_id, session, state)
        });

    add.or(remove).unify().boxed()
}

async fn list_recipes(
    query: Vec<(String, String)>,
    session: Option<SessionData>,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let link = PageLink::new("/api/recipes/", &query);
    let page = recipes::list(&state, session.as_ref(), &query, &link).await?;
    Ok(json(&page, StatusCode::OK))
}

async fn create_recipe(
    session: SessionData,
    form: Form,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let recipe = recipes::create(&state, &session, &form).await?;
    Ok(json(&recipe, StatusCode::CREATED))
}

async fn get_recipe(
    id: Id,
    session: Option<SessionData>,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let recipe = recipes::get(&state, session.as_ref(), id).await?;
    Ok(json(&recipe, StatusCode::OK))
}

async fn update_recipe(
    id: Id,
    session: SessionData,
    form: Form,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let recipe = recipes::update(&state, &session, id, &form).await?;
    Ok(json(&recipe, StatusCode::OK))
}

async fn delete_recipe(
    id: Id,
    session: SessionData,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    recipes::delete(&state, &session, id).await?;
    Ok(no_content())
}

async fn add_membership(
    kind: Membership,
    recipe_id: Id,
    session: SessionData,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let summary = memberships::add(&state, &session, kind, recipe_id).await?;
    Ok(json(&summary, StatusCode::CREATED))
}

async fn remove_membership(
    kind: Membership,
    recipe_id: Id,
    session: SessionData,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    memberships::remove(&state, &session, kind, recipe_id).await?;
    Ok(no_content())
}

async fn download_shopping_cart(
    session: SessionData,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let list = ShoppingList::for_user(&state, &session).await?;

    let reply = warp::reply::with_header(
        list.render(),
        header::CONTENT_TYPE,
        "text/plain; charset=utf-8",
    );
    let reply = warp::reply::with_header(
        reply,
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    );

    Ok(reply.into_response())
}

use std::sync::Arc;

use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter};

use super::{json, no_content};
use crate::{
    catalog,
    jwt::SessionData,
    middleware::{with_session, with_state},
    pagination::query_value,
    schema::Id,
    state::State,
};

pub fn routes(state: Arc<State>) -> BoxedFilter<(Response,)> {
    let search = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(with_state(state.clone()))
        .and_then(search_ingredients);

    let detail = warp::path!("ingredients" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_ingredient);

    let delete = warp::path!("ingredients" / Id)
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state))
        .and_then(delete_ingredient);

    search.or(detail).unify().or(delete).unify().boxed()
}

async fn search_ingredients(
    query: Vec<(String, String)>,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let ingredients = catalog::search_ingredients(&state, query_value(&query, "name")).await?;
    Ok(json(&ingredients, StatusCode::OK))
}

async fn get_ingredient(id: Id, state: Arc<State>) -> Result<Response, Rejection> {
    let ingredient = catalog::get_ingredient(&state, id).await?;
    Ok(json(&ingredient, StatusCode::OK))
}

async fn delete_ingredient(
    id: Id,
    session: SessionData,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    catalog::delete_ingredient(&state, &session, id).await?;
    Ok(no_content())
}

use std::sync::Arc;

use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter};

use super::{json, no_content};
use crate::{
    catalog,
    jwt::SessionData,
    middleware::{with_session, with_state},
    schema::Id,
    state::State,
};

pub fn routes(state: Arc<State>) -> BoxedFilter<(Response,)> {
    let list = warp::path!("tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_tags);

    let detail = warp::path!("tags" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_tag);

    let delete = warp::path!("tags" / Id)
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state))
        .and_then(delete_tag);

    list.or(detail).unify().or(delete).unify().boxed()
}

async fn list_tags(state: Arc<State>) -> Result<Response, Rejection> {
    let tags = catalog::list_tags(&state).await?;
    Ok(json(&tags, StatusCode::OK))
}

async fn get_tag(id: Id, state: Arc<State>) -> Result<Response, Rejection> {
    let tag = catalog::get_tag(&state, id).await?;
    Ok(json(&tag, StatusCode::OK))
}

async fn delete_tag(id: Id, session: SessionData, state: Arc<State>) -> Result<Response, Rejection> {
    catalog::delete_tag(&state, &session, id).await?;
    Ok(no_content())
}

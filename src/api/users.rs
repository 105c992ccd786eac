use std::sync::Arc;

use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter};

use super::{json, json_body, no_content};
use crate::{
    form::Form,
    jwt::SessionData,
    middleware::{with_possible_session, with_session, with_state},
    pagination::PageLink,
    schema::Id,
    state::State,
    subscriptions, users,
};

pub fn routes(state: Arc<State>) -> BoxedFilter<(Response,)> {
    let list = warp::path!("users")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(with_possible_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(list_users);

    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(register_user);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(set_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(list_subscriptions);

    let detail = warp::path!("users" / Id)
        .and(warp::get())
        .and(with_possible_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_user);

    let subscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::post())
        .and(warp::query::<Vec<(String, String)>>())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(subscribe);

    let unsubscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state))
        .and_then(unsubscribe);

    list.or(register)
        .unify()
        .or(me)
        .unify()
        .or(set_password)
        .unify()
        .or(subscriptions)
        .unify()
        .or(detail)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .boxed()
}

async fn list_users(
    query: Vec<(String, String)>,
    session: Option<SessionData>,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let link = PageLink::new("/api/users/", &query);
    let page = users::list(&state, session.as_ref(), &query, &link).await?;
    Ok(json(&page, StatusCode::OK))
}

async fn register_user(form: Form, state: Arc<State>) -> Result<Response, Rejection> {
    let user = users::register(&state, &form).await?;
    Ok(json(&user, StatusCode::CREATED))
}

async fn get_me(session: SessionData, state: Arc<State>) -> Result<Response, Rejection> {
    let profile = users::me(&state, &session).await?;
    Ok(json(&profile, StatusCode::OK))
}

async fn set_password(
    session: SessionData,
    form: Form,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    users::set_password(&state, &session, &form).await?;
    Ok(no_content())
}

async fn list_subscriptions(
    query: Vec<(String, String)>,
    session: SessionData,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let link = PageLink::new("/api/users/subscriptions/", &query);
    let page = subscriptions::list(&state, &session, &query, &link).await?;
    Ok(json(&page, StatusCode::OK))
}

async fn get_user(
    id: Id,
    session: Option<SessionData>,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let profile = users::get(&state, session.as_ref(), id).await?;
    Ok(json(&profile, StatusCode::OK))
}

async fn subscribe(
    id: Id,
    query: Vec<(String, String)>,
    session: SessionData,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    let limit = subscriptions::recipes_limit(&query);
    let profile = subscriptions::subscribe(&state, &session, id, limit).await?;
    Ok(json(&profile, StatusCode::CREATED))
}

async fn unsubscribe(
    id: Id,
    session: SessionData,
    state: Arc<State>,
) -> Result<Response, Rejection> {
    subscriptions::unsubscribe(&state, &session, id).await?;
    Ok(no_content())
}

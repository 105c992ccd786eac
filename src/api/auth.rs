use std::sync::Arc;

use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter};

use super::{json, json_body, no_content};
use crate::{
    form::Form,
    jwt::SessionData,
    middleware::{with_session, with_state},
    state::State,
    users,
};

pub fn routes(state: Arc<State>) -> BoxedFilter<(Response,)> {
    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(login);

    let logout = warp::path!("auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(state))
        .and_then(logout);

    login.or(logout).unify().boxed()
}

async fn login(form: Form, state: Arc<State>) -> Result<Response, Rejection> {
    let token = users::login(&state, &form).await?;
    Ok(json(&token, StatusCode::OK))
}

/// Tokens are stateless; logging out only checks that the caller held a valid one.
async fn logout(session: SessionData) -> Result<Response, Rejection> {
    log::debug!("User {} logged out", session.user_id);
    Ok(no_content())
}

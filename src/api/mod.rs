pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;


use std::{convert::Infallible, sync::Arc};

use serde::Serialize;
use warp::{
    filters::BoxedFilter,
    http::StatusCode,
    reject::Rejection,
    reply::{Reply, Response},
    Filter,
};

use crate::{
    error::{ApiError, ErrorBody},
    form::{Form, FormData},
    state::State,
    BODY_SIZE_LIMIT,
};

/// Every route of the service, including the media directory and the rejection handler.
pub fn routes(
    state: Arc<State>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let api = warp::path("api").and(
        tags::routes(state.clone())
            .or(ingredients::routes(state.clone()))
            .unify()
            .or(recipes::routes(state.clone()))
            .unify()
            .or(users::routes(state.clone()))
            .unify()
            .or(auth::routes(state.clone()))
            .unify(),
    );

    api.or(media(&state))
        .unify()
        .recover(handle_rejection)
        .unify()
        .with(warp::log("foodgram::api"))
}

/// Serves stored images read-only under the configured media url.
fn media(state: &State) -> BoxedFilter<(Response,)> {
    let prefix = state
        .media
        .url("")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(warp::any().boxed(), |filter, segment| {
            filter.and(warp::path(segment.to_string())).boxed()
        });

    prefix
        .and(warp::get())
        .and(warp::fs::dir(state.media.root().to_path_buf()))
        .map(|file: warp::fs::File| file.into_response())
        .boxed()
}

pub(crate) fn json_body() -> impl Filter<Extract = (Form,), Error = Rejection> + Clone {
    warp::body::content_length_limit(BODY_SIZE_LIMIT)
        .and(warp::body::json::<FormData>())
        .map(Form::from_data)
}

pub(crate) fn json<T: Serialize>(value: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

pub(crate) fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (code, message) = if let Some(e) = err.find::<ApiError>() {
        if let ApiError::Internal(info) = e {
            log::error!("Request failed: {info}");
        }
        (e.code(), e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found."))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, String::from("Invalid query string."))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            String::from("Request body is too large."),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            String::from("Request body must be JSON."),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed."),
        )
    } else {
        log::error!("Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    Ok(json(&ErrorBody { errors: message }, code))
}

use std::{convert::Infallible, sync::Arc};

use warp::{reject::Rejection, Filter};

use super::jwt::SessionData;
use crate::{error::ApiError, state::State};

pub fn with_state(
    state: Arc<State>,
) -> impl Filter<Extract = (Arc<State>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Requires a valid `Authorization: Token <jwt>` (or `Bearer`) header.
pub fn with_session(
    state: Arc<State>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_possible_session(state).and_then(|session: Option<SessionData>| async move {
        session.ok_or_else(|| Rejection::from(ApiError::Unauthorized))
    })
}

/// Anonymous requests pass through as `None`; a present but invalid token is rejected.
pub fn with_possible_session(
    state: Arc<State>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_state(state))
        .and_then(resolve_session)
}

async fn resolve_session(
    header: Option<String>,
    state: Arc<State>,
) -> Result<Option<SessionData>, Rejection> {
    let header = match header {
        Some(header) => header,
        None => return Ok(None),
    };

    let token = parse_authorization(&header).ok_or(ApiError::Unauthorized)?;
    let session = state.tokens.verify_session(token)?;

    Ok(Some(session.into()))
}

fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if token.is_empty() {
        return None;
    }

    match scheme {
        "Token" | "Bearer" => Some(token),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_authorization;

    #[test]
    fn token_and_bearer_schemes_are_accepted() {
        assert_eq!(parse_authorization("Token abc.def"), Some("abc.def"));
        assert_eq!(parse_authorization("Bearer abc.def"), Some("abc.def"));
        assert_eq!(parse_authorization("Basic abc"), None);
        assert_eq!(parse_authorization("Token "), None);
    }
}

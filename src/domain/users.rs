use serde::Serialize;

use crate::{
    cryptography::{hash_password, verify_password},
    error::ApiError,
    form::Form,
    jwt::SessionData,
    pagination::{PageContext, PageLink},
    permissions::{authorize, ActionType, Resource},
    projection::Profile,
    schema::{Id, NewUser, User},
    state::State,
    validation, FIELD_MAX_LENGTH,
};

#[derive(Serialize, Debug)]
pub struct AuthToken {
    pub auth_token: String,
}

pub async fn register(state: &State, form: &Form) -> Result<User, ApiError> {
    let user = validation::new_user(form)?;
    let password = hash(&user.password)?;

    let user = state
        .store
        .create_user(&NewUser { password, ..user })
        .await?;

    log::info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

pub async fn login(state: &State, form: &Form) -> Result<AuthToken, ApiError> {
    form.require("email")?;
    form.require("password")?;
    let email = form.get_str("email")?;
    let password = form.get_value::<String>("password")?;

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let verified = verify_password(&password, &user.password).map_err(|e| {
        log::error!("Stored password hash of user {} is unreadable: {e}", user.id);
        ApiError::InvalidCredentials
    })?;
    if !verified {
        log::debug!("Failed login for user {}", user.id);
        return Err(ApiError::InvalidCredentials);
    }

    Ok(AuthToken {
        auth_token: state.tokens.generate_session(&user)?,
    })
}

pub async fn set_password(
    state: &State,
    session: &SessionData,
    form: &Form,
) -> Result<(), ApiError> {
    authorize(
        Some(session),
        ActionType::ManageOwnAccount,
        Resource::Collection,
    )
    .into_result()?;

    form.require("new_password")?;
    form.require("current_password")?;
    let new_password = form.get_value::<String>("new_password")?;
    let current_password = form.get_value::<String>("current_password")?;

    if new_password.chars().count() > FIELD_MAX_LENGTH {
        return Err(ApiError::Validation(format!(
            "'new_password': Ensure this field has no more than {FIELD_MAX_LENGTH} characters."
        )));
    }

    let user = find(state, session.user_id).await?;
    let verified = verify_password(&current_password, &user.password)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !verified {
        return Err(ApiError::Validation(String::from(
            "'current_password': Invalid password.",
        )));
    }

    state
        .store
        .set_password(user.id, &hash(&new_password)?)
        .await?;

    log::info!("User {} changed their password", user.id);
    Ok(())
}

pub async fn me(state: &State, session: &SessionData) -> Result<Profile, ApiError> {
    let user = find(state, session.user_id).await?;
    Ok(Profile::build(state, &user, Some(session)).await)
}

pub async fn get(
    state: &State,
    viewer: Option<&SessionData>,
    id: Id,
) -> Result<Profile, ApiError> {
    let user = find(state, id).await?;
    Ok(Profile::build(state, &user, viewer).await)
}

pub async fn list(
    state: &State,
    viewer: Option<&SessionData>,
    query: &[(String, String)],
    link: &PageLink,
) -> Result<PageContext<Profile>, ApiError> {
    let request = state.paginator.request(query)?;

    let rows = state.store.list_users(&request).await?;
    let total = rows.first().map(|row| row.count).unwrap_or(0);

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        results.push(Profile::build(state, &row.user, viewer).await);
    }

    PageContext::from_rows(results, total, &request, link)
}

async fn find(state: &State, id: Id) -> Result<User, ApiError> {
    state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| {
        log::error!("Failed to hash password: {e}");
        ApiError::Internal(e.to_string())
    })
}

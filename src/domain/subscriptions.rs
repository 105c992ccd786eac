use crate::{
    error::ApiError,
    jwt::SessionData,
    pagination::{query_value, PageContext, PageLink},
    permissions::{authorize, ActionType, Resource},
    projection::{Profile, SubscriptionProfile},
    schema::{Id, User},
    state::State,
};

/// `recipes_limit` is honoured only when it is a plain non-negative integer.
pub fn recipes_limit(query: &[(String, String)]) -> Option<i64> {
    query_value(query, "recipes_limit")
        .filter(|limit| !limit.is_empty() && limit.chars().all(|c| c.is_ascii_digit()))
        .and_then(|limit| limit.parse().ok())
}

async fn target(state: &State, session: &SessionData, target_id: Id) -> Result<User, ApiError> {
    authorize(
        Some(session),
        ActionType::ManageSubscriptions,
        Resource::Collection,
    )
    .into_result()?;

    if target_id == session.user_id {
        return Err(ApiError::SelfSubscription);
    }

    state
        .store
        .get_user(target_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn subscribe(
    state: &State,
    session: &SessionData,
    target_id: Id,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionProfile, ApiError> {
    let target = target(state, session, target_id).await?;

    if !state
        .store
        .add_subscription(session.user_id, target.id)
        .await?
    {
        return Err(ApiError::Duplicate(String::from(
            "Subscription already exists",
        )));
    }

    log::debug!("User {} subscribed to {}", session.user_id, target.id);
    Profile::build(state, &target, Some(session))
        .await
        .with_recipes(state, recipes_limit)
        .await
}

pub async fn unsubscribe(
    state: &State,
    session: &SessionData,
    target_id: Id,
) -> Result<(), ApiError> {
    let target = target(state, session, target_id).await?;

    if !state
        .store
        .remove_subscription(session.user_id, target.id)
        .await?
    {
        return Err(ApiError::NotFound(String::from(
            "Subscription does not exist",
        )));
    }

    Ok(())
}

pub async fn list(
    state: &State,
    session: &SessionData,
    query: &[(String, String)],
    link: &PageLink,
) -> Result<PageContext<SubscriptionProfile>, ApiError> {
    let request = state.paginator.request(query)?;
    let limit = recipes_limit(query);

    let rows = state
        .store
        .list_subscriptions(session.user_id, &request)
        .await?;
    let total = rows.first().map(|row| row.count).unwrap_or(0);

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let profile = Profile::build(state, &row.user, Some(session)).await;
        results.push(profile.with_recipes(state, limit).await?);
    }

    PageContext::from_rows(results, total, &request, link)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn recipes_limit_accepts_digits_only() {
        assert_eq!(recipes_limit(&query(&[("recipes_limit", "3")])), Some(3));
        assert_eq!(recipes_limit(&query(&[("recipes_limit", "-1")])), None);
        assert_eq!(recipes_limit(&query(&[("recipes_limit", "x")])), None);
        assert_eq!(recipes_limit(&[]), None);
    }
}

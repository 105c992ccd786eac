use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;

use crate::database::error::{QueryError, TypeError};
use crate::schema::Id;

/// Every failure a request can end in. Rendered as `{"errors": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("Cannot subscribe to yourself")]
    SelfSubscription,
    #[error("{0}")]
    NotFound(String),
    #[error("Ingredient with id {0} does not exist")]
    UnknownIngredient(Id),
    #[error("Tag with id {0} does not exist")]
    UnknownTag(Id),
    #[error("Duplicate ingredients are not allowed (id {0})")]
    DuplicateIngredient(Id),
    #[error("Cannot include duplicate tags (id {0})")]
    DuplicateTag(Id),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthorized,
    #[error("You don't have permission to perform this action")]
    Forbidden,
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Duplicate(_)
            | ApiError::SelfSubscription
            | ApiError::UnknownIngredient(_)
            | ApiError::UnknownTag(_)
            | ApiError::DuplicateIngredient(_)
            | ApiError::DuplicateTag(_)
            | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            errors: self.to_string(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{what} not found."))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: String,
}

impl warp::reject::Reject for ApiError {}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::Unique(constraint) => {
                log::debug!("Unique constraint {constraint} rejected a write");
                ApiError::Duplicate(duplicate_message(&constraint).to_string())
            }
            QueryError::Check(constraint) if constraint == "prevent_self_follow" => {
                ApiError::SelfSubscription
            }
            QueryError::Check(constraint) => {
                ApiError::Validation(format!("Value rejected by {constraint}"))
            }
            QueryError::ForeignKey(constraint) => {
                log::debug!("Foreign key {constraint} rejected a write");
                missing_reference(&constraint)
            }
            QueryError::RowNotFound => ApiError::NotFound(String::from("Not found.")),
            e => {
                log::error!("Query failed: {e}");
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<TypeError> for ApiError {
    fn from(value: TypeError) -> Self {
        ApiError::Validation(value.to_string())
    }
}

fn duplicate_message(constraint: &str) -> &'static str {
    match constraint {
        "unique_user_recipe_for_favorites" => "This recipe is already in Favorites.",
        "unique_user_recipe_for_shopping_cart" => "This recipe is already in Shopping Cart.",
        "unique_subscriber_subscribed_to" => "Subscription already exists",
        "users_email_key" => "A user with that email already exists.",
        "users_username_key" => "A user with that username already exists.",
        _ => "Object already exists.",
    }
}

/// A write referenced a row that was deleted after it had been looked up.
fn missing_reference(constraint: &str) -> ApiError {
    match constraint {
        "recipe_ingredients_ingredient_id_fkey" => ApiError::Validation(String::from(
            "'ingredients': Ingredient does not exist.",
        )),
        "recipe_tags_tag_id_fkey" => {
            ApiError::Validation(String::from("'tags': Tag does not exist."))
        }
        "subscriptions_subscribed_to_id_fkey" => ApiError::not_found("User"),
        c if c.ends_with("recipe_id_fkey") => ApiError::not_found("Recipe"),
        _ => ApiError::NotFound(String::from("Not found.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_surface_as_duplicates() {
        let error: ApiError =
            QueryError::Unique(String::from("unique_user_recipe_for_favorites")).into();

        assert!(matches!(error, ApiError::Duplicate(_)));
        assert_eq!(error.code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "This recipe is already in Favorites.");
    }

    #[test]
    fn self_follow_check_maps_to_self_subscription() {
        let error: ApiError = QueryError::Check(String::from("prevent_self_follow")).into();
        assert!(matches!(error, ApiError::SelfSubscription));
    }

    #[test]
    fn foreign_key_violations_surface_as_missing_references() {
        let error: ApiError =
            QueryError::ForeignKey(String::from("favorites_recipe_id_fkey")).into();
        assert_eq!(error.code(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "Recipe not found.");

        let error: ApiError =
            QueryError::ForeignKey(String::from("recipe_ingredients_ingredient_id_fkey")).into();
        assert_eq!(error.code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "'ingredients': Ingredient does not exist.");

        let error: ApiError = QueryError::ForeignKey(String::from("recipe_tags_tag_id_fkey")).into();
        assert_eq!(error.code(), StatusCode::BAD_REQUEST);

        let error: ApiError =
            QueryError::ForeignKey(String::from("subscriptions_subscribed_to_id_fkey")).into();
        assert_eq!(error.to_string(), "User not found.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let error: ApiError = QueryError::Other(String::from("connection reset")).into();

        assert_eq!(error.code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.body().errors, "Internal server error");
    }
}

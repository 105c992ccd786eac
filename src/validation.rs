use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    database::error::TypeError,
    error::ApiError,
    form::Form,
    schema::{Id, IngredientAmount, NewIngredient, NewTag, NewUser, RecipeDraft},
    COLOR_FIELD_MAX_LENGTH, FIELD_MAX_LENGTH, MAX_AMOUNT, MIN_AMOUNT, MIN_COOKING_TIME,
    REQUIRED_RECIPE_FIELDS, USER_EMAIL_MAX_LENGTH, USER_FIELD_MAX_LENGTH,
};

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").unwrap());
static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());
static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

#[derive(Deserialize)]
struct IngredientLine {
    id: Id,
    amount: Value,
}

/// Checks a recipe write payload. The first violated field decides the error, in the order
/// name, cooking_time, text, tags, ingredients. Existence of the referenced tags and
/// ingredients is left to the caller.
pub fn recipe_draft(form: &Form, require_image: bool) -> Result<RecipeDraft, ApiError> {
    for key in REQUIRED_RECIPE_FIELDS {
        form.require(key)?;
    }
    if require_image {
        form.require("image")?;
    }

    let name = form.get_str("name")?;
    max_length("name", &name, FIELD_MAX_LENGTH)?;

    let cooking_time = form.get_number("cooking_time")?;
    if cooking_time < MIN_COOKING_TIME {
        return Err(ApiError::Validation(format!(
            "'cooking_time': Ensure this value is greater than or equal to {MIN_COOKING_TIME}."
        )));
    }
    let cooking_time = i32::try_from(cooking_time)
        .map_err(|_e| TypeError::new("cooking_time", "Value is too large"))?;

    let text = form.get_str("text")?;

    let tags: Vec<Id> = form.get_value("tags")?;
    if let Some(id) = first_repeated(&tags) {
        return Err(ApiError::DuplicateTag(id));
    }

    let lines: Vec<IngredientLine> = form.get_value("ingredients")?;
    let ingredients = lines
        .iter()
        .map(|line| {
            Ok(IngredientAmount {
                id: line.id,
                amount: amount(&line.amount)?,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    let ids: Vec<Id> = ingredients.iter().map(|line| line.id).collect();
    if let Some(id) = first_repeated(&ids) {
        return Err(ApiError::DuplicateIngredient(id));
    }

    let image = match form.contains("image") {
        true => Some(form.get_str("image")?).filter(|image| !image.is_empty()),
        false => None,
    };

    Ok(RecipeDraft {
        name,
        text,
        cooking_time,
        image,
        tags,
        ingredients,
    })
}

fn amount(value: &Value) -> Result<i32, ApiError> {
    let amount = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| TypeError::new("amount", "A valid integer is required"))?;

    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) {
        return Err(ApiError::Validation(format!(
            "'amount': Ensure this value is between {MIN_AMOUNT} and {MAX_AMOUNT}."
        )));
    }

    // Bounded above, cannot overflow
    Ok(amount as i32)
}

fn first_repeated(ids: &[Id]) -> Option<Id> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().find(|id| !seen.insert(*id))
}

pub fn new_user(form: &Form) -> Result<NewUser, ApiError> {
    for key in ["email", "username", "first_name", "last_name", "password"] {
        form.require(key)?;
    }

    let email = form.get_str("email")?;
    max_length("email", &email, USER_EMAIL_MAX_LENGTH)?;
    if !is_email(&email) {
        return Err(ApiError::Validation(String::from(
            "'email': Enter a valid email address.",
        )));
    }

    let username = form.get_str("username")?;
    max_length("username", &username, USER_FIELD_MAX_LENGTH)?;
    if !is_username(&username) {
        return Err(ApiError::Validation(String::from(
            "'username': Enter a valid username.",
        )));
    }

    let first_name = form.get_str("first_name")?;
    max_length("first_name", &first_name, USER_FIELD_MAX_LENGTH)?;
    let last_name = form.get_str("last_name")?;
    max_length("last_name", &last_name, USER_FIELD_MAX_LENGTH)?;

    let password = form.get_value::<String>("password")?;
    max_length("password", &password, FIELD_MAX_LENGTH)?;

    Ok(NewUser {
        email,
        username,
        first_name,
        last_name,
        password,
    })
}

pub fn new_tag(tag: &NewTag) -> Result<(), ApiError> {
    if tag.name.trim().is_empty() || tag.slug.trim().is_empty() {
        return Err(ApiError::Validation(String::from(
            "Tag name and slug cannot be empty.",
        )));
    }
    max_length("name", &tag.name, FIELD_MAX_LENGTH)?;
    max_length("slug", &tag.slug, FIELD_MAX_LENGTH)?;
    max_length("color", &tag.color, COLOR_FIELD_MAX_LENGTH)?;

    if !is_hex_color(&tag.color) {
        return Err(ApiError::Validation(format!(
            "'color': {} is not a hex color.",
            tag.color
        )));
    }
    if !SLUG_RE.is_match(&tag.slug) {
        return Err(ApiError::Validation(format!(
            "'slug': {} is not a valid slug.",
            tag.slug
        )));
    }

    Ok(())
}

pub fn new_ingredient(ingredient: &NewIngredient) -> Result<(), ApiError> {
    if ingredient.name.trim().is_empty() || ingredient.measurement_unit.trim().is_empty() {
        return Err(ApiError::Validation(String::from(
            "Ingredient name and unit cannot be empty.",
        )));
    }
    max_length("name", &ingredient.name, FIELD_MAX_LENGTH)?;
    max_length("measurement_unit", &ingredient.measurement_unit, FIELD_MAX_LENGTH)
}

fn max_length(key: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "'{key}': Ensure this field has no more than {max} characters."
        )));
    }
    Ok(())
}

/// `#rgb` or `#rrggbb`.
pub fn is_hex_color(color: &str) -> bool {
    HEX_COLOR_RE.is_match(color)
}

fn is_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

fn is_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> Form {
        Form::from_data(serde_json::from_value(value).unwrap())
    }

    fn payload() -> Value {
        json!({
            "name": "Pancakes",
            "text": "Mix and fry.",
            "cooking_time": 15,
            "image": "data:image/png;base64,aGVsbG8=",
            "tags": [1, 2],
            "ingredients": [{ "id": 3, "amount": 100 }, { "id": 4, "amount": "2" }]
        })
    }

    #[test]
    fn valid_payload_becomes_a_draft() {
        let draft = recipe_draft(&form(payload()), true).unwrap();

        assert_eq!(draft.name, "Pancakes");
        assert_eq!(draft.cooking_time, 15);
        assert_eq!(draft.tags, vec![1, 2]);
        assert_eq!(
            draft.ingredients,
            vec![
                IngredientAmount { id: 3, amount: 100 },
                IngredientAmount { id: 4, amount: 2 }
            ]
        );
        assert!(draft.image.is_some());
    }

    #[test]
    fn first_violated_field_is_reported() {
        let mut body = payload();
        body["cooking_time"] = json!(null);
        body["ingredients"] = json!([]);

        let error = recipe_draft(&form(body), true).unwrap_err();
        assert_eq!(error.to_string(), "'cooking_time' cannot be empty.");
    }

    #[test]
    fn empty_ingredient_list_fails() {
        let mut body = payload();
        body["ingredients"] = json!([]);

        let error = recipe_draft(&form(body), true).unwrap_err();
        assert_eq!(error.to_string(), "'ingredients' cannot be empty.");
    }

    #[test]
    fn repeated_ingredient_is_a_duplicate() {
        let mut body = payload();
        body["ingredients"] = json!([{ "id": 3, "amount": 1 }, { "id": 3, "amount": 2 }]);

        assert!(matches!(
            recipe_draft(&form(body), true),
            Err(ApiError::DuplicateIngredient(3))
        ));
    }

    #[test]
    fn repeated_tag_is_a_duplicate() {
        let mut body = payload();
        body["tags"] = json!([2, 1, 2]);

        assert!(matches!(
            recipe_draft(&form(body), true),
            Err(ApiError::DuplicateTag(2))
        ));
    }

    #[test]
    fn amounts_and_cooking_time_are_bounded() {
        let mut body = payload();
        body["ingredients"] = json!([{ "id": 3, "amount": 32764 }]);
        assert!(matches!(
            recipe_draft(&form(body), true),
            Err(ApiError::Validation(_))
        ));

        let mut body = payload();
        body["cooking_time"] = json!(0);
        assert!(matches!(
            recipe_draft(&form(body), true),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn image_is_only_required_on_create() {
        let mut body = payload();
        body.as_object_mut().unwrap().remove("image");

        assert!(recipe_draft(&form(body.clone()), true).is_err());
        assert!(recipe_draft(&form(body), false).unwrap().image.is_none());
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#E26C2D"));
        assert!(!is_hex_color("E26C2D"));
        assert!(!is_hex_color("#E26C2"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn usernames_follow_the_word_pattern() {
        assert!(is_username("chef.anna+1@home-cooking_"));
        assert!(!is_username("chef anna"));
        assert!(!is_username("chef/anna"));
        assert!(!is_username(""));
        assert!(is_username("pâtissière_2"));
    }

    #[test]
    fn emails_need_a_domain() {
        assert!(is_email("anna@example.com"));
        assert!(!is_email("anna@example"));
        assert!(!is_email("anna example@example.com"));
        assert!(!is_email("anna@@example.com"));
    }

    #[test]
    fn slugs_are_ascii_words() {
        let tag = |slug: &str| NewTag {
            name: String::from("Lunch"),
            color: String::from("#49B64E"),
            slug: slug.to_string(),
        };

        assert!(new_tag(&tag("early-lunch_2")).is_ok());
        assert!(new_tag(&tag("early lunch")).is_err());
        assert!(new_tag(&tag("обед")).is_err());
    }

    #[test]
    fn registration_requires_every_field() {
        let error = new_user(&form(json!({
            "email": "a@b.c",
            "username": "anna",
            "first_name": "Anna",
            "password": "secret"
        })))
        .unwrap_err();

        assert_eq!(error.to_string(), "'last_name' is required but missing.");
    }
}

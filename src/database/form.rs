use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::TypeError;
use crate::error::ApiError;

pub type FormData = HashMap<String, Value>;

/// Loosely typed JSON body, checked field by field.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    /// Fails on the first key that is absent or blank (`null`, `""` or `[]`).
    pub fn require(&self, key: &str) -> Result<&Value, ApiError> {
        match self.inner.get(key) {
            None => Err(ApiError::Validation(format!(
                "'{key}' is required but missing."
            ))),
            Some(value) if is_blank(value) => {
                Err(ApiError::Validation(format!("'{key}' cannot be empty.")))
            }
            Some(value) => Ok(value),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.get(key).map(|v| !v.is_null()).unwrap_or(false)
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, TypeError>
    where
        T: DeserializeOwned,
    {
        match self.inner.get(key) {
            Some(value) => serde_json::from_value(value.to_owned())
                .map_err(|_e| TypeError::new(key, "Invalid type conversion")),
            None => Err(TypeError::new(key, "Invalid key")),
        }
    }

    /// Accepts both JSON numbers and numeric strings.
    pub fn get_number(&self, key: &str) -> Result<i64, TypeError> {
        match self.inner.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| TypeError::new(key, "A valid integer is required")),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_e| TypeError::new(key, "A valid integer is required")),
            Some(_) => Err(TypeError::new(key, "A valid integer is required")),
            None => Err(TypeError::new(key, "Invalid key")),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.trim().to_string()),
                None => Err(TypeError::new(key, "Not a valid string")),
            },
            None => Err(TypeError::new(key, "Invalid key")),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> Form {
        Form::from_data(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn missing_and_blank_fields_are_told_apart() {
        let form = form(json!({ "name": "", "tags": [] }));

        let missing = form.require("text").unwrap_err();
        assert_eq!(missing.to_string(), "'text' is required but missing.");

        let blank = form.require("name").unwrap_err();
        assert_eq!(blank.to_string(), "'name' cannot be empty.");

        assert!(form.require("tags").is_err());
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        let form = form(json!({ "a": 5, "b": " 12 ", "c": "x", "d": 1.5 }));

        assert_eq!(form.get_number("a").unwrap(), 5);
        assert_eq!(form.get_number("b").unwrap(), 12);
        assert!(form.get_number("c").is_err());
        assert!(form.get_number("d").is_err());
    }
}

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;

use crate::{pagination::PaginationConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid {key} value: {info}")]
    Invalid { key: &'static str, info: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub secret: String,
    pub token_hours: i64,
    pub pagination: PaginationConfig,
    pub media_root: PathBuf,
    pub media_url: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let pagination = PaginationConfig {
            page_size: try_load("FOODGRAM_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: try_load("FOODGRAM_MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
        };
        if pagination.page_size < 1 || pagination.max_page_size < pagination.page_size {
            return Err(ConfigError::Invalid {
                key: "FOODGRAM_PAGE_SIZE",
                info: String::from("page size must be between 1 and FOODGRAM_MAX_PAGE_SIZE"),
            });
        }

        Ok(Self {
            port: try_load("FOODGRAM_PORT", 8000)?,
            database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            redis_url: var("REDIS_URL"),
            secret: var("FOODGRAM_SECRET").unwrap_or_else(|| {
                log::warn!("FOODGRAM_SECRET not set, tokens will not survive a restart");
                random_secret()
            }),
            token_hours: try_load("FOODGRAM_TOKEN_HOURS", 24)?,
            pagination,
            media_root: PathBuf::from(
                var("FOODGRAM_MEDIA_ROOT").unwrap_or_else(|| String::from("media")),
            ),
            media_url: normalize_media_url(
                &var("FOODGRAM_MEDIA_URL").unwrap_or_else(|| String::from("/media/")),
            ),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr + Display>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match var(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| {
            log::warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                info: e.to_string(),
            }
        }),
        None => {
            log::info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

fn normalize_media_url(url: &str) -> String {
    let trimmed = url.trim_matches('/');
    if trimmed.is_empty() {
        return String::from("/");
    }
    format!("/{trimmed}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_url_is_wrapped_in_slashes() {
        assert_eq!(normalize_media_url("media"), "/media/");
        assert_eq!(normalize_media_url("/static/media/"), "/static/media/");
        assert_eq!(normalize_media_url("/"), "/");
    }

    #[test]
    fn random_secrets_differ() {
        let a = random_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, random_secret());
    }
}

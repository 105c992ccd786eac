use std::{fmt::Debug, future::Future};

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{database::error::CacheError, error::ApiError, CATALOG_CACHE_TTL, SEARCH_CACHE_TTL};

// Caching - keys

#[derive(Serialize, Clone, Debug)]
pub struct CacheKey {
    _value: String,
    _type: CacheKeyType,
}

impl CacheKey {
    pub fn from<T: ToString>(r#type: CacheKeyType, key: T) -> Self {
        Self {
            _value: key.to_string(),
            _type: r#type,
        }
    }

    pub fn lifetime(&self) -> CacheLifetime {
        match self._type {
            CacheKeyType::Tags => CacheLifetime::BindTagCache,
            CacheKeyType::Ingredients => CacheLifetime::BindIngredientCache,
        }
    }

    /// Seconds until redis drops the entry. Orphaned generations age out this way.
    pub fn expiry(&self) -> u64 {
        match self._type {
            CacheKeyType::Ingredients if !self._value.is_empty() => SEARCH_CACHE_TTL,
            _ => CATALOG_CACHE_TTL,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self._type {
            CacheKeyType::Tags => write!(f, "tags-{}", self._value),
            CacheKeyType::Ingredients => write!(f, "ingredients-{}", self._value),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKeyType {
    Tags,
    Ingredients,
}

impl CacheKeyType {
    pub fn new<T: ToString>(self, key: T) -> CacheKey {
        CacheKey::from(self, key)
    }
}

// Cache - wrappers

/// Entries are bound to a generation key; bumping the key invalidates every entry bound to it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheLifetime {
    BindTagCache,
    BindIngredientCache,
}

impl CacheLifetime {
    pub fn bind_key(&self) -> &'static str {
        match self {
            CacheLifetime::BindTagCache => "tag-cache-key",
            CacheLifetime::BindIngredientCache => "ingredient-cache-key",
        }
    }

    pub async fn get_cache_bind(
        &self,
        cache: &mut MultiplexedConnection,
    ) -> Result<Option<String>, CacheError> {
        get_cache_value::<&str, String>(self.bind_key(), cache).await
    }

    pub async fn validate_cache_bind(
        &self,
        bind: &Option<String>,
        cache: &mut MultiplexedConnection,
    ) -> Result<bool, CacheError> {
        Ok(bind == &self.get_cache_bind(cache).await?)
    }
}

#[derive(Serialize, serde::Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct RedisValue<T: serde::Serialize + Send + Sync + Clone> {
    pub value: T,
    _lifetime: CacheLifetime,
    _bind: Option<String>,
}

impl<T: serde::Serialize + Send + Sync + Clone + DeserializeOwned> RedisValue<T> {
    async fn new(
        value: T,
        lifetime: CacheLifetime,
        cache: &mut MultiplexedConnection,
    ) -> Result<Self, CacheError> {
        let bind = lifetime.get_cache_bind(cache).await?;

        Ok(Self {
            value,
            _lifetime: lifetime,
            _bind: bind,
        })
    }

    async fn validate(&self, cache: &mut MultiplexedConnection) -> Result<bool, CacheError> {
        self._lifetime.validate_cache_bind(&self._bind, cache).await
    }

    async fn lookup(key: &CacheKey, cache: &mut MultiplexedConnection) -> Option<Self> {
        let value = match get_cache_value::<String, RedisValue<T>>(key.to_string(), cache).await {
            Ok(value) => value,
            Err(e) => {
                log::error!("> Failed to read cached value {key}: {e}. Deleting");
                if let Err(e) = delete_cache_value(key.to_string(), cache).await {
                    log::error!("> Failed to delete cached value! {e}");
                }
                return None;
            }
        };

        // * Cannot use .map(|| {...}) due to async closures
        match value {
            Some(value) => {
                log::trace!("> Found {key}");
                match value.validate(cache).await {
                    Ok(true) => Some(value),
                    Ok(false) => {
                        log::trace!("> Invalidated {key}");
                        None
                    }
                    Err(e) => {
                        log::error!("> Failed to validate {key}: {e}");
                        None
                    }
                }
            }
            None => None,
        }
    }

    /// Returns the cached value or computes, stores and returns it. Cache failures are logged
    /// and fall back to `callback`, only `callback` errors reach the caller.
    pub async fn get_or<F, Fut>(
        key: CacheKey,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, ApiError>> + Send,
    {
        if let Some(value) = Self::lookup(&key, cache).await {
            return Ok(value.value);
        }

        log::trace!("> Fetching {key}");
        let value = callback().await?;

        match RedisValue::new(value.clone(), key.lifetime(), cache).await {
            Ok(entry) => {
                if let Err(e) =
                    set_expiring_cache_value(key.to_string(), entry, key.expiry(), cache).await
                {
                    log::error!("> Failed to cache {key}: {e}");
                }
            }
            Err(e) => log::error!("> Failed to read cache bind for {key}: {e}"),
        }

        Ok(value)
    }
}

/// Shared handle to the optional redis cache.
#[derive(Clone)]
pub struct Cache {
    connection: MultiplexedConnection,
}

impl Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;

        Ok(Self { connection })
    }

    pub async fn get_or<T, F, Fut>(&self, key: CacheKey, callback: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + Clone,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, ApiError>> + Send,
    {
        let mut connection = self.connection.clone();
        RedisValue::get_or(key, &mut connection, callback).await
    }

    /// Rotates the generation key, which orphans every entry bound to it.
    pub async fn invalidate(&self, lifetime: CacheLifetime) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let generation = uuid::Uuid::new_v4().to_string();

        log::info!("> Invalidating {}", lifetime.bind_key());
        set_cache_value(lifetime.bind_key(), generation, &mut connection).await
    }
}

/// Bumps `lifetime` when a cache is configured. Failures only leave stale entries until they
/// expire, so they are logged and swallowed.
pub async fn invalidate_cache(cache: Option<&Cache>, lifetime: CacheLifetime) {
    if let Some(cache) = cache {
        if let Err(e) = cache.invalidate(lifetime).await {
            log::warn!("Failed to invalidate {}: {e}", lifetime.bind_key());
        }
    }
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.set(key, value).await?;

    Ok(())
}

pub async fn set_expiring_cache_value<
    K: ToRedisArgs + Send + Sync,
    V: ToRedisArgs + Send + Sync,
>(
    key: K,
    value: V,
    seconds: u64,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.set_ex(key, value, seconds).await?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.del(key).await?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, CacheError> {
    let value: Option<V> = cache.get(key).await?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_type() {
        assert_eq!(CacheKeyType::Tags.new("all").to_string(), "tags-all");
        assert_eq!(
            CacheKeyType::Ingredients.new("fl").to_string(),
            "ingredients-fl"
        );
    }

    #[test]
    fn keys_bind_to_their_generation() {
        assert_eq!(
            CacheKeyType::Tags.new("all").lifetime(),
            CacheLifetime::BindTagCache
        );
        assert_eq!(
            CacheKeyType::Ingredients.new("").lifetime().bind_key(),
            "ingredient-cache-key"
        );
    }

    #[test]
    fn every_entry_expires() {
        let listing = CacheKeyType::Ingredients.new("");
        let search = CacheKeyType::Ingredients.new("fl");

        assert_eq!(CacheKeyType::Tags.new("all").expiry(), CATALOG_CACHE_TTL);
        assert_eq!(listing.expiry(), CATALOG_CACHE_TTL);
        assert_eq!(search.expiry(), SEARCH_CACHE_TTL);
        assert!(search.expiry() > 0 && search.expiry() < listing.expiry());
    }
}

use std::sync::Arc;

use chrono::Duration;

use crate::{
    actions::PgStore,
    config::Config,
    jwt::TokenKeys,
    media::MediaStorage,
    pagination::Paginator,
    store::Store,
    Cache,
};

/// Everything a request handler can reach.
pub struct State {
    pub store: Arc<dyn Store>,
    pub cache: Option<Cache>,
    pub paginator: Paginator,
    pub media: MediaStorage,
    pub tokens: TokenKeys,
}

impl State {
    pub fn new(
        store: Arc<dyn Store>,
        cache: Option<Cache>,
        paginator: Paginator,
        media: MediaStorage,
        tokens: TokenKeys,
    ) -> Self {
        Self {
            store,
            cache,
            paginator,
            media,
            tokens,
        }
    }

    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let store = PgStore::connect(&config.database_url, 10).await?;
        log::info!("Connected to database");

        let cache = connect_cache(config.redis_url.as_deref()).await;
        let tokens = TokenKeys::new(
            config.secret.as_bytes(),
            Duration::hours(config.token_hours),
        )?;

        Ok(Self::new(
            Arc::new(store),
            cache,
            Paginator::new(config.pagination),
            MediaStorage::new(&config.media_root, &config.media_url),
            tokens,
        ))
    }
}

/// The cache is optional; a failed connection only disables it.
pub async fn connect_cache(url: Option<&str>) -> Option<Cache> {
    let url = url?;
    match Cache::connect(url).await {
        Ok(cache) => {
            log::info!("Connected to redis cache");
            Some(cache)
        }
        Err(e) => {
            log::warn!("Redis unavailable, running without cache: {e}");
            None
        }
    }
}

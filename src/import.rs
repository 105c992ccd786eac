use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    database::error::QueryError,
    error::ApiError,
    schema::{NewIngredient, NewTag},
    store::Store,
    validation, invalidate_cache, Cache, CacheLifetime, IMPORT_CHUNK_SIZE,
};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("Invalid entry #{index}: {source}")]
    Invalid { index: usize, source: ApiError },
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub read: usize,
    pub created: u64,
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ImportError> {
    let display = path.display().to_string();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ImportError::Io {
            path: display.clone(),
            source,
        })?;

    serde_json::from_str(&raw).map_err(|source| ImportError::Parse {
        path: display,
        source,
    })
}

/// Bulk inserts `[{name, measurement_unit}]`, skipping pairs that already exist.
pub async fn import_ingredients(
    store: &dyn Store,
    cache: Option<&Cache>,
    path: &Path,
) -> Result<ImportReport, ImportError> {
    let ingredients: Vec<NewIngredient> = read_json(path).await?;
    for (index, ingredient) in ingredients.iter().enumerate() {
        validation::new_ingredient(ingredient)
            .map_err(|source| ImportError::Invalid { index, source })?;
    }

    let mut created = 0;
    for chunk in ingredients.chunks(IMPORT_CHUNK_SIZE) {
        created += store.insert_ingredients(chunk).await?;
    }

    log::info!(
        "Imported {created} new ingredients ({} read) from {}",
        ingredients.len(),
        path.display()
    );
    invalidate_cache(cache, CacheLifetime::BindIngredientCache).await;

    Ok(ImportReport {
        read: ingredients.len(),
        created,
    })
}

/// Get-or-creates every `{name, color, slug}` entry.
pub async fn import_tags(
    store: &dyn Store,
    cache: Option<&Cache>,
    path: &Path,
) -> Result<ImportReport, ImportError> {
    let tags: Vec<NewTag> = read_json(path).await?;
    for (index, tag) in tags.iter().enumerate() {
        validation::new_tag(tag).map_err(|source| ImportError::Invalid { index, source })?;
    }

    let mut created = 0;
    for tag in &tags {
        let (tag, is_new) = store.get_or_create_tag(tag).await?;
        if is_new {
            created += 1;
            log::info!("Created tag {} ({})", tag.name, tag.slug);
        } else {
            log::info!("Tag {} already exists", tag.name);
        }
    }
    invalidate_cache(cache, CacheLifetime::BindTagCache).await;

    Ok(ImportReport {
        read: tags.len(),
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use std::io::Write;

    fn json_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn ingredients_are_imported_once() {
        let store = MemoryStore::default();
        let file = json_file(
            r#"[{"name": "Flour", "measurement_unit": "g"}, {"name": "Milk", "measurement_unit": "ml"}]"#,
        );

        let first = import_ingredients(&store, None, file.path()).await.unwrap();
        assert_eq!(first, ImportReport { read: 2, created: 2 });

        let second = import_ingredients(&store, None, file.path()).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(store.search_ingredients(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn tags_are_get_or_created() {
        let store = MemoryStore::default();
        let file = json_file(r##"[{"name": "Lunch", "color": "#49B64E", "slug": "lunch"}]"##);

        let first = import_tags(&store, None, file.path()).await.unwrap();
        let second = import_tags(&store, None, file.path()).await.unwrap();

        assert_eq!(first.created, 1);
        assert_eq!(second.created, 0);
        assert_eq!(store.list_tags().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_colors_abort_the_import() {
        let store = MemoryStore::default();
        let file = json_file(r#"[{"name": "Lunch", "color": "green", "slug": "lunch"}]"#);

        let error = import_tags(&store, None, file.path()).await.unwrap_err();
        assert!(matches!(error, ImportError::Invalid { index: 0, .. }));
        assert!(store.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let store = MemoryStore::default();
        let error = import_tags(&store, None, Path::new("does/not/exist.json"))
            .await
            .unwrap_err();

        assert!(matches!(error, ImportError::Io { .. }));
    }
}

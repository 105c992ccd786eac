pub const FIELD_MAX_LENGTH: usize = 200;
pub const COLOR_FIELD_MAX_LENGTH: usize = 7;
pub const USER_FIELD_MAX_LENGTH: usize = 150;
pub const USER_EMAIL_MAX_LENGTH: usize = 254;

pub const MIN_COOKING_TIME: i64 = 1;
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32763;

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const REQUIRED_RECIPE_FIELDS: &[&str] = &["name", "cooking_time", "text", "tags", "ingredients"];

pub const IMAGE_UPLOAD_DIR: &str = "recipes/images";
pub const BODY_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

/// Seconds a cached catalog listing lives even without an invalidation.
pub const CATALOG_CACHE_TTL: u64 = 60 * 60;
/// Searches are keyed by client input, they expire sooner.
pub const SEARCH_CACHE_TTL: u64 = 5 * 60;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

pub const DEFAULT_INGREDIENTS_PATH: &str = "data/ingredients.json";
pub const DEFAULT_TAGS_PATH: &str = "data/tags.json";

/// Postgres caps bind parameters per statement, ingredient imports are chunked below it.
pub const IMPORT_CHUNK_SIZE: usize = 1000;

mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    #[cfg(test)]
    pub mod memory;
    pub mod pagination;
    pub mod schema;
    pub mod store;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod constants;

mod cache {
    pub mod cache;
}

mod domain {
    pub mod catalog;
    pub mod memberships;
    pub mod projection;
    pub mod recipes;
    pub mod shopping_list;
    pub mod subscriptions;
    pub mod users;
}

pub mod api;
pub mod config;
pub mod error;
pub mod import;
pub mod media;
pub mod state;
pub mod validation;

pub use authentication::*;
pub use cache::cache::*;
pub use constants::*;
pub use database::error::{CacheError, QueryError, TypeError};
pub use database::{actions, form, pagination, schema, store};
pub use domain::*;

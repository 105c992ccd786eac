use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unique constraint violated ({0})")]
    Unique(String),
    #[error("check constraint violated ({0})")]
    Check(String),
    #[error("foreign key violated ({0})")]
    ForeignKey(String),
    #[error("RowNotFound")]
    RowNotFound,
    #[error("{0}")]
    Other(String),
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => {
                let constraint = e.constraint().unwrap_or_default().to_string();
                match e.kind() {
                    ErrorKind::UniqueViolation => Self::Unique(constraint),
                    ErrorKind::CheckViolation => Self::Check(constraint),
                    ErrorKind::ForeignKeyViolation => Self::ForeignKey(constraint),
                    _ => Self::Other(format!("{e}")),
                }
            }
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::PoolTimedOut => Self::Other(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::Other(String::from("Pool closed")),
            sqlx::Error::ColumnNotFound(e) => Self::Other(format!("Column not found: {e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::Other(format!("Column decode {index} ({source})"))
            }
            e => Self::Other(format!("{e}")),
        }
    }
}

#[derive(Debug, Error)]
#[error("{info}")]
pub struct CacheError {
    info: String,
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl CacheError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

/// Raised when a payload field cannot be coerced into the expected type.
#[derive(Debug, Error)]
#[error("'{key}': {info}")]
pub struct TypeError {
    key: String,
    info: String,
}

impl TypeError {
    pub fn new(key: &str, info: &str) -> Self {
        Self {
            key: key.to_string(),
            info: info.to_string(),
        }
    }
}

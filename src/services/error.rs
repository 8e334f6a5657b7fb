use std::fmt;
use thiserror::Error;

use crate::db::StoreError;

/// The piece of the aggregate an operation could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Portfolio,
    Project,
    Section,
    Media,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Portfolio => "portfolio",
            Self::Project => "project",
            Self::Section => "section",
            Self::Media => "media",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("unauthorized")]
    Unauthorized,
    #[error("subdomain already taken")]
    SubdomainTaken,
    #[error("invalid media type")]
    InvalidMediaType,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("store failure: {0}")]
    Store(StoreError),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;

impl From<StoreError> for PortfolioError {
    /// The only uniqueness constraint in the store is the subdomain index, so
    /// any constraint violation on write is a taken subdomain.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => Self::SubdomainTaken,
            other => Self::Store(other),
        }
    }
}

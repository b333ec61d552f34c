//! Error types for ChainQuery Core

use thiserror::Error;

/// Failure of the model-backed classification path.
///
/// Every variant is recovered locally by the deterministic path; none of
/// them reaches the caller of `understand` or `build_query`.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Language model not configured")]
    ModelUnavailable,

    #[error("Model request failed: {0}")]
    Http(String),

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Unsupported intent: {0}")]
    UnsupportedIntent(String),
}

/// Failure of a network name lookup. Treated as "unresolved" by the extractor.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Resolver request failed: {0}")]
    Http(String),

    #[error("Name not registered: {0}")]
    NotFound(String),

    #[error("Resolver returned an invalid address: {0}")]
    InvalidAddress(String),
}

#[derive(Error, Debug)]
pub enum ChainQueryError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type ChainQueryResult<T> = Result<T, ChainQueryError>;

use thiserror::Error;

/// A request that cannot be translated into the requested query.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    #[error("The id page query requires at least one row")]
    NoRowsRequested,
    #[error("The entity query requires at least one id")]
    NoIds,
}

use thiserror::Error;

/// Errors raised by the provider bridge.
///
/// Provider and database failures carry enough context to be correlated with
/// the persisted transaction log, but none of it is meant for end users: the
/// HTTP layer maps every variant to a generic error page.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid notification version: {0}")]
    InvalidVersion(String),
    #[error("Signing error: {0}")]
    Signing(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for BridgeError {
    fn from(err: rocksdb::Error) -> Self {
        BridgeError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

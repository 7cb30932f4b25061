use thiserror::Error;

/// Failure of a single task. The runner records it and moves on.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("collection '{0}' has not been opened yet")]
    CollectionNotOpened(&'static str),

    #[error("failed to decode result: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("failed to encode result: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("unsupported server response: {0}")]
    UnsupportedServer(String),
}

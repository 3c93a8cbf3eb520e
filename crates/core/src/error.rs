use thiserror::Error;

pub type ShopfrontResult<T> = Result<T, ShopfrontError>;

#[derive(Error, Debug)]
pub enum ShopfrontError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

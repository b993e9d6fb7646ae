use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeaveError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scope tracking error: {0}")]
    Scope(String),
    #[error("reaching-definitions error: {0}")]
    Rda(String),
}

pub type Result<T> = std::result::Result<T, WeaveError>;

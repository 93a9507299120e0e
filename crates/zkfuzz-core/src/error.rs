//! Error types for the harness.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Missing weight for option: {0}")]
    MissingWeight(String),

    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    #[error("Ill-kinded expression: {0}")]
    IllKinded(String),

    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    #[error("Unsupported revision '{revision}' for target {target}")]
    UnsupportedRevision { target: String, revision: String },

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("token {token} in sequence {sequence} is outside the vocabulary of {dimension}")]
    TokenOutOfRange {
        sequence: usize,
        token: u32,
        dimension: usize,
    },

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("model is not ready: {0}")]
    NotReady(&'static str),

    #[error("empty input: {0}")]
    Empty(&'static str),

    #[error("a vocabulary of {0} words cannot hold the reserved tokens")]
    Vocabulary(usize),

    #[error("invalid layer: {0}")]
    Layer(String),

    #[error("unknown experiment: {0}")]
    UnknownExperiment(String),

    #[error("malformed dataset at {path}: {reason}")]
    Dataset { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[cfg(feature = "download")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

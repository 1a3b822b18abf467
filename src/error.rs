use crate::collector::{CollectionError, ParameterPoint};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("invalid sweep: {0}")]
    InvalidSpec(String),

    #[error("collection failed at {point}: {source}")]
    Collection {
        point: ParameterPoint,
        #[source]
        source: CollectionError,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;

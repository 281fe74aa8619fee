use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// None of the known join predicates has its columns present on both tables.
    #[error("cannot determine join between {left} and {right}")]
    SchemaMismatch { left: String, right: String },

    #[error("required input not found: {0}")]
    SourceMissing(String),

    #[error("{source_name} must contain column '{column}'")]
    MissingColumn { source_name: String, column: String },

    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

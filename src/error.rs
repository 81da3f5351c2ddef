use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Every way the pipeline can fail.
///
/// Ingestion errors (`Decode` through `FutureCovariateLength`) abort before a
/// request exists. Reconciliation errors abort the whole batch. Collaborator
/// errors (`Inference`, `Render`, `Store`) are passed through untouched.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("could not decode table: {0}")]
    Decode(String),

    #[error("no numeric column to forecast was found in the table")]
    NoNumericColumn,

    #[error("series '{item_id}' has no non-missing target values")]
    EmptyHistory { item_id: String },

    #[error("no series has future covariates, so the forecast horizon is unknown")]
    MissingHorizon,

    #[error("series '{item_id}' implies a horizon of {found}, but earlier series imply {expected}")]
    InconsistentHorizon {
        item_id: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "series '{item_id}': future covariate '{column}' has {found} values, expected {expected}"
    )]
    FutureCovariateLength {
        item_id: String,
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("forecast result has no entry for series '{item_id}'")]
    MissingItem { item_id: String },

    #[error("forecast result for series '{item_id}' is malformed: {reason}")]
    ResultShape { item_id: String, reason: String },

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("artifact store failed: {0}")]
    Store(String),
}

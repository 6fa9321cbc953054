// Error types for startup data loading and upload ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading the reference datasets (game master, multipliers, rankings).
///
/// These never abort the server: callers log them and fall back to empty tables,
/// which disables the PVP features that depend on the missing data.
#[derive(Debug, Error)]
pub enum GameDataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("game master is not a list of templates")]
    NotATemplateList,
    #[error("cp multipliers not found")]
    MissingMultipliers,
    #[error("invalid cp multiplier table: {0}")]
    InvalidMultipliers(String),
}

/// Failures while turning an uploaded export into creature records.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported export format: expected a list or an object of records")]
    UnsupportedShape,
}

use crate::models::SourceFailure;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unexpected response from catalog store: {0}")]
    Protocol(String),

    #[error("Unsupported by this backend: {0}")]
    Unsupported(String),

    #[error("all catalog sources failed ({})", summarize(.failures))]
    AllSourcesFailed { failures: Vec<SourceFailure> },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.source, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, CatalogError>;

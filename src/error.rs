use thiserror::Error;

use crate::dataset::ImportKind;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{kind} export contains no rows")]
    EmptyGrid { kind: ImportKind },

    #[error("no header row found for {kind} export (best score {best_score}, needed {min_score})")]
    HeaderNotFound {
        kind: ImportKind,
        best_score: usize,
        min_score: usize,
    },

    #[error("invalid band table: {0}")]
    InvalidBandTable(String),

    #[error("store error for {kind}: {details}")]
    Store { kind: ImportKind, details: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("workbook error: {0}")]
    Workbook(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;

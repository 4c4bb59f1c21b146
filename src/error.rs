//! Error types for the board

use crate::kanban_board::ColumnRole;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur while mutating, persisting or exporting a board
#[derive(Debug, Error)]
pub enum BoardError {
    /// A required field was left blank
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// No column carries the role a move targets
    #[error("no {role} column on this board")]
    RoleColumnMissing { role: ColumnRole },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("failed to render PDF: {0}")]
    Pdf(String),
}

/// Reasons an import file is rejected. The current board is never touched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid FlowBoard file: {} is not a .json file", path.display())]
    UnsupportedExtension { path: PathBuf },

    #[error("Invalid FlowBoard file: cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid FlowBoard file: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Invalid FlowBoard file: `columns` must be an array")]
    MissingColumns,

    #[error("Invalid FlowBoard file: {0}")]
    InvalidShape(#[source] serde_json::Error),
}

//! Error handling for tabq
//!
//! This module defines the error types shared by the query engine and the
//! command-line front end. Every failure a query can hit falls into one of
//! a small set of categories:
//!
//! - syntax errors in the query line itself
//! - schema errors (a stage referencing a column that does not exist, or a
//!   join whose sides share a non-key column name)
//! - type errors (ORDERBY on a column holding non-numeric text)
//! - I/O and file-format errors surfaced from the loader
//!
//! Schema and type errors carry the name of the failing stage and the
//! offending column so the message alone is enough to fix the query.
//!
//! The module uses thiserror to minimize boilerplate and keep error
//! handling consistent throughout the codebase.

use thiserror::Error;

/// TabqError represents all possible errors that can occur while loading
/// tables and evaluating a query pipeline
#[derive(Error, Debug)]
pub enum TabqError {
    /// Error during file system operations (opening/reading/writing files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the csv reader/writer (ragged rows included)
    #[error("format error: {0}")]
    Csv(#[from] csv::Error),

    /// Error for structurally invalid input files (empty or duplicate
    /// header, no header row at all)
    #[error("format error in '{path}': {reason}")]
    Format { path: String, reason: String },

    /// Error for a malformed query line
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Error when a stage references a column the table does not have
    #[error("{stage}: column '{column}' not found")]
    MissingColumn { stage: &'static str, column: String },

    /// Error when both join sides carry the same non-key column name
    #[error("JOIN: column '{column}' exists on both sides; rename it in one input")]
    AmbiguousColumn { column: String },

    /// Error when a numeric value was required but the cell holds text
    #[error("{stage}: column '{column}' holds non-numeric value '{value}'")]
    NotNumeric {
        stage: &'static str,
        column: String,
        value: String,
    },
}

/// Result type alias for operations that can produce a TabqError
pub type TabqResult<T> = std::result::Result<T, TabqError>;

//! Errors raised while reading upstream tables.
//!
//! Only shape errors are fatal. Dangling cross-references are tolerated
//! and reported through [`BuildReport`](crate::build::BuildReport).

use thiserror::Error;

/// A raw table could not be turned into rows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The file has no header row at all.
    #[error("{file}: missing header row")]
    MissingHeader { file: String },

    /// A data row has a different number of cells than the header.
    #[error("{file}: row {row} has {found} columns, expected {expected}")]
    ColumnMismatch {
        file: String,
        /// 1-based line number, the header being line 1.
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A parsed row could not be decoded into its upstream record.
    #[error("{table}: row {row}: {message}")]
    Decode {
        table: String,
        row: usize,
        message: String,
    },
}

//! Error types shared by the buffer, the alignment engine and configuration.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced while building or committing a buffer edit transaction.
pub enum BufferError {
    #[error("snapshot is stale: taken at version {snapshot_version}, buffer is at {current_version}")]
    /// The buffer changed after the snapshot the edit was planned against.
    StaleSnapshot {
        /// Version recorded by the snapshot.
        snapshot_version: u64,
        /// Version of the buffer at commit time.
        current_version: u64,
    },

    #[error("invalid offset {offset} (snapshot has {len} chars)")]
    /// An insertion offset lies outside the snapshot.
    InvalidOffset {
        /// Requested character offset.
        offset: usize,
        /// Character length of the snapshot.
        len: usize,
    },

    #[error("invalid line {line} (snapshot has {line_count} lines)")]
    /// A planned edit names a line outside the snapshot.
    InvalidLine {
        /// Requested line.
        line: usize,
        /// Line count of the snapshot.
        line_count: usize,
    },

    #[error("insertion text cannot be empty")]
    /// An insertion carried no text.
    EmptyInsert,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced while validating an [`AlignConfig`](crate::AlignConfig).
pub enum ConfigError {
    #[error("tab width must be greater than 0")]
    /// Tab width of zero.
    InvalidTabWidth,

    #[error("invalid tab width '{0}'")]
    /// A tab width override could not be parsed.
    UnparsableTabWidth(String),

    #[error("invalid operator '{0}': expected a single non-whitespace character")]
    /// The operator is empty, whitespace, or longer than one character.
    InvalidOperator(String),

    #[error("unknown column metric '{0}' (expected 'chars' or 'cells')")]
    /// A column metric override was not recognized.
    UnknownColumnMetric(String),
}

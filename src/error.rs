//! Error types for graph construction and subset runs.

use thiserror::Error;

/// Errors surfaced by graph construction and the subset engine.
///
/// Dangling references (a lookup miss, or a table at its row budget) are not
/// errors; they show up only as absences in the result and as counters in
/// [`crate::subset::SubsetStats`].
#[derive(Debug, Error)]
pub enum SubsetError {
    /// FK metadata whose source and referenced column lists differ in
    /// length. Fatal: aborts the whole graph build.
    #[error(
        "malformed dependency on {table}: {source_columns} source column(s) \
         mapped to {referenced_columns} referenced column(s) of {referenced_table}"
    )]
    MalformedDependency {
        table: String,
        referenced_table: String,
        source_columns: usize,
        referenced_columns: usize,
    },

    /// Row budgets that cannot be satisfied, e.g. `required_rows == 0` or
    /// `max_rows < required_rows`.
    #[error("invalid subset config: {reason}")]
    InvalidConfig { reason: String },

    /// Cooperative cancellation observed between row resolutions.
    #[error("subset run cancelled")]
    Cancelled,

    /// Data-source failure during a row draw or lookup, passed through
    /// unmodified. The in-flight traversal is aborted; no partial result
    /// is returned.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

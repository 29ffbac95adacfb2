//! Data-source capability contract consumed by the subset engine.
//!
//! The engine never talks to a database directly; everything flows through
//! [`DataSource`]. Production backends and test doubles are interchangeable
//! behind the trait; the crate ships [`MemorySource`] as the in-memory
//! variant.

mod memory;

pub use memory::MemorySource;

use crate::graph::Dependency;
use crate::row::{Row, RowHash};
use ahash::AHashSet;
use serde_json::Value;
use smallvec::SmallVec;

/// Column/value pairs identifying a referenced row. Sized inline for the
/// common single- and two-column key case.
pub type KeyValues = SmallVec<[(String, Value); 2]>;

/// A single forward pass over a table's rows. Not guaranteed restartable;
/// dropping the iterator releases the underlying cursor.
pub type RowStream<'a> = Box<dyn Iterator<Item = anyhow::Result<Row>> + 'a>;

/// Options for dependency listing.
#[derive(Debug, Clone, Default)]
pub struct DependencyOptions {
    /// Schemas whose tables and FK records are filtered out entirely.
    pub excluded_schemas: AHashSet<String>,
}

impl DependencyOptions {
    pub fn excluding<I, S>(schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_schemas: schemas.into_iter().map(Into::into).collect(),
        }
    }
}

/// Capability contract for a relational data source.
///
/// Tables are addressed by their qualified `schema.table` name. Rows
/// returned by any method carry that same qualified name in `Row::table`.
/// Failures are returned as-is and abort the in-flight traversal.
pub trait DataSource {
    /// Lazy, finite stream of a table's rows. Ordering is source-defined;
    /// each call is a single forward pass.
    fn rows_of(&self, table: &str) -> anyhow::Result<RowStream<'_>>;

    /// The row whose values match all supplied columns jointly, or `None`.
    fn lookup_row(&self, table: &str, key: &KeyValues) -> anyhow::Result<Option<Row>>;

    /// Stable content-derived identifier for a row; equality-only semantics.
    fn hash_of(&self, row: &Row) -> RowHash {
        row.content_hash()
    }

    /// Full FK edge list, pre-filtered to exclude the given schemas.
    fn list_dependencies(&self, options: &DependencyOptions) -> anyhow::Result<Vec<Dependency>>;
}

//! FK-aware extraction of referentially-consistent row subsets from
//! relational data sources.
//!
//! The crate builds a dependency graph from foreign-key metadata, draws a
//! seeded sample from every table, then transitively resolves FK references
//! under per-table row budgets so the resulting subset can be loaded into a
//! destination store without constraint violations.

pub mod error;
pub mod graph;
pub mod row;
pub mod source;
pub mod subset;

pub use error::SubsetError;
pub use graph::{Dependency, DependencyGraph, FkEdge};
pub use row::{Row, RowHash};
pub use source::{DataSource, DependencyOptions, MemorySource};
pub use subset::{
    CancelToken, PhaseOrder, Seed, Subset, SubsetConfig, SubsetStats, Subsetter, TableBudget,
};

//! FK dependency graph built from data-source metadata.
//!
//! Provides:
//! - Edge records as reported by `DataSource::list_dependencies`
//! - Directed graph construction with column-mapped edges
//! - Cycle detection for circular FK relationships

mod analysis;

pub use analysis::cyclic_tables;

use crate::error::SubsetError;
use crate::source::{DataSource, DependencyOptions};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One FK record as reported by a data source.
///
/// A record with `columns == None` registers the table as a graph node with
/// no outgoing FK, so isolated tables still participate in seed sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub schema: String,
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub referenced_schema: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_columns: Option<Vec<String>>,
}

impl Dependency {
    /// Record registering a table that has no outgoing FK.
    pub fn table(schema: &str, table: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            columns: None,
            referenced_schema: None,
            referenced_table: None,
            referenced_columns: None,
        }
    }

    /// Record for one FK constraint referencing a table in the same schema.
    pub fn foreign_key(
        schema: &str,
        table: &str,
        columns: &[&str],
        referenced_table: &str,
        referenced_columns: &[&str],
    ) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            columns: Some(columns.iter().map(|c| c.to_string()).collect()),
            referenced_schema: None,
            referenced_table: Some(referenced_table.to_string()),
            referenced_columns: Some(referenced_columns.iter().map(|c| c.to_string()).collect()),
        }
    }

    /// Point the reference at a table in another schema.
    pub fn with_referenced_schema(mut self, schema: &str) -> Self {
        self.referenced_schema = Some(schema.to_string());
        self
    }

    /// Qualified `schema.table` name of the source table.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Qualified name of the referenced table, if any. A missing referenced
    /// schema defaults to the source table's schema.
    pub fn qualified_referenced(&self) -> Option<String> {
        let table = self.referenced_table.as_deref()?;
        let schema = self.referenced_schema.as_deref().unwrap_or(&self.schema);
        Some(format!("{schema}.{table}"))
    }
}

/// A directed, column-mapped FK edge between two tables.
///
/// `source_columns[i]` corresponds positionally to `referenced_columns[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FkEdge {
    pub source_columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

/// Directed graph of tables and their outgoing FK edges.
///
/// Table names are opaque strings compared by exact equality; no
/// normalization is performed. Node existence is independent of having
/// edges, and multiple edges between the same table pair stay distinct.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: AHashMap<String, Vec<FkEdge>>,
}

impl DependencyGraph {
    /// Build the graph from a flat FK metadata snapshot.
    ///
    /// Fails with [`SubsetError::MalformedDependency`] when an edge's column
    /// lists differ in length; the whole build aborts.
    pub fn build(dependencies: &[Dependency]) -> Result<Self, SubsetError> {
        let mut nodes: AHashMap<String, Vec<FkEdge>> = AHashMap::new();

        for dep in dependencies {
            let table = dep.qualified_table();
            nodes.entry(table.clone()).or_default();

            let (Some(source_columns), Some(referenced_table)) =
                (dep.columns.as_ref(), dep.qualified_referenced())
            else {
                continue;
            };

            let referenced_columns = dep.referenced_columns.clone().unwrap_or_default();
            if source_columns.len() != referenced_columns.len() {
                return Err(SubsetError::MalformedDependency {
                    table,
                    referenced_table,
                    source_columns: source_columns.len(),
                    referenced_columns: referenced_columns.len(),
                });
            }

            // Referenced tables are nodes too: resolution needs an
            // accumulator for them even when the metadata carries no
            // standalone record.
            nodes.entry(referenced_table.clone()).or_default();
            nodes.entry(table).or_default().push(FkEdge {
                source_columns: source_columns.clone(),
                referenced_table,
                referenced_columns,
            });
        }

        Ok(Self { nodes })
    }

    /// Build the graph straight from a source's FK metadata.
    pub fn from_source<S: DataSource>(
        source: &S,
        options: &DependencyOptions,
    ) -> Result<Self, SubsetError> {
        let dependencies = source.list_dependencies(options)?;
        Self::build(&dependencies)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.nodes.contains_key(table)
    }

    /// All table nodes, in no particular order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// All table nodes in lexicographic order. Seeding iterates this so
    /// discovery order is reproducible.
    pub fn sorted_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        tables.sort_unstable();
        tables
    }

    /// Outgoing edges of a table, in metadata order. Empty for unknown tables.
    pub fn edges_from(&self, table: &str) -> &[FkEdge] {
        self.nodes.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a table carries an FK back to itself.
    pub fn has_self_reference(&self, table: &str) -> bool {
        self.edges_from(table)
            .iter()
            .any(|edge| edge.referenced_table == table)
    }
}

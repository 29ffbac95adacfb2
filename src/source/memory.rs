//! In-memory data source, used by tests and as a reference implementation.

use super::{DataSource, DependencyOptions, KeyValues, RowStream};
use crate::graph::Dependency;
use crate::row::Row;
use ahash::AHashMap;

/// Table-ordered in-memory store, interchangeable with a live database
/// behind [`DataSource`].
///
/// Row streams preserve insertion order. Lookups scan linearly and match
/// all supplied key columns jointly.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: AHashMap<String, Vec<Row>>,
    dependencies: Vec<Dependency>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: replace a table's rows.
    pub fn with_table(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.tables.insert(table.to_string(), rows);
        self
    }

    /// Builder-style: append one FK metadata record.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn insert_row(&mut self, table: &str, row: Row) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(Vec::len).unwrap_or(0)
    }
}

impl DataSource for MemorySource {
    fn rows_of(&self, table: &str) -> anyhow::Result<RowStream<'_>> {
        let rows = self.tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Box::new(rows.iter().cloned().map(Ok)))
    }

    fn lookup_row(&self, table: &str, key: &KeyValues) -> anyhow::Result<Option<Row>> {
        let Some(rows) = self.tables.get(table) else {
            return Ok(None);
        };
        Ok(rows
            .iter()
            .find(|row| {
                key.iter()
                    .all(|(column, value)| row.get(column) == Some(value))
            })
            .cloned())
    }

    fn list_dependencies(&self, options: &DependencyOptions) -> anyhow::Result<Vec<Dependency>> {
        Ok(self
            .dependencies
            .iter()
            .filter(|dep| !options.excluded_schemas.contains(&dep.schema))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn lookup_matches_all_key_columns_jointly() {
        let source = MemorySource::new().with_table(
            "public.order_items",
            vec![
                Row::new("public.order_items").with("order_id", 1).with("line_no", 1),
                Row::new("public.order_items").with("order_id", 1).with("line_no", 2),
            ],
        );

        let key: KeyValues = smallvec![
            ("order_id".to_string(), 1.into()),
            ("line_no".to_string(), 2.into()),
        ];
        let found = source.lookup_row("public.order_items", &key).unwrap().unwrap();
        assert_eq!(found.get("line_no"), Some(&2.into()));

        let key: KeyValues = smallvec![
            ("order_id".to_string(), 1.into()),
            ("line_no".to_string(), 9.into()),
        ];
        assert!(source.lookup_row("public.order_items", &key).unwrap().is_none());
    }

    #[test]
    fn unknown_table_yields_empty_stream() {
        let source = MemorySource::new();
        assert_eq!(source.rows_of("nope.missing").unwrap().count(), 0);
    }

    #[test]
    fn excluded_schemas_are_filtered() {
        let source = MemorySource::new()
            .with_dependency(Dependency::table("public", "users"))
            .with_dependency(Dependency::table("audit", "events"));

        let deps = source
            .list_dependencies(&DependencyOptions::excluding(["audit"]))
            .unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].table, "users");
    }
}

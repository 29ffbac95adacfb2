//! Row records and content-derived identity hashing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Content-derived row identifier.
///
/// Used only for equality and deduplication within a table's result set,
/// never for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowHash(String);

impl RowHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RowHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single row pulled from a data source.
///
/// `table` is the qualified `schema.table` name. Column values are JSON-typed;
/// the column map is ordered so the serialized form is canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub table: String,
    pub data: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            data: BTreeMap::new(),
        }
    }

    /// Builder-style column setter, mostly for tests and fixtures.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.data.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    /// SHA-256 over the canonical encoding of `(table, data)`, hex-encoded.
    ///
    /// Column count and per-field separators are hashed so that `(1)` and
    /// `(1, NULL)` never collide.
    pub fn content_hash(&self) -> RowHash {
        let mut hasher = Sha256::new();
        hasher.update(self.table.as_bytes());
        hasher.update([0u8]);
        hasher.update((self.data.len() as u64).to_le_bytes());
        for (column, value) in &self.data {
            hasher.update(column.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.to_string().as_bytes());
            hasher.update([0u8]);
        }
        RowHash(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_for_equal_content() {
        let a = Row::new("public.users").with("id", 1).with("name", "Alice");
        let b = Row::new("public.users").with("name", "Alice").with("id", 1);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn hash_differs_across_tables() {
        let a = Row::new("public.users").with("id", 1);
        let b = Row::new("public.posts").with("id", 1);
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn hash_distinguishes_null_from_absent() {
        let a = Row::new("t").with("id", 1);
        let b = Row::new("t").with("id", 1).with("note", Value::Null);
        assert_ne!(a.content_hash(), b.content_hash());
    }
}

//! Subset run configuration, with an optional YAML file layer.
//!
//! Supports global row budgets plus per-table overrides.

use crate::error::SubsetError;
use crate::source::DependencyOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Randomness key for reproducible runs.
///
/// Integer seeds are used as-is; text seeds are hashed down to 64 bits so
/// any string works as a stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Int(u64),
    Text(String),
}

impl Default for Seed {
    fn default() -> Self {
        Seed::Int(0)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed::Int(value)
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Seed::Text(value.to_string())
    }
}

impl Seed {
    /// The 64-bit key this seed resolves to.
    pub fn key(&self) -> u64 {
        match self {
            Seed::Int(value) => *value,
            Seed::Text(text) => fold64(Sha256::digest(text.as_bytes()).as_slice()),
        }
    }
}

/// First eight digest bytes folded into a u64.
pub(crate) fn fold64(digest: &[u8]) -> u64 {
    digest
        .iter()
        .take(8)
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
}

/// When FK resolution runs relative to seed sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseOrder {
    /// Seed every table first, then resolve references (default).
    #[default]
    TwoPhase,
    /// Resolve each table's seed rows before seeding the next table.
    Interleaved,
}

impl std::str::FromStr for PhaseOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twophase" | "two-phase" => Ok(PhaseOrder::TwoPhase),
            "interleaved" => Ok(PhaseOrder::Interleaved),
            _ => Err(format!(
                "Unknown phase order: {}. Valid options: two-phase, interleaved",
                s
            )),
        }
    }
}

impl std::fmt::Display for PhaseOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseOrder::TwoPhase => write!(f, "two-phase"),
            PhaseOrder::Interleaved => write!(f, "interleaved"),
        }
    }
}

/// Per-table budget overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableBudget {
    /// Seed sample size for this table (overrides the default).
    pub required_rows: Option<usize>,
    /// Hard row ceiling for this table (overrides the default).
    pub max_rows: Option<usize>,
    /// Exclude this table from seed sampling. FK resolution may still pull
    /// its rows, up to `max_rows`.
    pub skip: bool,
}

/// Configuration for a subset run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetConfig {
    /// Seed-phase sample size per table.
    pub required_rows: usize,
    /// Hard per-table row ceiling, enforced at every append.
    pub max_rows: usize,
    /// Randomness key for reproducible sampling.
    pub seed: Seed,
    /// When FK resolution runs relative to seeding.
    pub phase_order: PhaseOrder,
    /// Schemas excluded from dependency listing.
    pub excluded_schemas: Vec<String>,
    /// Per-table overrides, keyed by qualified or bare table name.
    pub tables: HashMap<String, TableBudget>,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self {
            required_rows: 100,
            max_rows: 1000,
            seed: Seed::default(),
            phase_order: PhaseOrder::default(),
            excluded_schemas: Vec::new(),
            tables: HashMap::new(),
        }
    }
}

impl SubsetConfig {
    pub fn new(required_rows: usize, max_rows: usize, seed: impl Into<Seed>) -> Self {
        Self {
            required_rows,
            max_rows,
            seed: seed.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, SubsetError> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading subset config {}", path.display()))?;
        let config: SubsetConfig = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("parsing subset config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every effective per-table budget is satisfiable.
    pub fn validate(&self) -> Result<(), SubsetError> {
        self.check_budget("defaults", self.required_rows, self.max_rows)?;
        for name in self.tables.keys() {
            self.check_budget(name, self.required_rows_for(name), self.max_rows_for(name))?;
        }
        Ok(())
    }

    fn check_budget(&self, scope: &str, required: usize, max: usize) -> Result<(), SubsetError> {
        if required == 0 {
            return Err(SubsetError::InvalidConfig {
                reason: format!("{scope}: required_rows must be positive"),
            });
        }
        if max < required {
            return Err(SubsetError::InvalidConfig {
                reason: format!("{scope}: max_rows ({max}) is below required_rows ({required})"),
            });
        }
        Ok(())
    }

    /// Override entry for a table: exact qualified name first, then the
    /// bare name after the schema separator.
    fn table_budget(&self, table: &str) -> Option<&TableBudget> {
        self.tables.get(table).or_else(|| {
            let bare = table.rsplit('.').next()?;
            self.tables.get(bare)
        })
    }

    /// Seed sample size for a table.
    pub fn required_rows_for(&self, table: &str) -> usize {
        self.table_budget(table)
            .and_then(|t| t.required_rows)
            .unwrap_or(self.required_rows)
    }

    /// Hard row ceiling for a table.
    pub fn max_rows_for(&self, table: &str) -> usize {
        self.table_budget(table)
            .and_then(|t| t.max_rows)
            .unwrap_or(self.max_rows)
    }

    /// Whether this table is excluded from seed sampling.
    pub fn should_skip(&self, table: &str) -> bool {
        self.table_budget(table).map(|t| t.skip).unwrap_or(false)
    }

    /// Dependency-listing options derived from this config.
    pub fn dependency_options(&self) -> DependencyOptions {
        DependencyOptions::excluding(self.excluded_schemas.iter().cloned())
    }
}

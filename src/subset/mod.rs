//! Seeded sampling and transitive FK resolution.
//!
//! A subset run has two phases. The seed phase draws up to `required_rows`
//! rows per table with a seeded reservoir, so the same seed over a stable
//! source selects the same rows. The resolution phase walks every seeded
//! row's outgoing FK edges and pulls the referenced rows into the result,
//! transitively, deduplicated, and never past a table's `max_rows` ceiling.
//!
//! Rows a reference points at that are absent from the source, or whose
//! table is already at its ceiling, are left dangling; both cases are
//! counted in the run statistics rather than treated as errors.

mod config;
mod reservoir;

pub use config::{PhaseOrder, Seed, SubsetConfig, TableBudget};
pub use reservoir::Reservoir;

use self::config::fold64;
use crate::error::SubsetError;
use crate::graph::{cyclic_tables, DependencyGraph, FkEdge};
use crate::row::{Row, RowHash};
use crate::source::{DataSource, KeyValues};
use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cooperative cancellation flag, checked between row resolutions.
///
/// Cloning shares the flag; any clone can cancel the run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Statistics from a subset run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SubsetStats {
    /// Tables that went through seed sampling.
    pub tables_seeded: usize,
    /// Rows selected during the seed phase.
    pub rows_seeded: u64,
    /// Rows pulled in by FK resolution.
    pub rows_resolved: u64,
    /// Point lookups issued against the source.
    pub lookups: u64,
    /// References with no matching row in the source.
    pub dangling_missing: u64,
    /// References left unresolved because the target table hit its ceiling.
    pub dangling_budget: u64,
    /// Warning messages (e.g. FK cycles).
    pub warnings: Vec<String>,
}

/// A referentially-consistent subset: per-table rows in discovery order,
/// seed rows first, then transitively pulled rows.
#[derive(Debug, Default, Serialize)]
pub struct Subset {
    pub items: BTreeMap<String, Vec<Row>>,
    pub stats: SubsetStats,
}

/// Per-table accumulator: discovery-ordered rows plus the hash set that
/// doubles as dedup check and visited marker.
#[derive(Debug, Default)]
struct TableAccumulator {
    rows: Vec<Row>,
    hashes: AHashSet<RowHash>,
}

enum Append {
    Added,
    Duplicate,
    BudgetExhausted,
}

/// The sampling/resolution engine.
///
/// Owns no cross-run state: accumulators and the work queue live inside a
/// single [`Subsetter::run`] call and are dropped with it. Source failures
/// abort the run; no partial result is ever returned.
pub struct Subsetter<'a, S: DataSource> {
    graph: &'a DependencyGraph,
    source: &'a S,
    config: SubsetConfig,
    cancel: Option<CancelToken>,
}

/// Run a subset extraction with the given graph, source, and config.
pub fn run<S: DataSource>(
    graph: &DependencyGraph,
    source: &S,
    config: SubsetConfig,
) -> Result<Subset, SubsetError> {
    Subsetter::new(graph, source, config).run()
}

impl<'a, S: DataSource> Subsetter<'a, S> {
    pub fn new(graph: &'a DependencyGraph, source: &'a S, config: SubsetConfig) -> Self {
        Self {
            graph,
            source,
            config,
            cancel: None,
        }
    }

    /// Attach a cancellation token checked between row resolutions.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Execute the run. Deterministic for a fixed graph, config, and source
    /// contents.
    pub fn run(self) -> Result<Subset, SubsetError> {
        self.config.validate()?;
        let mut stats = SubsetStats::default();

        let cyclic = cyclic_tables(self.graph);
        if !cyclic.is_empty() {
            warn!(tables = ?cyclic, "FK cycles detected; traversal bounded by visited rows");
            stats.warnings.push(format!(
                "{} table(s) participate in FK cycles: {}",
                cyclic.len(),
                cyclic.join(", ")
            ));
        }

        let mut accumulators: BTreeMap<String, TableAccumulator> = self
            .graph
            .tables()
            .map(|table| (table.to_string(), TableAccumulator::default()))
            .collect();
        let mut queue: VecDeque<Row> = VecDeque::new();

        // Tables are seeded in name order so discovery order is a pure
        // function of the seed and the source contents.
        for table in self.graph.sorted_tables() {
            self.check_cancelled()?;
            if self.config.should_skip(table) {
                debug!(table, "excluded from seed sampling");
                continue;
            }
            let seeded = self.seed_table(table)?;
            stats.tables_seeded += 1;
            debug!(table, rows = seeded.len(), "seeded");
            for row in seeded {
                if let Append::Added = self.append(&mut accumulators, &row) {
                    stats.rows_seeded += 1;
                    queue.push_back(row);
                }
            }
            if self.config.phase_order == PhaseOrder::Interleaved {
                self.resolve(&mut queue, &mut accumulators, &mut stats)?;
            }
        }

        self.resolve(&mut queue, &mut accumulators, &mut stats)?;

        let items = accumulators
            .into_iter()
            .map(|(table, accumulator)| (table, accumulator.rows))
            .collect();
        Ok(Subset { items, stats })
    }

    /// Draw up to `required_rows` rows in a single forward pass, returned
    /// in stream order.
    fn seed_table(&self, table: &str) -> Result<Vec<Row>, SubsetError> {
        let capacity = self
            .config
            .required_rows_for(table)
            .min(self.config.max_rows_for(table));
        let rng = StdRng::seed_from_u64(self.table_seed(table));
        let mut reservoir = Reservoir::new(capacity, rng);

        for (position, row) in self.source.rows_of(table)?.enumerate() {
            reservoir.consider((position, row?));
        }

        let mut picked = reservoir.into_items();
        picked.sort_unstable_by_key(|(position, _)| *position);
        Ok(picked.into_iter().map(|(_, row)| row).collect())
    }

    /// Per-table RNG key: selection for one table must not depend on how
    /// many tables were seeded before it.
    fn table_seed(&self, table: &str) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.config.seed.key().to_le_bytes());
        hasher.update(table.as_bytes());
        fold64(hasher.finalize().as_slice())
    }

    /// Drain the work queue, pulling referenced rows until closure.
    ///
    /// Each appended row is enqueued exactly once (the append hash check is
    /// the visited marker), so cyclic reference chains terminate.
    fn resolve(
        &self,
        queue: &mut VecDeque<Row>,
        accumulators: &mut BTreeMap<String, TableAccumulator>,
        stats: &mut SubsetStats,
    ) -> Result<(), SubsetError> {
        while let Some(row) = queue.pop_front() {
            self.check_cancelled()?;
            for edge in self.graph.edges_from(&row.table) {
                let Some(key) = reference_key(&row, edge) else {
                    continue;
                };
                stats.lookups += 1;
                let Some(found) = self.source.lookup_row(&edge.referenced_table, &key)? else {
                    stats.dangling_missing += 1;
                    debug!(table = %edge.referenced_table, "referenced row not in source");
                    continue;
                };
                match self.append(accumulators, &found) {
                    Append::Added => {
                        stats.rows_resolved += 1;
                        queue.push_back(found);
                    }
                    Append::Duplicate => {}
                    Append::BudgetExhausted => {
                        stats.dangling_budget += 1;
                        debug!(table = %edge.referenced_table, "reference left dangling by budget");
                    }
                }
            }
        }
        Ok(())
    }

    /// Single append path per table: duplicate check, then ceiling check,
    /// then insert.
    fn append(
        &self,
        accumulators: &mut BTreeMap<String, TableAccumulator>,
        row: &Row,
    ) -> Append {
        let hash = self.source.hash_of(row);
        let slot = accumulators.entry(row.table.clone()).or_default();
        if slot.hashes.contains(&hash) {
            return Append::Duplicate;
        }
        if slot.rows.len() >= self.config.max_rows_for(&row.table) {
            return Append::BudgetExhausted;
        }
        slot.hashes.insert(hash);
        slot.rows.push(row.clone());
        Append::Added
    }

    fn check_cancelled(&self) -> Result<(), SubsetError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(SubsetError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Column/value pairs for one FK reference, or `None` when any source
/// column is null or absent (the reference is not asserted).
fn reference_key(row: &Row, edge: &FkEdge) -> Option<KeyValues> {
    let mut key = KeyValues::new();
    for (source, referenced) in edge.source_columns.iter().zip(&edge.referenced_columns) {
        match row.get(source) {
            Some(value) if !value.is_null() => key.push((referenced.clone(), value.clone())),
            _ => return None,
        }
    }
    Some(key)
}

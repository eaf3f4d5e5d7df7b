//! carvekit Storage - Store Trait and Implementations
//!
//! Defines the persistence collaborator for canonical contexts. Every store
//! inserts at most once per `(project, function, context hash, raw)`. Raw
//! dumps share the table but are kept out of the canonical queries.

pub mod jsonl;

pub use jsonl::JsonlCarveStore;

use carvekit_core::{CarveRecord, CarveResult, StorageError};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Persistence for canonical contexts.
pub trait CarveStore: Send + Sync {
    /// Insert unless the same context is already stored for this function.
    /// Returns `true` when the record was new.
    fn insert(&self, record: &CarveRecord) -> CarveResult<bool>;

    /// Stored canonical contexts for one function, in insertion order.
    fn contexts(&self, project: &str, function_name: &str) -> CarveResult<Vec<String>>;

    /// Stored raw dumps for one function, in insertion order.
    fn raw_dumps(&self, project: &str, function_name: &str) -> CarveResult<Vec<String>>;

    /// Number of stored canonical contexts per function of a project.
    fn count_by_function(&self, project: &str) -> CarveResult<BTreeMap<String, usize>>;

    /// Total number of stored records, raw included.
    fn len(&self) -> CarveResult<usize>;

    fn is_empty(&self) -> CarveResult<bool> {
        Ok(self.len()? == 0)
    }
}

// ============================================================================
// RECORD TABLE
// ============================================================================

/// Uniqueness key of a stored record: project, function, context hash, raw.
pub type RecordKey = (String, String, String, bool);

pub fn record_key(record: &CarveRecord) -> RecordKey {
    (
        record.project.clone(),
        record.function_name.clone(),
        record.context_hash.clone(),
        record.raw,
    )
}

/// Records plus their uniqueness index. Shared by the store implementations.
#[derive(Debug, Default, Clone)]
pub struct RecordTable {
    records: Vec<CarveRecord>,
    keys: HashSet<RecordKey>,
}

impl RecordTable {
    pub fn contains(&self, record: &CarveRecord) -> bool {
        self.keys.contains(&record_key(record))
    }

    /// Returns `false` and leaves the table unchanged on a duplicate.
    pub fn insert(&mut self, record: CarveRecord) -> bool {
        if !self.keys.insert(record_key(&record)) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn contexts(&self, project: &str, function_name: &str) -> Vec<String> {
        self.select(project, function_name, false)
    }

    pub fn raw_dumps(&self, project: &str, function_name: &str) -> Vec<String> {
        self.select(project, function_name, true)
    }

    fn select(&self, project: &str, function_name: &str, raw: bool) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.raw == raw && r.project == project && r.function_name == function_name)
            .map(|r| r.context.clone())
            .collect()
    }

    pub fn count_by_function(&self, project: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records.iter().filter(|r| !r.raw && r.project == project) {
            *counts.entry(record.function_name.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory store. Clones share the same table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCarveStore {
    table: Arc<RwLock<RecordTable>>,
}

impl InMemoryCarveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record.
    pub fn records(&self) -> CarveResult<Vec<CarveRecord>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.records.clone())
    }

    pub fn clear(&self) -> CarveResult<()> {
        let mut table = self.table.write().map_err(|_| StorageError::LockPoisoned)?;
        *table = RecordTable::default();
        Ok(())
    }
}

impl CarveStore for InMemoryCarveStore {
    fn insert(&self, record: &CarveRecord) -> CarveResult<bool> {
        let mut table = self.table.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.insert(record.clone()))
    }

    fn contexts(&self, project: &str, function_name: &str) -> CarveResult<Vec<String>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.contexts(project, function_name))
    }

    fn raw_dumps(&self, project: &str, function_name: &str) -> CarveResult<Vec<String>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.raw_dumps(project, function_name))
    }

    fn count_by_function(&self, project: &str) -> CarveResult<BTreeMap<String, usize>> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.count_by_function(project))
    }

    fn len(&self) -> CarveResult<usize> {
        let table = self.table.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(table.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================

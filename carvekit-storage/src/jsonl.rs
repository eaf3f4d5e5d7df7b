//! Append-only JSON-lines store.
//!
//! One serialized [`CarveRecord`] per line. The file is read once on open to
//! rebuild the uniqueness index; afterwards only new records are appended.
//!
//! A final line without its newline is the tail of an interrupted append. If
//! it does not parse it is cut off on open; if it does, the newline is added.

use crate::{CarveStore, RecordTable};
use carvekit_core::{CarveError, CarveRecord, CarveResult, StorageError};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug)]
pub struct JsonlCarveStore {
    path: PathBuf,
    /// Table and file handle share one lock so appends follow index order.
    state: RwLock<(RecordTable, File)>,
}

impl JsonlCarveStore {
    /// Open or create the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> CarveResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| CarveError::io(&path, e))?;

        let mut bytes = Vec::new();
        (&file)
            .read_to_end(&mut bytes)
            .map_err(|e| CarveError::io(&path, e))?;

        let mut table = RecordTable::default();
        let mut offset = 0usize;
        for (idx, segment) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
            let start = offset;
            offset += segment.len();
            let terminated = segment.ends_with(b"\n");
            if segment.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<CarveRecord>(segment) {
                Ok(record) => {
                    table.insert(record);
                    if !terminated {
                        (&file)
                            .write_all(b"\n")
                            .map_err(|e| CarveError::io(&path, e))?;
                    }
                }
                Err(e) if !terminated => {
                    tracing::warn!(
                        path = %path.display(),
                        line = idx + 1,
                        error = %e,
                        "dropping partial final record"
                    );
                    file.set_len(start as u64).map_err(|e| CarveError::io(&path, e))?;
                }
                Err(e) => {
                    return Err(StorageError::Corrupt {
                        path: path.display().to_string(),
                        line: idx + 1,
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }
        tracing::debug!(path = %path.display(), records = table.len(), "opened carve store");

        Ok(Self {
            path,
            state: RwLock::new((table, file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CarveStore for JsonlCarveStore {
    fn insert(&self, record: &CarveRecord) -> CarveResult<bool> {
        let mut state = self.state.write().map_err(|_| StorageError::LockPoisoned)?;
        let (table, file) = &mut *state;
        if table.contains(record) {
            return Ok(false);
        }

        let mut line = serde_json::to_string(record).map_err(|e| StorageError::InsertFailed {
            function_name: record.function_name.clone(),
            reason: e.to_string(),
        })?;
        line.push('\n');
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| CarveError::io(&self.path, e))?;

        Ok(table.insert(record.clone()))
    }

    fn contexts(&self, project: &str, function_name: &str) -> CarveResult<Vec<String>> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(state.0.contexts(project, function_name))
    }

    fn raw_dumps(&self, project: &str, function_name: &str) -> CarveResult<Vec<String>> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(state.0.raw_dumps(project, function_name))
    }

    fn count_by_function(&self, project: &str) -> CarveResult<BTreeMap<String, usize>> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(state.0.count_by_function(project))
    }

    fn len(&self) -> CarveResult<usize> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(state.0.len())
    }
}

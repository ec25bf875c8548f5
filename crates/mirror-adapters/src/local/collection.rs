//! Generic JSON-array-backed collection with atomic persistence.
//!
//! Every local-provider store is a `JsonCollection<T>` over one file
//! under `localDataDir`. Writes go through a temp-file-then-rename, and
//! the whole collection is guarded by a single mutex — sufficient for
//! single-process use; cross-process use needs an OS-level lock file
//! (documented limitation, not implemented here).

use mirror_types::error::{AdapterFault, AdapterFaultCode};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonCollection<T> {
    path: PathBuf,
    records: Mutex<Vec<T>>,
    source: &'static str,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn open(path: impl AsRef<Path>, source: &'static str) -> Result<Self, AdapterFault> {
        let path = path.as_ref().to_path_buf();
        let records = Self::load_from_disk(&path, source)?;
        Ok(Self {
            path,
            records: Mutex::new(records),
            source,
        })
    }

    fn load_from_disk(path: &Path, source: &'static str) -> Result<Vec<T>, AdapterFault> {
        match fs::read(path) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(Vec::new());
                }
                serde_json::from_slice(&bytes).map_err(|e| {
                    AdapterFault::new(AdapterFaultCode::Corrupt, source, format!("malformed collection file: {e}"))
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AdapterFault::new(AdapterFaultCode::Io, source, e.to_string())),
        }
    }

    fn persist(&self, records: &[T]) -> Result<(), AdapterFault> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AdapterFault::new(AdapterFaultCode::Io, self.source, e.to_string()))?;
        }
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| AdapterFault::new(AdapterFaultCode::Io, self.source, e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes)
            .map_err(|e| AdapterFault::new(AdapterFaultCode::Io, self.source, e.to_string()))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| AdapterFault::new(AdapterFaultCode::Io, self.source, e.to_string()))?;
        Ok(())
    }

    /// Read-only access under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let guard = self.records.lock();
        f(&guard)
    }

    /// Mutates the in-memory collection, persists it, and returns `f`'s
    /// result. If the write fails, the in-memory mutation is rolled
    /// back so callers never observe state the disk doesn't have.
    pub fn write<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R, AdapterFault> {
        let mut guard = self.records.lock();
        let before = guard.clone();
        let result = f(&mut guard);
        if let Err(e) = self.persist(&guard) {
            *guard = before;
            return Err(e);
        }
        Ok(result)
    }

    pub fn source(&self) -> &'static str {
        self.source
    }
}

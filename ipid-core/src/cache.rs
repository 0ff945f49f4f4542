#![forbid(unsafe_code)]

//! Result cache for computed probability arrays.
//!
//! Sweeps are expensive (minutes to hours) and fully determined by their
//! parameters, so results are memoized under deterministic string keys. The
//! cache is an injected trait rather than ambient filesystem state; tests use
//! [`MemoryCache`], the CLI uses [`DiskCache`].

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::{fs, io};
use tracing::debug;

use crate::IpidResult;

/// Byte-level cache keyed by deterministic strings. Keys may contain `/` to
/// group related results.
pub trait ResultCache: Sync {
    /// Returns the stored bytes for `key`, or `None` if absent. A missing
    /// entry is the expected cold-start condition, not an error.
    fn load(&self, key: &str) -> IpidResult<Option<Vec<u8>>>;

    /// Stores `bytes` under `key`, replacing any previous entry.
    fn store(&self, key: &str, bytes: &[u8]) -> IpidResult<()>;
}

/// Load the CBOR-encoded value under `key`, or compute, persist, and return
/// it. All-or-nothing: a present entry is returned verbatim, never partially
/// recomputed.
pub fn get_or_compute<T, F>(cache: &dyn ResultCache, key: &str, compute: F) -> IpidResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> IpidResult<T>,
{
    if let Some(bytes) = cache.load(key)? {
        debug!(key, "cache hit");
        return Ok(serde_cbor::from_slice(&bytes)?);
    }
    debug!(key, "cache miss, computing");
    let value = compute()?;
    cache.store(key, &serde_cbor::to_vec(&value)?)?;
    Ok(value)
}

/// Filesystem-backed cache. Each key maps to a file under the root directory;
/// parent directories are created on demand and writes go through a temporary
/// file plus rename so a crash mid-write leaves no entry rather than a torn
/// one.
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ResultCache for DiskCache {
    fn load(&self, key: &str) -> IpidResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> IpidResult<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = tmp_path(&path);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// In-memory cache for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryCache {
    fn load(&self, key: &str) -> IpidResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, bytes: &[u8]) -> IpidResult<()> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

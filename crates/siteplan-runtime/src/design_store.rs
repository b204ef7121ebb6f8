//! Saved-design persistence.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DesignStore                            │
//! │   - In-memory cache of saved designs                          │
//! │   - Assigns ids and creation timestamps                       │
//! │   - Delegates to DesignBackend for persistence                │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       DesignBackend                           │
//! │   - MemoryBackend: in-memory (testing, ephemeral)             │
//! │   - FileBackend: JSON file, write-temp-then-rename            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure | Returns error, cache unaffected |
//! | `StorageError::Serialization` | JSON encode/decode | Returns error |
//! | `StorageError::Corruption` | Poisoned lock | Returns error |
//! | Format version mismatch | File from another release | Stored designs ignored, logged |
//! | Record with id 0 | Hand-edited file | Record skipped, logged |

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::design::{DesignId, DesignIdAllocator, DesignRecord};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from design storage.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// JSON encode/decode failure.
    Serialization(String),
    /// Internal state is unusable (e.g. poisoned lock).
    Corruption(String),
    /// No design with this id.
    NotFound(DesignId),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
            StorageError::NotFound(id) => write!(f, "design {id} not found"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialization(_)
            | StorageError::Corruption(_)
            | StorageError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Pluggable persistence for saved designs.
///
/// Implementations must be `Send + Sync` so a store can be shared.
pub trait DesignBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load every stored design. Empty on first run.
    fn load_all(&self) -> StorageResult<BTreeMap<DesignId, DesignRecord>>;

    /// Replace all stored designs.
    fn save_all(&self, designs: &BTreeMap<DesignId, DesignRecord>) -> StorageResult<()>;

    /// Remove all stored designs.
    fn clear(&self) -> StorageResult<()>;

    fn is_available(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Backend
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory backend; contents are lost at exit.
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<BTreeMap<DesignId, DesignRecord>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_designs(designs: BTreeMap<DesignId, DesignRecord>) -> Self {
        Self {
            data: RwLock::new(designs),
        }
    }
}

impl DesignBackend for MemoryBackend {
    fn name(&self) -> &str {
        "MemoryBackend"
    }

    fn load_all(&self) -> StorageResult<BTreeMap<DesignId, DesignRecord>> {
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save_all(&self, designs: &BTreeMap<DesignId, DesignRecord>) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        *guard = designs.clone();
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        guard.clear();
        Ok(())
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.data.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryBackend")
            .field("designs", &count)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Backend
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk file format.
#[derive(Serialize, Deserialize)]
struct DesignFile {
    format_version: u32,
    designs: Vec<DesignRecord>,
}

impl DesignFile {
    const FORMAT_VERSION: u32 = 1;
}

/// JSON file backend.
///
/// # File Format
///
/// ```json
/// {
///   "format_version": 1,
///   "designs": [
///     { "id": 1, "name": "north field", "quantities": { "megapack": 4 }, ... }
///   ]
/// }
/// ```
///
/// Writes go to `{path}.tmp`, are flushed and synced, then renamed over
/// `{path}`.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// The file need not exist; it is created on first save.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `$XDG_STATE_HOME/siteplan/designs.json`, falling back to
    /// `~/.local/state` and then the working directory.
    #[must_use]
    pub fn default_location() -> Self {
        let base = if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
            PathBuf::from(state_home)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".local").join("state")
        } else {
            PathBuf::from(".")
        };
        Self::new(base.join("siteplan").join("designs.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone();
        tmp.set_extension("json.tmp");
        tmp
    }
}

impl DesignBackend for FileBackend {
    fn name(&self) -> &str {
        "FileBackend"
    }

    fn load_all(&self) -> StorageResult<BTreeMap<DesignId, DesignRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let file: DesignFile = serde_json::from_reader(reader).map_err(|e| {
            StorageError::Serialization(format!("failed to parse design file: {e}"))
        })?;

        if file.format_version != DesignFile::FORMAT_VERSION {
            tracing::warn!(
                stored = file.format_version,
                expected = DesignFile::FORMAT_VERSION,
                "design file format version mismatch, ignoring stored designs"
            );
            return Ok(BTreeMap::new());
        }

        let mut designs = BTreeMap::new();
        for record in file.designs {
            match record.id.filter(|id| id.is_valid()) {
                Some(id) => {
                    let _ = designs.insert(id, record);
                }
                None => {
                    tracing::warn!(name = %record.name, "design without a valid id, skipping");
                }
            }
        }
        Ok(designs)
    }

    fn save_all(&self, designs: &BTreeMap<DesignId, DesignRecord>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = DesignFile {
            format_version: DesignFile::FORMAT_VERSION,
            designs: designs.values().cloned().collect(),
        };

        let tmp_path = self.temp_path();
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, &file).map_err(|e| {
                StorageError::Serialization(format!("failed to serialize designs: {e}"))
            })?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            designs = designs.len(),
            "saved designs"
        );
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        let Some(parent) = self.path.parent() else {
            return false;
        };
        if parent.as_os_str().is_empty() {
            return true;
        }
        if !parent.exists() {
            return fs::create_dir_all(parent).is_ok();
        }
        let marker = parent.join(".siteplan_test_write");
        if fs::write(&marker, b"test").is_ok() {
            let _ = fs::remove_file(&marker);
            return true;
        }
        false
    }
}

impl fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBackend")
            .field("path", &self.path)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Design Store
// ─────────────────────────────────────────────────────────────────────────────

struct StoreState {
    designs: BTreeMap<DesignId, DesignRecord>,
    allocator: DesignIdAllocator,
    dirty: bool,
}

/// Cache of saved designs over a [`DesignBackend`].
///
/// Call [`load`](Self::load) before reading and [`flush`](Self::flush) after
/// edits; nothing is written to the backend in between.
pub struct DesignStore {
    backend: Box<dyn DesignBackend>,
    state: RwLock<StoreState>,
}

impl DesignStore {
    #[must_use]
    pub fn new(backend: Box<dyn DesignBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(StoreState {
                designs: BTreeMap::new(),
                allocator: DesignIdAllocator::default(),
                dirty: false,
            }),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    #[must_use]
    pub fn with_file(path: impl AsRef<Path>) -> Self {
        Self::new(Box::new(FileBackend::new(path)))
    }

    fn read_state(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| StorageError::Corruption("store lock poisoned".into()))
    }

    fn write_state(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| StorageError::Corruption("store lock poisoned".into()))
    }

    /// Replace the cache with the backend's contents. Returns the count.
    pub fn load(&self) -> StorageResult<usize> {
        let designs = self.backend.load_all()?;
        let count = designs.len();

        let mut state = self.write_state()?;
        state.allocator = DesignIdAllocator::after(designs.keys());
        state.designs = designs;
        state.dirty = false;

        tracing::debug!(backend = %self.backend.name(), count, "loaded designs");
        Ok(count)
    }

    /// Save with the current wall-clock time.
    pub fn save(&self, record: DesignRecord) -> StorageResult<DesignId> {
        self.save_at(record, now_ms())
    }

    /// Insert or overwrite a design.
    ///
    /// A record without an id gets a fresh one; a record without a creation
    /// time gets `now_ms`.
    pub fn save_at(&self, mut record: DesignRecord, now_ms: u64) -> StorageResult<DesignId> {
        let mut state = self.write_state()?;
        let id = match record.id.filter(|id| id.is_valid()) {
            Some(id) => {
                state.allocator.observe(id);
                id
            }
            None => state.allocator.allocate(),
        };
        record.id = Some(id);
        if record.created_at_ms.is_none() {
            record.created_at_ms = Some(now_ms);
        }

        tracing::debug!(id = id.get(), name = %record.name, "design saved");
        let _ = state.designs.insert(id, record);
        state.dirty = true;
        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: DesignId) -> Option<DesignRecord> {
        self.read_state().ok()?.designs.get(&id).cloned()
    }

    /// All designs, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<DesignRecord> {
        let Ok(state) = self.read_state() else {
            return Vec::new();
        };
        let mut designs: Vec<_> = state.designs.values().cloned().collect();
        designs.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| b.id.cmp(&a.id))
        });
        designs
    }

    /// The most recently created design.
    #[must_use]
    pub fn latest(&self) -> Option<DesignRecord> {
        self.list().into_iter().next()
    }

    pub fn delete(&self, id: DesignId) -> StorageResult<DesignRecord> {
        let mut state = self.write_state()?;
        let removed = state
            .designs
            .remove(&id)
            .ok_or(StorageError::NotFound(id))?;
        state.dirty = true;
        Ok(removed)
    }

    /// Write cached designs if anything changed since the last load/flush.
    ///
    /// Returns `Ok(true)` if data was written.
    pub fn flush(&self) -> StorageResult<bool> {
        let mut state = self.write_state()?;
        if !state.dirty {
            return Ok(false);
        }
        self.backend.save_all(&state.designs)?;
        state.dirty = false;
        Ok(true)
    }

    /// Clear both the cache and the backend.
    pub fn clear(&self) -> StorageResult<()> {
        self.backend.clear()?;
        let mut state = self.write_state()?;
        state.designs.clear();
        state.dirty = false;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_state().map(|s| s.designs.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.read_state().map(|s| s.dirty).unwrap_or(false)
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }
}

impl fmt::Debug for DesignStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesignStore")
            .field("backend", &self.backend.name())
            .field("designs", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

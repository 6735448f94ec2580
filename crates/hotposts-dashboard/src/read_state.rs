//! Locally persisted record of which posts the user has already opened.
//!
//! The set lives under a single key of a [`KeyValueStore`] as a JSON array of
//! post ids. It is read once at startup and the whole array is rewritten on
//! every new addition.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

pub const READ_POSTS_KEY: &str = "readPosts";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read-state storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("read-state serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value storage the read state is persisted to.
pub trait KeyValueStore: Send {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites `key` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by one JSON object file, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "read-state file is corrupt; starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read read-state file; starting empty");
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    /// The in-memory view only changes once the file write has succeeded.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        let bytes = serde_json::to_vec_pretty(&next)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        *entries = next;
        Ok(())
    }
}

/// Insertion-ordered set of opened post ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl ReadSet {
    /// Parses the persisted JSON array form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `raw` is not an array of strings.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let ids: Vec<String> = serde_json::from_str(raw)?;
        let mut set = Self::default();
        for id in ids {
            set.insert(id);
        }
        Ok(set)
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::Value::from(self.order.clone()).to_string()
    }

    #[must_use]
    pub fn contains(&self, post_id: &str) -> bool {
        self.members.contains(post_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, post_id: impl Into<String>) -> bool {
        let post_id = post_id.into();
        if self.members.contains(&post_id) {
            return false;
        }
        self.members.insert(post_id.clone());
        self.order.push(post_id);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// The [`ReadSet`] together with the store it is persisted to. All writes go
/// through [`ReadState::mark`], which keeps the two in step.
pub struct ReadState {
    set: ReadSet,
    store: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for ReadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadState")
            .field("set", &self.set)
            .finish_non_exhaustive()
    }
}

impl ReadState {
    /// Reads the persisted set once. Missing or malformed data starts empty.
    pub fn load(store: impl KeyValueStore + 'static) -> Self {
        let set = match store.get(READ_POSTS_KEY) {
            Ok(Some(raw)) => ReadSet::from_json(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring malformed read-state payload");
                ReadSet::default()
            }),
            Ok(None) => ReadSet::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load read state");
                ReadSet::default()
            }
        };
        Self {
            set,
            store: Box::new(store),
        }
    }

    #[must_use]
    pub fn set(&self) -> &ReadSet {
        &self.set
    }

    /// Adds `post_id` and persists the full set. Idempotent.
    ///
    /// Storage failures are logged; the in-memory set is updated regardless.
    pub fn mark(&mut self, post_id: &str) -> bool {
        if !self.set.insert(post_id) {
            return false;
        }
        if let Err(e) = self.store.set(READ_POSTS_KEY, &self.set.to_json()) {
            tracing::warn!(post_id, error = %e, "failed to persist read state");
        }
        true
    }
}

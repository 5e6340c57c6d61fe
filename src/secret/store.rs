use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

use crate::table::types::Address;

const LOG_TARGET: &str = "holdem_client::secret::store";

pub const DEFAULT_SECRET_NAMESPACE: &str = "holdem_secret";

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    #[error("storage file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Minimal string key-value backend the secret store persists through.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SecretStoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SecretStoreError>;
    fn remove(&self, key: &str) -> Result<(), SecretStoreError>;
}

/// Process-local backend. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretStoreError> {
        self.inner.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SecretStoreError> {
        self.inner.write().remove(key);
        Ok(())
    }
}

/// Durable backend: a single JSON object on disk, rewritten on every change.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, SecretStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Where an unreadable file is moved before it is replaced.
    pub fn corrupt_path(&self) -> PathBuf {
        let mut aside = OsString::from(self.path.as_os_str());
        aside.push(".corrupt");
        PathBuf::from(aside)
    }

    /// Like `load`, but an unparseable file is moved aside and treated as
    /// empty so writes can start over.
    fn load_for_write(&self) -> Result<BTreeMap<String, String>, SecretStoreError> {
        match self.load() {
            Err(SecretStoreError::Json(err)) => {
                let aside = self.corrupt_path();
                warn!(
                    target = LOG_TARGET,
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %err,
                    "secret file is corrupt; starting a new one"
                );
                fs::rename(&self.path, &aside)?;
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), SecretStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretStoreError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretStoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.load_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SecretStoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.load_for_write()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

/// Per-(table, player) reveal secrets. Never fails the caller: a missing or
/// broken backend reads as "no secret" and writes become no-ops.
#[derive(Clone)]
pub struct SecretStore {
    backend: Option<Arc<dyn KeyValueStore>>,
    namespace: String,
}

impl SecretStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_namespace(backend, DEFAULT_SECRET_NAMESPACE)
    }

    pub fn with_namespace(backend: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend: Some(backend),
            namespace: namespace.into(),
        }
    }

    /// A store with no backend at all.
    pub fn unavailable() -> Self {
        Self {
            backend: None,
            namespace: DEFAULT_SECRET_NAMESPACE.to_string(),
        }
    }

    /// `<namespace>_<table>_<player>`, lower-cased.
    pub fn storage_key(&self, table: &Address, player: &Address) -> String {
        format!("{}_{}_{}", self.namespace, table.as_str(), player.as_str()).to_ascii_lowercase()
    }

    pub fn get(&self, table: &Address, player: &Address) -> String {
        let Some(backend) = self.backend.as_ref() else {
            return String::new();
        };
        let key = self.storage_key(table, player);
        match backend.get(&key) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                warn!(target = LOG_TARGET, %table, error = %err, "failed to read stored secret");
                String::new()
            }
        }
    }

    /// Store `value`, or remove the entry when `value` is empty. Returns
    /// whether the change reached the backend.
    pub fn set(&self, table: &Address, player: &Address, value: &str) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            debug!(target = LOG_TARGET, %table, "no secret backend; dropping write");
            return false;
        };
        let key = self.storage_key(table, player);
        let result = if value.is_empty() {
            backend.remove(&key)
        } else {
            backend.set(&key, value)
        };
        match result {
            Ok(()) => {
                debug!(
                    target = LOG_TARGET,
                    %table,
                    secret_len = value.len(),
                    "stored secret updated"
                );
                true
            }
            Err(err) => {
                warn!(target = LOG_TARGET, %table, error = %err, "failed to persist secret");
                false
            }
        }
    }

    pub fn clear(&self, table: &Address, player: &Address) -> bool {
        self.set(table, player, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses() -> (Address, Address) {
        (Address::new("0xTABLE"), Address::new("0xPlayer"))
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, SecretStoreError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into())
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), SecretStoreError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into())
        }

        fn remove(&self, _key: &str) -> Result<(), SecretStoreError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into())
        }
    }

    #[test]
    fn key_is_lowercased_composite() {
        let store = SecretStore::new(Arc::new(InMemoryKeyValueStore::new()));
        let (table, player) = addresses();
        assert_eq!(
            store.storage_key(&table, &player),
            "holdem_secret_0xtable_0xplayer"
        );
    }

    #[test]
    fn set_get_and_remove_on_empty() {
        let backend = InMemoryKeyValueStore::new();
        let store = SecretStore::new(Arc::new(backend.clone()));
        let (table, player) = addresses();

        assert_eq!(store.get(&table, &player), "");
        store.set(&table, &player, "abc123");
        assert_eq!(store.get(&table, &player), "abc123");

        // Lookup is case-insensitive on both identifiers.
        assert_eq!(
            store.get(&Address::new("0xtable"), &Address::new("0xPLAYER")),
            "abc123"
        );

        store.set(&table, &player, "rotated");
        assert_eq!(store.get(&table, &player), "rotated");

        store.set(&table, &player, "");
        assert_eq!(store.get(&table, &player), "");
        assert!(backend.is_empty());
    }

    #[test]
    fn secrets_are_scoped_per_table_and_player() {
        let store = SecretStore::new(Arc::new(InMemoryKeyValueStore::new()));
        let (table, player) = addresses();
        store.set(&table, &player, "one");
        assert_eq!(store.get(&Address::new("0xother"), &player), "");
        assert_eq!(store.get(&table, &Address::new("0xother")), "");
    }

    #[test]
    fn unavailable_or_broken_backend_never_fails() {
        let (table, player) = addresses();

        let none = SecretStore::unavailable();
        assert!(!none.set(&table, &player, "abc"));
        assert_eq!(none.get(&table, &player), "");

        let broken = SecretStore::new(Arc::new(BrokenStore));
        assert!(!broken.set(&table, &player, "abc"));
        assert_eq!(broken.get(&table, &player), "");
    }

    #[test]
    fn file_store_survives_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("secrets.json");
        let (table, player) = addresses();

        let first = SecretStore::new(Arc::new(FileKeyValueStore::new(&path)));
        assert!(first.set(&table, &player, "persisted"));
        drop(first);

        let second = SecretStore::new(Arc::new(FileKeyValueStore::new(&path)));
        assert_eq!(second.get(&table, &player), "persisted");

        second.clear(&table, &player);
        let third = SecretStore::new(Arc::new(FileKeyValueStore::new(&path)));
        assert_eq!(third.get(&table, &player), "");
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        fs::write(&path, "{not json").unwrap();
        let store = SecretStore::new(Arc::new(FileKeyValueStore::new(&path)));
        let (table, player) = addresses();
        assert_eq!(store.get(&table, &player), "");
    }

    #[test]
    fn write_after_corrupt_file_starts_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        fs::write(&path, "{bad").unwrap();
        let (table, player) = addresses();

        let backend = FileKeyValueStore::new(&path);
        let aside = backend.corrupt_path();
        let store = SecretStore::new(Arc::new(backend));
        assert!(store.set(&table, &player, "recovered"));
        assert_eq!(fs::read_to_string(&aside).unwrap(), "{bad");

        let fresh = SecretStore::new(Arc::new(FileKeyValueStore::new(&path)));
        assert_eq!(fresh.get(&table, &player), "recovered");
    }

    #[cfg(unix)]
    #[test]
    fn secret_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let (table, player) = addresses();
        let store = SecretStore::new(Arc::new(FileKeyValueStore::new(&path)));
        assert!(store.set(&table, &player, "private"));

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs::File,
    io::{ErrorKind, Read, Seek, Write},
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Interface for abstracting the persisted state. Every entry is one JSON value under a string key.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<Value>>;

    fn persist(&self, key: &str, value: &Value) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: Deref> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn load(&self, key: &str) -> Result<Option<Value>> {
        self.deref().load(key)
    }

    fn persist(&self, key: &str, value: &Value) -> Result<()> {
        self.deref().persist(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.deref().remove(key)
    }
}

/// Stores every entry in one JSON object on disk. Reads take a shared lock, writes hold an
/// exclusive lock for the whole read-modify-write.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {parent:?}"))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(file: &mut File, path: &Path) -> Result<Map<String, Value>> {
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(other) => {
                warn!("State file {path:?} doesn't hold an object, found {other}. Starting over");
                Ok(Map::new())
            }
            Err(e) => Err(e).with_context(|| format!("State file {path:?} is not valid json")),
        }
    }

    fn modify(&self, change: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("Failed to open {:?}", self.path))?;

        FileExt::lock_exclusive(&file)?;
        let result = Self::modify_locked(&mut file, &self.path, change);
        FileExt::unlock(&file)?;
        result
    }

    fn modify_locked(
        file: &mut File,
        path: &Path,
        change: impl FnOnce(&mut Map<String, Value>),
    ) -> Result<()> {
        let mut entries = Self::read_entries(file, path)?;
        change(&mut entries);

        let buffer = serde_json::to_vec_pretty(&Value::Object(entries))?;
        file.rewind()?;
        file.set_len(0)?;
        file.write_all(&buffer)?;
        file.flush()?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to open {:?}", self.path)),
        };

        FileExt::lock_shared(&file)?;
        let entries = Self::read_entries(&mut file, &self.path);
        FileExt::unlock(&file)?;

        debug!("Loaded {key} from {:?}", self.path);
        Ok(entries?.remove(key))
    }

    fn persist(&self, key: &str, value: &Value) -> Result<()> {
        debug!("Persisting {key} into {:?}", self.path);
        self.modify(|entries| {
            entries.insert(key.to_owned(), value.clone());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        debug!("Removing {key} from {:?}", self.path);
        self.modify(|entries| {
            entries.remove(key);
        })
    }
}

/// Keeps entries in memory only. Useful for embedding hosts that persist on their own.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: Value) -> Self {
        self.entries.borrow_mut().insert(key.to_owned(), value);
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn persist(&self, key: &str, value: &Value) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_owned(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;
    use tempfile::tempdir;

    use super::{JsonFileStore, KeyValueStore, MemoryStore};

    #[test]
    fn missing_file_reads_as_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("state.json"))?;
        assert_eq!(store.load("activities")?, None);
        Ok(())
    }

    #[test]
    fn entries_survive_reopening() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("state.json");
        {
            let store = JsonFileStore::new(path.clone())?;
            store.persist("projects", &json!([{ "id": "1", "name": "Bridge" }]))?;
            store.persist("employee-name", &json!("Ana Pop"))?;
        }

        let store = JsonFileStore::new(path)?;
        assert_eq!(store.load("employee-name")?, Some(json!("Ana Pop")));
        assert_eq!(
            store.load("projects")?,
            Some(json!([{ "id": "1", "name": "Bridge" }]))
        );
        Ok(())
    }

    #[test]
    fn shorter_rewrite_leaves_no_trailing_bytes() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("state.json"))?;
        store.persist("activities", &json!({ "2024-05-06": "a very long legacy text entry" }))?;
        store.persist("activities", &json!({}))?;
        store.remove("missing")?;

        assert_eq!(store.load("activities")?, Some(json!({})));
        Ok(())
    }

    #[test]
    fn remove_drops_only_that_key() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("state.json"))?;
        store.persist("a", &json!(1))?;
        store.persist("b", &json!(2))?;
        store.remove("a")?;
        assert_eq!(store.load("a")?, None);
        assert_eq!(store.load("b")?, Some(json!(2)));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json")?;
        let store = JsonFileStore::new(path)?;
        assert!(store.load("activities").is_err());
        Ok(())
    }

    #[test]
    fn memory_store_through_reference() -> Result<()> {
        let store = MemoryStore::new().with_entry("a", json!("x"));
        let by_ref = &store;
        by_ref.persist("b", &json!("y"))?;
        assert_eq!(store.load("a")?, Some(json!("x")));
        assert_eq!(store.load("b")?, Some(json!("y")));
        Ok(())
    }
}

//! Durable key-value storage behind the progress codec.
//!
//! The store trait mirrors the platform preference stores this engine gets
//! embedded against: string get/put/remove plus a string-set primitive for
//! the saved-checklists index. Hosts inject whichever implementation fits;
//! tests use `MemoryStore`.

pub mod codec;
pub mod saver;

pub use codec::{
    ProgressStore,
    SavedChecklistState,
};
pub use saver::SaveScheduler;

use std::{
    collections::{
        BTreeMap,
        BTreeSet,
        HashMap,
        HashSet,
    },
    fs,
    path::PathBuf,
    sync::Mutex,
};

use log::warn;
use serde::{
    Deserialize,
    Serialize,
};

const APP_NAME: &str = "kneeboard";
const STORE_FILE: &str = "progress.json";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn get_string_set(&self, key: &str) -> HashSet<String>;
    fn put_string_set(&self, key: &str, values: &HashSet<String>);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(default)]
    sets: BTreeMap<String, BTreeSet<String>>,
}

/// Write-through JSON file store. An unreadable or corrupt file degrades to
/// an empty store; write failures are logged and the in-memory contents
/// stay authoritative for the session.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl FileStore {
    pub fn open_default() -> Self {
        Self::open(get_app_data_dir().join(STORE_FILE))
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Corrupt state store {}: {}. Starting empty.", path.display(), e);
                    StoreData::default()
                }
            },
            Err(_) => StoreData::default(),
        };

        Self { path, data: Mutex::new(data) }
    }

    fn persist(&self, data: &StoreData) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(data) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("Failed to write state store {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("Failed to serialize state store: {}", e),
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().values.get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) {
        let mut data = self.data.lock().unwrap();
        data.values.insert(key.to_string(), value.to_string());
        self.persist(&data);
    }

    fn remove(&self, key: &str) {
        let mut data = self.data.lock().unwrap();
        if data.values.remove(key).is_some() {
            self.persist(&data);
        }
    }

    fn get_string_set(&self, key: &str) -> HashSet<String> {
        self.data
            .lock()
            .unwrap()
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn put_string_set(&self, key: &str, values: &HashSet<String>) {
        let mut data = self.data.lock().unwrap();
        data.sets.insert(key.to_string(), values.iter().cloned().collect());
        self.persist(&data);
    }
}

/// In-memory store for tests and embedding hosts that bring their own
/// persistence.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    sets: Mutex<HashMap<String, HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) {
        self.values.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }

    fn get_string_set(&self, key: &str) -> HashSet<String> {
        self.sets.lock().unwrap().get(key).cloned().unwrap_or_default()
    }

    fn put_string_set(&self, key: &str, values: &HashSet<String>) {
        self.sets.lock().unwrap().insert(key.to_string(), values.clone());
    }
}

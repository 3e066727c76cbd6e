use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::types::WallpaperRecord;
use crate::error::{EngineError, Result};
use crate::settings::STEAM_LIBRARY_PATH;

/// Number of recently applied ids kept in `prev_ids`.
pub const HISTORY_LEN: usize = 4;

pub const LAST_ID_KEY: &str = "last_id";
pub const PREV_IDS_KEY: &str = "prev_ids";
/// Value of `SteamLibraryPath` in a fresh state file, until `pull` replaces it.
const STEAM_LIBRARY_PLACEHOLDER: &str = "/path/to/SteamLibrary";

/// True for keys that name a wallpaper record.
pub fn is_wallpaper_id(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Wallpaper records in document order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<(String, WallpaperRecord)>,
}

impl Catalog {
    pub fn get(&self, id: &str) -> Option<&WallpaperRecord> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, rec)| rec)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WallpaperRecord)> {
        self.entries.iter().map(|(id, rec)| (id.as_str(), rec))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, WallpaperRecord)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, WallpaperRecord)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// In-memory copy of the state file.
///
/// Callers load a document, mutate it, and hand it back to
/// [`StateStore::save`] as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    data: Map<String, Value>,
}

impl Document {
    pub fn from_map(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// The document written when no state file exists yet.
    pub fn template() -> Self {
        let mut data = Map::new();
        data.insert(STEAM_LIBRARY_PATH.into(), json!(STEAM_LIBRARY_PLACEHOLDER));
        data.insert(LAST_ID_KEY.into(), json!(""));
        data.insert(PREV_IDS_KEY.into(), json!(vec![""; HISTORY_LEN]));
        Self { data }
    }

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.data
            .get(key)
            .ok_or_else(|| EngineError::UnknownKey(key.to_string()))
    }

    /// String form of a top-level value, without JSON quoting for strings.
    pub fn get_string(&self, key: &str) -> Result<String> {
        Ok(match self.get(key)? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// All wallpaper records. Fails with `EmptyCatalog` when there are none.
    pub fn wallpapers(&self) -> Result<Catalog> {
        let catalog: Catalog = self
            .data
            .iter()
            .filter(|(key, _)| is_wallpaper_id(key))
            .filter_map(|(key, value)| match value {
                Value::Object(map) => Some((key.clone(), WallpaperRecord::new(map.clone()))),
                _ => {
                    warn!(id = %key, "state:record is not an object, ignoring");
                    None
                }
            })
            .collect();

        if catalog.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        Ok(catalog)
    }

    pub fn record(&self, id: &str) -> Option<WallpaperRecord> {
        if !is_wallpaper_id(id) {
            return None;
        }
        match self.data.get(id) {
            Some(Value::Object(map)) => Some(WallpaperRecord::new(map.clone())),
            _ => None,
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Set `key.subkey`. The outer key must already hold an object.
    pub fn put_nested(&mut self, key: &str, subkey: impl Into<String>, value: Value) -> Result<()> {
        match self.data.get_mut(key) {
            Some(Value::Object(inner)) => {
                inner.insert(subkey.into(), value);
                Ok(())
            }
            _ => Err(EngineError::UnknownKey(key.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) -> Result<Value> {
        self.data
            .shift_remove(key)
            .ok_or_else(|| EngineError::UnknownKey(key.to_string()))
    }

    pub fn history(&self) -> Vec<String> {
        match self.data.get(PREV_IDS_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Steam library mirrored by `pull`; `None` while the template placeholder is still there.
    pub fn steam_library(&self) -> Option<&str> {
        self.data
            .get(STEAM_LIBRARY_PATH)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty() && *s != STEAM_LIBRARY_PLACEHOLDER)
    }

    pub fn last_id(&self) -> Option<&str> {
        self.data
            .get(LAST_ID_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Record `id` as the newest applied wallpaper.
    ///
    /// The oldest entry is evicted once the ring is full.
    pub fn push_history(&mut self, id: &str) {
        let mut ring = self.history();
        while ring.len() >= HISTORY_LEN {
            ring.remove(0);
        }
        ring.push(id.to_string());
        self.data.insert(PREV_IDS_KEY.into(), json!(ring));
        self.data.insert(LAST_ID_KEY.into(), json!(id));
    }
}

/// The state file on disk.
///
/// Every method is one complete read-modify-write cycle. There is no locking
/// between processes; the last writer wins.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the template document if no state file exists. Returns true if created.
    pub fn init_if_missing(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.save(&Document::template())?;
        info!(path = %self.path.display(), "state:created template");
        Ok(true)
    }

    pub fn load(&self) -> Result<Document> {
        if !self.path.exists() {
            return Err(EngineError::NotFound(self.path.clone()));
        }
        debug!(path = %self.path.display(), "state:load");
        let contents = fs::read_to_string(&self.path)?;
        let data: Map<String, Value> = serde_json::from_str(&contents)?;
        Ok(Document::from_map(data))
    }

    /// Write the whole document. The write is not atomic.
    pub fn save(&self, doc: &Document) -> Result<()> {
        debug!(path = %self.path.display(), keys = doc.data.len(), "state:save");
        let contents = serde_json::to_string_pretty(&doc.data)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Load, apply `f`, and save if `f` succeeded.
    pub fn update<T>(&self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let mut doc = self.load()?;
        let out = f(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }

    pub fn get(&self, key: &str) -> Result<Value> {
        self.load()?.get(key).cloned()
    }

    pub fn wallpapers(&self) -> Result<Catalog> {
        self.load()?.wallpapers()
    }

    pub fn put(&self, key: &str, value: Value) -> Result<()> {
        self.update(|doc| {
            doc.put(key, value);
            Ok(())
        })
    }

    pub fn put_nested(&self, key: &str, subkey: &str, value: Value) -> Result<()> {
        self.update(|doc| doc.put_nested(key, subkey, value))
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.update(|doc| doc.remove(key).map(|_| ()))
    }

    pub fn push_history(&self, id: &str) -> Result<()> {
        self.update(|doc| {
            doc.push_history(id);
            Ok(())
        })
    }
}

use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::workout::Workout;
use crate::MaptyError;

/// String-keyed slot storage, shaped like the browser's `localStorage`.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, MaptyError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), MaptyError>;
    fn remove_item(&mut self, key: &str) -> Result<(), MaptyError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_item` calls served so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, MaptyError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), MaptyError> {
        self.writes += 1;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), MaptyError> {
        self.items.remove(key);
        Ok(())
    }
}

/// A JSON object file of key -> string value. A missing file reads as empty.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, MaptyError> {
        use std::fs;
        use std::io::ErrorKind;

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(MaptyError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            MaptyError::Storage(format!("{} is not a valid store: {e}", self.path.display()))
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), MaptyError> {
        let text = serde_json::to_string_pretty(items)
            .map_err(|e| MaptyError::Storage(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| {
            MaptyError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, MaptyError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), MaptyError> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), MaptyError> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// Decoded workouts alongside the raw entries that did not decode.
type Decoded = (Vec<Workout>, Vec<JsonValue>);

/// Keeps the whole workout list in one storage slot as a JSON array.
///
/// Entries that fail to decode during [`WorkoutStore::restore`] are held as
/// raw JSON and written back ahead of the decoded list on every save, so a
/// record this build cannot read is never dropped from the slot.
#[derive(Debug)]
pub struct WorkoutStore<S> {
    storage: S,
    key: String,
    undecodable: Vec<JsonValue>,
}

impl<S: Storage> WorkoutStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            undecodable: Vec::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw entries held back from the last restore.
    pub fn undecodable(&self) -> &[JsonValue] {
        &self.undecodable
    }

    /// Overwrites the slot with the held raw entries followed by `workouts`.
    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), MaptyError> {
        let mut entries = self.undecodable.clone();
        for workout in workouts {
            entries.push(
                serde_json::to_value(workout).map_err(|e| MaptyError::Storage(e.to_string()))?,
            );
        }
        let text =
            serde_json::to_string(&entries).map_err(|e| MaptyError::Storage(e.to_string()))?;
        self.storage.set_item(&self.key, &text)?;
        debug!(
            count = workouts.len(),
            held = self.undecodable.len(),
            key = %self.key,
            "saved workouts"
        );
        Ok(())
    }

    /// Decodes the slot. `Ok(None)` when the slot is absent; entries that fail
    /// to decode are skipped.
    pub fn try_load(&self) -> Result<Option<Vec<Workout>>, MaptyError> {
        Ok(self.decode()?.map(|(workouts, _)| workouts))
    }

    /// Soft-failing load: absent or broken data yields an empty list.
    pub fn load(&self) -> Vec<Workout> {
        self.soft_decode().0
    }

    /// Like [`load`](Self::load), but also holds on to the entries that did
    /// not decode so that later saves carry them forward.
    pub fn restore(&mut self) -> Vec<Workout> {
        let (workouts, undecodable) = self.soft_decode();
        if !undecodable.is_empty() {
            warn!(count = undecodable.len(), key = %self.key, "keeping undecodable stored workouts");
        }
        self.undecodable = undecodable;
        workouts
    }

    pub fn clear(&mut self) -> Result<(), MaptyError> {
        self.storage.remove_item(&self.key)?;
        self.undecodable.clear();
        Ok(())
    }

    fn soft_decode(&self) -> Decoded {
        match self.decode() {
            Ok(Some(decoded)) => decoded,
            Ok(None) => (Vec::new(), Vec::new()),
            Err(e) => {
                warn!(error = %e, key = %self.key, "ignoring stored workouts");
                (Vec::new(), Vec::new())
            }
        }
    }

    fn decode(&self) -> Result<Option<Decoded>, MaptyError> {
        let Some(text) = self.storage.get_item(&self.key)? else {
            return Ok(None);
        };
        let entries: Vec<JsonValue> =
            serde_json::from_str(&text).map_err(|e| MaptyError::Decode(e.to_string()))?;
        let total = entries.len();
        let mut workouts = Vec::with_capacity(total);
        let mut undecodable = Vec::new();
        for (idx, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Workout>(entry.clone()) {
                Ok(w) => workouts.push(w),
                Err(e) => {
                    warn!(index = idx, error = %e, "skipping undecodable stored workout");
                    undecodable.push(entry);
                }
            }
        }
        debug!(loaded = workouts.len(), total, "loaded workouts");
        Ok(Some((workouts, undecodable)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::form::WorkoutInput;
    use crate::workout::Coords;

    fn sample(n: usize) -> Vec<Workout> {
        (0..n)
            .map(|i| {
                let at = Utc.with_ymd_and_hms(2026, 3, 1 + i as u32, 8, 0, 0).unwrap();
                let input = if i % 2 == 0 {
                    WorkoutInput::Running {
                        distance: 5.0 + i as f64,
                        duration: 30.0,
                        cadence: 160.0,
                    }
                } else {
                    WorkoutInput::Cycling {
                        distance: 20.0,
                        duration: 40.0 + i as f64,
                        elevation_gain: -3.0,
                    }
                };
                Workout::new(input, Coords::new(50.0 + i as f64, 30.0), at)
            })
            .collect()
    }

    #[test]
    fn save_then_load_preserves_records() {
        let mut store = WorkoutStore::new(MemoryStorage::new(), "workouts");
        let workouts = sample(5);
        store.save(&workouts).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.len(), 5);
        for (a, b) in workouts.iter().zip(loaded.iter()) {
            assert_eq!(a.discipline(), b.discipline());
            assert_eq!(a.coords, b.coords);
            assert_eq!(a.distance, b.distance);
            assert_eq!(a.duration, b.duration);
            assert_eq!(a.description, b.description);
            assert_eq!(a.metrics, b.metrics);
        }
    }

    #[test]
    fn absent_key_is_empty() {
        let store = WorkoutStore::new(MemoryStorage::new(), "workouts");
        assert_eq!(store.try_load().unwrap(), None);
        assert!(store.load().is_empty());
    }

    #[test]
    fn garbage_is_soft_failure() {
        let mut storage = MemoryStorage::new();
        storage.set_item("workouts", "{not json").unwrap();
        let store = WorkoutStore::new(storage, "workouts");
        assert!(matches!(store.try_load(), Err(MaptyError::Decode(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn bad_entries_are_skipped() {
        let good = serde_json::to_value(&sample(1)[0]).unwrap();
        let text = serde_json::json!([good, { "type": "swimming" }, 7]).to_string();
        let mut storage = MemoryStorage::new();
        storage.set_item("workouts", &text).unwrap();
        let store = WorkoutStore::new(storage, "workouts");
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn restored_bad_entries_survive_save() {
        let good = serde_json::to_value(&sample(1)[0]).unwrap();
        let legacy = serde_json::json!({ "type": "running", "pace": null, "id": "1" });
        let text = serde_json::json!([good, legacy]).to_string();
        let mut storage = MemoryStorage::new();
        storage.set_item("workouts", &text).unwrap();
        let mut store = WorkoutStore::new(storage, "workouts");

        let mut workouts = store.restore();
        assert_eq!(workouts.len(), 1);
        assert_eq!(store.undecodable(), &[legacy.clone()]);

        workouts.extend(sample(2).into_iter().skip(1));
        store.save(&workouts).unwrap();

        let raw = store.storage().get_item("workouts").unwrap().unwrap();
        let entries: Vec<JsonValue> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], legacy);
        assert_eq!(store.load().len(), 2);

        store.clear().unwrap();
        assert!(store.undecodable().is_empty());
    }

    #[test]
    fn clear_removes_slot() {
        let mut store = WorkoutStore::new(MemoryStorage::new(), "workouts");
        store.save(&sample(2)).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = WorkoutStore::new(FileStorage::new(&path), "workouts");
        assert!(store.load().is_empty());
        store.save(&sample(3)).unwrap();

        let reopened = WorkoutStore::new(FileStorage::new(&path), "workouts");
        assert_eq!(reopened.load().len(), 3);

        let mut other = FileStorage::new(&path);
        other.set_item("unrelated", "x").unwrap();
        assert_eq!(reopened.load().len(), 3);
        assert_eq!(other.get_item("unrelated").unwrap().as_deref(), Some("x"));
    }
}

//! Snapshot persistence.
//!
//! A snapshot is the serialized [`GameAggregate`] wrapped in a small
//! versioned envelope. [`JsonFileStore`] keeps one `<key>.json` file per
//! key and replaces it atomically; [`MemoryStore`] keeps snapshots in
//! memory for tests and throwaway sessions.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aw_core::GameAggregate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};

/// Envelope version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotOut<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    state: &'a GameAggregate,
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    state: serde_json::Value,
}

/// Serialize a snapshot envelope.
pub fn encode_snapshot(game: &GameAggregate) -> StoreResult<String> {
    let out = SnapshotOut {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        state: game,
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

/// Parse and validate a snapshot envelope.
pub fn decode_snapshot(json: &str) -> StoreResult<GameAggregate> {
    let envelope: SnapshotIn = serde_json::from_str(json)?;
    if envelope.version != SNAPSHOT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: envelope.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    Ok(serde_json::from_value(envelope.state)?)
}

/// Where snapshots live.
pub trait SnapshotStore: Send {
    /// Load the snapshot under `key`, if any.
    fn load(&self, key: &str) -> StoreResult<Option<GameAggregate>>;

    /// Replace the snapshot under `key`.
    fn save(&self, key: &str, game: &GameAggregate) -> StoreResult<()>;

    /// Remove the snapshot under `key`. Missing snapshots are not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;
}

/// One JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store snapshots under `dir`, creating it on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory snapshots are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, key: &str) -> StoreResult<Option<GameAggregate>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        decode_snapshot(&json).map(Some)
    }

    fn save(&self, key: &str, game: &GameAggregate) -> StoreResult<()> {
        let json = encode_snapshot(game)?;
        fs::create_dir_all(&self.dir)?;
        // Write beside the target, then rename over it.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshots held in memory as encoded JSON.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put raw JSON under a key, bypassing encoding.
    pub fn insert_raw(&self, key: impl Into<String>, json: impl Into<String>) {
        self.lock().insert(key.into(), json.into());
    }

    /// The raw JSON under a key.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> StoreResult<Option<GameAggregate>> {
        match self.raw(key) {
            Some(json) => decode_snapshot(&json).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, game: &GameAggregate) -> StoreResult<()> {
        let json = encode_snapshot(game)?;
        self.insert_raw(key, json);
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

impl<T: SnapshotStore + Sync> SnapshotStore for std::sync::Arc<T> {
    fn load(&self, key: &str) -> StoreResult<Option<GameAggregate>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, game: &GameAggregate) -> StoreResult<()> {
        (**self).save(key, game)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aw_core::{ActiveScreen, LogKind, defaults};

    fn played() -> GameAggregate {
        let mut game = defaults::new_session();
        game.append_log(LogKind::Action, "你：点亮火把");
        game.set_active_screen(ActiveScreen::Status);
        game
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("saves"));
        assert!(store.load("ttrpg-save").unwrap().is_none());

        let game = played();
        store.save("ttrpg-save", &game).unwrap();
        assert!(store.path_for("ttrpg-save").exists());

        let back = store.load("ttrpg-save").unwrap().unwrap();
        assert_eq!(back, game);
    }

    #[test]
    fn file_store_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save("slot", &defaults::new_session()).unwrap();
        store.save("slot", &played()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["slot.json".to_string()]);
        assert_eq!(store.load("slot").unwrap().unwrap().log().len(), 2);
    }

    #[test]
    fn file_store_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save("slot", &played()).unwrap();
        store.delete("slot").unwrap();
        store.delete("slot").unwrap();
        assert!(store.load("slot").unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path_for("slot"), "{not json").unwrap();
        assert!(matches!(store.load("slot"), Err(StoreError::Format(_))));
    }

    #[test]
    fn envelope_has_version() {
        let json = encode_snapshot(&played()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], SNAPSHOT_VERSION);
        assert!(value["savedAt"].is_string());
        assert_eq!(value["state"]["activeScreen"], "status");
        assert_eq!(value["state"]["currentTurn"], "player");
    }

    #[test]
    fn future_version_is_rejected() {
        let store = MemoryStore::new();
        store.insert_raw("slot", r#"{"version": 99, "state": {}}"#);
        assert!(matches!(
            store.load("slot"),
            Err(StoreError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        let game = played();
        store.save("slot", &game).unwrap();
        assert_eq!(store.load("slot").unwrap(), Some(game));
        store.delete("slot").unwrap();
        assert!(store.raw("slot").is_none());
    }
}

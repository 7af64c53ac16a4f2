// Load on startup, save on song changes and on quit.
// <project_dir>/.raindrum/{songs,ambience,prefs}.json, one file per key so a
// corrupt mixer never costs anyone their songs.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::pipeline::project::ProjectState;

pub const RAINDRUM_DIR: &str = ".raindrum";
const SONGS_FILE: &str = "songs.json";
const AMBIENCE_FILE: &str = "ambience.json";
const PREFS_FILE: &str = "prefs.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn data_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(RAINDRUM_DIR)
}

// Ok(None) when the file simply isn't there yet.
fn load_key<T: DeserializeOwned>(project_dir: &Path, file: &str) -> Result<Option<T>, StoreError> {
    let path = data_dir(project_dir).join(file);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(StoreError::Io { path, source }),
    };
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|source| StoreError::Malformed { path, source })
}

fn load_or_default<T: DeserializeOwned + Default>(project_dir: &Path, file: &str) -> T {
    match load_key(project_dir, file) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(file, "nothing saved yet");
            T::default()
        }
        Err(e) => {
            warn!("{e}; using defaults");
            T::default()
        }
    }
}

/// Never fails: anything unreadable is replaced by its default.
pub fn load_project(project_dir: &Path) -> ProjectState {
    ProjectState {
        songs: load_or_default(project_dir, SONGS_FILE),
        ambience: load_or_default(project_dir, AMBIENCE_FILE),
        prefs: load_or_default(project_dir, PREFS_FILE),
    }
}

fn save_key<T: Serialize>(project_dir: &Path, file: &str, value: &T) -> Result<(), StoreError> {
    let dir = data_dir(project_dir);
    std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir.clone(), source })?;
    let path = dir.join(file);
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| StoreError::Malformed { path: path.clone(), source })?;
    std::fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
}

pub fn save_songs(project_dir: &Path, state: &ProjectState) -> Result<(), StoreError> {
    save_key(project_dir, SONGS_FILE, &state.songs)
}

pub fn save_project(project_dir: &Path, state: &ProjectState) -> Result<(), StoreError> {
    save_songs(project_dir, state)?;
    save_key(project_dir, AMBIENCE_FILE, &state.ambience)?;
    save_key(project_dir, PREFS_FILE, &state.prefs)
}

//! File-backed state store
//!
//! The whole shell state is one JSON object in `state.json` under the data
//! directory. Writes go through the in-memory map and are flushed to disk
//! before the call returns, so a phase transition never observes a store
//! that is ahead of the file.

use crate::store::{kv, StateStore};
use coopgate_core::{ConsentState, Destination, Error, LaunchMode, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

const STATE_FILE: &str = "state.json";

pub struct FileStore {
    path: PathBuf,
    map: Mutex<Map<String, Value>>,
}

impl FileStore {
    /// Open (or create) the store under `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(STATE_FILE);
        let map = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Unreadable state at {}: {} — starting fresh", path.display(), e);
                    Map::new()
                }
            },
            Err(_) => {
                info!("No state at {} — starting fresh", path.display());
                Map::new()
            }
        };
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Map<String, Value>) -> T) -> Result<T> {
        let map = self
            .map
            .lock()
            .map_err(|_| Error::store("state lock poisoned"))?;
        Ok(f(&map))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Map<String, Value>) -> T) -> Result<T> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| Error::store("state lock poisoned"))?;
        let out = f(&mut map);
        let content = serde_json::to_string_pretty(&*map)?;
        std::fs::write(&self.path, content)?;
        Ok(out)
    }
}

impl StateStore for FileStore {
    fn launch_mode(&self) -> Result<Option<LaunchMode>> {
        self.read(kv::launch_mode)
    }

    fn set_launch_mode(&self, mode: LaunchMode) -> Result<()> {
        self.write(|m| kv::set_launch_mode(m, mode))
    }

    fn saved_destination(&self) -> Result<Option<Destination>> {
        self.read(kv::saved_destination)
    }

    fn save_destination(&self, dest: &Destination) -> Result<()> {
        self.write(|m| kv::save_destination(m, dest))
    }

    fn consent(&self) -> Result<ConsentState> {
        self.read(kv::consent)
    }

    fn record_consent(&self, granted: bool) -> Result<()> {
        self.write(|m| kv::record_consent(m, granted))
    }

    fn record_prompt(&self, at: i64) -> Result<()> {
        self.write(|m| kv::record_prompt(m, at))
    }

    fn has_launched_before(&self) -> Result<bool> {
        self.read(kv::has_launched_before)
    }

    fn mark_launched(&self) -> Result<()> {
        self.write(kv::mark_launched)
    }

    fn push_token(&self) -> Result<Option<String>> {
        self.read(kv::push_token)
    }

    fn set_push_token(&self, token: &str) -> Result<()> {
        self.write(|m| kv::set_push_token(m, token))
    }

    fn pending_link(&self) -> Result<Option<String>> {
        self.read(kv::pending_link)
    }

    fn set_pending_link(&self, url: &str) -> Result<()> {
        self.write(|m| kv::set_pending_link(m, url))
    }

    fn take_pending_link(&self) -> Result<Option<String>> {
        self.write(kv::take_pending_link)
    }

    fn clear(&self) -> Result<()> {
        self.write(|m| m.clear())
    }

    fn dump(&self) -> Result<Vec<(String, Value)>> {
        self.read(kv::dump)
    }
}

//! In-memory state store for tests and dry runs

use crate::store::{kv, StateStore};
use coopgate_core::{ConsentState, Destination, Error, LaunchMode, Result};
use serde_json::{Map, Value};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
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
        Ok(f(&mut map))
    }
}

impl StateStore for MemoryStore {
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

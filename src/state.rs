// src/state.rs
//! Durable "seen entry ids" set.
//!
//! Every mutation is a full read-modify-write of the JSON file, so callers
//! must not run two mutating cycles against the same file concurrently.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MonitorError, Result};
use crate::types::{now_iso, MonitorState};

pub const DEFAULT_STATE_FILE: &str = "changelog-monitor-state.json";

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_FILE)
    }
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `path`, or the default file in the working directory.
    pub fn from_option(path: Option<&Path>) -> Self {
        path.map(Self::new).unwrap_or_default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable state is treated as empty; never fails.
    pub async fn load(&self) -> MonitorState {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return MonitorState::fresh(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file unreadable, starting empty");
                return MonitorState::fresh();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(st) => st,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file corrupt, starting empty");
                MonitorState::fresh()
            }
        }
    }

    /// Pretty-printed whole-file overwrite.
    pub async fn save(&self, state: &MonitorState) -> Result<()> {
        let persist_err = |source| MonitorError::Persist {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(persist_err)?;
        }
        let body = serde_json::to_vec_pretty(state).map_err(|e| persist_err(std::io::Error::other(e)))?;
        fs::write(&self.path, body).await.map_err(persist_err)
    }

    /// Mark one id as seen. Returns `false` (and writes nothing) if already present.
    pub async fn add_seen(&self, id: &str) -> Result<bool> {
        Ok(self.add_seen_many([id]).await? == 1)
    }

    /// Mark several ids as seen; returns how many were new.
    pub async fn add_seen_many<I, S>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.load().await;
        let before = state.seen_entries.len();
        for id in ids {
            let id = id.as_ref();
            if !state.seen_entries.iter().any(|s| s == id) {
                state.seen_entries.push(id.to_string());
            }
        }
        let added = state.seen_entries.len() - before;
        if added > 0 {
            state.last_checked = now_iso();
            self.save(&state).await?;
        }
        Ok(added)
    }

    pub async fn seen_entries(&self) -> Vec<String> {
        self.load().await.seen_entries
    }

    /// Replace the state with a fresh, empty record.
    pub async fn reset(&self) -> Result<()> {
        self.save(&MonitorState::fresh()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let st = store.load().await;
        assert!(st.seen_entries.is_empty());
        assert!(!st.last_checked.is_empty());
        // load does not create the file
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ definitely not json").unwrap();
        let store = StateStore::new(&path);
        assert!(store.seen_entries().await.is_empty());
    }

    #[tokio::test]
    async fn add_seen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/state.json"));
        assert!(store.add_seen("a").await.unwrap());
        assert!(!store.add_seen("a").await.unwrap());
        assert_eq!(store.seen_entries().await, vec!["a".to_string()]);

        let added = store.add_seen_many(["a", "b", "b", "c"]).await.unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.seen_entries().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn file_is_pretty_camel_case_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.add_seen("x").await.unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"seenEntries\""));
        assert!(raw.contains("\"lastChecked\""));
        assert!(raw.contains('\n'));
    }

    #[tokio::test]
    async fn file_without_last_checked_keeps_seen_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"seenEntries":["a","b","c"]}"#).unwrap();
        let store = StateStore::new(&path);

        let st = store.load().await;
        assert_eq!(st.seen_entries, vec!["a", "b", "c"]);
        assert!(!st.last_checked.is_empty());

        assert!(store.add_seen("d").await.unwrap());
        assert!(!store.add_seen("a").await.unwrap());
        assert_eq!(store.seen_entries().await, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn reset_clears_seen_and_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.add_seen_many(["a", "b"]).await.unwrap();

        store.reset().await.unwrap();
        assert!(store.path().exists());
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let st: MonitorState = serde_json::from_str(&raw).unwrap();
        assert!(st.seen_entries.is_empty());
        assert!(!st.last_checked.is_empty());

        // previously seen ids count as new again
        assert!(store.add_seen("a").await.unwrap());
    }

    #[tokio::test]
    async fn reset_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/state.json"));
        store.reset().await.unwrap();
        assert!(store.path().exists());
        assert!(store.seen_entries().await.is_empty());
    }
}

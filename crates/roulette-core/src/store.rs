//! Durable pick history and recently used list URLs.
//!
//! Both collections are small JSON arrays kept newest first. A missing or
//! unreadable file is treated as empty so a corrupt store never blocks a pick.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::StorageConfig;
use crate::platform;
use crate::protocol::FinalResult;

/// A past pick as persisted in `history.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub result: FinalResult,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(result: FinalResult) -> Self {
        Self {
            result,
            saved_at: Utc::now(),
        }
    }
}

pub trait Store: Send + Sync {
    fn append_history(&self, entry: HistoryEntry) -> anyhow::Result<()>;
    fn history(&self) -> Vec<HistoryEntry>;
    fn clear_history(&self) -> anyhow::Result<()>;
    fn append_recent(&self, urls: &[String]) -> anyhow::Result<()>;
    fn recent_lists(&self) -> Vec<String>;
    fn clear_recent(&self) -> anyhow::Result<()>;

    /// Record a successful pick: one history entry and one recent-lists update.
    fn record_success(&self, result: &FinalResult, urls: &[String]) -> anyhow::Result<()> {
        self.append_history(HistoryEntry::new(result.clone()))?;
        self.append_recent(urls)
    }
}

fn push_history(entries: &mut Vec<HistoryEntry>, entry: HistoryEntry, cap: usize) {
    entries.insert(0, entry);
    entries.truncate(cap);
}

/// Submitted URLs go to the front in submission order; older duplicates drop out.
fn push_recent(lists: &mut Vec<String>, urls: &[String], cap: usize) {
    let mut fresh: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        if !fresh.iter().any(|f| f == url) {
            fresh.push(url.to_string());
        }
    }
    lists.retain(|existing| !fresh.contains(existing));
    fresh.append(lists);
    fresh.truncate(cap);
    *lists = fresh;
}

// ── File-backed store ─────────────────────────────────────────────────────────

pub struct FileStore {
    history_path: PathBuf,
    recent_path: PathBuf,
    history_cap: usize,
    recent_cap: usize,
    // Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileStore {
    /// Files resolve relative to the data directory unless absolute.
    pub fn new(config: &StorageConfig) -> Self {
        let dir = platform::data_dir();
        Self::in_dir(&dir, config)
    }

    pub fn in_dir(dir: &Path, config: &StorageConfig) -> Self {
        Self {
            history_path: dir.join(&config.history_file),
            recent_path: dir.join(&config.recent_file),
            history_cap: config.history_cap.max(1),
            recent_cap: config.recent_cap.max(1),
            lock: Mutex::new(()),
        }
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    pub fn recent_path(&self) -> &Path {
        &self.recent_path
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn load_list<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<T>>(&content) {
        Ok(items) => items,
        Err(e) => {
            warn!("ignoring unreadable {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn save_list<T: Serialize>(path: &Path, items: &[T]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

impl Store for FileStore {
    fn append_history(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        let _guard = self.guard();
        let mut entries = load_list(&self.history_path);
        push_history(&mut entries, entry, self.history_cap);
        save_list(&self.history_path, &entries)
    }

    fn history(&self) -> Vec<HistoryEntry> {
        let _guard = self.guard();
        load_list(&self.history_path)
    }

    fn clear_history(&self) -> anyhow::Result<()> {
        let _guard = self.guard();
        save_list::<HistoryEntry>(&self.history_path, &[])
    }

    fn append_recent(&self, urls: &[String]) -> anyhow::Result<()> {
        let _guard = self.guard();
        let mut lists = load_list(&self.recent_path);
        push_recent(&mut lists, urls, self.recent_cap);
        save_list(&self.recent_path, &lists)
    }

    fn recent_lists(&self) -> Vec<String> {
        let _guard = self.guard();
        load_list(&self.recent_path)
    }

    fn clear_recent(&self) -> anyhow::Result<()> {
        let _guard = self.guard();
        save_list::<String>(&self.recent_path, &[])
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryInner {
    history: Vec<HistoryEntry>,
    recent: Vec<String>,
}

pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    history_cap: usize,
    recent_cap: usize,
}

impl MemoryStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            history_cap: config.history_cap.max(1),
            recent_cap: config.recent_cap.max(1),
        }
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&StorageConfig::default())
    }
}

impl Store for MemoryStore {
    fn append_history(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        let cap = self.history_cap;
        push_history(&mut self.inner().history, entry, cap);
        Ok(())
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.inner().history.clone()
    }

    fn clear_history(&self) -> anyhow::Result<()> {
        self.inner().history.clear();
        Ok(())
    }

    fn append_recent(&self, urls: &[String]) -> anyhow::Result<()> {
        let cap = self.recent_cap;
        push_recent(&mut self.inner().recent, urls, cap);
        Ok(())
    }

    fn recent_lists(&self) -> Vec<String> {
        self.inner().recent.clone()
    }

    fn clear_recent(&self) -> anyhow::Result<()> {
        self.inner().recent.clear();
        Ok(())
    }
}

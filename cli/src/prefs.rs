//! Local preferences: last login email, recently viewed lists and
//! per-list spoiler choices.
//!
//! DESIGN
//! ======
//! Each preference is an independent JSON blob under a fixed key in a
//! [`KeyValueStore`]. A blob that is missing or fails to parse reads as
//! empty, so a damaged file never blocks the CLI. Map keys are kept as
//! plain strings so an entry this build cannot interpret survives a
//! rewrite. Removals of absent entries do not write.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

const LAST_EMAIL_KEY: &str = "lastEmail";
const RECENT_LISTS_KEY: &str = "recentLists";
const SPOILER_CHOICES_KEY: &str = "spoilerChoices";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("preferences io failed: {0}")]
    Io(#[from] io::Error),
    #[error("preferences encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("timestamp format failed: {0}")]
    Timestamp(#[from] time::error::Format),
}

// =============================================================================
// KEY-VALUE BACKENDS
// =============================================================================

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&mut self, key: &str, value: String) -> Result<(), PrefsError>;
}

/// All keys in one JSON object on disk, rewritten on every `set`.
pub struct FileKv {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileKv {
    /// Load `path`. A missing or unreadable file starts empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, values }
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PrefsError> {
        self.values.insert(key.to_owned(), value);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryKv {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryKv {
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PrefsError> {
        self.values.insert(key.to_owned(), value);
        self.writes += 1;
        Ok(())
    }
}

// =============================================================================
// PREFERENCES
// =============================================================================

pub struct Preferences<S> {
    kv: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    #[cfg(test)]
    pub(crate) fn kv(&self) -> &S {
        &self.kv
    }

    fn read_blob<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.kv
            .get(key)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn write_blob<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), PrefsError> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, raw)
    }

    pub fn get_last_email(&self) -> Option<String> {
        self.kv.get(LAST_EMAIL_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn set_last_email(&mut self, email: &str) -> Result<(), PrefsError> {
        self.kv.set(LAST_EMAIL_KEY, email.to_owned())
    }

    /// List id to RFC 3339 view time.
    pub fn get_recent_lists(&self) -> BTreeMap<String, String> {
        self.read_blob(RECENT_LISTS_KEY)
    }

    /// Record a view of `id` now.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn add_recent_list(&mut self, id: Uuid) -> Result<(), PrefsError> {
        self.add_recent_list_at(id, OffsetDateTime::now_utc())
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn add_recent_list_at(&mut self, id: Uuid, at: OffsetDateTime) -> Result<(), PrefsError> {
        let mut recent = self.get_recent_lists();
        recent.insert(id.to_string(), at.format(&Rfc3339)?);
        self.write_blob(RECENT_LISTS_KEY, &recent)
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn remove_recent_list(&mut self, id: Uuid) -> Result<(), PrefsError> {
        let mut recent = self.get_recent_lists();
        if recent.remove(&id.to_string()).is_none() {
            return Ok(());
        }
        self.write_blob(RECENT_LISTS_KEY, &recent)
    }

    /// Most recently viewed first. Unparseable timestamps sort last; keys
    /// that are not list ids are skipped.
    pub fn get_sorted_recent_list_ids(&self) -> Vec<Uuid> {
        let mut entries: Vec<(Uuid, Option<OffsetDateTime>)> = self
            .get_recent_lists()
            .into_iter()
            .filter_map(|(key, stamp)| {
                let id = Uuid::parse_str(&key).ok()?;
                Some((id, OffsetDateTime::parse(&stamp, &Rfc3339).ok()))
            })
            .collect();
        // None < Some, so reversing the order puts unparsed entries last.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().map(|(id, _)| id).collect()
    }

    pub fn get_spoiler_choices(&self) -> BTreeMap<String, bool> {
        self.read_blob(SPOILER_CHOICES_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn set_spoiler_choice(&mut self, id: Uuid, show: bool) -> Result<(), PrefsError> {
        let mut choices = self.get_spoiler_choices();
        choices.insert(id.to_string(), show);
        self.write_blob(SPOILER_CHOICES_KEY, &choices)
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn remove_spoiler_choice(&mut self, id: Uuid) -> Result<(), PrefsError> {
        let mut choices = self.get_spoiler_choices();
        if choices.remove(&id.to_string()).is_none() {
            return Ok(());
        }
        self.write_blob(SPOILER_CHOICES_KEY, &choices)
    }

    pub fn has_spoiler_choice(&self, id: Uuid) -> bool {
        self.get_spoiler_choices().contains_key(&id.to_string())
    }

    pub fn get_spoiler_choice(&self, id: Uuid) -> Option<bool> {
        self.get_spoiler_choices().get(&id.to_string()).copied()
    }
}

#[cfg(test)]
#[path = "prefs_test.rs"]
mod tests;

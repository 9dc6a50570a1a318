// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Workspace store
//!
//! Owns the loaded tierlists, the active selection and the per-tierlist
//! entry backups. A backup is the last known-good `entries` tree of a
//! tierlist: taken right after load and after every successful save, and
//! put back when a tierlist is closed or opened.

use futures::future::{join, join_all};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::{self, CodecError};
use crate::fs::{EntryKind, FilesystemCapability, FsError, FsSelector};
use crate::types::{Entries, Metrics, NewAttempt, Tierlist, TierlistEntry};

/// Workspace-wide settings file
pub const SETTINGS_FILE: &str = "settings.json";

/// Per-entity display settings file
pub const POKEMON_FILE: &str = "pokemon.json";

/// Files that are never tierlists
pub const RESERVED_FILES: [&str; 2] = [SETTINGS_FILE, POKEMON_FILE];

/// Workspace errors
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Filesystem failure
    #[error(transparent)]
    Fs(#[from] FsError),

    /// A required top-level file is missing
    #[error("Workspace is missing \"{0}\". Select a valid workspace.")]
    MissingFile(&'static str),

    /// A settings file is not valid JSON
    #[error("Failed to parse \"{file}\": {source}")]
    Settings {
        /// File name
        file: &'static str,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// A tierlist file with that name exists already
    #[error("Tierlist already exists: {filename}")]
    AlreadyExists {
        /// Colliding file name
        filename: String,
    },

    /// No capability has been acquired yet
    #[error("Filesystem not ready.")]
    NotReady,

    /// The operation needs an open tierlist
    #[error("No tierlist is open.")]
    NoActiveTierlist,

    /// No entry with that name in the open tierlist
    #[error("No entry named {0:?}")]
    UnknownEntry(String),

    /// Attempt index out of range
    #[error("{entity:?} has no attempt #{index}")]
    UnknownAttempt {
        /// Entity name
        entity: String,
        /// Requested index
        index: usize,
    },

    /// Encoding failure
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Lifecycle of a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkspaceState {
    /// Nothing loaded yet
    #[default]
    Unloaded,
    /// A load is in progress
    Loading,
    /// Tierlists are available
    Loaded,
}

/// A file that was not loaded as a tierlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// File name
    pub filename: String,
    /// Why it was skipped
    pub reason: String,
}

/// Outcome of [`WorkspaceStore::load_workspace`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of tierlists loaded
    pub loaded: usize,
    /// `.json` files that failed to load
    pub skipped: Vec<SkippedFile>,
    /// Whether an empty directory was seeded with the settings files
    pub seeded: bool,
}

/// In-memory workspace
#[derive(Default)]
pub struct WorkspaceStore {
    fs: Option<Arc<dyn FilesystemCapability>>,
    state: WorkspaceState,
    settings: Value,
    pokemon_settings: Value,
    tierlists: Vec<Tierlist>,
    active: Option<usize>,
    backups: HashMap<String, Entries>,
}

impl WorkspaceStore {
    /// Empty, unloaded store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Acquire a capability through `selector` (once; later loads reuse it)
    /// and load the workspace.
    ///
    /// # Errors
    ///
    /// See [`Self::load_workspace_with`]; also fails when acquisition is
    /// cancelled or unavailable.
    pub async fn load_workspace(
        &mut self,
        selector: &FsSelector,
    ) -> Result<LoadReport, WorkspaceError> {
        let fs = match &self.fs {
            Some(fs) => Arc::clone(fs),
            None => selector.acquire().await?,
        };
        self.load_workspace_with(fs).await
    }

    /// Load the workspace from an already acquired capability.
    ///
    /// Tierlist files that cannot be read or parsed are skipped and listed
    /// in the report.
    ///
    /// # Errors
    ///
    /// Fails when a settings file is missing or malformed, or when the
    /// directory cannot be listed.
    pub async fn load_workspace_with(
        &mut self,
        fs: Arc<dyn FilesystemCapability>,
    ) -> Result<LoadReport, WorkspaceError> {
        self.fs = Some(Arc::clone(&fs));
        self.state = WorkspaceState::Loading;

        match self.load_from(fs.as_ref()).await {
            Ok(report) => {
                self.state = WorkspaceState::Loaded;
                Ok(report)
            }
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    /// Drop everything read by a previous load
    fn clear(&mut self) {
        self.state = WorkspaceState::Unloaded;
        self.settings = Value::Null;
        self.pokemon_settings = Value::Null;
        self.tierlists.clear();
        self.active = None;
        self.backups.clear();
    }

    async fn load_from(
        &mut self,
        fs: &dyn FilesystemCapability,
    ) -> Result<LoadReport, WorkspaceError> {
        let mut report = LoadReport::default();

        if fs.is_dir_empty("").await? {
            info!("Workspace is empty. Creating a new workspace.");
            fs.write_text(SETTINGS_FILE, "{}").await?;
            fs.write_text(POKEMON_FILE, "{}").await?;
            report.seeded = true;
        }

        for file in RESERVED_FILES {
            if !fs.file_exists(file).await {
                return Err(WorkspaceError::MissingFile(file));
            }
        }

        let settings = read_json(fs, SETTINGS_FILE).await?;
        let pokemon_settings = read_json(fs, POKEMON_FILE).await?;

        let mut tierlists = Vec::new();
        for entry in fs.get_dir_entries("/").await? {
            if entry.kind != EntryKind::File {
                debug!("Skipping directory entry: {}", entry.name);
                continue;
            }
            if !entry.name.ends_with(".json") {
                debug!("Skipping non-json file: {}", entry.name);
                continue;
            }
            if RESERVED_FILES.contains(&entry.name.as_str()) {
                continue;
            }

            let outcome = match fs.read(&entry.name).await {
                Ok(text) => codec::parse(&text).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(Some(mut tierlist)) => {
                    tierlist.filename = entry.name;
                    tierlists.push(tierlist);
                }
                Ok(None) => report.skip(entry.name, "not a tierlist (missing required keys)"),
                Err(reason) => report.skip(entry.name, reason),
            }
        }

        tierlists.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.filename.cmp(&b.filename))
        });

        self.settings = settings;
        self.pokemon_settings = pokemon_settings;
        self.backups.clear();
        self.tierlists = tierlists;
        self.active = None;
        for index in 0..self.tierlists.len() {
            self.backup_at(index);
        }

        report.loaded = self.tierlists.len();
        info!(
            "Loaded {} tierlist(s) from {}",
            report.loaded,
            fs.root_name()
        );
        Ok(report)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> WorkspaceState {
        self.state
    }

    /// Root display name of the acquired capability
    #[must_use]
    pub fn root_name(&self) -> Option<&str> {
        self.fs.as_deref().map(|fs| fs.root_name())
    }

    /// Loaded tierlists, sorted by name
    #[must_use]
    pub fn tierlists(&self) -> &[Tierlist] {
        &self.tierlists
    }

    /// Workspace settings, kept verbatim
    #[must_use]
    pub fn settings(&self) -> &Value {
        &self.settings
    }

    /// Per-entity display settings, kept verbatim
    #[must_use]
    pub fn pokemon_settings(&self) -> &Value {
        &self.pokemon_settings
    }

    /// Index of the open tierlist
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The open tierlist
    #[must_use]
    pub fn active_tierlist(&self) -> Option<&Tierlist> {
        self.active.and_then(|i| self.tierlists.get(i))
    }

    /// The open tierlist, mutably
    pub fn active_tierlist_mut(&mut self) -> Option<&mut Tierlist> {
        self.active.and_then(|i| self.tierlists.get_mut(i))
    }

    /// Find a tierlist by file name, or by name ignoring case
    #[must_use]
    pub fn find_tierlist(&self, query: &str) -> Option<usize> {
        self.tierlists
            .iter()
            .position(|t| t.filename == query)
            .or_else(|| {
                self.tierlists
                    .iter()
                    .position(|t| t.name.eq_ignore_ascii_case(query))
            })
    }

    /// Last backup taken for `filename`
    #[must_use]
    pub fn backup(&self, filename: &str) -> Option<&Entries> {
        self.backups.get(filename)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Create, persist and append an empty tierlist; returns its index.
    ///
    /// # Errors
    ///
    /// [`WorkspaceError::AlreadyExists`] when the derived file name is taken.
    pub async fn create_tierlist(&mut self, name: &str) -> Result<usize, WorkspaceError> {
        let fs = self.fs.clone().ok_or(WorkspaceError::NotReady)?;
        let tierlist = Tierlist::skeleton(name);

        if fs.file_exists(&tierlist.filename).await
            || self.tierlists.iter().any(|t| t.filename == tierlist.filename)
        {
            return Err(WorkspaceError::AlreadyExists {
                filename: tierlist.filename,
            });
        }

        fs.write_text(&tierlist.filename, &codec::stringify(&tierlist)?)
            .await?;
        info!("Created tierlist {:?} in {}", name, tierlist.filename);

        self.tierlists.push(tierlist);
        let index = self.tierlists.len() - 1;
        self.backup_at(index);
        Ok(index)
    }

    /// Open a tierlist, or close the current one with `None`.
    ///
    /// Closing rolls the current tierlist back to its backup; opening rolls
    /// the new one back too. Out-of-range indices close.
    pub fn set_active_tierlist(&mut self, index: Option<usize>) {
        let index = index.filter(|&i| i < self.tierlists.len());

        match index {
            None => {
                if let Some(current) = self.active {
                    self.restore_at(current);
                }
                self.active = None;
            }
            Some(i) => {
                self.active = Some(i);
                self.restore_at(i);
            }
        }
    }

    /// Append an attempt to `entity` in the open tierlist, creating the
    /// entry with zeroed counters if needed.
    ///
    /// # Errors
    ///
    /// [`WorkspaceError::NoActiveTierlist`] when nothing is open.
    pub fn insert_active_tierlist_entry(
        &mut self,
        entity: &str,
        attempt: NewAttempt,
    ) -> Result<(), WorkspaceError> {
        let tierlist = self
            .active_tierlist_mut()
            .ok_or(WorkspaceError::NoActiveTierlist)?;
        let attempt = attempt.into_metrics();

        match tierlist.entries.get_mut(entity) {
            Some(entry) => entry.attempts.push(attempt),
            None => {
                tierlist
                    .entries
                    .insert(entity.to_string(), TierlistEntry::with_attempt(attempt));
            }
        }
        Ok(())
    }

    /// Remove an entry from the open tierlist
    ///
    /// # Errors
    ///
    /// Fails when nothing is open or the entry does not exist.
    pub fn remove_active_entry(&mut self, entity: &str) -> Result<TierlistEntry, WorkspaceError> {
        let tierlist = self
            .active_tierlist_mut()
            .ok_or(WorkspaceError::NoActiveTierlist)?;
        tierlist
            .entries
            .remove(entity)
            .ok_or_else(|| WorkspaceError::UnknownEntry(entity.to_string()))
    }

    /// Remove one attempt; the entry goes too when it was the last one
    ///
    /// # Errors
    ///
    /// Fails when nothing is open, the entry does not exist or the index is
    /// out of range.
    pub fn remove_active_attempt(
        &mut self,
        entity: &str,
        index: usize,
    ) -> Result<Metrics, WorkspaceError> {
        let tierlist = self
            .active_tierlist_mut()
            .ok_or(WorkspaceError::NoActiveTierlist)?;
        let entry = tierlist
            .entries
            .get_mut(entity)
            .ok_or_else(|| WorkspaceError::UnknownEntry(entity.to_string()))?;
        if index >= entry.attempts.len() {
            return Err(WorkspaceError::UnknownAttempt {
                entity: entity.to_string(),
                index,
            });
        }

        let removed = entry.attempts.remove(index);
        if entry.attempts.is_empty() {
            tierlist.entries.remove(entity);
        }
        Ok(removed)
    }

    /// Append a tag to an entry of the open tierlist unless already present
    ///
    /// # Errors
    ///
    /// Fails when nothing is open or the entry does not exist.
    pub fn tag_active_entry(&mut self, entity: &str, tag: &str) -> Result<(), WorkspaceError> {
        let tierlist = self
            .active_tierlist_mut()
            .ok_or(WorkspaceError::NoActiveTierlist)?;
        let entry = tierlist
            .entries
            .get_mut(entity)
            .ok_or_else(|| WorkspaceError::UnknownEntry(entity.to_string()))?;
        if !entry.tags.iter().any(|t| t == tag) {
            entry.tags.push(tag.to_string());
        }
        Ok(())
    }

    // ========================================================================
    // Saving
    // ========================================================================

    /// Write the settings files and every tierlist concurrently.
    ///
    /// Each tierlist whose write succeeds gets a fresh backup, even when
    /// other writes fail.
    ///
    /// # Errors
    ///
    /// The first failure, after all writes have finished.
    pub async fn save_workspace(&mut self) -> Result<(), WorkspaceError> {
        let fs = self.fs.clone().ok_or(WorkspaceError::NotReady)?;

        let settings =
            codec::stringify_value(&self.settings).map_err(|source| WorkspaceError::Settings {
                file: SETTINGS_FILE,
                source,
            })?;
        let pokemon = codec::stringify_value(&self.pokemon_settings).map_err(|source| {
            WorkspaceError::Settings {
                file: POKEMON_FILE,
                source,
            }
        })?;
        let texts = self
            .tierlists
            .iter()
            .map(|t| Ok((t.filename.clone(), codec::stringify(t)?)))
            .collect::<Result<Vec<_>, CodecError>>()?;

        let settings_writes = join(
            fs.write_text(SETTINGS_FILE, &settings),
            fs.write_text(POKEMON_FILE, &pokemon),
        );
        let tierlist_writes = join_all(
            texts
                .iter()
                .map(|(filename, text)| fs.write_text(filename, text)),
        );
        let ((settings_result, pokemon_result), results) =
            join(settings_writes, tierlist_writes).await;

        let mut first_error = settings_result.err().or(pokemon_result.err());
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(()) => self.backup_at(index),
                Err(e) => {
                    warn!("Failed to save {}: {}", texts[index].0, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => {
                info!("Saved {} tierlist(s)", texts.len());
                Ok(())
            }
        }
    }

    // ========================================================================
    // Backups
    // ========================================================================

    /// Snapshot the entries of the tierlist stored in `filename`
    pub fn backup_tierlist_entries(&mut self, filename: &str) {
        if let Some(index) = self.tierlists.iter().position(|t| t.filename == filename) {
            self.backup_at(index);
        }
    }

    /// Put back the last snapshot for `filename`; no-op without one
    pub fn restore_tierlist_entries(&mut self, filename: &str) {
        if let Some(index) = self.tierlists.iter().position(|t| t.filename == filename) {
            self.restore_at(index);
        }
    }

    fn backup_at(&mut self, index: usize) {
        if let Some(tierlist) = self.tierlists.get(index) {
            self.backups
                .insert(tierlist.filename.clone(), tierlist.entries.clone());
        }
    }

    fn restore_at(&mut self, index: usize) {
        let Some(tierlist) = self.tierlists.get_mut(index) else {
            return;
        };
        match self.backups.get(&tierlist.filename) {
            Some(entries) => tierlist.entries = entries.clone(),
            None => debug!("No backup for {}", tierlist.filename),
        }
    }
}

impl LoadReport {
    fn skip(&mut self, filename: String, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Failed to parse tierlist {}: {}", filename, reason);
        self.skipped.push(SkippedFile { filename, reason });
    }
}

async fn read_json(
    fs: &dyn FilesystemCapability,
    file: &'static str,
) -> Result<Value, WorkspaceError> {
    let text = fs.read(file).await?;
    serde_json::from_str(&text).map_err(|source| WorkspaceError::Settings { file, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::DirEntry;
    use crate::types::MetricKey;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory capability with injectable write failures
    #[derive(Default)]
    struct MemoryFs {
        files: Mutex<BTreeMap<String, String>>,
        failing: Vec<String>,
    }

    impl MemoryFs {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: Mutex::new(
                    files
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect(),
                ),
                failing: Vec::new(),
            }
        }

        fn get(&self, name: &str) -> Option<String> {
            self.files.lock().unwrap().get(name).cloned()
        }
    }

    #[async_trait]
    impl FilesystemCapability for MemoryFs {
        fn root_name(&self) -> &str {
            "memory"
        }

        async fn read(&self, path: &str) -> Result<String, FsError> {
            self.get(path).ok_or_else(|| FsError::Io {
                path: path.into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }

        async fn write(&self, path: &str, contents: &[u8]) -> Result<(), FsError> {
            if self.failing.iter().any(|f| f == path) {
                return Err(FsError::PermissionDenied { path: path.into() });
            }
            self.files.lock().unwrap().insert(
                path.to_string(),
                String::from_utf8_lossy(contents).into_owned(),
            );
            Ok(())
        }

        async fn file_exists(&self, path: &str) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        async fn get_dir_entries(&self, _path: &str) -> Result<Vec<DirEntry>, FsError> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .keys()
                .map(|name| DirEntry {
                    name: name.clone(),
                    kind: EntryKind::File,
                })
                .collect())
        }
    }

    const A: &str = r#"{"name": "Alpha", "total": [1], "thresholds_first": {}, "thresholds_best": {},
        "entries": {"Pikachu": {"numAttempts": 1, "numFinishes": 1, "attempts": [{"finished": true, "realtime": "1:00:00.00"}]}}}"#;
    const B: &str = r#"{"name": "beta", "total": [1], "thresholds_first": {}, "thresholds_best": {}, "entries": {}}"#;

    fn workspace_files() -> Vec<(&'static str, &'static str)> {
        vec![
            (SETTINGS_FILE, "{\"theme\": \"dark\"}"),
            (POKEMON_FILE, "{}"),
            ("b.json", B),
            ("a.json", A),
            ("broken.json", "{oops"),
            ("notes.txt", "hello"),
        ]
    }

    async fn loaded(fs: MemoryFs) -> (WorkspaceStore, LoadReport, Arc<MemoryFs>) {
        let fs = Arc::new(fs);
        let mut store = WorkspaceStore::new();
        let report = store.load_workspace_with(fs.clone()).await.unwrap();
        (store, report, fs)
    }

    #[tokio::test]
    async fn test_load_skips_broken_and_sorts() {
        let (store, report, _) = loaded(MemoryFs::with(&workspace_files())).await;
        assert_eq!(store.state(), WorkspaceState::Loaded);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].filename, "broken.json");
        assert!(!report.seeded);

        let names: Vec<_> = store.tierlists().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);
        assert_eq!(store.tierlists()[0].filename, "a.json");
        assert_eq!(store.settings()["theme"], "dark");
        assert!(store.backup("a.json").is_some());
        assert_eq!(store.root_name(), Some("memory"));
    }

    #[tokio::test]
    async fn test_empty_workspace_is_seeded() {
        let (store, report, fs) = loaded(MemoryFs::default()).await;
        assert!(report.seeded);
        assert!(store.tierlists().is_empty());
        assert_eq!(fs.get(SETTINGS_FILE).as_deref(), Some("{}"));
        assert_eq!(fs.get(POKEMON_FILE).as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_missing_settings_fails() {
        let fs = Arc::new(MemoryFs::with(&[(POKEMON_FILE, "{}"), ("a.json", A)]));
        let mut store = WorkspaceStore::new();
        let err = store.load_workspace_with(fs).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::MissingFile(SETTINGS_FILE)));
        assert_eq!(
            err.to_string(),
            "Workspace is missing \"settings.json\". Select a valid workspace."
        );
        assert_eq!(store.state(), WorkspaceState::Unloaded);
    }

    #[tokio::test]
    async fn test_failed_reload_clears_previous_workspace() {
        let (mut store, _, _) = loaded(MemoryFs::with(&workspace_files())).await;
        store.set_active_tierlist(Some(0));
        assert!(store.backup("a.json").is_some());

        let other = Arc::new(MemoryFs::with(&[(POKEMON_FILE, "{}"), ("a.json", A)]));
        assert!(store.load_workspace_with(other).await.is_err());

        assert_eq!(store.state(), WorkspaceState::Unloaded);
        assert!(store.tierlists().is_empty());
        assert_eq!(store.active_index(), None);
        assert!(store.active_tierlist().is_none());
        assert!(store.backup("a.json").is_none());
        assert!(store.settings().is_null());
    }

    #[tokio::test]
    async fn test_close_without_save_restores_entries() {
        let (mut store, _, _) = loaded(MemoryFs::with(&workspace_files())).await;
        store.set_active_tierlist(Some(0));
        store.remove_active_entry("Pikachu").unwrap();
        assert!(store.active_tierlist().unwrap().entries.is_empty());

        store.set_active_tierlist(None);
        assert_eq!(store.active_index(), None);
        store.set_active_tierlist(Some(0));
        assert!(store.active_tierlist().unwrap().entries.contains_key("Pikachu"));
    }

    #[tokio::test]
    async fn test_save_then_close_keeps_entries() {
        let (mut store, _, fs) = loaded(MemoryFs::with(&workspace_files())).await;
        store.set_active_tierlist(Some(1));
        store
            .insert_active_tierlist_entry("Eevee", NewAttempt::default().with(MetricKey::RealTime, 5_000))
            .unwrap();
        store.save_workspace().await.unwrap();

        store.set_active_tierlist(None);
        store.set_active_tierlist(Some(1));
        let entry = &store.active_tierlist().unwrap().entries["Eevee"];
        assert_eq!(entry.num_attempts, 0);
        assert_eq!(entry.attempts[0].realtime, 5_000);
        assert_eq!(entry.attempts[0].gametime, -1);
        assert!(fs.get("b.json").unwrap().contains("Eevee"));
    }

    #[tokio::test]
    async fn test_insert_appends_attempts() {
        let (mut store, _, _) = loaded(MemoryFs::with(&workspace_files())).await;
        assert!(matches!(
            store.insert_active_tierlist_entry("X", NewAttempt::default()),
            Err(WorkspaceError::NoActiveTierlist)
        ));

        store.set_active_tierlist(Some(0));
        store
            .insert_active_tierlist_entry("Pikachu", NewAttempt::default().with(MetricKey::Level, 30))
            .unwrap();
        let entry = &store.active_tierlist().unwrap().entries["Pikachu"];
        assert_eq!(entry.attempts.len(), 2);
        assert_eq!(entry.attempts[0].realtime, 3_600_000);
        assert_eq!(entry.attempts[1].level, 30);
        assert_eq!(entry.num_attempts, 1);
    }

    #[tokio::test]
    async fn test_out_of_range_index_closes() {
        let (mut store, _, _) = loaded(MemoryFs::with(&workspace_files())).await;
        store.set_active_tierlist(Some(0));
        store.set_active_tierlist(Some(99));
        assert_eq!(store.active_index(), None);
        assert!(store.active_tierlist().is_none());
    }

    #[tokio::test]
    async fn test_create_tierlist() {
        let (mut store, _, fs) = loaded(MemoryFs::with(&workspace_files())).await;
        let index = store.create_tierlist("Gen 2: Crystal!").await.unwrap();
        assert_eq!(store.tierlists()[index].filename, "gen_2__crystal_.json");
        assert!(fs.get("gen_2__crystal_.json").is_some());
        assert!(store.backup("gen_2__crystal_.json").is_some());

        let err = store.create_tierlist("GEN 2: crystal?").await.unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_old_backup() {
        let mut files = MemoryFs::with(&workspace_files());
        files.failing.push("a.json".to_string());
        let (mut store, _, _) = loaded(files).await;

        store.set_active_tierlist(Some(0));
        store.remove_active_entry("Pikachu").unwrap();
        store.set_active_tierlist(Some(1));
        store
            .insert_active_tierlist_entry("Eevee", NewAttempt::default())
            .unwrap();
        // reach into the closed tierlist the way an external editor would
        store.tierlists[0].entries.clear();

        assert!(matches!(
            store.save_workspace().await,
            Err(WorkspaceError::Fs(FsError::PermissionDenied { .. }))
        ));
        assert!(store.backup("a.json").unwrap().contains_key("Pikachu"));
        assert!(store.backup("b.json").unwrap().contains_key("Eevee"));
    }

    #[tokio::test]
    async fn test_not_ready_before_load() {
        let mut store = WorkspaceStore::new();
        assert!(matches!(
            store.save_workspace().await,
            Err(WorkspaceError::NotReady)
        ));
        assert!(matches!(
            store.create_tierlist("x").await,
            Err(WorkspaceError::NotReady)
        ));
    }

    #[tokio::test]
    async fn test_remove_attempt() {
        let (mut store, _, _) = loaded(MemoryFs::with(&workspace_files())).await;
        store.set_active_tierlist(Some(0));
        assert!(matches!(
            store.remove_active_attempt("Pikachu", 3),
            Err(WorkspaceError::UnknownAttempt { index: 3, .. })
        ));
        store.remove_active_attempt("Pikachu", 0).unwrap();
        assert!(!store.active_tierlist().unwrap().entries.contains_key("Pikachu"));
        assert_eq!(store.find_tierlist("ALPHA"), Some(0));
        assert_eq!(store.find_tierlist("b.json"), Some(1));
    }
}

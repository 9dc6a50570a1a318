// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Filesystem capability
//!
//! The workspace never touches the disk directly. It goes through a
//! [`FilesystemCapability`] rooted at the workspace directory, which an
//! [`FsSelector`] hands out either for a fixed host directory or for a
//! directory chosen through a [`DirectoryPicker`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, IsTerminal};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Cache key under which the picked workspace directory is remembered
pub const PICKER_HANDLE_ID: &str = "tierlist-workspace-picker";

/// Root name reported in host mode
pub const HOST_ROOT_NAME: &str = "workspace";

const TEMP_PREFIX: &str = ".tierlist.tmp.";

/// Filesystem errors
#[derive(Debug, Error)]
pub enum FsError {
    /// No way to reach a workspace directory in this environment
    #[error("Filesystem access is not available. {hint}")]
    Unavailable {
        /// What the user can do about it
        hint: String,
    },

    /// The user dismissed the directory picker
    #[error("Directory picker was cancelled.")]
    Cancelled,

    /// The directory exists but cannot be written
    #[error("Permission denied for {}. Grant write access to the workspace directory.", path.display())]
    PermissionDenied {
        /// Offending path
        path: PathBuf,
    },

    /// Any other I/O failure
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// A relative path tried to leave the workspace root
    #[error("path {path:?} is outside the workspace")]
    OutsideRoot {
        /// Offending path
        path: String,
    },
}

impl FsError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// File name, no path
    pub name: String,
    /// Entry kind
    pub kind: EntryKind,
}

/// Access to one workspace directory.
///
/// Paths are relative to the root; `""` and `"/"` name the root itself.
#[async_trait]
pub trait FilesystemCapability: Send + Sync {
    /// Display name of the root directory
    fn root_name(&self) -> &str;

    /// Read a file as UTF-8 text
    async fn read(&self, path: &str) -> Result<String, FsError>;

    /// Replace a file's contents
    async fn write(&self, path: &str, contents: &[u8]) -> Result<(), FsError>;

    /// Replace a file's contents with text
    async fn write_text(&self, path: &str, text: &str) -> Result<(), FsError> {
        self.write(path, text.as_bytes()).await
    }

    /// Whether a regular file exists at `path`
    async fn file_exists(&self, path: &str) -> bool;

    /// List a directory
    async fn get_dir_entries(&self, path: &str) -> Result<Vec<DirEntry>, FsError>;

    /// Whether a directory has no entries
    async fn is_dir_empty(&self, path: &str) -> Result<bool, FsError> {
        Ok(self.get_dir_entries(path).await?.is_empty())
    }
}

// ============================================================================
// Directory-backed capability
// ============================================================================

/// A capability backed by a real directory
#[derive(Debug, Clone)]
pub struct DirectoryFs {
    root: PathBuf,
    root_name: String,
}

impl DirectoryFs {
    /// Root the capability at `root`
    pub fn new(root: impl Into<PathBuf>, root_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            root_name: root_name.into(),
        }
    }

    /// Root directory on disk
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let relative = Path::new(path.trim_start_matches('/'));
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(FsError::OutsideRoot {
                        path: path.to_string(),
                    })
                }
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FilesystemCapability for DirectoryFs {
    fn root_name(&self) -> &str {
        &self.root_name
    }

    async fn read(&self, path: &str) -> Result<String, FsError> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| FsError::io(&full, e))
    }

    async fn write(&self, path: &str, contents: &[u8]) -> Result<(), FsError> {
        let full = self.resolve(path)?;
        let (Some(parent), Some(file_name)) = (full.parent(), full.file_name()) else {
            return Err(FsError::Io {
                path: full.clone(),
                source: io::Error::other("path has no file name"),
            });
        };
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FsError::io(parent, e))?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let tmp_path = parent.join(format!(
            "{TEMP_PREFIX}{}.{nanos}",
            file_name.to_string_lossy()
        ));

        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|e| FsError::io(&tmp_path, e))?;

        if let Err(e) = tokio::fs::rename(&tmp_path, &full).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(FsError::io(&full, e));
        }

        debug!("Wrote {} ({} bytes)", full.display(), contents.len());
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> bool {
        let Ok(full) = self.resolve(path) else {
            return false;
        };
        tokio::fs::metadata(&full)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn get_dir_entries(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let full = self.resolve(path)?;
        let mut reader = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| FsError::io(&full, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FsError::io(&full, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| FsError::io(&entry.path(), e))?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(DirEntry { name, kind });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

// ============================================================================
// Directory picker
// ============================================================================

/// Asks the user for a workspace directory
#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    /// `Ok(None)` when the user cancels
    async fn pick(&self) -> Result<Option<PathBuf>, FsError>;
}

/// Prompts on stderr and reads a path from stdin; an empty line cancels
#[derive(Debug, Default)]
pub struct StdinPicker;

#[async_trait]
impl DirectoryPicker for StdinPicker {
    async fn pick(&self) -> Result<Option<PathBuf>, FsError> {
        if !io::stdin().is_terminal() {
            return Err(FsError::Unavailable {
                hint: "No terminal to pick a directory from; pass --workspace DIR instead."
                    .to_string(),
            });
        }

        eprint!("Workspace directory (empty to cancel): ");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| FsError::io(Path::new("<stdin>"), e))?;

        let line = line.trim();
        Ok((!line.is_empty()).then(|| PathBuf::from(line)))
    }
}

// ============================================================================
// Handle cache
// ============================================================================

/// Remembers picked directories across sessions, keyed by an opaque id
#[derive(Debug, Clone)]
pub struct HandleCache {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HandleCacheFile {
    handles: BTreeMap<String, PathBuf>,
}

impl HandleCache {
    /// Cache stored in `handles.json` under `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("handles.json"),
        }
    }

    async fn load(&self) -> HandleCacheFile {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring corrupt handle cache {}: {}", self.path.display(), e);
                HandleCacheFile::default()
            }),
            Err(_) => HandleCacheFile::default(),
        }
    }

    async fn store(&self, file: &HandleCacheFile) -> Result<(), FsError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FsError::io(parent, e))?;
        }
        let text = serde_json::to_string_pretty(file).map_err(|e| FsError::Io {
            path: self.path.clone(),
            source: io::Error::other(e),
        })?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| FsError::io(&self.path, e))
    }

    /// Cached directory for `id`, if any
    pub async fn get(&self, id: &str) -> Option<PathBuf> {
        self.load().await.handles.remove(id)
    }

    /// Remember `dir` under `id`
    ///
    /// # Errors
    ///
    /// Fails when the cache file cannot be written.
    pub async fn set(&self, id: &str, dir: &Path) -> Result<(), FsError> {
        let mut file = self.load().await;
        file.handles.insert(id.to_string(), dir.to_path_buf());
        self.store(&file).await
    }

    /// Forget `id`; returns whether it was cached
    ///
    /// # Errors
    ///
    /// Fails when the cache file cannot be written.
    pub async fn remove(&self, id: &str) -> Result<bool, FsError> {
        let mut file = self.load().await;
        let removed = file.handles.remove(id).is_some();
        if removed {
            self.store(&file).await?;
        }
        Ok(removed)
    }
}

async fn is_writable_dir(dir: &Path) -> bool {
    tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir() && !m.permissions().readonly())
        .unwrap_or(false)
}

// ============================================================================
// Selection
// ============================================================================

/// How the workspace directory is obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsMode {
    /// A fixed directory, created on demand
    Host {
        /// Workspace directory
        dir: PathBuf,
    },
    /// A directory chosen interactively and remembered in a handle cache
    Picker {
        /// Where the handle cache lives
        cache_dir: PathBuf,
    },
}

/// Hands out the workspace capability for the configured mode
pub struct FsSelector {
    mode: FsMode,
    picker: Box<dyn DirectoryPicker>,
}

impl FsSelector {
    /// Fixed host directory
    pub fn host(dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: FsMode::Host { dir: dir.into() },
            picker: Box::new(StdinPicker),
        }
    }

    /// Interactive picking with a handle cache in `cache_dir`
    pub fn picker(cache_dir: impl Into<PathBuf>, picker: Box<dyn DirectoryPicker>) -> Self {
        Self {
            mode: FsMode::Picker {
                cache_dir: cache_dir.into(),
            },
            picker,
        }
    }

    /// Configured mode
    #[must_use]
    pub fn mode(&self) -> &FsMode {
        &self.mode
    }

    /// Obtain a capability for the workspace directory.
    ///
    /// # Errors
    ///
    /// [`FsError::Cancelled`] when the picker is dismissed,
    /// [`FsError::Unavailable`] when no directory can be reached and
    /// [`FsError::PermissionDenied`] for a read-only pick.
    pub async fn acquire(&self) -> Result<Arc<dyn FilesystemCapability>, FsError> {
        match &self.mode {
            FsMode::Host { dir } => {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| FsError::io(dir, e))?;
                info!("Using workspace directory {}", dir.display());
                Ok(Arc::new(DirectoryFs::new(dir.clone(), HOST_ROOT_NAME)))
            }
            FsMode::Picker { cache_dir } => {
                let cache = HandleCache::new(cache_dir);
                if let Some(dir) = cache.get(PICKER_HANDLE_ID).await {
                    if is_writable_dir(&dir).await {
                        info!("Reusing cached workspace directory {}", dir.display());
                        return Ok(Arc::new(picked_fs(dir)));
                    }
                    warn!("Cached workspace {} is no longer usable", dir.display());
                }

                let dir = self.picker.pick().await?.ok_or(FsError::Cancelled)?;
                if !tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
                    return Err(FsError::Unavailable {
                        hint: format!("{} is not a directory.", dir.display()),
                    });
                }
                if !is_writable_dir(&dir).await {
                    return Err(FsError::PermissionDenied { path: dir });
                }

                cache.set(PICKER_HANDLE_ID, &dir).await?;
                Ok(Arc::new(picked_fs(dir)))
            }
        }
    }

    /// Whether a picked directory is remembered
    pub async fn has_cached_handle(&self) -> bool {
        match &self.mode {
            FsMode::Host { .. } => false,
            FsMode::Picker { cache_dir } => HandleCache::new(cache_dir)
                .get(PICKER_HANDLE_ID)
                .await
                .is_some(),
        }
    }

    /// Forget the remembered directory
    ///
    /// # Errors
    ///
    /// Fails when the handle cache cannot be written.
    pub async fn remove_cached_handle(&self) -> Result<bool, FsError> {
        match &self.mode {
            FsMode::Host { .. } => Ok(false),
            FsMode::Picker { cache_dir } => {
                HandleCache::new(cache_dir).remove(PICKER_HANDLE_ID).await
            }
        }
    }
}

fn picked_fs(dir: PathBuf) -> DirectoryFs {
    let name = dir
        .file_name()
        .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned());
    DirectoryFs::new(dir, name)
}

//! Load-or-build orchestration over the artifact store.
//!
//! [`ArtifactCache::resolve`] is the single entry point used by the command
//! line: it returns a stored artifact for a fingerprint when a valid one
//! exists, and otherwise runs the supplied builder and publishes its result.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sieve_common::Fingerprint;
use tracing::{debug, warn};

use crate::artifact::{self, ARTIFACT_EXT, TEMP_SUFFIX};
use crate::error::CacheError;

/// How a resolved artifact was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Loaded from the store; the builder was not called.
    Hit,
    /// Built and published to the store.
    Built,
    /// Built but not stored, because the cache is disabled or unwritable.
    BuiltUncached,
}

/// An artifact together with how it was obtained.
#[derive(Debug)]
pub struct Resolved<T> {
    /// The artifact.
    pub value: T,
    /// Whether it came from the store.
    pub outcome: Outcome,
}

/// A stored artifact, as listed by [`ArtifactCache::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The fingerprint the artifact is stored under.
    pub fingerprint: Fingerprint,
    /// File size in bytes.
    pub size: u64,
}

/// Content-addressed store of compiled artifacts, one file per fingerprint.
///
/// Storage failures never fail a run: an unreadable artifact is a miss and an
/// unwritable store degrades to building in memory, logged at `warn`.
pub struct ArtifactCache {
    /// Root directory of the store.
    root: PathBuf,

    /// When `false`, the store is never read or written.
    enabled: bool,

    /// Tool version written into and required from artifact headers.
    tool_version: String,
}

impl ArtifactCache {
    /// Creates a cache rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>, tool_version: &str) -> Self {
        Self {
            root: root.into(),
            enabled: true,
            tool_version: tool_version.to_string(),
        }
    }

    /// Creates a cache that always builds and never touches `root`.
    pub fn disabled(root: impl Into<PathBuf>, tool_version: &str) -> Self {
        Self {
            enabled: false,
            ..Self::new(root, tool_version)
        }
    }

    /// Returns the store's root directory.
    pub fn location(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if the store is consulted.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the path an artifact for `fingerprint` is stored at.
    pub fn artifact_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(format!("{fingerprint}.{ARTIFACT_EXT}"))
    }

    /// Returns the artifact for `fingerprint`, building it on a miss.
    ///
    /// On a hit `builder` is not called. On a miss `builder` runs; its error is
    /// returned unchanged and nothing is stored. A successful build is
    /// published before being returned.
    pub fn resolve<T, E, F>(&self, fingerprint: &Fingerprint, builder: F) -> Result<Resolved<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&Fingerprint) -> Result<T, E>,
    {
        if self.enabled {
            match self.load(fingerprint) {
                Ok(Some(value)) => {
                    debug!(fingerprint = %fingerprint.short(), "artifact cache hit");
                    return Ok(Resolved {
                        value,
                        outcome: Outcome::Hit,
                    });
                }
                Ok(None) => debug!(fingerprint = %fingerprint.short(), "artifact cache miss"),
                Err(e) => debug!(fingerprint = %fingerprint.short(), "discarding unusable artifact: {e}"),
            }
        }

        let value = builder(fingerprint)?;
        if !self.enabled {
            return Ok(Resolved {
                value,
                outcome: Outcome::BuiltUncached,
            });
        }

        let outcome = match self.store(fingerprint, &value) {
            Ok(()) => Outcome::Built,
            Err(e) => {
                warn!("artifact cache unavailable, continuing without it: {e}");
                Outcome::BuiltUncached
            }
        };
        Ok(Resolved { value, outcome })
    }

    /// Reads and validates a stored artifact. `Ok(None)` means no file exists.
    fn load<T: DeserializeOwned>(&self, fingerprint: &Fingerprint) -> Result<Option<T>, CacheError> {
        let path = self.artifact_path(fingerprint);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        artifact::decode(&raw, &path, &self.tool_version).map(Some)
    }

    /// Encodes and atomically publishes an artifact.
    fn store<T: Serialize>(&self, fingerprint: &Fingerprint, value: &T) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.root).map_err(|e| CacheError::Io {
            path: self.root.clone(),
            source: e,
        })?;
        let bytes = artifact::encode(value, &self.tool_version)?;
        artifact::publish(&self.artifact_path(fingerprint), &bytes)?;
        debug!(fingerprint = %fingerprint.short(), bytes = bytes.len(), "artifact stored");
        Ok(())
    }

    /// Deletes the whole store. Returns `false` if there was nothing to delete.
    ///
    /// Entries sieve did not write are removed too; each one is logged at
    /// `warn` first.
    pub fn clear(&self) -> Result<bool, CacheError> {
        if !self.root.exists() {
            return Ok(false);
        }
        for entry in self.read_root()? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_artifact = path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXT);
            let is_temp = name.starts_with('.') && name.ends_with(TEMP_SUFFIX);
            if path.is_dir() || !(is_artifact || is_temp) {
                warn!(path = %path.display(), "removing non-artifact entry from cache directory");
            }
        }
        std::fs::remove_dir_all(&self.root).map_err(|e| CacheError::Io {
            path: self.root.clone(),
            source: e,
        })?;
        debug!(root = %self.root.display(), "cache cleared");
        Ok(true)
    }

    /// Lists stored artifacts sorted by fingerprint.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in self.read_root()? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
                continue;
            }
            let Some(fingerprint) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<Fingerprint>().ok())
            else {
                continue;
            };
            let size = entry
                .metadata()
                .map_err(|e| CacheError::Io {
                    path: path.clone(),
                    source: e,
                })?
                .len();
            entries.push(CacheEntry { fingerprint, size });
        }
        entries.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
        Ok(entries)
    }

    fn read_root(&self) -> Result<Vec<std::fs::DirEntry>, CacheError> {
        let io_err = |e| CacheError::Io {
            path: self.root.clone(),
            source: e,
        };
        std::fs::read_dir(&self.root)
            .map_err(io_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)
    }
}

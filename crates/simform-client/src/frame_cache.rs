//! On-disk cache of simulation frame responses.
//!
//! One JSON file per (simulation id, model name), named by the SHA-256 of
//! the key. Each file holds the cached frames and the time it was last
//! written; entries older than the configured age are removed by
//! [`FrameCache::sweep_expired`], normally once at startup.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::api::SimulationApi;
use crate::error::{ClientError, Result};

/// Default expiry for cached frames.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

const EXTENSION: &str = "json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    simulation_id: String,
    model_name: String,
    updated: DateTime<Utc>,
    frames: BTreeMap<String, Value>,
}

/// Frame responses cached on disk.
#[derive(Debug, Clone)]
pub struct FrameCache {
    dir: PathBuf,
}

impl FrameCache {
    /// Open the cache in `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ClientError::Io {
            operation: "create directory",
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, simulation_id: &str, model_name: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(simulation_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(model_name.as_bytes());
        self.dir
            .join(hex::encode(hasher.finalize()))
            .with_extension(EXTENSION)
    }

    fn read_entry(path: &Path) -> Result<Option<CacheEntry>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ClientError::Io {
                    operation: "read",
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// A cached frame, if present.
    pub fn get(&self, simulation_id: &str, model_name: &str, frame_id: &str) -> Result<Option<Value>> {
        let entry = Self::read_entry(&self.entry_path(simulation_id, model_name))?;
        Ok(entry.and_then(|mut entry| entry.frames.remove(frame_id)))
    }

    /// Store a frame and refresh the entry's timestamp.
    pub fn put(
        &self,
        simulation_id: &str,
        model_name: &str,
        frame_id: &str,
        frame: Value,
    ) -> Result<()> {
        self.put_at(simulation_id, model_name, frame_id, frame, Utc::now())
    }

    fn put_at(
        &self,
        simulation_id: &str,
        model_name: &str,
        frame_id: &str,
        frame: Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let path = self.entry_path(simulation_id, model_name);
        let mut entry = Self::read_entry(&path)?.unwrap_or_else(|| CacheEntry {
            simulation_id: simulation_id.to_string(),
            model_name: model_name.to_string(),
            updated: now,
            frames: BTreeMap::new(),
        });
        entry.updated = now;
        entry.frames.insert(frame_id.to_string(), frame);
        write_atomic(&path, &serde_json::to_vec(&entry)?)
    }

    /// Drop every cached frame for a simulation model. Returns whether an
    /// entry existed.
    pub fn invalidate(&self, simulation_id: &str, model_name: &str) -> Result<bool> {
        let path = self.entry_path(simulation_id, model_name);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Invalidated frames for {}/{}", simulation_id, model_name);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ClientError::Io {
                operation: "remove",
                path,
                source: e,
            }),
        }
    }

    /// Remove entries not written within `max_age`. Returns how many were
    /// removed. An age reaching past the earliest representable time expires
    /// nothing but unreadable entries.
    pub fn sweep_expired(&self, max_age: Duration) -> Result<usize> {
        self.sweep_expired_at(max_age, Utc::now())
    }

    fn sweep_expired_at(&self, max_age: Duration, now: DateTime<Utc>) -> Result<usize> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| ClientError::Io {
            operation: "list",
            path: self.dir.clone(),
            source: e,
        })?;
        let cutoff = now
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut removed = 0;
        for dir_entry in read_dir.flatten() {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let expired = match Self::read_entry(&path)? {
                Some(entry) => entry.updated < cutoff,
                None => true,
            };
            if expired {
                fs::remove_file(&path).map_err(|e| ClientError::Io {
                    operation: "remove",
                    path: path.clone(),
                    source: e,
                })?;
                removed += 1;
            }
        }
        tracing::info!("Removed {} expired frame cache entries", removed);
        Ok(removed)
    }
}

/// Write through a temp file and rename so readers never see partial files.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|e| ClientError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;
    file.write_all(bytes).map_err(|e| ClientError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;
    file.sync_all().map_err(|e| ClientError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;
    fs::rename(&temp_path, path).map_err(|e| ClientError::Io {
        operation: "rename",
        path: path.to_path_buf(),
        source: e,
    })
}

/// Fetch a frame, consulting the cache first when one is given.
pub async fn fetch_frame<A: SimulationApi>(
    api: &A,
    cache: Option<&FrameCache>,
    simulation_id: &str,
    model_name: &str,
    frame_id: &str,
) -> Result<Value> {
    if let Some(cache) = cache
        && let Some(frame) = cache.get(simulation_id, model_name, frame_id)?
    {
        tracing::debug!("Frame {} served from cache", frame_id);
        return Ok(frame);
    }
    let frame = api.simulation_frame(frame_id).await?;
    if let Some(cache) = cache {
        cache.put(simulation_id, model_name, frame_id, frame.clone())?;
    }
    Ok(frame)
}

//! Version-aware snapshot download and local file cache.
//!
//! Catalog snapshots are published as gzip-compressed NDJSON next to a
//! `meta.json` carrying the snapshot version. Files are fetched lazily on
//! first access, decompressed into the cache directory, and re-fetched when
//! the published version changes.

use crate::config;
use crate::error::{CatalogError, Result};
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Downloads and caches catalog snapshot files.
pub struct SnapshotCache {
    /// Directory where cached files are stored.
    pub cache_dir: PathBuf,
    /// If true, never download (use cached or installed files only).
    pub offline: bool,
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
    remote_ver: Option<String>,
}

impl SnapshotCache {
    /// Create a new snapshot cache.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the cache directory if it does not exist.
    pub fn new(
        cache_dir: Option<PathBuf>,
        base_url: &str,
        offline: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cache_dir: dir,
            offline,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: None,
            remote_ver: None,
        })
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    fn version_file(&self) -> PathBuf {
        self.cache_dir.join("version.txt")
    }

    /// Read the locally cached snapshot version.
    pub fn local_version(&self) -> Option<String> {
        fs::read_to_string(self.version_file())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn save_version(&self, version: &str) {
        if let Err(e) = fs::write(self.version_file(), version) {
            warn!(error = %e, "failed to record snapshot version");
        }
    }

    /// Fetch the published snapshot version from `meta.json`.
    ///
    /// Returns `None` if offline or the server is unreachable. Caches the
    /// result for subsequent calls.
    pub fn remote_version(&mut self) -> Result<Option<String>> {
        if self.remote_ver.is_some() {
            return Ok(self.remote_ver.clone());
        }
        if self.offline {
            return Ok(None);
        }
        let url = format!("{}/meta.json", self.base_url);
        let client = self.client()?;
        match client.get(&url).send() {
            Ok(resp) => {
                let data: serde_json::Value = resp.error_for_status()?.json()?;
                let version = data
                    .get("version")
                    .or_else(|| data.get("data").and_then(|d| d.get("version")))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                self.remote_ver = version.clone();
                Ok(version)
            }
            Err(e) => {
                warn!(%url, error = %e, "failed to fetch snapshot version");
                Ok(None)
            }
        }
    }

    /// Check if local snapshots are out of date.
    ///
    /// Returns `true` if nothing has been cached yet or a newer version is
    /// published; `false` if up to date or the server is unreachable.
    pub fn is_stale(&mut self) -> Result<bool> {
        match self.local_version() {
            None => Ok(true),
            Some(local_ver) => match self.remote_version()? {
                None => Ok(false),
                Some(remote_ver) => Ok(local_ver != remote_ver),
            },
        }
    }

    /// Local path of the decompressed snapshot for `table`.
    pub fn snapshot_path(&self, table: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.ndjson", table))
    }

    /// Download one file into `dest`.
    ///
    /// Writes to a temp file in the cache directory first and persists it on
    /// success, so an interrupted download never leaves a partial file behind.
    fn download_file(&mut self, filename: &str, dest: &Path) -> Result<()> {
        let url = format!("{}/{}", self.base_url, filename);
        info!(%url, "downloading catalog snapshot");

        let client = self.client()?;
        let resp = client.get(&url).send()?.error_for_status()?;
        let bytes = resp.bytes()?;

        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(dest).map_err(|e| CatalogError::Io(e.error))?;
        Ok(())
    }

    /// Decompress (or copy) `src` into the cached NDJSON for `table`.
    ///
    /// A corrupt archive is removed so the next call re-downloads it.
    fn unpack(&self, src: &Path, table: &str) -> Result<PathBuf> {
        let dest = self.snapshot_path(table);
        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;

        let copied = {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let mut reader = BufReader::new(File::open(src)?);
            let result = if is_gzip(src) {
                io::copy(&mut GzDecoder::new(reader), &mut writer)
            } else {
                io::copy(&mut reader, &mut writer)
            };
            result.and_then(|n| writer.flush().map(|_| n))
        };

        match copied {
            Ok(_) => {
                tmp.persist(&dest).map_err(|e| CatalogError::Io(e.error))?;
                Ok(dest)
            }
            Err(e) => {
                warn!(path = %src.display(), error = %e, "corrupt snapshot archive, removing");
                if src.starts_with(&self.cache_dir) {
                    let _ = fs::remove_file(src);
                }
                Err(CatalogError::NotFound(format!(
                    "Snapshot '{}' was corrupt and has been removed. \
                     Retry to re-download. Original error: {}",
                    table, e
                )))
            }
        }
    }

    /// Ensure the snapshot for `table` is cached locally, downloading if needed.
    ///
    /// # Returns
    ///
    /// Local filesystem path to the decompressed NDJSON file.
    pub fn ensure_snapshot(&mut self, table: &str) -> Result<PathBuf> {
        let filename = config::snapshot_file(table).ok_or_else(|| {
            CatalogError::NotFound(format!("Unknown snapshot table: {}", table))
        })?;

        let local_path = self.snapshot_path(table);

        if local_path.exists() && !self.is_stale()? {
            return Ok(local_path);
        }
        if self.offline {
            if local_path.exists() {
                return Ok(local_path);
            }
            return Err(CatalogError::NotFound(format!(
                "Snapshot {} not cached and offline mode is enabled",
                filename
            )));
        }

        let archive = self.cache_dir.join(filename);
        self.download_file(filename, &archive)?;
        let path = self.unpack(&archive, table)?;
        let _ = fs::remove_file(&archive);

        if let Ok(Some(version)) = self.remote_version() {
            self.save_version(&version);
        }
        Ok(path)
    }

    /// Install a locally produced snapshot (plain or `.gz` NDJSON) for `table`
    /// and record `version` as current.
    pub fn install_snapshot(&self, table: &str, src: &Path, version: &str) -> Result<PathBuf> {
        if config::snapshot_file(table).is_none() {
            return Err(CatalogError::NotFound(format!(
                "Unknown snapshot table: {}",
                table
            )));
        }
        let path = self.unpack(src, table)?;
        self.save_version(version);
        Ok(path)
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Close the HTTP client, if open.
    pub fn close(&mut self) {
        self.client = None;
        self.remote_ver = None;
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

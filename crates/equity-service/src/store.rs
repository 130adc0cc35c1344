//! JSON file persistence
//!
//! Writes go to a sibling temporary file that is renamed over the target, so
//! a reader never sees a half-written document.

use crate::error::{Result, ServiceError};
use chrono::{DateTime, Local};
use equity_engine::SectorBenchmarks;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn storage_error(path: &Path, reason: impl ToString) -> ServiceError {
    ServiceError::Storage {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Read and parse `path`; `Ok(None)` when the file does not exist
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(storage_error(path, err)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| storage_error(path, e))
}

/// Serialise `value` and atomically replace `path`
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| storage_error(path, e))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| storage_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| storage_error(path, e))?;
    debug!(path = %path.display(), bytes = json.len(), "Wrote JSON file");
    Ok(())
}

/// Existence, modification time and size of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub exists: bool,
    pub path: String,
    /// `%Y-%m-%d %H:%M:%S` local time, or `Never`
    pub last_modified: String,
    /// Size in KB with one decimal
    pub size: String,
}

pub async fn file_status(path: &Path) -> FileStatus {
    let display = path.display().to_string();
    match tokio::fs::metadata(path).await {
        Ok(meta) => FileStatus {
            exists: true,
            path: display,
            last_modified: meta.modified().map_or_else(
                |_| "Unknown".to_string(),
                |t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            size: format!("{:.1} KB", meta.len() as f64 / 1024.0),
        },
        Err(_) => FileStatus {
            exists: false,
            path: display,
            last_modified: "Never".to_string(),
            size: "0 KB".to_string(),
        },
    }
}

/// Sector benchmark table on disk
#[derive(Debug, Clone)]
pub struct BenchmarkFile {
    path: PathBuf,
}

impl BenchmarkFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored table, or the built-in fallback when missing or unreadable
    pub async fn load(&self) -> SectorBenchmarks {
        match read_json::<SectorBenchmarks>(&self.path).await {
            Ok(Some(table)) => {
                info!(path = %self.path.display(), sectors = table.len(), "Loaded sector benchmarks");
                table
            },
            Ok(None) => {
                info!(path = %self.path.display(), "Benchmarks file not found, using fallback benchmarks");
                SectorBenchmarks::fallback()
            },
            Err(err) => {
                warn!(error = %err, "Error loading sector benchmarks, using fallback benchmarks");
                SectorBenchmarks::fallback()
            },
        }
    }

    pub async fn save(&self, table: &SectorBenchmarks) -> Result<()> {
        write_json(&self.path, table).await?;
        info!(path = %self.path.display(), "Sector benchmarks saved");
        Ok(())
    }

    pub async fn status(&self) -> FileStatus {
        file_status(&self.path).await
    }
}

//! Date-sharded record files.
//!
//! # Layout
//! ```text
//! <root>/<YYYY>/<MM>/<DD>/<HH-MM-SS-ffffff>_<8 hex>.json
//! ```
//!
//! # Design Decisions
//! - Every key component is zero-padded, so lexicographic order of keys is
//!   chronological order; listing needs no index
//! - The random suffix separates records created in the same microsecond
//! - Files are written under a dot-prefixed temp name and renamed into
//!   place; readers never see a partial record

use chrono::{DateTime, Local};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::recorder::record::TransactionRecord;

const RECORD_EXTENSION: &str = "json";

/// Errors from persisting or reading records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to serialize transaction record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed record {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Relative key (path under the root) for a record created at `timestamp`.
pub fn record_key(timestamp: &DateTime<Local>) -> PathBuf {
    let id = Uuid::new_v4().simple().to_string();
    let file_name = format!(
        "{}_{}.{}",
        timestamp.format("%H-%M-%S-%6f"),
        &id[..8],
        RECORD_EXTENSION
    );
    PathBuf::from(timestamp.format("%Y").to_string())
        .join(timestamp.format("%m").to_string())
        .join(timestamp.format("%d").to_string())
        .join(file_name)
}

/// One slot on a listing page.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PageEntry {
    Record {
        key: PathBuf,
        record: TransactionRecord,
    },
    Unreadable {
        key: PathBuf,
        error: String,
    },
}

/// A page of records, newest first.
#[derive(Debug, Serialize)]
pub struct RecordPage {
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub entries: Vec<PageEntry>,
}

/// Root of the record tree.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one record, returning its full path.
    pub async fn write(&self, record: &TransactionRecord) -> Result<PathBuf, RecordError> {
        let path = self.root.join(record_key(&record.timestamp));
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();

        // create_dir_all treats a concurrent "already exists" as success
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| RecordError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        let content = serde_json::to_vec_pretty(record)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = dir.join(format!(".{}.tmp", file_name));

        if let Err(source) = tokio::fs::write(&tmp, &content).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(RecordError::Write { path: tmp, source });
        }
        if let Err(source) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(RecordError::Write { path, source });
        }
        Ok(path)
    }

    /// Read a record back. `path` may be absolute or a key under the root.
    pub async fn read(&self, path: &Path) -> Result<TransactionRecord, RecordError> {
        let path = self.root.join(path);
        let content = tokio::fs::read(&path)
            .await
            .map_err(|source| RecordError::Read {
                path: path.clone(),
                source,
            })?;
        serde_json::from_slice(&content).map_err(|source| RecordError::Parse { path, source })
    }

    /// All record keys, newest first. A missing root is an empty store.
    pub async fn list_keys(&self) -> Result<Vec<PathBuf>, RecordError> {
        let mut keys = Vec::new();
        let mut pending = vec![PathBuf::new()];

        while let Some(relative) = pending.pop() {
            let dir = self.root.join(&relative);
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(RecordError::Read { path: dir, source }),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|source| RecordError::Read {
                    path: dir.clone(),
                    source,
                })?
            {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with('.') {
                    continue;
                }
                let file_type = entry.file_type().await.map_err(|source| RecordError::Read {
                    path: entry.path(),
                    source,
                })?;
                let key = relative.join(&*name);
                if file_type.is_dir() {
                    pending.push(key);
                } else if key.extension().is_some_and(|ext| ext == RECORD_EXTENSION) {
                    keys.push(key);
                }
            }
        }

        keys.sort_unstable_by(|a, b| b.cmp(a));
        Ok(keys)
    }

    /// Load one page (1-based) of records, newest first.
    pub async fn page(&self, page: usize, per_page: usize) -> Result<RecordPage, RecordError> {
        let per_page = per_page.max(1);
        let keys = self.list_keys().await?;
        let total_records = keys.len();
        let total_pages = total_records.div_ceil(per_page);
        let page = page.max(1);

        let mut entries = Vec::new();
        for key in keys.into_iter().skip((page - 1) * per_page).take(per_page) {
            let entry = match self.read(&key).await {
                Ok(record) => PageEntry::Record { key, record },
                Err(e) => PageEntry::Unreadable {
                    key,
                    error: e.to_string(),
                },
            };
            entries.push(entry);
        }

        Ok(RecordPage {
            page,
            total_pages,
            total_records,
            entries,
        })
    }
}

//! Filesystem partition store.
//!
//! Each entry is one file holding a metadata line followed by the body:
//!
//! ```text
//! {"key":"GET https://…","status":200,"headers":{…},"stored_at":"…"}\n
//! <body bytes>
//! ```
//!
//! Every write goes to its own uniquely named temp file and is renamed into
//! place, so concurrent writers of one key never share a temp path and a
//! reader always sees one complete entry (last writer wins).

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CacheError, CacheResult};
use crate::types::Response;

use super::PartitionStore;

const ENTRY_EXTENSION: &str = "entry";

/// Metadata line at the top of an entry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    stored_at: DateTime<Utc>,
}

/// Partitions stored as directories under a root.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Store rooted at the default location.
    ///
    /// Default: `{user cache dir}/swcache/partitions`
    pub fn new() -> CacheResult<Self> {
        let base = dirs::cache_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| CacheError::cache("could not determine cache directory"))?;
        Ok(Self::with_dir(base.join("swcache").join("partitions")))
    }

    /// Store rooted at a custom directory.
    pub fn with_dir(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, partition: &str) -> CacheResult<PathBuf> {
        if partition.is_empty()
            || partition.contains(['/', '\\'])
            || partition == "."
            || partition == ".."
        {
            return Err(CacheError::cache(format!(
                "invalid partition name: {:?}",
                partition
            )));
        }
        Ok(self.root.join(partition))
    }

    fn entry_path(&self, partition: &str, key: &str) -> CacheResult<PathBuf> {
        Ok(self
            .partition_dir(partition)?
            .join(format!("{}.{}", entry_file_stem(key), ENTRY_EXTENSION)))
    }

    /// Metadata of an entry file without reading its body.
    async fn read_meta(path: &Path) -> CacheResult<EntryMeta> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| CacheError::cache(format!("failed to open entry: {}", e)))?;
        let mut line = Vec::new();
        BufReader::new(file)
            .read_until(b'\n', &mut line)
            .await
            .map_err(|e| CacheError::cache(format!("failed to read entry metadata: {}", e)))?;
        parse_meta(&line)
    }
}

fn entry_file_stem(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

fn parse_meta(line: &[u8]) -> CacheResult<EntryMeta> {
    serde_json::from_slice(line)
        .map_err(|e| CacheError::cache(format!("failed to parse entry metadata: {}", e)))
}

fn encode_entry(meta: &EntryMeta, body: &[u8]) -> CacheResult<Vec<u8>> {
    // Compact JSON escapes newlines, so the first `\n` ends the metadata.
    let mut content = serde_json::to_vec(meta)
        .map_err(|e| CacheError::cache(format!("failed to serialize metadata: {}", e)))?;
    content.reserve(body.len() + 1);
    content.push(b'\n');
    content.extend_from_slice(body);
    Ok(content)
}

fn decode_entry(content: &[u8]) -> CacheResult<(EntryMeta, Bytes)> {
    let split = content
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| CacheError::cache("truncated entry: missing metadata line"))?;
    let meta = parse_meta(&content[..split])?;
    Ok((meta, Bytes::copy_from_slice(&content[split + 1..])))
}

/// Write `content` to a temp file unique to this call, then rename it over
/// `path`.
async fn write_atomic(path: &Path, content: &[u8]) -> CacheResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    fs::write(&temp_path, content)
        .await
        .map_err(|e| CacheError::cache(format!("failed to write temp file: {}", e)))?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(CacheError::cache(format!("failed to rename temp file: {}", e)));
    }

    Ok(())
}

#[async_trait]
impl PartitionStore for DiskStore {
    async fn open(&self, partition: &str) -> CacheResult<()> {
        let dir = self.partition_dir(partition)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::cache(format!("failed to create partition: {}", e)))
    }

    async fn lookup(&self, partition: &str, key: &str) -> CacheResult<Option<Response>> {
        let path = self.entry_path(partition, key)?;
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::cache(format!("failed to read entry: {}", e))),
        };

        let (meta, body) = decode_entry(&content)?;
        if meta.key != key {
            // Hash collision or a foreign file; treat as a miss.
            warn!(partition, key, stored = %meta.key, "entry key mismatch");
            return Ok(None);
        }

        Ok(Some(Response {
            status: meta.status,
            headers: meta.headers,
            body,
        }))
    }

    async fn put(&self, partition: &str, key: &str, response: &Response) -> CacheResult<()> {
        let path = self.entry_path(partition, key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| CacheError::cache(format!("failed to create partition: {}", e)))?;
        }

        let meta = EntryMeta {
            key: key.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            stored_at: Utc::now(),
        };
        write_atomic(&path, &encode_entry(&meta, &response.body)?).await
    }

    async fn keys(&self, partition: &str) -> CacheResult<Vec<String>> {
        let dir = self.partition_dir(partition)?;
        let mut keys = Vec::new();
        if !dir.exists() {
            return Ok(keys);
        }

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| CacheError::cache(format!("failed to read partition: {}", e)))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::cache(format!("failed to read directory entry: {}", e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match Self::read_meta(&path).await {
                Ok(meta) => keys.push(meta.key),
                Err(e) => warn!(partition, error = %e, "skipping unreadable entry"),
            }
        }

        Ok(keys)
    }

    async fn partition_names(&self) -> CacheResult<Vec<String>> {
        let mut names = Vec::new();
        if !self.root.exists() {
            return Ok(names);
        }

        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| CacheError::cache(format!("failed to read store root: {}", e)))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::cache(format!("failed to read directory entry: {}", e)))?
        {
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        Ok(names)
    }

    async fn delete(&self, partition: &str) -> CacheResult<bool> {
        let dir = self.partition_dir(partition)?;
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| CacheError::cache(format!("failed to delete partition: {}", e)))?;
        debug!(partition, "deleted partition");
        Ok(true)
    }
}

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;

use crate::model::coord::ChunkCoord;
use crate::storage::{ChunkRecord, SpatialStore, StoreError};

/// Disk-backed store: one JSON file per chunk under `root`, named after the
/// `"{x},{y}"` storage key. Writes go through a temp file and a rename so a
/// crash mid-save never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chunk_path(&self, coord: ChunkCoord) -> PathBuf {
        self.root.join(format!("{}.json", coord.storage_key()))
    }
}

impl SpatialStore for FileStore {
    async fn load_chunk(&self, coord: ChunkCoord) -> Result<Option<ChunkRecord>, StoreError> {
        let path = self.chunk_path(coord);
        let buf = match fs::read(&path).await {
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&buf)?))
    }

    async fn save_chunk(&self, record: &ChunkRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).await?;
        let path = self.chunk_path(record.coord);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(record)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn has_chunk(&self, coord: ChunkCoord) -> Result<bool, StoreError> {
        match fs::metadata(self.chunk_path(coord)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_chunk(&self, coord: ChunkCoord) -> Result<bool, StoreError> {
        match fs::remove_file(self.chunk_path(coord)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_all_chunks(&self) -> Result<Vec<ChunkRecord>, StoreError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // A single unreadable file should not hide the rest of the grid.
            match fs::read(&path).await {
                Ok(buf) => match serde_json::from_slice::<ChunkRecord>(&buf) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("skipping corrupt chunk record {:?}: {e}", path),
                },
                Err(e) => warn!("skipping unreadable chunk record {:?}: {e}", path),
            }
        }
        records.sort_by_key(|r| r.coord);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::chunk::ChunkId;

    fn record(x: i64, y: i64) -> ChunkRecord {
        ChunkRecord {
            coord: ChunkCoord::new(x, y),
            id: ChunkId::new(format!("chunk-{x}-{y}")),
            panes: Vec::new(),
            dimensions: Some((1920, 1080)),
            loaded: false,
            last_accessed_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let rec = record(-2, 7);

        store.save_chunk(&rec).await.unwrap();
        let loaded = store.load_chunk(rec.coord).await.unwrap().unwrap();
        assert_eq!(loaded, rec);

        // File name carries the storage key.
        assert!(dir.path().join("-2,7.json").is_file());
    }

    #[tokio::test]
    async fn test_missing_chunk_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load_chunk(ChunkCoord::new(9, 9)).await.unwrap().is_none());
        assert!(!store.has_chunk(ChunkCoord::new(9, 9)).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save_chunk(&record(0, 0)).await.unwrap();
        assert!(store.delete_chunk(ChunkCoord::new(0, 0)).await.unwrap());
        assert!(!store.delete_chunk(ChunkCoord::new(0, 0)).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_all_skips_corrupt_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save_chunk(&record(1, 0)).await.unwrap();
        store.save_chunk(&record(0, 1)).await.unwrap();
        std::fs::write(dir.path().join("2,2.json"), b"not json").unwrap();

        let records = store.list_all_chunks().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_list_all_on_missing_root() {
        let store = FileStore::new("/nonexistent/panegrid-test-root");
        assert!(store.list_all_chunks().await.unwrap().is_empty());
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::coord::ChunkCoord;
use crate::storage::{ChunkRecord, SpatialStore, StoreError};

/// In-memory store keyed by the `"{x},{y}"` storage key. Cheap to clone;
/// clones share the same map. Used as the default backend in tests and for
/// ephemeral sessions.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    chunks: Arc<Mutex<HashMap<String, ChunkRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.lock().is_empty()
    }
}

impl SpatialStore for MemoryStore {
    async fn load_chunk(&self, coord: ChunkCoord) -> Result<Option<ChunkRecord>, StoreError> {
        Ok(self.chunks.lock().get(&coord.storage_key()).cloned())
    }

    async fn save_chunk(&self, record: &ChunkRecord) -> Result<(), StoreError> {
        self.chunks.lock().insert(record.coord.storage_key(), record.clone());
        Ok(())
    }

    async fn has_chunk(&self, coord: ChunkCoord) -> Result<bool, StoreError> {
        Ok(self.chunks.lock().contains_key(&coord.storage_key()))
    }

    async fn delete_chunk(&self, coord: ChunkCoord) -> Result<bool, StoreError> {
        Ok(self.chunks.lock().remove(&coord.storage_key()).is_some())
    }

    async fn list_all_chunks(&self) -> Result<Vec<ChunkRecord>, StoreError> {
        let mut records: Vec<ChunkRecord> = self.chunks.lock().values().cloned().collect();
        records.sort_by_key(|r| r.coord);
        Ok(records)
    }
}

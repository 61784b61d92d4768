use serde::{Deserialize, Serialize};

use crate::model::chunk::{Chunk, ChunkId, Pane};
use crate::model::coord::ChunkCoord;

pub mod fs;
pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt chunk record: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage backend: {0}")]
    Backend(String),
}

/// Durable representation of a chunk, as exchanged with a storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub coord: ChunkCoord,
    pub id: ChunkId,
    pub panes: Vec<Pane>,
    #[serde(default)]
    pub dimensions: Option<(u32, u32)>,
    pub loaded: bool,
    pub last_accessed_ms: u64,
}

impl ChunkRecord {
    /// Snapshot of an in-memory chunk. `loaded` records whether the chunk
    /// is still materialized (write-through) or being evicted.
    pub fn snapshot(chunk: &Chunk, loaded: bool) -> Self {
        Self {
            coord: chunk.coord,
            id: chunk.id.clone(),
            panes: chunk.pane_list(),
            dimensions: chunk.dimensions,
            loaded,
            last_accessed_ms: chunk.last_accessed_ms,
        }
    }
}

/// Key/value store keyed by chunk coordinate. The key for any concrete
/// backend is [`ChunkCoord::storage_key`], i.e. `"{x},{y}"`.
///
/// The manager is generic over this trait; implementations are injected at
/// construction. No retry or timeout policy lives here; failures surface
/// to the caller as [`StoreError`].
pub trait SpatialStore {
    fn load_chunk(
        &self,
        coord: ChunkCoord,
    ) -> impl Future<Output = Result<Option<ChunkRecord>, StoreError>> + Send;

    fn save_chunk(
        &self,
        record: &ChunkRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn has_chunk(&self, coord: ChunkCoord) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Returns whether a record existed.
    fn delete_chunk(
        &self,
        coord: ChunkCoord,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn list_all_chunks(&self)
    -> impl Future<Output = Result<Vec<ChunkRecord>, StoreError>> + Send;
}

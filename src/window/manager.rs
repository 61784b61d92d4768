use std::collections::{BTreeMap, BTreeSet, HashMap};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};

use crate::model::chunk::{Chunk, ChunkId, Pane, PaneId, now_ms};
use crate::model::coord::ChunkCoord;
use crate::storage::{ChunkRecord, SpatialStore, StoreError};
use crate::window::spiral::SpiralIter;

/// Outcome of a [`ChunkWindowManager::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The coordinate was already materialized; nothing was fetched.
    AlreadyLoaded,
    /// A persisted chunk existed and was rehydrated with its stored
    /// identifier and panes.
    Restored,
    /// No persisted chunk existed; a fresh identifier was fabricated.
    Created,
}

/// Lifecycle notifications for the UI layer. The core data types stay
/// plain; any reactivity is built on top of these events by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Loaded(ChunkCoord),
    Unloaded(ChunkCoord),
    Persisted(ChunkCoord),
}

/// Summary of one `request_window` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSync {
    pub loaded: Vec<ChunkCoord>,
    pub unloaded: Vec<ChunkCoord>,
    /// Coordinates whose load or unload hit a storage failure. Failures are
    /// logged and skipped; the affected chunk keeps its previous state.
    pub failures: Vec<ChunkCoord>,
}

/// Owns the set of materialized chunks and keeps it synchronized with the
/// viewport. The storage backend is injected at construction; there is no
/// ambient or global state.
///
/// All mutating operations take `&mut self`, so two operations on the same
/// coordinate can never interleave mid-transition. Persistence during
/// `unload` is awaited before the in-memory entry is discarded, so an
/// eviction never loses unsaved pane mutations. `persist_chunk` performs no
/// debouncing; callers coalescing rapid drag/resize mutations should
/// debounce at the call site (around 100ms works well).
pub struct ChunkWindowManager<S> {
    store: S,
    loaded: HashMap<ChunkCoord, Chunk>,
    /// Loaded coordinates indexed by column, for the per-axis eviction scan.
    columns: BTreeMap<i64, BTreeSet<i64>>,
    events: Option<UnboundedSender<WindowEvent>>,
    next_chunk_seq: u64,
}

impl<S: SpatialStore> ChunkWindowManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            loaded: HashMap::new(),
            columns: BTreeMap::new(),
            events: None,
            next_chunk_seq: 0,
        }
    }

    pub fn with_events(store: S, events: UnboundedSender<WindowEvent>) -> Self {
        Self { events: Some(events), ..Self::new(store) }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.loaded.contains_key(&coord)
    }

    #[inline]
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn loaded_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.loaded.keys().copied()
    }

    #[inline]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.loaded.get(&coord)
    }

    pub fn pane(&self, coord: ChunkCoord, id: &PaneId) -> Option<&Pane> {
        self.loaded.get(&coord).and_then(|chunk| chunk.pane(id))
    }

    /// Mutable access to a loaded pane, for drag/resize updates. Callers
    /// are expected to follow mutations with a (debounced) `persist_chunk`.
    pub fn pane_mut(&mut self, coord: ChunkCoord, id: &PaneId) -> Option<&mut Pane> {
        self.loaded.get_mut(&coord).and_then(|chunk| chunk.pane_mut(id))
    }

    /// Synchronizes the loaded set to exactly the chunks within Chebyshev
    /// distance `render_distance` of `origin`: loads missing in-window
    /// chunks innermost first, then unloads everything outside the window.
    /// Idempotent, and never fails: per-coordinate storage errors are
    /// logged and reported in the returned summary.
    pub async fn request_window(
        &mut self,
        origin: ChunkCoord,
        render_distance: u64,
    ) -> WindowSync {
        let mut sync = WindowSync::default();

        for (dx, dy) in SpiralIter::new(render_distance) {
            let coord = origin.offset(dx, dy);
            if self.is_loaded(coord) {
                continue;
            }
            match self.load(coord).await {
                Ok(_) => sync.loaded.push(coord),
                Err(e) => {
                    error!("window sync: failed to load chunk {coord}: {e}");
                    sync.failures.push(coord);
                }
            }
        }

        for coord in self.out_of_window(origin, render_distance) {
            match self.unload(coord).await {
                Ok(_) => sync.unloaded.push(coord),
                Err(e) => {
                    error!("window sync: failed to unload chunk {coord}: {e}");
                    sync.failures.push(coord);
                }
            }
        }

        sync
    }

    /// Two-phase eviction scan over the column index: columns whose x
    /// distance exceeds the render distance are taken wholesale, remaining
    /// columns contribute only entries out of range on the y axis. The
    /// union is exactly the loaded chunks with Chebyshev distance greater
    /// than `render_distance` from `origin`.
    fn out_of_window(&self, origin: ChunkCoord, render_distance: u64) -> Vec<ChunkCoord> {
        let mut out = Vec::new();
        for (&x, ys) in &self.columns {
            if x.abs_diff(origin.x) > render_distance {
                out.extend(ys.iter().map(|&y| ChunkCoord::new(x, y)));
            } else {
                out.extend(
                    ys.iter()
                        .filter(|&&y| y.abs_diff(origin.y) > render_distance)
                        .map(|&y| ChunkCoord::new(x, y)),
                );
            }
        }
        out
    }

    /// Materializes the chunk at `coord`: adopts the persisted identifier
    /// and panes when a record exists, otherwise fabricates a fresh
    /// identifier. Already-loaded coordinates are left untouched. A storage
    /// failure aborts the whole load with no partial adoption; an invalid
    /// individual pane record is logged and skipped.
    pub async fn load(&mut self, coord: ChunkCoord) -> Result<LoadOutcome, StoreError> {
        if self.is_loaded(coord) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let (mut chunk, outcome) = match self.store.load_chunk(coord).await? {
            Some(record) => {
                let mut chunk = Chunk::new(coord, record.id);
                chunk.dimensions = record.dimensions;
                for pane in record.panes {
                    if pane.chunk_coords != coord {
                        warn!(
                            "skipping pane {} in chunk {coord}: owner recorded as {}",
                            pane.id.as_str(),
                            pane.chunk_coords
                        );
                        continue;
                    }
                    if let Some(previous) = chunk.insert_pane(pane) {
                        warn!(
                            "duplicate pane {} in persisted chunk {coord}",
                            previous.id.as_str()
                        );
                    }
                }
                (chunk, LoadOutcome::Restored)
            }
            None => (Chunk::new(coord, self.fabricate_chunk_id()), LoadOutcome::Created),
        };

        chunk.loaded = true;
        chunk.touch();
        debug!("loaded chunk {coord} ({outcome:?}, {} panes)", chunk.pane_count());
        self.insert_loaded(chunk);
        self.emit(WindowEvent::Loaded(coord));
        Ok(outcome)
    }

    /// Persists a snapshot of the chunk (marked unloaded) and discards the
    /// in-memory entry. Returns false if the coordinate was not loaded. The
    /// entry is only discarded after the save succeeds; on failure the
    /// chunk stays loaded and untouched.
    pub async fn unload(&mut self, coord: ChunkCoord) -> Result<bool, StoreError> {
        let Some(chunk) = self.loaded.get(&coord) else {
            return Ok(false);
        };

        let record = ChunkRecord::snapshot(chunk, false);
        self.store.save_chunk(&record).await?;

        self.remove_loaded(coord);
        debug!("unloaded chunk {coord} ({} panes persisted)", record.panes.len());
        self.emit(WindowEvent::Unloaded(coord));
        Ok(true)
    }

    /// Adds a pane to a loaded chunk and persists it write-through. A no-op
    /// returning false when the chunk is not loaded; the chunk is never
    /// created implicitly. On a persistence failure the pane set is rolled
    /// back to its prior state.
    pub async fn mount_pane(
        &mut self,
        coord: ChunkCoord,
        mut pane: Pane,
    ) -> Result<bool, StoreError> {
        let Some(chunk) = self.loaded.get_mut(&coord) else {
            debug!("mount_pane {}: chunk {coord} not loaded", pane.id.as_str());
            return Ok(false);
        };

        pane.chunk_coords = coord;
        let pane_id = pane.id.clone();
        let previous = chunk.insert_pane(pane);
        chunk.touch();

        if let Err(e) = self.persist_loaded(coord).await {
            if let Some(chunk) = self.loaded.get_mut(&coord) {
                match previous {
                    Some(previous) => {
                        chunk.insert_pane(previous);
                    }
                    None => {
                        chunk.remove_pane(&pane_id);
                    }
                }
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Removes a pane from a loaded chunk and persists it write-through.
    /// A no-op returning false when the chunk is not loaded or the pane is
    /// absent. On a persistence failure the pane is restored.
    pub async fn unmount_pane(
        &mut self,
        pane_id: &PaneId,
        coord: ChunkCoord,
    ) -> Result<bool, StoreError> {
        let Some(chunk) = self.loaded.get_mut(&coord) else {
            debug!("unmount_pane {}: chunk {coord} not loaded", pane_id.as_str());
            return Ok(false);
        };

        let Some(removed) = chunk.remove_pane(pane_id) else {
            return Ok(false);
        };
        chunk.touch();

        if let Err(e) = self.persist_loaded(coord).await {
            if let Some(chunk) = self.loaded.get_mut(&coord) {
                chunk.insert_pane(removed);
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Explicit write-through of a loaded chunk's current state, used after
    /// pane mutations such as drag or resize. Returns false if the chunk is
    /// not loaded.
    pub async fn persist_chunk(&mut self, coord: ChunkCoord) -> Result<bool, StoreError> {
        if !self.is_loaded(coord) {
            return Ok(false);
        }
        self.persist_loaded(coord).await?;
        Ok(true)
    }

    async fn persist_loaded(&self, coord: ChunkCoord) -> Result<(), StoreError> {
        let Some(chunk) = self.loaded.get(&coord) else {
            return Ok(());
        };
        let record = ChunkRecord::snapshot(chunk, true);
        self.store.save_chunk(&record).await?;
        self.emit(WindowEvent::Persisted(coord));
        Ok(())
    }

    fn fabricate_chunk_id(&mut self) -> ChunkId {
        let seq = self.next_chunk_seq;
        self.next_chunk_seq += 1;
        ChunkId::new(format!("chunk-{:x}-{:04x}", now_ms(), seq))
    }

    fn insert_loaded(&mut self, chunk: Chunk) {
        let coord = chunk.coord;
        self.columns.entry(coord.x).or_default().insert(coord.y);
        self.loaded.insert(coord, chunk);
    }

    fn remove_loaded(&mut self, coord: ChunkCoord) {
        self.loaded.remove(&coord);
        if let Some(ys) = self.columns.get_mut(&coord.x) {
            ys.remove(&coord.y);
            if ys.is_empty() {
                self.columns.remove(&coord.x);
            }
        }
    }

    fn emit(&self, event: WindowEvent) {
        if let Some(events) = &self.events {
            // The receiver may be gone; lifecycle notifications are
            // best-effort.
            let _ = events.send(event);
        }
    }
}

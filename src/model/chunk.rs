use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::coord::ChunkCoord;

/// Globally unique pane identifier. Assigned by the UI layer on mount;
/// uniqueness across the whole canvas is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneId(pub String);

impl PaneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stable chunk identifier: assigned once when a coordinate is first
/// materialized, persisted, and never regenerated for that coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub String);

impl ChunkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// One content item inside a chunk. Plain data: position and size are in
/// chunk-local units, the payload is opaque to the core. A pane belongs to
/// exactly one chunk at a time and `chunk_coords` must equal that chunk's
/// coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pane {
    pub id: PaneId,
    pub kind: String,
    #[serde(default)]
    pub content: Value,
    pub chunk_coords: ChunkCoord,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub color: Rgba,
}

/// One cell of the infinite canvas grid while it is materialized in memory.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub id: ChunkId,
    panes: HashMap<PaneId, Pane>,
    pub dimensions: Option<(u32, u32)>,
    pub loaded: bool,
    pub last_accessed_ms: u64,
}

impl Chunk {
    pub fn new(coord: ChunkCoord, id: ChunkId) -> Self {
        Self {
            coord,
            id,
            panes: HashMap::new(),
            dimensions: None,
            loaded: false,
            last_accessed_ms: now_ms(),
        }
    }

    #[inline]
    pub fn contains_pane(&self, id: &PaneId) -> bool {
        self.panes.contains_key(id)
    }

    #[inline]
    pub fn pane(&self, id: &PaneId) -> Option<&Pane> {
        self.panes.get(id)
    }

    #[inline]
    pub fn pane_mut(&mut self, id: &PaneId) -> Option<&mut Pane> {
        self.panes.get_mut(id)
    }

    #[inline]
    pub fn panes(&self) -> impl Iterator<Item = &Pane> {
        self.panes.values()
    }

    #[inline]
    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    /// Inserts or replaces a pane, keying by its identifier. Returns the
    /// previous pane with that identifier, if any.
    pub fn insert_pane(&mut self, pane: Pane) -> Option<Pane> {
        self.panes.insert(pane.id.clone(), pane)
    }

    pub fn remove_pane(&mut self, id: &PaneId) -> Option<Pane> {
        self.panes.remove(id)
    }

    /// Snapshot of the pane set, in no particular order.
    pub fn pane_list(&self) -> Vec<Pane> {
        self.panes.values().cloned().collect()
    }

    pub fn touch(&mut self) {
        self.last_accessed_ms = now_ms();
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane(id: &str, coord: ChunkCoord) -> Pane {
        Pane {
            id: PaneId::new(id),
            kind: "note".to_string(),
            content: Value::Null,
            chunk_coords: coord,
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 200.0,
            tag: String::new(),
            color: Rgba::default(),
        }
    }

    #[test]
    fn test_insert_and_remove_pane() {
        let coord = ChunkCoord::new(0, 0);
        let mut chunk = Chunk::new(coord, ChunkId::new("c-1"));

        assert!(chunk.insert_pane(pane("p-1", coord)).is_none());
        assert!(chunk.contains_pane(&PaneId::new("p-1")));
        assert_eq!(chunk.pane_count(), 1);

        let removed = chunk.remove_pane(&PaneId::new("p-1")).unwrap();
        assert_eq!(removed.id, PaneId::new("p-1"));
        assert_eq!(chunk.pane_count(), 0);
    }

    #[test]
    fn test_insert_pane_replaces_by_id() {
        let coord = ChunkCoord::new(2, -3);
        let mut chunk = Chunk::new(coord, ChunkId::new("c-1"));

        chunk.insert_pane(pane("p-1", coord));
        let mut updated = pane("p-1", coord);
        updated.x = 42.0;

        let previous = chunk.insert_pane(updated).unwrap();
        assert_eq!(previous.x, 0.0);
        assert_eq!(chunk.pane_count(), 1);
        assert_eq!(chunk.pane(&PaneId::new("p-1")).unwrap().x, 42.0);
    }

    #[test]
    fn test_pane_serde_round_trip() {
        let coord = ChunkCoord::new(-7, 9);
        let mut source = pane("p-9", coord);
        source.content = serde_json::json!({ "url": "https://example.com" });
        source.color = Rgba::new(10, 20, 30, 255);
        source.tag = "research".to_string();

        let encoded = serde_json::to_string(&source).unwrap();
        let decoded: Pane = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn test_pane_serde_defaults_optional_fields() {
        let raw = r#"{
            "id": "p-1",
            "kind": "note",
            "chunk_coords": { "x": 1, "y": 2 },
            "x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0
        }"#;
        let decoded: Pane = serde_json::from_str(raw).unwrap();
        assert_eq!(decoded.content, Value::Null);
        assert_eq!(decoded.tag, "");
        assert_eq!(decoded.color, Rgba::default());
    }
}

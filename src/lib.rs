pub mod common;
pub mod model;
pub mod packer;
pub mod storage;
pub mod window;

pub use model::coord::ChunkCoord;
pub use packer::{PackOptions, PackResult, Placement, Size, pack};
pub use storage::{ChunkRecord, SpatialStore, StoreError};
pub use window::manager::{ChunkWindowManager, LoadOutcome, WindowEvent, WindowSync};

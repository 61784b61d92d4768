pub mod manager;
pub mod spiral;

pub use manager::{ChunkWindowManager, LoadOutcome, WindowEvent, WindowSync};
pub use spiral::SpiralIter;

pub mod chunk;
pub mod coord;

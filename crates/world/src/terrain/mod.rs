mod grid;
mod kind;

pub use grid::{TerrainGrid, TerrainGridError, FALLBACK_START, START_METADATA_KEY};
pub use kind::TerrainKind;

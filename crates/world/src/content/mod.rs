mod atlas;
mod builder;
mod discovery;
mod error;
mod tile;

pub use atlas::MapAtlas;
pub use builder::{MapBuilder, MapDiagnostic, MAX_MAP_CELLS};
pub use discovery::{discover_tiles, ResourceBundle, TileSource};
pub use error::MapBuildError;
pub use tile::{match_tile_name, parse_tile, parse_tile_body, Tile, TileBody, UnknownGlyph, TILE_EXTENSION};

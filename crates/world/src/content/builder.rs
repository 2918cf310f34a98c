use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::coord::Coordinate;
use crate::terrain::{TerrainGrid, TerrainGridError, TerrainKind, START_METADATA_KEY};

use super::discovery::{discover_tiles, ResourceBundle};
use super::error::MapBuildError;
use super::tile::{parse_tile, Tile};

/// Upper bound on the cells of one stitched map.
pub const MAX_MAP_CELLS: usize = 1 << 24;

/// Non-fatal findings collected while building a map.
///
/// The built grid is the same whether or not diagnostics were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapDiagnostic {
    UnknownGlyph {
        tile: Coordinate,
        row: usize,
        column: usize,
        glyph: char,
    },
    MalformedStart { value: String },
}

/// Stitches tiles into one [`TerrainGrid`].
#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    // Keyed by (y, x) so iteration is row-major tile order.
    tiles: BTreeMap<(u32, u32), Tile>,
    // Canonical tile size and the origin of the tile that set it.
    tile_size: Option<(Coordinate, (usize, usize))>,
    source: Option<PathBuf>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-filled with every tile found under `namespace`.
    pub fn discover(
        bundle: Option<&ResourceBundle>,
        namespace: impl AsRef<Path>,
    ) -> Result<Self, MapBuildError> {
        let namespace = namespace.as_ref();
        let mut builder = Self {
            source: Some(namespace.to_path_buf()),
            ..Self::default()
        };
        for source in discover_tiles(bundle, namespace)? {
            let tile = parse_tile(&source.resource, &source.body)?;
            debug!(
                resource = %source.resource,
                origin = %tile.origin,
                width = tile.width(),
                height = tile.height(),
                "tile_parsed"
            );
            builder.add_tile(tile);
        }
        Ok(builder)
    }

    /// Adds a tile. A tile at an origin already present replaces the old one.
    /// The first tile added fixes the tile size for the whole map; replacing
    /// that tile makes its replacement the size reference.
    pub fn add_tile(&mut self, tile: Tile) -> &mut Self {
        let sets_size = self
            .tile_size
            .map_or(true, |(origin, _)| origin == tile.origin);
        if sets_size {
            self.tile_size = Some((tile.origin, (tile.width(), tile.height())));
        }
        self.tiles.insert((tile.origin.y, tile.origin.x), tile);
        self
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn build(&self, name: &str) -> Result<TerrainGrid, MapBuildError> {
        self.build_with_diagnostics(name).map(|(grid, _)| grid)
    }

    pub fn build_with_diagnostics(
        &self,
        name: &str,
    ) -> Result<(TerrainGrid, Vec<MapDiagnostic>), MapBuildError> {
        let Some((_, (tile_width, tile_height))) =
            self.tile_size.filter(|_| !self.tiles.is_empty())
        else {
            return Err(MapBuildError::NoTiles {
                namespace: self
                    .source
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(name)),
            });
        };

        for tile in self.tiles.values() {
            if tile.width() != tile_width || tile.height() != tile_height {
                return Err(MapBuildError::InconsistentTileSize {
                    origin: tile.origin,
                    expected_width: tile_width,
                    expected_height: tile_height,
                    actual_width: tile.width(),
                    actual_height: tile.height(),
                });
            }
        }

        let max_x = self.tiles.keys().map(|(_, x)| *x).max().unwrap_or(0) as usize;
        let max_y = self.tiles.keys().map(|(y, _)| *y).max().unwrap_or(0) as usize;
        let width = (max_x + 1).saturating_mul(tile_width);
        let height = (max_y + 1).saturating_mul(tile_height);
        let fits = u32::try_from(width).is_ok()
            && u32::try_from(height).is_ok()
            && width.checked_mul(height).is_some_and(|cells| cells <= MAX_MAP_CELLS);
        if !fits {
            return Err(TerrainGridError::TooLarge {
                name: name.to_string(),
                width,
                height,
            }
            .into());
        }

        let mut rows = vec![vec![TerrainKind::Empty; width]; height];
        let mut metadata = BTreeMap::new();
        let mut diagnostics = Vec::new();
        for tile in self.tiles.values() {
            let left = tile.origin.x as usize * tile_width;
            let top = tile.origin.y as usize * tile_height;
            for (row_offset, tile_row) in tile.rows.iter().enumerate() {
                let row = &mut rows[top + row_offset];
                for column in 0..tile_width {
                    row[left + column] = tile_row.get(column).copied().unwrap_or_default();
                }
            }
            metadata.extend(
                tile.metadata
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
            diagnostics.extend(tile.unknown_glyphs.iter().map(|unknown| {
                MapDiagnostic::UnknownGlyph {
                    tile: tile.origin,
                    row: unknown.row,
                    column: unknown.column,
                    glyph: unknown.glyph,
                }
            }));
        }

        if let Some(value) = metadata.get(START_METADATA_KEY) {
            if Coordinate::parse_lenient(value).is_none() {
                diagnostics.push(MapDiagnostic::MalformedStart {
                    value: value.clone(),
                });
            }
        }
        for diagnostic in &diagnostics {
            debug!(map = name, ?diagnostic, "map_diagnostic");
        }

        let grid = TerrainGrid::new(name, rows, metadata)?;
        info!(
            map = name,
            tiles = self.tiles.len(),
            width = grid.width(),
            height = grid.height(),
            diagnostics = diagnostics.len(),
            "map_build_summary"
        );
        Ok((grid, diagnostics))
    }
}

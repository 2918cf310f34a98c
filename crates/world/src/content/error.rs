use std::path::PathBuf;

use thiserror::Error;

use crate::coord::Coordinate;
use crate::terrain::TerrainGridError;

#[derive(Debug, Error)]
pub enum MapBuildError {
    #[error("map directory {namespace} does not contain any map tile files")]
    NoTiles { namespace: PathBuf },
    #[error("map directory {path} not found")]
    MissingDirectory { path: PathBuf },
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read tile file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tile resource {resource} must match the 'X,Y.{extension}' pattern")]
    InvalidTileName { resource: String, extension: String },
    #[error("tile {origin} ({resource}) has no terrain rows")]
    EmptyTile { resource: String, origin: Coordinate },
    #[error(
        "inconsistent tile size: expected ({expected_width},{expected_height}) \
but got ({actual_width},{actual_height}) for tile ({origin})"
    )]
    InconsistentTileSize {
        origin: Coordinate,
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },
    #[error(transparent)]
    Grid(#[from] TerrainGridError),
}

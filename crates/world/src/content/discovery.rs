use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::MapBuildError;
use super::tile::{match_tile_name, TILE_EXTENSION};

/// In-memory tile files keyed by `/`-separated resource path.
///
/// This is the primary lookup for map tiles; the binary fills it with tiles
/// embedded at compile time.
#[derive(Debug, Clone, Default)]
pub struct ResourceBundle {
    entries: BTreeMap<String, String>,
}

/// A discovered tile file that still has to be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    pub resource: String,
    pub body: String,
}

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) -> &mut Self {
        self.entries
            .insert(normalize_resource_path(&path.into()), contents.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tile files sitting directly under `namespace`, in path order.
    pub fn tiles_in(&self, namespace: &str) -> Vec<TileSource> {
        let prefix = format!("{}/", normalize_resource_path(namespace));
        self.entries
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| {
                let child = &path[prefix.len()..];
                !child.contains('/') && match_tile_name(child, TILE_EXTENSION).is_some()
            })
            .map(|(path, body)| TileSource {
                resource: path.clone(),
                body: body.clone(),
            })
            .collect()
    }
}

fn normalize_resource_path(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

/// Finds the tile files of one map namespace.
///
/// The bundle is consulted first. When it has no tiles for the namespace the
/// directory of the same name is read instead; only its direct children are
/// considered, so child map sub-directories are left alone.
pub fn discover_tiles(
    bundle: Option<&ResourceBundle>,
    namespace: &Path,
) -> Result<Vec<TileSource>, MapBuildError> {
    if let Some(bundle) = bundle {
        let sources = bundle.tiles_in(&namespace.to_string_lossy());
        if !sources.is_empty() {
            tracing::debug!(
                namespace = %namespace.display(),
                tiles = sources.len(),
                "tiles_found_in_bundle"
            );
            return Ok(sources);
        }
    }

    let files = collect_tile_files_sorted(namespace)?;
    if files.is_empty() {
        return Err(MapBuildError::NoTiles {
            namespace: namespace.to_path_buf(),
        });
    }
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let bytes = fs::read(&path).map_err(|source| MapBuildError::ReadFile {
            path: path.clone(),
            source,
        })?;
        sources.push(TileSource {
            resource: path.to_string_lossy().to_string(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    tracing::debug!(
        namespace = %namespace.display(),
        tiles = sources.len(),
        "tiles_found_on_disk"
    );
    Ok(sources)
}

fn collect_tile_files_sorted(dir: &Path) -> Result<Vec<PathBuf>, MapBuildError> {
    if !dir.is_dir() {
        return Err(MapBuildError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }
    let entries = fs::read_dir(dir).map_err(|source| MapBuildError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| MapBuildError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_tile = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| match_tile_name(name, TILE_EXTENSION).is_some());
        if is_tile {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

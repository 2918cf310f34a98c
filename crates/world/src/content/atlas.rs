use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::coord::{child_map_name, parent_coordinate, Coordinate};
use crate::terrain::TerrainGrid;

use super::builder::MapBuilder;
use super::discovery::ResourceBundle;
use super::error::MapBuildError;

/// The main map plus every child map entered so far.
///
/// Child maps live at `<maps_root>/<main name>/<XXXX,YYYY>` and are built the
/// first time they are entered.
#[derive(Debug)]
pub struct MapAtlas {
    bundle: Option<ResourceBundle>,
    maps_root: PathBuf,
    main: TerrainGrid,
    children: HashMap<String, TerrainGrid>,
}

impl MapAtlas {
    pub fn open(
        bundle: Option<ResourceBundle>,
        maps_root: impl Into<PathBuf>,
        main_name: &str,
    ) -> Result<Self, MapBuildError> {
        let maps_root = maps_root.into();
        let main =
            MapBuilder::discover(bundle.as_ref(), maps_root.join(main_name))?.build(main_name)?;
        Ok(Self {
            bundle,
            maps_root,
            main,
            children: HashMap::new(),
        })
    }

    pub fn main(&self) -> &TerrainGrid {
        &self.main
    }

    pub fn main_name(&self) -> &str {
        self.main.name()
    }

    pub fn maps_root(&self) -> &Path {
        &self.maps_root
    }

    pub fn is_main(&self, name: &str) -> bool {
        self.main.name() == name
    }

    /// Already-built map by name.
    pub fn get(&self, name: &str) -> Option<&TerrainGrid> {
        if self.is_main(name) {
            return Some(&self.main);
        }
        self.children.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TerrainGrid> {
        if self.is_main(name) {
            return Some(&mut self.main);
        }
        self.children.get_mut(name)
    }

    /// Map entered from the cave or town at `entrance` on the main map.
    pub fn enter_child(&mut self, entrance: Coordinate) -> Result<&TerrainGrid, MapBuildError> {
        let name = child_map_name(entrance);
        match self.children.entry(name) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let namespace = self.maps_root.join(self.main.name()).join(entry.key());
                let grid = MapBuilder::discover(self.bundle.as_ref(), &namespace)?
                    .build(entry.key())?;
                info!(map = %entry.key(), entrance = %entrance, "child_map_loaded");
                Ok(&*entry.insert(grid))
            }
        }
    }

    /// Where the player reappears on the main map when leaving `child_name`.
    pub fn exit_of(&self, child_name: &str) -> Option<Coordinate> {
        if self.is_main(child_name) {
            return None;
        }
        parent_coordinate(child_name)
    }
}

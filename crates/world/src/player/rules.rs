use crate::coord::Coordinate;
use crate::terrain::{TerrainGrid, TerrainKind};

use super::config::GameConfig;

/// Decides whether a player on foot may step onto a cell.
pub trait MovementRule {
    fn can_walk(&self, grid: &TerrainGrid, coord: Coordinate, terrain: TerrainKind) -> bool;
}

/// Lets the player walk anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTerrain;

impl MovementRule for OpenTerrain {
    fn can_walk(&self, _grid: &TerrainGrid, _coord: Coordinate, _terrain: TerrainKind) -> bool {
        true
    }
}

impl<F> MovementRule for F
where
    F: Fn(&TerrainGrid, Coordinate, TerrainKind) -> bool,
{
    fn can_walk(&self, grid: &TerrainGrid, coord: Coordinate, terrain: TerrainKind) -> bool {
        self(grid, coord, terrain)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestOutcome {
    Empty,
    Coins(u32),
    Damage(u32),
}

/// Decides what an opened chest holds.
pub trait ChestRewardPolicy {
    fn open_chest(&mut self, config: &GameConfig) -> ChestOutcome;
}

/// Every chest is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyChests;

impl ChestRewardPolicy for EmptyChests {
    fn open_chest(&mut self, _config: &GameConfig) -> ChestOutcome {
        ChestOutcome::Empty
    }
}

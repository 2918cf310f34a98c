use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::coord::Coordinate;
use crate::terrain::{TerrainGrid, TerrainKind};

use super::config::GameConfig;
use super::items::{ItemError, ItemKind, PlayerItems};
use super::rules::{MovementRule, OpenTerrain};
use super::vehicles::VehicleTable;
use super::visited::VisitedTracker;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VehicleError {
    #[error("player is onboard but no vehicle on map '{map}' stands at {position}")]
    MissingVehicle { map: String, position: Coordinate },
    #[error("another vehicle on map '{map}' already stands at {position}")]
    Occupied { map: String, position: Coordinate },
}

/// Whether the player currently occupies a vehicle, and which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boarding {
    Ashore,
    Aboard(Coordinate),
}

/// Everything about the player that survives a save.
///
/// Health is always within `[0, max_health]` and `max_health` never exceeds the
/// configured `max_possible_health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(skip)]
    config: GameConfig,
    map_name: String,
    position: Coordinate,
    health: u32,
    max_health: u32,
    coins: u32,
    #[serde(default)]
    experience: u32,
    #[serde(default)]
    items: PlayerItems,
    #[serde(default)]
    visited: BTreeMap<String, VisitedTracker>,
    #[serde(default)]
    interactions: BTreeMap<String, BTreeSet<Coordinate>>,
    #[serde(default)]
    vehicles: BTreeMap<String, VehicleTable>,
    #[serde(default)]
    onboard_origin: Option<Coordinate>,
}

impl PlayerState {
    pub fn new(config: GameConfig) -> Self {
        let max_health = config.initial_max_health.min(config.max_possible_health);
        Self {
            config,
            map_name: String::new(),
            position: Coordinate::default(),
            health: config.initial_health.min(max_health),
            max_health,
            coins: config.initial_coins,
            experience: config.xp.initial_xp,
            items: PlayerItems::new(),
            visited: BTreeMap::new(),
            interactions: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            onboard_origin: None,
        }
    }

    /// Attaches configuration to a loaded player. Configuration is not saved.
    pub fn configure(&mut self, config: GameConfig) {
        self.config = config;
        self.max_health = self.max_health.min(config.max_possible_health);
        self.health = self.health.min(self.max_health);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn experience(&self) -> u32 {
        self.experience
    }

    pub fn set_health(&mut self, health: i64) {
        self.health = clamp_to(health, self.max_health);
    }

    /// Sets the maximum, bounded by the configured ceiling, and re-clamps health.
    pub fn set_max_health(&mut self, max_health: i64) {
        self.max_health = clamp_to(max_health, self.config.max_possible_health);
        self.health = self.health.min(self.max_health);
    }

    pub fn set_coins(&mut self, coins: i64) {
        self.coins = clamp_to(coins, u32::MAX);
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.set_coins(i64::from(self.coins) + i64::from(amount));
    }

    pub fn deduct_coins(&mut self, amount: u32) {
        self.set_coins(i64::from(self.coins) - i64::from(amount));
    }

    pub fn add_health(&mut self, amount: u32) {
        self.set_health(i64::from(self.health) + i64::from(amount));
    }

    pub fn deduct_health(&mut self, amount: u32) {
        self.set_health(i64::from(self.health) - i64::from(amount));
    }

    pub fn add_experience(&mut self, amount: u32) {
        self.experience = self.experience.saturating_add(amount);
    }

    /// Moves the player onto `grid` at `coord` and marks the cell visited.
    ///
    /// While onboard, the vehicle under the player is moved along; a target
    /// cell holding another vehicle is refused before anything changes.
    /// Returns `true` when the cell had never been visited before.
    pub fn move_to(&mut self, grid: &TerrainGrid, coord: Coordinate) -> Result<bool, VehicleError> {
        if self.onboard_origin.is_some() {
            let from = self.position;
            if coord != from && self.vehicle_located_at(grid, coord) {
                return Err(VehicleError::Occupied {
                    map: self.map_name.clone(),
                    position: coord,
                });
            }
            self.vehicles
                .get_mut(&self.map_name)
                .and_then(|table| table.relocate(from, coord))
                .ok_or_else(|| VehicleError::MissingVehicle {
                    map: self.map_name.clone(),
                    position: from,
                })?;
        }

        if self.map_name != grid.name() {
            self.map_name = grid.name().to_string();
        }
        self.position = coord;
        let first_visit = self
            .visited
            .entry(self.map_name.clone())
            .or_default()
            .visit(coord.x, coord.y);
        Ok(first_visit)
    }

    /// Movement check using the default on-foot rule.
    pub fn can_move_to(&self, grid: &TerrainGrid, coord: Coordinate) -> bool {
        self.can_move_to_with(grid, coord, &OpenTerrain)
    }

    /// Onboard, only free navigable cells are allowed; on foot, `rule` decides.
    pub fn can_move_to_with(
        &self,
        grid: &TerrainGrid,
        coord: Coordinate,
        rule: &dyn MovementRule,
    ) -> bool {
        let terrain = grid.terrain_at_coord(coord);
        if self.is_onboard() {
            return terrain.is_navigable() && !self.vehicle_located_at(grid, coord);
        }
        rule.can_walk(grid, coord, terrain)
    }

    /// Boards the vehicle at the player's position.
    pub fn board(&mut self) -> Coordinate {
        let position = self.position;
        let table = self.vehicles.entry(self.map_name.clone()).or_default();
        let origin = table.origin_at(position).unwrap_or(position);
        table.record(origin, position);
        self.onboard_origin = Some(origin);
        debug!(map = %self.map_name, %origin, %position, "vehicle_boarded");
        origin
    }

    /// Leaves the vehicle where it is.
    pub fn disembark(&mut self) {
        if let Some(origin) = self.onboard_origin.take() {
            debug!(map = %self.map_name, %origin, position = %self.position, "vehicle_left");
        }
    }

    pub fn is_onboard(&self) -> bool {
        self.onboard_origin.is_some()
    }

    pub fn onboard_origin(&self) -> Option<Coordinate> {
        self.onboard_origin
    }

    pub fn boarding(&self) -> Boarding {
        match self.onboard_origin {
            Some(origin) => Boarding::Aboard(origin),
            None => Boarding::Ashore,
        }
    }

    /// Whether a vehicle stands at `coord` on `grid`.
    ///
    /// A ship cell from the map file only counts while that ship has never been
    /// tracked; once tracked, its current position is authoritative.
    pub fn vehicle_located_at(&self, grid: &TerrainGrid, coord: Coordinate) -> bool {
        let table = self.vehicles.get(grid.name());
        if table.is_some_and(|table| table.is_occupied(coord)) {
            return true;
        }
        grid.terrain_at_coord(coord) == TerrainKind::Ship
            && !table.is_some_and(|table| table.contains_origin(coord))
    }

    /// Records a one-shot interaction. Returns `true` the first time.
    pub fn interacted(&mut self, map: &str, coord: Coordinate) -> bool {
        self.interactions
            .entry(map.to_string())
            .or_default()
            .insert(coord)
    }

    pub fn has_interacted(&self, map: &str, coord: Coordinate) -> bool {
        self.interactions
            .get(map)
            .is_some_and(|coords| coords.contains(&coord))
    }

    pub fn visited(&self, map: &str) -> Option<&VisitedTracker> {
        self.visited.get(map)
    }

    pub fn has_visited(&self, map: &str, coord: Coordinate) -> bool {
        self.visited(map)
            .is_some_and(|tracker| tracker.has_visited(coord.x, coord.y))
    }

    pub fn vehicles(&self, map: &str) -> Option<&VehicleTable> {
        self.vehicles.get(map)
    }

    /// Every map's vehicle table, by map name.
    pub fn vehicle_tables(&self) -> impl Iterator<Item = (&str, &VehicleTable)> {
        self.vehicles
            .iter()
            .map(|(map, table)| (map.as_str(), table))
    }

    pub fn items(&self) -> &PlayerItems {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut PlayerItems {
        &mut self.items
    }

    /// Uses a potion or equips an item. A used potion leaves the inventory.
    pub fn apply_item(&mut self, index: usize) -> Result<bool, ItemError> {
        let item = self
            .items
            .get(index)
            .ok_or(ItemError::NoSuchItem { index })?;
        let ItemKind::HealingPotion { amount } = item.kind else {
            return self.items.equip(index, self.experience);
        };
        match amount {
            Some(amount) => self.add_health(amount),
            None => self.health = self.max_health,
        }
        self.items.remove(index);
        Ok(true)
    }

    pub fn immune_to(&self, terrain: TerrainKind) -> bool {
        self.items.immune_to(terrain)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

fn clamp_to(value: i64, max: u32) -> u32 {
    // Clamped into [0, max], which always fits in u32.
    value.clamp(0, i64::from(max)) as u32
}

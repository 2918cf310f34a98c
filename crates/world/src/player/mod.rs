mod config;
mod items;
mod rules;
mod state;
mod vehicles;
mod visited;

pub use config::{ConfigError, GameConfig, XpConfig};
pub use items::{InventoryItem, ItemError, ItemKind, ItemType, PlayerItems};
pub use rules::{ChestOutcome, ChestRewardPolicy, EmptyChests, MovementRule, OpenTerrain};
pub use state::{Boarding, PlayerState, VehicleError};
pub use vehicles::VehicleTable;
pub use visited::VisitedTracker;

mod atomic_io;

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::player::PlayerState;

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to read save file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write save file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode save json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to parse save json{}: {source}", at_path(.json_path))]
    Decode {
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported save_version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: u32, actual: u32 },
    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },
}

fn at_path(json_path: &str) -> String {
    if json_path.is_empty() || json_path == "." {
        String::new()
    } else {
        format!(" at {json_path}")
    }
}

#[derive(Serialize)]
struct SaveDocumentRef<'a> {
    save_version: u32,
    player: &'a PlayerState,
}

#[derive(Deserialize)]
struct SaveDocument {
    save_version: u32,
    player: PlayerState,
}

/// Encodes a player as a pretty-printed save document.
pub fn encode_player(player: &PlayerState) -> Result<String, SaveError> {
    let document = SaveDocumentRef {
        save_version: SAVE_VERSION,
        player,
    };
    serde_json::to_string_pretty(&document).map_err(SaveError::Encode)
}

/// Decodes and validates a save document. The returned player carries the
/// default configuration until [`PlayerState::configure`] is called.
pub fn decode_player(raw: &str) -> Result<PlayerState, SaveError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let document: SaveDocument =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let json_path = error.path().to_string();
            SaveError::Decode {
                json_path,
                source: error.into_inner(),
            }
        })?;
    validate_document(&document)?;
    Ok(document.player)
}

pub fn save_player(player: &PlayerState, path: &Path) -> Result<(), SaveError> {
    let json = encode_player(player)?;
    atomic_io::write_text_atomic(path, &json).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        map = player.map_name(),
        bytes = json.len(),
        "save_written"
    );
    Ok(())
}

pub fn load_player(path: &Path) -> Result<PlayerState, SaveError> {
    let raw = fs::read_to_string(path).map_err(|source| SaveError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let player = decode_player(&raw)?;
    info!(
        path = %path.display(),
        map = player.map_name(),
        position = %player.position(),
        "save_loaded"
    );
    Ok(player)
}

fn validation_err(path: &str, message: impl Into<String>) -> SaveError {
    SaveError::Validation {
        path: path.to_string(),
        message: message.into(),
    }
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> SaveError {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

fn validate_document(document: &SaveDocument) -> Result<(), SaveError> {
    if document.save_version != SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion {
            expected: SAVE_VERSION,
            actual: document.save_version,
        });
    }

    let player = &document.player;
    for (map, table) in player.vehicle_tables() {
        let mut seen = BTreeMap::new();
        for (origin, current) in table.iter() {
            if let Some(other) = seen.insert(current, origin) {
                return Err(validation_err(
                    &format!("player.vehicles.{map}"),
                    format!("vehicles from {other} and {origin} both stand at {current}"),
                ));
            }
        }
    }
    if player.health() > player.max_health() {
        return Err(expected_actual(
            "player.health",
            format!("at most max_health {}", player.max_health()),
            player.health(),
        ));
    }
    if let Some(origin) = player.onboard_origin() {
        let current = player
            .vehicles(player.map_name())
            .and_then(|table| table.current_of(origin));
        match current {
            None => {
                return Err(validation_err(
                    "player.onboard_origin",
                    format!(
                        "no vehicle with origin {origin} on map '{}'",
                        player.map_name()
                    ),
                ))
            }
            Some(current) if current != player.position() => {
                return Err(expected_actual(
                    "player.onboard_origin",
                    format!("vehicle at player position {}", player.position()),
                    current,
                ))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;
    use crate::coord::Coordinate;
    use crate::player::{GameConfig, InventoryItem, ItemKind};
    use crate::terrain::{TerrainGrid, TerrainKind};

    fn sea() -> TerrainGrid {
        let rows = vec![
            vec![TerrainKind::Grass, TerrainKind::Ship, TerrainKind::Water],
            vec![TerrainKind::Water, TerrainKind::Water, TerrainKind::Water],
        ];
        TerrainGrid::new("main", rows, BTreeMap::new()).expect("grid")
    }

    fn sample_player() -> PlayerState {
        let map = sea();
        let mut player = PlayerState::new(GameConfig::default());
        player.move_to(&map, Coordinate::new(0, 0)).expect("start");
        player.move_to(&map, Coordinate::new(1, 0)).expect("to ship");
        player.board();
        player.move_to(&map, Coordinate::new(2, 1)).expect("sail");
        player.interacted("main", Coordinate::new(0, 0));
        player.interacted("0001,0002", Coordinate::new(3, 4));
        player.deduct_health(4);
        player.add_experience(6);
        player
            .items_mut()
            .add(InventoryItem::new("dagger", ItemKind::Weapon { offense: 2 }));
        player
    }

    #[test]
    fn encode_then_decode_restores_every_field() {
        let player = sample_player();
        let json = encode_player(&player).expect("encode");
        let decoded = decode_player(&json).expect("decode");
        assert_eq!(decoded, player);
        assert!(decoded.is_onboard());
        assert!(decoded.vehicle_located_at(&sea(), Coordinate::new(2, 1)));
    }

    #[test]
    fn document_uses_string_coordinates_and_word_rows() {
        let json = encode_player(&sample_player()).expect("encode");
        let value: Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["save_version"], 1);
        let player = &value["player"];
        assert_eq!(player["position"], "2,1");
        assert_eq!(player["onboard_origin"], "1,0");
        assert_eq!(player["vehicles"]["main"]["1,0"], "2,1");
        assert_eq!(player["interactions"]["0001,0002"][0], "3,4");
        assert_eq!(player["visited"]["main"]["0"], serde_json::json!([3]));
        assert_eq!(player["visited"]["main"]["1"], serde_json::json!([4]));
        assert!(player.get("config").is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = encode_player(&sample_player()).expect("encode");
        let mut value: Value = serde_json::from_str(&json).expect("json");
        value["player"]["pet"] = Value::from("parrot");
        value["saved_at"] = Value::from("yesterday");
        let decoded = decode_player(&value.to_string()).expect("decode");
        assert_eq!(decoded, sample_player());
    }

    #[test]
    fn decode_errors_carry_json_path() {
        let json = encode_player(&sample_player()).expect("encode");
        let mut value: Value = serde_json::from_str(&json).expect("json");
        value["player"]["interactions"]["main"][0] = Value::from("0, 0");
        let err = decode_player(&value.to_string()).expect_err("bad coordinate");
        match err {
            SaveError::Decode { json_path, .. } => {
                assert_eq!(json_path, "player.interactions.main[0]")
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = decode_player("not json").expect_err("garbage");
        assert!(err.to_string().starts_with("failed to parse save json: "));
    }

    #[test]
    fn validation_rejects_inconsistent_state() {
        let json = encode_player(&sample_player()).expect("encode");
        let value: Value = serde_json::from_str(&json).expect("json");

        let mut bad_version = value.clone();
        bad_version["save_version"] = Value::from(SAVE_VERSION + 1);
        assert!(matches!(
            decode_player(&bad_version.to_string()),
            Err(SaveError::UnsupportedVersion { actual: 2, .. })
        ));

        let mut too_healthy = value.clone();
        too_healthy["player"]["health"] = Value::from(31);
        let err = decode_player(&too_healthy.to_string()).expect_err("health");
        assert!(matches!(err, SaveError::Validation { ref path, .. } if path == "player.health"));

        let mut lost_ship = value.clone();
        lost_ship["player"]["vehicles"] = serde_json::json!({});
        let err = decode_player(&lost_ship.to_string()).expect_err("vehicle");
        assert!(
            matches!(err, SaveError::Validation { ref path, .. } if path == "player.onboard_origin")
        );

        let mut drifted = value;
        drifted["player"]["vehicles"]["main"]["1,0"] = Value::from("1,1");
        let err = decode_player(&drifted.to_string()).expect_err("drift");
        assert!(matches!(err, SaveError::Validation { .. }));
    }

    #[test]
    fn validation_rejects_two_vehicles_on_one_cell() {
        let json = encode_player(&sample_player()).expect("encode");
        let mut value: Value = serde_json::from_str(&json).expect("json");
        value["player"]["vehicles"]["main"]["5,5"] = Value::from("2,1");
        let err = decode_player(&value.to_string()).expect_err("shared cell");
        assert!(
            matches!(err, SaveError::Validation { ref path, .. } if path == "player.vehicles.main")
        );
    }

    #[test]
    fn save_and_load_through_disk() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("game.tqsave");
        let player = sample_player();
        save_player(&player, &path).expect("save");
        assert_eq!(load_player(&path).expect("load"), player);

        let err = load_player(&temp.path().join("missing.tqsave")).expect_err("missing");
        assert!(matches!(err, SaveError::Read { .. }));
    }
}

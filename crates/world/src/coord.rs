use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A cell position on a terrain grid.
///
/// Ordering is x-major, y-minor. The canonical text form is `"x,y"`, used both
/// for save-file values and for save-file object keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinate '{input}': expected non-negative integers in the form x,y")]
pub struct CoordinateParseError {
    pub input: String,
}

impl Coordinate {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Signed form used for speculative grid probes.
    pub fn to_signed(self) -> (i64, i64) {
        (i64::from(self.x), i64::from(self.y))
    }

    /// Scans `text` for the first `digits , digits` pair, allowing whitespace
    /// around the comma and any surrounding text.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut start = 0usize;
        while start < bytes.len() {
            if !bytes[start].is_ascii_digit() {
                start += 1;
                continue;
            }
            let x_end = digit_run_end(bytes, start);
            let mut cursor = x_end;
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
            if cursor < bytes.len() && bytes[cursor] == b',' {
                cursor += 1;
                while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                    cursor += 1;
                }
                let y_end = digit_run_end(bytes, cursor);
                if y_end > cursor {
                    let x = text[start..x_end].parse::<u32>().ok();
                    let y = text[cursor..y_end].parse::<u32>().ok();
                    if let (Some(x), Some(y)) = (x, y) {
                        return Some(Self { x, y });
                    }
                }
            }
            start = x_end;
        }
        None
    }

    /// Neighbor one step away, or `None` when it would leave the unsigned range.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        let x = i64::from(self.x) + i64::from(dx);
        let y = i64::from(self.y) + i64::from(dy);
        Some(Self {
            x: u32::try_from(x).ok()?,
            y: u32::try_from(y).ok()?,
        })
    }
}

fn digit_run_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    end
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordinateParseError {
            input: s.to_string(),
        };
        let (raw_x, raw_y) = s.split_once(',').ok_or_else(invalid)?;
        Ok(Self {
            x: parse_component(raw_x).ok_or_else(invalid)?,
            y: parse_component(raw_y).ok_or_else(invalid)?,
        })
    }
}

fn parse_component(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok()
}

// Serialized as the "x,y" string so coordinates can also be JSON object keys.
impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Coordinate>().map_err(serde::de::Error::custom)
    }
}

/// Name of the child map entered from `coord` on its parent map.
pub fn child_map_name(coord: Coordinate) -> String {
    format!("{:04},{:04}", coord.x, coord.y)
}

/// Exit coordinate on the parent map encoded in a child map name.
pub fn parent_coordinate(child_name: &str) -> Option<Coordinate> {
    Coordinate::parse_lenient(child_name)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn display_and_parse_are_inverse() {
        let coord = Coordinate::new(3, 7);
        assert_eq!(coord.to_string(), "3,7");
        assert_eq!("3,7".parse::<Coordinate>().expect("parse"), coord);
    }

    #[test]
    fn strict_parse_rejects_whitespace_signs_and_extra_parts() {
        for input in ["3, 7", "-1,7", "+1,7", " 3,7", "3,7 ", "3", "3,7,1", ",7", "3,", "", "a,b"] {
            let err = input.parse::<Coordinate>().expect_err(input);
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn strict_parse_rejects_overflow() {
        assert!("4294967296,0".parse::<Coordinate>().is_err());
    }

    #[test]
    fn ordering_is_x_major() {
        let mut coords = vec![
            Coordinate::new(1, 5),
            Coordinate::new(0, 9),
            Coordinate::new(1, 0),
        ];
        coords.sort();
        assert_eq!(
            coords,
            vec![
                Coordinate::new(0, 9),
                Coordinate::new(1, 0),
                Coordinate::new(1, 5)
            ]
        );
    }

    #[test]
    fn serde_value_and_key_use_string_form() {
        let json = serde_json::to_string(&Coordinate::new(1, 2)).expect("encode");
        assert_eq!(json, "\"1,2\"");

        let mut map = BTreeMap::new();
        map.insert(Coordinate::new(1, 2), true);
        let json = serde_json::to_string(&map).expect("encode map");
        assert_eq!(json, "{\"1,2\":true}");

        let decoded: BTreeMap<Coordinate, bool> =
            serde_json::from_str("{\"4,5\":false}").expect("decode map");
        assert_eq!(decoded.get(&Coordinate::new(4, 5)), Some(&false));
    }

    #[test]
    fn serde_rejects_malformed_value() {
        assert!(serde_json::from_str::<Coordinate>("\"1, 2\"").is_err());
        assert!(serde_json::from_str::<Coordinate>("12").is_err());
    }

    #[test]
    fn lenient_parse_accepts_surrounding_text() {
        assert_eq!(
            Coordinate::parse_lenient(" 12 , 4 "),
            Some(Coordinate::new(12, 4))
        );
        assert_eq!(
            Coordinate::parse_lenient("cave 0003,0012"),
            Some(Coordinate::new(3, 12))
        );
        assert_eq!(Coordinate::parse_lenient("nowhere"), None);
        assert_eq!(Coordinate::parse_lenient("5,"), None);
    }

    #[test]
    fn child_map_names_round_trip_to_parent_coordinate() {
        let name = child_map_name(Coordinate::new(3, 12));
        assert_eq!(name, "0003,0012");
        assert_eq!(parent_coordinate(&name), Some(Coordinate::new(3, 12)));
    }

    #[test]
    fn offset_stops_at_zero() {
        assert_eq!(Coordinate::new(0, 4).offset(-1, 0), None);
        assert_eq!(
            Coordinate::new(2, 4).offset(-1, 1),
            Some(Coordinate::new(1, 5))
        );
    }
}

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// Vehicles of one map, keyed by the cell they start on.
///
/// A reverse index from current position to origin is kept in step with the
/// primary table so position lookups do not scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Coordinate, Coordinate>",
    into = "BTreeMap<Coordinate, Coordinate>"
)]
pub struct VehicleTable {
    by_origin: BTreeMap<Coordinate, Coordinate>,
    by_current: HashMap<Coordinate, Coordinate>,
}

impl VehicleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_origin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_origin.is_empty()
    }

    pub fn contains_origin(&self, origin: Coordinate) -> bool {
        self.by_origin.contains_key(&origin)
    }

    pub fn current_of(&self, origin: Coordinate) -> Option<Coordinate> {
        self.by_origin.get(&origin).copied()
    }

    /// Origin of the vehicle currently standing on `position`.
    pub fn origin_at(&self, position: Coordinate) -> Option<Coordinate> {
        self.by_current.get(&position).copied()
    }

    pub fn is_occupied(&self, position: Coordinate) -> bool {
        self.by_current.contains_key(&position)
    }

    /// Records that the vehicle from `origin` now stands on `current`.
    pub fn record(&mut self, origin: Coordinate, current: Coordinate) {
        if let Some(previous) = self.by_origin.insert(origin, current) {
            if self.by_current.get(&previous) == Some(&origin) {
                self.by_current.remove(&previous);
            }
        }
        self.by_current.insert(current, origin);
    }

    /// Moves the vehicle standing on `from` to `to`, returning its origin.
    pub fn relocate(&mut self, from: Coordinate, to: Coordinate) -> Option<Coordinate> {
        let origin = self.origin_at(from)?;
        self.record(origin, to);
        Some(origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
        self.by_origin
            .iter()
            .map(|(origin, current)| (*origin, *current))
    }
}

impl PartialEq for VehicleTable {
    fn eq(&self, other: &Self) -> bool {
        self.by_origin == other.by_origin
    }
}

impl Eq for VehicleTable {}

impl From<BTreeMap<Coordinate, Coordinate>> for VehicleTable {
    fn from(by_origin: BTreeMap<Coordinate, Coordinate>) -> Self {
        let mut table = Self::new();
        for (origin, current) in by_origin {
            table.record(origin, current);
        }
        table
    }
}

impl From<VehicleTable> for BTreeMap<Coordinate, Coordinate> {
    fn from(table: VehicleTable) -> Self {
        table.by_origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Coordinate = Coordinate::new(2, 3);
    const B: Coordinate = Coordinate::new(3, 3);
    const C: Coordinate = Coordinate::new(4, 3);

    #[test]
    fn relocation_keeps_both_indexes_in_step() {
        let mut table = VehicleTable::new();
        table.record(A, A);
        assert_eq!(table.origin_at(A), Some(A));

        assert_eq!(table.relocate(A, B), Some(A));
        assert_eq!(table.current_of(A), Some(B));
        assert_eq!(table.origin_at(B), Some(A));
        assert!(!table.is_occupied(A));
        assert!(table.contains_origin(A));

        assert_eq!(table.relocate(B, C), Some(A));
        assert!(!table.is_occupied(B));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn relocate_from_empty_cell_is_none() {
        let mut table = VehicleTable::new();
        table.record(A, B);
        assert_eq!(table.relocate(A, C), None);
        assert_eq!(table.current_of(A), Some(B));
    }

    #[test]
    fn serializes_as_origin_to_current_object() {
        let mut table = VehicleTable::new();
        table.record(A, C);
        let json = serde_json::to_string(&table).expect("encode");
        assert_eq!(json, "{\"2,3\":\"4,3\"}");

        let decoded: VehicleTable = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded, table);
        assert_eq!(decoded.origin_at(C), Some(A));
    }
}

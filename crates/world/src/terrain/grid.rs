use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::coord::Coordinate;

use super::kind::TerrainKind;

/// Metadata key holding the starting coordinate of a map, as `x,y`.
pub const START_METADATA_KEY: &str = "start";

/// Starting coordinate used when a map has no usable `start` metadata.
pub const FALLBACK_START: Coordinate = Coordinate::new(9, 9);

/// Terrain cells of one named map plus its merged metadata.
///
/// Cells are stored row-major. The shape never changes after construction;
/// every query outside the grid answers `Empty` instead of failing.
#[derive(Clone, PartialEq, Eq)]
pub struct TerrainGrid {
    name: String,
    width: u32,
    height: u32,
    cells: Vec<TerrainKind>,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerrainGridError {
    #[error("terrain for map '{name}' has no rows")]
    NoRows { name: String },
    #[error("terrain for map '{name}' has an empty first row")]
    EmptyFirstRow { name: String },
    #[error("terrain for map '{name}' row {row} has width {actual}, expected {expected}")]
    RaggedRow {
        name: String,
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("terrain for map '{name}' is too large: {width}x{height}")]
    TooLarge {
        name: String,
        width: usize,
        height: usize,
    },
}

impl TerrainGrid {
    pub fn new(
        name: impl Into<String>,
        rows: Vec<Vec<TerrainKind>>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, TerrainGridError> {
        let name = name.into();
        let Some(first) = rows.first() else {
            return Err(TerrainGridError::NoRows { name });
        };
        let width = first.len();
        if width == 0 {
            return Err(TerrainGridError::EmptyFirstRow { name });
        }
        let height = rows.len();
        if let Some((row, actual)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != width)
        {
            return Err(TerrainGridError::RaggedRow {
                name,
                row,
                expected: width,
                actual,
            });
        }
        let (Ok(width_u32), Ok(height_u32)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(TerrainGridError::TooLarge {
                name,
                width,
                height,
            });
        };

        Ok(Self {
            name,
            width: width_u32,
            height: height_u32,
            cells: rows.into_iter().flatten().collect(),
            metadata,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.index_of(x, y).is_some()
    }

    fn index_of(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn terrain_at(&self, x: i64, y: i64) -> TerrainKind {
        self.index_of(x, y)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    pub fn terrain_at_coord(&self, coord: Coordinate) -> TerrainKind {
        let (x, y) = coord.to_signed();
        self.terrain_at(x, y)
    }

    /// Sets one cell. Returns `true` only when the stored value changed.
    pub fn modify_at(&mut self, x: i64, y: i64, kind: TerrainKind) -> bool {
        let Some(cell) = self.index_of(x, y).and_then(|index| self.cells.get_mut(index)) else {
            return false;
        };
        if *cell == kind {
            return false;
        }
        *cell = kind;
        true
    }

    /// Visits every cell of `[x, x+width) × [y, y+height)` that lies on the
    /// grid, in row-major order.
    pub fn walk<F>(&self, x: i64, y: i64, width: u32, height: u32, mut visit: F)
    where
        F: FnMut(u32, u32, TerrainKind),
    {
        let (cols, rows) = self.clamp_window(x, y, width, height);
        for row in rows {
            for col in cols.clone() {
                visit(col, row, self.terrain_at(i64::from(col), i64::from(row)));
            }
        }
    }

    /// Visits the up to eight cells around `(x, y)`, skipping the center.
    pub fn walk_surrounding<F>(&self, x: i64, y: i64, mut visit: F)
    where
        F: FnMut(u32, u32, TerrainKind),
    {
        self.walk(x.saturating_sub(1), y.saturating_sub(1), 3, 3, |col, row, kind| {
            if i64::from(col) != x || i64::from(row) != y {
                visit(col, row, kind);
            }
        });
    }

    /// Text dump of a window, one glyph per cell and rows separated by `\n`.
    pub fn render(&self, x: i64, y: i64, width: u32, height: u32) -> String {
        let mut output = String::new();
        let mut last_row: Option<u32> = None;
        self.walk(x, y, width, height, |_, row, kind| {
            if last_row.is_some_and(|last| last != row) {
                output.push('\n');
            }
            last_row = Some(row);
            output.push(kind.glyph());
        });
        output
    }

    pub fn render_all(&self) -> String {
        self.render(0, 0, self.width, self.height)
    }

    /// Reads the `start` metadata, falling back to [`FALLBACK_START`].
    pub fn starting_coordinate(&self) -> Coordinate {
        self.metadata
            .get(START_METADATA_KEY)
            .and_then(|raw| Coordinate::parse_lenient(raw))
            .unwrap_or(FALLBACK_START)
    }

    fn clamp_window(
        &self,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
        let clamp = |start: i64, len: u32, max: u32| {
            let lo = start.clamp(0, i64::from(max));
            let hi = start.saturating_add(i64::from(len)).clamp(lo, i64::from(max));
            // Both bounds lie in [0, max], so they fit in u32.
            (lo as u32)..(hi as u32)
        };
        (
            clamp(x, width, self.width),
            clamp(y, height, self.height),
        )
    }
}

impl fmt::Debug for TerrainGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerrainGrid")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(lines: &[&str]) -> TerrainGrid {
        let rows = lines
            .iter()
            .map(|line| line.chars().map(TerrainKind::from_glyph).collect())
            .collect();
        TerrainGrid::new("test", rows, BTreeMap::new()).expect("grid")
    }

    #[test]
    fn new_rejects_empty_and_ragged_terrain() {
        assert_eq!(
            TerrainGrid::new("a", Vec::new(), BTreeMap::new()).expect_err("no rows"),
            TerrainGridError::NoRows {
                name: "a".to_string()
            }
        );
        assert_eq!(
            TerrainGrid::new("a", vec![Vec::new()], BTreeMap::new()).expect_err("empty row"),
            TerrainGridError::EmptyFirstRow {
                name: "a".to_string()
            }
        );
        let err = TerrainGrid::new(
            "a",
            vec![vec![TerrainKind::Grass; 2], vec![TerrainKind::Grass]],
            BTreeMap::new(),
        )
        .expect_err("ragged");
        assert!(matches!(
            err,
            TerrainGridError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn terrain_at_reads_cells_and_degrades_out_of_bounds() {
        let grid = grid_from(&["A~", ".O"]);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.terrain_at(0, 0), TerrainKind::Mountain);
        assert_eq!(grid.terrain_at(1, 1), TerrainKind::Cave);
        assert_eq!(
            grid.terrain_at_coord(Coordinate::new(1, 0)),
            TerrainKind::Water
        );
        for (x, y) in [(-1, 0), (0, -1), (2, 0), (0, 2), (99, 99), (i64::MIN, 0)] {
            assert_eq!(grid.terrain_at(x, y), TerrainKind::Empty, "({x},{y})");
            assert!(!grid.contains(x, y));
        }
    }

    #[test]
    fn modify_at_reports_actual_changes_only() {
        let mut grid = grid_from(&["..", ".."]);
        assert!(grid.modify_at(1, 0, TerrainKind::Water));
        assert!(!grid.modify_at(1, 0, TerrainKind::Water));
        assert!(!grid.modify_at(2, 0, TerrainKind::Water));
        assert!(!grid.modify_at(-1, 0, TerrainKind::Water));
        assert_eq!(grid.render_all(), ".~\n..");
    }

    #[test]
    fn walk_clamps_window_to_grid() {
        let grid = grid_from(&["abc", "def"]);
        let mut seen = Vec::new();
        grid.walk(-1, 1, 3, 5, |col, row, _| seen.push((col, row)));
        assert_eq!(seen, vec![(0, 1), (1, 1)]);

        let mut none = 0;
        grid.walk(10, 10, 3, 3, |_, _, _| none += 1);
        assert_eq!(none, 0);
    }

    #[test]
    fn walk_surrounding_skips_center_and_clamps() {
        let grid = grid_from(&["...", "...", "..."]);
        let mut seen = Vec::new();
        grid.walk_surrounding(0, 0, |col, row, _| seen.push((col, row)));
        assert_eq!(seen, vec![(1, 0), (0, 1), (1, 1)]);

        let mut count = 0;
        grid.walk_surrounding(1, 1, |_, _, _| count += 1);
        assert_eq!(count, 8);
    }

    #[test]
    fn render_window_uses_glyphs() {
        let grid = grid_from(&["AAAA~", "~~~~.", "^^^AA"]);
        assert_eq!(grid.render(3, 0, 3, 2), "A~\n~.");
        assert_eq!(grid.render(-2, -2, 1, 1), "");
    }

    #[test]
    fn starting_coordinate_reads_metadata_or_falls_back() {
        let rows = vec![vec![TerrainKind::Grass; 3]; 3];
        let mut metadata = BTreeMap::new();
        metadata.insert(START_METADATA_KEY.to_string(), "2, 1".to_string());
        let grid = TerrainGrid::new("m", rows.clone(), metadata).expect("grid");
        assert_eq!(grid.starting_coordinate(), Coordinate::new(2, 1));

        let mut malformed = BTreeMap::new();
        malformed.insert(START_METADATA_KEY.to_string(), "middle".to_string());
        let grid = TerrainGrid::new("m", rows.clone(), malformed).expect("grid");
        assert_eq!(grid.starting_coordinate(), FALLBACK_START);

        let grid = TerrainGrid::new("m", rows, BTreeMap::new()).expect("grid");
        assert_eq!(grid.starting_coordinate(), FALLBACK_START);
    }
}

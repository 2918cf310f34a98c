use std::collections::BTreeMap;

use crate::coord::Coordinate;
use crate::terrain::TerrainKind;

use super::error::MapBuildError;

/// File extension of tile files.
pub const TILE_EXTENSION: &str = "tqmap";

/// A glyph in a tile body that has no terrain mapping and decoded to `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownGlyph {
    pub row: usize,
    pub column: usize,
    pub glyph: char,
}

/// One rectangular chunk of terrain, positioned in tile-grid units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub origin: Coordinate,
    pub rows: Vec<Vec<TerrainKind>>,
    pub metadata: BTreeMap<String, String>,
    pub unknown_glyphs: Vec<UnknownGlyph>,
}

impl Tile {
    pub fn new(
        origin: Coordinate,
        rows: Vec<Vec<TerrainKind>>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            origin,
            rows,
            metadata,
            unknown_glyphs: Vec::new(),
        }
    }

    /// Width of the first row.
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Parsed body of a tile file, before it is positioned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileBody {
    pub rows: Vec<Vec<TerrainKind>>,
    pub metadata: BTreeMap<String, String>,
    pub unknown_glyphs: Vec<UnknownGlyph>,
}

/// Parses a tile resource whose file name encodes its origin as `X,Y.tqmap`.
pub fn parse_tile(resource: &str, body: &str) -> Result<Tile, MapBuildError> {
    let file_name = resource.rsplit(['/', '\\']).next().unwrap_or(resource);
    let origin =
        match_tile_name(file_name, TILE_EXTENSION).ok_or_else(|| MapBuildError::InvalidTileName {
            resource: resource.to_string(),
            extension: TILE_EXTENSION.to_string(),
        })?;

    let parsed = parse_tile_body(body);
    if parsed.rows.is_empty() || parsed.rows[0].is_empty() {
        return Err(MapBuildError::EmptyTile {
            resource: resource.to_string(),
            origin,
        });
    }

    Ok(Tile {
        origin,
        rows: parsed.rows,
        metadata: parsed.metadata,
        unknown_glyphs: parsed.unknown_glyphs,
    })
}

/// Parses tile body text.
///
/// Blank lines are skipped, `#` lines are comments, `#- key: value` lines are
/// metadata, and every other line is one row with one cell per character.
pub fn parse_tile_body(body: &str) -> TileBody {
    let mut parsed = TileBody::default();
    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if let Some((key, value)) = comment.strip_prefix('-').and_then(parse_metadata) {
                parsed.metadata.insert(key, value);
            }
            continue;
        }

        let row_index = parsed.rows.len();
        let mut row = Vec::with_capacity(line.len());
        for (column, glyph) in line.chars().enumerate() {
            if !TerrainKind::is_known_glyph(glyph) {
                parsed.unknown_glyphs.push(UnknownGlyph {
                    row: row_index,
                    column,
                    glyph,
                });
            }
            row.push(TerrainKind::from_glyph(glyph));
        }
        parsed.rows.push(row);
    }
    parsed
}

// `key: value` after the `#-` marker; key is [A-Za-z0-9_-]+.
fn parse_metadata(text: &str) -> Option<(String, String)> {
    let text = text.trim_start();
    let key_len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(text.len());
    if key_len == 0 {
        return None;
    }
    let (key, rest) = text.split_at(key_len);
    let value = rest.trim_start().strip_prefix(':')?;
    Some((key.to_ascii_lowercase(), value.trim().to_string()))
}

/// Matches `<prefix><digits>,<digits>.<extension>` and returns the origin.
///
/// The prefix is as short as possible, so the whole digit run before the comma
/// forms the x value.
pub fn match_tile_name(file_name: &str, extension: &str) -> Option<Coordinate> {
    let stem = file_name
        .strip_suffix(extension)?
        .strip_suffix('.')?;
    let (head, raw_y) = stem.rsplit_once(',')?;
    let digits_start = head
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|index| index + 1)
        .unwrap_or(0);
    let raw_x = &head[digits_start..];
    if raw_x.is_empty() || raw_y.is_empty() || !raw_y.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(Coordinate::new(
        raw_x.parse::<u32>().ok()?,
        raw_y.parse::<u32>().ok()?,
    ))
}

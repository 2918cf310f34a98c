use serde::{Deserialize, Serialize};

/// Terrain tag of a single grid cell.
///
/// Every variant maps to exactly one printable ASCII glyph, used both in tile
/// files and in text rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    #[default]
    Empty,
    Mountain,
    Forest,
    Grass,
    Water,
    Lava,
    Cave,
    Town,
    Chest,
    Ship,
    Sand,
    WallHorizontal,
    WallVertical,
    WallCorner,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 14] = [
        TerrainKind::Empty,
        TerrainKind::Mountain,
        TerrainKind::Forest,
        TerrainKind::Grass,
        TerrainKind::Water,
        TerrainKind::Lava,
        TerrainKind::Cave,
        TerrainKind::Town,
        TerrainKind::Chest,
        TerrainKind::Ship,
        TerrainKind::Sand,
        TerrainKind::WallHorizontal,
        TerrainKind::WallVertical,
        TerrainKind::WallCorner,
    ];

    pub const fn glyph(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Mountain => 'A',
            Self::Forest => '^',
            Self::Grass => '.',
            Self::Water => '~',
            Self::Lava => '=',
            Self::Cave => 'O',
            Self::Town => '*',
            Self::Chest => '$',
            Self::Ship => '&',
            Self::Sand => ':',
            Self::WallHorizontal => '-',
            Self::WallVertical => '|',
            Self::WallCorner => '+',
        }
    }

    /// Decodes a tile glyph. Unrecognized glyphs decode to `Empty`.
    pub const fn from_glyph(glyph: char) -> Self {
        match glyph {
            'A' => Self::Mountain,
            '^' => Self::Forest,
            '.' => Self::Grass,
            '~' => Self::Water,
            '=' => Self::Lava,
            'O' => Self::Cave,
            '*' => Self::Town,
            '$' => Self::Chest,
            '&' => Self::Ship,
            ':' => Self::Sand,
            '-' => Self::WallHorizontal,
            '|' => Self::WallVertical,
            '+' => Self::WallCorner,
            _ => Self::Empty,
        }
    }

    pub const fn is_known_glyph(glyph: char) -> bool {
        glyph == ' ' || !matches!(Self::from_glyph(glyph), Self::Empty)
    }

    /// Terrain a boarded vehicle may sail on.
    pub const fn is_navigable(self) -> bool {
        matches!(self, Self::Water | Self::Ship)
    }

    /// Terrain that leads into a child map.
    pub const fn is_portal(self) -> bool {
        matches!(self, Self::Cave | Self::Town)
    }
}

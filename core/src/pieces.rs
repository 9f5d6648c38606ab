//! Fixed piece-shape table and ability data shared by the world and adapters.

use serde::{Deserialize, Serialize};

/// Offset of a piece cell relative to the piece origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellOffset {
    dx: i32,
    dy: i32,
}

impl CellOffset {
    /// Creates a new cell offset.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal displacement from the piece origin.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Vertical displacement from the piece origin.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }
}

/// Rotation pivot expressed in half-cell units relative to the piece origin.
///
/// Storing doubled coordinates keeps pivots that sit between cells exact, so a
/// quarter turn never accumulates rounding error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pivot {
    doubled_dx: i32,
    doubled_dy: i32,
}

impl Pivot {
    /// Creates a pivot from coordinates measured in half cells.
    #[must_use]
    pub const fn from_half_cells(doubled_dx: i32, doubled_dy: i32) -> Self {
        Self {
            doubled_dx,
            doubled_dy,
        }
    }

    /// Horizontal pivot position in cells.
    #[must_use]
    pub fn dx(&self) -> f32 {
        self.doubled_dx as f32 / 2.0
    }

    /// Vertical pivot position in cells.
    #[must_use]
    pub fn dy(&self) -> f32 {
        self.doubled_dy as f32 / 2.0
    }

    /// Rotates an offset a quarter turn counter-clockwise about the pivot.
    ///
    /// The rotated offset is snapped back onto the integer grid.
    #[must_use]
    pub fn rotate_quarter(self, offset: CellOffset) -> CellOffset {
        let x = offset.dx * 2;
        let y = offset.dy * 2;
        let rotated_x = self.doubled_dx - (y - self.doubled_dy);
        let rotated_y = self.doubled_dy + (x - self.doubled_dx);
        CellOffset::new(snap_half_cells(rotated_x), snap_half_cells(rotated_y))
    }
}

fn snap_half_cells(value: i32) -> i32 {
    (value + 1).div_euclid(2)
}

/// Discrete quarter-turn orientation of a piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// Spawn orientation.
    #[default]
    Deg0,
    /// One counter-clockwise quarter turn.
    Deg90,
    /// Two quarter turns.
    Deg180,
    /// Three quarter turns.
    Deg270,
}

impl Rotation {
    /// Orientation reached after one more counter-clockwise quarter turn.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    /// Orientation expressed in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

/// Static description of one entry in the shape table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeSpec {
    /// Conventional single-letter name of the tetromino.
    pub name: char,
    /// Cells occupied in the spawn orientation.
    pub cells: [CellOffset; 4],
    /// Pivot used for quarter turns.
    pub pivot: Pivot,
}

const fn offsets(cells: [(i32, i32); 4]) -> [CellOffset; 4] {
    [
        CellOffset::new(cells[0].0, cells[0].1),
        CellOffset::new(cells[1].0, cells[1].1),
        CellOffset::new(cells[2].0, cells[2].1),
        CellOffset::new(cells[3].0, cells[3].1),
    ]
}

/// Every shape available to the piece generator. Spawn orientations are
/// anchored so the lowest, leftmost cell column sits at offset zero.
pub static SHAPES: [ShapeSpec; ShapeId::COUNT] = [
    ShapeSpec {
        name: 'I',
        cells: offsets([(0, 0), (1, 0), (2, 0), (3, 0)]),
        pivot: Pivot::from_half_cells(3, 1),
    },
    ShapeSpec {
        name: 'O',
        cells: offsets([(0, 0), (1, 0), (0, 1), (1, 1)]),
        pivot: Pivot::from_half_cells(1, 1),
    },
    ShapeSpec {
        name: 'T',
        cells: offsets([(0, 0), (1, 0), (2, 0), (1, 1)]),
        pivot: Pivot::from_half_cells(2, 0),
    },
    ShapeSpec {
        name: 'S',
        cells: offsets([(0, 0), (1, 0), (1, 1), (2, 1)]),
        pivot: Pivot::from_half_cells(2, 0),
    },
    ShapeSpec {
        name: 'Z',
        cells: offsets([(0, 1), (1, 1), (1, 0), (2, 0)]),
        pivot: Pivot::from_half_cells(2, 0),
    },
    ShapeSpec {
        name: 'J',
        cells: offsets([(0, 1), (0, 0), (1, 0), (2, 0)]),
        pivot: Pivot::from_half_cells(2, 0),
    },
    ShapeSpec {
        name: 'L',
        cells: offsets([(0, 0), (1, 0), (2, 0), (2, 1)]),
        pivot: Pivot::from_half_cells(2, 0),
    },
];

/// Index into [`SHAPES`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ShapeId(u8);

impl ShapeId {
    /// Number of shapes in the table.
    pub const COUNT: usize = 7;

    /// Every valid shape identifier in table order.
    pub const ALL: [ShapeId; Self::COUNT] = [
        ShapeId(0),
        ShapeId(1),
        ShapeId(2),
        ShapeId(3),
        ShapeId(4),
        ShapeId(5),
        ShapeId(6),
    ];

    /// Creates a shape identifier when the index names a table entry.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Numeric table index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Static shape description for this identifier.
    #[must_use]
    pub fn spec(&self) -> &'static ShapeSpec {
        &SHAPES[self.0 as usize]
    }
}

impl TryFrom<u8> for ShapeId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("shape index {value} is outside the shape table"))
    }
}

impl From<ShapeId> for u8 {
    fn from(value: ShapeId) -> Self {
        value.0
    }
}

/// Special behaviour tag carried by every cell of a piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    /// Plain solid block.
    #[default]
    Normal,
    /// Surface the player can cling to.
    Sticky,
    /// Block the player can pass through.
    Pass,
    /// Launch pad granting a higher jump.
    HighJump,
    /// Springy block that bounces the player.
    Bouncy,
}

impl Ability {
    /// All ability tags in declaration order.
    pub const ALL: [Ability; 5] = [
        Ability::Normal,
        Ability::Sticky,
        Ability::Pass,
        Ability::HighJump,
        Ability::Bouncy,
    ];

    /// Maps a uniform roll in `0..100` onto the weighted ability distribution.
    ///
    /// Cumulative thresholds are 20/40/60/80/100 for Normal, Sticky,
    /// HighJump, Pass and Bouncy respectively.
    #[must_use]
    pub const fn from_roll(roll: u32) -> Self {
        if roll < 20 {
            Self::Normal
        } else if roll < 40 {
            Self::Sticky
        } else if roll < 60 {
            Self::HighJump
        } else if roll < 80 {
            Self::Pass
        } else {
            Self::Bouncy
        }
    }

    /// Presentation and physical-response data for the tag.
    #[must_use]
    pub const fn profile(self) -> &'static AbilityProfile {
        match self {
            Self::Normal => &NORMAL_PROFILE,
            Self::Sticky => &STICKY_PROFILE,
            Self::Pass => &PASS_PROFILE,
            Self::HighJump => &HIGH_JUMP_PROFILE,
            Self::Bouncy => &BOUNCY_PROFILE,
        }
    }
}

/// Byte RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel, 255 is opaque.
    pub alpha: u8,
}

impl Rgba {
    /// Creates a colour from its four channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

/// Data consulted by external collaborators for a given ability tag.
///
/// The core never branches on these values; it only stores and propagates
/// the tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilityProfile {
    /// Display name of the ability.
    pub name: &'static str,
    /// Tint applied to cells carrying the ability.
    pub color: Rgba,
    /// Render/physics layer assigned to the cells.
    pub layer: u8,
    /// Restitution applied to the cell surface.
    pub bounciness: f32,
    /// Surface friction.
    pub friction: f32,
    /// Whether the player passes through the cell.
    pub pass_through: bool,
}

const NORMAL_PROFILE: AbilityProfile = AbilityProfile {
    name: "normal",
    color: Rgba::new(128, 128, 128, 255),
    layer: 7,
    bounciness: 0.0,
    friction: 0.4,
    pass_through: false,
};

const STICKY_PROFILE: AbilityProfile = AbilityProfile {
    name: "sticky",
    color: Rgba::new(255, 0, 0, 255),
    layer: 8,
    bounciness: 0.0,
    friction: 0.4,
    pass_through: false,
};

const PASS_PROFILE: AbilityProfile = AbilityProfile {
    name: "pass",
    color: Rgba::new(0, 0, 255, 128),
    layer: 9,
    bounciness: 0.0,
    friction: 0.4,
    pass_through: true,
};

const HIGH_JUMP_PROFILE: AbilityProfile = AbilityProfile {
    name: "high_jump",
    color: Rgba::new(128, 0, 255, 255),
    layer: 10,
    bounciness: 0.0,
    friction: 0.4,
    pass_through: false,
};

const BOUNCY_PROFILE: AbilityProfile = AbilityProfile {
    name: "bouncy",
    color: Rgba::new(0, 255, 0, 255),
    layer: 11,
    bounciness: 0.7,
    friction: 0.1,
    pass_through: false,
};

/// Immutable description of a piece waiting in the queue or falling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceDefinition {
    shape: ShapeId,
    ability: Ability,
    pivot: Pivot,
}

impl PieceDefinition {
    /// Creates a definition using the pivot recorded in the shape table.
    #[must_use]
    pub fn new(shape: ShapeId, ability: Ability) -> Self {
        Self {
            shape,
            ability,
            pivot: shape.spec().pivot,
        }
    }

    /// Shape table entry used by the piece.
    #[must_use]
    pub const fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Ability tag carried by every cell of the piece.
    #[must_use]
    pub const fn ability(&self) -> Ability {
        self.ability
    }

    /// Rotation pivot relative to the piece origin.
    #[must_use]
    pub const fn pivot(&self) -> Pivot {
        self.pivot
    }

    /// Cells occupied in the spawn orientation.
    #[must_use]
    pub fn spawn_cells(&self) -> [CellOffset; 4] {
        self.shape.spec().cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ability_roll_thresholds_follow_cumulative_weights() {
        assert_eq!(Ability::from_roll(0), Ability::Normal);
        assert_eq!(Ability::from_roll(19), Ability::Normal);
        assert_eq!(Ability::from_roll(20), Ability::Sticky);
        assert_eq!(Ability::from_roll(40), Ability::HighJump);
        assert_eq!(Ability::from_roll(60), Ability::Pass);
        assert_eq!(Ability::from_roll(79), Ability::Pass);
        assert_eq!(Ability::from_roll(80), Ability::Bouncy);
        assert_eq!(Ability::from_roll(99), Ability::Bouncy);
    }

    #[test]
    fn every_shape_rotates_back_after_four_quarter_turns() {
        for spec in SHAPES.iter() {
            let mut cells = spec.cells;
            for _ in 0..4 {
                for cell in cells.iter_mut() {
                    *cell = spec.pivot.rotate_quarter(*cell);
                }
            }
            assert_eq!(cells, spec.cells, "shape {} drifted", spec.name);
        }
    }

    #[test]
    fn t_piece_quarter_turn_is_counter_clockwise() {
        let pivot = SHAPES[2].pivot;
        assert_eq!(pivot.rotate_quarter(CellOffset::new(0, 0)), CellOffset::new(1, -1));
        assert_eq!(pivot.rotate_quarter(CellOffset::new(1, 1)), CellOffset::new(0, 0));
    }

    #[test]
    fn o_piece_rotation_maps_cells_onto_themselves() {
        let spec = &SHAPES[1];
        let mut rotated: Vec<CellOffset> = spec
            .cells
            .iter()
            .map(|cell| spec.pivot.rotate_quarter(*cell))
            .collect();
        rotated.sort();
        let mut original = spec.cells.to_vec();
        original.sort();
        assert_eq!(rotated, original);
    }

    #[test]
    fn spawn_orientations_anchor_at_column_zero() {
        for spec in SHAPES.iter() {
            let min_dx = spec.cells.iter().map(CellOffset::dx).min();
            let min_dy = spec.cells.iter().map(CellOffset::dy).min();
            assert_eq!(min_dx, Some(0), "shape {}", spec.name);
            assert_eq!(min_dy, Some(0), "shape {}", spec.name);
        }
    }

    #[test]
    fn rotation_cycles_through_quarter_turns() {
        let mut rotation = Rotation::Deg0;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(rotation.degrees());
            rotation = rotation.next();
        }
        assert_eq!(seen, vec![0, 90, 180, 270]);
        assert_eq!(rotation, Rotation::Deg0);
    }

    #[test]
    fn shape_id_rejects_indices_outside_table() {
        assert!(ShapeId::new(6).is_some());
        assert!(ShapeId::new(7).is_none());
        assert!(ShapeId::try_from(200).is_err());
    }

    #[test]
    fn bouncy_profile_carries_physical_response() {
        let profile = Ability::Bouncy.profile();
        assert_eq!(profile.layer, 11);
        assert!((profile.bounciness - 0.7).abs() < f32::EPSILON);
        assert!(Ability::Pass.profile().pass_through);
        assert!(!Ability::Sticky.profile().pass_through);
    }
}

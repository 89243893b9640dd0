use serde::{Deserialize, Serialize};

/// The terrain kind of a map cell.
///
/// `HIDE` from the original design is deliberately absent here: it's never
/// stored on the authoritative map, only implied by the *absence* of `type`
/// on a player's fogged-out point-of-view cell. See [`Cell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Spawn,
    King,
    #[serde(rename = "block")]
    Blocker,
    Field,
    Castle,
}

/// One cell of the authoritative map, or of a player's point-of-view
/// projection of it.
///
/// Every field is optional because a POV cell outside a player's visibility
/// carries none of them ("unknown", the `HIDE` sentinel of the design
/// notes) while an authoritative `FIELD` cell with no owner is simply empty
/// terrain. Invariants enforced by callers, not by this type:
/// - if `player` is `Some`, `power >= 1`.
/// - a `Blocker` cell never carries `player` or `power`.
/// - a `King` cell's power never drops below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub cell_type: Option<CellType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub player: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub power: Option<u32>,
}

impl Cell {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.cell_type.is_none() && self.player.is_none() && self.power.is_none()
    }

    pub fn clear(&mut self) {
        self.cell_type = None;
        self.player = None;
        self.power = None;
    }
}

/// Rectangular H x W grid of [`Cell`]s, row-major, `H, W in [4, 32]`.
///
/// Stored as nested `Vec`s rather than a single flat `Vec<Cell>` with
/// `row * width + col` indexing — the design notes recommend the flat
/// arena for the territory/visibility *bitmaps* (see [`crate::Territory`]),
/// where the payoff is set-algebra over a fixed-size word array. The map
/// itself is addressed almost exclusively by `[row][col]` in the turn
/// algorithm, so the nested shape reads closer to the math and avoids a
/// manual index multiply at every call site.
pub type GameMap = Vec<Vec<Cell>>;

pub fn map_dimensions(map: &GameMap) -> (usize, usize) {
    let height = map.len();
    let width = map.first().map(|r| r.len()).unwrap_or(0);
    (height, width)
}

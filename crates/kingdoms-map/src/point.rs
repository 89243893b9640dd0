use serde::{Deserialize, Serialize};

/// A cell coordinate on the authoritative map, `{row, col}`.
///
/// `Point` carries no bounds information of its own — validity against a
/// particular [`GameMap`](crate::GameMap) is the caller's job. It appears in
/// three different wire shapes depending on context:
///
/// - plain `{row, col}` inside `move` messages and `cursor`/`prev_cursor`,
/// - tagged `{row, col, type: "Point"}` inside a directory-stored
///   [`MapMeta`](crate::MapMeta), so a decoder can tell a `Point` apart from
///   an ordinary object with the same two fields (see [`TaggedPoint`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Wire representation of a [`Point`] that round-trips through the
/// directory's JSON encoding with an explicit `type: "Point"` tag, matching
/// the original service's `MapAndMetaEncoder`/`map_and_meta_deserializer`
/// pair. Only used at the directory boundary — ordinary protocol messages
/// use the untagged `{row, col}` shape via [`Point`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedPoint {
    pub row: usize,
    pub col: usize,
    #[serde(rename = "type")]
    pub tag: PointTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointTag {
    Point,
}

impl From<Point> for TaggedPoint {
    fn from(p: Point) -> Self {
        TaggedPoint { row: p.row, col: p.col, tag: PointTag::Point }
    }
}

impl From<TaggedPoint> for Point {
    fn from(p: TaggedPoint) -> Self {
        Point { row: p.row, col: p.col }
    }
}

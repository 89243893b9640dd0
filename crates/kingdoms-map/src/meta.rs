use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell::{map_dimensions, CellType, GameMap};
use crate::error::MapError;
use crate::point::{Point, TaggedPoint};

/// Map metadata: must contain at least 2 `SPAWN` points. `version` is
/// currently always `1`; the field exists so a future map format can be
/// distinguished without guessing from shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapMeta {
    pub version: u32,
    #[serde(rename = "points_of_interest")]
    pub points_of_interest: HashMap<CellType, Vec<Point>>,
}

impl MapMeta {
    pub fn spawns(&self) -> &[Point] {
        self.points_of_interest
            .get(&CellType::Spawn)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// The immutable seed loaded from the directory: an authoritative map plus
/// its metadata. This is the value the directory's room-blob repository
/// stores and retrieves; see [`crate::MapError`] for its failure modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapAndMeta {
    pub map: GameMap,
    pub meta: MapMeta,
}

/// Wire shape of [`MapAndMeta`] with every `Point` tagged
/// `{row, col, type: "Point"}`, matching the original directory's
/// `MapAndMetaEncoder`. Encoding and decoding go through this type rather
/// than `#[serde]` attributes on `MapMeta` directly, because the tag must
/// distinguish a `Point` from a plain `{row, col}` object that can appear
/// elsewhere in the same document — a distinction serde's untagged/tagged
/// enum support can't express for "this struct, but only here".
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaggedMapMeta {
    version: u32,
    points_of_interest: HashMap<CellType, Vec<TaggedPoint>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaggedMapAndMeta {
    map: GameMap,
    meta: TaggedMapMeta,
}

impl MapAndMeta {
    /// Structural validation applied before a map is persisted through the
    /// HTTP admin surface: rectangular, in-bounds dimensions, enough spawn
    /// points to seat at least two players.
    pub fn validate(&self) -> Result<(), MapError> {
        let (height, width) = map_dimensions(&self.map);
        if !(4..=32).contains(&height) || !(4..=32).contains(&width) {
            return Err(MapError::InvalidDimensions { height, width });
        }
        if self.map.iter().any(|row| row.len() != width) {
            return Err(MapError::RaggedMap);
        }
        let spawns = self.meta.spawns().len();
        if spawns < 2 {
            return Err(MapError::NotEnoughSpawns(spawns));
        }
        Ok(())
    }

    /// Encodes to the directory's tagged-Point JSON representation.
    pub fn encode(&self) -> serde_json::Value {
        let tagged = TaggedMapAndMeta {
            map: self.map.clone(),
            meta: TaggedMapMeta {
                version: self.meta.version,
                points_of_interest: self
                    .meta
                    .points_of_interest
                    .iter()
                    .map(|(k, points)| (*k, points.iter().map(|p| (*p).into()).collect()))
                    .collect(),
            },
        };
        serde_json::to_value(&tagged).expect("MapAndMeta always serializes")
    }

    /// Decodes from the directory's tagged-Point JSON representation.
    /// `decode(encode(x)) == x` for any `MapAndMeta` with valid fields.
    pub fn decode(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let tagged: TaggedMapAndMeta = serde_json::from_value(value)?;
        Ok(MapAndMeta {
            map: tagged.map,
            meta: MapMeta {
                version: tagged.meta.version,
                points_of_interest: tagged
                    .meta
                    .points_of_interest
                    .into_iter()
                    .map(|(k, points)| (k, points.into_iter().map(Point::from).collect()))
                    .collect(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn sample() -> MapAndMeta {
        let mut poi = HashMap::new();
        poi.insert(CellType::Spawn, vec![Point::new(0, 0), Point::new(3, 3)]);
        MapAndMeta {
            map: vec![vec![Cell::empty(); 4]; 4],
            meta: MapMeta { version: 1, points_of_interest: poi },
        }
    }

    #[test]
    fn roundtrips_through_tagged_encoding() {
        let original = sample();
        let encoded = original.encode();
        assert_eq!(encoded["meta"]["points_of_interest"]["spawn"][0]["type"], "Point");
        let decoded = MapAndMeta::decode(encoded).unwrap();
        assert_eq!(decoded, original);
    }
}

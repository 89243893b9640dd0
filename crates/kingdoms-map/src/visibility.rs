use fixedbitset::FixedBitSet;

use crate::point::Point;

const NEIGHBOR_OFFSETS: [(isize, isize); 9] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 0), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

fn index_of(p: Point, width: usize) -> usize {
    p.row * width + p.col
}

fn point_of(index: usize, width: usize) -> Point {
    Point::new(index / width, index % width)
}

fn in_bounds(row: isize, col: isize, height: usize, width: usize) -> bool {
    row >= 0 && col >= 0 && (row as usize) < height && (col as usize) < width
}

/// The 3x3-neighborhood fog-of-war mask for one player, derived each tick
/// from their current territory. `update` recomputes the neighborhood from
/// scratch (territory can shrink as well as grow) and returns only the
/// cells that changed state, so the caller can patch a player's `pov`
/// incrementally instead of re-copying the whole map every tick.
#[derive(Debug, Clone)]
pub struct Visibility {
    height: usize,
    width: usize,
    mask: FixedBitSet,
}

impl Visibility {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width, mask: FixedBitSet::with_capacity(height * width) }
    }

    /// Recomputes visibility from `territory_points` and returns the
    /// symmetric difference (cells that became visible or became hidden)
    /// against the previous call.
    pub fn update(&mut self, territory_points: impl IntoIterator<Item = Point>) -> Vec<Point> {
        let mut next = FixedBitSet::with_capacity(self.height * self.width);
        for p in territory_points {
            for (dr, dc) in NEIGHBOR_OFFSETS {
                let (nr, nc) = (p.row as isize + dr, p.col as isize + dc);
                if in_bounds(nr, nc, self.height, self.width) {
                    next.insert(index_of(Point::new(nr as usize, nc as usize), self.width));
                }
            }
        }

        let mut diff = next.clone();
        diff.symmetric_difference_with(&self.mask);
        let diff_points = diff.ones().map(|i| point_of(i, self.width)).collect();

        self.mask = next;
        diff_points
    }

    pub fn visible_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.mask.ones().map(move |i| point_of(i, self.width))
    }

    pub fn is_visible(&self, p: Point) -> bool {
        self.mask.contains(index_of(p, self.width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_covers_3x3_neighborhood() {
        let mut v = Visibility::new(4, 4);
        let diff = v.update([Point::new(1, 1)]);
        assert_eq!(diff.len(), 9);
        assert!(v.is_visible(Point::new(0, 0)));
        assert!(v.is_visible(Point::new(2, 2)));
        assert!(!v.is_visible(Point::new(3, 3)));
    }

    #[test]
    fn update_clips_at_map_edges() {
        let mut v = Visibility::new(4, 4);
        let diff = v.update([Point::new(0, 0)]);
        // corner: only 4 of the 9 neighbors are in-bounds
        assert_eq!(diff.len(), 4);
    }

    #[test]
    fn second_update_returns_only_changed_cells() {
        let mut v = Visibility::new(4, 4);
        v.update([Point::new(1, 1)]);
        // same territory again: nothing changes
        let diff = v.update([Point::new(1, 1)]);
        assert!(diff.is_empty());
    }

    #[test]
    fn shrinking_territory_reports_cells_leaving_visibility() {
        let mut v = Visibility::new(4, 4);
        v.update([Point::new(1, 1), Point::new(2, 2)]);
        let diff = v.update([Point::new(1, 1)]);
        // cells only reachable from (2,2), e.g. (3,3), should now be absent
        assert!(diff.iter().any(|p| *p == Point::new(3, 3)));
        assert!(!v.is_visible(Point::new(3, 3)));
    }
}

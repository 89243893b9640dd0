use fixedbitset::FixedBitSet;

use crate::point::Point;

/// Row-major index into a flat `width * height` bitmap. Shared by
/// [`Territory`] and [`Visibility`] so both address the same map with the
/// same `row * width + col` convention the design notes call for.
fn index_of(p: Point, width: usize) -> usize {
    p.row * width + p.col
}

fn point_of(index: usize, width: usize) -> Point {
    Point::new(index / width, index % width)
}

/// A player's set of owned cells, represented as a fixed-size bitmap sized
/// to the map (`width * height` bits) rather than a `HashSet<Point>`. Union
/// (kingdom takeover), batched mutation (one tick's worth of captures), and
/// membership testing are then single word-at-a-time bitmap operations
/// instead of per-point hashing.
#[derive(Debug, Clone)]
pub struct Territory {
    width: usize,
    mask: FixedBitSet,
    pending_add: Vec<Point>,
    pending_remove: Vec<Point>,
}

impl Territory {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            width,
            mask: FixedBitSet::with_capacity(height * width),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
        }
    }

    pub fn add_point(&mut self, p: Point) {
        self.mask.insert(index_of(p, self.width));
    }

    pub fn remove_point(&mut self, p: Point) {
        self.mask.set(index_of(p, self.width), false);
    }

    /// Queues a point for addition; applied by [`Self::apply_batch_updates`].
    /// Mirrors the original's `batch_add_points` / `apply_batch_updates`
    /// split, which exists so a tick's worth of captures can be queued up
    /// while territory membership is still being read for other players'
    /// takeover checks within the same turn.
    pub fn batch_add_points(&mut self, points: impl IntoIterator<Item = Point>) {
        self.pending_add.extend(points);
    }

    pub fn batch_remove_points(&mut self, points: impl IntoIterator<Item = Point>) {
        self.pending_remove.extend(points);
    }

    pub fn apply_batch_updates(&mut self) {
        for p in self.pending_add.drain(..) {
            self.mask.insert(index_of(p, self.width));
        }
        for p in self.pending_remove.drain(..) {
            self.mask.set(index_of(p, self.width), false);
        }
    }

    /// Unions `other` into `self` and clears `other` — used when a captured
    /// kingdom's territory is absorbed by its captor.
    pub fn merge(&mut self, other: &mut Territory) {
        self.mask.union_with(&other.mask);
        other.mask.clear();
    }

    pub fn contains(&self, p: Point) -> bool {
        self.mask.contains(index_of(p, self.width))
    }

    pub fn clear(&mut self) {
        self.mask.clear();
    }

    pub fn count(&self) -> usize {
        self.mask.count_ones(..)
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.mask.ones().map(move |i| point_of(i, self.width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_contains() {
        let mut t = Territory::new(4, 4);
        t.add_point(Point::new(1, 2));
        assert!(t.contains(Point::new(1, 2)));
        assert!(!t.contains(Point::new(2, 1)));
        assert_eq!(t.count(), 1);
    }

    #[test]
    fn batch_updates_apply_atomically() {
        let mut t = Territory::new(4, 4);
        t.add_point(Point::new(0, 0));
        t.batch_add_points([Point::new(0, 1), Point::new(0, 2)]);
        t.batch_remove_points([Point::new(0, 0)]);
        // not yet applied
        assert!(t.contains(Point::new(0, 0)));
        assert!(!t.contains(Point::new(0, 1)));

        t.apply_batch_updates();
        assert!(!t.contains(Point::new(0, 0)));
        assert!(t.contains(Point::new(0, 1)));
        assert!(t.contains(Point::new(0, 2)));
    }

    #[test]
    fn merge_unions_and_clears_other() {
        let mut a = Territory::new(4, 4);
        let mut b = Territory::new(4, 4);
        a.add_point(Point::new(0, 0));
        b.add_point(Point::new(1, 1));
        a.merge(&mut b);
        assert!(a.contains(Point::new(0, 0)));
        assert!(a.contains(Point::new(1, 1)));
        assert_eq!(b.count(), 0);
    }

    #[test]
    fn points_iterates_all_owned_cells() {
        let mut t = Territory::new(4, 4);
        t.add_point(Point::new(0, 0));
        t.add_point(Point::new(3, 3));
        let mut pts: Vec<_> = t.points().collect();
        pts.sort_by_key(|p| (p.row, p.col));
        assert_eq!(pts, vec![Point::new(0, 0), Point::new(3, 3)]);
    }
}

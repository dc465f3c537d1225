use std::ops::Sub;

use super::{FloatType, WorldBox, WorldPoint};

#[derive(Clone, Debug, PartialEq)]
pub struct AABB<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> AABB<Point> {
    pub fn new(min: Point, max: Point) -> AABB<Point> {
        AABB { min, max }
    }
}

impl<Point: Sub + Copy> AABB<Point> {
    pub fn size(&self) -> Point::Output {
        self.max - self.min
    }
}

impl WorldBox {
    /// Box that contains nothing, neutral element of `merge`.
    /// Its min corner is +inf and max corner is -inf.
    pub fn empty() -> WorldBox {
        WorldBox {
            min: WorldPoint::new(
                FloatType::INFINITY,
                FloatType::INFINITY,
                FloatType::INFINITY,
            ),
            max: WorldPoint::new(
                FloatType::NEG_INFINITY,
                FloatType::NEG_INFINITY,
                FloatType::NEG_INFINITY,
            ),
        }
    }

    /// Returns true if the box has min > max along any axis
    pub fn is_empty(&self) -> bool {
        self.min.iter().zip(self.max.iter()).any(|(min, max)| min > max)
    }

    /// Smallest box containing all the points, None if the iterator is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a WorldPoint>) -> Option<WorldBox> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut ret = WorldBox::new(*first, *first);
        for p in points {
            ret.include_point(p);
        }
        Some(ret)
    }

    pub fn include_point(&mut self, point: &WorldPoint) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn include_box(&mut self, other: &WorldBox) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    pub fn merge(&self, other: &WorldBox) -> WorldBox {
        let mut ret = self.clone();
        ret.include_box(other);
        ret
    }

    /// Inclusive containment test, empty box is contained in everything.
    pub fn contains_box(&self, other: &WorldBox) -> bool {
        other.is_empty()
            || (self.min.iter().zip(other.min.iter()).all(|(a, b)| a <= b)
                && self.max.iter().zip(other.max.iter()).all(|(a, b)| a >= b))
    }

    /// Grows the box by `amount` in every direction.
    pub fn dilate(&self, amount: FloatType) -> WorldBox {
        WorldBox {
            min: self.min.map(|x| x - amount),
            max: self.max.map(|x| x + amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test::{world_box, world_point};

    use assert2::assert;
    use test_strategy::proptest;

    #[test]
    fn empty_box_is_empty() {
        assert!(WorldBox::empty().is_empty());
        assert!(!WorldBox::new(WorldPoint::origin(), WorldPoint::origin()).is_empty());
    }

    #[test]
    fn from_points_empty() {
        assert!(WorldBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn from_points_spans_all_points() {
        let points = [
            WorldPoint::new(1.0, -2.0, 3.0),
            WorldPoint::new(-1.0, 5.0, 0.0),
            WorldPoint::new(0.0, 0.0, 7.0),
        ];
        let b = WorldBox::from_points(&points).unwrap();
        assert!(b.min == WorldPoint::new(-1.0, -2.0, 0.0));
        assert!(b.max == WorldPoint::new(1.0, 5.0, 7.0));
    }

    #[test]
    fn dilate_grows_both_corners() {
        let b = WorldBox::new(WorldPoint::origin(), WorldPoint::new(1.0, 1.0, 1.0)).dilate(0.5);
        assert!(b.min == WorldPoint::new(-0.5, -0.5, -0.5));
        assert!(b.max == WorldPoint::new(1.5, 1.5, 1.5));
    }

    #[proptest]
    fn merge_with_empty_is_identity(#[strategy(world_box())] b: WorldBox) {
        assert!(b.merge(&WorldBox::empty()) == b);
        assert!(WorldBox::empty().merge(&b) == b);
    }

    #[proptest]
    fn merge_contains_both(
        #[strategy(world_box())] a: WorldBox,
        #[strategy(world_box())] b: WorldBox,
    ) {
        let merged = a.merge(&b);
        assert!(merged.contains_box(&a));
        assert!(merged.contains_box(&b));
        assert!(merged == b.merge(&a));
    }

    #[proptest]
    fn include_point_contains_point(
        #[strategy(world_box())] b: WorldBox,
        #[strategy(world_point())] p: WorldPoint,
    ) {
        let mut extended = b.clone();
        extended.include_point(&p);
        assert!(extended.contains_box(&WorldBox::new(p, p)));
        assert!(extended.contains_box(&b));
    }
}

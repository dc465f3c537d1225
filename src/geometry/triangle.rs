use std::ops::Index;

use super::{WorldBox, WorldPoint};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Triangle<Point>([Point; 3]);

impl<Point> Triangle<Point> {
    pub fn new(a: Point, b: Point, c: Point) -> Triangle<Point> {
        Triangle([a, b, c])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.0.iter()
    }

    pub fn map<Point2, F: FnMut(&Point) -> Point2>(&self, mut f: F) -> Triangle<Point2> {
        Triangle([f(&self[0]), f(&self[1]), f(&self[2])])
    }
}

impl<Point> Index<usize> for Triangle<Point> {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<Point> From<[Point; 3]> for Triangle<Point> {
    fn from(value: [Point; 3]) -> Self {
        Triangle(value)
    }
}

impl Triangle<WorldPoint> {
    pub fn bounds(&self) -> WorldBox {
        let mut ret = WorldBox::new(self[0], self[0]);
        ret.include_point(&self[1]);
        ret.include_point(&self[2]);
        ret
    }
}

impl Default for Triangle<WorldPoint> {
    fn default() -> Self {
        Triangle([WorldPoint::origin(); 3])
    }
}

use crate::geometry::{FloatType, Triangle, WorldBox, WorldPoint};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Triangles,
    BezierCurves,
}

/// Geometry group of a scene.
#[derive(Clone, Debug)]
pub enum Geometry {
    Triangles(TriangleMesh),
    BezierCurves(BezierCurves),
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Triangles(_) => GeometryType::Triangles,
            Geometry::BezierCurves(_) => GeometryType::BezierCurves,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Geometry::Triangles(mesh) => mesh.enabled,
            Geometry::BezierCurves(curves) => curves.enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            Geometry::Triangles(mesh) => mesh.enabled = enabled,
            Geometry::BezierCurves(curves) => curves.enabled = enabled,
        }
    }

    /// Visibility mask shared by all primitives of the group.
    pub fn mask(&self) -> u32 {
        match self {
            Geometry::Triangles(mesh) => mesh.mask,
            Geometry::BezierCurves(curves) => curves.mask,
        }
    }

    pub fn primitive_count(&self) -> usize {
        match self {
            Geometry::Triangles(mesh) => mesh.triangles.len(),
            Geometry::BezierCurves(curves) => curves.curves.len(),
        }
    }

    /// Bounding box of a single primitive
    pub fn bounds(&self, prim_id: usize) -> WorldBox {
        match self {
            Geometry::Triangles(mesh) => mesh.triangle(prim_id).bounds(),
            Geometry::BezierCurves(curves) => curves.bounds(prim_id),
        }
    }

    pub fn as_triangles(&self) -> Option<&TriangleMesh> {
        match self {
            Geometry::Triangles(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_curves(&self) -> Option<&BezierCurves> {
        match self {
            Geometry::BezierCurves(curves) => Some(curves),
            _ => None,
        }
    }
}

impl From<TriangleMesh> for Geometry {
    fn from(value: TriangleMesh) -> Self {
        Geometry::Triangles(value)
    }
}

impl From<BezierCurves> for Geometry {
    fn from(value: BezierCurves) -> Self {
        Geometry::BezierCurves(value)
    }
}

/// Indexed triangle mesh.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    pub vertices: Vec<WorldPoint>,
    pub triangles: Vec<Triangle<u32>>,
    pub enabled: bool,
    pub mask: u32,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<WorldPoint>, triangles: Vec<Triangle<u32>>) -> TriangleMesh {
        debug_assert!(
            triangles
                .iter()
                .flat_map(|t| t.iter())
                .all(|&i| (i as usize) < vertices.len()),
            "vertex index out of range"
        );
        TriangleMesh {
            vertices,
            triangles,
            enabled: true,
            mask: u32::MAX,
        }
    }

    pub fn triangle(&self, prim_id: usize) -> Triangle<WorldPoint> {
        self.triangles[prim_id].map(|&i| self.vertices[i as usize])
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveVertex {
    pub position: WorldPoint,
    pub radius: FloatType,
}

/// Cubic Bézier curves (hair), each defined by 4 consecutive control vertices.
#[derive(Clone, Debug)]
pub struct BezierCurves {
    pub vertices: Vec<CurveVertex>,
    /// Index of the first control vertex of each curve
    pub curves: Vec<u32>,
    pub enabled: bool,
    pub mask: u32,
}

impl BezierCurves {
    pub const CONTROL_POINTS: usize = 4;

    pub fn new(vertices: Vec<CurveVertex>, curves: Vec<u32>) -> BezierCurves {
        debug_assert!(
            curves
                .iter()
                .all(|&i| i as usize + Self::CONTROL_POINTS <= vertices.len()),
            "curve control points out of range"
        );
        BezierCurves {
            vertices,
            curves,
            enabled: true,
            mask: u32::MAX,
        }
    }

    /// Index of the first control vertex of the curve
    pub fn curve(&self, prim_id: usize) -> u32 {
        self.curves[prim_id]
    }

    pub fn control_points(&self, prim_id: usize) -> &[CurveVertex] {
        let first = self.curve(prim_id) as usize;
        &self.vertices[first..first + Self::CONTROL_POINTS]
    }

    /// Curve lies within the convex hull of its control points, widened by the largest radius.
    pub fn bounds(&self, prim_id: usize) -> WorldBox {
        let points = self.control_points(prim_id);
        let max_radius = points.iter().map(|p| p.radius).fold(0.0, FloatType::max);
        WorldBox::from_points(points.iter().map(|p| &p.position))
            .unwrap_or_else(WorldBox::empty)
            .dilate(max_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test::{curve_row, triangle_row};

    use assert2::assert;

    #[test]
    fn triangle_bounds() {
        let mesh = Geometry::from(triangle_row(3, 3.0, 2.0));
        assert!(mesh.primitive_count() == 3);
        let b = mesh.bounds(1);
        assert!(b.min == WorldPoint::new(2.0, -1.0, 2.0));
        assert!(b.max == WorldPoint::new(4.0, 1.0, 2.0));
    }

    #[test]
    fn curve_bounds_include_radius() {
        let curves = Geometry::from(curve_row(2, 0.25));
        assert!(curves.primitive_count() == 2);
        let b = curves.bounds(1);
        assert!(b.min == WorldPoint::new(0.75, -0.25, -0.25));
        assert!(b.max == WorldPoint::new(4.25, 1.75, 0.25));
    }

    #[test]
    fn enabling_and_types() {
        let mut g = Geometry::from(curve_row(1, 0.1));
        assert!(g.geometry_type() == GeometryType::BezierCurves);
        assert!(g.as_triangles().is_none());
        assert!(g.is_enabled());
        g.set_enabled(false);
        assert!(!g.is_enabled());
        assert!(g.mask() == u32::MAX);
    }
}

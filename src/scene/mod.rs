mod geometry;
mod obj;

pub use geometry::{BezierCurves, CurveVertex, Geometry, GeometryType, TriangleMesh};
pub use obj::ObjOpenError;

use index_vec::IndexVec;

index_vec::define_index_type! {
    pub struct GeometryId = u32;
    IMPL_RAW_CONVERSIONS = true;
}

/// Read-only view of the geometry groups of a scene.
///
/// Group ids are dense, but a slot may be empty (removed geometry).
pub trait SceneView: Sync {
    fn group_count(&self) -> usize;

    fn group(&self, id: GeometryId) -> Option<&Geometry>;

    /// Iterates over enabled groups of the given type in id order.
    /// Empty slots, disabled groups and groups of other types are skipped.
    fn groups_of_type(
        &self,
        geometry_type: GeometryType,
    ) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        (0..self.group_count())
            .map(GeometryId::from_usize)
            .filter_map(move |id| {
                self.group(id)
                    .filter(|g| g.geometry_type() == geometry_type && g.is_enabled())
                    .map(|g| (id, g))
            })
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    groups: IndexVec<GeometryId, Option<Geometry>>,
}

impl Scene {
    pub fn new() -> Scene {
        Scene::default()
    }

    pub fn add(&mut self, geometry: impl Into<Geometry>) -> GeometryId {
        self.groups.push(Some(geometry.into()))
    }

    /// Removes a group, leaving an empty slot so that other ids stay valid.
    pub fn remove(&mut self, id: GeometryId) -> Option<Geometry> {
        self.groups.get_mut(id)?.take()
    }

    pub fn group_mut(&mut self, id: GeometryId) -> Option<&mut Geometry> {
        self.groups.get_mut(id)?.as_mut()
    }
}

impl SceneView for Scene {
    fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn group(&self, id: GeometryId) -> Option<&Geometry> {
        self.groups.get(id)?.as_ref()
    }
}

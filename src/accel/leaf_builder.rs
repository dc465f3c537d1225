use assert2::debug_assert;

use super::prim_ref::PrimRef;
use crate::{
    geometry::{Triangle, WorldPoint},
    scene::{Geometry, GeometryId, GeometryType, SceneView},
    scheduler::{DispatchError, TaskScheduler, partition, split_for_workers},
};

/// Primitive data stored in leaves of an acceleration structure.
pub trait LeafPrimitive: Default + Clone + Send + Sync {
    const GEOMETRY_TYPE: GeometryType;

    /// Gathers the data of a primitive.
    /// Panics if the geometry is not of `GEOMETRY_TYPE` or `prim_id` is out of range.
    fn from_geometry(geometry: &Geometry, geom_id: GeometryId, prim_id: u32) -> Self;
}

/// Triangle with an inline copy of its vertices.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TriangleRecord {
    pub vertices: Triangle<WorldPoint>,
    pub geom_id: u32,
    pub prim_id: u32,
    pub mask: u32,
}

impl LeafPrimitive for TriangleRecord {
    const GEOMETRY_TYPE: GeometryType = GeometryType::Triangles;

    fn from_geometry(geometry: &Geometry, geom_id: GeometryId, prim_id: u32) -> Self {
        let Geometry::Triangles(mesh) = geometry else {
            panic!("Geometry {geom_id:?} is not a triangle mesh");
        };
        TriangleRecord {
            vertices: mesh.triangle(prim_id as usize),
            geom_id: geom_id.raw(),
            prim_id,
            mask: mesh.mask,
        }
    }
}

/// Bézier curve referencing its control vertices inside the geometry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct CurveRecord {
    /// Index of the first of the 4 control vertices
    pub vertex: u32,
    pub geom_id: u32,
    pub prim_id: u32,
    pub mask: u32,
}

impl LeafPrimitive for CurveRecord {
    const GEOMETRY_TYPE: GeometryType = GeometryType::BezierCurves;

    fn from_geometry(geometry: &Geometry, geom_id: GeometryId, prim_id: u32) -> Self {
        let Geometry::BezierCurves(curves) = geometry else {
            panic!("Geometry {geom_id:?} is not a curve set");
        };
        CurveRecord {
            vertex: curves.curve(prim_id as usize),
            geom_id: geom_id.raw(),
            prim_id,
            mask: curves.mask,
        }
    }
}

/// Converts ordered primitive references into leaf records, one record per reference.
///
/// Every geometry referenced by the references must stay alive, enabled and unchanged
/// from the reference build until this builder finishes.
pub struct LeafBuilder<'a, S: SceneView> {
    scene: &'a S,
    prims: &'a [PrimRef],
}

impl<'a, S: SceneView> LeafBuilder<'a, S> {
    pub fn new(scene: &'a S, prims: &'a [PrimRef]) -> Self {
        LeafBuilder { scene, prims }
    }

    pub fn build<P: LeafPrimitive>(
        &self,
        scheduler: &impl TaskScheduler,
    ) -> Result<Vec<P>, DispatchError> {
        if self.prims.is_empty() {
            return Ok(Vec::new());
        }

        let thread_count = scheduler.thread_count();
        log::debug!(
            "Building {} leaf records with {thread_count} workers",
            self.prims.len()
        );

        let mut records = vec![P::default(); self.prims.len()];
        let chunks = split_for_workers(&mut records, thread_count);

        scheduler.dispatch(|thread_index, thread_count| {
            let mut chunk = chunks[thread_index].lock().expect("Poisoned lock!");
            self.build_range(thread_index, thread_count, &mut chunk);
        })?;
        drop(chunks);

        Ok(records)
    }

    /// Fills records of one worker's range, `out` must be exactly as long as the range.
    pub fn build_range<P: LeafPrimitive>(
        &self,
        thread_index: usize,
        thread_count: usize,
        out: &mut [P],
    ) {
        let range = partition(self.prims.len(), thread_index, thread_count);
        debug_assert!(out.len() == range.len());

        for (prim, slot) in self.prims[range].iter().zip(out) {
            let geom_id = prim.geom_id();
            let geometry = self
                .scene
                .group(geom_id)
                .unwrap_or_else(|| panic!("Referenced geometry {geom_id:?} was removed"));
            debug_assert!(geometry.is_enabled());
            debug_assert!(geometry.geometry_type() == P::GEOMETRY_TYPE);

            *slot = P::from_geometry(geometry, geom_id, prim.prim_id());
        }
    }
}

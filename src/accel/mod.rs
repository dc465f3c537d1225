mod leaf_builder;
mod prim_ref;
mod reference_builder;
mod topology;

pub use leaf_builder::{CurveRecord, LeafBuilder, LeafPrimitive, TriangleRecord};
pub use prim_ref::{AtomicBounds, CentroidSceneBounds, PrimRef};
pub use reference_builder::{PrimRefBuilder, PrimRefs};
pub use topology::{MortonTopology, Topology};

use std::ops::Range;

use thiserror::Error;

use crate::{
    AccelSettings,
    geometry::{PacketFloat, RayPacket, TriangleIntersector},
    scene::SceneView,
    scheduler::{DispatchError, TaskScheduler},
    util::Stats,
};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Parallel build failed: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Flat list of leaves built from all primitives of one type in a scene.
#[derive(Clone, Debug)]
pub struct LeafAccel<P: LeafPrimitive> {
    bounds: CentroidSceneBounds,
    leaves: Vec<Range<usize>>,
    records: Vec<P>,
}

impl<P: LeafPrimitive> LeafAccel<P> {
    /// Builds on worker threads, with leaves ordered along a Morton curve.
    pub fn build(scene: &impl SceneView, settings: &AccelSettings) -> Result<Self, BuildError> {
        Self::build_with(
            scene,
            &settings.scheduler(),
            &MortonTopology::new(settings.max_leaf_size),
        )
    }

    pub fn build_with(
        scene: &impl SceneView,
        scheduler: &impl TaskScheduler,
        topology: &impl Topology,
    ) -> Result<Self, BuildError> {
        let builder = PrimRefBuilder::new(scene, P::GEOMETRY_TYPE);
        if builder.count() == 0 {
            log::info!("No {:?} primitives in the scene", P::GEOMETRY_TYPE);
            return Ok(LeafAccel {
                bounds: CentroidSceneBounds::empty(),
                leaves: Vec::new(),
                records: Vec::new(),
            });
        }

        let PrimRefs { mut prims, bounds } = builder.build(scheduler)?;
        let leaves = topology.order(&mut prims, &bounds);
        debug_assert!(leaves.last().is_some_and(|leaf| leaf.end == prims.len()));

        let records = LeafBuilder::new(scene, &prims).build(scheduler)?;

        log::info!(
            "Built {} leaves with {} {:?} primitives",
            leaves.len(),
            records.len(),
            P::GEOMETRY_TYPE
        );

        Ok(LeafAccel {
            bounds,
            leaves,
            records,
        })
    }

    pub fn bounds(&self) -> &CentroidSceneBounds {
        &self.bounds
    }

    pub fn records(&self) -> &[P] {
        &self.records
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn leaf(&self, index: usize) -> &[P] {
        &self.records[self.leaves[index].clone()]
    }

    pub fn leaves(&self) -> impl Iterator<Item = &[P]> {
        self.leaves.iter().map(|range| &self.records[range.clone()])
    }

    /// Leaf fill statistics
    pub fn statistics(&self) -> Stats {
        self.leaves.iter().map(|range| range.len()).collect()
    }

    pub fn print_statistics(&self) {
        println!("Primitive count: {}", self.records.len());
        println!("Leaf count: {}", self.leaf_count());
        println!("Leaf nodes fill: {}", self.statistics());
    }
}

impl LeafAccel<TriangleRecord> {
    /// Nearest hits of active lanes with every triangle.
    pub fn intersect<T: PacketFloat>(
        &self,
        intersector: &TriangleIntersector,
        valid: T::SimdBool,
        packet: &mut RayPacket<T>,
    ) {
        for leaf in self.leaves() {
            intersector.intersect(valid, packet, leaf);
        }
    }

    /// Returns lanes that are occluded or were not active.
    pub fn occluded<T: PacketFloat>(
        &self,
        intersector: &TriangleIntersector,
        valid: T::SimdBool,
        packet: &RayPacket<T>,
    ) -> T::SimdBool {
        intersector.occluded_containers(valid, packet, self.leaves())
    }
}

use assert2::debug_assert;

use super::prim_ref::{AtomicBounds, CentroidSceneBounds, PrimRef};
use crate::{
    scene::{GeometryType, SceneView},
    scheduler::{DispatchError, TaskScheduler, partition, split_for_workers},
};

/// References of all primitives of a single type, with their bounds.
#[derive(Clone, Debug, Default)]
pub struct PrimRefs {
    pub prims: Vec<PrimRef>,
    pub bounds: CentroidSceneBounds,
}

/// Creates one `PrimRef` per primitive of enabled geometry groups of a given type,
/// in group order.
pub struct PrimRefBuilder<'a, S: SceneView> {
    scene: &'a S,
    geometry_type: GeometryType,
    count: usize,
}

impl<'a, S: SceneView> PrimRefBuilder<'a, S> {
    pub fn new(scene: &'a S, geometry_type: GeometryType) -> Self {
        let count = scene
            .groups_of_type(geometry_type)
            .map(|(_, geometry)| geometry.primitive_count())
            .sum();
        PrimRefBuilder {
            scene,
            geometry_type,
            count,
        }
    }

    /// Total number of primitives that will be referenced.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn build(&self, scheduler: &impl TaskScheduler) -> Result<PrimRefs, DispatchError> {
        if self.count == 0 {
            log::debug!("No {:?} primitives, skipping reference build", self.geometry_type);
            return Ok(PrimRefs::default());
        }

        let thread_count = scheduler.thread_count();
        log::debug!(
            "Building {} {:?} references with {thread_count} workers",
            self.count,
            self.geometry_type
        );

        let mut prims = vec![PrimRef::default(); self.count];
        let bounds = AtomicBounds::new();
        let chunks = split_for_workers(&mut prims, thread_count);

        scheduler.dispatch(|thread_index, thread_count| {
            let mut chunk = chunks[thread_index].lock().expect("Poisoned lock!");
            self.build_range(thread_index, thread_count, &mut chunk, &bounds);
        })?;
        drop(chunks);

        Ok(PrimRefs {
            prims,
            bounds: bounds.load(),
        })
    }

    /// Fills the references of one worker's range and merges their bounds into `bounds`.
    /// `out` must be exactly as long as the worker's range.
    pub fn build_range(
        &self,
        thread_index: usize,
        thread_count: usize,
        mut out: &mut [PrimRef],
        bounds: &AtomicBounds,
    ) {
        let range = partition(self.count, thread_index, thread_count);
        debug_assert!(out.len() == range.len());
        if range.is_empty() {
            return;
        }

        // Find the group containing the first primitive of the range
        let mut groups = self.scene.groups_of_type(self.geometry_type);
        let mut prefix = 0;
        let mut first = None;
        for (geom_id, geometry) in groups.by_ref() {
            let count = geometry.primitive_count();
            if range.start < prefix + count {
                first = Some((geom_id, geometry));
                break;
            }
            prefix += count;
        }

        let mut local = CentroidSceneBounds::empty();
        let mut offset = range.start - prefix;

        for (geom_id, geometry) in first.into_iter().chain(groups) {
            let count = geometry.primitive_count();
            for (prim_id, slot) in (offset..count).zip(out.iter_mut()) {
                *slot = PrimRef::new(&geometry.bounds(prim_id), geom_id, prim_id as u32);
                local.extend(slot);
            }
            let written = (count - offset).min(out.len());
            out = &mut std::mem::take(&mut out)[written..];
            if out.is_empty() {
                break;
            }
            offset = 0;
        }
        debug_assert!(out.is_empty(), "scene changed while building references");

        bounds.extend_atomic(&local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::{WorldBox, WorldPoint},
        scene::{GeometryId, Scene, SceneView as _, test::mixed_scene},
        scheduler::{SequentialScheduler, ThreadScheduler, WorkerCount},
    };

    use assert2::{assert, let_assert};
    use std::{
        num::NonZeroUsize,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use test_case::test_case;
    use test_strategy::proptest;

    /// Reference list computed directly from the scene, in group order.
    fn expected_prims(scene: &Scene, geometry_type: GeometryType) -> Vec<PrimRef> {
        scene
            .groups_of_type(geometry_type)
            .flat_map(|(geom_id, geometry)| {
                (0..geometry.primitive_count())
                    .map(move |i| PrimRef::new(&geometry.bounds(i), geom_id, i as u32))
            })
            .collect()
    }

    struct CountingScheduler {
        dispatches: AtomicUsize,
    }

    impl TaskScheduler for CountingScheduler {
        fn thread_count(&self) -> usize {
            4
        }

        fn dispatch<F>(&self, worker: F) -> Result<(), DispatchError>
        where
            F: Fn(usize, usize) + Sync,
        {
            self.dispatches.fetch_add(1, Ordering::Relaxed);
            SequentialScheduler::new(4).dispatch(worker)
        }
    }

    #[test_case(GeometryType::Triangles, 10 ; "triangles")]
    #[test_case(GeometryType::BezierCurves, 6 ; "curves")]
    fn count_skips_unusable_groups(geometry_type: GeometryType, expected: usize) {
        let scene = mixed_scene();
        assert!(PrimRefBuilder::new(&scene, geometry_type).count() == expected);
    }

    #[proptest]
    fn crosses_group_boundaries(#[strategy(1usize..24)] thread_count: usize) {
        let scene = mixed_scene();
        let builder = PrimRefBuilder::new(&scene, GeometryType::Triangles);
        let_assert!(Ok(refs) = builder.build(&SequentialScheduler::new(thread_count)));

        let expected = expected_prims(&scene, GeometryType::Triangles);
        assert!(refs.prims == expected);
        assert!(refs.bounds == expected.iter().collect::<CentroidSceneBounds>());
    }

    #[test]
    fn owner_ids_resolve_to_primitives() {
        let scene = mixed_scene();
        let builder = PrimRefBuilder::new(&scene, GeometryType::BezierCurves);
        let_assert!(Ok(refs) = builder.build(&SequentialScheduler::new(3)));

        let ids: Vec<_> = refs
            .prims
            .iter()
            .map(|p| (p.geom_id().index(), p.prim_id()))
            .collect();
        assert!(ids == vec![(1, 0), (1, 1), (1, 2), (1, 3), (6, 0), (6, 1)]);
        for prim in &refs.prims {
            let_assert!(Some(geometry) = scene.group(prim.geom_id()));
            assert!(prim.bounds() == geometry.bounds(prim.prim_id() as usize));
        }
    }

    #[test_case(1)]
    #[test_case(3)]
    #[test_case(16)]
    fn concurrent_matches_sequential(thread_count: usize) {
        let mut scene = Scene::new();
        for i in 0..20 {
            scene.add(crate::scene::test::triangle_row(i * 7 % 13, 2.5, i as f32));
        }
        let builder = PrimRefBuilder::new(&scene, GeometryType::Triangles);

        let scheduler = ThreadScheduler::new(
            WorkerCount::Manual(NonZeroUsize::new(thread_count).unwrap()),
            false,
        );
        let_assert!(Ok(concurrent) = builder.build(&scheduler));
        let_assert!(Ok(sequential) = builder.build(&SequentialScheduler::new(1)));

        assert!(concurrent.prims == sequential.prims);
        assert!(concurrent.bounds == sequential.bounds);
    }

    #[test]
    fn bounds_cover_scene() {
        let scene = mixed_scene();
        let builder = PrimRefBuilder::new(&scene, GeometryType::Triangles);
        let_assert!(Ok(refs) = builder.build(&SequentialScheduler::new(2)));

        // Row of 5 triangles at z = 4 is the widest enabled group
        assert!(refs.bounds.geometry.min == WorldPoint::new(-1.0, -1.0, 0.0));
        assert!(refs.bounds.geometry.max == WorldPoint::new(13.0, 1.0, 5.0));
        // Doubled centroids
        assert!(refs.bounds.centroid2.min == WorldPoint::new(0.0, 0.0, 0.0));
        assert!(refs.bounds.centroid2.max == WorldPoint::new(24.0, 0.0, 10.0));
    }

    #[test]
    fn empty_scene_skips_dispatch() {
        let mut scene = mixed_scene();
        for id in [0, 3, 5, 7] {
            scene.remove(GeometryId::from_usize(id));
        }

        let scheduler = CountingScheduler {
            dispatches: AtomicUsize::new(0),
        };
        let builder = PrimRefBuilder::new(&scene, GeometryType::Triangles);
        assert!(builder.count() == 0);

        let_assert!(Ok(refs) = builder.build(&scheduler));
        assert!(refs.prims.is_empty());
        assert!(refs.bounds.is_empty());
        assert!(refs.bounds.geometry == WorldBox::empty());
        assert!(scheduler.dispatches.load(Ordering::Relaxed) == 0);

        let builder = PrimRefBuilder::new(&scene, GeometryType::BezierCurves);
        let_assert!(Ok(_) = builder.build(&scheduler));
        assert!(scheduler.dispatches.load(Ordering::Relaxed) == 1);
    }
}

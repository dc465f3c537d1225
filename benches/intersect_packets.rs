use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng as _, SeedableRng as _, rngs::SmallRng};
use raystage::{
    AccelSettings, LeafAccel, Scene,
    accel::TriangleRecord,
    geometry::{
        Ray, RayPacket8, SimdMaskType, Triangle, TriangleIntersector, WorldPoint, WorldVector,
    },
    scene::TriangleMesh,
};

/// Height field of `size` x `size` quads, two triangles each.
fn grid_scene(size: u32) -> Scene {
    let vertices = (0..=size)
        .flat_map(|y| {
            (0..=size).map(move |x| {
                let height = ((x as f32) * 0.3).sin() * ((y as f32) * 0.2).cos();
                WorldPoint::new(x as f32, y as f32, height)
            })
        })
        .collect();
    let index = |x: u32, y: u32| y * (size + 1) + x;
    let triangles = (0..size)
        .flat_map(|y| (0..size).map(move |x| (x, y)))
        .flat_map(|(x, y)| {
            [
                Triangle::new(index(x, y), index(x + 1, y), index(x + 1, y + 1)),
                Triangle::new(index(x, y), index(x + 1, y + 1), index(x, y + 1)),
            ]
        })
        .collect();

    let mut scene = Scene::new();
    scene.add(TriangleMesh::new(vertices, triangles));
    scene
}

fn random_packets(count: usize, size: u32) -> Vec<(RayPacket8, SimdMaskType)> {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let size = size as f32;
    let rays: Vec<_> = (0..count)
        .map(|_| {
            let origin = WorldPoint::new(
                rng.random_range(0.0..size),
                rng.random_range(0.0..size),
                5.0,
            );
            let direction = WorldVector::new(
                rng.random_range(-0.2..0.2),
                rng.random_range(-0.2..0.2),
                -1.0,
            );
            Ray::new(origin, direction)
        })
        .collect();
    RayPacket8::from_rays(rays).collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    const SIZE: u32 = 16;

    let scene = grid_scene(SIZE);
    let accel = LeafAccel::<TriangleRecord>::build(&scene, &AccelSettings::default()).unwrap();
    let packets = random_packets(256, SIZE);
    let intersector = TriangleIntersector::default();

    c.bench_function("intersect_packets", |b| {
        b.iter_batched(
            || packets.clone(),
            |mut packets| {
                for (packet, valid) in packets.iter_mut() {
                    accel.intersect(&intersector, *valid, packet);
                }
                packets
            },
            criterion::BatchSize::SmallInput,
        )
    });

    c.bench_function("occluded_packets", |b| {
        b.iter(|| {
            for (packet, valid) in &packets {
                black_box(accel.occluded(&intersector, *valid, packet));
            }
        })
    });

    c.bench_function("build_leaf_accel", |b| {
        b.iter(|| LeafAccel::<TriangleRecord>::build(black_box(&scene), &AccelSettings::default()))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

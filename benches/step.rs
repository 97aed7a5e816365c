//! Benchmarks for the CPU side of the simulation.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flowfield::flow::{FlowFieldParams, StepConstants};
use flowfield::kernel::StepUniforms;
use flowfield::loader::MeshData;
use flowfield::noise::noise3;
use flowfield::sampler::sample_geometry;
use flowfield::software::SoftwareSimulation;

fn sphere_mesh(count: usize) -> MeshData {
    let mut rng = StdRng::seed_from_u64(42);
    let positions = (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize_or_zero()
                * 3.0
        })
        .collect();
    MeshData::from_positions(positions)
}

fn bench_noise(c: &mut Criterion) {
    c.bench_function("noise3", |b| {
        let p = Vec3::new(0.3, 1.7, -2.2);
        b.iter(|| black_box(noise3(black_box(p))))
    });
}

fn bench_software_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("software_step");
    let flow = FlowFieldParams::default();
    let constants = StepConstants::default();

    for count in [1_000, 10_000, 50_000] {
        let mesh = sphere_mesh(count);
        let geometry = sample_geometry(&mesh, &mut StdRng::seed_from_u64(7)).unwrap();
        let mut sim = SoftwareSimulation::new(&geometry);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            let mut time = 0.0;
            b.iter(|| {
                time += 1.0 / 60.0;
                let u = StepUniforms::new(time, 1.0 / 60.0, &flow, &constants, sim.grid(), sim.particle_count());
                sim.step(black_box(&u));
            })
        });
    }

    group.finish();
}

fn bench_sample_geometry(c: &mut Criterion) {
    let mesh = sphere_mesh(100_000);
    c.bench_function("sample_geometry_100k", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            black_box(sample_geometry(&mesh, &mut rng).unwrap())
        })
    });
}

criterion_group!(benches, bench_noise, bench_software_step, bench_sample_geometry);
criterion_main!(benches);

//! End-to-end tests of the simulation step on the software backend.
//!
//! These exercise the same per-texel function the compute program runs, from
//! mesh sampling through many frames of stepping.

use flowfield::prelude::*;
use flowfield::render::{sprite_pixel_size, RenderUniforms, Viewport};
use glam::Mat4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_mesh(count: usize, seed: u64) -> MeshData {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions = (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-3.0..3.0),
            )
        })
        .collect();
    MeshData::from_positions(positions)
}

fn geometry(count: usize, seed: u64) -> ParticleGeometry {
    let mesh = random_mesh(count, seed);
    sample_geometry(&mesh, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn uniforms(sim: &SoftwareSimulation, config: &FlowConfig, time: f32, delta_time: f32) -> StepUniforms {
    StepUniforms::new(
        time,
        delta_time,
        &config.flow_field,
        &config.step,
        sim.grid(),
        sim.particle_count(),
    )
}

// ============================================================================
// Grid layout
// ============================================================================

#[test]
fn test_grid_holds_exactly_v_real_texels() {
    for count in [1, 2, 3, 4, 5, 15, 16, 17, 99, 100, 101, 1000] {
        let geometry = geometry(count, count as u64);
        let side = geometry.grid.side() as usize;

        assert_eq!(side, (count as f64).sqrt().ceil() as usize, "V = {}", count);
        assert!(side * side >= count);
        assert_eq!(geometry.base.len(), side * side);
        assert_eq!(geometry.count, count);

        for texel in &geometry.base[count..] {
            assert_eq!(*texel, [0.0; 4], "padding texel not zero for V = {}", count);
        }
    }
}

#[test]
fn test_uv_mapping_is_a_bijection() {
    for count in [1, 7, 64, 250] {
        let geometry = geometry(count, 3);
        let grid = geometry.grid;
        let side = grid.side() as f32;
        let mut seen = vec![false; grid.texel_count()];

        for (i, uv) in geometry.uvs.iter().enumerate() {
            let x = (uv[0] * side).floor() as u32;
            let y = (uv[1] * side).floor() as u32;
            let cell = grid.index(x, y);
            assert_eq!(cell, i, "uv of particle {} does not land on its own texel", i);
            assert!(!seen[cell]);
            seen[cell] = true;
        }
        assert_eq!(seen.iter().filter(|s| **s).count(), count);
    }
}

// ============================================================================
// Step invariants
// ============================================================================

#[test]
fn test_base_positions_never_change() {
    let geometry = geometry(200, 11);
    let mut sim = SoftwareSimulation::new(&geometry);
    let config = FlowConfig::default();

    let mut time = 0.0;
    for _ in 0..120 {
        time += 1.0 / 60.0;
        let u = uniforms(&sim, &config, time, 1.0 / 60.0);
        sim.step(&u);
    }

    assert_eq!(sim.base(), geometry.base.as_slice());
}

#[test]
fn test_life_stays_in_unit_interval() {
    let geometry = geometry(300, 5);
    let mut sim = SoftwareSimulation::new(&geometry);
    let config = FlowConfig::default().with_step_constants(StepConstants {
        respawn_rate: 1.7,
        ..Default::default()
    });

    let mut time = 0.0;
    for frame in 0..200 {
        // Mix of small and large deltas to force many wraps
        let dt = if frame % 7 == 0 { 0.1 } else { 0.016 };
        time += dt;
        let u = uniforms(&sim, &config, time, dt);
        sim.step(&u);

        for i in 0..sim.particle_count() {
            let life = sim.particle(i).w;
            assert!((0.0..1.0).contains(&life), "life {} of particle {} at frame {}", life, i, frame);
        }
    }
}

#[test]
fn test_zero_delta_is_idempotent() {
    let geometry = geometry(64, 21);
    let mut sim = SoftwareSimulation::new(&geometry);
    let config = FlowConfig::default();

    // Move away from the initial state first
    for frame in 1..=10 {
        let u = uniforms(&sim, &config, frame as f32 * 0.05, 0.05);
        sim.step(&u);
    }
    let before = sim.current().to_vec();

    let u = uniforms(&sim, &config, 0.5, 0.0);
    sim.step(&u);

    assert_eq!(sim.current(), before.as_slice());
}

#[test]
fn test_respawn_scenario() {
    // Four vertices on a 2x2 grid with fixed seed lives
    let mesh = MeshData::from_positions(vec![
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
    ]);
    let mut geometry = sample_geometry(&mesh, &mut StdRng::seed_from_u64(0)).unwrap();
    assert_eq!(geometry.grid.side(), 2);

    let lives = [0.9, 0.1, 0.5, 0.99];
    for (texel, life) in geometry.base.iter_mut().zip(lives) {
        texel[3] = life;
    }

    let config = FlowConfig::default().with_step_constants(StepConstants {
        respawn_rate: 1.0,
        ..Default::default()
    });
    let mut sim = SoftwareSimulation::new(&geometry);
    let u = uniforms(&sim, &config, 0.2, 0.2);
    sim.step(&u);

    // Particle 0: 0.9 + 0.2 wraps to 0.1, back on its base position
    let p0 = sim.particle(0);
    assert_eq!(p0.truncate(), geometry.base_position(0));
    assert!((p0.w - 0.1).abs() < 1e-5, "life {}", p0.w);

    // Particle 3: 0.99 + 0.2 wraps to 0.19
    let p3 = sim.particle(3);
    assert_eq!(p3.truncate(), geometry.base_position(3));
    assert!((p3.w - 0.19).abs() < 1e-5, "life {}", p3.w);

    // Particles 1 and 2 age without respawning
    let max_travel = config.flow_field.strength * 0.2 + 1e-4;
    for (i, expected) in [(1, 0.3), (2, 0.7)] {
        let p = sim.particle(i);
        assert!((p.w - expected).abs() < 1e-5, "life of particle {} is {}", i, p.w);
        assert!((p.truncate() - geometry.base_position(i)).length() <= max_travel);
    }
}

#[test]
fn test_influence_controls_how_far_particles_drift() {
    let geometry = geometry(400, 8);

    let travel = |influence: f32| {
        // No aging, so nobody snaps back during the run
        let config = FlowConfig::default()
            .with_flow_field(FlowFieldParams {
                influence,
                ..Default::default()
            })
            .with_step_constants(StepConstants {
                respawn_rate: 0.0,
                ..Default::default()
            });
        let mut sim = SoftwareSimulation::new(&geometry);
        let mut driver = FrameDriver::new(sim.grid(), sim.particle_count());
        for _ in 0..30 {
            driver.advance(&mut sim, &config, 0.02);
        }
        (0..sim.particle_count())
            .map(|i| (sim.particle(i).truncate() - geometry.base_position(i)).length())
            .sum::<f32>()
    };

    let low = travel(0.0);
    let high = travel(1.0);
    assert!(high > low, "influence 1 moved {} vs influence 0 moved {}", high, low);
}

#[test]
fn test_zero_influence_returns_particles_to_shape() {
    let geometry = geometry(300, 13);
    let mut sim = SoftwareSimulation::new(&geometry);
    let mut driver = FrameDriver::new(sim.grid(), sim.particle_count());
    let mut config = FlowConfig::default()
        .with_flow_field(FlowFieldParams {
            influence: 1.0,
            strength: 10.0,
            ..Default::default()
        })
        .with_step_constants(StepConstants {
            respawn_rate: 0.0,
            ..Default::default()
        });

    let drift = |sim: &SoftwareSimulation| {
        (0..sim.particle_count())
            .map(|i| (sim.particle(i).truncate() - geometry.base_position(i)).length())
            .sum::<f32>()
    };

    for _ in 0..30 {
        driver.advance(&mut sim, &config, 0.02);
    }
    let scattered = drift(&sim);
    assert!(scattered > 0.0);

    config.flow_field.set_influence(0.0);
    for _ in 0..100 {
        driver.advance(&mut sim, &config, 0.02);
    }
    let settled = drift(&sim);
    assert!(
        settled < scattered * 0.5,
        "drift {} after influence 0, was {}",
        settled,
        scattered
    );
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resolution_change_only_affects_rendering() {
    let geometry = geometry(50, 2);
    let config = FlowConfig::default();

    let mut sim_a = SoftwareSimulation::new(&geometry);
    let mut sim_b = SoftwareSimulation::new(&geometry);
    let mut driver_a = FrameDriver::new(sim_a.grid(), sim_a.particle_count());
    let mut driver_b = FrameDriver::new(sim_b.grid(), sim_b.particle_count());

    let mut viewport = Viewport::new(1280.0, 720.0, 1.0);
    let before = RenderUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, &viewport, 0.07, 8);

    for frame in 0..20 {
        if frame == 10 {
            viewport = Viewport::from_physical(2560, 1440, 2.0, 2.0);
        }
        driver_a.advance(&mut sim_a, &config, 0.016);
        driver_b.advance(&mut sim_b, &config, 0.016);
    }
    let after = RenderUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, &viewport, 0.07, 8);

    assert_eq!(sim_a.current(), sim_b.current());
    assert_ne!(before.resolution, after.resolution);

    let small = sprite_pixel_size(0.5, 1.0, 0.07, before.resolution[1], 10.0);
    let large = sprite_pixel_size(0.5, 1.0, 0.07, after.resolution[1], 10.0);
    assert!((large / small - 2.0).abs() < 1e-4);
}

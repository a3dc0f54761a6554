//! # Streaming Integration Tests
//!
//! Drives the engine through its public API: chunk creation order, meshing
//! of a flat world, remeshing after boundary edits, a walking viewer and
//! forward progress with real worker threads.

use cgmath::Point3;
use voxel_world::engine_state::config::{EngineConfig, StreamingSettings, TerrainSettings};
use voxel_world::engine_state::voxels::block::{block_type::BlockType, AIR};
use voxel_world::engine_state::voxels::chunk::ChunkLifecycle;
use voxel_world::engine_state::voxels::world::World;
use voxel_world::EngineState;
use web_time::Duration;

fn flat_terrain() -> TerrainSettings {
    let mut terrain = TerrainSettings {
        noise_height: 0.0,
        ground_offset: 10,
        water_margin: 0,
        ..TerrainSettings::default()
    };
    terrain.caves.enabled = false;
    terrain.trees.enabled = false;
    terrain
}

fn flat_engine(view_distance: i32, caps: usize) -> EngineState {
    let config = EngineConfig {
        seed: 5,
        worker_threads: 0,
        terrain: flat_terrain(),
        streaming: StreamingSettings {
            view_distance,
            view_distance_y: 1,
            max_creates_per_tick: caps,
            max_generates_per_tick: caps,
            ..StreamingSettings::default()
        },
        ..EngineConfig::default()
    };
    EngineState::new(config).unwrap()
}

fn viewer() -> Point3<f32> {
    Point3::new(8.0, 12.0, 8.0)
}

/// Asserts that every chunk in view around `eye` exists and that every one
/// of them with all six neighbors loaded has a mesh.
fn assert_view_filled(engine: &EngineState, eye: Point3<f32>) {
    let center = World::chunk_coord_of_point(eye);
    for offset in engine.scheduler().view_offsets().offsets() {
        let position = center + *offset;
        let chunk = engine
            .world()
            .get_chunk_at(position)
            .unwrap_or_else(|| panic!("{position:?} is in view but missing"));
        if engine.world().has_all_neighbors(position) {
            assert_eq!(
                chunk.lifecycle,
                ChunkLifecycle::MeshReady,
                "{position:?} is in view but unmeshed"
            );
        }
    }
}

#[test]
fn two_creates_per_tick_nearest_first() {
    let mut engine = flat_engine(2, 2);

    engine.update(viewer());
    assert_eq!(engine.stats().chunks_created, 2);
    assert!(engine.world().contains_chunk(Point3::new(0, 0, 0)));

    let mut previous_shell = 0;
    for _ in 0..30 {
        let before = engine.world().chunk_positions();
        engine.update(viewer());
        let after = engine.world().chunk_positions();

        let mut shells: Vec<i32> = after
            .into_iter()
            .filter(|position| !before.contains(position))
            .map(|p| p.x.abs().max(p.y.abs()).max(p.z.abs()))
            .collect();
        assert!(shells.len() <= 2);
        shells.sort_unstable();
        for shell in shells {
            assert!(shell >= previous_shell, "shell {shell} created out of order");
            previous_shell = shell;
        }
    }
    assert_eq!(engine.world().len(), engine.scheduler().view_offsets().len());
}

#[test]
fn flat_world_strata_and_meshes() {
    let mut engine = flat_engine(1, 100);
    engine.update(viewer());
    engine.update(viewer());

    for (x, z) in [(0, 0), (5, 11), (-3, 2), (15, -16)] {
        assert_eq!(engine.block_at(Point3::new(x, 11, z)), AIR);
        assert_eq!(engine.block_at(Point3::new(x, 10, z)), BlockType::GRASS.id());
        for y in 6..=9 {
            assert_eq!(engine.block_at(Point3::new(x, y, z)), BlockType::DIRT.id());
        }
        assert_eq!(engine.block_at(Point3::new(x, 5, z)), BlockType::STONE.id());
        assert_eq!(engine.block_at(Point3::new(x, -40, z)), BlockType::STONE.id());
    }

    let mesh = engine.chunk_mesh(Point3::new(0, 0, 0)).unwrap();
    assert_eq!(mesh.solid.quad_count(), 1);
    assert_eq!(mesh.solid.positions.iter().filter(|p| p[1] == 11.0).count(), 4);
    assert!(engine.collider(Point3::new(0, 0, 0)).is_some());
    assert!(engine.is_chunk_active(Point3::new(0, 0, 0)));

    // Unloaded chunks read as air.
    assert_eq!(engine.block_at(Point3::new(16 * 20, 5, 0)), AIR);
}

#[test]
fn boundary_edit_remeshes_both_chunks() {
    let mut engine = flat_engine(2, 100);
    for _ in 0..3 {
        engine.update(viewer());
    }

    let left = Point3::new(0, 0, 0);
    let right = Point3::new(1, 0, 0);
    let revision = |engine: &EngineState, position| {
        engine
            .world()
            .get_chunk_at(position)
            .unwrap()
            .render_state
            .applied_revision
    };
    let left_before = revision(&engine, left);
    let right_before = revision(&engine, right);
    assert!(left_before.is_some() && right_before.is_some());
    let right_quads = engine.chunk_mesh(right).unwrap().solid.quad_count();

    let dirty = engine.set_block(Point3::new(15, 10, 4), AIR).unwrap();
    assert_eq!(dirty, vec![left, right]);
    engine.update(viewer());

    assert!(revision(&engine, left) > left_before);
    assert!(revision(&engine, right) > right_before);

    let mesh = engine.chunk_mesh(right).unwrap();
    assert_eq!(mesh.solid.quad_count(), right_quads + 1);
    let facing_hole = mesh
        .solid
        .normals
        .chunks(4)
        .zip(mesh.solid.positions.chunks(4))
        .filter(|(normals, _)| normals[0] == [-1.0, 0.0, 0.0])
        .map(|(_, positions)| positions)
        .collect::<Vec<_>>();
    assert_eq!(facing_hole.len(), 1);
    assert!(facing_hole[0].iter().all(|p| p[0] == 0.0));
}

#[test]
fn small_step_across_a_chunk_border_fills_the_new_view() {
    let mut engine = flat_engine(3, 100);
    for _ in 0..50 {
        engine.update(Point3::new(15.6, 12.0, 8.0));
    }

    // Below the update threshold, but inside chunk (1, 0, 0).
    let eye = Point3::new(16.3, 12.0, 8.0);
    for _ in 0..200 {
        engine.update(eye);
    }

    assert!(engine.world().contains_chunk(Point3::new(4, 0, 0)));
    assert_view_filled(&engine, eye);
}

#[test]
fn walking_viewer_keeps_queues_bounded() {
    let mut engine = flat_engine(3, 2);
    let view_len = engine.scheduler().view_offsets().len();

    let mut eye = viewer();
    for _ in 0..600 {
        eye.x += 0.5;
        engine.update(eye);
        assert!(engine.scheduler().pending_generations() <= view_len);
        assert!(engine.scheduler().pending_creations() <= 2 * view_len);
    }

    let mut settled = false;
    for _ in 0..400 {
        engine.update(eye);
        if engine.scheduler().pending_creations() == 0
            && engine.scheduler().pending_generations() == 0
        {
            settled = true;
            break;
        }
    }
    assert!(settled, "streaming never caught up with the viewer");
    assert_view_filled(&engine, eye);
}

#[test]
fn workers_mesh_every_eligible_chunk() {
    let config = EngineConfig {
        seed: 1234,
        worker_threads: 3,
        streaming: StreamingSettings {
            view_distance: 2,
            view_distance_y: 1,
            max_creates_per_tick: 4,
            max_generates_per_tick: 8,
            ..StreamingSettings::default()
        },
        ..EngineConfig::default()
    };
    let mut engine = EngineState::new(config).unwrap();
    let eye = Point3::new(8.0, 40.0, 8.0);

    let all_meshed = |engine: &EngineState| {
        engine.world().chunks().all(|chunk| {
            !engine.world().has_all_neighbors(chunk.position)
                || chunk.lifecycle == ChunkLifecycle::MeshReady
        })
    };

    let mut ticks = 0;
    loop {
        engine.update(eye);
        assert!(engine.wait_for_meshes(Duration::from_secs(10)));
        ticks += 1;
        if engine.scheduler().pending_creations() == 0 && all_meshed(&engine) {
            break;
        }
        assert!(ticks < 500, "streaming made no progress");
    }

    let stats = engine.stats();
    assert_eq!(stats.failed_tasks, 0);
    assert_eq!(stats.meshes_submitted, stats.meshes_applied + stats.stale_results);
    assert!(engine.chunk_mesh(Point3::new(0, 0, 0)).is_some());
}

//! Integration tests for the full plot lifecycle.
//!
//! Exercises: join → place → serialize → leave → rejoin → restore
//!
//! All tests run against the in-process host world.

use std::sync::Arc;

use glam::Vec3;
use tycoon_core::persistence::{snapshot_from_json, snapshot_to_json};
use tycoon_core::plot::STRUCTURES_FOLDER;
use tycoon_core::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn service(plot_count: u32) -> PlotService {
    let config = GameConfig {
        plot_count,
        seed: Some(2024),
        ..Default::default()
    };
    PlotService::new(
        &config,
        Arc::new(Catalog::builtin().unwrap()),
        Box::new(AabbOracle::default()),
    )
    .unwrap()
}

fn structures_folder_len(service: &PlotService, plot: PlotId) -> usize {
    let plot = service.plot(plot).unwrap();
    let folder = service
        .world()
        .find_first_child(plot.instance(), STRUCTURES_FOLDER)
        .unwrap();
    service.world().children(folder).len()
}

/// Lay a 3x3 grid of road tiles centred on the platform.
fn lay_road_grid(service: &mut PlotService, player: PlayerId) -> Vec<uuid::Uuid> {
    let mut ids = Vec::new();
    for row in -1..=1 {
        for col in -1..=1 {
            let id = service
                .place_structure(
                    player,
                    "road-straight",
                    Transform::from_xyz(col as f32 * 16.0, 0.0, row as f32 * 16.0),
                    true,
                )
                .unwrap();
            ids.push(id);
        }
    }
    ids
}

// ── Lifecycle ──────────────────────────────────────────────────────────

#[test]
fn session_round_trip_through_json() {
    let mut svc = service(2);
    let player = PlayerId(1);
    let plot = svc.on_player_join(player).unwrap();

    let roads = lay_road_grid(&mut svc, player);
    let house = Transform::from_xyz(40.0, 0.0, 0.0).with_yaw(1.0);
    svc.place_structure(player, "small-house", house, true)
        .unwrap();
    let saved = snapshot_to_json(&svc.serialize_plot(player).unwrap()).unwrap();

    svc.on_player_leave(player);
    assert_eq!(structures_folder_len(&svc, plot), 0);

    let plot = svc.on_player_join(player).unwrap();
    let snapshot = snapshot_from_json(&saved).unwrap();
    assert_eq!(svc.restore_plot(player, &snapshot).unwrap(), 10);

    let restored = svc.serialize_plot(player).unwrap();
    assert_eq!(restored.structures.len(), 10);
    assert_eq!(
        restored.structures[..9].iter().map(|s| s.id).collect::<Vec<_>>(),
        roads
    );
    for (before, after) in snapshot.structures.iter().zip(&restored.structures) {
        assert_eq!(before.structure_id, after.structure_id);
        assert!(before.transform.approx_eq(&after.transform, 1e-3));
    }
    assert_eq!(structures_folder_len(&svc, plot), 10);
}

#[test]
fn adjacent_tiles_do_not_collide_but_overlaps_do() {
    let mut svc = service(1);
    let player = PlayerId(7);
    svc.on_player_join(player).unwrap();
    lay_road_grid(&mut svc, player);

    let straddling = Transform::from_xyz(8.0, 0.0, 8.0);
    let overlap = svc.place_structure(player, "road-turn", straddling, true);
    assert!(matches!(overlap, Err(PlotError::PlacementCollision { .. })));
    assert_eq!(svc.plot_of(player).unwrap().structure_count(), 9);

    // a tree on top of the road still collides, one beside the grid does not
    assert!(svc
        .place_structure(player, "oak-tree", Transform::IDENTITY, true)
        .is_err());
    svc.place_structure(player, "oak-tree", Transform::from_xyz(30.0, 0.0, 0.0), true)
        .unwrap();
}

#[test]
fn restored_plot_on_a_different_parcel_keeps_relative_layout() {
    let mut svc = service(2);
    svc.on_player_join(PlayerId(1)).unwrap();
    svc.place_structure(PlayerId(1), "corner-shop", Transform::from_xyz(20.0, 0.0, -20.0), true)
        .unwrap();
    let snapshot = svc.serialize_plot(PlayerId(1)).unwrap();
    svc.on_player_leave(PlayerId(1));

    // someone else grabs plot 1 first, so player 1 lands on plot 2
    svc.on_player_join(PlayerId(2)).unwrap();
    assert_eq!(svc.on_player_join(PlayerId(1)), Ok(PlotId(2)));
    svc.restore_plot(PlayerId(1), &snapshot).unwrap();

    let plot = svc.plot(PlotId(2)).unwrap();
    let (_, instance) = plot.structures().first().unwrap();
    let world = svc.world().transform(instance.model().unwrap()).unwrap();
    let platform = plot.platform_transform(svc.world()).unwrap();
    let expected = platform.translation + Vec3::new(20.0, 0.0, -20.0);
    assert!(world.translation.abs_diff_eq(expected, 1e-3));
}

#[test]
fn players_cannot_build_on_a_neighbours_plot() {
    let mut svc = service(2);
    svc.on_player_join(PlayerId(1)).unwrap();
    svc.on_player_join(PlayerId(2)).unwrap();
    svc.place_structure(PlayerId(2), "small-house", Transform::IDENTITY, true)
        .unwrap();
    let nodes = svc.world().node_count();

    // plot 2's platform sits one spacing (160) along x from plot 1's
    let next_door = svc.place_structure(
        PlayerId(1),
        "small-house",
        Transform::from_xyz(160.0, 0.0, 0.0),
        true,
    );
    assert!(matches!(next_door, Err(PlotError::OutOfBounds { .. })));

    let far_away = svc.place_structure(
        PlayerId(1),
        "oak-tree",
        Transform::from_xyz(5000.0, 0.0, 5000.0),
        false,
    );
    assert!(matches!(far_away, Err(PlotError::OutOfBounds { .. })));

    assert_eq!(svc.world().node_count(), nodes);
    assert_eq!(svc.plot_of(PlayerId(1)).unwrap().structure_count(), 0);
    assert_eq!(structures_folder_len(&svc, PlotId(2)), 1);
}

#[test]
fn failed_restore_leaves_the_plot_empty() {
    let mut svc = service(1);
    let player = PlayerId(4);
    svc.on_player_join(player).unwrap();
    svc.place_structure(player, "oak-tree", Transform::IDENTITY, true)
        .unwrap();
    let mut snapshot = svc.serialize_plot(player).unwrap();
    svc.on_player_leave(player);

    let mut gone = snapshot.structures[0].clone();
    gone.id = uuid::Uuid::from_u128(1);
    gone.structure_id = "gone".into();
    snapshot.structures.push(gone);

    let plot = svc.on_player_join(player).unwrap();
    assert_eq!(
        svc.restore_plot(player, &snapshot),
        Err(PlotError::StructureNotFound("gone".into()))
    );
    assert_eq!(svc.plot_of(player).unwrap().structure_count(), 0);
    assert_eq!(structures_folder_len(&svc, plot), 0);
}

#[test]
fn double_assignment_across_plots_is_refused() {
    let mut svc = service(2);
    let player = PlayerId(3);
    assert_eq!(svc.on_player_join(player), Ok(PlotId(1)));
    assert!(matches!(
        svc.on_player_join(player),
        Err(PlotError::PlayerAlreadyHasPlot { .. })
    ));
    assert!(matches!(
        svc.assign(player, PlotId(2)),
        Err(PlotError::PlayerAlreadyHasPlot { .. })
    ));
    assert_eq!(svc.free_plot_count(), 1);
}

#[test]
fn every_plot_can_be_cycled() {
    let mut svc = service(4);
    for round in 0..3u64 {
        for p in 0..4u64 {
            svc.on_player_join(PlayerId(round * 10 + p)).unwrap();
            svc.place_structure(PlayerId(round * 10 + p), "street-lamp", Transform::IDENTITY, true)
                .unwrap();
        }
        assert_eq!(svc.free_plot_count(), 0);
        svc.release_all();
        assert_eq!(svc.free_plot_count(), 4);
    }
    for plot in svc.plots().values() {
        assert_eq!(structures_folder_len(&svc, plot.id()), 0);
    }
}

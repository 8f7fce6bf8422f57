//! Tycoon Headless Scenario Harness
//!
//! Drives the plot tycoon core through player scenarios without a game
//! engine. Runs entirely in-process against the headless host world.
//!
//! Usage:
//!   cargo run -p tycoon-simtest
//!   cargo run -p tycoon-simtest -- --verbose
//!   cargo run -p tycoon-simtest -- --filter plot::

mod registry;

use std::sync::Arc;

use registry::{check, CaseOptions, CaseResult, Outcome, TestRegistry};
use tycoon_core::persistence;
use tycoon_core::plot::STRUCTURES_FOLDER;
use tycoon_core::prelude::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let filter = args
        .iter()
        .position(|a| a == "--filter")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str);

    println!("=== Tycoon Scenario Harness ===\n");

    let mut registry = TestRegistry::new();
    register_ordered_map(&mut registry);
    register_catalog(&mut registry);
    register_plot(&mut registry);
    register_service(&mut registry);
    log::info!("{} cases registered", registry.len());

    let report = registry.run(filter);

    // ── Summary ──
    let mut suite = "";
    for r in &report.results {
        if r.suite != suite {
            suite = r.suite;
            println!("--- {} ---", suite);
        }
        let icon = match r.outcome {
            Outcome::Passed => "✓",
            Outcome::Failed => "✗",
            Outcome::Skipped => "-",
        };
        if !r.passed() || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed, {} skipped ===",
        report.passed(),
        report.results.len(),
        report.failed(),
        report.skipped()
    );

    if report.failed() > 0 {
        std::process::exit(1);
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

fn service(plot_count: u32) -> Result<PlotService, String> {
    let catalog = Catalog::builtin().map_err(|e| e.to_string())?;
    let config = GameConfig {
        plot_count,
        seed: Some(1),
        ..Default::default()
    };
    PlotService::new(&config, Arc::new(catalog), Box::new(AabbOracle::default()))
        .map_err(|e| e.to_string())
}

fn folder_children(svc: &PlotService, plot: PlotId) -> Result<usize, String> {
    let plot = svc.plot(plot).ok_or("plot missing")?;
    let folder = svc
        .world()
        .find_first_child(plot.instance(), STRUCTURES_FOLDER)
        .ok_or("structures folder missing")?;
    Ok(svc.world().children(folder).len())
}

// ── 1. Ordered map ──────────────────────────────────────────────────────

fn register_ordered_map(registry: &mut TestRegistry) {
    let plain = CaseOptions::default();
    registry
        .register("ordered_map", "iteration_follows_insertion", ordered_map_order, plain)
        .register("ordered_map", "reinsert_moves_to_end", ordered_map_reinsert, plain)
        .register("ordered_map", "replace_keeps_position", ordered_map_replace, plain);
}

fn ordered_map_order() -> CaseResult {
    let mut map = OrderedMap::new();
    for key in ["delta", "alpha", "charlie", "bravo"] {
        map.insert(key, key.len()).map_err(|_| format!("duplicate {}", key))?;
    }
    let keys: Vec<_> = map.keys().copied().collect();
    check(
        keys == ["delta", "alpha", "charlie", "bravo"],
        format!("unexpected order {:?}", keys),
    )
}

fn ordered_map_reinsert() -> CaseResult {
    let mut map: OrderedMap<u32, u32> = (0..5).map(|k| (k, k)).collect();
    map.remove(&2);
    map.insert(2, 20).map_err(|_| "re-insert rejected")?;
    check(map.insert(2, 21).is_err(), "duplicate insert accepted")?;
    let keys: Vec<_> = map.keys().copied().collect();
    check(keys == [0, 1, 3, 4, 2], format!("unexpected order {:?}", keys))
}

fn ordered_map_replace() -> CaseResult {
    let mut map: OrderedMap<u32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
    check(map.replace(1, "z") == Some("a"), "replace returned wrong value")?;
    check(map.first() == Some((&1, &"z")), "replace moved the key")
}

// ── 2. Catalog ──────────────────────────────────────────────────────────

fn register_catalog(registry: &mut TestRegistry) {
    let plain = CaseOptions::default();
    registry
        .register("catalog", "lookup_by_id", catalog_lookup, plain)
        .register("catalog", "price_and_search", catalog_queries, plain);
}

fn catalog_lookup() -> CaseResult {
    let catalog = Catalog::builtin().map_err(|e| e.to_string())?;
    let road = catalog
        .find_structure("road-intersection")
        .ok_or("road-intersection missing")?;
    check(road.price == Price::koins(100), format!("road costs {:?}", road.price))?;
    check(
        catalog.find_structure("nonexistent").is_none(),
        "unknown id resolved",
    )
}

fn catalog_queries() -> CaseResult {
    let catalog = Catalog::builtin().map_err(|e| e.to_string())?;
    for category in catalog.categories() {
        let cheap = category.get_structures_within_price(100);
        check(
            cheap.iter().all(|s| s.price.amount <= 100),
            format!("{} returned a structure over budget", category.id()),
        )?;
        for structure in category.structures() {
            let found = category.get_structure_by_name(&structure.name);
            check(found.is_some(), format!("{} not found by name", structure.id))?;
        }
    }
    check(!catalog.search("road").is_empty(), "no roads found")
}

// ── 3. Plot ─────────────────────────────────────────────────────────────

fn register_plot(registry: &mut TestRegistry) {
    let plain = CaseOptions::default();
    registry
        .register("plot", "assign_twice_fails", plot_assign_twice, plain)
        .register("plot", "unassign_idempotent", plot_unassign_twice, plain)
        .register("plot", "collision_no_mutation", plot_collision, plain)
        .register("plot", "leak_detected", plot_leak, plain)
        .register("plot", "stays_on_own_plot", plot_bounds, plain)
        .register("plot", "empty_snapshot", plot_empty_snapshot, plain);
}

fn plot_assign_twice() -> CaseResult {
    let mut world = HostWorld::new();
    let mut plot = Plot::new(PlotId(1), world.spawn_folder("Plot1", None));
    plot.assign_player(PlayerId(1)).map_err(|e| e.to_string())?;
    let second = plot.assign_player(PlayerId(2));
    check(
        matches!(second, Err(PlotError::AlreadyAssigned { .. })),
        format!("second assignment gave {:?}", second),
    )?;
    check(plot.player() == Some(PlayerId(1)), "player changed")
}

fn plot_unassign_twice() -> CaseResult {
    let mut svc = service(1)?;
    let player = PlayerId(1);
    svc.on_player_join(player).map_err(|e| e.to_string())?;
    svc.place_structure(player, "small-house", Transform::IDENTITY, true)
        .map_err(|e| e.to_string())?;
    check(svc.on_player_leave(player) == Some(PlotId(1)), "leave did not free plot")?;
    check(svc.on_player_leave(player).is_none(), "second leave did something")?;
    let plot = svc.plot(PlotId(1)).ok_or("plot missing")?;
    check(!plot.is_assigned() && plot.structure_count() == 0, "plot not reset")
}

fn plot_collision() -> CaseResult {
    let mut svc = service(1)?;
    let player = PlayerId(1);
    svc.on_player_join(player).map_err(|e| e.to_string())?;
    svc.place_structure(player, "apartment-block", Transform::IDENTITY, true)
        .map_err(|e| e.to_string())?;
    let nodes = svc.world().node_count();

    let result = svc.place_structure(player, "oak-tree", Transform::from_xyz(2.0, 0.0, 2.0), true);
    check(
        matches!(result, Err(PlotError::PlacementCollision { .. })),
        format!("overlapping placement gave {:?}", result),
    )?;
    check(svc.world().node_count() == nodes, "world changed on collision")?;
    check(folder_children(&svc, PlotId(1))? == 1, "structures folder changed")
}

fn plot_leak() -> CaseResult {
    let mut svc = service(1)?;
    let player = PlayerId(1);
    let plot_id = svc.on_player_join(player).map_err(|e| e.to_string())?;
    let instance = svc.plot(plot_id).ok_or("plot missing")?.instance();
    let folder = svc
        .world()
        .find_first_child(instance, STRUCTURES_FOLDER)
        .ok_or("structures folder missing")?;
    svc.world_mut().spawn_folder("Orphan", Some(folder));

    // the leak is logged, the plot still goes back to the pool
    svc.on_player_leave(player);
    check(folder_children(&svc, plot_id)? == 0, "leaked object left behind")?;
    check(svc.free_plot_count() == 1, "plot not returned to pool")
}

fn plot_bounds() -> CaseResult {
    let mut svc = service(2)?;
    for p in [1, 2] {
        svc.on_player_join(PlayerId(p)).map_err(|e| e.to_string())?;
    }
    let next_door = Transform::from_xyz(160.0, 0.0, 0.0);
    let result = svc.place_structure(PlayerId(1), "small-house", next_door, true);
    check(
        matches!(result, Err(PlotError::OutOfBounds { .. })),
        format!("neighbour placement gave {:?}", result),
    )?;
    check(folder_children(&svc, PlotId(2))? == 0, "neighbour's plot changed")
}

fn plot_empty_snapshot() -> CaseResult {
    let mut svc = service(1)?;
    svc.on_player_join(PlayerId(1)).map_err(|e| e.to_string())?;
    let snapshot = svc.serialize_plot(PlayerId(1)).map_err(|e| e.to_string())?;
    let json = persistence::snapshot_to_json(&snapshot).map_err(|e| e.to_string())?;
    check(json == r#"{"structures":[]}"#, format!("unexpected snapshot {}", json))
}

// ── 4. Service ──────────────────────────────────────────────────────────

fn register_service(registry: &mut TestRegistry) {
    let plain = CaseOptions::default();
    registry
        .register("service", "pool_exhaustion", service_pool, plain)
        .register("service", "one_plot_per_player", service_one_plot, plain)
        .register("service", "save_load", service_save_load, plain);
}

fn service_pool() -> CaseResult {
    let mut svc = service(3)?;
    for p in 0..3 {
        svc.on_player_join(PlayerId(p)).map_err(|e| e.to_string())?;
    }
    let overflow = svc.on_player_join(PlayerId(3));
    check(
        matches!(overflow, Err(PlotError::NoFreePlot { .. })),
        format!("fourth join gave {:?}", overflow),
    )?;
    svc.on_player_leave(PlayerId(1));
    check(
        svc.on_player_join(PlayerId(3)) == Ok(PlotId(2)),
        "freed plot not reused",
    )
}

fn service_one_plot() -> CaseResult {
    let mut svc = service(2)?;
    svc.on_player_join(PlayerId(1)).map_err(|e| e.to_string())?;
    let result = svc.assign(PlayerId(1), PlotId(2));
    check(
        matches!(result, Err(PlotError::PlayerAlreadyHasPlot { .. })),
        format!("second plot assignment gave {:?}", result),
    )
}

fn service_save_load() -> CaseResult {
    let mut svc = service(2)?;
    let player = PlayerId(4);
    svc.on_player_join(player).map_err(|e| e.to_string())?;
    for (i, id) in ["road-straight", "road-turn", "road-intersection"].iter().enumerate() {
        svc.place_structure(player, id, Transform::from_xyz(i as f32 * 16.0, 0.0, 0.0), true)
            .map_err(|e| e.to_string())?;
    }
    let before = svc.serialize_plot(player).map_err(|e| e.to_string())?;

    let mut buffer = Vec::new();
    svc.save(&mut buffer).map_err(|e| e.to_string())?;
    let mut fresh = service(2)?;
    fresh.load(&buffer[..]).map_err(|e| e.to_string())?;

    let after = fresh.serialize_plot(player).map_err(|e| e.to_string())?;
    check(before == after, "snapshot changed across save/load")
}

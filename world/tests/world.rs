use std::time::Duration;

use waypoint_defence_core::{
    Command, EnemyConfig, EnemyId, Event, GamePhase, GridCell, PlacementError, SellError,
    TowerConfig, TowerId, WaveIndex,
};
use waypoint_defence_world::{apply, query, World};

fn archer() -> TowerConfig {
    TowerConfig::new("Archer", 100, 5.0, 1.0, 20)
}

fn path_cells() -> Vec<GridCell> {
    vec![
        GridCell::new(0, 2),
        GridCell::new(10, 2),
        GridCell::new(10, 8),
        GridCell::new(2, 8),
        GridCell::new(2, 14),
    ]
}

fn world_with_path() -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigurePath {
            cells: path_cells(),
        },
        &mut events,
    );
    assert_eq!(events, vec![Event::PathGenerated { waypoints: 5 }]);
    world
}

fn place(world: &mut World, config: TowerConfig, cell: GridCell) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, Command::PlaceTower { config, cell }, &mut events);
    events
}

fn placed_tower(events: &[Event]) -> Option<TowerId> {
    events.iter().find_map(|event| match event {
        Event::TowerPlaced { tower, .. } => Some(*tower),
        _ => None,
    })
}

fn run_ticks(world: &mut World, ticks: usize, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        apply(world, Command::Tick { dt }, &mut events);
    }
    events
}

#[test]
fn placement_debits_gold_and_claims_cell() {
    let mut world = world_with_path();
    let cell = GridCell::new(4, 4);

    let events = place(&mut world, archer(), cell);

    let tower = placed_tower(&events).expect("tower placed");
    assert!(events.contains(&Event::PurchaseSucceeded { cost: 100 }));
    assert_eq!(query::economy(&world).gold(), 400);
    assert!(!query::grid(&world).is_buildable(cell));
    assert_eq!(query::tower_at(&world, cell), Some(tower));
}

#[test]
fn placement_on_path_changes_nothing() {
    let mut world = world_with_path();
    let cell = GridCell::new(10, 2);

    let events = place(&mut world, archer(), cell);

    assert_eq!(
        events,
        vec![Event::TowerPlacementRejected {
            cell,
            reason: PlacementError::NotBuildable,
        }]
    );
    assert_eq!(query::economy(&world).gold(), 500);
    assert!(query::tower_view(&world).is_empty());
}

#[test]
fn unaffordable_placement_changes_nothing() {
    let mut world = world_with_path();
    let cell = GridCell::new(4, 4);
    let castle = TowerConfig::new("Castle", 900, 5.0, 1.0, 20);

    let events = place(&mut world, castle, cell);

    assert_eq!(
        events,
        vec![
            Event::PurchaseFailed { cost: 900 },
            Event::TowerPlacementRejected {
                cell,
                reason: PlacementError::InsufficientGold,
            },
        ]
    );
    assert_eq!(query::economy(&world).gold(), 500);
    assert!(query::grid(&world).is_buildable(cell));
    assert!(query::tower_at(&world, cell).is_none());
}

#[test]
fn placement_outside_grid_is_rejected() {
    let mut world = world_with_path();
    let cell = GridCell::new(20, 0);
    assert_eq!(
        query::placement_check(&world, &archer(), cell),
        Err(PlacementError::OutOfBounds)
    );
    let events = place(&mut world, archer(), cell);
    assert!(placed_tower(&events).is_none());
}

#[test]
fn selling_refunds_seventy_percent_and_frees_cell() {
    let mut world = world_with_path();
    let cell = GridCell::new(4, 4);
    let tower = placed_tower(&place(&mut world, archer(), cell)).expect("tower placed");

    let mut events = Vec::new();
    apply(&mut world, Command::SellTower { tower }, &mut events);

    assert!(events.contains(&Event::TowerSold {
        tower,
        cell,
        refund: 70,
    }));
    assert_eq!(query::economy(&world).gold(), 470);
    assert!(query::grid(&world).is_buildable(cell));
    assert!(query::tower_at(&world, cell).is_none());

    events.clear();
    apply(&mut world, Command::SellTower { tower }, &mut events);
    assert_eq!(
        events,
        vec![Event::TowerSaleRejected {
            tower,
            reason: SellError::MissingTower,
        }]
    );
    assert_eq!(query::economy(&world).gold(), 470);
}

#[test]
fn selection_replaces_previous_and_sale_deselects() {
    let mut world = world_with_path();
    let first = placed_tower(&place(&mut world, archer(), GridCell::new(4, 4))).expect("first");
    let second = placed_tower(&place(&mut world, archer(), GridCell::new(5, 5))).expect("second");

    let mut events = Vec::new();
    apply(&mut world, Command::SelectTower { tower: first }, &mut events);
    apply(&mut world, Command::SelectTower { tower: first }, &mut events);
    apply(&mut world, Command::SelectTower { tower: second }, &mut events);
    assert_eq!(
        events,
        vec![
            Event::TowerSelected { tower: first },
            Event::TowerDeselected { tower: first },
            Event::TowerSelected { tower: second },
        ]
    );

    events.clear();
    apply(&mut world, Command::SellTower { tower: second }, &mut events);
    assert_eq!(events.first(), Some(&Event::TowerDeselected { tower: second }));
    assert_eq!(query::selected_tower(&world), None);

    events.clear();
    apply(&mut world, Command::DeselectTower, &mut events);
    assert!(events.is_empty());
}

#[test]
fn placement_session_previews_and_closes_on_success() {
    let mut world = world_with_path();
    let mut events = Vec::new();

    apply(&mut world, Command::BeginPlacement { config: archer() }, &mut events);
    apply(
        &mut world,
        Command::PreviewPlacement {
            cell: GridCell::new(0, 2),
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::PreviewPlacement {
            cell: GridCell::new(1, 1),
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![
            Event::PlacementStarted {
                name: "Archer".to_owned(),
                cost: 100,
            },
            Event::PlacementPreviewed {
                cell: GridCell::new(0, 2),
                valid: false,
            },
            Event::PlacementPreviewed {
                cell: GridCell::new(1, 1),
                valid: true,
            },
        ]
    );
    assert!(query::placement_session(&world).is_some());

    let _ = place(&mut world, archer(), GridCell::new(1, 1));
    assert!(query::placement_session(&world).is_none());
}

#[test]
fn unaffordable_placement_session_is_refused() {
    let mut world = world_with_path();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::BeginPlacement {
            config: TowerConfig::new("Castle", 900, 5.0, 1.0, 20),
        },
        &mut events,
    );
    assert_eq!(events, vec![Event::PurchaseFailed { cost: 900 }]);
    assert!(query::placement_session(&world).is_none());
}

#[test]
fn every_enemy_leaks_exactly_once() {
    let mut world = world_with_path();
    let mut events = Vec::new();
    for _ in 0..3 {
        apply(
            &mut world,
            Command::SpawnEnemy {
                config: EnemyConfig::new("Basic", 100, 5.0, 10, 10),
            },
            &mut events,
        );
    }

    events.extend(run_ticks(&mut world, 400, Duration::from_millis(50)));

    let leaks: Vec<EnemyId> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyReachedBase { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect();
    assert_eq!(
        leaks,
        vec![EnemyId::new(0), EnemyId::new(1), EnemyId::new(2)]
    );
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyDied { .. })));
    assert_eq!(query::economy(&world).health(), 70);
    assert!(query::enemy_view(&world).is_empty());
}

#[test]
fn spawning_without_path_is_rejected() {
    let mut world = World::new();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::SpawnEnemy {
            config: EnemyConfig::new("Basic", 100, 5.0, 10, 10),
        },
        &mut events,
    );
    assert!(matches!(
        events.as_slice(),
        [Event::EnemySpawnRejected { .. }]
    ));
}

#[test]
fn game_over_fires_once_and_freezes_the_world() {
    let mut world = world_with_path();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureEconomy {
            starting_gold: 500,
            starting_health: 15,
        },
        &mut events,
    );
    apply(&mut world, Command::StartGame, &mut events);
    for _ in 0..3 {
        apply(
            &mut world,
            Command::SpawnEnemy {
                config: EnemyConfig::new("Basic", 100, 5.0, 10, 10),
            },
            &mut events,
        );
    }

    events.extend(run_ticks(&mut world, 400, Duration::from_millis(50)));

    let game_overs = events
        .iter()
        .filter(|event| matches!(event, Event::GameOver))
        .count();
    assert_eq!(game_overs, 1);
    assert_eq!(query::phase(&world), GamePhase::Defeated);
    assert_eq!(query::economy(&world).health(), 0);

    let mut after = Vec::new();
    apply(&mut world, Command::Tick { dt: Duration::from_secs(1) }, &mut after);
    apply(
        &mut world,
        Command::PlaceTower {
            config: archer(),
            cell: GridCell::new(4, 4),
        },
        &mut after,
    );
    assert!(after.is_empty());
}

#[test]
fn victory_requires_spawned_waves_and_no_enemies() {
    let mut world = world_with_path();
    let mut events = Vec::new();
    apply(&mut world, Command::StartGame, &mut events);
    apply(
        &mut world,
        Command::BeginWave {
            wave: WaveIndex::new(0),
            total: 1,
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::SpawnEnemy {
            config: EnemyConfig::new("Basic", 100, 5.0, 10, 10),
        },
        &mut events,
    );
    apply(&mut world, Command::CompleteWaves, &mut events);
    assert!(!events.contains(&Event::Victory));
    assert!(!query::is_victorious(&world));

    events.extend(run_ticks(&mut world, 200, Duration::from_millis(50)));

    let victories = events
        .iter()
        .filter(|event| matches!(event, Event::Victory))
        .count();
    assert_eq!(victories, 1);
    assert!(query::is_victorious(&world));
    assert_eq!(query::wave_progress(&world).current(), Some(WaveIndex::new(0)));
}

#[test]
fn reconfiguring_the_path_starts_a_fresh_layout() {
    let mut world = world_with_path();
    let _ = place(&mut world, archer(), GridCell::new(4, 4));

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigurePath {
            cells: vec![GridCell::new(0, 0), GridCell::new(0, 19)],
        },
        &mut events,
    );

    assert!(query::tower_view(&world).is_empty());
    assert!(query::grid(&world).is_buildable(GridCell::new(10, 2)));
    assert!(!query::grid(&world).is_buildable(GridCell::new(0, 19)));
}

use waypoint_defence_core::{Command, Event, GridCell, TowerConfig};
use waypoint_defence_system_placement::{Placement, PlacementRequest};
use waypoint_defence_world::{self as world, query, World};

struct Harness {
    world: World,
    placement: Placement,
    feedback: Vec<Event>,
}

impl Harness {
    fn new() -> Self {
        let mut world = World::new();
        let mut feedback = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigurePath {
                cells: vec![GridCell::new(0, 5), GridCell::new(19, 5)],
            },
            &mut feedback,
        );
        Self {
            world,
            placement: Placement::new(),
            feedback,
        }
    }

    fn request(&mut self, request: PlacementRequest) -> Vec<Event> {
        let mut commands = Vec::new();
        let world = &self.world;
        self.placement.handle(
            &self.feedback,
            Some(request),
            |cell| query::tower_at(world, cell),
            &mut commands,
        );
        self.feedback.clear();
        for command in commands {
            world::apply(&mut self.world, command, &mut self.feedback);
        }
        self.feedback.clone()
    }
}

#[test]
fn place_select_and_sell_round_trip() {
    let mut harness = Harness::new();
    let archer = TowerConfig::new("Archer", 100, 5.0, 1.0, 20);
    let cell = GridCell::new(3, 3);

    let _ = harness.request(PlacementRequest::Start(archer));
    let preview = harness.request(PlacementRequest::Hover(GridCell::new(19, 5)));
    assert_eq!(
        preview,
        vec![Event::PlacementPreviewed {
            cell: GridCell::new(19, 5),
            valid: false,
        }]
    );

    let placed = harness.request(PlacementRequest::Confirm(cell));
    assert!(placed
        .iter()
        .any(|event| matches!(event, Event::TowerPlaced { .. })));
    assert_eq!(query::economy(&harness.world).gold(), 400);

    let selected = harness.request(PlacementRequest::Confirm(cell));
    let tower = query::tower_at(&harness.world, cell).expect("tower placed");
    assert_eq!(selected, vec![Event::TowerSelected { tower }]);

    let sold = harness.request(PlacementRequest::SellSelected);
    assert_eq!(sold.first(), Some(&Event::TowerDeselected { tower }));
    assert_eq!(query::economy(&harness.world).gold(), 470);
    assert!(query::grid(&harness.world).is_buildable(cell));
}

#[test]
fn rejected_confirm_keeps_session_open() {
    let mut harness = Harness::new();
    let archer = TowerConfig::new("Archer", 100, 5.0, 1.0, 20);

    let _ = harness.request(PlacementRequest::Start(archer));
    let rejected = harness.request(PlacementRequest::Confirm(GridCell::new(0, 5)));
    assert!(rejected
        .iter()
        .any(|event| matches!(event, Event::TowerPlacementRejected { .. })));
    assert!(query::placement_session(&harness.world).is_some());

    let placed = harness.request(PlacementRequest::Confirm(GridCell::new(0, 6)));
    assert!(placed
        .iter()
        .any(|event| matches!(event, Event::TowerPlaced { .. })));
    assert!(query::placement_session(&harness.world).is_none());

    let cancelled = harness.request(PlacementRequest::Cancel);
    assert!(cancelled.is_empty());
    assert!(harness.placement.active().is_none());
}

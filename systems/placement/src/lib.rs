#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement system translating player intents into tower commands.
//!
//! The world owns the authoritative placement session. This system mirrors it
//! from world events so a confirmed cell can be turned into a complete
//! `PlaceTower` command, and so clicks outside a session select towers instead.

use waypoint_defence_core::{Command, Event, GridCell, TowerConfig, TowerId};

/// Player intent forwarded by an adapter.
#[derive(Clone, Debug, PartialEq)]
pub enum PlacementRequest {
    /// Open a placement session for the provided tower template.
    Start(TowerConfig),
    /// Cursor hovers over a cell.
    Hover(GridCell),
    /// Primary click on a cell: places during a session, selects otherwise.
    Confirm(GridCell),
    /// Abort the current session.
    Cancel,
    /// Sell whichever tower is currently selected.
    SellSelected,
    /// Clear the current selection.
    Deselect,
}

/// Placement system that keeps a mirror of the world's session and selection.
#[derive(Debug, Default)]
pub struct Placement {
    requested: Option<TowerConfig>,
    active: Option<TowerConfig>,
    selected: Option<TowerId>,
    defeated: bool,
}

impl Placement {
    /// Creates a placement system with no open session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Template of the session currently open in the world, if any.
    #[must_use]
    pub fn active(&self) -> Option<&TowerConfig> {
        self.active.as_ref()
    }

    /// Tower currently selected in the world, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<TowerId> {
        self.selected
    }

    /// Consumes world events and a player request to emit placement commands.
    ///
    /// The `tower_at` closure should mirror the semantics of the world's
    /// `query::tower_at` helper so confirmed clicks can select towers.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        request: Option<PlacementRequest>,
        mut tower_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(GridCell) -> Option<TowerId>,
    {
        self.observe(events);

        if self.defeated {
            return;
        }
        let Some(request) = request else {
            return;
        };

        match request {
            PlacementRequest::Start(config) => {
                self.requested = Some(config.clone());
                out.push(Command::BeginPlacement { config });
            }
            PlacementRequest::Hover(cell) => {
                if self.active.is_some() {
                    out.push(Command::PreviewPlacement { cell });
                }
            }
            PlacementRequest::Confirm(cell) => {
                if let Some(config) = self.active.clone() {
                    out.push(Command::PlaceTower { config, cell });
                } else if let Some(tower) = tower_at(cell) {
                    out.push(Command::SelectTower { tower });
                } else if self.selected.is_some() {
                    out.push(Command::DeselectTower);
                }
            }
            PlacementRequest::Cancel => {
                if self.active.is_some() {
                    out.push(Command::CancelPlacement);
                }
            }
            PlacementRequest::SellSelected => {
                if let Some(tower) = self.selected {
                    out.push(Command::SellTower { tower });
                }
            }
            PlacementRequest::Deselect => {
                if self.selected.is_some() {
                    out.push(Command::DeselectTower);
                }
            }
        }
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::PlacementStarted { name, .. } => {
                    let requested = self.requested.take();
                    if requested.as_ref().is_some_and(|config| &config.name == name) {
                        self.active = requested;
                    }
                }
                Event::PurchaseFailed { .. } => {
                    self.requested = None;
                }
                Event::PlacementCancelled | Event::TowerPlaced { .. } => {
                    self.active = None;
                }
                Event::TowerSelected { tower } => self.selected = Some(*tower),
                Event::TowerDeselected { tower } => {
                    if self.selected == Some(*tower) {
                        self.selected = None;
                    }
                }
                Event::GameOver => self.defeated = true,
                _ => {}
            }
        }
    }
}

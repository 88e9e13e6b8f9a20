use std::fmt;

use waypoint_defence_core::{Event, GamePhase};
use waypoint_defence_world::{query, World};

/// How a headless run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Victory,
    Defeat,
    Unfinished,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Victory => write!(f, "victory"),
            Self::Defeat => write!(f, "defeat"),
            Self::Unfinished => write!(f, "unfinished"),
        }
    }
}

/// Tallies of a headless run, accumulated from the event stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RunReport {
    waves_started: u32,
    total_waves: u32,
    spawned: u32,
    kills: u32,
    leaks: u32,
    towers_built: u32,
    shots: u32,
    bounty: u64,
}

impl RunReport {
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WaveStarted { total, .. } => {
                    self.waves_started += 1;
                    self.total_waves = *total;
                }
                Event::EnemySpawned { .. } => self.spawned += 1,
                Event::EnemyDied { gold_reward, .. } => {
                    self.kills += 1;
                    self.bounty += u64::from(*gold_reward);
                }
                Event::EnemyReachedBase { .. } => self.leaks += 1,
                Event::TowerPlaced { .. } => self.towers_built += 1,
                Event::ProjectileFired { .. } => self.shots += 1,
                _ => {}
            }
        }
    }

    pub(crate) fn summary<'a>(&'a self, world: &'a World, ticks: u32) -> Summary<'a> {
        Summary {
            report: self,
            world,
            ticks,
        }
    }
}

/// Printable end-of-run summary.
pub(crate) struct Summary<'a> {
    report: &'a RunReport,
    world: &'a World,
    ticks: u32,
}

impl Summary<'_> {
    pub(crate) fn outcome(&self) -> Outcome {
        if query::phase(self.world) == GamePhase::Defeated {
            Outcome::Defeat
        } else if query::is_victorious(self.world) {
            Outcome::Victory
        } else {
            Outcome::Unfinished
        }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let economy = query::economy(self.world);
        writeln!(f, "ticks:   {}", self.ticks)?;
        writeln!(
            f,
            "waves:   {}/{}",
            report.waves_started, report.total_waves
        )?;
        writeln!(f, "towers:  {} built, {} shots", report.towers_built, report.shots)?;
        writeln!(
            f,
            "enemies: {} spawned, {} killed, {} leaked",
            report.spawned, report.kills, report.leaks
        )?;
        writeln!(f, "bounty:  {}", report.bounty)?;
        writeln!(f, "gold:    {}", economy.gold())?;
        writeln!(
            f,
            "health:  {}/{}",
            economy.health(),
            economy.starting_health()
        )?;
        write!(f, "outcome: {}", self.outcome())
    }
}

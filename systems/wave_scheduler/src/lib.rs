#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler responsible for pacing enemy spawn commands.
//!
//! Every wave is flattened into a single spawn sequence with a uniform delay
//! between individual spawns. The wave's gold reward is granted as soon as its
//! last enemy has spawned, regardless of whether that enemy is still alive.

use std::time::Duration;

use tracing::{debug, info, warn};
use waypoint_defence_core::{Command, EnemyConfig, GamePhase, WaveIndex, WaveTimeline};

/// Observable state of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// The game has not been started yet.
    Idle,
    /// A wave is emitting its spawn sequence.
    Spawning {
        /// Wave being spawned.
        wave: WaveIndex,
        /// Number of enemies of the wave spawned so far.
        spawned: u32,
        /// Time until the next enemy spawns.
        next_spawn_in: Duration,
    },
    /// The previous wave has fully spawned and the next one is pending.
    WaitingForNextWave {
        /// Wave that starts when the countdown ends.
        next: WaveIndex,
        /// Time left on the countdown.
        remaining: Duration,
    },
    /// Every wave has been spawned.
    AllWavesComplete,
    /// The timeline was unusable; the scheduler never spawns anything.
    Disabled,
}

#[derive(Clone, Debug)]
struct WavePlan {
    spawns: Vec<EnemyConfig>,
    spawn_interval: Duration,
    next_wave_delay: Duration,
    gold_reward: u32,
}

/// Pure system that turns an authored wave timeline into spawn commands.
#[derive(Debug)]
pub struct WaveScheduler {
    plans: Vec<WavePlan>,
    state: SchedulerState,
    game_started: bool,
    last_wave: Option<WaveIndex>,
}

impl WaveScheduler {
    /// Creates a scheduler for the provided timeline.
    ///
    /// An empty or invalid timeline leaves the scheduler disabled.
    #[must_use]
    pub fn new(timeline: &WaveTimeline) -> Self {
        let state = match timeline.validate() {
            Ok(()) => SchedulerState::Idle,
            Err(error) => {
                warn!(%error, "wave timeline rejected, scheduler disabled");
                SchedulerState::Disabled
            }
        };
        let plans = timeline
            .waves
            .iter()
            .map(|wave| WavePlan {
                spawns: wave.spawn_sequence().cloned().collect(),
                spawn_interval: wave.spawn_interval(),
                next_wave_delay: wave.next_wave_delay(),
                gold_reward: wave.gold_reward,
            })
            .collect();
        Self {
            plans,
            state,
            game_started: false,
            last_wave: None,
        }
    }

    /// Current scheduler state.
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of waves in the timeline.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        u32::try_from(self.plans.len()).unwrap_or(u32::MAX)
    }

    /// Wave most recently started, if any.
    #[must_use]
    pub const fn current_wave(&self) -> Option<WaveIndex> {
        self.last_wave
    }

    /// Reports whether the wave most recently started is the final one.
    #[must_use]
    pub fn is_last_wave(&self) -> bool {
        self.last_wave
            .is_some_and(|wave| wave.number() >= self.total_waves())
    }

    /// Reports whether every wave has been spawned.
    #[must_use]
    pub const fn are_waves_complete(&self) -> bool {
        matches!(self.state, SchedulerState::AllWavesComplete)
    }

    /// Reports whether a wave is currently emitting spawns.
    #[must_use]
    pub const fn is_wave_in_progress(&self) -> bool {
        matches!(self.state, SchedulerState::Spawning { .. })
    }

    /// Starts the game and its first wave. Only the first call has any effect.
    pub fn start_game(&mut self, out: &mut Vec<Command>) -> bool {
        if self.game_started {
            debug!("start game ignored, game already started");
            return false;
        }
        self.game_started = true;
        out.push(Command::StartGame);

        if self.state == SchedulerState::Disabled {
            warn!("game started without a playable wave timeline");
            return true;
        }
        self.begin_wave(WaveIndex::new(0), out);
        self.advance(GamePhase::Running, Duration::ZERO, out);
        true
    }

    /// Skips the countdown and starts the pending wave immediately.
    ///
    /// Rejected while a wave is spawning, before the game starts and after
    /// the last wave.
    pub fn start_next_wave(&mut self, out: &mut Vec<Command>) -> bool {
        let SchedulerState::WaitingForNextWave { next, .. } = self.state else {
            debug!(state = ?self.state, "start next wave ignored");
            return false;
        };
        self.begin_wave(next, out);
        self.advance(GamePhase::Running, Duration::ZERO, out);
        true
    }

    /// Advances spawn and countdown timers by `dt`, emitting the resulting commands.
    ///
    /// Timers are frozen once the session is lost.
    pub fn advance(&mut self, phase: GamePhase, dt: Duration, out: &mut Vec<Command>) {
        if phase == GamePhase::Defeated {
            return;
        }

        let mut budget = dt;
        loop {
            match self.state {
                SchedulerState::Spawning {
                    wave,
                    spawned,
                    next_spawn_in,
                } => {
                    if budget < next_spawn_in {
                        self.state = SchedulerState::Spawning {
                            wave,
                            spawned,
                            next_spawn_in: next_spawn_in - budget,
                        };
                        return;
                    }
                    budget -= next_spawn_in;
                    self.spawn_next(wave, spawned, out);
                }
                SchedulerState::WaitingForNextWave { next, remaining } => {
                    if budget < remaining {
                        let remaining = remaining - budget;
                        self.state = SchedulerState::WaitingForNextWave { next, remaining };
                        out.push(Command::UpdateWaveCountdown { remaining });
                        return;
                    }
                    budget -= remaining;
                    self.begin_wave(next, out);
                }
                SchedulerState::Idle
                | SchedulerState::AllWavesComplete
                | SchedulerState::Disabled => return,
            }
        }
    }

    fn begin_wave(&mut self, wave: WaveIndex, out: &mut Vec<Command>) {
        let total = self.total_waves();
        info!(wave = wave.number(), total, "starting wave");
        self.last_wave = Some(wave);
        out.push(Command::BeginWave { wave, total });

        if self.plan(wave).map_or(true, |plan| plan.spawns.is_empty()) {
            self.finish_wave(wave, out);
            return;
        }
        self.state = SchedulerState::Spawning {
            wave,
            spawned: 0,
            next_spawn_in: Duration::ZERO,
        };
    }

    fn spawn_next(&mut self, wave: WaveIndex, spawned: u32, out: &mut Vec<Command>) {
        let Some(plan) = self.plan(wave) else {
            self.state = SchedulerState::AllWavesComplete;
            return;
        };
        let index = usize::try_from(spawned).unwrap_or(usize::MAX);
        let Some(config) = plan.spawns.get(index).cloned() else {
            self.finish_wave(wave, out);
            return;
        };
        let interval = plan.spawn_interval;
        let remaining = plan.spawns.len().saturating_sub(index + 1);
        out.push(Command::SpawnEnemy { config });

        if remaining == 0 {
            self.finish_wave(wave, out);
        } else {
            self.state = SchedulerState::Spawning {
                wave,
                spawned: spawned.saturating_add(1),
                next_spawn_in: interval,
            };
        }
    }

    fn finish_wave(&mut self, wave: WaveIndex, out: &mut Vec<Command>) {
        let (gold, delay) = self
            .plan(wave)
            .map_or((0, Duration::ZERO), |plan| (plan.gold_reward, plan.next_wave_delay));
        out.push(Command::AwardWaveReward { wave, gold });

        let next = WaveIndex::new(wave.get().saturating_add(1));
        if next.get() < self.total_waves() {
            debug!(wave = wave.number(), ?delay, "wave spawned, waiting for next wave");
            self.state = SchedulerState::WaitingForNextWave {
                next,
                remaining: delay,
            };
        } else {
            info!("final wave spawned");
            self.state = SchedulerState::AllWavesComplete;
            out.push(Command::CompleteWaves);
        }
    }

    fn plan(&self, wave: WaveIndex) -> Option<&WavePlan> {
        usize::try_from(wave.get())
            .ok()
            .and_then(|index| self.plans.get(index))
    }
}

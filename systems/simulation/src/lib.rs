#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step orchestrator that owns the world and drives every system in
//! a deterministic order each tick.

use std::time::Duration;

use dice_defence_core::{Command, DieTarget, Event, RunOutcome, TickContext, DEFAULT_SPEED_INDEX};
use dice_defence_system_tower_combat::TowerCombat;
use dice_defence_system_tower_targeting::TowerTargeting;
use dice_defence_system_wave_scheduler::{Campaign, SchedulerConfig, WaveScheduler, WaveState};
use dice_defence_world::{self as world, practice_level, query, story_stage, RulesConfig, World};
use log::info;
use serde::Deserialize;
use thiserror::Error;

/// Frame delta used by headless runs.
pub const FIXED_STEP: Duration = Duration::from_nanos(16_666_667);

const SCHEDULER_SEED_OFFSET: u64 = 1;
const COMBAT_SEED_OFFSET: u64 = 2;

/// Everything needed to start a run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Economy constants.
    pub rules: RulesConfig,
    /// Wave size and cadence.
    pub scheduler: SchedulerConfig,
    /// Seed every random stream derives from.
    pub seed: u64,
    /// Practice level index, used when no stage is set.
    pub level: usize,
    /// Story stage identifier such as `"1-3"`.
    pub stage: Option<String>,
    /// Initial game-speed preset.
    pub speed_index: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            scheduler: SchedulerConfig::default(),
            seed: 0,
            level: 0,
            stage: None,
            speed_index: DEFAULT_SPEED_INDEX,
        }
    }
}

/// Errors raised while setting up a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    /// The requested story stage does not exist.
    #[error("unknown story stage `{0}`")]
    UnknownStage(String),
}

/// A running game: world, scheduler and tower systems.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    scheduler: WaveScheduler,
    targeting: TowerTargeting,
    combat: TowerCombat,
    difficulty: f32,
    commands: Vec<Command>,
    targets: Vec<DieTarget>,
    events: Vec<Event>,
}

impl Simulation {
    /// Builds a run on the configured practice level or story stage.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let (layout, campaign) = match &config.stage {
            Some(id) => {
                let stage =
                    story_stage(id).ok_or_else(|| SimulationError::UnknownStage(id.clone()))?;
                let campaign = Campaign::Stage {
                    waves: stage.waves(),
                    true_boss: stage.has_true_boss(),
                };
                (stage.layout().clone(), campaign)
            }
            None => (practice_level(config.level), Campaign::Endless),
        };
        info!(
            "starting {} (difficulty {:.1}) with seed {}",
            layout.name(),
            layout.difficulty(),
            config.seed
        );

        let scheduler_config = SchedulerConfig {
            seed: config.seed.wrapping_add(SCHEDULER_SEED_OFFSET),
            ..config.scheduler
        };
        let difficulty = layout.difficulty();
        let mut simulation = Self {
            world: World::with_rules(layout, config.rules, config.seed),
            scheduler: WaveScheduler::new(scheduler_config, campaign),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(config.seed.wrapping_add(COMBAT_SEED_OFFSET)),
            difficulty,
            commands: Vec::new(),
            targets: Vec::new(),
            events: Vec::new(),
        };
        let _ = simulation.submit(Command::SetGameSpeed {
            index: config.speed_index,
        });
        Ok(simulation)
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Wave bookkeeping of the scheduler.
    #[must_use]
    pub const fn wave_state(&self) -> &WaveState {
        self.scheduler.state()
    }

    /// Seconds until the next wave starts on its own, while the field is clear.
    #[must_use]
    pub fn time_until_next_wave(&self) -> Option<f32> {
        self.scheduler
            .time_until_next_wave(query::active_enemy_count(&self.world))
    }

    /// Reports whether the run has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        query::outcome(&self.world) != RunOutcome::InProgress
    }

    /// Events produced by the most recent call that mutated the world.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Applies a player command and returns the resulting events.
    pub fn submit(&mut self, command: Command) -> &[Event] {
        self.events.clear();
        world::apply(&mut self.world, command, &mut self.events);
        &self.events
    }

    /// Starts the next wave early if the field is clear.
    pub fn request_next_wave(&mut self) -> bool {
        self.events.clear();
        if self.is_over() {
            return false;
        }
        let active = query::active_enemy_count(&self.world);
        let started = self
            .scheduler
            .request_next_wave(active, self.difficulty, &mut self.commands);
        self.flush_commands();
        started
    }

    /// Starts a fresh run on the same map; coins and class upgrades persist.
    pub fn restart(&mut self) -> &[Event] {
        self.scheduler.reset();
        self.submit(Command::ResetRun)
    }

    /// Advances the run by one frame of `dt` wall-clock time.
    ///
    /// Order: spawns, telegraph zones, enemies, end-of-wave check,
    /// projectiles, dice cooldowns, targeting, firing. Nothing happens once
    /// the run is over.
    pub fn step(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();
        if self.is_over() {
            return &self.events;
        }
        let ctx = TickContext::new(dt, query::game_speed(&self.world));

        self.scheduler
            .spawn(ctx, self.difficulty, &mut self.commands);
        self.commands.push(Command::AdvanceZones { dt });
        self.commands.push(Command::AdvanceEnemies { dt });
        self.flush_commands();

        if !self.is_over() {
            let active = query::active_enemy_count(&self.world);
            self.scheduler
                .advance(ctx, active, self.difficulty, &mut self.commands);
            self.flush_commands();
        }

        self.commands.push(Command::AdvanceProjectiles { dt });
        self.commands.push(Command::AdvanceDice { dt });
        self.flush_commands();

        let dice = query::die_view(&self.world);
        self.targeting.handle(
            query::target_mode(&self.world),
            &dice,
            &query::enemy_view(&self.world),
            &mut self.targets,
        );
        self.combat.handle(
            &dice,
            &self.targets,
            &query::upgrade_view(&self.world),
            &mut self.commands,
        );
        self.flush_commands();

        &self.events
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }
}

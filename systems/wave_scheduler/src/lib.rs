#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that decides when waves start and emits enemy spawn commands.

use dice_defence_core::{Command, EnemyKind, TickContext, WaveKind};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

const REGULAR_BASE_HP: f32 = 30.0;
const HP_WAVE_EXPONENT: f32 = 1.3;
const BASE_SPEED: f32 = 36.0;
const SPEED_PER_WAVE: f32 = 6.0;
const MAX_SPEED_BONUS: f32 = 140.0;
const SPEED_JITTER: f32 = 0.2;

const BIG_HP_MULT: f32 = 6.0;
const BIG_SPEED_MULT: f32 = 0.85;

const BOSS_BASE_HP: f32 = 5_000.0;
const BOSS_HP_PER_WAVE: f32 = 500.0;
const BOSS_DIFFICULTY_EXPONENT: i32 = 3;
const BOSS_SPEED_MULT: f32 = 0.7;

/// Tuning values for wave size and cadence.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two spawns of the same wave.
    pub spawn_interval: f32,
    /// Seconds between a cleared wave and the next one.
    pub wave_delay: f32,
    /// Enemies in the first endless wave before difficulty scaling.
    pub base_count: u32,
    /// Extra enemies per endless wave.
    pub count_growth: u32,
    /// Enemies in the first story wave.
    pub story_base_count: u32,
    /// Extra enemies per story wave.
    pub story_count_growth: u32,
    /// Every n-th endless wave ends with a big enemy.
    pub big_every: u32,
    /// Every n-th endless wave ends with a boss; wins over `big_every`.
    pub boss_every: Option<u32>,
    /// Seed for speed jitter.
    pub seed: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 0.9,
            wave_delay: 5.0,
            base_count: 25,
            count_growth: 1,
            story_base_count: 10,
            story_count_growth: 3,
            big_every: 5,
            boss_every: Some(10),
            seed: 0x0bad_5eed_1234_5678,
        }
    }
}

/// Which wave sequence the scheduler follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Campaign {
    /// Waves continue until the base falls.
    Endless,
    /// A fixed number of waves, won once the last one is cleared.
    Stage {
        /// Waves in the stage.
        waves: u32,
        /// Whether the last wave ends with a boss.
        true_boss: bool,
    },
}

/// Spawn-side state of the current wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveState {
    /// Index of the current wave; `-1` before the first wave.
    pub wave: i32,
    /// Enemies still to be spawned.
    pub to_spawn: u32,
    /// Seconds accumulated toward the next spawn.
    pub spawn_accumulator: f32,
    /// Composition of the current wave.
    pub kind: WaveKind,
    /// Seconds the field has been clear.
    pub wave_timer: f32,
}

impl WaveState {
    const fn new() -> Self {
        Self {
            wave: -1,
            to_spawn: 0,
            spawn_accumulator: 0.0,
            kind: WaveKind::Regular,
            wave_timer: 0.0,
        }
    }
}

/// Pure system that starts waves and emits `SpawnEnemy` commands.
#[derive(Debug)]
pub struct WaveScheduler {
    config: SchedulerConfig,
    campaign: Campaign,
    state: WaveState,
    rng: ChaCha8Rng,
    finished: bool,
}

impl WaveScheduler {
    /// Creates a scheduler resting before the first wave.
    #[must_use]
    pub fn new(config: SchedulerConfig, campaign: Campaign) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            campaign,
            state: WaveState::new(),
            finished: false,
        }
    }

    /// Current wave bookkeeping.
    #[must_use]
    pub const fn state(&self) -> &WaveState {
        &self.state
    }

    /// Seconds until the next wave starts on its own, if the field is clear.
    #[must_use]
    pub fn time_until_next_wave(&self, active_enemies: usize) -> Option<f32> {
        self.field_clear(active_enemies)
            .then(|| (self.config.wave_delay - self.state.wave_timer).max(0.0))
    }

    /// Returns to the state before the first wave.
    pub fn reset(&mut self) {
        self.state = WaveState::new();
        self.finished = false;
    }

    fn field_clear(&self, active_enemies: usize) -> bool {
        self.state.to_spawn == 0 && active_enemies == 0 && !self.finished
    }

    fn wave_kind(&self, wave: u32) -> WaveKind {
        match self.campaign {
            Campaign::Stage { waves, true_boss } => {
                if true_boss && wave + 1 == waves {
                    WaveKind::TrueBoss
                } else {
                    WaveKind::Regular
                }
            }
            Campaign::Endless => {
                let every = |period: u32| wave > 0 && period > 0 && wave % period == 0;
                if self.config.boss_every.is_some_and(every) {
                    WaveKind::TrueBoss
                } else if every(self.config.big_every) {
                    WaveKind::BigEnemy
                } else {
                    WaveKind::Regular
                }
            }
        }
    }

    fn enemy_count(&self, wave: u32, difficulty: f32) -> u32 {
        match self.campaign {
            Campaign::Stage { .. } => {
                self.config.story_base_count + wave * self.config.story_count_growth
            }
            Campaign::Endless => {
                let base = self.config.base_count + wave * self.config.count_growth;
                (base as f32 * difficulty).floor() as u32
            }
        }
    }

    /// Advances to the next wave and emits `BeginWave`.
    pub fn start_wave(&mut self, difficulty: f32, out: &mut Vec<Command>) {
        let wave = u32::try_from(self.state.wave + 1).unwrap_or(0);
        let kind = self.wave_kind(wave);
        let enemy_count = self.enemy_count(wave, difficulty);

        self.state = WaveState {
            wave: self.state.wave + 1,
            to_spawn: enemy_count,
            spawn_accumulator: 0.0,
            kind,
            wave_timer: 0.0,
        };
        out.push(Command::BeginWave {
            wave,
            kind,
            enemy_count,
        });
    }

    /// Emits at most one spawn once the spawn interval elapsed.
    pub fn spawn(&mut self, ctx: TickContext, difficulty: f32, out: &mut Vec<Command>) {
        if self.state.to_spawn == 0 {
            return;
        }

        self.state.spawn_accumulator += ctx.scaled_dt();
        if self.state.spawn_accumulator < self.config.spawn_interval {
            return;
        }

        self.state.spawn_accumulator = 0.0;
        self.state.to_spawn -= 1;
        let last = self.state.to_spawn == 0;
        let wave = self.state.wave.max(0) as u32;
        let kind = if last {
            self.state.kind.finale()
        } else {
            EnemyKind::Regular
        };

        let (hp, speed) = self.enemy_stats(kind, wave, difficulty);
        if last {
            debug!("wave {wave} finale spawned as {kind:?}");
        }
        out.push(Command::SpawnEnemy {
            kind,
            hp,
            speed,
            carries_coin: last,
        });
    }

    fn enemy_stats(&mut self, kind: EnemyKind, wave: u32, difficulty: f32) -> (f32, f32) {
        let wave_num = (wave + 1) as f32;
        let hp = REGULAR_BASE_HP * wave_num.powf(HP_WAVE_EXPONENT) * difficulty;
        let jitter = 1.0 - SPEED_JITTER / 2.0 + SPEED_JITTER * self.rng.gen::<f32>();
        let speed = (BASE_SPEED + (SPEED_PER_WAVE * wave as f32).min(MAX_SPEED_BONUS)) * jitter;

        match kind {
            EnemyKind::Regular => (hp, speed),
            EnemyKind::Big => (hp * BIG_HP_MULT, speed * BIG_SPEED_MULT),
            EnemyKind::Boss => (
                (BOSS_BASE_HP + BOSS_HP_PER_WAVE * wave as f32)
                    * difficulty.powi(BOSS_DIFFICULTY_EXPONENT),
                speed * BOSS_SPEED_MULT,
            ),
        }
    }

    /// Runs the end-of-wave check after enemies moved.
    ///
    /// Once the field is clear the inter-wave timer runs and starts the next
    /// wave on expiry. A finished stage emits `DeclareVictory` instead.
    pub fn advance(
        &mut self,
        ctx: TickContext,
        active_enemies: usize,
        difficulty: f32,
        out: &mut Vec<Command>,
    ) {
        if !self.field_clear(active_enemies) {
            return;
        }

        if let Campaign::Stage { waves, .. } = self.campaign {
            if self.state.wave + 1 >= waves as i32 {
                self.finished = true;
                out.push(Command::DeclareVictory);
                return;
            }
        }

        self.state.wave_timer += ctx.scaled_dt();
        if self.state.wave_timer >= self.config.wave_delay {
            self.start_wave(difficulty, out);
        }
    }

    /// Starts the next wave immediately if the field is clear.
    pub fn request_next_wave(
        &mut self,
        active_enemies: usize,
        difficulty: f32,
        out: &mut Vec<Command>,
    ) -> bool {
        if !self.field_clear(active_enemies) {
            return false;
        }
        if let Campaign::Stage { waves, .. } = self.campaign {
            if self.state.wave + 1 >= waves as i32 {
                return false;
            }
        }
        self.start_wave(difficulty, out);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(dt: f32) -> TickContext {
        TickContext::from_seconds(dt, 1.0)
    }

    fn begin(commands: &[Command]) -> Option<(u32, WaveKind, u32)> {
        commands.iter().find_map(|command| match command {
            Command::BeginWave {
                wave,
                kind,
                enemy_count,
            } => Some((*wave, *kind, *enemy_count)),
            _ => None,
        })
    }

    #[test]
    fn endless_waves_scale_with_difficulty() {
        let mut scheduler = WaveScheduler::new(SchedulerConfig::default(), Campaign::Endless);
        let mut out = Vec::new();
        scheduler.start_wave(1.2, &mut out);
        assert_eq!(begin(&out), Some((0, WaveKind::Regular, 30)));
        assert_eq!(scheduler.state().wave, 0);

        out.clear();
        scheduler.start_wave(1.0, &mut out);
        assert_eq!(begin(&out), Some((1, WaveKind::Regular, 26)));
    }

    #[test]
    fn special_waves_follow_their_period() {
        let scheduler = WaveScheduler::new(SchedulerConfig::default(), Campaign::Endless);
        assert_eq!(scheduler.wave_kind(0), WaveKind::Regular);
        assert_eq!(scheduler.wave_kind(5), WaveKind::BigEnemy);
        assert_eq!(scheduler.wave_kind(10), WaveKind::TrueBoss);
        assert_eq!(scheduler.wave_kind(15), WaveKind::BigEnemy);
        assert_eq!(scheduler.wave_kind(20), WaveKind::TrueBoss);
    }

    #[test]
    fn story_waves_grow_by_three_and_end_with_boss() {
        let campaign = Campaign::Stage {
            waves: 5,
            true_boss: true,
        };
        let scheduler = WaveScheduler::new(SchedulerConfig::default(), campaign);
        assert_eq!(scheduler.enemy_count(0, 1.5), 10);
        assert_eq!(scheduler.enemy_count(4, 1.5), 22);
        assert_eq!(scheduler.wave_kind(3), WaveKind::Regular);
        assert_eq!(scheduler.wave_kind(4), WaveKind::TrueBoss);
    }

    #[test]
    fn spawns_one_enemy_per_interval() {
        let mut scheduler = WaveScheduler::new(SchedulerConfig::default(), Campaign::Endless);
        let mut out = Vec::new();
        scheduler.start_wave(1.0, &mut out);
        out.clear();

        scheduler.spawn(ctx(0.5), 1.0, &mut out);
        assert!(out.is_empty());
        scheduler.spawn(ctx(0.5), 1.0, &mut out);
        assert_eq!(out.len(), 1);
        scheduler.spawn(ctx(5.0), 1.0, &mut out);
        assert_eq!(out.len(), 2, "at most one spawn per frame");
        assert_eq!(scheduler.state().to_spawn, 23);
    }

    #[test]
    fn regular_stats_follow_wave_formula() {
        let mut scheduler = WaveScheduler::new(SchedulerConfig::default(), Campaign::Endless);
        let (hp, speed) = scheduler.enemy_stats(EnemyKind::Regular, 0, 1.0);
        assert!((hp - 30.0).abs() < 1e-4);
        assert!((32.4..=39.6).contains(&speed));

        let (hp, speed) = scheduler.enemy_stats(EnemyKind::Regular, 30, 1.0);
        assert!((hp - 30.0 * 31f32.powf(1.3)).abs() < 1e-1);
        assert!(speed <= 176.0 * 1.1 + 1e-3);
    }

    #[test]
    fn special_stats_scale_the_regular_ones() {
        let mut scheduler = WaveScheduler::new(SchedulerConfig::default(), Campaign::Endless);
        let (big_hp, big_speed) = scheduler.enemy_stats(EnemyKind::Big, 4, 1.0);
        assert!((big_hp - 6.0 * 30.0 * 5f32.powf(1.3)).abs() < 1e-1);
        assert!(big_speed <= (36.0 + 24.0) * 1.1 * 0.85 + 1e-3);

        let (boss_hp, _) = scheduler.enemy_stats(EnemyKind::Boss, 4, 1.5);
        assert!((boss_hp - 7_000.0 * 3.375).abs() < 1e-1);
    }

    #[test]
    fn finished_stage_declares_victory_once() {
        let campaign = Campaign::Stage {
            waves: 1,
            true_boss: false,
        };
        let mut scheduler = WaveScheduler::new(SchedulerConfig::default(), campaign);
        let mut out = Vec::new();
        scheduler.start_wave(1.0, &mut out);
        scheduler.state.to_spawn = 0;
        out.clear();

        scheduler.advance(ctx(0.1), 0, 1.0, &mut out);
        scheduler.advance(ctx(0.1), 0, 1.0, &mut out);
        assert_eq!(out, vec![Command::DeclareVictory]);
        assert!(!scheduler.request_next_wave(0, 1.0, &mut out));
    }
}

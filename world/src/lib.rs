#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Dice Defence.

mod boss;
mod dice;
mod economy;
mod enemy;
mod grid;
mod levels;
mod loadout;
mod projectiles;
mod status;
mod zones;

use std::time::Duration;

use dice_defence_core::{
    CellCoord, Command, DieKind, EnemyId, Event, PlacementError, ProjectileId, ProjectileSpec,
    RemovalCause, RunOutcome, TargetMode, TickContext, DEFAULT_SPEED_INDEX, GAME_SPEEDS,
    WELCOME_BANNER,
};
use log::{debug, info, warn};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

pub use economy::{
    InGameUpgrades, Progression, PurchaseOutcome, CLASS_UPGRADE_COST, MAX_UPGRADE_LEVEL,
};
pub use grid::Grid;
pub use levels::{
    practice_level, story_stage, story_stages, BoardShape, Layout, StoryStage,
    PRACTICE_LEVEL_COUNT,
};
pub use loadout::Loadout;
pub use projectiles::ProjectileSnapshot;
pub use zones::TelegraphZone;

use dice::Die;
use enemy::{Enemy, EnemyAction};
use projectiles::Projectile;

const WORLD_SEED: u64 = 0x5eed_d1ce_0f_dead;
const TELEGRAPH_RADIUS_CELLS: f32 = 1.5;
const GAME_OVER_COINS_PER_WAVE: u32 = 10;
const GAME_OVER_MIN_COINS: u32 = 5;

/// Economy constants for a run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Money available when a run starts.
    pub start_money: u32,
    /// Enemies that may reach the base before the run is lost.
    pub base_hp: i32,
    /// Price of the first die.
    pub die_cost: u32,
    /// Price increase after every die bought.
    pub die_cost_step: u32,
    /// Money returned by a merge.
    pub merge_refund: u32,
    /// Dice destroyed by one boss attack.
    pub attack_destroy_count: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            start_money: 100,
            base_hp: 10,
            die_cost: 10,
            die_cost_step: 10,
            merge_refund: 3,
            attack_destroy_count: 1,
        }
    }
}

/// Represents the authoritative Dice Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    rules: RulesConfig,
    layout: Layout,
    grid: Grid,
    enemies: Vec<Enemy>,
    projectiles: Vec<Projectile>,
    zones: Vec<TelegraphZone>,
    money: u32,
    base_hp: i32,
    die_cost: u32,
    upgrades: InGameUpgrades,
    progression: Progression,
    loadout: Loadout,
    target_mode: TargetMode,
    speed_index: usize,
    wave: Option<u32>,
    outcome: RunOutcome,
    coins_awarded: bool,
    next_enemy_id: u32,
    next_projectile_id: u32,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world on the first practice level with default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(practice_level(0), RulesConfig::default(), WORLD_SEED)
    }

    /// Creates a world on the provided map.
    #[must_use]
    pub fn with_rules(layout: Layout, rules: RulesConfig, seed: u64) -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: layout.build_grid(),
            layout,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            zones: Vec::new(),
            money: rules.start_money,
            base_hp: rules.base_hp,
            die_cost: rules.die_cost,
            upgrades: InGameUpgrades::new(),
            progression: Progression::new(),
            loadout: Loadout::new(),
            target_mode: TargetMode::default(),
            speed_index: DEFAULT_SPEED_INDEX,
            wave: None,
            outcome: RunOutcome::InProgress,
            coins_awarded: false,
            next_enemy_id: 0,
            next_projectile_id: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            rules,
        }
    }

    fn game_speed(&self) -> f32 {
        GAME_SPEEDS[self.speed_index]
    }

    fn scaled(&self, dt: Duration) -> f32 {
        TickContext::new(dt, self.game_speed()).scaled_dt()
    }

    fn wave_index(&self) -> u32 {
        self.wave.unwrap_or(0)
    }

    fn waves_reached(&self) -> u32 {
        self.wave.map_or(0, |wave| wave + 1)
    }

    fn reset_run(&mut self) {
        self.grid = self.layout.build_grid();
        self.enemies.clear();
        self.projectiles.clear();
        self.zones.clear();
        self.money = self.rules.start_money;
        self.base_hp = self.rules.base_hp;
        self.die_cost = self.rules.die_cost;
        self.upgrades = InGameUpgrades::new();
        self.wave = None;
        self.outcome = RunOutcome::InProgress;
        self.coins_awarded = false;
    }

    fn advance_enemies(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let mut actions = Vec::new();
        for enemy in &mut self.enemies {
            let zone_mult = zones::enemy_speed_multiplier(&self.zones, enemy.position());
            let tick = enemy.update(dt, zone_mult, &mut self.rng);
            if let Some((from, to)) = tick.boss_transition {
                debug!("boss {} switched from {from:?} to {to:?}", enemy.id().get());
                out_events.push(Event::BossStateChanged {
                    enemy: enemy.id(),
                    from,
                    to,
                });
            }
            if let Some(action) = tick.action {
                actions.push(action);
            }
        }

        for action in actions {
            match action {
                EnemyAction::CastTelegraph => self.cast_telegraph(out_events),
                EnemyAction::DestroyDice => self.destroy_dice(out_events),
            }
        }
        self.reap_enemies(out_events);
    }

    fn cast_telegraph(&mut self, out_events: &mut Vec<Event>) {
        let center_cell = self.grid.center_cell();
        let column = offset_within(center_cell.column(), self.grid.columns(), &mut self.rng);
        let row = offset_within(center_cell.row(), self.grid.rows(), &mut self.rng);
        let center = self.grid.center_of(CellCoord::new(column, row));
        let radius = self.grid.cell_size() * TELEGRAPH_RADIUS_CELLS;

        self.zones.push(TelegraphZone::new(center, radius));
        out_events.push(Event::TelegraphCast { center, radius });
    }

    fn destroy_dice(&mut self, out_events: &mut Vec<Event>) {
        let occupied = self.grid.occupied_cells();
        let doomed: Vec<CellCoord> = occupied
            .choose_multiple(&mut self.rng, self.rules.attack_destroy_count)
            .copied()
            .collect();
        for cell in doomed {
            if let Some(die) = self.grid.remove(cell) {
                debug!("boss attack destroyed {} at {cell}", die.kind());
                out_events.push(Event::DieRemoved {
                    cell,
                    kind: die.kind(),
                    cause: RemovalCause::BossAttack,
                });
            }
        }
    }

    fn reap_enemies(&mut self, out_events: &mut Vec<Event>) {
        if self.enemies.iter().all(Enemy::is_active) {
            return;
        }

        let (finished, active): (Vec<Enemy>, Vec<Enemy>) = std::mem::take(&mut self.enemies)
            .into_iter()
            .partition(|enemy| !enemy.is_active());
        self.enemies = active;

        for enemy in finished {
            if enemy.is_dead() {
                self.reward_kill(&enemy, out_events);
            } else if enemy.has_reached() {
                self.base_hp -= 1;
                debug!("enemy {} reached the base", enemy.id().get());
                out_events.push(Event::EnemyReachedGoal {
                    enemy: enemy.id(),
                    kind: enemy.kind(),
                    base_hp: self.base_hp,
                });
            }
        }

        if self.base_hp <= 0 && self.outcome == RunOutcome::InProgress {
            self.outcome = RunOutcome::Defeat;
            let waves = self.waves_reached();
            info!("game over after {waves} waves");
            out_events.push(Event::GameOver { waves });
            self.award_game_over_coins(out_events);
        }
    }

    fn reward_kill(&mut self, enemy: &Enemy, out_events: &mut Vec<Event>) {
        let reward = (enemy.money_drop() + self.wave_index() as f32) as u32;
        self.money = self.money.saturating_add(reward);
        debug!("enemy {} died for ${reward}", enemy.id().get());
        out_events.push(Event::EnemyDied {
            enemy: enemy.id(),
            kind: enemy.kind(),
            reward,
            carried_coin: enemy.carries_coin(),
        });
        if enemy.carries_coin() {
            self.earn_coins(1, out_events);
        }
    }

    fn award_game_over_coins(&mut self, out_events: &mut Vec<Event>) {
        if self.coins_awarded {
            return;
        }
        self.coins_awarded = true;
        let amount = (self.waves_reached() * GAME_OVER_COINS_PER_WAVE).max(GAME_OVER_MIN_COINS);
        self.earn_coins(amount, out_events);
    }

    fn earn_coins(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        let total = self.progression.earn(amount);
        out_events.push(Event::CoinsEarned { amount, total });
    }

    fn advance_projectiles(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let enemies = &mut self.enemies;
        self.projectiles.retain_mut(|projectile| {
            let Some(outcome) = projectile.advance(dt, enemies.as_mut_slice()) else {
                return true;
            };
            out_events.push(Event::ProjectileResolved {
                projectile: projectile.id(),
                outcome,
            });
            false
        });
        self.reap_enemies(out_events);
    }

    fn advance_dice(&mut self, dt: f32) {
        let fire_rate = self.upgrades.fire_rate_multiplier();
        for (center, die) in self.grid.dice_mut() {
            let zone_mult = zones::die_period_multiplier(&self.zones, center);
            let period = die.kind().base_period(die.level())
                * self.progression.fire_period_multiplier(die.kind())
                / fire_rate
                * zone_mult;
            die.advance(dt, period);
        }
    }

    fn fire(
        &mut self,
        cell: CellCoord,
        target: EnemyId,
        spec: ProjectileSpec,
        out_events: &mut Vec<Event>,
    ) {
        let Some(die) = self.grid.get_mut(cell) else {
            warn!("ignoring shot from empty cell {cell}");
            return;
        };
        if !die.consume_ready() {
            warn!("ignoring shot from {cell} before its cooldown elapsed");
            return;
        }
        if !self
            .enemies
            .iter()
            .any(|enemy| enemy.id() == target && enemy.is_active())
        {
            return;
        }

        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id += 1;
        let origin = self.grid.center_of(cell);
        self.projectiles
            .push(Projectile::new(id, cell, origin, target, spec));
        out_events.push(Event::ProjectileFired {
            projectile: id,
            die: cell,
            target,
        });
    }

    fn check_placement(&self) -> Result<(), PlacementError> {
        if self.outcome != RunOutcome::InProgress {
            return Err(PlacementError::RunOver);
        }
        if self.money < self.die_cost {
            return Err(PlacementError::InsufficientFunds {
                cost: self.die_cost,
            });
        }
        Ok(())
    }

    fn summon(&mut self) -> Result<(CellCoord, DieKind), PlacementError> {
        self.check_placement()?;
        let empty = self.grid.empty_cells();
        let cell = *empty
            .choose(&mut self.rng)
            .ok_or(PlacementError::NoFreeCell)?;
        let kind = *self
            .loadout
            .selected()
            .choose(&mut self.rng)
            .ok_or(PlacementError::EmptyLoadout)?;
        self.buy_die(cell, kind)?;
        Ok((cell, kind))
    }

    fn place(&mut self, cell: CellCoord, kind: DieKind) -> Result<(), PlacementError> {
        self.check_placement()?;
        if !self.grid.in_bounds(cell) {
            return Err(PlacementError::InvalidCell);
        }
        self.buy_die(cell, kind)
    }

    fn buy_die(&mut self, cell: CellCoord, kind: DieKind) -> Result<(), PlacementError> {
        self.grid
            .place(cell, Die::new(kind, 1))
            .map_err(|_| PlacementError::Occupied)?;
        self.money -= self.die_cost;
        self.die_cost += self.rules.die_cost_step;
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks `center - 1`, `center` or `center + 1`, clamped to `0..limit`.
fn offset_within<R: Rng>(center: u32, limit: u32, rng: &mut R) -> u32 {
    let offset: i64 = rng.gen_range(-1..=1);
    (i64::from(center) + offset).clamp(0, i64::from(limit.saturating_sub(1))) as u32
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetGameSpeed { index } => {
            if index >= GAME_SPEEDS.len() {
                warn!("game speed index {index} out of range; clamping");
            }
            world.speed_index = index.min(GAME_SPEEDS.len() - 1);
            out_events.push(Event::GameSpeedChanged {
                game_speed: world.game_speed(),
            });
        }
        Command::SetTargetMode { mode } => {
            world.target_mode = mode;
            out_events.push(Event::TargetModeChanged { mode });
        }
        Command::BeginWave {
            wave,
            kind,
            enemy_count,
        } => {
            if world.outcome != RunOutcome::InProgress {
                warn!("ignoring wave {wave} after the run ended");
                return;
            }
            world.wave = Some(wave);
            world.zones.clear();
            info!(
                "wave {} started with {enemy_count} enemies ({kind:?})",
                wave + 1
            );
            out_events.push(Event::WaveStarted {
                wave,
                kind,
                enemy_count,
            });
        }
        Command::SpawnEnemy {
            kind,
            hp,
            speed,
            carries_coin,
        } => {
            let id = EnemyId::new(world.next_enemy_id);
            world.next_enemy_id += 1;
            world.enemies.push(Enemy::new(
                id,
                kind,
                world.layout.path().to_vec(),
                hp,
                speed,
                carries_coin,
            ));
            out_events.push(Event::EnemySpawned { enemy: id, kind });
        }
        Command::AdvanceZones { dt } => {
            let dt = world.scaled(dt);
            for zone in &mut world.zones {
                zone.advance(dt);
            }
            world.zones.retain(TelegraphZone::is_active);
        }
        Command::AdvanceEnemies { dt } => {
            let dt = world.scaled(dt);
            world.advance_enemies(dt, out_events);
        }
        Command::AdvanceProjectiles { dt } => {
            let dt = world.scaled(dt);
            world.advance_projectiles(dt, out_events);
        }
        Command::AdvanceDice { dt } => {
            let dt = world.scaled(dt);
            world.advance_dice(dt);
        }
        Command::FireProjectile {
            die,
            target,
            projectile,
        } => world.fire(die, target, projectile, out_events),
        Command::SummonDie => match world.summon() {
            Ok((cell, kind)) => out_events.push(Event::DiePlaced {
                cell,
                kind,
                money: world.money,
            }),
            Err(reason) => out_events.push(Event::DiePlacementRejected { reason }),
        },
        Command::PlaceDie { cell, kind } => match world.place(cell, kind) {
            Ok(()) => out_events.push(Event::DiePlaced {
                cell,
                kind,
                money: world.money,
            }),
            Err(reason) => out_events.push(Event::DiePlacementRejected { reason }),
        },
        Command::MergeDice { from, into } => match world.grid.merge(from, into) {
            Ok(die) => {
                let (kind, level) = (die.kind(), die.level());
                world.money = world.money.saturating_add(world.rules.merge_refund);
                out_events.push(Event::DiceMerged {
                    from,
                    into,
                    kind,
                    level,
                });
            }
            Err(reason) => out_events.push(Event::MergeRejected { from, into, reason }),
        },
        Command::TrashDie { cell } => match world.grid.remove(cell) {
            Some(die) => out_events.push(Event::DieRemoved {
                cell,
                kind: die.kind(),
                cause: RemovalCause::Trash,
            }),
            None => warn!("ignoring trash request for empty cell {cell}"),
        },
        Command::PurchaseUpgrade { kind } => {
            let outcome = world.upgrades.purchase(kind, world.money);
            world.money = outcome.money;
            match outcome.result {
                Ok(level) => out_events.push(Event::UpgradePurchased {
                    kind,
                    level,
                    money: outcome.money,
                }),
                Err(reason) => out_events.push(Event::UpgradeRejected { kind, reason }),
            }
        }
        Command::PurchaseClassUpgrade { die, upgrade } => {
            match world.progression.purchase(die, upgrade) {
                Ok(coins) => out_events.push(Event::ClassUpgradePurchased {
                    die,
                    upgrade,
                    coins,
                }),
                Err(reason) => out_events.push(Event::ClassUpgradeRejected {
                    die,
                    upgrade,
                    reason,
                }),
            }
        }
        Command::ToggleLoadout { kind } => {
            world.loadout.toggle(kind);
            out_events.push(Event::LoadoutChanged {
                selected: world.loadout.selected().to_vec(),
            });
        }
        Command::DeclareVictory => {
            if world.outcome != RunOutcome::InProgress {
                return;
            }
            world.outcome = RunOutcome::Victory;
            let waves = world.waves_reached();
            info!("stage cleared after {waves} waves");
            out_events.push(Event::StageCleared { waves });
        }
        Command::ResetRun => {
            world.reset_run();
            out_events.push(Event::RunReset {
                money: world.money,
                base_hp: world.base_hp,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use dice_defence_core::{
        DieSnapshot, DieView, EnemyView, RunOutcome, TargetMode, UpgradeView, GAME_SPEEDS,
    };

    use super::{
        dice::BASE_RANGE, InGameUpgrades, Layout, Loadout, ProjectileSnapshot, TelegraphZone,
        World,
    };
    use crate::Grid;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Map being played.
    #[must_use]
    pub fn layout(world: &World) -> &Layout {
        &world.layout
    }

    /// Dice board geometry and valid cells.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Captures a read-only view of the enemies on the path.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Number of enemies neither dead nor at the base.
    #[must_use]
    pub fn active_enemy_count(world: &World) -> usize {
        world.enemies.iter().filter(|enemy| enemy.is_active()).count()
    }

    /// Captures a read-only view of the placed dice.
    #[must_use]
    pub fn die_view(world: &World) -> DieView {
        let range = BASE_RANGE * world.upgrades.range_multiplier();
        let snapshots = world
            .grid
            .occupied_cells()
            .into_iter()
            .filter_map(|cell| {
                world.grid.get(cell).map(|die| DieSnapshot {
                    cell,
                    kind: die.kind(),
                    level: die.level(),
                    center: world.grid.center_of(cell),
                    range,
                    ready: die.is_ready(),
                })
            })
            .collect();
        DieView::from_snapshots(snapshots)
    }

    /// Damage and crit modifiers per die kind.
    #[must_use]
    pub fn upgrade_view(world: &World) -> UpgradeView {
        world.progression.upgrade_view(&world.upgrades)
    }

    /// Run-scoped upgrade levels.
    #[must_use]
    pub fn in_game_upgrades(world: &World) -> &InGameUpgrades {
        &world.upgrades
    }

    /// Projectiles in flight, in firing order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Telegraph zones still warning or in effect.
    #[must_use]
    pub fn zones(world: &World) -> &[TelegraphZone] {
        &world.zones
    }

    /// Money available to spend.
    #[must_use]
    pub fn money(world: &World) -> u32 {
        world.money
    }

    /// Remaining base hp.
    #[must_use]
    pub fn base_hp(world: &World) -> i32 {
        world.base_hp
    }

    /// Price of the next die.
    #[must_use]
    pub fn die_cost(world: &World) -> u32 {
        world.die_cost
    }

    /// Coins held across runs.
    #[must_use]
    pub fn coins(world: &World) -> u32 {
        world.progression.coins()
    }

    /// Index of the active wave, `None` before the first wave.
    #[must_use]
    pub fn wave(world: &World) -> Option<u32> {
        world.wave
    }

    /// State of the run.
    #[must_use]
    pub fn outcome(world: &World) -> RunOutcome {
        world.outcome
    }

    /// Active game-speed multiplier.
    #[must_use]
    pub fn game_speed(world: &World) -> f32 {
        GAME_SPEEDS[world.speed_index]
    }

    /// Global targeting policy.
    #[must_use]
    pub fn target_mode(world: &World) -> TargetMode {
        world.target_mode
    }

    /// Kinds eligible for summoning.
    #[must_use]
    pub fn loadout(world: &World) -> &Loadout {
        &world.loadout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_defence_core::{
        BossState, ClassUpgrade, EnemyKind, Impact, MergeError, Point, ProjectileOutcome,
        PurchaseError, UpgradeKind, WaveKind,
    };

    const FRAME: Duration = Duration::from_millis(100);

    fn straight_world() -> World {
        let mut world = World::new();
        world.layout = Layout::from_path(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        world
    }

    fn spawn(world: &mut World, kind: EnemyKind, hp: f32, speed: f32, coin: bool) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEnemy {
                kind,
                hp,
                speed,
                carries_coin: coin,
            },
            &mut events,
        );
        events
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn new_world_matches_default_rules() {
        let world = World::new();
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(query::money(&world), 100);
        assert_eq!(query::base_hp(&world), 10);
        assert_eq!(query::die_cost(&world), 10);
        assert_eq!(query::wave(&world), None);
        assert_eq!(query::game_speed(&world), 1.0);
        assert_eq!(query::target_mode(&world), TargetMode::First);
    }

    #[test]
    fn enemy_moves_by_speed_times_dt() {
        let mut world = straight_world();
        let _ = spawn(&mut world, EnemyKind::Regular, 100.0, 10.0, false);
        let _ = run(
            &mut world,
            Command::AdvanceEnemies {
                dt: Duration::from_secs(5),
            },
        );

        let view = query::enemy_view(&world);
        let enemy = view.iter().next().map(|snapshot| snapshot.position.x);
        assert_eq!(enemy.map(|x| (x - 50.0).abs() < 1e-3), Some(true));
    }

    #[test]
    fn game_speed_dilates_movement() {
        let mut world = straight_world();
        let _ = run(&mut world, Command::SetGameSpeed { index: 2 });
        let _ = spawn(&mut world, EnemyKind::Regular, 100.0, 10.0, false);
        let _ = run(
            &mut world,
            Command::AdvanceEnemies {
                dt: Duration::from_secs(2),
            },
        );

        let x = query::enemy_view(&world).into_vec()[0].position.x;
        assert!((x - 40.0).abs() < 1e-3);
    }

    #[test]
    fn out_of_range_speed_index_clamps() {
        let mut world = World::new();
        let events = run(&mut world, Command::SetGameSpeed { index: 42 });
        assert_eq!(events, vec![Event::GameSpeedChanged { game_speed: 8.0 }]);
    }

    #[test]
    fn kill_awards_money_plus_wave_and_coin() {
        let mut world = straight_world();
        let _ = run(
            &mut world,
            Command::BeginWave {
                wave: 3,
                kind: WaveKind::Regular,
                enemy_count: 1,
            },
        );
        let _ = spawn(&mut world, EnemyKind::Regular, 5.0, 0.0, true);
        world.enemies[0].status_mut().apply_poison(100.0, 1.0);

        let events = run(&mut world, Command::AdvanceEnemies { dt: FRAME });
        assert!(events.contains(&Event::EnemyDied {
            enemy: EnemyId::new(0),
            kind: EnemyKind::Regular,
            reward: 13,
            carried_coin: true,
        }));
        assert!(events.contains(&Event::CoinsEarned { amount: 1, total: 1 }));
        assert_eq!(query::money(&world), 113);
        assert_eq!(query::active_enemy_count(&world), 0);
    }

    #[test]
    fn reaching_goal_costs_one_base_hp_and_can_end_the_run() {
        let mut world = straight_world();
        world.base_hp = 1;
        let _ = spawn(&mut world, EnemyKind::Regular, 5.0, 1_000.0, false);

        let events = run(&mut world, Command::AdvanceEnemies { dt: FRAME });
        assert!(events.contains(&Event::EnemyReachedGoal {
            enemy: EnemyId::new(0),
            kind: EnemyKind::Regular,
            base_hp: 0,
        }));
        assert!(events.contains(&Event::GameOver { waves: 0 }));
        assert!(events.contains(&Event::CoinsEarned { amount: 5, total: 5 }));
        assert_eq!(query::outcome(&world), RunOutcome::Defeat);

        let _ = spawn(&mut world, EnemyKind::Regular, 5.0, 1_000.0, false);
        let again = run(&mut world, Command::AdvanceEnemies { dt: FRAME });
        assert!(!again
            .iter()
            .any(|event| matches!(event, Event::GameOver { .. } | Event::CoinsEarned { .. })));
    }

    #[test]
    fn summon_charges_rising_cost() {
        let mut world = World::new();
        let first = run(&mut world, Command::SummonDie);
        assert!(matches!(first[..], [Event::DiePlaced { money: 90, .. }]));
        assert_eq!(query::die_cost(&world), 20);

        let second = run(&mut world, Command::SummonDie);
        assert!(matches!(second[..], [Event::DiePlaced { money: 70, .. }]));
        assert_eq!(query::die_view(&world).iter().count(), 2);
    }

    #[test]
    fn summon_rejections_leave_money_untouched() {
        let mut world = World::new();
        world.money = 5;
        assert_eq!(
            run(&mut world, Command::SummonDie),
            vec![Event::DiePlacementRejected {
                reason: PlacementError::InsufficientFunds { cost: 10 }
            }]
        );

        world.money = 10_000;
        for _ in 0..15 {
            let _ = run(&mut world, Command::SummonDie);
        }
        let money = query::money(&world);
        assert_eq!(
            run(&mut world, Command::SummonDie),
            vec![Event::DiePlacementRejected {
                reason: PlacementError::NoFreeCell
            }]
        );
        assert_eq!(query::money(&world), money);
    }

    #[test]
    fn placement_validates_cell() {
        let mut world = World::new();
        let cell = CellCoord::new(0, 0);
        let placed = run(
            &mut world,
            Command::PlaceDie {
                cell,
                kind: DieKind::Iron,
            },
        );
        assert_eq!(
            placed,
            vec![Event::DiePlaced {
                cell,
                kind: DieKind::Iron,
                money: 90
            }]
        );
        assert_eq!(
            run(
                &mut world,
                Command::PlaceDie {
                    cell,
                    kind: DieKind::Iron
                }
            ),
            vec![Event::DiePlacementRejected {
                reason: PlacementError::Occupied
            }]
        );
        assert_eq!(
            run(
                &mut world,
                Command::PlaceDie {
                    cell: CellCoord::new(7, 0),
                    kind: DieKind::Iron
                }
            ),
            vec![Event::DiePlacementRejected {
                reason: PlacementError::InvalidCell
            }]
        );
        assert_eq!(query::money(&world), 90);
    }

    #[test]
    fn merge_refunds_and_promotes() {
        let mut world = World::new();
        let a = CellCoord::new(0, 0);
        let b = CellCoord::new(1, 0);
        let _ = run(&mut world, Command::PlaceDie { cell: a, kind: DieKind::Wind });
        let _ = run(&mut world, Command::PlaceDie { cell: b, kind: DieKind::Wind });
        let money = query::money(&world);

        let events = run(&mut world, Command::MergeDice { from: a, into: b });
        assert_eq!(
            events,
            vec![Event::DiceMerged {
                from: a,
                into: b,
                kind: DieKind::Wind,
                level: 2
            }]
        );
        assert_eq!(query::money(&world), money + 3);

        let rejected = run(&mut world, Command::MergeDice { from: a, into: b });
        assert_eq!(
            rejected,
            vec![Event::MergeRejected {
                from: a,
                into: b,
                reason: MergeError::EmptyCell
            }]
        );
    }

    #[test]
    fn trash_removes_without_refund() {
        let mut world = World::new();
        let cell = CellCoord::new(2, 2);
        let _ = run(&mut world, Command::PlaceDie { cell, kind: DieKind::Fire });
        let money = query::money(&world);

        let events = run(&mut world, Command::TrashDie { cell });
        assert_eq!(
            events,
            vec![Event::DieRemoved {
                cell,
                kind: DieKind::Fire,
                cause: RemovalCause::Trash
            }]
        );
        assert_eq!(query::money(&world), money);
        assert!(run(&mut world, Command::TrashDie { cell }).is_empty());
    }

    #[test]
    fn boss_attack_destroys_an_occupied_cell() {
        let mut world = straight_world();
        let cell = CellCoord::new(1, 1);
        let _ = run(&mut world, Command::PlaceDie { cell, kind: DieKind::Single });
        let _ = spawn(&mut world, EnemyKind::Boss, 1_000.0, 0.0, false);
        if let Some(brain) = world.enemies[0].brain_mut() {
            brain.force(BossState::Attack, 0.0, [0.0; 3]);
        }

        let events = run(&mut world, Command::AdvanceEnemies { dt: FRAME });
        assert!(events.contains(&Event::DieRemoved {
            cell,
            kind: DieKind::Single,
            cause: RemovalCause::BossAttack,
        }));
        assert!(events.contains(&Event::BossStateChanged {
            enemy: EnemyId::new(0),
            from: BossState::Attack,
            to: BossState::Idle,
        }));
        assert!(query::die_view(&world).iter().next().is_none());
    }

    #[test]
    fn boss_attack_on_empty_board_is_a_no_op() {
        let mut world = straight_world();
        let _ = spawn(&mut world, EnemyKind::Boss, 1_000.0, 0.0, false);
        if let Some(brain) = world.enemies[0].brain_mut() {
            brain.force(BossState::Attack, 0.0, [0.0; 3]);
        }
        let events = run(&mut world, Command::AdvanceEnemies { dt: FRAME });
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::DieRemoved { .. })));
    }

    #[test]
    fn dice_fire_only_when_ready() {
        let mut world = straight_world();
        let cell = CellCoord::new(0, 0);
        let _ = run(&mut world, Command::PlaceDie { cell, kind: DieKind::Iron });
        let _ = spawn(&mut world, EnemyKind::Regular, 500.0, 0.0, false);
        let shot = Command::FireProjectile {
            die: cell,
            target: EnemyId::new(0),
            projectile: ProjectileSpec {
                damage: 100.0,
                impact: Impact::Single,
                status: None,
            },
        };

        assert!(run(&mut world, shot.clone()).is_empty());

        let _ = run(
            &mut world,
            Command::AdvanceDice {
                dt: Duration::from_secs(2),
            },
        );
        assert_eq!(
            query::die_view(&world).get(cell).map(|die| die.ready),
            Some(true)
        );
        let fired = run(&mut world, shot);
        assert!(matches!(fired[..], [Event::ProjectileFired { .. }]));
        assert_eq!(query::projectiles(&world).len(), 1);
    }

    #[test]
    fn projectile_aimed_at_dead_enemy_is_discarded() {
        let mut world = straight_world();
        let cell = CellCoord::new(0, 0);
        let _ = run(&mut world, Command::PlaceDie { cell, kind: DieKind::Single });
        let _ = spawn(&mut world, EnemyKind::Regular, 50.0, 0.0, false);
        let _ = spawn(&mut world, EnemyKind::Regular, 50.0, 0.0, false);
        let _ = run(
            &mut world,
            Command::AdvanceDice {
                dt: Duration::from_secs(1),
            },
        );
        let _ = run(
            &mut world,
            Command::FireProjectile {
                die: cell,
                target: EnemyId::new(0),
                projectile: ProjectileSpec {
                    damage: 10.0,
                    impact: Impact::Single,
                    status: None,
                },
            },
        );

        let _ = world.enemies[0].hit(1_000.0);
        let events = run(&mut world, Command::AdvanceProjectiles { dt: FRAME });
        assert!(events.contains(&Event::ProjectileResolved {
            projectile: ProjectileId::new(0),
            outcome: ProjectileOutcome::Discarded,
        }));
        let survivors = query::enemy_view(&world).into_vec();
        assert_eq!(survivors.len(), 1);
        assert!((survivors[0].hp - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn upgrades_spend_money_and_coins() {
        let mut world = World::new();
        let bought = run(&mut world, Command::PurchaseUpgrade { kind: UpgradeKind::Range });
        assert_eq!(
            bought,
            vec![Event::UpgradePurchased {
                kind: UpgradeKind::Range,
                level: 2,
                money: 50
            }]
        );
        let range = query::die_view(&world);
        assert!(range.iter().next().is_none());

        let rejected = run(
            &mut world,
            Command::PurchaseClassUpgrade {
                die: DieKind::Single,
                upgrade: ClassUpgrade::Damage,
            },
        );
        assert_eq!(
            rejected,
            vec![Event::ClassUpgradeRejected {
                die: DieKind::Single,
                upgrade: ClassUpgrade::Damage,
                reason: PurchaseError::InsufficientCoins { cost: 50 }
            }]
        );
    }

    #[test]
    fn reset_keeps_coins_and_restores_run_state() {
        let mut world = straight_world();
        world.base_hp = 1;
        let _ = run(&mut world, Command::SummonDie);
        let _ = spawn(&mut world, EnemyKind::Regular, 5.0, 1_000.0, false);
        let _ = run(&mut world, Command::AdvanceEnemies { dt: FRAME });
        assert_eq!(query::outcome(&world), RunOutcome::Defeat);

        let events = run(&mut world, Command::ResetRun);
        assert_eq!(
            events,
            vec![Event::RunReset {
                money: 100,
                base_hp: 10
            }]
        );
        assert_eq!(query::outcome(&world), RunOutcome::InProgress);
        assert_eq!(query::coins(&world), 5);
        assert!(query::die_view(&world).iter().next().is_none());
        assert_eq!(query::die_cost(&world), 10);
    }

    #[test]
    fn starting_a_wave_clears_telegraphs() {
        let mut world = World::new();
        let mut events = Vec::new();
        world.cast_telegraph(&mut events);
        assert_eq!(query::zones(&world).len(), 1);

        let _ = run(
            &mut world,
            Command::BeginWave {
                wave: 0,
                kind: WaveKind::Regular,
                enemy_count: 25,
            },
        );
        assert!(query::zones(&world).is_empty());
    }

    #[test]
    fn victory_is_declared_once() {
        let mut world = World::new();
        let _ = run(
            &mut world,
            Command::BeginWave {
                wave: 4,
                kind: WaveKind::TrueBoss,
                enemy_count: 22,
            },
        );
        assert_eq!(
            run(&mut world, Command::DeclareVictory),
            vec![Event::StageCleared { waves: 5 }]
        );
        assert!(run(&mut world, Command::DeclareVictory).is_empty());
        assert_eq!(query::outcome(&world), RunOutcome::Victory);
    }
}

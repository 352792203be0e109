#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Dice Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what actually happened. Systems consume immutable views such as
//! [`EnemyView`] and [`DieView`] and respond exclusively with new commands.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Dice Defence.";

/// Highest level a die can reach through merging.
pub const MAX_DIE_LEVEL: u8 = 7;

/// Game-speed presets selectable by the player.
pub const GAME_SPEEDS: [f32; 5] = [0.5, 1.0, 2.0, 4.0, 8.0];

/// Index into [`GAME_SPEEDS`] used when a run starts.
pub const DEFAULT_SPEED_INDEX: usize = 1;

/// Frames per second the frame-based balance tables were authored against.
const BALANCE_FPS: f32 = 60.0;

/// Per-tick timing information threaded through every update call.
///
/// The game-speed multiplier dilates time uniformly: every subsystem that
/// advances a timer, a cooldown, or a position consumes [`TickContext::scaled_dt`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    dt: f32,
    game_speed: f32,
}

impl TickContext {
    /// Creates a context from a wall-clock delta and the active game speed.
    #[must_use]
    pub fn new(dt: Duration, game_speed: f32) -> Self {
        Self::from_seconds(dt.as_secs_f32(), game_speed)
    }

    /// Creates a context from a delta expressed in seconds.
    #[must_use]
    pub const fn from_seconds(dt: f32, game_speed: f32) -> Self {
        Self { dt, game_speed }
    }

    /// Unscaled frame delta in seconds.
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Global game-speed multiplier.
    #[must_use]
    pub const fn game_speed(&self) -> f32 {
        self.game_speed
    }

    /// Frame delta after applying the game-speed multiplier.
    #[must_use]
    pub fn scaled_dt(&self) -> f32 {
        self.dt * self.game_speed
    }
}

/// Continuous position expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Moves `step` units toward `target`, stopping exactly on it when the
    /// remaining distance is shorter than the step.
    #[must_use]
    pub fn step_toward(self, target: Point, step: f32) -> Point {
        let distance = self.distance(target);
        if distance <= step || distance <= 0.0 {
            return target;
        }

        let scale = step / distance;
        Point::new(
            self.x + (target.x - self.x) * scale,
            self.y + (target.y - self.y) * scale,
        )
    }

    /// Shortest distance from the point to the segment `start..end`.
    #[must_use]
    pub fn distance_to_segment(self, start: Point, end: Point) -> f32 {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let length_sq = dx * dx + dy * dy;
        if length_sq <= 0.0 {
            return self.distance(start);
        }

        let t = (((self.x - start.x) * dx + (self.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
        self.distance(Point::new(start.x + t * dx, start.y + t * dy))
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// The closed set of die variants a player can field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieKind {
    /// Fast single-target shooter.
    Single,
    /// Chain lightning that hops between enemies.
    Multi,
    /// Weak shots that slow the target.
    Freeze,
    /// Very fast, low damage shooter.
    Wind,
    /// Shots that leave a damage-over-time effect.
    Poison,
    /// Slow heavy shots that always pick the strongest enemy.
    Iron,
    /// Explosive shots with splash damage.
    Fire,
}

impl DieKind {
    /// Every die variant in a stable order.
    pub const ALL: [DieKind; 7] = [
        DieKind::Single,
        DieKind::Multi,
        DieKind::Freeze,
        DieKind::Wind,
        DieKind::Poison,
        DieKind::Iron,
        DieKind::Fire,
    ];

    /// Stable ordinal used to index per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Single => 0,
            Self::Multi => 1,
            Self::Freeze => 2,
            Self::Wind => 3,
            Self::Poison => 4,
            Self::Iron => 5,
            Self::Fire => 6,
        }
    }

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
            Self::Freeze => "freeze",
            Self::Wind => "wind",
            Self::Poison => "poison",
            Self::Iron => "iron",
            Self::Fire => "fire",
        }
    }

    /// Base damage of a single shot before any multiplier.
    #[must_use]
    pub fn base_damage(self, level: u8) -> f32 {
        let steps = f32::from(clamp_level(level) - 1);
        match self {
            Self::Single | Self::Fire => 20.0 + steps * 3.0,
            Self::Iron => 100.0 + steps * 10.0,
            Self::Freeze => exponential_damage(clamp_level(level).saturating_sub(1).max(1)),
            Self::Multi | Self::Wind | Self::Poison => exponential_damage(clamp_level(level)),
        }
    }

    /// Seconds between shots at the given level before upgrades and zones.
    ///
    /// The result is always positive and never increases with level.
    #[must_use]
    pub fn base_period(self, level: u8) -> f32 {
        let level = clamp_level(level);
        let steps = f32::from(level - 1);
        match self {
            Self::Single => 0.45 / (1.10 + steps * 0.02),
            Self::Iron => 2.0,
            Self::Fire => (0.8 - steps * 0.01).max(0.1),
            Self::Wind => (frame_period(level) * 0.4).floor().max(6.0) / BALANCE_FPS,
            Self::Multi | Self::Freeze | Self::Poison => frame_period(level) / BALANCE_FPS,
        }
    }

    /// Whether the die ignores the global targeting mode and picks the
    /// highest-hp enemy in range.
    #[must_use]
    pub const fn targets_strongest(self) -> bool {
        matches!(self, Self::Iron)
    }

    /// Damage multiplier applied when the target is a large enemy or boss.
    #[must_use]
    pub const fn large_target_bonus(self) -> f32 {
        match self {
            Self::Iron => 2.0,
            _ => 1.0,
        }
    }
}

impl fmt::Display for DieKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clamps a requested level into `1..=MAX_DIE_LEVEL`.
#[must_use]
pub fn clamp_level(level: u8) -> u8 {
    level.clamp(1, MAX_DIE_LEVEL)
}

fn exponential_damage(level: u8) -> f32 {
    2f32.powi(i32::from(level) - 1)
}

fn frame_period(level: u8) -> f32 {
    (50.0 - f32::from(level - 1) * 4.0).max(12.0)
}

/// Variants of hostile units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Ordinary wave filler.
    Regular,
    /// Oversized enemy that casts telegraph zones.
    Big,
    /// True boss driven by a skill state machine.
    Boss,
}

impl EnemyKind {
    /// Reports whether damage bonuses against large targets apply.
    #[must_use]
    pub const fn is_large(self) -> bool {
        matches!(self, Self::Big | Self::Boss)
    }
}

/// States of the boss skill machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossState {
    /// Moving along the path, waiting for the shared cooldown.
    Idle,
    /// Halved incoming damage and slowed movement.
    Defense,
    /// Stationary cast that destroys dice on expiry.
    Attack,
    /// Stationary regeneration.
    Heal,
}

impl BossState {
    /// Skill states sharing the global cooldown, in timer-slot order.
    pub const SKILLS: [BossState; 3] = [BossState::Defense, BossState::Attack, BossState::Heal];

    /// Timer slot of a skill state; `None` for [`BossState::Idle`].
    #[must_use]
    pub const fn skill_slot(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Defense => Some(0),
            Self::Attack => Some(1),
            Self::Heal => Some(2),
        }
    }
}

/// Policy towers use to choose among enemies in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// Closest enemy.
    Nearest,
    /// Enemy furthest along the path.
    #[default]
    First,
    /// Enemy with the least hp.
    Weakest,
    /// Enemy with the most hp.
    Strongest,
}

/// Global upgrades bought with money during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    /// Multiplies the damage of every die.
    Damage,
    /// Shortens the firing period of every die.
    FireRate,
    /// Extends the range of every die.
    Range,
}

impl UpgradeKind {
    /// Every in-game upgrade in a stable order.
    pub const ALL: [UpgradeKind; 3] = [UpgradeKind::Damage, UpgradeKind::FireRate, UpgradeKind::Range];
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Damage => "damage",
            Self::FireRate => "firerate",
            Self::Range => "range",
        })
    }
}

/// Permanent per-kind upgrades bought with coins between runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassUpgrade {
    /// +10 % damage.
    Damage,
    /// -5 % firing period.
    FireRate,
    /// +5 % critical hit chance.
    CritRate,
}

/// Composition of a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveKind {
    /// Only regular enemies.
    Regular,
    /// The last spawn is a big enemy.
    BigEnemy,
    /// The last spawn is a true boss.
    TrueBoss,
}

impl WaveKind {
    /// Enemy variant assigned to the final spawn of the wave.
    #[must_use]
    pub const fn finale(self) -> EnemyKind {
        match self {
            Self::Regular => EnemyKind::Regular,
            Self::BigEnemy => EnemyKind::Big,
            Self::TrueBoss => EnemyKind::Boss,
        }
    }
}

/// Terminal state of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The run is still being simulated.
    #[default]
    InProgress,
    /// Base hp dropped to zero.
    Defeat,
    /// Every scheduled wave of a stage was cleared.
    Victory,
}

/// Status effect delivered by a projectile on impact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Multiplies movement speed by `ratio` for `duration` seconds.
    Slow {
        /// Speed ratio in `(0, 1]`.
        ratio: f32,
        /// Seconds the slow lasts.
        duration: f32,
    },
    /// Deals `dps` damage per second for `duration` seconds.
    Poison {
        /// Damage per second.
        dps: f32,
        /// Seconds the poison lasts.
        duration: f32,
    },
}

/// How a projectile distributes damage when it lands.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Impact {
    /// Damages the target only.
    Single,
    /// Damages the target, then hops to further enemies.
    Chain {
        /// Maximum number of additional enemies.
        jumps: u32,
        /// Maximum distance of each hop.
        max_distance: f32,
    },
    /// Damages the target and every other enemy near the impact point.
    Splash {
        /// Damage dealt to bystanders.
        damage: f32,
        /// Radius of the explosion around the impact point.
        radius: f32,
    },
}

/// Everything a die hands to a projectile when firing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Damage dealt to the primary target (and to chained targets).
    pub damage: f32,
    /// Damage distribution on impact.
    pub impact: Impact,
    /// Optional status effect applied to the primary target on impact.
    pub status: Option<StatusEffect>,
}

/// Reason a die left the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// The player trashed the die.
    Trash,
    /// A boss attack skill destroyed the die.
    BossAttack,
}

/// Result of a projectile's final frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileOutcome {
    /// The projectile landed and damaged `hits` enemies.
    Impact {
        /// Number of enemies damaged, including the primary target.
        hits: u32,
    },
    /// The target vanished before impact; nothing was damaged.
    Discarded,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Selects one of the [`GAME_SPEEDS`] presets.
    SetGameSpeed {
        /// Index into [`GAME_SPEEDS`]; out-of-range values are clamped.
        index: usize,
    },
    /// Changes the global targeting policy.
    SetTargetMode {
        /// Policy to activate.
        mode: TargetMode,
    },
    /// Records the start of a new wave.
    BeginWave {
        /// Zero-based wave index.
        wave: u32,
        /// Composition of the wave.
        kind: WaveKind,
        /// Number of enemies the scheduler will spawn.
        enemy_count: u32,
    },
    /// Spawns an enemy at the start of the level path.
    SpawnEnemy {
        /// Variant to create.
        kind: EnemyKind,
        /// Starting and maximum hp.
        hp: f32,
        /// Base movement speed in units per second.
        speed: f32,
        /// Whether killing the enemy awards a coin.
        carries_coin: bool,
    },
    /// Advances telegraph zones.
    AdvanceZones {
        /// Unscaled frame delta.
        dt: Duration,
    },
    /// Advances every enemy: status effects, movement, boss skills.
    AdvanceEnemies {
        /// Unscaled frame delta.
        dt: Duration,
    },
    /// Advances projectiles in flight and resolves impacts.
    AdvanceProjectiles {
        /// Unscaled frame delta.
        dt: Duration,
    },
    /// Accumulates die cooldowns and marks dice whose period elapsed.
    AdvanceDice {
        /// Unscaled frame delta.
        dt: Duration,
    },
    /// Launches a projectile from a ready die.
    FireProjectile {
        /// Cell of the firing die.
        die: CellCoord,
        /// Enemy the projectile homes on.
        target: EnemyId,
        /// Damage payload.
        projectile: ProjectileSpec,
    },
    /// Buys a die of a random loadout kind on a random free cell.
    SummonDie,
    /// Buys a die of the given kind on the given cell.
    PlaceDie {
        /// Destination cell.
        cell: CellCoord,
        /// Variant to place.
        kind: DieKind,
    },
    /// Merges the die at `from` into the matching die at `into`.
    MergeDice {
        /// Die consumed by the merge.
        from: CellCoord,
        /// Die promoted by the merge.
        into: CellCoord,
    },
    /// Removes the die at the given cell.
    TrashDie {
        /// Cell to clear.
        cell: CellCoord,
    },
    /// Buys the next level of an in-game upgrade with money.
    PurchaseUpgrade {
        /// Upgrade to buy.
        kind: UpgradeKind,
    },
    /// Buys a permanent per-kind upgrade with coins.
    PurchaseClassUpgrade {
        /// Die kind receiving the upgrade.
        die: DieKind,
        /// Upgrade to buy.
        upgrade: ClassUpgrade,
    },
    /// Adds or removes a die kind from the summon loadout.
    ToggleLoadout {
        /// Kind to toggle.
        kind: DieKind,
    },
    /// Ends the run in victory once every wave of a stage is cleared.
    DeclareVictory,
    /// Starts a fresh run on the same map, keeping coins and class upgrades.
    ResetRun,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces the active game-speed multiplier.
    GameSpeedChanged {
        /// New multiplier.
        game_speed: f32,
    },
    /// Announces the active targeting policy.
    TargetModeChanged {
        /// New policy.
        mode: TargetMode,
    },
    /// Confirms that a wave began.
    WaveStarted {
        /// Zero-based wave index.
        wave: u32,
        /// Composition of the wave.
        kind: WaveKind,
        /// Number of enemies scheduled.
        enemy_count: u32,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier allocated to the enemy.
        enemy: EnemyId,
        /// Variant of the enemy.
        kind: EnemyKind,
    },
    /// Reports an enemy killed by damage.
    EnemyDied {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Variant of the enemy.
        kind: EnemyKind,
        /// Money awarded for the kill.
        reward: u32,
        /// Whether a coin was awarded as well.
        carried_coin: bool,
    },
    /// Reports an enemy that reached the base.
    EnemyReachedGoal {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Variant of the enemy.
        kind: EnemyKind,
        /// Base hp remaining after the hit.
        base_hp: i32,
    },
    /// Reports a boss skill transition.
    BossStateChanged {
        /// Identifier of the boss.
        enemy: EnemyId,
        /// State before the transition.
        from: BossState,
        /// State after the transition.
        to: BossState,
    },
    /// Reports a telegraph zone cast by a big enemy.
    TelegraphCast {
        /// Centre of the zone.
        center: Point,
        /// Radius of the zone.
        radius: f32,
    },
    /// Confirms a die placement.
    DiePlaced {
        /// Cell holding the die.
        cell: CellCoord,
        /// Variant placed.
        kind: DieKind,
        /// Money left after paying.
        money: u32,
    },
    /// Reports a rejected placement or summon.
    DiePlacementRejected {
        /// Why the request failed.
        reason: PlacementError,
    },
    /// Confirms a merge.
    DiceMerged {
        /// Cell emptied by the merge.
        from: CellCoord,
        /// Cell holding the promoted die.
        into: CellCoord,
        /// Variant of the promoted die.
        kind: DieKind,
        /// Level of the promoted die.
        level: u8,
    },
    /// Reports a rejected merge.
    MergeRejected {
        /// Requested source cell.
        from: CellCoord,
        /// Requested destination cell.
        into: CellCoord,
        /// Why the merge failed.
        reason: MergeError,
    },
    /// Reports a die leaving the grid.
    DieRemoved {
        /// Cell the die occupied.
        cell: CellCoord,
        /// Variant removed.
        kind: DieKind,
        /// Why it was removed.
        cause: RemovalCause,
    },
    /// Confirms that a die fired.
    ProjectileFired {
        /// Identifier of the new projectile.
        projectile: ProjectileId,
        /// Cell of the firing die.
        die: CellCoord,
        /// Enemy targeted.
        target: EnemyId,
    },
    /// Reports the end of a projectile's flight.
    ProjectileResolved {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// What happened.
        outcome: ProjectileOutcome,
    },
    /// Confirms an in-game upgrade purchase.
    UpgradePurchased {
        /// Upgrade bought.
        kind: UpgradeKind,
        /// Level reached.
        level: u8,
        /// Money left.
        money: u32,
    },
    /// Reports a rejected in-game upgrade purchase.
    UpgradeRejected {
        /// Upgrade requested.
        kind: UpgradeKind,
        /// Why the purchase failed.
        reason: PurchaseError,
    },
    /// Confirms a class upgrade purchase.
    ClassUpgradePurchased {
        /// Die kind upgraded.
        die: DieKind,
        /// Upgrade bought.
        upgrade: ClassUpgrade,
        /// Coins left.
        coins: u32,
    },
    /// Reports a rejected class upgrade purchase.
    ClassUpgradeRejected {
        /// Die kind requested.
        die: DieKind,
        /// Upgrade requested.
        upgrade: ClassUpgrade,
        /// Why the purchase failed.
        reason: PurchaseError,
    },
    /// Announces the loadout after a toggle.
    LoadoutChanged {
        /// Kinds eligible for summoning.
        selected: Vec<DieKind>,
    },
    /// Reports coins added to the wallet.
    CoinsEarned {
        /// Coins added.
        amount: u32,
        /// Wallet total afterwards.
        total: u32,
    },
    /// Base hp reached zero.
    GameOver {
        /// Waves survived.
        waves: u32,
    },
    /// Every wave of the stage was cleared.
    StageCleared {
        /// Waves survived.
        waves: u32,
    },
    /// A fresh run began.
    RunReset {
        /// Starting money.
        money: u32,
        /// Starting base hp.
        base_hp: i32,
    },
}

/// Reasons a placement or summon request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The player cannot afford the die.
    #[error("Not enough money! Need ${cost}")]
    InsufficientFunds {
        /// Current price of a die.
        cost: u32,
    },
    /// Every valid cell already holds a die.
    #[error("No free cell left on the board")]
    NoFreeCell,
    /// The loadout is empty.
    #[error("Select at least one die for the loadout")]
    EmptyLoadout,
    /// The cell lies outside the board or its valid-cell mask.
    #[error("Cell is not part of the board")]
    InvalidCell,
    /// The cell already holds a die.
    #[error("Cell is already occupied")]
    Occupied,
    /// The run has ended.
    #[error("The run is over")]
    RunOver,
}

/// Reasons a merge request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum MergeError {
    /// One of the cells holds no die.
    #[error("Both cells must hold a die")]
    EmptyCell,
    /// A die cannot merge with itself.
    #[error("Pick two different dice")]
    SameCell,
    /// The dice are different kinds.
    #[error("Only dice of the same kind can merge")]
    KindMismatch,
    /// The dice are different levels.
    #[error("Only dice of the same level can merge")]
    LevelMismatch,
}

/// Reasons an upgrade purchase may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PurchaseError {
    /// The upgrade cannot be raised further.
    #[error("{upgrade} is already at MAX level!")]
    MaxLevel {
        /// Upgrade requested.
        upgrade: UpgradeKind,
    },
    /// Not enough money for the next level.
    #[error("Not enough money! Need ${cost}")]
    InsufficientFunds {
        /// Price of the next level.
        cost: u32,
    },
    /// Not enough coins for a class upgrade.
    #[error("Not enough coins! Need {cost}")]
    InsufficientCoins {
        /// Price of the class upgrade.
        cost: u32,
    },
    /// Crit chance is already at its cap.
    #[error("Crit rate is already at its cap")]
    CritCapReached,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Variant of the enemy.
    pub kind: EnemyKind,
    /// Current position.
    pub position: Point,
    /// Display size in world units.
    pub size: f32,
    /// Index of the last waypoint passed; larger is further along.
    pub path_index: usize,
    /// Current hp, possibly negative for a freshly killed enemy.
    pub hp: f32,
    /// Maximum hp.
    pub max_hp: f32,
    /// Whether the enemy died.
    pub dead: bool,
    /// Whether the enemy reached the base.
    pub reached: bool,
    /// Skill state for bosses.
    pub boss_state: Option<BossState>,
    /// Whether a slow is active.
    pub slowed: bool,
    /// Whether a poison is active.
    pub poisoned: bool,
    /// Whether killing the enemy awards a coin.
    pub carries_coin: bool,
}

impl EnemySnapshot {
    /// Reports whether the enemy may still be targeted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.dead && !self.reached
    }

    /// Hp clamped at zero for presentation.
    #[must_use]
    pub fn display_hp(&self) -> f32 {
        self.hp.max(0.0)
    }
}

/// Read-only snapshot describing all enemies on the path.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a placed die used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DieSnapshot {
    /// Cell holding the die.
    pub cell: CellCoord,
    /// Variant of the die.
    pub kind: DieKind,
    /// Level of the die.
    pub level: u8,
    /// Centre of the cell in world units.
    pub center: Point,
    /// Effective range after upgrades.
    pub range: f32,
    /// Whether the die's period elapsed this tick and it may fire.
    pub ready: bool,
}

/// Read-only snapshot describing all dice on the grid.
#[derive(Clone, Debug, Default)]
pub struct DieView {
    snapshots: Vec<DieSnapshot>,
}

impl DieView {
    /// Creates a new die view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DieSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.cell);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &DieSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the die at a cell.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<&DieSnapshot> {
        self.snapshots
            .binary_search_by_key(&cell, |snapshot| snapshot.cell)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<DieSnapshot> {
        self.snapshots
    }
}

/// Combined damage and crit modifiers per die kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpgradeView {
    damage: [f32; 7],
    crit_rate: [f32; 7],
}

impl UpgradeView {
    /// Creates a view from per-kind tables indexed by [`DieKind::index`].
    #[must_use]
    pub const fn new(damage: [f32; 7], crit_rate: [f32; 7]) -> Self {
        Self { damage, crit_rate }
    }

    /// Product of permanent and in-game damage multipliers.
    #[must_use]
    pub const fn damage_multiplier(&self, kind: DieKind) -> f32 {
        self.damage[kind.index()]
    }

    /// Chance in `[0, 1]` that a shot critically hits.
    #[must_use]
    pub const fn crit_rate(&self, kind: DieKind) -> f32 {
        self.crit_rate[kind.index()]
    }
}

impl Default for UpgradeView {
    fn default() -> Self {
        Self::new([1.0; 7], [0.0; 7])
    }
}

/// Target assignment produced for a ready die.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DieTarget {
    /// Cell of the die.
    pub die: CellCoord,
    /// Enemy selected.
    pub enemy: EnemyId,
    /// Variant of the enemy selected.
    pub enemy_kind: EnemyKind,
}

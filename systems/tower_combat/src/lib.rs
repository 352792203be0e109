#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns target assignments into projectile fire commands.

use dice_defence_core::{
    Command, DieKind, DieSnapshot, DieTarget, DieView, EnemyKind, Impact, ProjectileSpec,
    StatusEffect, UpgradeView,
};
use log::trace;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Damage multiplier of a critical hit.
pub const CRIT_MULTIPLIER: f32 = 2.0;

const CHAIN_HOP_DISTANCE: f32 = 220.0;
const SPLASH_RADIUS: f32 = 80.0;
const SPLASH_BASE: f32 = 20.0;
const SPLASH_PER_LEVEL: f32 = 3.0;
const FREEZE_RATIO: f32 = 0.65;
const FREEZE_BASE_DURATION: f32 = 2.0;
const FREEZE_DURATION_PER_LEVEL: f32 = 0.2;
const POISON_DPS_RATIO: f32 = 0.5;
const POISON_DURATION: f32 = 3.0;

/// Combat system that computes shot payloads for targeted dice.
#[derive(Debug)]
pub struct TowerCombat {
    rng: ChaCha8Rng,
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a combat system whose crit rolls derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            scratch: Vec::new(),
        }
    }

    /// Emits `Command::FireProjectile` for every target whose die is ready.
    pub fn handle(
        &mut self,
        dice: &DieView,
        targets: &[DieTarget],
        upgrades: &UpgradeView,
        out: &mut Vec<Command>,
    ) {
        if targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in targets {
            let Some(die) = dice.get(target.die).filter(|die| die.ready) else {
                continue;
            };
            let crit = self.roll_crit(upgrades.crit_rate(die.kind));
            let projectile = shot(die, target.enemy_kind, upgrades, crit);
            trace!(
                "{} at {} fires {:.1} damage at enemy {}",
                die.kind,
                die.cell,
                projectile.damage,
                target.enemy.get()
            );
            self.scratch.push(Command::FireProjectile {
                die: target.die,
                target: target.enemy,
                projectile,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    fn roll_crit(&mut self, rate: f32) -> bool {
        rate > 0.0 && self.rng.gen::<f32>() < rate
    }
}

/// Builds the payload a die fires at an enemy of the given kind.
#[must_use]
pub fn shot(
    die: &DieSnapshot,
    enemy_kind: EnemyKind,
    upgrades: &UpgradeView,
    crit: bool,
) -> ProjectileSpec {
    let multiplier = upgrades.damage_multiplier(die.kind);
    let mut damage = die.kind.base_damage(die.level) * multiplier;
    if crit {
        damage *= CRIT_MULTIPLIER;
    }
    if enemy_kind != EnemyKind::Regular {
        damage *= die.kind.large_target_bonus();
    }

    let steps = f32::from(die.level.saturating_sub(1));
    let (impact, status) = match die.kind {
        DieKind::Single | DieKind::Wind | DieKind::Iron => (Impact::Single, None),
        DieKind::Multi => (
            Impact::Chain {
                jumps: u32::from(die.level.saturating_sub(1)),
                max_distance: CHAIN_HOP_DISTANCE,
            },
            None,
        ),
        DieKind::Fire => (
            Impact::Splash {
                damage: (SPLASH_BASE + SPLASH_PER_LEVEL * steps) * multiplier,
                radius: SPLASH_RADIUS,
            },
            None,
        ),
        DieKind::Freeze => (
            Impact::Single,
            Some(StatusEffect::Slow {
                ratio: FREEZE_RATIO,
                duration: FREEZE_BASE_DURATION + FREEZE_DURATION_PER_LEVEL * steps,
            }),
        ),
        DieKind::Poison => (
            Impact::Single,
            Some(StatusEffect::Poison {
                dps: damage * POISON_DPS_RATIO,
                duration: POISON_DURATION,
            }),
        ),
    };

    ProjectileSpec {
        damage,
        impact,
        status,
    }
}

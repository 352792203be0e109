//! Enemies moving along the level path.

use dice_defence_core::{BossState, EnemyId, EnemyKind, EnemySnapshot, Point, StatusEffect};
use rand::Rng;

use crate::{
    boss::{BossBrain, SkillEffect},
    status::StatusEffects,
};

pub(crate) const ENEMY_SIZE: f32 = 30.0;
const REGULAR_MONEY_DROP: f32 = 10.0;
const BIG_MONEY_DROP: f32 = 50.0;
const BOSS_MONEY_DROP: f32 = 200.0;
const LARGE_SIZE_MULT: f32 = 3.0;

/// Seconds a big enemy waits between telegraph casts: warning, effect, rest.
pub(crate) const BIG_ENEMY_ABILITY_PERIOD: f32 =
    crate::zones::TELEGRAPH_WARN + crate::zones::TELEGRAPH_DURATION + 5.0;

/// Position, path progress and health shared by every enemy variant.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Body {
    position: Point,
    path: Vec<Point>,
    path_index: usize,
    hp: f32,
    max_hp: f32,
    speed: f32,
    size: f32,
    dead: bool,
    reached: bool,
}

impl Body {
    pub(crate) fn new(path: Vec<Point>, hp: f32, speed: f32, size: f32) -> Self {
        let position = path.first().copied().unwrap_or_default();
        Self {
            position,
            path,
            path_index: 0,
            hp,
            max_hp: hp,
            speed,
            size,
            dead: false,
            reached: false,
        }
    }

    pub(crate) const fn is_active(&self) -> bool {
        !self.dead && !self.reached
    }

    /// Subtracts damage and reports whether this hit caused the death.
    fn hit(&mut self, damage: f32) -> bool {
        if !self.is_active() {
            return false;
        }

        self.hp -= damage;
        if self.hp <= 0.0 {
            self.dead = true;
            return true;
        }
        false
    }

    fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Walks toward the next waypoint, passing at most one waypoint.
    fn advance(&mut self, step: f32) {
        let Some(&next) = self.path.get(self.path_index + 1) else {
            self.reached = true;
            return;
        };

        if step >= self.position.distance(next) {
            self.position = next;
            self.path_index += 1;
            if self.path_index + 1 >= self.path.len() {
                self.reached = true;
            }
        } else {
            self.position = self.position.step_toward(next, step);
        }
    }
}

/// Per-variant state layered over the shared body.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Variant {
    Regular,
    Big { ability_cd: f32 },
    Boss(BossBrain),
}

/// Side effect an enemy asks the world to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EnemyAction {
    CastTelegraph,
    DestroyDice,
}

/// Outcome of a single enemy frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct EnemyTick {
    pub(crate) boss_transition: Option<(BossState, BossState)>,
    pub(crate) action: Option<EnemyAction>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Enemy {
    id: EnemyId,
    body: Body,
    variant: Variant,
    status: StatusEffects,
    money_drop: f32,
    carries_coin: bool,
}

impl Enemy {
    pub(crate) fn new(
        id: EnemyId,
        kind: EnemyKind,
        path: Vec<Point>,
        hp: f32,
        speed: f32,
        carries_coin: bool,
    ) -> Self {
        let (variant, size, money_drop) = match kind {
            EnemyKind::Regular => (Variant::Regular, ENEMY_SIZE, REGULAR_MONEY_DROP),
            EnemyKind::Big => (
                Variant::Big { ability_cd: 0.0 },
                ENEMY_SIZE * LARGE_SIZE_MULT,
                BIG_MONEY_DROP,
            ),
            EnemyKind::Boss => (
                Variant::Boss(BossBrain::new()),
                ENEMY_SIZE * LARGE_SIZE_MULT,
                BOSS_MONEY_DROP,
            ),
        };

        Self {
            id,
            body: Body::new(path, hp, speed, size),
            variant,
            status: StatusEffects::new(),
            money_drop,
            carries_coin,
        }
    }

    pub(crate) const fn id(&self) -> EnemyId {
        self.id
    }

    pub(crate) const fn kind(&self) -> EnemyKind {
        match self.variant {
            Variant::Regular => EnemyKind::Regular,
            Variant::Big { .. } => EnemyKind::Big,
            Variant::Boss(_) => EnemyKind::Boss,
        }
    }

    pub(crate) const fn position(&self) -> Point {
        self.body.position
    }

    pub(crate) const fn is_active(&self) -> bool {
        self.body.is_active()
    }

    pub(crate) const fn is_dead(&self) -> bool {
        self.body.dead
    }

    pub(crate) const fn has_reached(&self) -> bool {
        self.body.reached
    }

    pub(crate) const fn money_drop(&self) -> f32 {
        self.money_drop
    }

    pub(crate) const fn carries_coin(&self) -> bool {
        self.carries_coin
    }

    pub(crate) fn boss_state(&self) -> Option<BossState> {
        match &self.variant {
            Variant::Boss(brain) => Some(brain.state()),
            _ => None,
        }
    }

    /// Applies damage, honouring variant-specific reductions.
    ///
    /// Returns `true` only on the hit that kills the enemy.
    pub(crate) fn hit(&mut self, damage: f32) -> bool {
        let damage = match &self.variant {
            Variant::Boss(brain) => brain.incoming_damage(damage),
            _ => damage,
        };
        self.body.hit(damage)
    }

    pub(crate) fn apply_status(&mut self, effect: StatusEffect) {
        if self.is_active() {
            self.status.apply(effect);
        }
    }

    /// Advances status effects, movement and variant behaviour by one frame.
    ///
    /// `dt` is the scaled frame delta and `zone_mult` the product of speed
    /// multipliers of telegraph zones covering the enemy.
    pub(crate) fn update<R: Rng>(&mut self, dt: f32, zone_mult: f32, rng: &mut R) -> EnemyTick {
        let mut tick = EnemyTick::default();
        if !self.is_active() {
            return tick;
        }

        let poison = self.status.tick(dt);
        if poison > 0.0 && self.hit(poison) {
            return tick;
        }

        let base_step = self.body.speed * self.status.slow_ratio() * zone_mult * dt;
        match &mut self.variant {
            Variant::Regular => self.body.advance(base_step),
            Variant::Big { ability_cd } => {
                self.body.advance(base_step);
                *ability_cd += dt;
                if *ability_cd >= BIG_ENEMY_ABILITY_PERIOD && self.body.is_active() {
                    *ability_cd = 0.0;
                    tick.action = Some(EnemyAction::CastTelegraph);
                }
            }
            Variant::Boss(brain) => {
                brain.tick_timers(dt);
                if let Some(multiplier) = brain.movement_multiplier() {
                    self.body.advance(base_step * multiplier);
                }
                if !self.body.is_active() {
                    return tick;
                }

                let boss = brain.run_state(dt, self.body.hp, self.body.max_hp, rng);
                self.body.heal(boss.healed);
                tick.boss_transition = boss.transition;
                tick.action = boss.effect.map(|effect| match effect {
                    SkillEffect::DestroyDice => EnemyAction::DestroyDice,
                });
            }
        }
        tick
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind(),
            position: self.body.position,
            size: self.body.size,
            path_index: self.body.path_index,
            hp: self.body.hp,
            max_hp: self.body.max_hp,
            dead: self.body.dead,
            reached: self.body.reached,
            boss_state: self.boss_state(),
            slowed: self.status.is_slowed(),
            poisoned: self.status.is_poisoned(),
            carries_coin: self.carries_coin,
        }
    }

    #[cfg(test)]
    pub(crate) const fn size(&self) -> f32 {
        self.body.size
    }

    #[cfg(test)]
    pub(crate) fn hp(&self) -> f32 {
        self.body.hp
    }

    #[cfg(test)]
    pub(crate) fn set_hp(&mut self, hp: f32) {
        self.body.hp = hp;
    }

    #[cfg(test)]
    pub(crate) fn path_index(&self) -> usize {
        self.body.path_index
    }

    #[cfg(test)]
    pub(crate) fn status_mut(&mut self) -> &mut StatusEffects {
        &mut self.status
    }

    #[cfg(test)]
    pub(crate) fn brain_mut(&mut self) -> Option<&mut BossBrain> {
        match &mut self.variant {
            Variant::Boss(brain) => Some(brain),
            _ => None,
        }
    }
}

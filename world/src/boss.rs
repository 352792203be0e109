//! Skill state machine layered on top of the boss enemy.

use dice_defence_core::BossState;
use rand::Rng;

/// Cooldown applied to every skill after any skill finishes.
pub(crate) const GLOBAL_SKILL_COOLDOWN: f32 = 5.0;
/// Cooldown on every skill when the boss spawns.
pub(crate) const INITIAL_SKILL_COOLDOWN: f32 = 2.0;

const DEFENSE_DURATION: f32 = 3.0;
const ATTACK_CAST_TIME: f32 = 1.0;
const HEAL_DURATION: f32 = 2.0;

pub(crate) const DEFENSE_DAMAGE_REDUCTION: f32 = 0.5;
const DEFENSE_MOVE_SPEED_MULT: f32 = 0.5;
const HEAL_FRACTION_PER_SEC: f32 = 0.05;
const HEAL_TRIGGER_THRESHOLD: f32 = 0.8;

/// Terminal effect of a skill that the world must carry out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SkillEffect {
    /// Destroy dice on the grid.
    DestroyDice,
}

/// What happened to the machine during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct BossTick {
    pub(crate) transition: Option<(BossState, BossState)>,
    pub(crate) effect: Option<SkillEffect>,
    pub(crate) healed: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BossBrain {
    state: BossState,
    state_timer: f32,
    skill_timers: [f32; 3],
}

impl BossBrain {
    pub(crate) const fn new() -> Self {
        Self {
            state: BossState::Idle,
            state_timer: 0.0,
            skill_timers: [INITIAL_SKILL_COOLDOWN; 3],
        }
    }

    pub(crate) const fn state(&self) -> BossState {
        self.state
    }

    /// Scales incoming damage by the active state's reduction.
    pub(crate) fn incoming_damage(&self, damage: f32) -> f32 {
        if self.state == BossState::Defense {
            damage * (1.0 - DEFENSE_DAMAGE_REDUCTION)
        } else {
            damage
        }
    }

    /// Movement multiplier for the current state; `None` while stationary.
    pub(crate) fn movement_multiplier(&self) -> Option<f32> {
        match self.state {
            BossState::Idle => Some(1.0),
            BossState::Defense => Some(DEFENSE_MOVE_SPEED_MULT),
            BossState::Attack | BossState::Heal => None,
        }
    }

    /// Counts every timer down by the scaled frame delta.
    pub(crate) fn tick_timers(&mut self, dt: f32) {
        for timer in &mut self.skill_timers {
            *timer = (*timer - dt).max(0.0);
        }
        self.state_timer = (self.state_timer - dt).max(0.0);
    }

    /// Runs the active skill after movement has been applied.
    ///
    /// `hp` and `max_hp` describe the boss body; the returned
    /// [`BossTick::healed`] must be added to it by the caller.
    pub(crate) fn run_state<R: Rng>(&mut self, dt: f32, hp: f32, max_hp: f32, rng: &mut R) -> BossTick {
        let mut tick = BossTick::default();
        match self.state {
            BossState::Idle => {
                if let Some(next) = self.choose_skill(hp, max_hp, rng) {
                    self.enter(next);
                    tick.transition = Some((BossState::Idle, next));
                }
            }
            BossState::Defense => {
                if self.state_timer <= 0.0 {
                    tick.transition = Some(self.finish());
                }
            }
            BossState::Attack => {
                if self.state_timer <= 0.0 {
                    tick.effect = Some(SkillEffect::DestroyDice);
                    tick.transition = Some(self.finish());
                }
            }
            BossState::Heal => {
                tick.healed = HEAL_FRACTION_PER_SEC * max_hp * dt;
                if self.state_timer <= 0.0 {
                    tick.transition = Some(self.finish());
                }
            }
        }
        tick
    }

    fn cooldown_ready(&self) -> bool {
        self.skill_timers.iter().all(|timer| *timer <= 0.0)
    }

    fn choose_skill<R: Rng>(&self, hp: f32, max_hp: f32, rng: &mut R) -> Option<BossState> {
        if !self.cooldown_ready() {
            return None;
        }

        if hp < max_hp * HEAL_TRIGGER_THRESHOLD {
            return Some(BossState::Heal);
        }

        if rng.gen_bool(0.5) {
            Some(BossState::Defense)
        } else {
            Some(BossState::Attack)
        }
    }

    pub(crate) fn enter(&mut self, state: BossState) {
        self.state = state;
        self.state_timer = match state {
            BossState::Idle => 0.0,
            BossState::Defense => DEFENSE_DURATION,
            BossState::Attack => ATTACK_CAST_TIME,
            BossState::Heal => HEAL_DURATION,
        };
    }

    fn finish(&mut self) -> (BossState, BossState) {
        let from = self.state;
        self.skill_timers = [GLOBAL_SKILL_COOLDOWN; 3];
        self.state = BossState::Idle;
        (from, BossState::Idle)
    }

    #[cfg(test)]
    pub(crate) fn skill_timers(&self) -> [f32; 3] {
        self.skill_timers
    }

    #[cfg(test)]
    pub(crate) fn force(&mut self, state: BossState, state_timer: f32, skill_timers: [f32; 3]) {
        self.state = state;
        self.state_timer = state_timer;
        self.skill_timers = skill_timers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn spawns_idle_with_initial_cooldown() {
        let brain = BossBrain::new();
        assert_eq!(brain.state(), BossState::Idle);
        assert_eq!(brain.skill_timers(), [INITIAL_SKILL_COOLDOWN; 3]);
    }

    #[test]
    fn any_pending_timer_blocks_every_skill() {
        let mut brain = BossBrain::new();
        brain.force(BossState::Idle, 0.0, [0.0, 0.0, 0.3]);

        let tick = brain.run_state(0.1, 100.0, 1000.0, &mut rng());
        assert_eq!(tick.transition, None);
        assert_eq!(brain.state(), BossState::Idle);
    }

    #[test]
    fn low_hp_prefers_heal() {
        let mut brain = BossBrain::new();
        brain.force(BossState::Idle, 0.0, [0.0; 3]);

        let tick = brain.run_state(0.1, 500.0, 1000.0, &mut rng());
        assert_eq!(tick.transition, Some((BossState::Idle, BossState::Heal)));
    }

    #[test]
    fn healthy_boss_picks_defense_or_attack() {
        for seed in 0..16 {
            let mut brain = BossBrain::new();
            brain.force(BossState::Idle, 0.0, [0.0; 3]);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let _ = brain.run_state(0.1, 1000.0, 1000.0, &mut rng);
            assert!(matches!(
                brain.state(),
                BossState::Defense | BossState::Attack
            ));
        }
    }

    #[test]
    fn finishing_a_skill_resets_every_timer() {
        let mut brain = BossBrain::new();
        brain.force(BossState::Defense, 0.0, [0.0; 3]);

        let tick = brain.run_state(0.1, 1000.0, 1000.0, &mut rng());
        assert_eq!(tick.transition, Some((BossState::Defense, BossState::Idle)));
        assert_eq!(brain.skill_timers(), [GLOBAL_SKILL_COOLDOWN; 3]);
    }

    #[test]
    fn attack_effect_fires_once_at_expiry() {
        let mut brain = BossBrain::new();
        brain.enter(BossState::Attack);

        brain.tick_timers(0.5);
        assert_eq!(brain.run_state(0.5, 1.0, 1.0, &mut rng()).effect, None);

        brain.tick_timers(0.5);
        let tick = brain.run_state(0.5, 1.0, 1.0, &mut rng());
        assert_eq!(tick.effect, Some(SkillEffect::DestroyDice));
        assert_eq!(brain.state(), BossState::Idle);

        brain.tick_timers(0.5);
        assert_eq!(brain.run_state(0.5, 1.0, 1.0, &mut rng()).effect, None);
    }

    #[test]
    fn defense_halves_damage() {
        let mut brain = BossBrain::new();
        assert!((brain.incoming_damage(100.0) - 100.0).abs() < f32::EPSILON);
        brain.enter(BossState::Defense);
        assert!((brain.incoming_damage(100.0) - 50.0).abs() < f32::EPSILON);
    }
}

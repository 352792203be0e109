//! Slow and poison timers carried by every enemy.

use dice_defence_core::StatusEffect;

/// Active debuffs on a single enemy.
///
/// Re-application never stacks additively: the stronger magnitude and the
/// longer remaining duration win independently.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StatusEffects {
    slow_ratio: f32,
    slow_timer: f32,
    poison_dps: f32,
    poison_timer: f32,
}

impl StatusEffects {
    pub(crate) const fn new() -> Self {
        Self {
            slow_ratio: 1.0,
            slow_timer: 0.0,
            poison_dps: 0.0,
            poison_timer: 0.0,
        }
    }

    pub(crate) fn apply(&mut self, effect: StatusEffect) {
        match effect {
            StatusEffect::Slow { ratio, duration } => self.apply_slow(ratio, duration),
            StatusEffect::Poison { dps, duration } => self.apply_poison(dps, duration),
        }
    }

    pub(crate) fn apply_slow(&mut self, ratio: f32, duration: f32) {
        self.slow_ratio = self.slow_ratio.min(ratio.clamp(f32::MIN_POSITIVE, 1.0));
        self.slow_timer = self.slow_timer.max(duration);
    }

    pub(crate) fn apply_poison(&mut self, dps: f32, duration: f32) {
        self.poison_dps = self.poison_dps.max(dps.max(0.0));
        self.poison_timer = self.poison_timer.max(duration);
    }

    /// Counts both timers down and returns the poison damage owed this frame.
    pub(crate) fn tick(&mut self, dt: f32) -> f32 {
        if self.slow_timer > 0.0 {
            self.slow_timer -= dt;
            if self.slow_timer <= 0.0 {
                self.slow_timer = 0.0;
                self.slow_ratio = 1.0;
            }
        }

        if self.poison_timer <= 0.0 {
            return 0.0;
        }

        let damage = self.poison_dps * dt;
        self.poison_timer -= dt;
        if self.poison_timer <= 0.0 {
            self.poison_timer = 0.0;
            self.poison_dps = 0.0;
        }
        damage
    }

    pub(crate) const fn slow_ratio(&self) -> f32 {
        self.slow_ratio
    }

    pub(crate) fn is_slowed(&self) -> bool {
        self.slow_timer > 0.0
    }

    pub(crate) fn is_poisoned(&self) -> bool {
        self.poison_timer > 0.0
    }

    #[cfg(test)]
    pub(crate) const fn slow_timer(&self) -> f32 {
        self.slow_timer
    }

    #[cfg(test)]
    pub(crate) const fn poison(&self) -> (f32, f32) {
        (self.poison_dps, self.poison_timer)
    }
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self::new()
    }
}

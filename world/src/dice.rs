//! Dice placed on the grid and their fire cooldowns.

use dice_defence_core::{clamp_level, DieKind, MAX_DIE_LEVEL};

/// Range of every die before upgrades.
pub(crate) const BASE_RANGE: f32 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Die {
    kind: DieKind,
    level: u8,
    cooldown: f32,
    ready: bool,
}

impl Die {
    pub(crate) fn new(kind: DieKind, level: u8) -> Self {
        Self {
            kind,
            level: clamp_level(level),
            cooldown: 0.0,
            ready: false,
        }
    }

    pub(crate) const fn kind(&self) -> DieKind {
        self.kind
    }

    pub(crate) const fn level(&self) -> u8 {
        self.level
    }

    pub(crate) const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Accumulates the scaled delta and raises the ready flag once `period`
    /// elapsed. The cooldown restarts whether or not a target is found.
    pub(crate) fn advance(&mut self, dt: f32, period: f32) {
        self.ready = false;
        self.cooldown += dt;
        if self.cooldown >= period {
            self.cooldown = 0.0;
            self.ready = true;
        }
    }

    pub(crate) fn consume_ready(&mut self) -> bool {
        std::mem::replace(&mut self.ready, false)
    }

    /// Raises the die by one level, saturating at the maximum. The promoted
    /// die starts a fresh cooldown.
    pub(crate) fn promote(&mut self) {
        self.level = (self.level + 1).min(MAX_DIE_LEVEL);
        self.cooldown = 0.0;
        self.ready = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn becomes_ready_once_per_period() {
        let mut die = Die::new(DieKind::Single, 1);
        die.advance(0.3, 0.5);
        assert!(!die.is_ready());

        die.advance(0.3, 0.5);
        assert!(die.is_ready());

        die.advance(0.1, 0.5);
        assert!(!die.is_ready(), "cooldown must restart after firing window");
    }

    #[test]
    fn consuming_ready_allows_a_single_shot() {
        let mut die = Die::new(DieKind::Iron, 1);
        die.advance(2.0, 2.0);
        assert!(die.consume_ready());
        assert!(!die.consume_ready());
    }

    #[test]
    fn promotion_saturates_at_max_level() {
        let mut die = Die::new(DieKind::Fire, MAX_DIE_LEVEL);
        die.promote();
        assert_eq!(die.level(), MAX_DIE_LEVEL);

        let mut low = Die::new(DieKind::Fire, 0);
        assert_eq!(low.level(), 1);
        low.promote();
        assert_eq!(low.level(), 2);
    }

    #[test]
    fn promotion_restarts_the_cooldown() {
        let mut die = Die::new(DieKind::Single, 1);
        die.advance(0.4, 0.5);
        die.promote();
        die.advance(0.4, 0.5);
        assert!(!die.is_ready(), "cooldown carried over the merge");

        die.advance(0.5, 0.5);
        die.promote();
        assert!(!die.consume_ready());
    }
}

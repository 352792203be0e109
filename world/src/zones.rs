//! Telegraphed area effects cast by big enemies.

use dice_defence_core::Point;

/// Seconds a zone is shown before it takes effect.
pub(crate) const TELEGRAPH_WARN: f32 = 1.0;
/// Seconds a zone stays in effect once armed.
pub(crate) const TELEGRAPH_DURATION: f32 = 3.0;
const ENEMY_SPEED_MULT: f32 = 0.6;
const DIE_PERIOD_MULT: f32 = 1.2;

/// Circular zone that hastes enemies and slows dice once armed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TelegraphZone {
    center: Point,
    radius: f32,
    elapsed: f32,
}

impl TelegraphZone {
    pub(crate) const fn new(center: Point, radius: f32) -> Self {
        Self {
            center,
            radius,
            elapsed: 0.0,
        }
    }

    /// Centre of the zone.
    #[must_use]
    pub const fn center(&self) -> Point {
        self.center
    }

    /// Radius of the zone.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Reports whether the warning period elapsed and the zone is armed.
    #[must_use]
    pub fn in_effect(&self) -> bool {
        self.elapsed >= TELEGRAPH_WARN && self.is_active()
    }

    /// Reports whether the zone is still warning or in effect.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.elapsed < TELEGRAPH_WARN + TELEGRAPH_DURATION
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub(crate) fn contains(&self, point: Point) -> bool {
        self.center.distance(point) <= self.radius
    }
}

/// Movement multiplier for an enemy at `position`.
pub(crate) fn enemy_speed_multiplier(zones: &[TelegraphZone], position: Point) -> f32 {
    zones
        .iter()
        .filter(|zone| zone.in_effect() && zone.contains(position))
        .fold(1.0, |mult, _| mult * ENEMY_SPEED_MULT)
}

/// Fire-period multiplier for a die centred at `position`.
pub(crate) fn die_period_multiplier(zones: &[TelegraphZone], position: Point) -> f32 {
    zones
        .iter()
        .filter(|zone| zone.in_effect() && zone.contains(position))
        .fold(1.0, |mult, _| mult * DIE_PERIOD_MULT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_arms_after_warning_and_expires() {
        let mut zone = TelegraphZone::new(Point::new(0.0, 0.0), 50.0);
        assert!(!zone.in_effect());

        zone.advance(TELEGRAPH_WARN);
        assert!(zone.in_effect());

        zone.advance(TELEGRAPH_DURATION);
        assert!(!zone.in_effect());
        assert!(!zone.is_active());
    }

    #[test]
    fn multipliers_apply_only_inside_armed_zones() {
        let mut zone = TelegraphZone::new(Point::new(0.0, 0.0), 50.0);
        let inside = Point::new(10.0, 10.0);
        let outside = Point::new(100.0, 0.0);

        assert_eq!(enemy_speed_multiplier(&[zone], inside), 1.0);

        zone.advance(1.5);
        let zones = [zone];
        assert!((enemy_speed_multiplier(&zones, inside) - 0.6).abs() < f32::EPSILON);
        assert_eq!(enemy_speed_multiplier(&zones, outside), 1.0);
        assert!((die_period_multiplier(&zones, inside) - 1.2).abs() < f32::EPSILON);
        assert_eq!(die_period_multiplier(&zones, outside), 1.0);
    }

    #[test]
    fn overlapping_zones_compound() {
        let mut first = TelegraphZone::new(Point::new(0.0, 0.0), 50.0);
        let mut second = TelegraphZone::new(Point::new(20.0, 0.0), 50.0);
        first.advance(TELEGRAPH_WARN);
        second.advance(TELEGRAPH_WARN);
        let zones = [first, second];
        let both = Point::new(10.0, 0.0);

        assert!((die_period_multiplier(&zones, both) - 1.44).abs() < 1e-5);
        assert!((enemy_speed_multiplier(&zones, both) - 0.36).abs() < 1e-5);
        assert!((die_period_multiplier(&zones, Point::new(-40.0, 0.0)) - 1.2).abs() < 1e-5);
    }
}

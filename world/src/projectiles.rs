//! Homing projectiles and their impact resolution.

use dice_defence_core::{
    CellCoord, EnemyId, Impact, Point, ProjectileId, ProjectileOutcome, ProjectileSpec,
};

use crate::enemy::Enemy;

/// Flight speed of every projectile in world units per second.
pub(crate) const PROJECTILE_SPEED: f32 = 660.0;

/// Read-only description of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier of the projectile.
    pub id: ProjectileId,
    /// Cell of the die that fired it.
    pub origin: CellCoord,
    /// Current position.
    pub position: Point,
    /// Enemy it homes on.
    pub target: EnemyId,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Projectile {
    id: ProjectileId,
    origin: CellCoord,
    position: Point,
    target: EnemyId,
    speed: f32,
    spec: ProjectileSpec,
}

impl Projectile {
    pub(crate) const fn new(
        id: ProjectileId,
        origin: CellCoord,
        position: Point,
        target: EnemyId,
        spec: ProjectileSpec,
    ) -> Self {
        Self {
            id,
            origin,
            position,
            target,
            speed: PROJECTILE_SPEED,
            spec,
        }
    }

    pub(crate) const fn id(&self) -> ProjectileId {
        self.id
    }

    pub(crate) const fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            origin: self.origin,
            position: self.position,
            target: self.target,
        }
    }

    /// Homes on the target's current position for one frame.
    ///
    /// Returns `None` while still in flight. A target that died or reached
    /// the goal discards the projectile without damaging anyone.
    pub(crate) fn advance(&mut self, dt: f32, enemies: &mut [Enemy]) -> Option<ProjectileOutcome> {
        let Some(target_index) = enemies
            .iter()
            .position(|enemy| enemy.id() == self.target && enemy.is_active())
        else {
            return Some(ProjectileOutcome::Discarded);
        };

        let target = enemies[target_index].position();
        let step = self.speed * dt;
        if self.position.distance(target) > step {
            self.position = self.position.step_toward(target, step);
            return None;
        }

        self.position = target;
        Some(ProjectileOutcome::Impact {
            hits: self.resolve(target_index, enemies),
        })
    }

    fn resolve(&self, target_index: usize, enemies: &mut [Enemy]) -> u32 {
        let spec = self.spec;
        let _ = enemies[target_index].hit(spec.damage);
        let mut hits = 1;

        match spec.impact {
            Impact::Single => {}
            Impact::Splash { damage, radius } => {
                for (index, enemy) in enemies.iter_mut().enumerate() {
                    if index == target_index
                        || !enemy.is_active()
                        || enemy.position().distance(self.position) > radius
                    {
                        continue;
                    }
                    let _ = enemy.hit(damage);
                    hits += 1;
                }
            }
            Impact::Chain { jumps, max_distance } => {
                let mut visited = vec![target_index];
                let mut last = self.position;
                for _ in 0..jumps {
                    let Some(next) = nearest_unvisited(enemies, &visited, last, max_distance)
                    else {
                        break;
                    };
                    last = enemies[next].position();
                    let _ = enemies[next].hit(spec.damage);
                    visited.push(next);
                    hits += 1;
                }
            }
        }

        if let Some(status) = spec.status {
            enemies[target_index].apply_status(status);
        }
        hits
    }
}

fn nearest_unvisited(
    enemies: &[Enemy],
    visited: &[usize],
    from: Point,
    max_distance: f32,
) -> Option<usize> {
    enemies
        .iter()
        .enumerate()
        .filter(|(index, enemy)| enemy.is_active() && !visited.contains(index))
        .map(|(index, enemy)| (index, enemy.position().distance(from)))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_defence_core::{EnemyKind, StatusEffect};

    fn enemy_at(id: u32, x: f32) -> Enemy {
        Enemy::new(
            EnemyId::new(id),
            EnemyKind::Regular,
            vec![Point::new(x, 0.0), Point::new(x + 1000.0, 0.0)],
            100.0,
            0.0,
            false,
        )
    }

    fn projectile(spec: ProjectileSpec) -> Projectile {
        Projectile::new(
            ProjectileId::new(1),
            CellCoord::new(0, 0),
            Point::new(0.0, 0.0),
            EnemyId::new(1),
            spec,
        )
    }

    fn single(damage: f32) -> ProjectileSpec {
        ProjectileSpec {
            damage,
            impact: Impact::Single,
            status: None,
        }
    }

    #[test]
    fn travels_toward_target_before_impact() {
        let mut enemies = vec![enemy_at(1, 1000.0)];
        let mut shot = projectile(single(10.0));

        assert_eq!(shot.advance(0.5, &mut enemies), None);
        assert!((shot.snapshot().position.x - 330.0).abs() < 1e-3);
        assert!((enemies[0].hp() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn lands_when_target_within_one_step() {
        let mut enemies = vec![enemy_at(1, 330.0)];
        let mut shot = projectile(single(10.0));

        let outcome = shot.advance(0.5, &mut enemies);
        assert_eq!(outcome, Some(ProjectileOutcome::Impact { hits: 1 }));
        assert!((enemies[0].hp() - 90.0).abs() < f32::EPSILON);
        assert_eq!(shot.snapshot().position, Point::new(330.0, 0.0));
    }

    #[test]
    fn dead_target_discards_projectile_without_damage() {
        let mut enemies = vec![enemy_at(1, 100.0), enemy_at(2, 110.0)];
        let mut shot = projectile(ProjectileSpec {
            damage: 10.0,
            impact: Impact::Splash {
                damage: 5.0,
                radius: 50.0,
            },
            status: None,
        });
        let _ = enemies[0].hit(1000.0);

        assert_eq!(
            shot.advance(1.0, &mut enemies),
            Some(ProjectileOutcome::Discarded)
        );
        assert!((enemies[1].hp() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn splash_spares_target_from_double_damage() {
        let mut enemies = vec![enemy_at(1, 100.0), enemy_at(2, 105.0), enemy_at(3, 200.0)];
        let mut shot = projectile(ProjectileSpec {
            damage: 10.0,
            impact: Impact::Splash {
                damage: 5.0,
                radius: 20.0,
            },
            status: None,
        });

        let outcome = shot.advance(1.0, &mut enemies);
        assert_eq!(outcome, Some(ProjectileOutcome::Impact { hits: 2 }));
        assert!((enemies[0].hp() - 90.0).abs() < f32::EPSILON);
        assert!((enemies[1].hp() - 95.0).abs() < f32::EPSILON);
        assert!((enemies[2].hp() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn chain_hops_to_distinct_enemies_within_reach() {
        let mut enemies = vec![
            enemy_at(1, 100.0),
            enemy_at(2, 250.0),
            enemy_at(3, 400.0),
            enemy_at(4, 900.0),
        ];
        let mut shot = projectile(ProjectileSpec {
            damage: 8.0,
            impact: Impact::Chain {
                jumps: 5,
                max_distance: 220.0,
            },
            status: None,
        });

        let outcome = shot.advance(1.0, &mut enemies);
        assert_eq!(outcome, Some(ProjectileOutcome::Impact { hits: 3 }));
        for enemy in &enemies[..3] {
            assert!((enemy.hp() - 92.0).abs() < f32::EPSILON);
        }
        assert!((enemies[3].hp() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn status_lands_on_primary_target() {
        let mut enemies = vec![enemy_at(1, 10.0)];
        let mut shot = projectile(ProjectileSpec {
            damage: 1.0,
            impact: Impact::Single,
            status: Some(StatusEffect::Slow {
                ratio: 0.65,
                duration: 2.0,
            }),
        });

        let _ = shot.advance(1.0, &mut enemies);
        assert!(enemies[0].snapshot().slowed);
    }
}

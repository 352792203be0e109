#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks a target for every ready die from world snapshots.

use dice_defence_core::{
    DieKind, DieTarget, DieView, EnemyId, EnemyKind, EnemyView, Point, TargetMode,
};

/// Targeting system that reuses a scratch buffer of live enemies.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes targets for every ready die.
    ///
    /// The output buffer is cleared first. Dice without a live enemy in range
    /// produce no entry.
    pub fn handle(
        &mut self,
        mode: TargetMode,
        dice: &DieView,
        enemies: &EnemyView,
        out: &mut Vec<DieTarget>,
    ) {
        out.clear();

        if dice.iter().next().is_none() || enemies.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);
        if self.enemy_workspace.is_empty() {
            return;
        }

        for die in dice.iter().filter(|die| die.ready) {
            let policy = effective_mode(die.kind, mode);
            let mut best: Option<Scored> = None;

            for candidate in &self.enemy_workspace {
                let distance = die.center.distance(candidate.position);
                if distance > die.range {
                    continue;
                }

                let current = Scored {
                    distance,
                    candidate: *candidate,
                };
                match &mut best {
                    Some(existing) => {
                        if current.precedes(existing, policy) {
                            *existing = current;
                        }
                    }
                    None => best = Some(current),
                }
            }

            if let Some(best) = best {
                out.push(DieTarget {
                    die: die.cell,
                    enemy: best.candidate.id,
                    enemy_kind: best.candidate.kind,
                });
            }
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.extend(
            enemies
                .iter()
                .filter(|snapshot| snapshot.is_active())
                .map(|snapshot| EnemyCandidate {
                    id: snapshot.id,
                    kind: snapshot.kind,
                    position: snapshot.position,
                    path_index: snapshot.path_index,
                    hp: snapshot.hp,
                }),
        );
    }
}

fn effective_mode(kind: DieKind, mode: TargetMode) -> TargetMode {
    if kind.targets_strongest() {
        TargetMode::Strongest
    } else {
        mode
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    kind: EnemyKind,
    position: Point,
    path_index: usize,
    hp: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Scored {
    distance: f32,
    candidate: EnemyCandidate,
}

impl Scored {
    // Strict comparisons keep the earlier (lower id) enemy on ties.
    fn precedes(&self, other: &Self, mode: TargetMode) -> bool {
        match mode {
            TargetMode::Nearest => self.distance < other.distance,
            TargetMode::First => {
                if self.candidate.path_index != other.candidate.path_index {
                    return self.candidate.path_index > other.candidate.path_index;
                }
                self.distance < other.distance
            }
            TargetMode::Weakest => self.candidate.hp < other.candidate.hp,
            TargetMode::Strongest => self.candidate.hp > other.candidate.hp,
        }
    }
}

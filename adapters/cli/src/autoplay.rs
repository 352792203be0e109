//! Greedy bot that plays headless runs.

use dice_defence_core::{CellCoord, Command, DieSnapshot, UpgradeKind, MAX_DIE_LEVEL};
use dice_defence_world::{query, World};

/// Picks at most one action per decision: merge, summon, then upgrade.
#[derive(Debug, Default)]
pub(crate) struct Autoplay;

impl Autoplay {
    pub(crate) fn decide(&self, world: &World) -> Option<Command> {
        let dice: Vec<DieSnapshot> = query::die_view(world).into_vec();
        if let Some((from, into)) = mergeable_pair(&dice) {
            return Some(Command::MergeDice { from, into });
        }

        let money = query::money(world);
        let has_room = !query::grid(world).empty_cells().is_empty();
        if has_room && money >= query::die_cost(world) {
            return Some(Command::SummonDie);
        }

        let upgrades = query::in_game_upgrades(world);
        UpgradeKind::ALL
            .into_iter()
            .filter_map(|kind| upgrades.cost(kind).map(|cost| (kind, cost)))
            .filter(|&(_, cost)| cost <= money)
            .min_by_key(|&(_, cost)| cost)
            .map(|(kind, _)| Command::PurchaseUpgrade { kind })
    }
}

/// Finds two dice of equal kind and level, returning `(from, into)`.
fn mergeable_pair(dice: &[DieSnapshot]) -> Option<(CellCoord, CellCoord)> {
    dice.iter()
        .enumerate()
        .filter(|(_, die)| die.level < MAX_DIE_LEVEL)
        .find_map(|(index, die)| {
            dice[index + 1..]
                .iter()
                .find(|other| other.kind == die.kind && other.level == die.level)
                .map(|other| (other.cell, die.cell))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_defence_core::{DieKind, Point};

    fn die(column: u32, kind: DieKind, level: u8) -> DieSnapshot {
        DieSnapshot {
            cell: CellCoord::new(column, 0),
            kind,
            level,
            center: Point::new(0.0, 0.0),
            range: 1000.0,
            ready: false,
        }
    }

    #[test]
    fn merges_matching_dice_into_the_earlier_cell() {
        let dice = [
            die(0, DieKind::Fire, 2),
            die(1, DieKind::Fire, 1),
            die(2, DieKind::Fire, 2),
        ];
        assert_eq!(
            mergeable_pair(&dice),
            Some((CellCoord::new(2, 0), CellCoord::new(0, 0)))
        );
    }

    #[test]
    fn maxed_dice_are_left_alone() {
        let dice = [die(0, DieKind::Iron, 7), die(1, DieKind::Iron, 7)];
        assert_eq!(mergeable_pair(&dice), None);
    }

    #[test]
    fn summons_on_a_fresh_board() {
        let world = World::new();
        assert_eq!(Autoplay.decide(&world), Some(Command::SummonDie));
    }
}

//! Money-bought run upgrades and coin-bought class upgrades.

use dice_defence_core::{ClassUpgrade, DieKind, PurchaseError, UpgradeKind, UpgradeView};

/// Highest level an in-game upgrade can reach.
pub const MAX_UPGRADE_LEVEL: u8 = 5;
const UPGRADE_COSTS: [u32; 4] = [50, 100, 200, 400];
const DAMAGE_PER_LEVEL: f32 = 0.20;
const FIRE_RATE_PER_LEVEL: f32 = 0.15;
const RANGE_PER_LEVEL: f32 = 0.15;

/// Coin price of every class upgrade.
pub const CLASS_UPGRADE_COST: u32 = 50;
const CLASS_DAMAGE_STEP: f32 = 0.10;
const CLASS_FIRE_PERIOD_STEP: f32 = 0.05;
const CRIT_STEP: f32 = 0.05;
const CRIT_CAP_STEPS: u8 = 10;

/// Result of an in-game upgrade purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurchaseOutcome {
    /// New level on success, or the rejection.
    pub result: Result<u8, PurchaseError>,
    /// Money left after the attempt.
    pub money: u32,
    kind: UpgradeKind,
}

impl PurchaseOutcome {
    /// Reports whether the upgrade was bought.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.result.is_ok()
    }

    /// User-facing description of the attempt.
    #[must_use]
    pub fn message(&self) -> String {
        match self.result {
            Ok(level) => format!("{} upgraded to Level {level}!", self.kind),
            Err(reason) => reason.to_string(),
        }
    }
}

/// Run-scoped upgrades shared by every die.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InGameUpgrades {
    levels: [u8; 3],
}

impl InGameUpgrades {
    /// All upgrades at level 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { levels: [1; 3] }
    }

    const fn slot(kind: UpgradeKind) -> usize {
        match kind {
            UpgradeKind::Damage => 0,
            UpgradeKind::FireRate => 1,
            UpgradeKind::Range => 2,
        }
    }

    /// Current level of an upgrade.
    #[must_use]
    pub const fn level(&self, kind: UpgradeKind) -> u8 {
        self.levels[Self::slot(kind)]
    }

    /// Price of the next level, or `None` at the maximum.
    #[must_use]
    pub fn cost(&self, kind: UpgradeKind) -> Option<u32> {
        let level = self.level(kind);
        if level >= MAX_UPGRADE_LEVEL {
            return None;
        }
        UPGRADE_COSTS.get(usize::from(level) - 1).copied()
    }

    /// Attempts to buy the next level of `kind` with `money`.
    pub fn purchase(&mut self, kind: UpgradeKind, money: u32) -> PurchaseOutcome {
        let result = match self.cost(kind) {
            None => Err(PurchaseError::MaxLevel { upgrade: kind }),
            Some(cost) if money < cost => Err(PurchaseError::InsufficientFunds { cost }),
            Some(cost) => {
                let slot = &mut self.levels[Self::slot(kind)];
                *slot += 1;
                return PurchaseOutcome {
                    result: Ok(*slot),
                    money: money - cost,
                    kind,
                };
            }
        };
        PurchaseOutcome {
            result,
            money,
            kind,
        }
    }

    fn bonus(&self, kind: UpgradeKind, per_level: f32) -> f32 {
        1.0 + f32::from(self.level(kind) - 1) * per_level
    }

    /// Damage multiplier applied to every die.
    #[must_use]
    pub fn damage_multiplier(&self) -> f32 {
        self.bonus(UpgradeKind::Damage, DAMAGE_PER_LEVEL)
    }

    /// Fire-rate multiplier; fire periods are divided by it.
    #[must_use]
    pub fn fire_rate_multiplier(&self) -> f32 {
        self.bonus(UpgradeKind::FireRate, FIRE_RATE_PER_LEVEL)
    }

    /// Range multiplier applied to every die.
    #[must_use]
    pub fn range_multiplier(&self) -> f32 {
        self.bonus(UpgradeKind::Range, RANGE_PER_LEVEL)
    }
}

impl Default for InGameUpgrades {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ClassLevels {
    damage: f32,
    fire_period: f32,
    crit_steps: u8,
}

impl ClassLevels {
    const fn new() -> Self {
        Self {
            damage: 1.0,
            fire_period: 1.0,
            crit_steps: 0,
        }
    }

    fn crit_rate(&self) -> f32 {
        f32::from(self.crit_steps) * CRIT_STEP
    }
}

/// Coins and per-kind class upgrades that survive run restarts.
#[derive(Clone, Debug, PartialEq)]
pub struct Progression {
    coins: u32,
    classes: [ClassLevels; 7],
}

impl Progression {
    /// Empty wallet, no class upgrades.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            coins: 0,
            classes: [ClassLevels::new(); 7],
        }
    }

    /// Coins available.
    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    pub(crate) fn earn(&mut self, amount: u32) -> u32 {
        self.coins = self.coins.saturating_add(amount);
        self.coins
    }

    /// Spends coins on a class upgrade, returning the coins left.
    pub fn purchase(&mut self, die: DieKind, upgrade: ClassUpgrade) -> Result<u32, PurchaseError> {
        let class = &mut self.classes[die.index()];
        if upgrade == ClassUpgrade::CritRate && class.crit_steps >= CRIT_CAP_STEPS {
            return Err(PurchaseError::CritCapReached);
        }
        if self.coins < CLASS_UPGRADE_COST {
            return Err(PurchaseError::InsufficientCoins {
                cost: CLASS_UPGRADE_COST,
            });
        }

        self.coins -= CLASS_UPGRADE_COST;
        match upgrade {
            ClassUpgrade::Damage => class.damage *= 1.0 + CLASS_DAMAGE_STEP,
            ClassUpgrade::FireRate => class.fire_period *= 1.0 - CLASS_FIRE_PERIOD_STEP,
            ClassUpgrade::CritRate => class.crit_steps += 1,
        }
        Ok(self.coins)
    }

    /// Permanent fire-period multiplier for a kind.
    #[must_use]
    pub fn fire_period_multiplier(&self, die: DieKind) -> f32 {
        self.classes[die.index()].fire_period
    }

    /// Combines class upgrades with the run's upgrades into a lookup table.
    #[must_use]
    pub fn upgrade_view(&self, in_game: &InGameUpgrades) -> UpgradeView {
        let run_damage = in_game.damage_multiplier();
        UpgradeView::new(
            self.classes.map(|class| class.damage * run_damage),
            self.classes.map(|class| class.crit_rate()),
        )
    }

    #[cfg(test)]
    pub(crate) fn with_coins(coins: u32) -> Self {
        Self {
            coins,
            ..Self::new()
        }
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}

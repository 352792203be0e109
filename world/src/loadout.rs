use dice_defence_core::DieKind;

const MAX_SLOTS: usize = 5;

/// Die kinds eligible for random summons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loadout {
    selected: Vec<DieKind>,
}

impl Loadout {
    /// Selects the first five kinds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            selected: DieKind::ALL[..MAX_SLOTS].to_vec(),
        }
    }

    /// Kinds currently selected, in selection order.
    #[must_use]
    pub fn selected(&self) -> &[DieKind] {
        &self.selected
    }

    /// Removes a selected kind or appends an unselected one while slots remain.
    pub(crate) fn toggle(&mut self, kind: DieKind) {
        if let Some(index) = self.selected.iter().position(|selected| *selected == kind) {
            let _ = self.selected.remove(index);
        } else if self.selected.len() < MAX_SLOTS {
            self.selected.push(kind);
        }
    }
}

impl Default for Loadout {
    fn default() -> Self {
        Self::new()
    }
}

//! Best runs ranked by waves survived.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{read_json, write_json, PersistenceError};

/// Number of entries kept on the leaderboard.
pub const LEADERBOARD_CAPACITY: usize = 10;

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player name.
    pub name: String,
    /// Waves survived.
    pub waves: u32,
}

/// Top scores sorted by waves, best first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    /// Creates an empty leaderboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the leaderboard; a missing file yields an empty board.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let mut board: Self = read_json(path)?.unwrap_or_default();
        board.normalize();
        Ok(board)
    }

    /// Writes the leaderboard as a JSON array.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        write_json(path, self)
    }

    /// Entries, best first.
    #[must_use]
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Reports whether `waves` would earn a place on the board.
    #[must_use]
    pub fn is_high_score(&self, waves: u32) -> bool {
        match self.entries.get(LEADERBOARD_CAPACITY - 1) {
            Some(last) => waves > last.waves,
            None => true,
        }
    }

    /// Inserts a score, keeping the board sorted and capped.
    pub fn record(&mut self, name: impl Into<String>, waves: u32) {
        let name = name.into();
        debug!("recording {waves} waves for {name}");
        self.entries.push(ScoreEntry { name, waves });
        self.normalize();
    }

    // Stable sort keeps earlier entries ahead of later ties.
    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.waves.cmp(&a.waves));
        self.entries.truncate(LEADERBOARD_CAPACITY);
    }
}

//! Story chapter progress.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{read_json, write_json, PersistenceError};

/// Stages the player completed and the stage last selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryProgress {
    #[serde(default)]
    completed_stages: Vec<String>,
    #[serde(default)]
    current_stage: Option<String>,
}

impl StoryProgress {
    /// Progress of a new player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads progress; a missing file yields fresh progress.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        Ok(read_json(path)?.unwrap_or_default())
    }

    /// Writes progress as a JSON object.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        write_json(path, self)
    }

    /// Completed stage identifiers in completion order.
    #[must_use]
    pub fn completed_stages(&self) -> &[String] {
        &self.completed_stages
    }

    /// Stage last selected, if any.
    #[must_use]
    pub fn current_stage(&self) -> Option<&str> {
        self.current_stage.as_deref()
    }

    /// Remembers the stage being played.
    pub fn select(&mut self, stage: impl Into<String>) {
        self.current_stage = Some(stage.into());
    }

    /// Reports whether the stage has been completed.
    #[must_use]
    pub fn is_completed(&self, stage: &str) -> bool {
        self.completed_stages.iter().any(|done| done == stage)
    }

    /// Marks a stage completed; repeated calls change nothing.
    pub fn complete(&mut self, stage: &str) {
        if !self.is_completed(stage) {
            self.completed_stages.push(stage.to_owned());
        }
    }

    /// Reports whether `stage` may be played given the chapter order.
    ///
    /// The first stage is always open; any other stage opens once its
    /// predecessor is completed. Unknown stages are locked.
    #[must_use]
    pub fn is_unlocked<S: AsRef<str>>(&self, stage: &str, order: &[S]) -> bool {
        match order.iter().position(|id| id.as_ref() == stage) {
            Some(0) => true,
            Some(index) => self.is_completed(order[index - 1].as_ref()),
            None => false,
        }
    }
}

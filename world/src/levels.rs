//! Catalogue of practice levels and story stages.

use dice_defence_core::Point;

use crate::grid::Grid;

const CELL_SIZE: f32 = 140.0;
const PRACTICE_ORIGIN: Point = Point::new(575.0, 175.0);
const PRACTICE_COLUMNS: u32 = 5;
const PRACTICE_ROWS: u32 = 3;
const STORY_COLUMNS: u32 = 1280 / 140;
const STORY_ROWS: u32 = 768 / 140;
const STAGE_WAVES: u32 = 5;

/// How the board is laid out for a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardShape {
    /// Fixed rectangle of cells beside the path.
    Rectangular,
    /// Full-screen board masked to the cells bordering the path.
    AlongPath,
}

/// Path, difficulty and board of a playable map.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    name: &'static str,
    path: Vec<Point>,
    difficulty: f32,
    shape: BoardShape,
}

impl Layout {
    fn new(name: &'static str, path: &[(f32, f32)], difficulty: f32, shape: BoardShape) -> Self {
        Self {
            name,
            path: path.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            difficulty,
            shape,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Waypoints from spawn to the base.
    #[must_use]
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Multiplier applied to enemy hp.
    #[must_use]
    pub const fn difficulty(&self) -> f32 {
        self.difficulty
    }

    /// Board layout used with this map.
    #[must_use]
    pub const fn shape(&self) -> BoardShape {
        self.shape
    }

    #[cfg(test)]
    pub(crate) fn from_path(path: Vec<Point>) -> Self {
        Self {
            name: "Test",
            path,
            difficulty: 1.0,
            shape: BoardShape::Rectangular,
        }
    }

    pub(crate) fn build_grid(&self) -> Grid {
        match self.shape {
            BoardShape::Rectangular => {
                Grid::rectangular(PRACTICE_ORIGIN, CELL_SIZE, PRACTICE_COLUMNS, PRACTICE_ROWS)
            }
            BoardShape::AlongPath => Grid::along_path(
                Point::new(0.0, 0.0),
                CELL_SIZE,
                STORY_COLUMNS,
                STORY_ROWS,
                &self.path,
            ),
        }
    }
}

const MEADOW: [(f32, f32); 4] = [(1280.0, 125.0), (500.0, 125.0), (500.0, 650.0), (1280.0, 650.0)];
const TUNDRA: [(f32, f32); 3] = [(100.0, 100.0), (100.0, 650.0), (1200.0, 650.0)];
const STORY: [(f32, f32); 4] = [(1200.0, 80.0), (100.0, 80.0), (100.0, 650.0), (600.0, 650.0)];

/// Number of practice levels.
pub const PRACTICE_LEVEL_COUNT: usize = 3;

/// Practice level by index; out-of-range indices clamp to the last level.
#[must_use]
pub fn practice_level(index: usize) -> Layout {
    match index.min(PRACTICE_LEVEL_COUNT - 1) {
        0 => Layout::new("Meadow", &MEADOW, 1.0, BoardShape::Rectangular),
        1 => Layout::new("Tundra", &TUNDRA, 1.2, BoardShape::Rectangular),
        _ => Layout::new("Story Mode", &STORY, 1.4, BoardShape::Rectangular),
    }
}

/// A numbered stage of the story chapter.
#[derive(Clone, Debug, PartialEq)]
pub struct StoryStage {
    id: &'static str,
    waves: u32,
    true_boss: bool,
    layout: Layout,
}

impl StoryStage {
    fn new(
        id: &'static str,
        name: &'static str,
        path: &[(f32, f32)],
        difficulty: f32,
        true_boss: bool,
    ) -> Self {
        Self {
            id,
            waves: STAGE_WAVES,
            true_boss,
            layout: Layout::new(name, path, difficulty, BoardShape::AlongPath),
        }
    }

    /// Identifier such as `"1-3"`.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// Waves to clear before the stage is won.
    #[must_use]
    pub const fn waves(&self) -> u32 {
        self.waves
    }

    /// Whether the last wave ends with a boss instead of a big enemy.
    #[must_use]
    pub const fn has_true_boss(&self) -> bool {
        self.true_boss
    }

    /// Map played in this stage.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

/// Stages of the story chapter in unlock order.
#[must_use]
pub fn story_stages() -> Vec<StoryStage> {
    vec![
        StoryStage::new("1-1", "Hell Gate", &MEADOW, 1.0, false),
        StoryStage::new("1-2", "Burning Path", &TUNDRA, 1.1, false),
        StoryStage::new("1-3", "Demon Fortress", &STORY, 1.2, false),
        StoryStage::new(
            "1-4",
            "Chamber of Torment",
            &[(1280.0, 400.0), (500.0, 400.0), (500.0, 650.0), (1280.0, 650.0)],
            1.3,
            false,
        ),
        StoryStage::new(
            "1-5",
            "Hell Lord's Throne",
            &[
                (1200.0, 80.0),
                (500.0, 80.0),
                (500.0, 400.0),
                (1200.0, 400.0),
                (1200.0, 650.0),
            ],
            1.5,
            true,
        ),
    ]
}

/// Looks up a story stage by identifier.
#[must_use]
pub fn story_stage(id: &str) -> Option<StoryStage> {
    story_stages().into_iter().find(|stage| stage.id == id)
}

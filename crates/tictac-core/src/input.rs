use serde::{Deserialize, Serialize};

/// Horizontal direction currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
}

/// Gameplay actions read by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Jump,
    UseCarrot,
    NextCarrot,
    PrevCarrot,
}

impl Action {
    const fn bit(self) -> u8 {
        match self {
            Action::Jump => 1 << 0,
            Action::UseCarrot => 1 << 1,
            Action::NextCarrot => 1 << 2,
            Action::PrevCarrot => 1 << 3,
        }
    }
}

/// Input capability polled once per tick.
pub trait InputSource {
    fn horizontal_direction(&self) -> Direction;
    /// True only on the tick the action becomes pressed.
    fn trigger(&self, action: Action) -> bool;
    /// Level-triggered.
    fn pressed(&self, action: Action) -> bool;
}

/// One tick of input, built by scripts, tests and replays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    pub direction: Direction,
    pub triggered: u8,
    pub held: u8,
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Mark the action as newly pressed this tick. A triggered action also
    /// counts as held.
    pub fn with_trigger(mut self, action: Action) -> Self {
        self.triggered |= action.bit();
        self.held |= action.bit();
        self
    }

    pub fn with_held(mut self, action: Action) -> Self {
        self.held |= action.bit();
        self
    }
}

impl InputSource for InputFrame {
    fn horizontal_direction(&self) -> Direction {
        self.direction
    }

    fn trigger(&self, action: Action) -> bool {
        self.triggered & action.bit() != 0
    }

    fn pressed(&self, action: Action) -> bool {
        self.held & action.bit() != 0
    }
}

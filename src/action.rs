use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snake::Direction;
use crate::vision::{StateKey, VisionSample};

/// How action indices map onto moves. Fixed for a session: the value table
/// is keyed on it.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ActionSpace {
    /// 0 up, 1 right, 2 down, 3 left
    #[default]
    Absolute,
    /// 0 straight, 1 turn left, 2 turn right
    Relative,
}

impl ActionSpace {
    pub fn size(self) -> usize {
        match self {
            ActionSpace::Absolute => 4,
            ActionSpace::Relative => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ActionSpace::Absolute => "absolute",
            ActionSpace::Relative => "relative",
        }
    }

    pub fn from_name(name: &str) -> Option<ActionSpace> {
        match name {
            "absolute" => Some(ActionSpace::Absolute),
            "relative" => Some(ActionSpace::Relative),
            _ => None,
        }
    }

    /// New heading for `action`, or `None` if the index is not in this space.
    pub fn resolve(self, heading: Direction, action: usize) -> Option<Direction> {
        match self {
            ActionSpace::Absolute => Direction::from_index(action),
            ActionSpace::Relative => match action {
                0 => Some(heading),
                1 => Some(heading.left()),
                2 => Some(heading.right()),
                _ => None,
            },
        }
    }

    /// Action index that moves the snake along `heading` without turning
    pub fn forward(self, heading: Direction) -> usize {
        match self {
            ActionSpace::Absolute => heading.index(),
            ActionSpace::Relative => 0,
        }
    }

    /// State key for `vision`. Relative play sees the world from its heading.
    pub fn key(self, vision: &VisionSample, heading: Direction) -> StateKey {
        match self {
            ActionSpace::Absolute => StateKey(vision.sights()),
            ActionSpace::Relative => StateKey(vision.sights_from(heading)),
        }
    }
}

impl fmt::Display for ActionSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

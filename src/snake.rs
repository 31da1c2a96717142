use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridPosition};

/// Heading on the board. The index order (up, right, down, left) is the
/// absolute action encoding and the order in which vision rays are cast.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    // 180° turn.
    pub fn opposite(self) -> Direction {
        Self::ALL[(self.index() + 2) % 4]
    }

    // 90° counter-clockwise.
    pub fn left(self) -> Direction {
        Self::ALL[(self.index() + 3) % 4]
    }

    // 90° clockwise.
    pub fn right(self) -> Direction {
        Self::ALL[(self.index() + 1) % 4]
    }

    /// (dx, dy) of one step; y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    ///direction of a single step from `from` to `to`, if they are neighbours
    pub fn between(from: GridPosition, to: GridPosition) -> Option<Direction> {
        Self::ALL.into_iter().find(|d| from.offset(d.delta()) == to)
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<GridPosition>, // body[0] - head
    pub heading: Direction,
}

impl Snake {
    pub fn from_segments(segments: &[GridPosition], heading: Direction) -> Snake {
        Snake {
            body: segments.iter().copied().collect(),
            heading,
        }
    }

    /// Lays a snake of `length` segments with its head in the interior of the
    /// board. Each trailing segment may bend (with `turn_chance`) so starting
    /// shapes vary; every segment stays inside the board and off the body.
    pub fn spawn<R: Rng>(rng: &mut R, grid: Grid, length: usize, turn_chance: f32) -> Snake {
        let margin = length as i32 + 1;
        let head = GridPosition::new(
            rng.gen_range(margin..=grid.size - margin - 1),
            rng.gen_range(margin..=grid.size - margin - 1),
        );

        let mut lay = Direction::ALL[rng.gen_range(0..4)].opposite();
        let mut body = VecDeque::with_capacity(length);
        body.push_back(head);

        for _ in 1..length {
            let last = body[body.len() - 1];
            let free = |d: &Direction| {
                let next = last.offset(d.delta());
                grid.is_inside(next) && !body.contains(&next)
            };

            if rng.r#gen::<f32>() < turn_chance {
                let options: Vec<Direction> = Direction::ALL.into_iter().filter(|d| free(d)).collect();
                if let Some(&d) = options.choose(rng) {
                    lay = d;
                }
            }
            if !free(&lay) {
                match Direction::ALL.into_iter().find(|d| free(d)) {
                    Some(d) => lay = d,
                    None => break,
                }
            }
            body.push_back(last.offset(lay.delta()));
        }

        // head moves away from its neck
        let heading = match body.get(1) {
            Some(&neck) => Direction::between(neck, head).unwrap_or(lay.opposite()),
            None => lay.opposite(),
        };
        Snake { body, heading }
    }

    pub fn head(&self) -> Option<GridPosition> {
        self.body.front().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn segments(&self) -> &VecDeque<GridPosition> {
        &self.body
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        self.body.contains(&pos)
    }

    /// True when moving the head onto `pos` would bite the body. The tail cell
    /// does not count: it is vacated on the same move.
    pub fn bites(&self, pos: GridPosition) -> bool {
        let n = self.body.len();
        self.body.iter().take(n.saturating_sub(1)).any(|&s| s == pos)
    }

    pub fn push_head(&mut self, pos: GridPosition) {
        self.body.push_front(pos);
    }

    pub fn pop_tail(&mut self) -> Option<GridPosition> {
        self.body.pop_back()
    }
}

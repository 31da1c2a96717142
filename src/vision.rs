//! What the snake sees: one ray per cardinal direction from the head,
//! stopping at the first wall, body segment or food item.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VisionError;
use crate::food::{FoodItem, FoodKind};
use crate::grid::Grid;
use crate::snake::{Direction, Snake};

/// Walls and body closer than this (inclusive) are "near".
pub const NEAR: u32 = 2;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Hit {
    Wall,
    Body,
    Food(FoodKind),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Ray {
    pub hit: Hit,
    /// steps taken from the head, first neighbour is 1
    pub distance: u32,
}

/// Rays indexed by `Direction::index()` (up, right, down, left).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct VisionSample {
    pub rays: [Ray; 4],
}

/// Compressed category of a ray, the unit of the state key.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Sight {
    WallNear,
    WallFar,
    BodyNear,
    BodyFar,
    Beneficial,
    Harmful,
}

impl Sight {
    pub fn from_ray(ray: Ray) -> Sight {
        let near = ray.distance <= NEAR;
        match ray.hit {
            Hit::Wall if near => Sight::WallNear,
            Hit::Wall => Sight::WallFar,
            Hit::Body if near => Sight::BodyNear,
            Hit::Body => Sight::BodyFar,
            Hit::Food(FoodKind::Beneficial) => Sight::Beneficial,
            Hit::Food(FoodKind::Harmful) => Sight::Harmful,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Sight::WallNear => 'W',
            Sight::WallFar => 'w',
            Sight::BodyNear => 'S',
            Sight::BodyFar => 's',
            Sight::Beneficial => 'G',
            Sight::Harmful => 'R',
        }
    }

    pub fn from_letter(c: char) -> Option<Sight> {
        match c {
            'W' => Some(Sight::WallNear),
            'w' => Some(Sight::WallFar),
            'S' => Some(Sight::BodyNear),
            's' => Some(Sight::BodyFar),
            'G' => Some(Sight::Beneficial),
            'R' => Some(Sight::Harmful),
            _ => None,
        }
    }
}

/// Discretized observation used to index the value table.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct StateKey(pub [Sight; 4]);

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{},{},{},{}", a.letter(), b.letter(), c.letter(), d.letter())
    }
}

impl FromStr for StateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sights = [Sight::WallNear; 4];
        let mut fields = s.split(',');
        for slot in sights.iter_mut() {
            let field = fields.next().ok_or_else(|| format!("state key `{s}` has fewer than 4 fields"))?;
            let mut chars = field.chars();
            *slot = match (chars.next(), chars.next()) {
                (Some(c), None) => Sight::from_letter(c),
                _ => None,
            }
            .ok_or_else(|| format!("unknown sight `{field}` in state key `{s}`"))?;
        }
        if fields.next().is_some() {
            return Err(format!("state key `{s}` has more than 4 fields"));
        }
        Ok(StateKey(sights))
    }
}

/// Casts the four rays. Pure: reads the board, changes nothing.
pub fn cast(snake: &Snake, foods: &[FoodItem], grid: Grid) -> Result<VisionSample, VisionError> {
    let head = snake.head().ok_or(VisionError::EmptySnake)?;
    if !grid.is_inside(head) {
        return Err(VisionError::HeadOutOfBounds {
            x: head.x,
            y: head.y,
            grid_size: grid.size,
        });
    }

    let ray = |dir: Direction| {
        let mut pos = head;
        let mut distance = 0;
        loop {
            pos = pos.offset(dir.delta());
            distance += 1;
            if !grid.is_inside(pos) {
                return Ray { hit: Hit::Wall, distance };
            }
            if snake.contains(pos) {
                return Ray { hit: Hit::Body, distance };
            }
            if let Some(food) = foods.iter().find(|f| f.position == pos) {
                return Ray { hit: Hit::Food(food.kind), distance };
            }
        }
    };

    Ok(VisionSample {
        rays: Direction::ALL.map(ray),
    })
}

impl VisionSample {
    pub fn ray(&self, dir: Direction) -> Ray {
        self.rays[dir.index()]
    }

    /// Sights in world order (up, right, down, left).
    pub fn sights(&self) -> [Sight; 4] {
        self.rays.map(Sight::from_ray)
    }

    /// Sights rotated into the frame of `heading`: ahead, right, behind, left.
    pub fn sights_from(&self, heading: Direction) -> [Sight; 4] {
        let world = self.sights();
        std::array::from_fn(|i| world[(heading.index() + i) % 4])
    }

    ///closest visible food of `kind`
    pub fn nearest(&self, kind: FoodKind) -> Option<u32> {
        self.rays
            .iter()
            .filter(|r| r.hit == Hit::Food(kind))
            .map(|r| r.distance)
            .min()
    }

    /// Text cross centred on the head (`H`), each sight letter placed at its
    /// ray distance. Used for the terminal vision display.
    pub fn compass(&self) -> String {
        let reach = self.rays.iter().map(|r| r.distance).max().unwrap_or(1) as usize;
        let side = reach * 2 + 1;
        let mut rows = vec![vec![' '; side]; side];
        let c = reach;
        rows[c][c] = 'H';
        for dir in Direction::ALL {
            let ray = self.ray(dir);
            let d = ray.distance as usize;
            let (row, col) = match dir {
                Direction::Up => (c - d, c),
                Direction::Right => (c, c + d),
                Direction::Down => (c + d, c),
                Direction::Left => (c, c - d),
            };
            rows[row][col] = Sight::from_ray(ray).letter();
        }
        rows.into_iter()
            .map(|r| r.into_iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for VisionSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dir) in Direction::ALL.into_iter().enumerate() {
            let ray = self.ray(dir);
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}{}", dir.name(), Sight::from_ray(ray).letter(), ray.distance)?;
        }
        Ok(())
    }
}

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridPosition};
use crate::snake::Snake;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    /// grows the snake
    Beneficial,
    /// shrinks the snake
    Harmful,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FoodItem {
    pub position: GridPosition,
    pub kind: FoodKind,
}

impl FoodItem {
    pub fn new(kind: FoodKind, x: i32, y: i32) -> Self {
        Self { position: GridPosition::new(x, y), kind }
    }
}

/// Picks a cell uniformly among those free of snake and food.
/// Returns `None` when the board is full.
pub fn free_cell<R: Rng>(
    rng: &mut R,
    grid: Grid,
    snake: &Snake,
    foods: &[FoodItem],
) -> Option<GridPosition> {
    let free = grid.free_cells(|p| snake.contains(p) || foods.iter().any(|f| f.position == p));
    free.choose(rng).copied()
}

/// Adds one item of `kind` on a free cell. Returns false if nothing was placed.
pub fn place<R: Rng>(
    rng: &mut R,
    grid: Grid,
    snake: &Snake,
    foods: &mut Vec<FoodItem>,
    kind: FoodKind,
) -> bool {
    match free_cell(rng, grid, snake, foods) {
        Some(position) => {
            foods.push(FoodItem { position, kind });
            true
        }
        None => {
            tracing::warn!(?kind, "no free cell left for food");
            false
        }
    }
}

pub fn at(foods: &[FoodItem], pos: GridPosition) -> Option<usize> {
    foods.iter().position(|f| f.position == pos)
}

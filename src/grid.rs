use serde::{Deserialize, Serialize};

/// One cell of the board. Signed so a step off the edge is representable.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    pub fn is_adjacent(self, other: GridPosition) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }
}

/// Square board bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    pub size: i32,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        Self { size }
    }

    pub fn is_inside(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.size && pos.y < self.size
    }

    pub fn cells(&self) -> impl Iterator<Item = GridPosition> {
        let size = self.size;
        (0..size).flat_map(move |y| (0..size).map(move |x| GridPosition::new(x, y)))
    }

    ///every cell for which `occupied` returns false, in row-major order
    pub fn free_cells<F>(&self, occupied: F) -> Vec<GridPosition>
    where
        F: Fn(GridPosition) -> bool,
    {
        self.cells().filter(|&p| !occupied(p)).collect()
    }
}

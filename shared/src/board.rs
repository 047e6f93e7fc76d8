//! Board geometry and the blast propagation shared by server and client.
//!
//! Both sides must agree cell for cell on what an explosion touches, so the
//! propagation lives here as a single pure function.

use crate::types::{Coord, Direction, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    pub size_x: Coord,
    pub size_y: Coord,
}

impl Board {
    pub fn new(size_x: Coord, size_y: Coord) -> Self {
        Self { size_x, size_y }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.size_x) && y < i32::from(self.size_y)
    }

    /// The cell `distance` steps away from `from` in `direction`, if it is
    /// still on the board.
    pub fn offset(&self, from: Position, direction: Direction, distance: u16) -> Option<Position> {
        let (dx, dy) = direction.delta();
        let x = i32::from(from.x) + dx * i32::from(distance);
        let y = i32::from(from.y) + dy * i32::from(distance);
        if self.contains(x, y) {
            Some(Position::new(x as Coord, y as Coord))
        } else {
            None
        }
    }

    pub fn step(&self, from: Position, direction: Direction) -> Option<Position> {
        self.offset(from, direction, 1)
    }
}

/// Cells reached by one explosion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blast {
    /// Every affected cell, origin first, then ring by ring in
    /// up/right/down/left order.
    pub cells: Vec<Position>,
    /// Affected cells that hold a block, in the same order.
    pub blocks: Vec<Position>,
}

/// Propagates an explosion from `origin` along the four axes.
///
/// A ray stops at the board edge, or at the first block it reaches (that
/// block's cell is still affected). A block on the origin itself swallows
/// the whole explosion.
pub fn blast<F>(board: &Board, origin: Position, radius: u16, has_block: F) -> Blast
where
    F: Fn(&Position) -> bool,
{
    let mut result = Blast {
        cells: vec![origin],
        blocks: Vec::new(),
    };

    if has_block(&origin) {
        result.blocks.push(origin);
        return result;
    }

    let mut open = [true; 4];
    for distance in 1..=radius {
        for (ray, direction) in Direction::ALL.iter().enumerate() {
            if !open[ray] {
                continue;
            }
            let Some(cell) = board.offset(origin, *direction, distance) else {
                open[ray] = false;
                continue;
            };
            result.cells.push(cell);
            if has_block(&cell) {
                result.blocks.push(cell);
                open[ray] = false;
            }
        }
    }

    result
}

//! Plain data carried by the protocol and owned by both game states.

use std::fmt;

pub type PlayerId = u8;
pub type BombId = u32;
pub type Score = u32;
pub type Coord = u16;

/// A cell on the board. Ordered by `(x, y)` so that rendered collections
/// come out in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub x: Coord,
    pub y: Coord,
}

impl Position {
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Right),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Unit step as `(dx, dy)`. `Up` grows `y`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Player {
    pub name: String,
    pub address: String,
}

impl Player {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Per-game bookkeeping for an accepted player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub player: Player,
    pub position: Position,
    pub score: Score,
}

impl PlayerInfo {
    pub fn new(id: PlayerId, player: Player) -> Self {
        Self {
            id,
            player,
            position: Position::default(),
            score: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bomb {
    pub position: Position,
    /// Turns left until the bomb explodes.
    pub timer: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_roundtrip_through_u8() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_u8(direction.to_u8()), Some(direction));
        }
        assert_eq!(Direction::from_u8(4), None);
        assert_eq!(Direction::from_u8(255), None);
    }

    #[test]
    fn test_direction_deltas() {
        assert_eq!(Direction::Up.delta(), (0, 1));
        assert_eq!(Direction::Right.delta(), (1, 0));
        assert_eq!(Direction::Down.delta(), (0, -1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
    }

    #[test]
    fn test_position_ordering() {
        let mut positions = vec![Position::new(2, 0), Position::new(0, 3), Position::new(0, 1)];
        positions.sort();
        assert_eq!(
            positions,
            vec![Position::new(0, 1), Position::new(0, 3), Position::new(2, 0)]
        );
    }

    #[test]
    fn test_player_info_starts_clean() {
        let info = PlayerInfo::new(3, Player::new("alice", "127.0.0.1:1000"));
        assert_eq!(info.id, 3);
        assert_eq!(info.score, 0);
        assert_eq!(info.position, Position::new(0, 0));
    }
}

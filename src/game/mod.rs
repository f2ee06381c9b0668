//! # Game Module
//!
//! Core simulation: board representation, the per-episode plot, the entity
//! model, and the engine that steps them.
//!
//! This module contains the fundamental building blocks of Symbol World:
//! - Board, backdrop and per-character layers
//! - The plot shared by every entity during a tick
//! - Sprites and drapes with footprint-based collision
//! - The engine scheduler and its builder

pub mod board;
pub mod engine;
pub mod observation;
pub mod plot;
pub mod things;

pub use board::*;
pub use engine::*;
pub use observation::*;
pub use plot::*;
pub use things::*;

use serde::{Deserialize, Serialize};

/// A cell coordinate on the board, or a relative offset between cells.
///
/// Rows grow downward and columns grow to the right. Coordinates are signed so
/// that offsets and out-of-board positions (for footprints and crop windows)
/// can be represented without special cases.
///
/// # Examples
///
/// ```
/// use symbolworld::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.row, 10);
/// assert_eq!(pos - Position::new(12, 5), Position::new(-2, 0));
/// assert_eq!(pos.chebyshev_distance(Position::origin()), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Calculates the Chebyshev (king-move) distance to another position.
    ///
    /// This is the metric the level generator's safety box enforces.
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        (self.row - other.row)
            .abs()
            .max((self.col - other.col).abs()) as u32
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.row + other.row, self.col + other.col)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.row - other.row, self.col - other.col)
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

/// Directions a sprite can step in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use symbolworld::{Direction, Position};
    ///
    /// assert_eq!(Direction::North.to_delta(), Position::new(-1, 0));
    /// assert_eq!(Direction::East.to_delta(), Position::new(0, 1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(-1, 0),
            Direction::South => Position::new(1, 0),
            Direction::East => Position::new(0, 1),
            Direction::West => Position::new(0, -1),
        }
    }
}

/// Action codes accepted by [`Engine::step`].
///
/// The engine never interprets actions itself; it hands them to every entity
/// and each entity decides whether it cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Stay,
    Quit,
    /// Any other code, passed through uninterpreted.
    Other(i32),
}

impl Action {
    /// Decodes the integer action encoding {up=0, down=1, left=2, right=3, stay=4, quit=5}.
    ///
    /// # Examples
    ///
    /// ```
    /// use symbolworld::Action;
    ///
    /// assert_eq!(Action::from_code(2), Action::Left);
    /// assert_eq!(Action::from_code(42), Action::Other(42));
    /// ```
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Action::Up,
            1 => Action::Down,
            2 => Action::Left,
            3 => Action::Right,
            4 => Action::Stay,
            5 => Action::Quit,
            other => Action::Other(other),
        }
    }

    /// The movement direction this action requests, if any.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Up => Some(Direction::North),
            Action::Down => Some(Direction::South),
            Action::Left => Some(Direction::West),
            Action::Right => Some(Direction::East),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(5, 10);
        assert_eq!(pos.row, 5);
        assert_eq!(pos.col, 10);
    }

    #[test]
    fn test_chebyshev_distance() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.chebyshev_distance(pos2), 4);
        assert_eq!(pos2.chebyshev_distance(pos1), 4);
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(Action::from_code(0), Action::Up);
        assert_eq!(Action::from_code(5), Action::Quit);
        assert_eq!(Action::from_code(-1), Action::Other(-1));
        assert_eq!(Action::Right.direction(), Some(Direction::East));
        assert_eq!(Action::Quit.direction(), None);
    }
}

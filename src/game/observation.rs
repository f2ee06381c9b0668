//! # Observation
//!
//! What the engine hands to consumers after every tick.

use crate::game::{Board, Layers, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A snapshot of the composited board.
///
/// Alongside the characters and layers it records where each visible sprite's
/// reference cell is, so croppers can follow sprites that another entity
/// paints over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub board: Board,
    pub layers: Layers,
    pub sprites: BTreeMap<char, Position>,
}

impl Observation {
    pub fn new(board: Board, layers: Layers, sprites: BTreeMap<char, Position>) -> Self {
        Self {
            board,
            layers,
            sprites,
        }
    }

    pub fn rows(&self) -> usize {
        self.board.rows()
    }

    pub fn cols(&self) -> usize {
        self.board.cols()
    }

    /// Reference cell of a visible sprite, in this observation's coordinates.
    pub fn sprite_position(&self, ch: char) -> Option<Position> {
        self.sprites.get(&ch).copied()
    }

    /// Board text, one string per row.
    pub fn to_lines(&self) -> Vec<String> {
        self.board.to_lines()
    }
}

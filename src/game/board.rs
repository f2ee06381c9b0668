//! # Board Representation
//!
//! Character grids, boolean layers, the static backdrop, and the textual level
//! descriptor exchanged between the generator and the engine.

use crate::game::Position;
use crate::{SymbolWorldError, SymbolWorldResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A rectangular grid of characters.
///
/// The engine composites one of these every tick; croppers cut windows out of
/// it. Storage is row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<char>,
}

impl Board {
    /// Creates a board with every cell set to `fill`.
    pub fn filled(rows: usize, cols: usize, fill: char) -> Self {
        Self {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }

    /// Builds a board from equal-length text rows.
    ///
    /// # Examples
    ///
    /// ```
    /// use symbolworld::{Board, Position};
    ///
    /// let board = Board::from_lines(&["###", "#P#", "###"]).unwrap();
    /// assert_eq!(board.get(Position::new(1, 1)), Some('P'));
    /// assert!(Board::from_lines(&["##", "#"]).is_err());
    /// ```
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> SymbolWorldResult<Self> {
        let rows = lines.len();
        if rows == 0 {
            return Err(SymbolWorldError::InvalidLevel(
                "board has no rows".to_string(),
            ));
        }

        let cols = lines[0].as_ref().chars().count();
        if cols == 0 {
            return Err(SymbolWorldError::InvalidLevel(
                "board has no columns".to_string(),
            ));
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let width = line.chars().count();
            if width != cols {
                return Err(SymbolWorldError::InvalidLevel(format!(
                    "row {} has {} columns, expected {}",
                    index, width, cols
                )));
            }
            cells.extend(line.chars());
        }

        Ok(Self { rows, cols, cells })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether a position lies on the board.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < self.rows && (pos.col as usize) < self.cols
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.row as usize * self.cols + pos.col as usize)
        } else {
            None
        }
    }

    /// Character at a position, or None off the board.
    pub fn get(&self, pos: Position) -> Option<char> {
        self.index(pos).map(|index| self.cells[index])
    }

    /// Writes a character; returns false (and does nothing) off the board.
    pub fn set(&mut self, pos: Position, value: char) -> bool {
        match self.index(pos) {
            Some(index) => {
                self.cells[index] = value;
                true
            }
            None => false,
        }
    }

    /// Iterates over `(position, character)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, char)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, &ch)| (Position::new((index / cols) as i32, (index % cols) as i32), ch))
    }

    /// Positions holding a given character, in row-major order.
    pub fn positions_of(&self, ch: char) -> Vec<Position> {
        self.iter()
            .filter(|&(_, cell)| cell == ch)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Copies a `rows` x `cols` window whose top-left corner is `top_left`.
    ///
    /// Cells outside the board take `pad`. Returns None if the window leaves
    /// the board and no pad character was given.
    pub fn window(&self, top_left: Position, rows: usize, cols: usize, pad: Option<char>) -> Option<Board> {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let pos = top_left + Position::new(r as i32, c as i32);
                match (self.get(pos), pad) {
                    (Some(ch), _) => cells.push(ch),
                    (None, Some(pad)) => cells.push(pad),
                    (None, None) => return None,
                }
            }
        }
        Some(Board { rows, cols, cells })
    }

    /// Renders the board as one string per row.
    pub fn to_lines(&self) -> Vec<String> {
        self.cells
            .chunks(self.cols.max(1))
            .map(|row| row.iter().collect())
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// A boolean mask the size of the board.
///
/// Used both as a per-character presence layer and as a drape's curtain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Layer {
    /// Creates an all-false layer.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Marks every cell of `board` holding `ch`.
    pub fn from_board(board: &Board, ch: char) -> Self {
        Self {
            rows: board.rows,
            cols: board.cols,
            cells: board.cells.iter().map(|&cell| cell == ch).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < self.rows && (pos.col as usize) < self.cols {
            Some(pos.row as usize * self.cols + pos.col as usize)
        } else {
            None
        }
    }

    /// Mask value at a position; false off the layer.
    pub fn get(&self, pos: Position) -> bool {
        self.index(pos).map(|index| self.cells[index]).unwrap_or(false)
    }

    /// Sets a cell; returns false (and does nothing) off the layer.
    pub fn set(&mut self, pos: Position, value: bool) -> bool {
        match self.index(pos) {
            Some(index) => {
                self.cells[index] = value;
                true
            }
            None => false,
        }
    }

    /// Whether any cell is set.
    pub fn any(&self) -> bool {
        self.cells.iter().any(|&cell| cell)
    }

    /// Number of set cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }

    /// Set cells in row-major order.
    pub fn positions(&self) -> Vec<Position> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &cell)| cell)
            .map(|(index, _)| Position::new((index / cols) as i32, (index % cols) as i32))
            .collect()
    }
}

/// Per-character presence masks for one composited board.
///
/// Every character known to a game gets a layer, even when it currently
/// occupies no cell, so lookups by registered character never miss.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Layers {
    layers: BTreeMap<char, Layer>,
}

impl Layers {
    /// Computes layers for `characters` over `board`.
    pub fn compute<I>(board: &Board, characters: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        let layers = characters
            .into_iter()
            .map(|ch| (ch, Layer::from_board(board, ch)))
            .collect();
        Self { layers }
    }

    /// Layer for a character.
    pub fn get(&self, ch: char) -> Option<&Layer> {
        self.layers.get(&ch)
    }

    /// Whether `ch` occupies `pos`.
    pub fn is_at(&self, ch: char, pos: Position) -> bool {
        self.layers.get(&ch).map(|layer| layer.get(pos)).unwrap_or(false)
    }

    /// Characters with a layer, in sorted order.
    pub fn characters(&self) -> impl Iterator<Item = char> + '_ {
        self.layers.keys().copied()
    }
}

/// The static scenery painted under every entity.
///
/// Built from the level art with each entity character replaced by
/// `what_lies_beneath`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backdrop {
    curtain: Board,
    what_lies_beneath: char,
}

impl Backdrop {
    pub fn new(curtain: Board, what_lies_beneath: char) -> Self {
        Self {
            curtain,
            what_lies_beneath,
        }
    }

    /// The backdrop characters for the whole board.
    pub fn curtain(&self) -> &Board {
        &self.curtain
    }

    /// The default character under entities.
    pub fn what_lies_beneath(&self) -> char {
        self.what_lies_beneath
    }
}

/// An initial board as equal-length text rows.
///
/// This is the only artifact passed from the level generator to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    lines: Vec<String>,
}

impl Level {
    /// Validates that `lines` form a non-empty ASCII rectangle.
    pub fn new<S: Into<String>>(lines: Vec<S>) -> SymbolWorldResult<Self> {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if let Some(index) = lines.iter().position(|line| !line.is_ascii()) {
            return Err(SymbolWorldError::InvalidLevel(format!(
                "row {} contains non-ASCII characters",
                index
            )));
        }
        // Rectangularity and emptiness are checked by the board parser.
        Board::from_lines(&lines)?;
        Ok(Self { lines })
    }

    /// Builds a level from string slices.
    pub fn from_art(art: &[&str]) -> SymbolWorldResult<Self> {
        Self::new(art.to_vec())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn rows(&self) -> usize {
        self.lines.len()
    }

    pub fn cols(&self) -> usize {
        self.lines.first().map(|line| line.len()).unwrap_or(0)
    }

    /// Parses the level into a board.
    pub fn to_board(&self) -> SymbolWorldResult<Board> {
        Board::from_lines(&self.lines)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

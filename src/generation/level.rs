//! # Level Generation
//!
//! Walled square boards with a player, adversaries, keys and goals scattered
//! by rejection sampling.
//!
//! Each object is placed by drawing candidate cells until one has a clear
//! square of half-width `safety_box` around it: nothing but background, walls
//! included. Any two placed objects therefore end up at least
//! `safety_box + 1` cells apart in Chebyshev distance.

use crate::game::{Board, Level, Position};
use crate::generation::{utils, GenerationConfig, Generator};
use crate::{SymbolWorldError, SymbolWorldResult};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters a generated level is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyphs {
    pub background: char,
    pub wall: char,
    pub player: char,
    pub adversary: char,
    pub key: char,
    pub goal: char,
}

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            background: ' ',
            wall: '#',
            player: 'P',
            adversary: 'a',
            key: 'K',
            goal: '@',
        }
    }
}

impl Glyphs {
    fn placed(&self) -> [char; 4] {
        [self.player, self.adversary, self.key, self.goal]
    }

    /// Every non-background glyph must have a larger code than the background,
    /// so a region's code sum (less the background) is zero only when the
    /// region is entirely background.
    pub fn validate(&self) -> SymbolWorldResult<()> {
        let others = [self.wall, self.player, self.adversary, self.key, self.goal];
        if let Some(low) = others.iter().find(|&&ch| ch <= self.background) {
            return Err(SymbolWorldError::InvalidConfig(format!(
                "glyph {:?} must sort above the background {:?}",
                low, self.background
            )));
        }
        if !others.iter().chain([self.background].iter()).all(char::is_ascii) {
            return Err(SymbolWorldError::InvalidConfig(
                "glyphs must be ASCII".to_string(),
            ));
        }
        let mut distinct = others.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() != others.len() {
            return Err(SymbolWorldError::InvalidConfig(
                "glyphs must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether `pos` lies on a square grid of side `size`.
///
/// The candidate sampler draws from `0..=size`, one past the last index, so
/// this check runs before anything touches the grid.
pub fn candidate_in_bounds(pos: Position, size: usize) -> bool {
    pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < size && (pos.col as usize) < size
}

/// Whether the square of half-width `safety_box` around `pos` fits on the grid
/// and holds only `background`.
///
/// # Examples
///
/// ```
/// use symbolworld::{is_safe_to_place, Board, Position};
///
/// let mut grid = Board::filled(9, 9, ' ');
/// assert!(is_safe_to_place(&grid, Position::new(4, 4), 2, ' '));
/// assert!(!is_safe_to_place(&grid, Position::new(1, 4), 2, ' ')); // box leaves the grid
///
/// grid.set(Position::new(6, 6), 'K');
/// assert!(!is_safe_to_place(&grid, Position::new(4, 4), 2, ' '));
/// ```
pub fn is_safe_to_place(grid: &Board, pos: Position, safety_box: u32, background: char) -> bool {
    let half = safety_box as i32;
    if pos.row - half < 0 || pos.row + half + 1 > grid.rows() as i32 {
        return false;
    }
    if pos.col - half < 0 || pos.col + half + 1 > grid.cols() as i32 {
        return false;
    }

    let background = background as i64;
    let mut surrounding = 0i64;
    for row in (pos.row - half)..=(pos.row + half) {
        for col in (pos.col - half)..=(pos.col + half) {
            if let Some(ch) = grid.get(Position::new(row, col)) {
                surrounding += ch as i64 - background;
            }
        }
    }
    surrounding == 0
}

/// Generator for Symbol World levels.
#[derive(Debug, Clone, Default)]
pub struct LevelGenerator {
    pub glyphs: Glyphs,
}

impl LevelGenerator {
    /// Creates a generator with the default glyphs.
    ///
    /// # Examples
    ///
    /// ```
    /// use symbolworld::{GenerationConfig, LevelGenerator};
    ///
    /// let generator = LevelGenerator::new();
    /// let level = generator.generate_level(&GenerationConfig::for_testing(3)).unwrap();
    /// assert_eq!(level.rows(), 40);
    /// assert_eq!(level, generator.generate_level(&GenerationConfig::for_testing(3)).unwrap());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_glyphs(glyphs: Glyphs) -> Self {
        Self { glyphs }
    }

    /// Seeds a generator from `config.seed` and generates one level.
    pub fn generate_level(&self, config: &GenerationConfig) -> SymbolWorldResult<Level> {
        let mut rng = utils::create_rng(config);
        self.generate(config, &mut rng)
    }

    /// Draws candidates until one is clear or the budget runs out.
    fn try_place(
        &self,
        grid: &Board,
        config: &GenerationConfig,
        rng: &mut StdRng,
        object: &str,
    ) -> SymbolWorldResult<Position> {
        let size = grid.rows();
        for _ in 0..config.placement_attempts {
            let candidate = Position::new(
                rng.gen_range(0..=size as i32),
                rng.gen_range(0..=size as i32),
            );
            if !candidate_in_bounds(candidate, size) {
                continue;
            }
            if is_safe_to_place(grid, candidate, config.safety_box, self.glyphs.background) {
                log::debug!("placed {} at {:?}", object, candidate);
                return Ok(candidate);
            }
        }

        log::warn!(
            "failed to place {} after {} attempts",
            object,
            config.placement_attempts
        );
        Err(SymbolWorldError::PlacementFailed {
            object: object.to_string(),
            attempts: config.placement_attempts,
        })
    }

    fn place(
        &self,
        grid: &mut Board,
        config: &GenerationConfig,
        rng: &mut StdRng,
        glyph: char,
        object: &str,
    ) -> SymbolWorldResult<()> {
        let pos = self.try_place(grid, config, rng, object)?;
        grid.set(pos, glyph);
        Ok(())
    }

    fn draw_border(&self, grid: &mut Board) {
        let last = grid.rows() as i32 - 1;
        for i in 0..=last {
            grid.set(Position::new(0, i), self.glyphs.wall);
            grid.set(Position::new(last, i), self.glyphs.wall);
            grid.set(Position::new(i, 0), self.glyphs.wall);
            grid.set(Position::new(i, last), self.glyphs.wall);
        }
    }
}

impl Generator<Level> for LevelGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> SymbolWorldResult<Level> {
        config.validate()?;
        self.glyphs.validate()?;

        let size = config.grid_size.sample(rng) as usize;
        let num_goals = config.num_goals.sample(rng);
        let num_adversaries = config.num_adversaries.sample(rng);

        let mut grid = Board::filled(size, size, self.glyphs.background);
        self.draw_border(&mut grid);

        self.place(&mut grid, config, rng, self.glyphs.player, "player")?;
        for _ in 0..num_adversaries {
            self.place(&mut grid, config, rng, self.glyphs.adversary, "adversary")?;
        }
        for _ in 0..num_goals {
            self.place(&mut grid, config, rng, self.glyphs.key, "key")?;
        }
        for _ in 0..num_goals {
            self.place(&mut grid, config, rng, self.glyphs.goal, "goal")?;
        }

        log::info!(
            "generated {}x{} level with {} goals and {} adversaries (seed {})",
            size,
            size,
            num_goals,
            num_adversaries,
            config.seed
        );
        Level::new(grid.to_lines())
    }

    fn validate(&self, level: &Level, config: &GenerationConfig) -> SymbolWorldResult<()> {
        utils::validate_border(level, self.glyphs.wall)?;
        let board = level.to_board()?;

        if !config.grid_size.contains(board.rows() as u32) {
            return Err(SymbolWorldError::InvalidLevel(format!(
                "level size {} is outside {:?}",
                board.rows(),
                config.grid_size
            )));
        }

        let players = board.positions_of(self.glyphs.player).len();
        if players != 1 {
            return Err(SymbolWorldError::InvalidLevel(format!(
                "expected exactly one player, found {}",
                players
            )));
        }

        let goals = board.positions_of(self.glyphs.goal).len() as u32;
        let keys = board.positions_of(self.glyphs.key).len() as u32;
        let adversaries = board.positions_of(self.glyphs.adversary).len() as u32;
        if !config.num_goals.contains(goals) || keys != goals {
            return Err(SymbolWorldError::InvalidLevel(format!(
                "found {} goals and {} keys, expected matching counts in {:?}",
                goals, keys, config.num_goals
            )));
        }
        if !config.num_adversaries.contains(adversaries) {
            return Err(SymbolWorldError::InvalidLevel(format!(
                "found {} adversaries, expected {:?}",
                adversaries, config.num_adversaries
            )));
        }

        let objects: Vec<Position> = self
            .glyphs
            .placed()
            .iter()
            .flat_map(|&glyph| board.positions_of(glyph))
            .collect();
        for (i, a) in objects.iter().enumerate() {
            for b in &objects[i + 1..] {
                if a.chebyshev_distance(*b) <= config.safety_box {
                    return Err(SymbolWorldError::InvalidLevel(format!(
                        "objects at {:?} and {:?} are closer than the safety box",
                        a, b
                    )));
                }
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "LevelGenerator"
    }
}

//! # Generation Module
//!
//! Procedural construction of initial boards.
//!
//! Generators turn a [`GenerationConfig`] and a seeded random number generator
//! into a [`Level`]: equal-length text rows the engine builds a game from.
//! The same seed always yields the same level.

pub mod level;

pub use level::*;

use crate::game::Level;
use crate::{config, SymbolWorldError, SymbolWorldResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A count drawn uniformly from `[mean - var, mean + var]`.
///
/// # Examples
///
/// ```
/// use symbolworld::CountRange;
///
/// let range = CountRange::new(5, 2);
/// assert_eq!(range.min(), 3);
/// assert_eq!(range.max(), 7);
/// assert!(CountRange::new(1, 2).validate("goals").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub mean: u32,
    pub var: u32,
}

impl CountRange {
    pub fn new(mean: u32, var: u32) -> Self {
        Self { mean, var }
    }

    /// A range that always yields `count`.
    pub fn fixed(count: u32) -> Self {
        Self::new(count, 0)
    }

    pub fn min(&self) -> u32 {
        self.mean.saturating_sub(self.var)
    }

    pub fn max(&self) -> u32 {
        self.mean.saturating_add(self.var)
    }

    pub fn contains(&self, count: u32) -> bool {
        count >= self.min() && count <= self.max()
    }

    /// Rejects a variance larger than the mean.
    pub fn validate(&self, name: &str) -> SymbolWorldResult<()> {
        if self.var > self.mean {
            return Err(SymbolWorldError::InvalidConfig(format!(
                "{} variance {} cannot be greater than its mean {}",
                name, self.var, self.mean
            )));
        }
        Ok(())
    }

    /// Draws a count. Call `validate` first.
    pub fn sample(&self, rng: &mut StdRng) -> u32 {
        rng.gen_range(self.min()..=self.max())
    }
}

/// Configuration for procedural generation.
///
/// Controls the board size, how many objects of each kind are placed, and how
/// much empty space each placed object demands around itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Side length of the square grid, walls included
    pub grid_size: CountRange,
    /// Number of goals; the same number of keys is placed
    pub num_goals: CountRange,
    /// Number of adversaries
    pub num_adversaries: CountRange,
    /// Half-width of the square around each object that must be empty
    pub safety_box: u32,
    /// Candidate cells tried per object before giving up
    pub placement_attempts: u32,
}

impl GenerationConfig {
    /// Creates the default configuration with a given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use symbolworld::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(42);
    /// assert_eq!(config.grid_size.mean, 50);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            grid_size: CountRange::new(config::GRID_SIZE, config::GRID_SIZE_VAR),
            num_goals: CountRange::new(config::NUM_GOALS, config::NUM_GOALS_VAR),
            num_adversaries: CountRange::new(config::NUM_ADVERSARIES, config::NUM_ADVERSARIES_VAR),
            safety_box: config::SAFETY_BOX,
            placement_attempts: config::PLACEMENT_ATTEMPTS,
        }
    }

    /// Creates a configuration for testing with a smaller board and one of each object.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            grid_size: CountRange::fixed(40),
            num_goals: CountRange::fixed(1),
            num_adversaries: CountRange::fixed(1),
            safety_box: 5,
            placement_attempts: config::PLACEMENT_ATTEMPTS,
        }
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> SymbolWorldResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SymbolWorldResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks ranges eagerly so generation never sees a bad configuration.
    pub fn validate(&self) -> SymbolWorldResult<()> {
        self.grid_size.validate("grid size")?;
        self.num_goals.validate("goal count")?;
        self.num_adversaries.validate("adversary count")?;

        if self.placement_attempts == 0 {
            return Err(SymbolWorldError::InvalidConfig(
                "placement attempts must be positive".to_string(),
            ));
        }

        // The clear square must fit strictly inside the border walls.
        let smallest = self.grid_size.min() as u64;
        let needed = 2 * self.safety_box as u64 + 3;
        if smallest < needed {
            return Err(SymbolWorldError::InvalidConfig(format!(
                "grid size {} is too small for safety box {} (need at least {})",
                smallest, self.safety_box, needed
            )));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
///
/// All generation systems implement this trait, so callers can swap one
/// generator for another without changing how they seed or check results.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> SymbolWorldResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> SymbolWorldResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Validates that a level is a square with an unbroken wall border.
    pub fn validate_border(level: &Level, wall: char) -> SymbolWorldResult<()> {
        let board = level.to_board()?;
        if board.rows() != board.cols() {
            return Err(SymbolWorldError::InvalidLevel(format!(
                "level is {}x{}, expected a square",
                board.rows(),
                board.cols()
            )));
        }

        let last = board.rows() as i32 - 1;
        let broken = board
            .iter()
            .filter(|(pos, _)| pos.row == 0 || pos.col == 0 || pos.row == last || pos.col == last)
            .any(|(_, ch)| ch != wall);
        if broken {
            return Err(SymbolWorldError::InvalidLevel(
                "level border is not all wall".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.safety_box, config::SAFETY_BOX);
        assert_eq!(config.placement_attempts, 100);
        assert!(config.validate().is_ok());
        assert!(GenerationConfig::for_testing(1).validate().is_ok());
    }

    #[test]
    fn test_variance_above_mean_is_rejected() {
        let mut config = GenerationConfig::new(1);
        config.num_adversaries = CountRange::new(1, 2);
        assert!(matches!(
            config.validate(),
            Err(SymbolWorldError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_grid_too_small_for_safety_box() {
        let mut config = GenerationConfig::new(1);
        config.grid_size = CountRange::fixed(14);
        config.safety_box = 6;
        assert!(config.validate().is_err());
        config.grid_size = CountRange::fixed(15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_count_range_sampling_stays_in_range() {
        let config = GenerationConfig::new(7);
        let mut rng = utils::create_rng(&config);
        let range = CountRange::new(4, 2);
        for _ in 0..200 {
            assert!(range.contains(range.sample(&mut rng)));
        }
        assert_eq!(CountRange::fixed(3).sample(&mut rng), 3);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "seed": 9,
            "grid_size": {"mean": 20, "var": 2},
            "num_goals": {"mean": 1, "var": 0},
            "num_adversaries": {"mean": 2, "var": 1},
            "safety_box": 2,
            "placement_attempts": 50
        }"#;
        let config = GenerationConfig::from_json_str(json).unwrap();
        assert_eq!(config.grid_size, CountRange::new(20, 2));
        assert_eq!(config.placement_attempts, 50);

        let bad = json.replace(r#""var": 2"#, r#""var": 30"#);
        assert!(GenerationConfig::from_json_str(&bad).is_err());
        assert!(matches!(
            GenerationConfig::from_json_str("{"),
            Err(SymbolWorldError::Serde(_))
        ));
    }

    #[test]
    fn test_validate_border() {
        let good = Level::from_art(&["###", "# #", "###"]).unwrap();
        assert!(utils::validate_border(&good, '#').is_ok());
        let open = Level::from_art(&["# #", "# #", "###"]).unwrap();
        assert!(utils::validate_border(&open, '#').is_err());
        let wide = Level::from_art(&["####", "####"]).unwrap();
        assert!(utils::validate_border(&wide, '#').is_err());
    }
}

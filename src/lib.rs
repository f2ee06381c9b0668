//! # Symbol World
//!
//! A deterministic, turn-stepped tile-world engine for building agent test-beds.
//!
//! ## Architecture Overview
//!
//! The simulated world never scrolls. It renders observations the size of the
//! entire board, and croppers cut bounded views out of them afterwards. The
//! core pieces are:
//!
//! - **Board & Layers**: the composited character grid and per-character masks
//! - **Plot**: the per-episode turn-state channel (reward, discount, termination, log, store)
//! - **Things**: sprites (one reference cell) and drapes (a board-wide curtain),
//!   both with a footprint used for multi-cell collision
//! - **Engine**: runs entities in a declared update schedule and composites in z-order
//! - **Cropping**: fixed and scrolling viewports over observations
//! - **Generation**: rejection-sampled level construction under a safety box
//!
//! ## Quick start
//!
//! ```
//! use symbolworld::games::symbol_world;
//! use symbolworld::{Action, GenerationConfig, LevelGenerator};
//!
//! let level = LevelGenerator::new().generate_level(&GenerationConfig::for_testing(7)).unwrap();
//! let mut engine = symbol_world::make_game(&level, symbol_world::Shapes::original()).unwrap();
//! let start = engine.start().unwrap();
//! assert!(start.reward.is_none());
//! let step = engine.step(Action::Stay).unwrap();
//! assert_eq!(engine.frame(), 1);
//! assert_eq!(step.observation.rows(), level.rows());
//! ```

pub mod game;
pub mod games;
pub mod generation;
pub mod rendering;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use rendering::*;

/// Core error type for the Symbol World engine.
#[derive(thiserror::Error, Debug)]
pub enum SymbolWorldError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Level art or game declaration is malformed
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// The level generator ran out of candidate cells for an object
    #[error("Failed to place {object} after {attempts} attempts")]
    PlacementFailed { object: String, attempts: u32 },

    /// The engine was driven in a way its lifecycle does not allow
    #[error("Illegal engine usage: {0}")]
    IllegalUsage(String),

    /// An entity looked up a character that is not registered
    #[error("No entity registered for character {0:?}")]
    UnknownEntity(char),

    /// An entity looked up a character registered as the other kind
    #[error("Entity {0:?} is not of the requested kind")]
    WrongEntityKind(char),

    /// A crop window could not be produced
    #[error("Crop failed: {0}")]
    CropFailed(String),
}

/// Result type used throughout the Symbol World codebase.
pub type SymbolWorldResult<T> = Result<T, SymbolWorldError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine and generator defaults.
pub mod config {
    /// Default side length of a generated square grid
    pub const GRID_SIZE: u32 = 50;

    /// Default +/- variation of the grid side length
    pub const GRID_SIZE_VAR: u32 = 0;

    /// Default number of goals (and keys) per level
    pub const NUM_GOALS: u32 = 2;

    /// Default +/- variation of the goal count
    pub const NUM_GOALS_VAR: u32 = 0;

    /// Default number of adversaries per level
    pub const NUM_ADVERSARIES: u32 = 1;

    /// Default +/- variation of the adversary count
    pub const NUM_ADVERSARIES_VAR: u32 = 0;

    /// Half-width of the clear square required around every placed object.
    /// Roughly twice the size of a rendered object.
    pub const SAFETY_BOX: u32 = 6;

    /// Candidate cells tried per object before generation fails
    pub const PLACEMENT_ATTEMPTS: u32 = 100;

    /// Reward credited for a key, a goal, or a coin
    pub const PICKUP_REWARD: f64 = 100.0;
}

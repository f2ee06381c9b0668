//! # Rendering Module
//!
//! Everything that happens to an observation after the engine produces it:
//! cutting viewports out of the full board and converting characters to
//! colours.

pub mod cropping;
pub mod rgb;

pub use cropping::*;
pub use rgb::*;

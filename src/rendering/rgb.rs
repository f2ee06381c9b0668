//! # RGB Rendering
//!
//! Converts character observations into colour frames.
//!
//! Scenery cells take their own character's colour. Entities are then painted
//! back-to-front in z-order, and every cell an entity occupies is painted with
//! its whole footprint, so a one-cell sprite with a diamond footprint renders
//! as a diamond.

use crate::game::{Engine, Footprint, Observation, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An 8-bit colour.
pub type Rgb = [u8; 3];

/// Colours per character.
///
/// # Examples
///
/// ```
/// use symbolworld::Palette;
///
/// let palette = Palette::new([0, 0, 0]).with('#', [128, 128, 128]);
/// assert_eq!(palette.color('#'), [128, 128, 128]);
/// assert_eq!(palette.color('?'), [0, 0, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: BTreeMap<char, Rgb>,
    fallback: Rgb,
}

impl Palette {
    /// An empty palette; every character takes `fallback`.
    pub fn new(fallback: Rgb) -> Self {
        Self {
            colors: BTreeMap::new(),
            fallback,
        }
    }

    /// A random colour per character, reproducible from `seed`.
    pub fn random(characters: impl IntoIterator<Item = char>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut palette = Self::new([0, 0, 0]);
        for ch in characters {
            palette.set(ch, rng.gen());
        }
        palette
    }

    pub fn with(mut self, ch: char, color: Rgb) -> Self {
        self.set(ch, color);
        self
    }

    pub fn set(&mut self, ch: char, color: Rgb) {
        self.colors.insert(ch, color);
    }

    pub fn color(&self, ch: char) -> Rgb {
        self.colors.get(&ch).copied().unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Rgb {
        self.fallback
    }
}

/// A row-major colour image, one pixel per board cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    rows: usize,
    cols: usize,
    pixels: Vec<Rgb>,
}

impl RgbFrame {
    pub fn filled(rows: usize, cols: usize, color: Rgb) -> Self {
        Self {
            rows,
            cols,
            pixels: vec![color; rows * cols],
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

    pub fn get(&self, pos: Position) -> Option<Rgb> {
        self.index(pos).map(|index| self.pixels[index])
    }

    /// Paints a pixel; off-frame writes are clipped.
    pub fn paint(&mut self, pos: Position, color: Rgb) {
        if let Some(index) = self.index(pos) {
            self.pixels[index] = color;
        }
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Flattened `rows * cols * 3` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}

/// Paints observations using entity footprints.
#[derive(Debug, Clone)]
pub struct RgbRenderer {
    palette: Palette,
    footprints: BTreeMap<char, Footprint>,
    z_order: Vec<char>,
}

impl RgbRenderer {
    pub fn new(palette: Palette, footprints: BTreeMap<char, Footprint>, z_order: Vec<char>) -> Self {
        Self {
            palette,
            footprints,
            z_order,
        }
    }

    /// Takes footprints and z-order from a built engine.
    pub fn for_engine(engine: &Engine, palette: Palette) -> Self {
        Self::new(palette, engine.footprints(), engine.z_order().to_vec())
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn render(&self, observation: &Observation) -> RgbFrame {
        let mut frame = RgbFrame::filled(observation.rows(), observation.cols(), self.palette.fallback());

        for (pos, ch) in observation.board.iter() {
            if !self.footprints.contains_key(&ch) {
                frame.paint(pos, self.palette.color(ch));
            }
        }

        for &ch in &self.z_order {
            let Some(footprint) = self.footprints.get(&ch) else {
                continue;
            };
            // Sprites hidden under another entity still have a recorded position.
            let anchors = match observation.sprite_position(ch) {
                Some(pos) => vec![pos],
                None => observation
                    .layers
                    .get(ch)
                    .map(|layer| layer.positions())
                    .unwrap_or_default(),
            };
            let color = self.palette.color(ch);
            for anchor in anchors {
                for cell in footprint.translated(anchor) {
                    frame.paint(cell, color);
                }
            }
        }

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Layers};

    fn observation(lines: &[&str], sprites: &[(char, Position)]) -> Observation {
        let board = Board::from_lines(lines).unwrap();
        let characters: Vec<char> = board.iter().map(|(_, ch)| ch).collect();
        let layers = Layers::compute(&board, characters);
        Observation::new(board, layers, sprites.iter().copied().collect())
    }

    const WALL: Rgb = [100, 100, 100];
    const FLOOR: Rgb = [0, 0, 0];
    const PLAYER: Rgb = [0, 255, 0];
    const GOAL: Rgb = [255, 0, 0];

    fn palette() -> Palette {
        Palette::new([1, 2, 3])
            .with('#', WALL)
            .with(' ', FLOOR)
            .with('P', PLAYER)
            .with('@', GOAL)
    }

    #[test]
    fn test_footprints_are_painted_around_anchor() {
        let obs = observation(&["#####", "#   #", "# P #", "#   #", "#####"], &[('P', Position::new(2, 2))]);
        let footprints = [('P', Footprint::diamond(1).with_center())].into_iter().collect();
        let renderer = RgbRenderer::new(palette(), footprints, vec!['P']);
        let frame = renderer.render(&obs);

        assert_eq!(frame.get(Position::new(2, 2)), Some(PLAYER));
        assert_eq!(frame.get(Position::new(1, 2)), Some(PLAYER));
        assert_eq!(frame.get(Position::new(2, 3)), Some(PLAYER));
        assert_eq!(frame.get(Position::new(1, 1)), Some(FLOOR));
        assert_eq!(frame.get(Position::new(0, 0)), Some(WALL));
        assert_eq!(frame.to_bytes().len(), 5 * 5 * 3);
    }

    #[test]
    fn test_z_order_paints_back_to_front() {
        let obs = observation(&["P@"], &[('P', Position::new(0, 0))]);
        let footprints: BTreeMap<char, Footprint> = [
            ('P', Footprint::from_offsets([(0, 0), (0, 1)])),
            ('@', Footprint::single()),
        ]
        .into_iter()
        .collect();

        let goal_on_top = RgbRenderer::new(palette(), footprints.clone(), vec!['P', '@']).render(&obs);
        assert_eq!(goal_on_top.get(Position::new(0, 1)), Some(GOAL));

        let player_on_top = RgbRenderer::new(palette(), footprints, vec!['@', 'P']).render(&obs);
        assert_eq!(player_on_top.get(Position::new(0, 1)), Some(PLAYER));
    }

    #[test]
    fn test_footprints_clip_at_frame_edge() {
        let obs = observation(&["P "], &[('P', Position::new(0, 0))]);
        let footprints = [('P', Footprint::square_outline(1).with_center())].into_iter().collect();
        let frame = RgbRenderer::new(palette(), footprints, vec!['P']).render(&obs);
        assert_eq!(frame.pixels(), &[PLAYER, PLAYER]);
    }

    #[test]
    fn test_random_palette_is_seeded() {
        let a = Palette::random("#P@".chars(), 3);
        let b = Palette::random("#P@".chars(), 3);
        assert_eq!(a, b);
    }
}

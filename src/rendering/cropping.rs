//! # Cropping
//!
//! Viewports over full-board observations.
//!
//! The engine always renders the whole board. A cropper cuts a fixed-size
//! window out of each observation, either at a fixed place or following a
//! sprite around, so the world appears to scroll without the simulation
//! knowing about it. Several croppers can watch one engine at once; each keeps
//! its own window state.

use crate::game::{Engine, Layers, Observation, Position};
use crate::{SymbolWorldError, SymbolWorldResult};
use std::collections::BTreeMap;

/// A transform from full observations to bounded ones.
pub trait ObservationCropper: std::fmt::Debug {
    /// Binds the cropper to a freshly started episode. Must be called before `crop`.
    fn set_engine(&mut self, engine: &Engine) -> SymbolWorldResult<()>;

    /// Cuts this tick's window out of `observation`.
    fn crop(&mut self, observation: &Observation) -> SymbolWorldResult<Observation>;

    /// Window height.
    fn rows(&self) -> usize;

    /// Window width.
    fn cols(&self) -> usize;
}

/// Copies a window out of an observation.
///
/// Cells past the board edge take `pad`; layers are rebuilt for the window and
/// sprite positions are shifted into window coordinates (sprites outside the
/// window are dropped).
pub fn crop_window(
    observation: &Observation,
    top_left: Position,
    rows: usize,
    cols: usize,
    pad: Option<char>,
) -> SymbolWorldResult<Observation> {
    let board = observation
        .board
        .window(top_left, rows, cols, pad)
        .ok_or_else(|| {
            SymbolWorldError::CropFailed(format!(
                "{}x{} window at {:?} leaves the {}x{} board and no pad character is set",
                rows,
                cols,
                top_left,
                observation.rows(),
                observation.cols()
            ))
        })?;

    let characters: Vec<char> = observation.layers.characters().chain(pad).collect();
    let layers = Layers::compute(&board, characters);

    let sprites: BTreeMap<char, Position> = observation
        .sprites
        .iter()
        .map(|(&ch, &pos)| (ch, pos - top_left))
        .filter(|(_, pos)| board.contains(*pos))
        .collect();

    Ok(Observation::new(board, layers, sprites))
}

fn check_window(rows: usize, cols: usize) -> SymbolWorldResult<()> {
    if rows == 0 || cols == 0 {
        return Err(SymbolWorldError::InvalidConfig(format!(
            "crop window must be positive, got {}x{}",
            rows, cols
        )));
    }
    Ok(())
}

/// Always crops the same absolute window.
///
/// # Examples
///
/// ```
/// use symbolworld::{crop_window, Board, FixedCropper, Layers, Observation, Position};
/// use std::collections::BTreeMap;
///
/// let cropper = FixedCropper::new(Position::new(-1, -1), 3, 3, Some('.')).unwrap();
/// assert_eq!(cropper.top_left(), Position::new(-1, -1));
///
/// let board = Board::from_lines(&["ab", "cd"]).unwrap();
/// let layers = Layers::compute(&board, ['a', 'b', 'c', 'd']);
/// let observation = Observation::new(board, layers, BTreeMap::new());
/// let window = crop_window(&observation, cropper.top_left(), 3, 3, Some('.')).unwrap();
/// assert_eq!(window.to_lines(), vec!["...", ".ab", ".cd"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedCropper {
    top_left: Position,
    rows: usize,
    cols: usize,
    pad_char: Option<char>,
    bound: bool,
}

impl FixedCropper {
    pub fn new(top_left: Position, rows: usize, cols: usize, pad_char: Option<char>) -> SymbolWorldResult<Self> {
        check_window(rows, cols)?;
        Ok(Self {
            top_left,
            rows,
            cols,
            pad_char,
            bound: false,
        })
    }

    pub fn top_left(&self) -> Position {
        self.top_left
    }

    pub fn pad_char(&self) -> Option<char> {
        self.pad_char
    }
}

impl ObservationCropper for FixedCropper {
    fn set_engine(&mut self, engine: &Engine) -> SymbolWorldResult<()> {
        if self.pad_char.is_none() {
            let bottom_right = self.top_left + Position::new(self.rows as i32 - 1, self.cols as i32 - 1);
            if !engine.board().contains(self.top_left) || !engine.board().contains(bottom_right) {
                return Err(SymbolWorldError::CropFailed(format!(
                    "fixed window at {:?} leaves the {}x{} board and no pad character is set",
                    self.top_left,
                    engine.rows(),
                    engine.cols()
                )));
            }
        }
        self.bound = true;
        Ok(())
    }

    fn crop(&mut self, observation: &Observation) -> SymbolWorldResult<Observation> {
        if !self.bound {
            return Err(SymbolWorldError::IllegalUsage(
                "crop called before set_engine".to_string(),
            ));
        }
        crop_window(observation, self.top_left, self.rows, self.cols, self.pad_char)
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }
}

/// A window that follows a sprite.
///
/// The window only scrolls when the tracked sprite leaves the band between
/// the scroll margins, and then only as far as needed to bring it back in.
/// Without a pad character the window stays on the board; with one it may
/// hang past the edge by up to half its size.
#[derive(Debug, Clone)]
pub struct ScrollingCropper {
    rows: usize,
    cols: usize,
    to_track: Vec<char>,
    pad_char: Option<char>,
    margins: Position,
    initial_offset: Position,
    saccade: bool,
    board_size: Option<Position>,
    corner: Option<Position>,
}

impl ScrollingCropper {
    /// Follows the first visible sprite among `to_track`, keeping it centred.
    ///
    /// The centre cell on each axis is `(size - 1) / 2`, which is also the
    /// default scroll margin. In an even-sized window the sprite therefore
    /// sits just above and left of the middle.
    pub fn new(rows: usize, cols: usize, to_track: &str) -> SymbolWorldResult<Self> {
        check_window(rows, cols)?;
        if to_track.is_empty() {
            return Err(SymbolWorldError::InvalidConfig(
                "a scrolling cropper needs at least one character to track".to_string(),
            ));
        }
        Ok(Self {
            rows,
            cols,
            to_track: to_track.chars().collect(),
            pad_char: None,
            margins: Position::new(Self::centre(rows), Self::centre(cols)),
            initial_offset: Position::origin(),
            saccade: true,
            board_size: None,
            corner: None,
        })
    }

    fn centre(size: usize) -> i32 {
        (size as i32 - 1) / 2
    }

    pub fn with_pad_char(mut self, pad_char: char) -> Self {
        self.pad_char = Some(pad_char);
        self
    }

    /// Minimum distance kept between the tracked sprite and the window edges.
    /// None on an axis keeps the sprite centred on it.
    pub fn with_scroll_margins(mut self, rows: Option<usize>, cols: Option<usize>) -> SymbolWorldResult<Self> {
        let row_margin = rows.map(|m| m as i32).unwrap_or(Self::centre(self.rows));
        let col_margin = cols.map(|m| m as i32).unwrap_or(Self::centre(self.cols));
        if row_margin > Self::centre(self.rows) || col_margin > Self::centre(self.cols) {
            return Err(SymbolWorldError::InvalidConfig(format!(
                "scroll margins ({}, {}) leave no room in a {}x{} window",
                row_margin, col_margin, self.rows, self.cols
            )));
        }
        self.margins = Position::new(row_margin, col_margin);
        Ok(self)
    }

    /// Places the sprite this many rows and columns away from the centre in
    /// the first window, before clamping.
    pub fn with_initial_offset(mut self, offset: Position) -> Self {
        self.initial_offset = offset;
        self
    }

    /// Whether to recentre, rather than scroll, when the sprite jumps more
    /// than one cell past a margin.
    pub fn with_saccade(mut self, saccade: bool) -> Self {
        self.saccade = saccade;
        self
    }

    pub fn margins(&self) -> Position {
        self.margins
    }

    /// Top-left corner of the most recent window.
    pub fn corner(&self) -> Option<Position> {
        self.corner
    }

    fn centred_on(&self, pos: Position) -> Position {
        pos - Position::new(Self::centre(self.rows), Self::centre(self.cols))
    }

    fn scroll_axis(corner: i32, pos: i32, size: usize, margin: i32) -> i32 {
        let relative = pos - corner;
        let low = margin;
        let high = size as i32 - 1 - margin;
        if relative < low {
            corner - (low - relative)
        } else if relative > high {
            corner + (relative - high)
        } else {
            corner
        }
    }

    fn scroll(&self, corner: Position, pos: Position) -> Position {
        let scrolled = Position::new(
            Self::scroll_axis(corner.row, pos.row, self.rows, self.margins.row),
            Self::scroll_axis(corner.col, pos.col, self.cols, self.margins.col),
        );
        let shift = scrolled - corner;
        if self.saccade && (shift.row.abs() > 1 || shift.col.abs() > 1) {
            self.centred_on(pos)
        } else {
            scrolled
        }
    }

    fn clamp_axis(corner: i32, board: i32, size: usize, padded: bool) -> i32 {
        if padded {
            let overhang = Self::centre(size);
            corner.clamp(-overhang, board - 1 - overhang)
        } else {
            corner.clamp(0, (board - size as i32).max(0))
        }
    }

    fn clamp(&self, corner: Position, board: Position) -> Position {
        let padded = self.pad_char.is_some();
        Position::new(
            Self::clamp_axis(corner.row, board.row, self.rows, padded),
            Self::clamp_axis(corner.col, board.col, self.cols, padded),
        )
    }
}

impl ObservationCropper for ScrollingCropper {
    fn set_engine(&mut self, engine: &Engine) -> SymbolWorldResult<()> {
        if self.pad_char.is_none() && (engine.rows() < self.rows || engine.cols() < self.cols) {
            return Err(SymbolWorldError::CropFailed(format!(
                "{}x{} window does not fit the {}x{} board and no pad character is set",
                self.rows,
                self.cols,
                engine.rows(),
                engine.cols()
            )));
        }
        self.board_size = Some(Position::new(engine.rows() as i32, engine.cols() as i32));
        self.corner = None;
        Ok(())
    }

    fn crop(&mut self, observation: &Observation) -> SymbolWorldResult<Observation> {
        let board = self.board_size.ok_or_else(|| {
            SymbolWorldError::IllegalUsage("crop called before set_engine".to_string())
        })?;

        let tracked = self
            .to_track
            .iter()
            .find_map(|&ch| observation.sprite_position(ch));

        let corner = match (self.corner, tracked) {
            (None, Some(pos)) => self.centred_on(pos) - self.initial_offset,
            (None, None) => Position::origin(),
            (Some(corner), Some(pos)) => self.scroll(corner, pos),
            (Some(corner), None) => corner,
        };
        let corner = self.clamp(corner, board);
        self.corner = Some(corner);

        crop_window(observation, corner, self.rows, self.cols, self.pad_char)
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }
}

/// Several croppers evaluated independently over the same observation.
#[derive(Debug, Default)]
pub struct Viewports {
    croppers: Vec<Box<dyn ObservationCropper>>,
}

impl Viewports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cropper: impl ObservationCropper + 'static) {
        self.croppers.push(Box::new(cropper));
    }

    pub fn len(&self) -> usize {
        self.croppers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.croppers.is_empty()
    }

    /// Binds every cropper to `engine`.
    pub fn set_engine(&mut self, engine: &Engine) -> SymbolWorldResult<()> {
        for cropper in &mut self.croppers {
            cropper.set_engine(engine)?;
        }
        Ok(())
    }

    /// One window per cropper, in insertion order.
    pub fn crop_all(&mut self, observation: &Observation) -> SymbolWorldResult<Vec<Observation>> {
        self.croppers
            .iter_mut()
            .map(|cropper| cropper.crop(observation))
            .collect()
    }
}

impl From<Vec<Box<dyn ObservationCropper>>> for Viewports {
    fn from(croppers: Vec<Box<dyn ObservationCropper>>) -> Self {
        Self { croppers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Action, EngineBuilder, Level, SpriteDef, SpriteLogic, SpriteState, UpdateContext};

    /// Moves as told, with no walls.
    #[derive(Debug)]
    struct Walker;

    impl SpriteLogic for Walker {
        fn update(&mut self, sprite: &mut SpriteState, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()> {
            if let Some(direction) = ctx.action.and_then(Action::direction) {
                sprite.step(direction, ctx.board);
            }
            Ok(())
        }
    }

    fn open_field(rows: usize, cols: usize, player: Position) -> Engine {
        let mut lines = vec![".".repeat(cols); rows];
        let row = &mut lines[player.row as usize];
        row.replace_range(player.col as usize..player.col as usize + 1, "P");
        let level = Level::new(lines).unwrap();
        EngineBuilder::new(level, '.')
            .sprite('P', SpriteDef::new(Walker))
            .build()
            .unwrap()
    }

    #[test]
    fn test_fixed_cropper_pads_outside_board() {
        let mut engine = open_field(4, 4, Position::new(0, 0));
        let observation = engine.start().unwrap().observation;

        let mut cropper = FixedCropper::new(Position::new(2, 2), 4, 4, Some(' ')).unwrap();
        assert!(cropper.crop(&observation).is_err());
        cropper.set_engine(&engine).unwrap();
        let window = cropper.crop(&observation).unwrap();
        assert_eq!(window.to_lines(), vec!["..  ", "..  ", "    ", "    "]);
        assert!(window.layers.is_at(' ', Position::new(3, 3)));
        assert_eq!(window.sprite_position('P'), None);
    }

    #[test]
    fn test_fixed_cropper_without_pad_must_fit() {
        let engine = open_field(4, 4, Position::new(0, 0));
        let mut cropper = FixedCropper::new(Position::new(1, 1), 4, 4, None).unwrap();
        assert!(matches!(
            cropper.set_engine(&engine),
            Err(SymbolWorldError::CropFailed(_))
        ));
        assert!(FixedCropper::new(Position::origin(), 0, 3, None).is_err());
    }

    #[test]
    fn test_scrolling_cropper_centres_then_dead_bands() {
        let mut engine = open_field(21, 21, Position::new(10, 10));
        let observation = engine.start().unwrap().observation;
        let mut cropper = ScrollingCropper::new(5, 5, "P")
            .unwrap()
            .with_scroll_margins(Some(1), Some(1))
            .unwrap();
        cropper.set_engine(&engine).unwrap();

        let window = cropper.crop(&observation).unwrap();
        assert_eq!(cropper.corner(), Some(Position::new(8, 8)));
        assert_eq!(window.sprite_position('P'), Some(Position::new(2, 2)));

        // One step right stays inside the margins: no scroll.
        let observation = engine.step(Action::Right).unwrap().observation;
        cropper.crop(&observation).unwrap();
        assert_eq!(cropper.corner(), Some(Position::new(8, 8)));

        // The next step crosses the margin: scroll by exactly one column.
        let observation = engine.step(Action::Right).unwrap().observation;
        let window = cropper.crop(&observation).unwrap();
        assert_eq!(cropper.corner(), Some(Position::new(8, 9)));
        assert_eq!(window.sprite_position('P'), Some(Position::new(2, 3)));
    }

    #[test]
    fn test_scrolling_cropper_clamps_without_pad() {
        let mut engine = open_field(10, 10, Position::new(1, 1));
        let observation = engine.start().unwrap().observation;
        let mut cropper = ScrollingCropper::new(5, 5, "P").unwrap();
        cropper.set_engine(&engine).unwrap();
        let window = cropper.crop(&observation).unwrap();
        assert_eq!(cropper.corner(), Some(Position::new(0, 0)));
        assert_eq!(window.sprite_position('P'), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_scrolling_cropper_overhangs_with_pad() {
        let mut engine = open_field(10, 10, Position::new(0, 0));
        let observation = engine.start().unwrap().observation;
        let mut cropper = ScrollingCropper::new(5, 5, "P").unwrap().with_pad_char('~');
        cropper.set_engine(&engine).unwrap();
        let window = cropper.crop(&observation).unwrap();
        assert_eq!(cropper.corner(), Some(Position::new(-2, -2)));
        assert_eq!(window.to_lines()[0], "~~~~~");
        assert_eq!(window.to_lines()[2], "~~P..");
    }

    #[test]
    fn test_initial_offset_shifts_first_window() {
        let mut engine = open_field(21, 21, Position::new(10, 10));
        let observation = engine.start().unwrap().observation;
        let mut cropper = ScrollingCropper::new(5, 5, "P")
            .unwrap()
            .with_scroll_margins(Some(0), Some(0))
            .unwrap()
            .with_initial_offset(Position::new(-1, -2));
        cropper.set_engine(&engine).unwrap();
        let window = cropper.crop(&observation).unwrap();
        assert_eq!(cropper.corner(), Some(Position::new(9, 10)));
        // Centre (2, 2) moved by the offset.
        assert_eq!(window.sprite_position('P'), Some(Position::new(1, 0)));
    }

    #[test]
    fn test_set_engine_resets_window() {
        let mut engine = open_field(21, 21, Position::new(10, 10));
        let observation = engine.start().unwrap().observation;
        let mut cropper = ScrollingCropper::new(5, 5, "P").unwrap();
        cropper.set_engine(&engine).unwrap();
        cropper.crop(&observation).unwrap();
        assert!(cropper.corner().is_some());
        cropper.set_engine(&engine).unwrap();
        assert_eq!(cropper.corner(), None);
    }

    #[test]
    fn test_margin_validation() {
        assert!(ScrollingCropper::new(5, 5, "P")
            .unwrap()
            .with_scroll_margins(Some(3), None)
            .is_err());
        assert!(ScrollingCropper::new(5, 5, "").is_err());
    }

    #[test]
    fn test_viewports_are_independent() {
        let mut engine = open_field(21, 21, Position::new(10, 10));
        let observation = engine.start().unwrap().observation;
        let mut viewports = Viewports::new();
        viewports.push(ScrollingCropper::new(3, 3, "P").unwrap());
        viewports.push(FixedCropper::new(Position::origin(), 2, 6, None).unwrap());
        viewports.set_engine(&engine).unwrap();

        let windows = viewports.crop_all(&observation).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].rows(), windows[0].cols()), (3, 3));
        assert_eq!((windows[1].rows(), windows[1].cols()), (2, 6));
        assert_eq!(windows[0].sprite_position('P'), Some(Position::new(1, 1)));
    }
}

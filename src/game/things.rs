//! # Things
//!
//! The entity model: sprites, drapes, and the footprint geometry they share.
//!
//! A sprite owns one reference cell and moves by replacing it. A drape owns a
//! boolean curtain over the whole board and stands for many same-character
//! cells at once. Both carry a static [`Footprint`]: the offsets they cover
//! around each reference cell, used for rendering and for collision.
//!
//! Behaviour is kept apart from geometry. The engine owns a [`SpriteState`] or
//! [`DrapeState`] for each entity and hands it, mutably, to the entity's
//! [`SpriteLogic`] or [`DrapeLogic`] once per tick.

use crate::game::{Action, Backdrop, Board, Direction, Layer, Layers, Plot, Position};
use crate::{SymbolWorldError, SymbolWorldResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Set of cell offsets an entity covers around a reference cell.
///
/// # Examples
///
/// ```
/// use symbolworld::{Footprint, Position};
///
/// let diamond = Footprint::filled_diamond(2);
/// assert_eq!(diamond.len(), 13);
///
/// let a = Footprint::single();
/// assert!(diamond.overlaps(Position::new(5, 5), &a, Position::new(5, 7)));
/// assert!(!diamond.overlaps(Position::new(5, 5), &a, Position::new(6, 7)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    offsets: Vec<Position>,
}

impl Footprint {
    /// Builds a footprint from `(row, col)` offsets. Duplicates collapse.
    pub fn from_offsets<I>(offsets: I) -> Self
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let offsets: BTreeSet<Position> = offsets.into_iter().map(Position::from).collect();
        Self {
            offsets: offsets.into_iter().collect(),
        }
    }

    /// Just the reference cell.
    pub fn single() -> Self {
        Self::from_offsets([(0, 0)])
    }

    /// Cells at exactly Manhattan distance `radius`.
    pub fn diamond(radius: i32) -> Self {
        Self::from_offsets(Self::square_offsets(radius).filter(|&(r, c)| r.abs() + c.abs() == radius))
    }

    /// Cells within Manhattan distance `radius`.
    pub fn filled_diamond(radius: i32) -> Self {
        Self::from_offsets(Self::square_offsets(radius).filter(|&(r, c)| r.abs() + c.abs() <= radius))
    }

    /// The border of the `(2 * radius + 1)` square.
    pub fn square_outline(radius: i32) -> Self {
        Self::from_offsets(Self::square_offsets(radius).filter(|&(r, c)| r.abs().max(c.abs()) == radius))
    }

    fn square_offsets(radius: i32) -> impl Iterator<Item = (i32, i32)> {
        (-radius..=radius).flat_map(move |r| (-radius..=radius).map(move |c| (r, c)))
    }

    /// Adds the reference cell if missing.
    pub fn with_center(mut self) -> Self {
        if let Err(index) = self.offsets.binary_search(&Position::origin()) {
            self.offsets.insert(index, Position::origin());
        }
        self
    }

    /// Offsets in sorted order.
    pub fn offsets(&self) -> &[Position] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Absolute cells covered when the reference cell is at `anchor`.
    pub fn translated(&self, anchor: Position) -> impl Iterator<Item = Position> + '_ {
        self.offsets.iter().map(move |&offset| anchor + offset)
    }

    /// Whether this footprint at `anchor` shares a cell with `other` at `other_anchor`.
    pub fn overlaps(&self, anchor: Position, other: &Footprint, other_anchor: Position) -> bool {
        // Shifting one footprint by the anchor difference keeps this a pure offset test.
        let shift = other_anchor - anchor;
        other
            .offsets
            .iter()
            .any(|&offset| self.offsets.binary_search(&(offset + shift)).is_ok())
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::single()
    }
}

/// Anything that occupies board cells through a footprint and can collide.
pub trait Occupant {
    /// Character the entity is drawn with.
    fn character(&self) -> char;

    /// Static footprint.
    fn footprint(&self) -> &Footprint;

    /// Reference cells the footprint is translated to.
    fn anchors(&self) -> Vec<Position>;

    /// Every cell the entity covers this tick.
    fn occupied_cells(&self) -> BTreeSet<Position> {
        let footprint = self.footprint();
        self.anchors()
            .into_iter()
            .flat_map(|anchor| footprint.translated(anchor).collect::<Vec<_>>())
            .collect()
    }

    /// Whether the translated footprints of `self` and `other` share a cell.
    fn is_colliding(&self, other: &dyn Occupant) -> bool {
        let mine = self.occupied_cells();
        if mine.is_empty() {
            return false;
        }
        let footprint = other.footprint();
        other
            .anchors()
            .into_iter()
            .any(|anchor| footprint.translated(anchor).any(|cell| mine.contains(&cell)))
    }
}

/// Geometry and movement state of a sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteState {
    character: char,
    corner: Position,
    position: Position,
    footprint: Footprint,
    impassable: BTreeSet<char>,
    visible: bool,
}

impl SpriteState {
    /// Creates a visible sprite at `position` on a board whose size is `corner`.
    pub fn new(
        character: char,
        corner: Position,
        position: Position,
        footprint: Footprint,
        impassable: BTreeSet<char>,
    ) -> Self {
        Self {
            character,
            corner,
            position,
            footprint,
            impassable,
            visible: true,
        }
    }

    /// Reference cell.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Board extent as (rows, cols).
    pub fn corner(&self) -> Position {
        self.corner
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Characters this sprite cannot step onto.
    pub fn impassable(&self) -> &BTreeSet<char> {
        &self.impassable
    }

    fn on_board(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && pos.row < self.corner.row && pos.col < self.corner.col
    }

    /// Steps one cell in `direction`.
    ///
    /// Only the destination reference cell is checked; the footprint may
    /// overlap walls at its edges. A blocked or off-board move leaves the
    /// sprite where it is and returns false.
    pub fn step(&mut self, direction: Direction, board: &Board) -> bool {
        let destination = self.position + direction.to_delta();
        if !self.on_board(destination) {
            return false;
        }
        match board.get(destination) {
            Some(ch) if self.impassable.contains(&ch) => false,
            Some(_) => {
                self.position = destination;
                true
            }
            None => false,
        }
    }
}

impl Occupant for SpriteState {
    fn character(&self) -> char {
        self.character
    }

    fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    fn anchors(&self) -> Vec<Position> {
        vec![self.position]
    }
}

/// Geometry state of a drape: its curtain and footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrapeState {
    character: char,
    curtain: Layer,
    footprint: Footprint,
}

impl DrapeState {
    pub fn new(character: char, curtain: Layer, footprint: Footprint) -> Self {
        Self {
            character,
            curtain,
            footprint,
        }
    }

    pub fn curtain(&self) -> &Layer {
        &self.curtain
    }

    pub fn curtain_mut(&mut self) -> &mut Layer {
        &mut self.curtain
    }

    /// Whether the footprint placed at one curtain cell touches `other`.
    pub fn is_colliding_at(&self, cell: Position, other: &dyn Occupant) -> bool {
        let footprint = other.footprint();
        other
            .anchors()
            .into_iter()
            .any(|anchor| self.footprint.overlaps(cell, footprint, anchor))
    }

    /// First curtain cell, in row-major order, whose footprint touches `other`.
    pub fn colliding_cell(&self, other: &dyn Occupant) -> Option<Position> {
        self.curtain
            .positions()
            .into_iter()
            .find(|&cell| self.is_colliding_at(cell, other))
    }
}

impl Occupant for DrapeState {
    fn character(&self) -> char {
        self.character
    }

    fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    fn anchors(&self) -> Vec<Position> {
        self.curtain.positions()
    }
}

/// Everything an entity may read or touch during its update.
pub struct UpdateContext<'a> {
    /// The action for this tick; None during the opening update in `start`.
    pub action: Option<Action>,
    /// Board composited at the end of the previous tick.
    pub board: &'a Board,
    /// Layers matching `board`.
    pub layers: &'a Layers,
    pub backdrop: &'a Backdrop,
    /// Every other entity, as it stands right now.
    pub things: Things<'a>,
    pub plot: &'a mut Plot,
}

/// Per-tick behaviour of a sprite.
pub trait SpriteLogic: fmt::Debug {
    fn update(&mut self, sprite: &mut SpriteState, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()>;
}

/// Per-tick behaviour of a drape.
pub trait DrapeLogic: fmt::Debug {
    fn update(&mut self, drape: &mut DrapeState, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()>;
}

#[derive(Debug)]
pub struct Sprite {
    pub state: SpriteState,
    pub logic: Box<dyn SpriteLogic>,
}

#[derive(Debug)]
pub struct Drape {
    pub state: DrapeState,
    pub logic: Box<dyn DrapeLogic>,
}

/// An entity registered with the engine.
#[derive(Debug)]
pub enum Entity {
    Sprite(Sprite),
    Drape(Drape),
}

impl Entity {
    pub fn as_sprite(&self) -> Option<&SpriteState> {
        match self {
            Entity::Sprite(sprite) => Some(&sprite.state),
            Entity::Drape(_) => None,
        }
    }

    pub fn as_drape(&self) -> Option<&DrapeState> {
        match self {
            Entity::Drape(drape) => Some(&drape.state),
            Entity::Sprite(_) => None,
        }
    }

    /// Geometry view used for collision tests.
    pub fn occupant(&self) -> &dyn Occupant {
        match self {
            Entity::Sprite(sprite) => &sprite.state,
            Entity::Drape(drape) => &drape.state,
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()> {
        match self {
            Entity::Sprite(sprite) => sprite.logic.update(&mut sprite.state, ctx),
            Entity::Drape(drape) => drape.logic.update(&mut drape.state, ctx),
        }
    }
}

impl Occupant for Entity {
    fn character(&self) -> char {
        self.occupant().character()
    }

    fn footprint(&self) -> &Footprint {
        self.occupant().footprint()
    }

    fn anchors(&self) -> Vec<Position> {
        self.occupant().anchors()
    }
}

/// Read-only lookup of entities by character during a tick.
///
/// The entity currently updating is checked out of the engine, so it cannot
/// see itself here.
#[derive(Clone, Copy)]
pub struct Things<'a> {
    slots: &'a [Option<Entity>],
    index: &'a BTreeMap<char, usize>,
}

impl<'a> Things<'a> {
    pub(crate) fn new(slots: &'a [Option<Entity>], index: &'a BTreeMap<char, usize>) -> Self {
        Self { slots, index }
    }

    /// The entity drawn with `ch`.
    pub fn get(&self, ch: char) -> SymbolWorldResult<&'a Entity> {
        let slot = self
            .index
            .get(&ch)
            .ok_or(SymbolWorldError::UnknownEntity(ch))?;
        self.slots[*slot].as_ref().ok_or_else(|| {
            SymbolWorldError::IllegalUsage(format!(
                "entity {:?} looked itself up during its own update",
                ch
            ))
        })
    }

    /// The sprite drawn with `ch`.
    pub fn sprite(&self, ch: char) -> SymbolWorldResult<&'a SpriteState> {
        self.get(ch)?
            .as_sprite()
            .ok_or(SymbolWorldError::WrongEntityKind(ch))
    }

    /// The drape drawn with `ch`.
    pub fn drape(&self, ch: char) -> SymbolWorldResult<&'a DrapeState> {
        self.get(ch)?
            .as_drape()
            .ok_or(SymbolWorldError::WrongEntityKind(ch))
    }

    /// Every registered entity character, including the one updating.
    pub fn characters(&self) -> impl Iterator<Item = char> + 'a {
        self.index.keys().copied()
    }
}

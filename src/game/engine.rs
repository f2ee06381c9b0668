//! # Engine
//!
//! Builds a game from level art and steps it one tick at a time.
//!
//! A tick advances the plot's frame, runs every entity once in the declared
//! update schedule, then composites the board back-to-front in z-order over
//! the backdrop. Entities see the board as it was composited at the end of the
//! previous tick, but they see each other's state live.

use crate::game::{
    Action, Backdrop, Board, Drape, DrapeLogic, DrapeState, Entity, Footprint, Layer, Layers,
    Level, Observation, Occupant, Plot, Position, Sprite, SpriteLogic, SpriteState, Things,
    UpdateContext,
};
use crate::{SymbolWorldError, SymbolWorldResult};
use std::collections::{BTreeMap, BTreeSet};

/// Result of `start` or `step`.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestep {
    pub observation: Observation,
    /// Reward credited during this tick; None when nothing was credited.
    pub reward: Option<f64>,
    /// None for the opening timestep, then the plot's discount.
    pub discount: Option<f64>,
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Built, waiting for `start`.
    Ready,
    Running,
    GameOver,
    /// An entity update failed; the engine must be discarded.
    Poisoned,
}

/// Orchestrates one episode.
#[derive(Debug)]
pub struct Engine {
    backdrop: Backdrop,
    board: Board,
    layers: Layers,
    characters: BTreeSet<char>,
    slots: Vec<Option<Entity>>,
    index: BTreeMap<char, usize>,
    update_schedule: Vec<char>,
    z_order: Vec<char>,
    plot: Plot,
    status: EngineStatus,
}

impl Engine {
    /// Runs the opening update (with no action) and returns the first observation.
    ///
    /// The opening timestep never carries reward or discount; anything the
    /// opening update credits is dropped.
    pub fn start(&mut self) -> SymbolWorldResult<Timestep> {
        if self.status != EngineStatus::Ready {
            return Err(SymbolWorldError::IllegalUsage(format!(
                "start called on an engine that is {:?}",
                self.status
            )));
        }

        self.run_updates(None)?;
        self.plot.begin_episode();
        self.composite();
        self.status = if self.plot.game_over() {
            EngineStatus::GameOver
        } else {
            EngineStatus::Running
        };
        log::debug!(
            "episode started on a {}x{} board with {} entities",
            self.rows(),
            self.cols(),
            self.slots.len()
        );

        Ok(Timestep {
            observation: self.observation(),
            reward: None,
            discount: None,
        })
    }

    /// Advances the game by one tick.
    ///
    /// # Errors
    ///
    /// `IllegalUsage` before `start`, after the game is over, or after a
    /// failed tick. An error raised by an entity is returned as-is and leaves
    /// the engine poisoned.
    pub fn step(&mut self, action: Action) -> SymbolWorldResult<Timestep> {
        match self.status {
            EngineStatus::Running => {}
            EngineStatus::Ready => {
                return Err(SymbolWorldError::IllegalUsage(
                    "step called before start".to_string(),
                ))
            }
            EngineStatus::GameOver => {
                return Err(SymbolWorldError::IllegalUsage(
                    "step called after the game ended".to_string(),
                ))
            }
            EngineStatus::Poisoned => {
                return Err(SymbolWorldError::IllegalUsage(
                    "step called on an engine whose previous tick failed".to_string(),
                ))
            }
        }

        self.plot.begin_tick();
        self.run_updates(Some(action))?;
        self.composite();

        if self.plot.game_over() {
            self.status = EngineStatus::GameOver;
            log::info!(
                "episode over at frame {} with return {}",
                self.plot.frame(),
                self.plot.episode_return()
            );
        }

        Ok(Timestep {
            observation: self.observation(),
            reward: self.plot.reward(),
            discount: Some(self.plot.discount()),
        })
    }

    fn run_updates(&mut self, action: Option<Action>) -> SymbolWorldResult<()> {
        let schedule = self.update_schedule.clone();
        for ch in schedule {
            let slot = self.index[&ch];
            let mut entity = match self.slots[slot].take() {
                Some(entity) => entity,
                None => {
                    self.status = EngineStatus::Poisoned;
                    return Err(SymbolWorldError::IllegalUsage(format!(
                        "entity {:?} is missing from its slot",
                        ch
                    )));
                }
            };

            let result = {
                let mut ctx = UpdateContext {
                    action,
                    board: &self.board,
                    layers: &self.layers,
                    backdrop: &self.backdrop,
                    things: Things::new(&self.slots, &self.index),
                    plot: &mut self.plot,
                };
                entity.update(&mut ctx)
            };
            self.slots[slot] = Some(entity);

            if let Err(e) = result {
                log::warn!("update of {:?} failed at frame {}: {}", ch, self.plot.frame(), e);
                self.status = EngineStatus::Poisoned;
                return Err(e);
            }
        }
        Ok(())
    }

    fn composite(&mut self) {
        let mut board = self.backdrop.curtain().clone();
        for ch in &self.z_order {
            match self.slots[self.index[ch]].as_ref() {
                Some(Entity::Drape(drape)) => {
                    for pos in drape.state.curtain().positions() {
                        board.set(pos, *ch);
                    }
                }
                Some(Entity::Sprite(sprite)) if sprite.state.visible() => {
                    board.set(sprite.state.position(), *ch);
                }
                _ => {}
            }
        }
        self.layers = Layers::compute(&board, self.characters.iter().copied());
        self.board = board;
    }

    /// Snapshot of the current board.
    pub fn observation(&self) -> Observation {
        let sprites = self
            .slots
            .iter()
            .flatten()
            .filter_map(|entity| match entity {
                Entity::Sprite(sprite) if sprite.state.visible() => {
                    Some((sprite.state.character(), sprite.state.position()))
                }
                _ => None,
            })
            .collect();
        Observation::new(self.board.clone(), self.layers.clone(), sprites)
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn game_over(&self) -> bool {
        self.status == EngineStatus::GameOver
    }

    /// Number of completed steps.
    pub fn frame(&self) -> u64 {
        self.plot.frame()
    }

    pub fn plot(&self) -> &Plot {
        &self.plot
    }

    /// Takes the log messages entities wrote since the last drain.
    pub fn drain_log(&mut self) -> Vec<String> {
        self.plot.drain_log()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    pub fn backdrop(&self) -> &Backdrop {
        &self.backdrop
    }

    pub fn rows(&self) -> usize {
        self.board.rows()
    }

    pub fn cols(&self) -> usize {
        self.board.cols()
    }

    pub fn update_schedule(&self) -> &[char] {
        &self.update_schedule
    }

    /// Paint order, back to front.
    pub fn z_order(&self) -> &[char] {
        &self.z_order
    }

    pub fn entity(&self, ch: char) -> Option<&Entity> {
        self.index.get(&ch).and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn sprite(&self, ch: char) -> Option<&SpriteState> {
        self.entity(ch).and_then(Entity::as_sprite)
    }

    pub fn drape(&self, ch: char) -> Option<&DrapeState> {
        self.entity(ch).and_then(Entity::as_drape)
    }

    /// Footprint of every entity, keyed by character.
    pub fn footprints(&self) -> BTreeMap<char, Footprint> {
        self.slots
            .iter()
            .flatten()
            .map(|entity| {
                let occupant = entity.occupant();
                (occupant.character(), occupant.footprint().clone())
            })
            .collect()
    }
}

/// Registration of a sprite with the builder.
#[derive(Debug)]
pub struct SpriteDef {
    footprint: Footprint,
    impassable: BTreeSet<char>,
    logic: Box<dyn SpriteLogic>,
}

impl SpriteDef {
    /// A single-cell sprite that can walk anywhere on the board.
    pub fn new(logic: impl SpriteLogic + 'static) -> Self {
        Self {
            footprint: Footprint::single(),
            impassable: BTreeSet::new(),
            logic: Box::new(logic),
        }
    }

    pub fn footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = footprint;
        self
    }

    /// Characters the sprite cannot step onto.
    pub fn impassable(mut self, characters: &str) -> Self {
        self.impassable = characters.chars().collect();
        self
    }
}

/// Registration of a drape with the builder.
#[derive(Debug)]
pub struct DrapeDef {
    footprint: Footprint,
    logic: Box<dyn DrapeLogic>,
}

impl DrapeDef {
    pub fn new(logic: impl DrapeLogic + 'static) -> Self {
        Self {
            footprint: Footprint::single(),
            logic: Box::new(logic),
        }
    }

    pub fn footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = footprint;
        self
    }
}

/// Assembles an [`Engine`] from level art.
///
/// # Examples
///
/// ```
/// use symbolworld::{EngineBuilder, Level, SpriteDef, SpriteLogic, SpriteState, UpdateContext};
/// use symbolworld::SymbolWorldResult;
///
/// #[derive(Debug)]
/// struct Idle;
///
/// impl SpriteLogic for Idle {
///     fn update(&mut self, _: &mut SpriteState, _: &mut UpdateContext<'_>) -> SymbolWorldResult<()> {
///         Ok(())
///     }
/// }
///
/// let level = Level::from_art(&["#####", "# P #", "#####"]).unwrap();
/// let mut engine = EngineBuilder::new(level, ' ')
///     .backdrop_chars("#")
///     .sprite('P', SpriteDef::new(Idle).impassable("#"))
///     .build()
///     .unwrap();
/// let start = engine.start().unwrap();
/// assert_eq!(start.observation.to_lines()[1], "# P #");
/// ```
#[derive(Debug)]
pub struct EngineBuilder {
    level: Level,
    what_lies_beneath: char,
    backdrop_chars: BTreeSet<char>,
    sprites: Vec<(char, SpriteDef)>,
    drapes: Vec<(char, DrapeDef)>,
    update_schedule: Option<Vec<char>>,
    z_order: Option<Vec<char>>,
}

impl EngineBuilder {
    pub fn new(level: Level, what_lies_beneath: char) -> Self {
        Self {
            level,
            what_lies_beneath,
            backdrop_chars: BTreeSet::new(),
            sprites: Vec::new(),
            drapes: Vec::new(),
            update_schedule: None,
            z_order: None,
        }
    }

    /// Scenery characters allowed in the art besides `what_lies_beneath`.
    pub fn backdrop_chars(mut self, characters: &str) -> Self {
        self.backdrop_chars.extend(characters.chars());
        self
    }

    pub fn sprite(mut self, ch: char, def: SpriteDef) -> Self {
        self.sprites.push((ch, def));
        self
    }

    pub fn drape(mut self, ch: char, def: DrapeDef) -> Self {
        self.drapes.push((ch, def));
        self
    }

    /// Update order. Defaults to sprites then drapes, in registration order.
    pub fn update_schedule(mut self, order: &str) -> Self {
        self.update_schedule = Some(order.chars().collect());
        self
    }

    /// Paint order, back to front. Defaults to drapes then sprites, in registration order.
    pub fn z_order(mut self, order: &str) -> Self {
        self.z_order = Some(order.chars().collect());
        self
    }

    /// Validates the declaration against the art and builds the engine.
    pub fn build(self) -> SymbolWorldResult<Engine> {
        let art = self.level.to_board()?;
        let rows = art.rows();
        let cols = art.cols();

        let sprite_chars: Vec<char> = self.sprites.iter().map(|(ch, _)| *ch).collect();
        let drape_chars: Vec<char> = self.drapes.iter().map(|(ch, _)| *ch).collect();
        let entity_chars: Vec<char> = sprite_chars.iter().chain(drape_chars.iter()).copied().collect();

        let mut seen = BTreeSet::new();
        for &ch in &entity_chars {
            if !seen.insert(ch) {
                return Err(SymbolWorldError::InvalidLevel(format!(
                    "character {:?} is registered twice",
                    ch
                )));
            }
            if ch == self.what_lies_beneath || self.backdrop_chars.contains(&ch) {
                return Err(SymbolWorldError::InvalidLevel(format!(
                    "character {:?} is both scenery and an entity",
                    ch
                )));
            }
        }

        let mut characters = self.backdrop_chars.clone();
        characters.insert(self.what_lies_beneath);
        characters.extend(entity_chars.iter().copied());

        if let Some((pos, ch)) = art.iter().find(|(_, ch)| !characters.contains(ch)) {
            return Err(SymbolWorldError::InvalidLevel(format!(
                "unregistered character {:?} at row {}, column {}",
                ch, pos.row, pos.col
            )));
        }

        let default_schedule = entity_chars.clone();
        let update_schedule = self.update_schedule.unwrap_or(default_schedule);
        check_ordering("update schedule", &update_schedule, &entity_chars)?;

        let default_z: Vec<char> = drape_chars.iter().chain(sprite_chars.iter()).copied().collect();
        let z_order = self.z_order.unwrap_or(default_z);
        check_ordering("z-order", &z_order, &entity_chars)?;

        let mut backdrop_curtain = art.clone();
        for &ch in &entity_chars {
            for pos in art.positions_of(ch) {
                backdrop_curtain.set(pos, self.what_lies_beneath);
            }
        }
        let backdrop = Backdrop::new(backdrop_curtain, self.what_lies_beneath);

        let corner = Position::new(rows as i32, cols as i32);
        let mut slots = Vec::with_capacity(entity_chars.len());
        let mut index = BTreeMap::new();

        for (ch, def) in self.sprites {
            let positions = art.positions_of(ch);
            if positions.len() != 1 {
                return Err(SymbolWorldError::InvalidLevel(format!(
                    "sprite {:?} must appear exactly once, found {} times",
                    ch,
                    positions.len()
                )));
            }
            let state = SpriteState::new(ch, corner, positions[0], def.footprint, def.impassable);
            index.insert(ch, slots.len());
            slots.push(Some(Entity::Sprite(Sprite {
                state,
                logic: def.logic,
            })));
        }

        for (ch, def) in self.drapes {
            let curtain = Layer::from_board(&art, ch);
            let state = DrapeState::new(ch, curtain, def.footprint);
            index.insert(ch, slots.len());
            slots.push(Some(Entity::Drape(Drape {
                state,
                logic: def.logic,
            })));
        }

        log::debug!(
            "built engine: {}x{} board, schedule {:?}, z-order {:?}",
            rows,
            cols,
            update_schedule,
            z_order
        );

        let layers = Layers::compute(&art, characters.iter().copied());
        Ok(Engine {
            backdrop,
            board: art,
            layers,
            characters,
            slots,
            index,
            update_schedule,
            z_order,
            plot: Plot::new(),
            status: EngineStatus::Ready,
        })
    }
}

fn check_ordering(what: &str, order: &[char], entities: &[char]) -> SymbolWorldResult<()> {
    let listed: BTreeSet<char> = order.iter().copied().collect();
    let expected: BTreeSet<char> = entities.iter().copied().collect();
    if listed.len() != order.len() {
        return Err(SymbolWorldError::InvalidLevel(format!(
            "{} lists an entity more than once: {:?}",
            what, order
        )));
    }
    if listed != expected {
        return Err(SymbolWorldError::InvalidLevel(format!(
            "{} {:?} must name exactly the entities {:?}",
            what, order, entities
        )));
    }
    Ok(())
}

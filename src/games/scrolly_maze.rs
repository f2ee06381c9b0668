//! # Scrolly Maze
//!
//! Fixed mazes full of coins, watched through three viewports.
//!
//! The engine renders the whole maze every tick. Croppers do the scrolling:
//! one follows the player, one follows the patroller `c`, and one stays
//! fixed over a tempting hoard of coins. Every coin is worth
//! [`PICKUP_REWARD`](crate::config::PICKUP_REWARD); collecting the last one
//! ends the episode, as does touching a patroller.

use crate::config::PICKUP_REWARD;
use crate::game::{
    DrapeDef, DrapeLogic, DrapeState, Engine, EngineBuilder, Footprint, Level, Position, SpriteDef,
    UpdateContext,
};
use crate::games::{PatrollerLogic, PlayerLogic};
use crate::rendering::{FixedCropper, ScrollingCropper, Viewports};
use crate::{SymbolWorldError, SymbolWorldResult};

const PLAYER: char = 'P';
const COIN: char = '@';
const WALL: char = '#';
const FLOOR: char = ' ';
const PATROLLERS: &str = "abc";

/// Top-left corner of the fixed coin view, per level.
pub const TEASER_CORNER: [(i32, i32); 2] = [(3, 9), (4, 5)];

/// Where the player appears in the first player view, relative to the view's centre, per level.
pub const STARTER_OFFSET: [(i32, i32); 2] = [(-2, -12), (10, 0)];

const LEVEL_0: &[&str] = &[
    "#########################################################################################",
    "#                                                                                       #",
    "#                                                                                       #",
    "#       @                                                                @              #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#              P                                                                        #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#       a                                                                               #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                               @                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#                                                                                       #",
    "#########################################################################################",
];

const LEVEL_1: &[&str] = &[
    "##############################",
    "#                            #",
    "#   @   @   @   @   @   @    #",
    "#    @   @   @   @   @   @   #",
    "#     @   @   @   @   @   @  #",
    "#  @   @   @   @   @   @     #",
    "#   @   @   @   @   @   @    #",
    "#    @   @   @   @   @   @   #",
    "#                            #",
    "#########  a         #########",
    "##########        b ##########",
    "#                            #",
    "#   @   @   @   @   @   @    #",
    "#    @   @   @   @   @   @   #",
    "#     @   @   @   @   @   @  #",
    "#  @   @   @   @   @   @     #",
    "#   @   @   @   @   @   @    #",
    "#    @   @   @   @   @   @   #",
    "#                            #",
    "#######       c        #######",
    "#                            #",
    "#   @   @   @   @   @   @    #",
    "#    @   @   @   @   @   @   #",
    "#     @   @   @   @   @   @  #",
    "#  @   @   @   @   @   @     #",
    "#   @   @   @   @   @   @    #",
    "#    @   @   @   @   @   @   #",
    "#              P             #",
    "##############################",
];

const LEVELS: [&[&str]; 2] = [LEVEL_0, LEVEL_1];

/// Number of playable levels.
pub fn level_count() -> usize {
    LEVELS.len()
}

/// Art for a level.
pub fn level_art(level: usize) -> SymbolWorldResult<Level> {
    let art = LEVELS.get(level).ok_or_else(|| {
        SymbolWorldError::InvalidConfig(format!(
            "no scrolly maze level {}, there are {}",
            level,
            LEVELS.len()
        ))
    })?;
    Level::from_art(art)
}

/// The shape shared by every maze entity: a hollow diamond.
fn hollow_diamond() -> Footprint {
    Footprint::diamond(2)
}

/// Collects coins the player touches, one per tick.
#[derive(Debug, Clone)]
pub struct CashDrapeLogic {
    player: char,
}

impl CashDrapeLogic {
    pub fn new(player: char) -> Self {
        Self { player }
    }
}

impl DrapeLogic for CashDrapeLogic {
    fn update(&mut self, drape: &mut DrapeState, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()> {
        let player = ctx.things.sprite(self.player)?;
        if let Some(cell) = drape.colliding_cell(player) {
            ctx.plot.log(format!("Coin collected at {:?}!", player.position()));
            ctx.plot.add_reward(PICKUP_REWARD);
            drape.curtain_mut().set(cell, false);
            if !drape.curtain().any() {
                ctx.plot.terminate_episode();
            }
        }
        Ok(())
    }
}

/// Builds the engine for one of the mazes.
pub fn make_game(level: usize) -> SymbolWorldResult<Engine> {
    let art = level_art(level)?;
    let patrollers: String = PATROLLERS
        .chars()
        .filter(|&ch| art.lines().iter().any(|line| line.contains(ch)))
        .collect();
    let walls = WALL.to_string();

    let mut builder = EngineBuilder::new(art, FLOOR).backdrop_chars(&walls).sprite(
        PLAYER,
        SpriteDef::new(PlayerLogic)
            .footprint(hollow_diamond())
            .impassable(&walls),
    );
    for ch in patrollers.chars() {
        builder = builder.sprite(
            ch,
            SpriteDef::new(PatrollerLogic::new(PLAYER, WALL, 1))
                .footprint(hollow_diamond())
                .impassable(&walls),
        );
    }

    builder
        .drape(COIN, DrapeDef::new(CashDrapeLogic::new(PLAYER)).footprint(hollow_diamond()))
        .update_schedule(&format!("{}{}{}", patrollers, PLAYER, COIN))
        .z_order(&format!("{}{}{}", patrollers, COIN, PLAYER))
        .build()
}

/// The three views of a maze: the player, the patroller `c`, and the teaser.
pub fn make_croppers(level: usize) -> SymbolWorldResult<Viewports> {
    let (Some(&offset), Some(&corner)) = (STARTER_OFFSET.get(level), TEASER_CORNER.get(level)) else {
        return Err(SymbolWorldError::InvalidConfig(format!(
            "no scrolly maze level {}",
            level
        )));
    };

    let mut viewports = Viewports::new();
    viewports.push(ScrollingCropper::new(10, 30, "P")?.with_initial_offset(Position::from(offset)));
    viewports.push(
        ScrollingCropper::new(7, 10, "c")?
            .with_pad_char(FLOOR)
            .with_scroll_margins(None, Some(3))?,
    );
    viewports.push(FixedCropper::new(Position::from(corner), 12, 20, Some(FLOOR))?);
    Ok(viewports)
}

//! # Games
//!
//! Concrete games built on the engine, plus the behaviours they share.

pub mod scrolly_maze;
pub mod symbol_world;

use crate::game::{Action, Direction, Occupant, Position, SpriteLogic, SpriteState, UpdateContext};
use crate::SymbolWorldResult;

/// Walks where the action says; quitting ends the episode.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerLogic;

impl SpriteLogic for PlayerLogic {
    fn update(&mut self, sprite: &mut SpriteState, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()> {
        match ctx.action {
            Some(Action::Quit) => ctx.plot.terminate_episode(),
            Some(action) => {
                if let Some(direction) = action.direction() {
                    sprite.step(direction, ctx.board);
                }
            }
            None => {}
        }
        Ok(())
    }
}

/// Paces east and west on even frames and ends the episode on touching its target.
///
/// It turns around when a wall sits `lookahead` columns away in the
/// direction it is heading. Contact is tested every tick, so a player that
/// walks into a resting patroller is caught too.
#[derive(Debug, Clone)]
pub struct PatrollerLogic {
    target: char,
    wall: char,
    lookahead: i32,
    moving_east: bool,
}

impl PatrollerLogic {
    pub fn new(target: char, wall: char, lookahead: i32) -> Self {
        Self {
            target,
            wall,
            lookahead,
            moving_east: false,
        }
    }

    pub fn moving_east(&self) -> bool {
        self.moving_east
    }
}

impl SpriteLogic for PatrollerLogic {
    fn update(&mut self, sprite: &mut SpriteState, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()> {
        if ctx.plot.frame() % 2 == 0 {
            let pos = sprite.position();
            if ctx.layers.is_at(self.wall, pos + Position::new(0, -self.lookahead)) {
                self.moving_east = true;
            }
            if ctx.layers.is_at(self.wall, pos + Position::new(0, self.lookahead)) {
                self.moving_east = false;
            }
            let direction = if self.moving_east {
                Direction::East
            } else {
                Direction::West
            };
            sprite.step(direction, ctx.board);
        }

        let target = ctx.things.get(self.target)?;
        if sprite.is_colliding(target) {
            ctx.plot.log(format!(
                "{:?} caught {:?} at {:?}",
                sprite.character(),
                self.target,
                sprite.position()
            ));
            ctx.plot.terminate_episode();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EngineBuilder, Level, SpriteDef};

    fn hall() -> crate::game::Engine {
        let level = Level::from_art(&["#########", "#   a   #", "#       #", "#P      #", "#########"]).unwrap();
        EngineBuilder::new(level, ' ')
            .backdrop_chars("#")
            .sprite('P', SpriteDef::new(PlayerLogic).impassable("#"))
            .sprite('a', SpriteDef::new(PatrollerLogic::new('P', '#', 1)).impassable("#"))
            .update_schedule("Pa")
            .build()
            .unwrap()
    }

    #[test]
    fn test_patroller_moves_on_even_frames_and_bounces() {
        let mut engine = hall();
        engine.start().unwrap();
        // Frame 0 moved it once already.
        assert_eq!(engine.sprite('a').unwrap().position(), Position::new(1, 3));

        let mut columns = Vec::new();
        for _ in 0..8 {
            engine.step(Action::Stay).unwrap();
            columns.push(engine.sprite('a').unwrap().position().col);
        }
        assert_eq!(columns, vec![3, 2, 2, 1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_player_quit_ends_episode() {
        let mut engine = hall();
        engine.start().unwrap();
        let timestep = engine.step(Action::Quit).unwrap();
        assert!(engine.game_over());
        assert_eq!(timestep.discount, Some(0.0));
    }

    #[test]
    fn test_patroller_catches_player() {
        let mut engine = hall();
        engine.start().unwrap();
        engine.step(Action::Up).unwrap();
        assert!(!engine.game_over());
        // Both end up on (1, 1) during frame 4.
        engine.step(Action::Stay).unwrap();
        engine.step(Action::Stay).unwrap();
        let timestep = engine.step(Action::Up).unwrap();
        assert!(engine.game_over());
        assert_eq!(timestep.discount, Some(0.0));
        assert!(engine.drain_log().iter().any(|line| line.contains("caught")));
    }
}

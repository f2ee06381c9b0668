//! # Symbol World
//!
//! Collect keys, spend them on goals, avoid the patrollers.
//!
//! Levels come from [`LevelGenerator`](crate::LevelGenerator): a walled square
//! with a player `P`, adversaries `a`, keys `K` and goals `@` on a floor of
//! spaces. Every key is worth [`PICKUP_REWARD`](crate::config::PICKUP_REWARD)
//! and adds one to the plot counter [`KEY_COUNT`]. A goal only opens for a
//! player holding a key; it spends the key, pays the same reward and
//! disappears. Opening the last goal wins. Touching an adversary loses.
//!
//! Entities collide through their footprints, so with [`Shapes::original`]
//! the player picks things up while they are still a few cells away.

use crate::config::PICKUP_REWARD;
use crate::game::{
    DrapeDef, DrapeLogic, DrapeState, Engine, EngineBuilder, Footprint, Level, SpriteDef, UpdateContext,
};
use crate::games::{PatrollerLogic, PlayerLogic};
use crate::generation::Glyphs;
use crate::rendering::{ScrollingCropper, Viewports};
use crate::{SymbolWorldError, SymbolWorldResult};

/// Plot counter holding the number of keys the player carries.
pub const KEY_COUNT: &str = "key_count";

/// Characters given to successive adversaries, in row-major order of the art.
pub const ADVERSARY_CHARS: &str = "abcdefghijklmnopqrstuvwxyz";

/// Columns ahead at which a patroller notices a wall and turns.
pub const PATROLLER_LOOKAHEAD: i32 = 3;

/// Footprints for each kind of object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shapes {
    pub player: Footprint,
    pub adversary: Footprint,
    pub key: Footprint,
    pub goal: Footprint,
}

impl Shapes {
    /// The large shapes: a solid diamond player, diamond adversaries, a
    /// key-shaped key, and hollow square goals.
    pub fn original() -> Self {
        Self {
            player: Footprint::filled_diamond(2),
            adversary: Footprint::diamond(2).with_center(),
            key: Footprint::from_offsets([
                (-1, -2),
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (-1, 2),
                (-1, 3),
                (0, -3),
                (0, -1),
                (0, 1),
                (0, 3),
                (1, -2),
                (1, 1),
                (1, 3),
            ]),
            goal: Footprint::square_outline(2),
        }
    }

    /// One cell each: things collide only when they share a cell.
    pub fn point() -> Self {
        Self {
            player: Footprint::single(),
            adversary: Footprint::single(),
            key: Footprint::single(),
            goal: Footprint::single(),
        }
    }
}

impl Default for Shapes {
    fn default() -> Self {
        Self::original()
    }
}

/// Picks up keys the player touches.
#[derive(Debug, Clone)]
pub struct KeyDrapeLogic {
    player: char,
}

impl KeyDrapeLogic {
    pub fn new(player: char) -> Self {
        Self { player }
    }
}

impl DrapeLogic for KeyDrapeLogic {
    fn update(&mut self, drape: &mut DrapeState, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()> {
        let player = ctx.things.sprite(self.player)?;
        if let Some(cell) = drape.colliding_cell(player) {
            drape.curtain_mut().set(cell, false);
            ctx.plot.add_reward(PICKUP_REWARD);
            let held = ctx.plot.increment(KEY_COUNT);
            ctx.plot.log(format!(
                "Key collected at {:?}, holding {}",
                player.position(),
                held
            ));
        }
        Ok(())
    }
}

/// Opens goals for a player holding a key.
#[derive(Debug, Clone)]
pub struct GoalDrapeLogic {
    player: char,
}

impl GoalDrapeLogic {
    pub fn new(player: char) -> Self {
        Self { player }
    }
}

impl DrapeLogic for GoalDrapeLogic {
    fn update(&mut self, drape: &mut DrapeState, ctx: &mut UpdateContext<'_>) -> SymbolWorldResult<()> {
        let player = ctx.things.sprite(self.player)?;
        let Some(cell) = drape.colliding_cell(player) else {
            return Ok(());
        };
        if ctx.plot.decrement(KEY_COUNT).is_none() {
            return Ok(());
        }

        drape.curtain_mut().set(cell, false);
        ctx.plot.add_reward(PICKUP_REWARD);
        ctx.plot.log(format!("Goal reached at {:?}!", player.position()));
        if !drape.curtain().any() {
            ctx.plot.terminate_episode();
        }
        Ok(())
    }
}

/// Gives each adversary in the art its own character.
fn label_adversaries(level: &Level, adversary: char) -> SymbolWorldResult<(Level, Vec<char>)> {
    let mut labels = ADVERSARY_CHARS.chars();
    let mut used = Vec::new();
    let mut lines = Vec::with_capacity(level.rows());

    for line in level.lines() {
        let mut relabelled = String::with_capacity(line.len());
        for ch in line.chars() {
            if ch == adversary {
                let label = labels.next().ok_or_else(|| {
                    SymbolWorldError::InvalidLevel(format!(
                        "more than {} adversaries",
                        ADVERSARY_CHARS.len()
                    ))
                })?;
                used.push(label);
                relabelled.push(label);
            } else {
                relabelled.push(ch);
            }
        }
        lines.push(relabelled);
    }

    Ok((Level::new(lines)?, used))
}

/// Builds a Symbol World engine for a generated level.
///
/// Updates run player first, then adversaries, keys and goals, so anything
/// the player walks into is noticed on the same tick.
///
/// # Errors
///
/// `InvalidLevel` if the art holds unknown characters, no player or several,
/// or more adversaries than [`ADVERSARY_CHARS`] can label.
pub fn make_game(level: &Level, shapes: Shapes) -> SymbolWorldResult<Engine> {
    let glyphs = Glyphs::default();
    let (level, adversaries) = label_adversaries(level, glyphs.adversary)?;
    let walls = glyphs.wall.to_string();

    let mut builder = EngineBuilder::new(level, glyphs.background)
        .backdrop_chars(&walls)
        .sprite(
            glyphs.player,
            SpriteDef::new(PlayerLogic)
                .footprint(shapes.player)
                .impassable(&walls),
        );
    for &ch in &adversaries {
        builder = builder.sprite(
            ch,
            SpriteDef::new(PatrollerLogic::new(glyphs.player, glyphs.wall, PATROLLER_LOOKAHEAD))
                .footprint(shapes.adversary.clone())
                .impassable(&walls),
        );
    }

    let adversary_order: String = adversaries.iter().collect();
    let schedule = format!("{}{}{}{}", glyphs.player, adversary_order, glyphs.key, glyphs.goal);
    let z_order = format!("{}{}{}{}", adversary_order, glyphs.key, glyphs.goal, glyphs.player);

    builder
        .drape(glyphs.key, DrapeDef::new(KeyDrapeLogic::new(glyphs.player)).footprint(shapes.key))
        .drape(glyphs.goal, DrapeDef::new(GoalDrapeLogic::new(glyphs.player)).footprint(shapes.goal))
        .update_schedule(&schedule)
        .z_order(&z_order)
        .build()
}

/// A `rows` x `cols` view following the player, padded with floor.
pub fn make_croppers(rows: usize, cols: usize) -> SymbolWorldResult<Viewports> {
    let glyphs = Glyphs::default();
    let mut viewports = Viewports::new();
    viewports.push(
        ScrollingCropper::new(rows, cols, &glyphs.player.to_string())?.with_pad_char(glyphs.background),
    );
    Ok(viewports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Action, Position};
    use crate::generation::{CountRange, GenerationConfig, LevelGenerator};

    fn run(engine: &mut Engine, actions: &[Action]) -> Vec<Option<f64>> {
        actions
            .iter()
            .map(|&action| engine.step(action).unwrap().reward)
            .collect()
    }

    #[test]
    fn test_key_then_goal_wins() {
        let level = Level::from_art(&["#########", "#P K @  #", "#       #", "#      a#", "#########"]).unwrap();
        let mut engine = make_game(&level, Shapes::point()).unwrap();
        engine.start().unwrap();

        let rewards = run(&mut engine, &[Action::Right, Action::Right]);
        assert_eq!(rewards, vec![None, Some(100.0)]);
        assert_eq!(engine.plot().count(KEY_COUNT), Some(1));
        assert_eq!(engine.drape('K').unwrap().curtain().count(), 0);

        let rewards = run(&mut engine, &[Action::Right, Action::Right]);
        assert_eq!(rewards, vec![None, Some(100.0)]);
        assert_eq!(engine.plot().count(KEY_COUNT), Some(0));
        assert!(engine.game_over());
        assert_eq!(engine.plot().episode_return(), 200.0);
    }

    #[test]
    fn test_key_touched_at_start_pays_nothing() {
        // The player's diamond already covers a cell of the key's shape.
        let level = Level::from_art(&[
            "##############",
            "#            #",
            "#  P K       #",
            "#            #",
            "#           @#",
            "#            #",
            "##############",
        ])
        .unwrap();
        let mut engine = make_game(&level, Shapes::original()).unwrap();
        let start = engine.start().unwrap();

        assert_eq!(start.reward, None);
        assert_eq!(start.discount, None);
        assert_eq!(engine.plot().episode_return(), 0.0);
        assert_eq!(engine.plot().count(KEY_COUNT), Some(1));
        assert_eq!(engine.drape('K').unwrap().curtain().count(), 0);

        let timestep = engine.step(Action::Stay).unwrap();
        assert_eq!(timestep.reward, None);
        assert_eq!(engine.plot().episode_return(), 0.0);
        assert!(!engine.game_over());
    }

    #[test]
    fn test_goal_without_key_stays_shut() {
        let level = Level::from_art(&["#########", "#P@ K   #", "#       #", "#      a#", "#########"]).unwrap();
        let mut engine = make_game(&level, Shapes::point()).unwrap();
        engine.start().unwrap();

        let timestep = engine.step(Action::Right).unwrap();
        assert_eq!(timestep.reward, None);
        assert!(!engine.game_over());
        assert_eq!(engine.drape('@').unwrap().curtain().count(), 1);

        let rewards = run(&mut engine, &[Action::Right, Action::Right, Action::Left, Action::Left]);
        assert_eq!(rewards, vec![None, Some(100.0), None, Some(100.0)]);
        assert!(engine.game_over());
    }

    #[test]
    fn test_adversary_ends_game_whatever_the_action() {
        let level = Level::from_art(&["##############", "#   P   a    #", "##############"]).unwrap();
        let mut engine = make_game(&level, Shapes::point()).unwrap();
        engine.start().unwrap();

        for _ in 0..5 {
            engine.step(Action::Other(42)).unwrap();
            assert!(!engine.game_over());
        }
        let timestep = engine.step(Action::Other(42)).unwrap();
        assert!(engine.game_over());
        assert_eq!(timestep.discount, Some(0.0));
        assert_eq!(engine.sprite('a').unwrap().position(), Position::new(1, 4));
    }

    #[test]
    fn test_large_footprints_collide_before_cells_meet() {
        let level = Level::from_art(&[
            "################",
            "#              #",
            "#              #",
            "#  P     a     #",
            "#              #",
            "#              #",
            "################",
        ])
        .unwrap();
        let mut engine = make_game(&level, Shapes::original()).unwrap();
        engine.start().unwrap();
        engine.step(Action::Stay).unwrap();
        assert!(!engine.game_over());
        engine.step(Action::Stay).unwrap();
        assert!(engine.game_over());
        assert_eq!(engine.sprite('a').unwrap().position(), Position::new(3, 7));
    }

    #[test]
    fn test_generated_level_with_several_adversaries() {
        let mut config = GenerationConfig::for_testing(11);
        config.num_adversaries = CountRange::fixed(3);
        config.safety_box = 2;
        let level = LevelGenerator::new().generate_level(&config).unwrap();

        let mut engine = make_game(&level, Shapes::original()).unwrap();
        assert_eq!(engine.update_schedule(), &['P', 'a', 'b', 'c', 'K', '@']);
        assert_eq!(engine.z_order(), &['a', 'b', 'c', 'K', '@', 'P']);
        let timestep = engine.start().unwrap();
        assert_eq!(timestep.observation.rows(), 40);
        assert!(timestep.observation.sprite_position('c').is_some());
    }

    #[test]
    fn test_level_without_player_is_rejected() {
        let level = Level::from_art(&["#####", "# K #", "#####"]).unwrap();
        assert!(matches!(
            make_game(&level, Shapes::point()),
            Err(SymbolWorldError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_player_view_follows_player() {
        let level = Level::from_art(&["#########", "#P K @  #", "#       #", "#      a#", "#########"]).unwrap();
        let mut engine = make_game(&level, Shapes::point()).unwrap();
        let start = engine.start().unwrap();
        let mut viewports = make_croppers(3, 3).unwrap();
        viewports.set_engine(&engine).unwrap();

        let views = viewports.crop_all(&start.observation).unwrap();
        assert_eq!(views[0].to_lines(), vec!["###", "#P ", "#  "]);
    }

    #[test]
    fn test_shapes() {
        let shapes = Shapes::original();
        assert_eq!(shapes.player.len(), 13);
        assert_eq!(shapes.adversary.len(), 9);
        assert_eq!(shapes.key.len(), 13);
        assert_eq!(shapes.goal.len(), 16);
        assert_eq!(Shapes::point().goal, Footprint::single());
    }
}

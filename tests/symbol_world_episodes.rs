//! End-to-end episodes through the public API.

use symbolworld::games::symbol_world::{self, Shapes, KEY_COUNT};
use symbolworld::{
    Action, EngineStatus, GenerationConfig, Level, LevelGenerator, Palette, Position, RgbRenderer,
    SymbolWorldError, SymbolWorldResult,
};

fn two_rooms() -> SymbolWorldResult<Level> {
    Level::from_art(&[
        "###########",
        "#P K @ K @#",
        "#         #",
        "#        a#",
        "###########",
    ])
}

#[test]
fn test_keys_open_goals_until_none_are_left() -> SymbolWorldResult<()> {
    let mut engine = symbol_world::make_game(&two_rooms()?, Shapes::point())?;
    engine.start()?;

    let mut rewards = Vec::new();
    for _ in 0..8 {
        rewards.push(engine.step(Action::Right)?.reward);
        if rewards.len() == 4 {
            // One goal opened, one still standing.
            assert!(!engine.game_over());
            assert_eq!(engine.drape('@').map(|goal| goal.curtain().count()), Some(1));
        }
    }

    let hundred = Some(100.0);
    assert_eq!(rewards, vec![None, hundred, None, hundred, None, hundred, None, hundred]);
    assert!(engine.game_over());
    assert_eq!(engine.plot().episode_return(), 400.0);
    assert_eq!(engine.plot().count(KEY_COUNT), Some(0));
    Ok(())
}

#[test]
fn test_adversary_contact_ends_the_tick_it_happens() -> SymbolWorldResult<()> {
    let level = Level::from_art(&["##############", "#   P   a    #", "##############"])?;

    // None of these actions moves the player: walls above and below.
    for action in [Action::Stay, Action::Up, Action::Down, Action::Other(7)] {
        let mut engine = symbol_world::make_game(&level, Shapes::point())?;
        engine.start()?;
        for _ in 0..5 {
            engine.step(action)?;
        }
        assert!(!engine.game_over(), "{:?}", action);
        let timestep = engine.step(action)?;
        assert!(engine.game_over(), "{:?}", action);
        assert_eq!(timestep.discount, Some(0.0));
        assert_eq!(engine.sprite('P').map(|p| p.position()), Some(Position::new(1, 4)));
    }
    Ok(())
}

#[test]
fn test_finished_engine_refuses_steps() -> SymbolWorldResult<()> {
    let mut engine = symbol_world::make_game(&two_rooms()?, Shapes::point())?;
    engine.start()?;
    engine.step(Action::Quit)?;
    assert_eq!(engine.status(), EngineStatus::GameOver);
    assert!(matches!(
        engine.step(Action::Stay),
        Err(SymbolWorldError::IllegalUsage(_))
    ));
    Ok(())
}

#[test]
fn test_random_policy_on_generated_levels() -> SymbolWorldResult<()> {
    for seed in 0..5 {
        let config = GenerationConfig::for_testing(seed);
        let level = LevelGenerator::new().generate_level(&config)?;
        let mut engine = symbol_world::make_game(&level, Shapes::original())?;
        let start = engine.start()?;

        let mut viewports = symbol_world::make_croppers(11, 11)?;
        viewports.set_engine(&engine)?;
        viewports.crop_all(&start.observation)?;

        let codes = [0, 3, 1, 2, 4, 0, 0, 3, 3, 1];
        for (i, &code) in codes.iter().cycle().take(60).enumerate() {
            if engine.game_over() {
                break;
            }
            let timestep = engine.step(Action::from_code(code))?;
            assert_eq!(engine.frame(), i as u64 + 1);

            let views = viewports.crop_all(&timestep.observation)?;
            assert_eq!((views[0].rows(), views[0].cols()), (11, 11));
            assert!(views[0].sprite_position('P').is_some());
        }
    }
    Ok(())
}

#[test]
fn test_rgb_frames_cover_the_board() -> SymbolWorldResult<()> {
    let level = LevelGenerator::new().generate_level(&GenerationConfig::for_testing(3))?;
    let mut engine = symbol_world::make_game(&level, Shapes::original())?;
    let start = engine.start()?;

    let palette = Palette::random("# PaK@".chars(), 3);
    let renderer = RgbRenderer::for_engine(&engine, palette.clone());
    let frame = renderer.render(&start.observation);
    assert_eq!((frame.rows(), frame.cols()), (level.rows(), level.cols()));
    assert_eq!(frame.get(Position::origin()), Some(palette.color('#')));

    // The player is drawn as a diamond, so the cell above it is player-coloured.
    let player = start.observation.sprite_position('P').ok_or(SymbolWorldError::UnknownEntity('P'))?;
    assert_eq!(frame.get(player + Position::new(-1, 0)), Some(palette.color('P')));
    Ok(())
}

//! Criterion benchmarks for level generation, engine stepping and cropping.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use symbolworld::games::symbol_world::{self, Shapes};
use symbolworld::{Action, GenerationConfig, LevelGenerator};

fn bench_generation(c: &mut Criterion) {
    let generator = LevelGenerator::new();
    let config = GenerationConfig::new(42);
    c.bench_function("generate_level_50x50", |b| {
        b.iter(|| generator.generate_level(black_box(&config)))
    });
}

fn bench_stepping(c: &mut Criterion) {
    let level = LevelGenerator::new()
        .generate_level(&GenerationConfig::new(42))
        .expect("default config generates");
    let actions = [Action::Up, Action::Right, Action::Down, Action::Left, Action::Stay];

    c.bench_function("step_100_ticks", |b| {
        b.iter(|| {
            let mut engine = symbol_world::make_game(&level, Shapes::original()).expect("level builds");
            engine.start().expect("engine starts");
            for action in actions.iter().cycle().take(100) {
                if engine.game_over() {
                    break;
                }
                black_box(engine.step(*action).expect("step succeeds"));
            }
        })
    });

    c.bench_function("step_and_crop_100_ticks", |b| {
        b.iter(|| {
            let mut engine = symbol_world::make_game(&level, Shapes::original()).expect("level builds");
            let start = engine.start().expect("engine starts");
            let mut viewports = symbol_world::make_croppers(15, 15).expect("croppers build");
            viewports.set_engine(&engine).expect("croppers bind");
            black_box(viewports.crop_all(&start.observation).expect("crop succeeds"));
            for action in actions.iter().cycle().take(100) {
                if engine.game_over() {
                    break;
                }
                let timestep = engine.step(*action).expect("step succeeds");
                black_box(viewports.crop_all(&timestep.observation).expect("crop succeeds"));
            }
        })
    });
}

criterion_group!(benches, bench_generation, bench_stepping);
criterion_main!(benches);

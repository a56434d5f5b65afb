//! Benchmarks for the per-turn decision and for complete local games.
//!
//! The decision path has to fit inside the contest's per-turn budget, so this
//! is the number to watch.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use haul::sim::{Engine, SimConfig, generate_map, run_game};
use haul::{Deadline, Strategy, StrategyConfig};

/// Play `turns` turns of a duel and return the engine mid-game.
fn mid_game(turns: u32) -> (Engine, Vec<Strategy>) {
    let (map, players) = generate_map(11, 32, 32, 2, 5000).unwrap();
    let constants = haul::game::Constants::default();
    let mut engine = Engine::new(map, players, constants);
    let mut strategies: Vec<Strategy> = (0..2)
        .map(|seed| Strategy::new(StrategyConfig::default(), seed))
        .collect();

    for _ in 0..turns {
        let orders: Vec<_> = strategies
            .iter_mut()
            .enumerate()
            .map(|(player, strategy)| {
                let view = engine.view_for(u8::try_from(player).unwrap());
                strategy.decide(&view, &Deadline::unlimited()).commands
            })
            .collect();
        engine.step(&orders);
    }
    (engine, strategies)
}

fn bench_decide_mid_game(c: &mut Criterion) {
    let (engine, strategies) = mid_game(120);
    let view = engine.view_for(0);

    c.bench_function("decide_turn_120", |b| {
        b.iter(|| {
            let mut strategy = strategies[0].clone();
            let plan = strategy.decide(black_box(&view), &Deadline::unlimited());
            black_box(plan)
        });
    });
}

fn bench_short_game(c: &mut Criterion) {
    let config = SimConfig {
        max_turns: Some(100),
        check_invariants: false,
        ..SimConfig::default()
    };

    let mut group = c.benchmark_group("games");
    group.sample_size(10);
    group.bench_function("short_game_2p", |b| {
        b.iter(|| {
            let result = run_game(black_box(42), black_box(&config));
            black_box(result)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_decide_mid_game, bench_short_game);
criterion_main!(benches);

#![no_main]

//! Single-turn decision fuzzer.
//!
//! Builds a small map with arbitrary halite, fleets, and bank, runs one
//! decision, and checks that our units never plan to share a cell off base
//! and never move without paying.

use std::collections::HashSet;

use arbitrary::Arbitrary;
use haul::game::{check_invariants, Command, Constants, GameMap, GameState, Player, Position, Ship};
use haul::{Deadline, Strategy, StrategyConfig};
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated unit.
#[derive(Arbitrary, Debug)]
struct FuzzShip {
    cell: u8,
    cargo: u16,
    enemy: bool,
}

/// Structured input for one decision turn.
#[derive(Arbitrary, Debug)]
struct TurnInput {
    halite: Vec<u16>,
    ships: Vec<FuzzShip>,
    bank: u16,
    turn: u16,
    seed: u64,
}

fuzz_target!(|input: TurnInput| {
    const SIDE: u16 = 16;
    let cells = usize::from(SIDE) * usize::from(SIDE);

    let halite: Vec<u32> = (0..cells)
        .map(|i| input.halite.get(i).map_or(0, |&h| u32::from(h) % 1001))
        .collect();
    let Some(map) = GameMap::from_halite(SIDE, SIDE, &halite) else {
        return;
    };
    let constants = Constants::default();
    let players = vec![
        Player::new(0, Position::new(3, 8), u32::from(input.bank) * 4),
        Player::new(1, Position::new(12, 8), 5000),
    ];
    let mut state = GameState::new(map, players, constants, 0);
    state.turn = u32::from(input.turn) % constants.max_turns + 1;
    state.stamp_structures();

    let mut used = HashSet::new();
    for (id, ship) in (1u32..).zip(input.ships.iter().take(40)) {
        let position = state.map.position(usize::from(ship.cell) % cells);
        if !used.insert(position) {
            continue;
        }
        let owner = u8::from(ship.enemy);
        let cargo = u32::from(ship.cargo) % (constants.max_halite + 1);
        state.add_ship(Ship::new(id, owner, position, cargo));
    }
    state.rebuild_occupancy();
    if !check_invariants(&state).is_empty() {
        return;
    }

    let mut strategy = Strategy::new(StrategyConfig::default(), input.seed);
    let plan = strategy.decide(&state, &Deadline::unlimited());

    let mut ends = HashSet::new();
    for command in &plan.commands {
        if let Command::Move { ship, direction } = *command {
            let unit = state.ship(ship).expect("command for a known ship");
            assert_eq!(unit.owner, 0, "command for a foreign ship");
            let cost = constants.move_cost(state.map.halite(unit.position));
            assert!(
                direction == haul::Direction::Still || unit.halite >= cost,
                "ship {ship} moves without paying {cost}"
            );
            let end = state.map.offset(unit.position, direction);
            // Endgame arrivals may stack on our own base.
            if plan.endgame && state.is_base_of(end, 0) {
                continue;
            }
            assert!(ends.insert(end), "two units end on {end}");
        }
    }
});

#![no_main]

//! Protocol reader fuzzer.
//!
//! Feeds arbitrary bytes to the init and frame readers. Malformed input must
//! come back as an error, never a panic. Frames that parse into a consistent
//! state are handed to the strategy.

use std::io::Cursor;

use haul::game::check_invariants;
use haul::protocol::EngineReader;
use haul::{Deadline, Strategy, StrategyConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = EngineReader::new(Cursor::new(data));
    let Ok(mut state) = reader.read_init() else {
        return;
    };
    // Keep runtime bounded on huge declared maps.
    if state.map.len() > 64 * 64 {
        return;
    }

    let mut strategy = Strategy::new(StrategyConfig::default(), 0);
    for _ in 0..4 {
        match reader.read_frame(&mut state) {
            Ok(true) => {}
            Ok(false) | Err(_) => return,
        }
        if !check_invariants(&state).is_empty() {
            return;
        }
        let plan = strategy.decide(&state, &Deadline::unlimited());
        assert!(plan.commands.len() <= state.my_ships().count() + 1);
    }
});

//! Engine wire protocol.
//!
//! The engine talks to each bot over stdin/stdout with whitespace-separated
//! text. The first line of the handshake is a JSON object of rule constants;
//! everything after it is read as a token stream, so line breaks inside a
//! frame carry no meaning.
//!
//! ```text
//! init:   {constants json}
//!         num_players my_id
//!         player_id shipyard_x shipyard_y      (× num_players)
//!         width height
//!         halite … (height rows of width values)
//! frame:  turn
//!         player_id num_ships num_dropoffs halite
//!         ship_id x y halite                    (× num_ships)
//!         dropoff_id x y                        (× num_dropoffs)
//!         update_count
//!         x y halite                            (× update_count)
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use thiserror::Error;

use crate::game::{
    Command, Constants, GameMap, GameState, Player, PlayerId, Position, Ship, Structure,
    StructureKind,
};

/// Most players a game can seat.
const MAX_PLAYERS: usize = 8;

/// Longest map side the engine generates, with headroom.
const MAX_SIDE: u16 = 256;

/// Error type for protocol parsing.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The stream ended in the middle of a message.
    #[error("unexpected end of input while reading {expected}")]
    Eof {
        /// What the reader was looking for.
        expected: &'static str,
    },
    /// A token did not parse as the expected value.
    #[error("expected {expected}, got {token:?}")]
    BadToken {
        /// What the reader was looking for.
        expected: &'static str,
        /// The offending token.
        token: String,
    },
    /// The constants line was not valid JSON.
    #[error("malformed constants: {0}")]
    Constants(#[from] serde_json::Error),
    /// The values parsed but describe an impossible game.
    #[error("inconsistent engine data: {0}")]
    Inconsistent(String),
    /// Reading from the engine failed.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// Reads the handshake and per-turn frames from the engine.
#[derive(Debug)]
pub struct EngineReader<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> EngineReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// Read one raw line. Returns `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Next token, pulling lines as needed. Returns `None` at end of input.
    fn try_token(&mut self) -> Result<Option<String>, ProtocolError> {
        while self.pending.is_empty() {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
        Ok(self.pending.pop_front())
    }

    fn parse<T: FromStr>(&mut self, expected: &'static str) -> Result<T, ProtocolError> {
        let token = self.try_token()?.ok_or(ProtocolError::Eof { expected })?;
        token
            .parse()
            .map_err(|_| ProtocolError::BadToken { expected, token })
    }

    fn position(&mut self, map: &GameMap) -> Result<Position, ProtocolError> {
        let x: u16 = self.parse("x coordinate")?;
        let y: u16 = self.parse("y coordinate")?;
        if x >= map.width() || y >= map.height() {
            return Err(ProtocolError::Inconsistent(format!(
                "position ({x}, {y}) outside {}x{} map",
                map.width(),
                map.height()
            )));
        }
        Ok(Position::new(x, y))
    }

    /// Read the init handshake and build the initial state.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, malformed input, or impossible values.
    pub fn read_init(&mut self) -> Result<GameState, ProtocolError> {
        let line = self.read_line()?.ok_or(ProtocolError::Eof {
            expected: "constants",
        })?;
        let constants = Constants::from_json(line.trim())?;

        let num_players: usize = self.parse("player count")?;
        let my_id: PlayerId = self.parse("player id")?;
        if num_players == 0 || num_players > MAX_PLAYERS || usize::from(my_id) >= num_players {
            return Err(ProtocolError::Inconsistent(format!(
                "player id {my_id} with {num_players} players"
            )));
        }

        let mut shipyards = Vec::with_capacity(num_players);
        for _ in 0..num_players {
            let id: PlayerId = self.parse("player id")?;
            let x: u16 = self.parse("shipyard x")?;
            let y: u16 = self.parse("shipyard y")?;
            shipyards.push((id, x, y));
        }

        let width: u16 = self.parse("map width")?;
        let height: u16 = self.parse("map height")?;
        if width > MAX_SIDE || height > MAX_SIDE {
            return Err(ProtocolError::Inconsistent(format!("map size {width}x{height}")));
        }
        let cell_count = usize::from(width) * usize::from(height);
        let mut halite = Vec::with_capacity(cell_count);
        for _ in 0..cell_count {
            halite.push(self.parse::<u32>("cell halite")?);
        }
        let map = GameMap::from_halite(width, height, &halite)
            .ok_or_else(|| ProtocolError::Inconsistent(format!("map size {width}x{height}")))?;

        shipyards.sort_by_key(|&(id, _, _)| id);
        let mut players = Vec::with_capacity(num_players);
        for (expected, &(id, x, y)) in shipyards.iter().enumerate() {
            if usize::from(id) != expected || x >= width || y >= height {
                return Err(ProtocolError::Inconsistent(format!(
                    "player {id} shipyard at ({x}, {y})"
                )));
            }
            players.push(Player::new(id, Position::new(x, y), constants.initial_halite));
        }

        Ok(GameState::new(map, players, constants, my_id))
    }

    /// Read one turn frame into `state`.
    ///
    /// Returns `Ok(false)` when the engine has closed the stream before a new
    /// frame, which is how a game ends.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or a malformed frame.
    pub fn read_frame(&mut self, state: &mut GameState) -> Result<bool, ProtocolError> {
        let Some(token) = self.try_token()? else {
            return Ok(false);
        };
        state.turn = token.parse().map_err(|_| ProtocolError::BadToken {
            expected: "turn number",
            token,
        })?;

        let mut ships = BTreeMap::new();
        for _ in 0..state.players.len() {
            let id: PlayerId = self.parse("player id")?;
            let ship_count: usize = self.parse("ship count")?;
            let dropoff_count: usize = self.parse("dropoff count")?;
            let halite: u32 = self.parse("player halite")?;
            if ship_count > state.map.len() || dropoff_count > state.map.len() {
                return Err(ProtocolError::Inconsistent(format!(
                    "player {id} reports {ship_count} ships and {dropoff_count} dropoffs \
                     on {} cells",
                    state.map.len()
                )));
            }

            let mut dropoffs = Vec::with_capacity(dropoff_count);
            for _ in 0..ship_count {
                let ship_id = self.parse("ship id")?;
                let position = self.position(&state.map)?;
                let cargo = self.parse("ship halite")?;
                ships.insert(ship_id, Ship::new(ship_id, id, position, cargo));
            }
            for _ in 0..dropoff_count {
                let dropoff_id = self.parse("dropoff id")?;
                let position = self.position(&state.map)?;
                dropoffs.push(Structure {
                    id: dropoff_id,
                    owner: id,
                    position,
                    kind: StructureKind::Dropoff,
                });
            }

            let player = state
                .player_mut(id)
                .ok_or_else(|| ProtocolError::Inconsistent(format!("unknown player {id}")))?;
            player.halite = halite;
            player.dropoffs = dropoffs;
        }

        let updates: usize = self.parse("update count")?;
        for _ in 0..updates {
            let position = self.position(&state.map)?;
            let halite = self.parse("cell halite")?;
            state.map.at_mut(position).halite = halite;
        }

        state.ships = ships;
        state.stamp_structures();
        state.rebuild_occupancy();
        Ok(true)
    }
}

/// Writes the bot's name and per-turn commands to the engine.
#[derive(Debug)]
pub struct EngineWriter<W> {
    writer: W,
}

impl<W: Write> EngineWriter<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Answer the handshake with the bot name.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or flush fails.
    pub fn send_name(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.writer, "{name}")?;
        self.writer.flush()
    }

    /// Commit one turn's commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or flush fails.
    pub fn send_commands(&mut self, commands: &[Command]) -> io::Result<()> {
        let mut first = true;
        for command in commands {
            if !first {
                write!(self.writer, " ")?;
            }
            write!(self.writer, "{command}")?;
            first = false;
        }
        writeln!(self.writer)?;
        self.writer.flush()
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

//! Output formatting utilities for CLI.

// Averages over game counts are reported as floats
#![allow(clippy::cast_precision_loss)]

use haul::sim::GameResult;
use serde::Serialize;
use std::fmt::Write;

/// Aggregated results over many self-play games.
#[derive(Debug, Default)]
pub(super) struct SelfplayStats {
    /// Total games played.
    pub(super) games_played: u64,
    /// Games that ended in an error.
    pub(super) failures: u64,
    /// Win count per player.
    pub(super) wins: Vec<u64>,
    /// Draw count.
    pub(super) draws: u64,
    /// Total score per player.
    total_scores: Vec<f64>,
    /// Score sum of squares for std dev calculation.
    score_sq_sums: Vec<f64>,
    /// Ships built per player.
    ships_built: Vec<u64>,
    /// Ships lost per player.
    ships_lost: Vec<u64>,
    /// Dropoffs built per player.
    dropoffs_built: Vec<u64>,
    /// Total turns across all games.
    total_turns: u64,
}

impl SelfplayStats {
    /// Create new stats for n players.
    pub(super) fn new(num_players: usize) -> Self {
        Self {
            wins: vec![0; num_players],
            total_scores: vec![0.0; num_players],
            score_sq_sums: vec![0.0; num_players],
            ships_built: vec![0; num_players],
            ships_lost: vec![0; num_players],
            dropoffs_built: vec![0; num_players],
            ..Self::default()
        }
    }

    /// Number of players tracked.
    pub(super) fn players(&self) -> usize {
        self.wins.len()
    }

    /// Add a game result to the stats.
    pub(super) fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns_played);

        match result.winner.map(usize::from) {
            Some(idx) if idx < self.wins.len() => self.wins[idx] += 1,
            Some(_) => {}
            None => self.draws += 1,
        }

        for (i, stats) in result.player_stats.iter().enumerate().take(self.players()) {
            let score = f64::from(stats.final_halite);
            self.total_scores[i] += score;
            self.score_sq_sums[i] += score * score;
            self.ships_built[i] += u64::from(stats.ships_built);
            self.ships_lost[i] += u64::from(stats.ships_lost);
            self.dropoffs_built[i] += u64::from(stats.dropoffs_built);
        }
    }

    /// Record a game that could not be played.
    pub(super) fn add_failure(&mut self) {
        self.failures += 1;
    }

    /// Merge another accumulator into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.failures += other.failures;
        self.draws += other.draws;
        self.total_turns += other.total_turns;
        let sum_u64 = |a: &mut Vec<u64>, b: &[u64]| a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
        let sum_f64 = |a: &mut Vec<f64>, b: &[f64]| a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
        sum_u64(&mut self.wins, &other.wins);
        sum_u64(&mut self.ships_built, &other.ships_built);
        sum_u64(&mut self.ships_lost, &other.ships_lost);
        sum_u64(&mut self.dropoffs_built, &other.dropoffs_built);
        sum_f64(&mut self.total_scores, &other.total_scores);
        sum_f64(&mut self.score_sq_sums, &other.score_sq_sums);
    }

    /// Get win rate for a player (0.0-1.0).
    pub(super) fn win_rate(&self, player_idx: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(player_idx).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Get average score for a player.
    pub(super) fn avg_score(&self, player_idx: usize) -> f64 {
        self.per_game(self.total_scores.get(player_idx).copied().unwrap_or(0.0))
    }

    /// Get score standard deviation for a player.
    pub(super) fn score_std_dev(&self, player_idx: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        let mean = self.avg_score(player_idx);
        let sq_sum = self.score_sq_sums.get(player_idx).copied().unwrap_or(0.0);
        let variance = self.per_game(sq_sum) - mean * mean;
        variance.max(0.0).sqrt()
    }

    /// Average ships built, lost, and dropoffs built per game for a player.
    pub(super) fn avg_fleet(&self, player_idx: usize) -> (f64, f64, f64) {
        let avg = |v: &[u64]| self.per_game(v.get(player_idx).copied().unwrap_or(0) as f64);
        (
            avg(&self.ships_built),
            avg(&self.ships_lost),
            avg(&self.dropoffs_built),
        )
    }

    /// Get average game length.
    pub(super) fn avg_turns(&self) -> f64 {
        self.per_game(self.total_turns as f64)
    }

    fn per_game(&self, total: f64) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            total / self.games_played as f64
        }
    }
}

/// JSON-serializable self-play result.
#[derive(Debug, Serialize)]
pub(super) struct JsonSelfplayResult {
    /// Total games played.
    games_played: u64,
    /// Games that failed to run.
    failures: u64,
    /// Number of draws.
    draws: u64,
    /// Average game length in turns.
    avg_turns: f64,
    /// Per-player statistics.
    players: Vec<JsonSelfplayPlayer>,
}

/// JSON-serializable per-player stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonSelfplayPlayer {
    /// Player id (0-based, as the engine numbers them).
    player: usize,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average final halite.
    avg_score: f64,
    /// Final halite standard deviation.
    score_std_dev: f64,
    /// Average ships built per game.
    avg_ships_built: f64,
    /// Average ships lost per game.
    avg_ships_lost: f64,
    /// Average dropoffs built per game.
    avg_dropoffs: f64,
}

impl JsonSelfplayResult {
    /// Create from aggregated stats.
    pub(super) fn from_stats(stats: &SelfplayStats) -> Self {
        let players = (0..stats.players())
            .map(|i| {
                let (built, lost, dropoffs) = stats.avg_fleet(i);
                JsonSelfplayPlayer {
                    player: i,
                    wins: stats.wins[i],
                    win_rate: stats.win_rate(i),
                    avg_score: stats.avg_score(i),
                    score_std_dev: stats.score_std_dev(i),
                    avg_ships_built: built,
                    avg_ships_lost: lost,
                    avg_dropoffs: dropoffs,
                }
            })
            .collect();
        Self {
            games_played: stats.games_played,
            failures: stats.failures,
            draws: stats.draws,
            avg_turns: stats.avg_turns(),
            players,
        }
    }
}

/// Format self-play stats as human-readable text.
pub(super) fn format_selfplay_text(stats: &SelfplayStats, labels: &[String]) -> String {
    let mut output = String::new();
    let games = stats.games_played.max(1) as f64;

    let _ = writeln!(output, "Self-play Results ({} games)", stats.games_played);
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for (i, label) in labels.iter().enumerate() {
        let _ = writeln!(
            output,
            "  Player {i} ({label}): {:.1}% ({} wins)",
            stats.win_rate(i) * 100.0,
            stats.wins.get(i).copied().unwrap_or(0)
        );
    }
    let _ = writeln!(
        output,
        "  Draws: {} ({:.1}%)\n",
        stats.draws,
        stats.draws as f64 / games * 100.0
    );

    output.push_str("Average Halite:\n");
    for (i, label) in labels.iter().enumerate() {
        let _ = writeln!(
            output,
            "  Player {i} ({label}): {:.1} (+/- {:.1})",
            stats.avg_score(i),
            stats.score_std_dev(i)
        );
    }

    output.push_str("\nFleet (per game):\n");
    for (i, label) in labels.iter().enumerate() {
        let (built, lost, dropoffs) = stats.avg_fleet(i);
        let _ = writeln!(
            output,
            "  Player {i} ({label}): {built:.1} built, {lost:.1} lost, {dropoffs:.1} dropoffs"
        );
    }

    let _ = writeln!(output, "\nAverage Game Length: {:.0} turns", stats.avg_turns());
    if stats.failures > 0 {
        let _ = writeln!(output, "Failed games: {}", stats.failures);
    }
    output
}

/// Format self-play stats as CSV.
pub(super) fn format_selfplay_csv(stats: &SelfplayStats, labels: &[String]) -> String {
    let mut output = String::new();
    output.push_str("player,label,wins,win_rate,avg_score,score_std_dev,ships_built,ships_lost,dropoffs\n");
    for (i, label) in labels.iter().enumerate() {
        let (built, lost, dropoffs) = stats.avg_fleet(i);
        let _ = writeln!(
            output,
            "{i},{label},{},{:.4},{:.2},{:.2},{built:.2},{lost:.2},{dropoffs:.2}",
            stats.wins.get(i).copied().unwrap_or(0),
            stats.win_rate(i),
            stats.avg_score(i),
            stats.score_std_dev(i),
        );
    }
    output
}

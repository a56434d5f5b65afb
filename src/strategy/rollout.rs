//! Monte-Carlo evaluation of a unit's immediate moves.
//!
//! For each legal first move the evaluator plays out random walks toward the
//! unit's destination under the real mining and movement rules and keeps the
//! best result seen. The walks only ever take legal moves: staying where the
//! cell still holds halite, or stepping closer to the destination when the
//! unit can pay for it.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::RolloutConfig;
use crate::game::{Constants, Direction, GameMap, Position};
use crate::strategy::deadline::Deadline;
use crate::strategy::fleet::Task;

/// Ranked values of a unit's five immediate actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preferences {
    values: [Option<f64>; 5],
    sampled: bool,
}

impl Preferences {
    /// Build from per-direction values indexed by [`Direction::index`].
    #[must_use]
    pub const fn from_values(values: [Option<f64>; 5], sampled: bool) -> Self {
        Self { values, sampled }
    }

    /// Value of an action, `None` when it is illegal.
    #[must_use]
    pub const fn value(&self, dir: Direction) -> Option<f64> {
        self.values[dir.index()]
    }

    /// Whether the values came from sampling rather than the distance fallback.
    #[must_use]
    pub const fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// Legal actions.
    pub fn legal(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(|d| self.values[d.index()].is_some())
    }

    /// Highest-valued action; staying wins ties.
    #[must_use]
    pub fn best(&self) -> Direction {
        let mut best = (Direction::Still, f64::NEG_INFINITY);
        for dir in Direction::ALL {
            if let Some(v) = self.value(dir)
                && v > best.1
            {
                best = (dir, v);
            }
        }
        best.0
    }

    /// Value rescaled so the worst legal action is 0 and the best is 1.
    #[must_use]
    pub fn normalized(&self, dir: Direction) -> Option<f64> {
        let value = self.value(dir)?;
        let (lo, hi) = self
            .values
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if hi - lo <= f64::EPSILON {
            Some(1.0)
        } else {
            Some((value - lo) / (hi - lo))
        }
    }
}

/// Everything a walk needs to know about the unit and the board.
#[derive(Debug, Clone, Copy)]
pub struct RolloutInput<'a> {
    /// The board.
    pub map: &'a GameMap,
    /// Rule constants.
    pub constants: &'a Constants,
    /// Per-cell inspiration flags for our ships.
    pub inspired: &'a [bool],
    /// Where the unit stands.
    pub start: Position,
    /// Cargo carried now.
    pub cargo: u32,
    /// Harvest target or base.
    pub destination: Position,
    /// The unit's task, which selects the stopping rule and metric.
    pub task: Task,
    /// Cargo at which an exploring walk ends.
    pub return_threshold: u32,
}

#[derive(Debug, Clone)]
struct Walk {
    pos: Position,
    cargo: u32,
    turns: u32,
    mined: Vec<(usize, u32)>,
}

impl Walk {
    fn halite(&self, input: &RolloutInput<'_>, idx: usize) -> u32 {
        self.mined
            .iter()
            .rev()
            .find(|&&(i, _)| i == idx)
            .map_or_else(|| input.map.cells()[idx].halite, |&(_, h)| h)
    }

    fn apply(&mut self, input: &RolloutInput<'_>, dir: Direction) {
        let idx = input.map.index(self.pos);
        let here = self.halite(input, idx);
        if dir == Direction::Still {
            let (removed, gained) = input.constants.mine(here, self.cargo, input.inspired[idx]);
            self.mined.push((idx, here - removed));
            self.cargo += gained;
        } else {
            self.cargo -= input.constants.move_cost(here);
            self.pos = input.map.offset(self.pos, dir);
        }
        self.turns += 1;
    }

    fn can_pay(&self, input: &RolloutInput<'_>) -> bool {
        let here = self.halite(input, input.map.index(self.pos));
        self.cargo >= input.constants.move_cost(here)
    }

    fn moves(&self, input: &RolloutInput<'_>) -> Vec<Direction> {
        let mut moves = Vec::with_capacity(3);
        if self.halite(input, input.map.index(self.pos)) > 0 {
            moves.push(Direction::Still);
        }
        if self.can_pay(input) {
            moves.extend(input.map.approach_directions(self.pos, input.destination));
        }
        moves
    }

    fn finished(&self, input: &RolloutInput<'_>) -> bool {
        match input.task {
            Task::Explore => self.cargo >= input.return_threshold,
            Task::Return | Task::HardReturn => self.pos == input.destination,
        }
    }

    fn score(&self, input: &RolloutInput<'_>) -> f64 {
        let turns = f64::from(self.turns.max(1));
        match input.task {
            Task::Explore => (f64::from(self.cargo) - f64::from(input.cargo)) / turns,
            Task::Return | Task::HardReturn if self.pos == input.destination => {
                f64::from(self.cargo) / (turns * turns)
            }
            Task::Return | Task::HardReturn => 0.0,
        }
    }
}

fn weight(input: &RolloutInput<'_>, walk: &Walk, dir: Direction) -> f64 {
    let next = input.map.offset(walk.pos, dir);
    1.0 + f64::from(walk.halite(input, input.map.index(next)))
}

fn play_out<R: Rng>(
    input: &RolloutInput<'_>,
    config: &RolloutConfig,
    first: Direction,
    rng: &mut R,
) -> f64 {
    let mut walk = Walk {
        pos: input.start,
        cargo: input.cargo,
        turns: 0,
        mined: Vec::new(),
    };
    walk.apply(input, first);
    while walk.turns < config.turn_cap && !walk.finished(input) {
        let moves = walk.moves(input);
        let choice = match moves.len() {
            0 => break,
            1 => moves[0],
            n if config.weighted => {
                let weights: Vec<f64> = moves.iter().map(|&d| weight(input, &walk, d)).collect();
                match WeightedIndex::new(&weights) {
                    Ok(dist) => moves[dist.sample(rng)],
                    Err(_) => moves[rng.gen_range(0..n)],
                }
            }
            n => moves[rng.gen_range(0..n)],
        };
        walk.apply(input, choice);
    }
    walk.score(input)
}

/// First moves the unit may take: staying, or any cardinal it can pay for.
#[must_use]
pub fn first_moves(input: &RolloutInput<'_>) -> Vec<Direction> {
    let here = input.map.halite(input.start);
    let mut moves = vec![Direction::Still];
    if input.cargo >= input.constants.move_cost(here) {
        moves.extend(Direction::CARDINALS);
    }
    moves
}

/// Sample walks for every legal first move and keep the best value of each.
///
/// The sample count shrinks with the deadline's remaining slack. If the
/// deadline leaves any legal move unsampled, the distance fallback is
/// returned instead.
pub fn evaluate<R: Rng>(
    input: &RolloutInput<'_>,
    config: &RolloutConfig,
    deadline: &Deadline,
    rng: &mut R,
) -> Preferences {
    let moves = first_moves(input);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let samples = ((config.samples_per_move as f64) * deadline.slack()).ceil() as usize;
    let poll = config.poll_interval.max(1);

    let mut values = [None; 5];
    let mut taken = 0_usize;
    'sampling: for _ in 0..samples {
        for &first in &moves {
            if taken % poll == 0 && deadline.expired() {
                break 'sampling;
            }
            let value = play_out(input, config, first, rng);
            let slot: &mut Option<f64> = &mut values[first.index()];
            *slot = Some(slot.map_or(value, |best: f64| best.max(value)));
            taken += 1;
        }
    }

    if moves.iter().any(|d| values[d.index()].is_none()) {
        return heuristic(input);
    }
    Preferences::from_values(values, true)
}

/// Deterministic preferences: closer to the destination is better.
#[must_use]
pub fn heuristic(input: &RolloutInput<'_>) -> Preferences {
    let mut values = [None; 5];
    for dir in first_moves(input) {
        let next = input.map.offset(input.start, dir);
        values[dir.index()] = Some(-f64::from(input.map.distance(next, input.destination)));
    }
    Preferences::from_values(values, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn input<'a>(
        map: &'a GameMap,
        constants: &'a Constants,
        inspired: &'a [bool],
        start: Position,
        cargo: u32,
        destination: Position,
        task: Task,
    ) -> RolloutInput<'a> {
        RolloutInput {
            map,
            constants,
            inspired,
            start,
            cargo,
            destination,
            task,
            return_threshold: 950,
        }
    }

    #[test]
    fn test_returning_unit_prefers_stepping_onto_base() {
        let map = GameMap::new(8, 8).unwrap();
        let constants = Constants::default();
        let inspired = vec![false; map.len()];
        let rollout = input(
            &map,
            &constants,
            &inspired,
            Position::new(3, 2),
            800,
            Position::new(2, 2),
            Task::Return,
        );
        let mut rng = SmallRng::seed_from_u64(7);
        let prefs = evaluate(&rollout, &RolloutConfig::default(), &Deadline::unlimited(), &mut rng);
        assert!(prefs.is_sampled());
        assert_eq!(prefs.best(), Direction::West);
        assert_eq!(prefs.normalized(Direction::West), Some(1.0));
    }

    #[test]
    fn test_explorer_on_rich_cell_stays() {
        let mut map = GameMap::new(8, 8).unwrap();
        map.at_mut(Position::new(4, 4)).halite = 800;
        let constants = Constants::default();
        let inspired = vec![false; map.len()];
        let rollout = input(
            &map,
            &constants,
            &inspired,
            Position::new(4, 4),
            0,
            Position::new(4, 4),
            Task::Explore,
        );
        let mut rng = SmallRng::seed_from_u64(1);
        let prefs = evaluate(&rollout, &RolloutConfig::default(), &Deadline::unlimited(), &mut rng);
        assert_eq!(prefs.best(), Direction::Still);
    }

    #[test]
    fn test_broke_unit_may_only_stay() {
        let mut map = GameMap::new(8, 8).unwrap();
        map.at_mut(Position::new(1, 1)).halite = 500;
        let constants = Constants::default();
        let inspired = vec![false; map.len()];
        let rollout = input(
            &map,
            &constants,
            &inspired,
            Position::new(1, 1),
            10,
            Position::new(5, 5),
            Task::Explore,
        );
        let mut rng = SmallRng::seed_from_u64(3);
        let prefs = evaluate(&rollout, &RolloutConfig::default(), &Deadline::unlimited(), &mut rng);
        assert_eq!(prefs.legal().collect::<Vec<_>>(), vec![Direction::Still]);
    }

    #[test]
    fn test_expired_deadline_falls_back_to_distance() {
        let map = GameMap::new(8, 8).unwrap();
        let constants = Constants::default();
        let inspired = vec![false; map.len()];
        let rollout = input(
            &map,
            &constants,
            &inspired,
            Position::new(0, 0),
            0,
            Position::new(0, 3),
            Task::Explore,
        );
        let mut rng = SmallRng::seed_from_u64(3);
        let prefs = evaluate(
            &rollout,
            &RolloutConfig::default(),
            &Deadline::after(Duration::ZERO),
            &mut rng,
        );
        assert!(!prefs.is_sampled());
        assert_eq!(prefs.best(), Direction::South);
        assert_eq!(prefs.normalized(Direction::North), Some(0.0));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut map = GameMap::new(16, 16).unwrap();
        for (i, cell) in map.cells_mut().iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let h = ((i * 37) % 400) as u32;
            cell.halite = h;
        }
        let constants = Constants::default();
        let inspired = vec![false; map.len()];
        let rollout = input(
            &map,
            &constants,
            &inspired,
            Position::new(3, 3),
            200,
            Position::new(9, 12),
            Task::Explore,
        );
        let config = RolloutConfig::default();
        let a = evaluate(&rollout, &config, &Deadline::unlimited(), &mut SmallRng::seed_from_u64(11));
        let b = evaluate(&rollout, &config, &Deadline::unlimited(), &mut SmallRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_inspired_cell_is_worth_more() {
        let mut map = GameMap::new(8, 8).unwrap();
        map.at_mut(Position::new(2, 2)).halite = 400;
        let constants = Constants::default();
        let plain = vec![false; map.len()];
        let mut inspired = plain.clone();
        inspired[map.index(Position::new(2, 2))] = true;
        let config = RolloutConfig::default();
        let start = Position::new(2, 2);

        let a = input(&map, &constants, &plain, start, 0, start, Task::Explore);
        let b = input(&map, &constants, &inspired, start, 0, start, Task::Explore);
        let pa = evaluate(&a, &config, &Deadline::unlimited(), &mut SmallRng::seed_from_u64(5));
        let pb = evaluate(&b, &config, &Deadline::unlimited(), &mut SmallRng::seed_from_u64(5));
        assert!(pb.value(Direction::Still) > pa.value(Direction::Still));
    }
}

//! Toroidal grid, positions, and cells.

use crate::game::{PlayerId, ShipId, StructureId};

/// A position on the grid, always normalized into `0..width` × `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the five actions a ship can take in place or toward a neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward decreasing y.
    North,
    /// Toward increasing y.
    South,
    /// Toward increasing x.
    East,
    /// Toward decreasing x.
    West,
    /// No movement.
    Still,
}

impl Direction {
    /// The four cardinal directions.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Still followed by the four cardinals, the order used for per-direction tables.
    pub const ALL: [Direction; 5] = [
        Direction::Still,
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Offset applied to a position when moving in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::Still => (0, 0),
        }
    }

    /// Index of this direction within [`Direction::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Direction::Still => 0,
            Direction::North => 1,
            Direction::South => 2,
            Direction::East => 3,
            Direction::West => 4,
        }
    }

    /// Wire character used by the engine protocol.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Direction::North => 'n',
            Direction::South => 's',
            Direction::East => 'e',
            Direction::West => 'w',
            Direction::Still => 'o',
        }
    }

    /// Parse a wire character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Direction::North),
            's' => Some(Direction::South),
            'e' => Some(Direction::East),
            'w' => Some(Direction::West),
            'o' => Some(Direction::Still),
            _ => None,
        }
    }
}

/// Kind of a banking structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    /// The player's home base, where new ships appear.
    Shipyard,
    /// A secondary base built by converting a ship.
    Dropoff,
}

/// Reference from a cell to the structure standing on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureRef {
    /// Owning player.
    pub owner: PlayerId,
    /// Structure identifier (shipyards use the owner id).
    pub id: StructureId,
    /// Shipyard or dropoff.
    pub kind: StructureKind,
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cell {
    /// Halite remaining on the cell.
    pub halite: u32,
    /// Ship standing on the cell at the start of the turn.
    pub occupant: Option<ShipId>,
    /// Structure on the cell, set once.
    pub structure: Option<StructureRef>,
}

/// The toroidal game map.
#[derive(Debug, Clone)]
pub struct GameMap {
    /// Width of the map in cells.
    width: u16,
    /// Height of the map in cells.
    height: u16,
    /// Cells stored in row-major order.
    cells: Vec<Cell>,
}

impl GameMap {
    /// Create a new map with zero halite everywhere.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let size = usize::from(width) * usize::from(height);
        Some(Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        })
    }

    /// Create a map from row-major halite values.
    ///
    /// Returns `None` if the dimensions are zero or the value count is wrong.
    #[must_use]
    pub fn from_halite(width: u16, height: u16, halite: &[u32]) -> Option<Self> {
        let mut map = Self::new(width, height)?;
        if halite.len() != map.cells.len() {
            return None;
        }
        for (cell, &h) in map.cells.iter_mut().zip(halite) {
            cell.halite = h;
        }
        Some(map)
    }

    /// Width of the map.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height of the map.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the map has no cells (never true for a constructed map).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Raw cells in row-major order.
    #[must_use]
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable raw cells in row-major order.
    #[must_use]
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Wrap signed coordinates onto the torus.
    #[must_use]
    pub fn normalize(&self, x: i32, y: i32) -> Position {
        let w = i32::from(self.width);
        let h = i32::from(self.height);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pos = Position::new(x.rem_euclid(w) as u16, y.rem_euclid(h) as u16);
        pos
    }

    /// Index of a position into the cell array.
    #[must_use]
    #[inline]
    pub fn index(&self, pos: Position) -> usize {
        usize::from(pos.y) * usize::from(self.width) + usize::from(pos.x)
    }

    /// Position of a cell index.
    #[must_use]
    #[inline]
    pub fn position(&self, index: usize) -> Position {
        let w = usize::from(self.width);
        #[allow(clippy::cast_possible_truncation)]
        let pos = Position::new((index % w) as u16, (index / w) as u16);
        pos
    }

    /// The cell at a position.
    #[must_use]
    #[inline]
    pub fn at(&self, pos: Position) -> &Cell {
        &self.cells[self.index(pos)]
    }

    /// The mutable cell at a position.
    #[must_use]
    #[inline]
    pub fn at_mut(&mut self, pos: Position) -> &mut Cell {
        let idx = self.index(pos);
        &mut self.cells[idx]
    }

    /// Halite on the cell at a position.
    #[must_use]
    #[inline]
    pub fn halite(&self, pos: Position) -> u32 {
        self.at(pos).halite
    }

    /// Neighbouring position in a direction, wrapping around the edges.
    #[must_use]
    pub fn offset(&self, pos: Position, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        self.normalize(i32::from(pos.x) + dx, i32::from(pos.y) + dy)
    }

    /// The four cardinal neighbours, in [`Direction::CARDINALS`] order.
    #[must_use]
    pub fn neighbours(&self, pos: Position) -> [Position; 4] {
        Direction::CARDINALS.map(|d| self.offset(pos, d))
    }

    /// Per-axis wrapped distances between two positions.
    #[must_use]
    pub fn axis_distances(&self, a: Position, b: Position) -> (u32, u32) {
        let dx = u32::from(a.x.abs_diff(b.x));
        let dy = u32::from(a.y.abs_diff(b.y));
        (
            dx.min(u32::from(self.width) - dx),
            dy.min(u32::from(self.height) - dy),
        )
    }

    /// Manhattan distance with wraparound.
    #[must_use]
    pub fn distance(&self, a: Position, b: Position) -> u32 {
        let (dx, dy) = self.axis_distances(a, b);
        dx + dy
    }

    /// Directions from `from` that strictly reduce the distance to `to`.
    ///
    /// Ties between going around either way (exactly half the map) yield both.
    #[must_use]
    pub fn approach_directions(&self, from: Position, to: Position) -> Vec<Direction> {
        let current = self.distance(from, to);
        Direction::CARDINALS
            .into_iter()
            .filter(|&d| self.distance(self.offset(from, d), to) < current)
            .collect()
    }

    /// Direction that moves `from` onto the adjacent `to`, if they are neighbours.
    #[must_use]
    pub fn direction_to_neighbour(&self, from: Position, to: Position) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&d| self.offset(from, d) == to)
    }

    /// Iterate over all positions and cells.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| (self.position(idx), cell))
    }

    /// Total halite left on the map.
    #[must_use]
    pub fn total_halite(&self) -> u64 {
        self.cells.iter().map(|c| u64::from(c.halite)).sum()
    }

    /// Clear all ship occupancy, keeping halite and structures.
    pub fn clear_occupants(&mut self) {
        for cell in &mut self.cells {
            cell.occupant = None;
        }
    }

    /// Structures owned by a player.
    pub fn structures_owned_by(
        &self,
        player: PlayerId,
    ) -> impl Iterator<Item = (Position, StructureRef)> + '_ {
        self.iter().filter_map(move |(pos, cell)| {
            cell.structure
                .filter(|s| s.owner == player)
                .map(|s| (pos, s))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_wraps() {
        let map = GameMap::new(8, 8).unwrap();
        assert_eq!(map.distance(Position::new(0, 0), Position::new(4, 4)), 8);
        assert_eq!(map.distance(Position::new(0, 0), Position::new(7, 7)), 2);
        assert_eq!(map.distance(Position::new(1, 6), Position::new(6, 1)), 6);
    }

    #[test]
    fn test_offset_wraps() {
        let map = GameMap::new(8, 6).unwrap();
        let p = Position::new(0, 0);
        assert_eq!(map.offset(p, Direction::North), Position::new(0, 5));
        assert_eq!(map.offset(p, Direction::West), Position::new(7, 0));
        assert_eq!(map.offset(p, Direction::Still), p);
    }

    #[test]
    fn test_index_round_trip() {
        let map = GameMap::new(10, 7).unwrap();
        for idx in 0..map.len() {
            assert_eq!(map.index(map.position(idx)), idx);
        }
    }

    #[test]
    fn test_zero_size() {
        assert!(GameMap::new(0, 10).is_none());
        assert!(GameMap::new(10, 0).is_none());
    }

    #[test]
    fn test_from_halite_length_check() {
        assert!(GameMap::from_halite(2, 2, &[1, 2, 3]).is_none());
        let map = GameMap::from_halite(2, 2, &[1, 2, 3, 4]).unwrap();
        assert_eq!(map.halite(Position::new(1, 1)), 4);
        assert_eq!(map.total_halite(), 10);
    }

    #[test]
    fn test_approach_directions() {
        let map = GameMap::new(8, 8).unwrap();
        let dirs = map.approach_directions(Position::new(0, 0), Position::new(2, 6));
        assert!(dirs.contains(&Direction::East));
        assert!(dirs.contains(&Direction::North));
        assert_eq!(dirs.len(), 2);

        // Exactly half way around: both ways shorten the trip.
        let dirs = map.approach_directions(Position::new(0, 0), Position::new(4, 0));
        assert!(dirs.contains(&Direction::East));
        assert!(dirs.contains(&Direction::West));
        assert!(map.approach_directions(Position::new(3, 3), Position::new(3, 3)).is_empty());
    }

    #[test]
    fn test_direction_to_neighbour() {
        let map = GameMap::new(5, 5).unwrap();
        let p = Position::new(0, 0);
        assert_eq!(map.direction_to_neighbour(p, Position::new(4, 0)), Some(Direction::West));
        assert_eq!(map.direction_to_neighbour(p, p), Some(Direction::Still));
        assert_eq!(map.direction_to_neighbour(p, Position::new(2, 2)), None);
    }

    #[test]
    fn test_direction_chars() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_char(d.as_char()), Some(d));
        }
        assert_eq!(Direction::from_char('x'), None);
    }
}

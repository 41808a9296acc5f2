use serde::{Deserialize, Serialize};

/// A single grid address. Rows grow southward, columns grow eastward.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Cell { row, col }
    }

    pub fn step(self, direction: Direction) -> Cell {
        let (dr, dc) = direction.delta();
        Cell {
            row: self.row + dr,
            col: self.col + dc,
        }
    }

    /// 8-directional grid distance.
    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.row - other.row)
            .abs()
            .max((self.col - other.col).abs())
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

/// Neighbor expansion order. Pathfinding fixtures depend on it.
pub const DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
    Direction::Northeast,
    Direction::Northwest,
    Direction::Southeast,
    Direction::Southwest,
];

impl Direction {
    /// (row delta, col delta); north decreases the row.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
            Direction::Northeast => (-1, 1),
            Direction::Northwest => (-1, -1),
            Direction::Southeast => (1, 1),
            Direction::Southwest => (1, -1),
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::South => "s",
            Direction::East => "e",
            Direction::West => "w",
            Direction::Northeast => "ne",
            Direction::Northwest => "nw",
            Direction::Southeast => "se",
            Direction::Southwest => "sw",
        }
    }

    pub fn from_abbreviation(value: &str) -> Option<Direction> {
        DIRECTIONS
            .iter()
            .copied()
            .find(|direction| direction.abbreviation() == value)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Northeast => Direction::Southwest,
            Direction::Northwest => Direction::Southeast,
            Direction::Southeast => Direction::Northwest,
            Direction::Southwest => Direction::Northeast,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::Northeast
                | Direction::Northwest
                | Direction::Southeast
                | Direction::Southwest
        )
    }
}

/// Cells occupied by an entity anchored at `origin`, row-major.
pub fn footprint(origin: Cell, width: i32, height: i32) -> Vec<Cell> {
    let mut cells = Vec::new();
    for row in 0..height.max(1) {
        for col in 0..width.max(1) {
            cells.push(Cell::new(origin.row + row, origin.col + col));
        }
    }
    cells
}

/// Minimum pairwise chebyshev distance between two footprints.
pub fn footprint_distance(a: &[Cell], b: &[Cell]) -> i32 {
    let mut best = i32::MAX;
    for ca in a {
        for cb in b {
            best = best.min(ca.chebyshev(*cb));
        }
    }
    best
}

/// Negative range means unlimited.
pub fn entity_in_range(a: &[Cell], b: &[Cell], range: i32) -> bool {
    if range < 0 {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }
    footprint_distance(a, b) <= range
}

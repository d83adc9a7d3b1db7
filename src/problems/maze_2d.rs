use derive_more::Display;
use thiserror::Error;

use crate::problem::Problem;
use crate::space::Action;
use crate::space::Neighbours;
use crate::space::ObjectiveHeuristic;
use crate::space::Space;
use crate::space::State;

const MAX_ELEMENTS_DISPLAYED: usize = 80;
const MIN_SIDE: usize = 2;

pub type Coord = usize;

/// A cell position, row first.
///
/// Ordering is row-major.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("({row},{col})")]
pub struct GridState {
    pub row: Coord,
    pub col: Coord,
}

impl GridState {
    #[inline(always)]
    pub const fn new(row: Coord, col: Coord) -> Self {
        Self { row, col }
    }
}
impl State for GridState {}

impl From<(Coord, Coord)> for GridState {
    fn from((row, col): (Coord, Coord)) -> Self {
        Self::new(row, col)
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GridMove {
    #[display("↑")]
    Up = 0, // row--
    #[display("↓")]
    Down = 1, // row++
    #[display("←")]
    Left = 2, // col--
    #[display("→")]
    Right = 3, // col++
}
impl Action for GridMove {}

impl GridMove {
    /// All moves, in tie-breaking order.
    pub const ALL: [GridMove; 4] = [GridMove::Up, GridMove::Down, GridMove::Left, GridMove::Right];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The `(row, col)` offset as wrapping deltas.
    #[inline(always)]
    const fn delta(self) -> (Coord, Coord) {
        const PREV: Coord = Coord::MAX;
        const SAME: Coord = 0;
        const NEXT: Coord = 1;

        #[rustfmt::skip]
        let delta = match self {
            GridMove::Up    => (PREV, SAME),
            GridMove::Down  => (NEXT, SAME),
            GridMove::Left  => (SAME, PREV),
            GridMove::Right => (SAME, NEXT),
        };
        delta
    }
}

pub type GridCost = u32;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum GridCell {
    #[display("░")]
    Open,
    #[display("█")]
    Wall,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridCellParseError {
    #[error("Invalid character '{0}' found.")]
    InvalidCharacter(char),
}

impl std::convert::TryFrom<char> for GridCell {
    type Error = GridCellParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            ' ' | '.' | '░' => Ok(GridCell::Open),
            '#' | '█' => Ok(GridCell::Wall),
            ch => Err(GridCellParseError::InvalidCharacter(ch)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Maze is {height}x{width}, but both sides must be at least 2")]
    TooSmall { height: usize, width: usize },
    #[error("Row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid cell {e} found at ({row},{col})")]
    InvalidCell {
        e: GridCellParseError,
        row: usize,
        col: usize,
    },
    #[error("Expected exactly one '{mark}' mark, found {found}")]
    Marks { mark: char, found: usize },
}

/// An immutable rectangular grid of open and wall cells.
///
/// By convention the entry is `(1, 0)` and the exit is `(height-2, width-1)`.
#[derive(Clone, PartialEq, Eq)]
pub struct GridMaze {
    map: Vec<Vec<GridCell>>,
}

impl GridMaze {
    pub fn new_from_map(map: Vec<Vec<GridCell>>) -> Result<Self, MazeParseError> {
        let height = map.len();
        let width = map.first().map_or(0, Vec::len);
        if height < MIN_SIDE || width < MIN_SIDE {
            return Err(MazeParseError::TooSmall { height, width });
        }
        if let Some((row, line)) = map.iter().enumerate().find(|(_, l)| l.len() != width) {
            return Err(MazeParseError::Ragged {
                row,
                expected: width,
                found: line.len(),
            });
        }
        Ok(Self { map })
    }

    /// Builds a maze from a map already known to be rectangular and big enough.
    pub(crate) fn new_unchecked(map: Vec<Vec<GridCell>>) -> Self {
        debug_assert!(map.len() >= MIN_SIDE);
        debug_assert!(map.iter().all(|l| l.len() == map[0].len()));
        Self { map }
    }

    #[inline(always)]
    pub fn height(&self) -> usize {
        self.map.len()
    }
    #[inline(always)]
    pub fn width(&self) -> usize {
        self.map[0].len()
    }
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    #[inline(always)]
    pub fn entry(&self) -> GridState {
        GridState::new(1, 0)
    }
    #[inline(always)]
    pub fn exit(&self) -> GridState {
        GridState::new(self.height() - 2, self.width() - 1)
    }

    #[inline(always)]
    pub fn in_bounds(&self, row: Coord, col: Coord) -> bool {
        row < self.height() && col < self.width()
    }

    /// Whether `(row, col)` is inside the maze and not a wall.
    #[inline(always)]
    pub fn is_passable(&self, row: Coord, col: Coord) -> bool {
        self.in_bounds(row, col) && self.map[row][col] == GridCell::Open
    }

    /// All passable cells, row-major.
    pub fn passable_states(&self) -> impl Iterator<Item = GridState> + '_ {
        self.map.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter(|(_, c)| **c == GridCell::Open)
                .map(move |(col, _)| GridState::new(row, col))
        })
    }

    pub fn count_passable(&self) -> usize {
        self.passable_states().count()
    }

    /// Whether every border cell other than entry and exit is a wall.
    pub fn border_is_sealed(&self) -> bool {
        let (h, w) = self.dimensions();
        let (entry, exit) = (self.entry(), self.exit());
        (0..h)
            .flat_map(|row| (0..w).map(move |col| GridState::new(row, col)))
            .filter(|s| s.row == 0 || s.col == 0 || s.row == h - 1 || s.col == w - 1)
            .filter(|s| *s != entry && *s != exit)
            .all(|s| self.map[s.row][s.col] == GridCell::Wall)
    }
}

impl Space<GridState, GridMove, GridCost> for GridMaze {
    #[inline(always)]
    fn apply(&self, state: &GridState, action: &GridMove) -> Option<GridState> {
        let (dr, dc) = action.delta();
        let s = GridState::new(state.row.wrapping_add(dr), state.col.wrapping_add(dc));
        self.is_passable(s.row, s.col).then_some(s)
    }

    #[inline(always)]
    fn valid(&self, state: &GridState) -> bool {
        self.is_passable(state.row, state.col)
    }

    /// Gets the passable neighbours of a given position, in `GridMove::ALL`
    /// order.
    fn neighbours(&self, state: &GridState) -> Neighbours<GridState, GridMove> {
        GridMove::ALL
            .iter()
            .filter_map(|a| self.apply(state, a).map(|s| (s, *a)))
            .collect()
    }
}

impl std::convert::TryFrom<&str> for GridMaze {
    type Error = MazeParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let lines: Vec<&str> = s.lines().filter(|l| !l.is_empty()).collect();
        if lines.is_empty() {
            return Err(MazeParseError::EmptyInput);
        }

        let mut map = Vec::with_capacity(lines.len());
        for (row, line) in lines.iter().enumerate() {
            let cells = line
                .chars()
                .enumerate()
                .map(|(col, ch)| {
                    GridCell::try_from(ch).map_err(|e| MazeParseError::InvalidCell { e, row, col })
                })
                .collect::<Result<Vec<_>, _>>()?;
            map.push(cells);
        }

        GridMaze::new_from_map(map)
    }
}

impl std::fmt::Display for GridMaze {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let d = self.dimensions();
        writeln!(f, "GridMaze({}x{}):", d.0, d.1)?;
        for line in self.map.iter().take(MAX_ELEMENTS_DISPLAYED) {
            for cell in line.iter().take(MAX_ELEMENTS_DISPLAYED) {
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for GridMaze {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "GridMaze{:?}", self.dimensions())
    }
}

/// A maze together with one start and one goal.
#[derive(Clone, Debug)]
pub struct GridProblem<'m> {
    maze: &'m GridMaze,
    start: GridState,
    goal: GridState,
}

impl<'m> GridProblem<'m> {
    pub fn new(maze: &'m GridMaze, start: GridState, goal: GridState) -> Self {
        Self { maze, start, goal }
    }

    /// The entry to exit problem of a maze.
    pub fn entry_to_exit(maze: &'m GridMaze) -> Self {
        Self::new(maze, maze.entry(), maze.exit())
    }
}

impl Problem<GridMaze, GridState, GridMove, GridCost> for GridProblem<'_> {
    fn space(&self) -> &GridMaze {
        self.maze
    }
    fn start(&self) -> GridState {
        self.start
    }
    fn goal(&self) -> GridState {
        self.goal
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum GridProblemCell {
    Cell(GridCell),
    #[display("S")]
    Start,
    #[display("G")]
    Goal,
}

impl std::convert::TryFrom<char> for GridProblemCell {
    type Error = GridCellParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            'S' => Ok(GridProblemCell::Start),
            'G' => Ok(GridProblemCell::Goal),
            ch => Ok(GridProblemCell::Cell(GridCell::try_from(ch)?)),
        }
    }
}

/// Parses a maze where `S` and `G` mark (open) start and goal cells.
///
/// Returns the maze, the start and the goal.
pub fn parse_problem(s: &str) -> Result<(GridMaze, GridState, GridState), MazeParseError> {
    let mut starts = vec![];
    let mut goals = vec![];
    let mut map = vec![];

    for (row, line) in s.lines().filter(|l| !l.is_empty()).enumerate() {
        let mut cells = Vec::with_capacity(line.len());
        for (col, ch) in line.chars().enumerate() {
            let cell = GridProblemCell::try_from(ch)
                .map_err(|e| MazeParseError::InvalidCell { e, row, col })?;
            cells.push(match cell {
                GridProblemCell::Start => {
                    starts.push(GridState::new(row, col));
                    GridCell::Open
                }
                GridProblemCell::Goal => {
                    goals.push(GridState::new(row, col));
                    GridCell::Open
                }
                GridProblemCell::Cell(c) => c,
            });
        }
        map.push(cells);
    }
    if map.is_empty() {
        return Err(MazeParseError::EmptyInput);
    }
    let maze = GridMaze::new_from_map(map)?;

    match (starts.as_slice(), goals.as_slice()) {
        ([start], [goal]) => Ok((maze, *start, *goal)),
        ([_], _) => Err(MazeParseError::Marks {
            mark: 'G',
            found: goals.len(),
        }),
        _ => Err(MazeParseError::Marks {
            mark: 'S',
            found: starts.len(),
        }),
    }
}

#[derive(Debug)]
pub struct ManhattanDistance;

impl ObjectiveHeuristic<GridMaze, GridState, GridMove, GridCost> for ManhattanDistance {
    /// The distance of following straight lines
    #[inline(always)]
    fn h(a: &GridState, b: &GridState) -> GridCost {
        (a.row.abs_diff(b.row) + a.col.abs_diff(b.col)) as GridCost
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn corridor() -> GridMaze {
        GridMaze::try_from(indoc! {"
          #####
          ... #
          # # #
          #   .
          #####
        "})
        .unwrap()
    }

    #[test]
    fn dimensions_and_conventions() {
        let maze = corridor();
        assert_eq!(maze.dimensions(), (5, 5));
        assert_eq!(maze.entry(), GridState::new(1, 0));
        assert_eq!(maze.exit(), GridState::new(3, 4));
        assert!(maze.is_passable(1, 0));
        assert!(maze.is_passable(3, 4));
        assert!(!maze.is_passable(0, 0));
        assert!(!maze.is_passable(5, 0));
        assert!(maze.border_is_sealed());
    }

    #[test]
    fn neighbours_are_ordered() {
        let maze = corridor();
        let n = maze.neighbours(&GridState::new(1, 1));
        let moves: Vec<GridMove> = n.iter().map(|(_, a)| *a).collect();
        assert_eq!(moves, vec![GridMove::Down, GridMove::Left, GridMove::Right]);
        assert_eq!(n[0].0, GridState::new(2, 1));
        assert_eq!(n[1].0, GridState::new(1, 0));
        assert_eq!(n[2].0, GridState::new(1, 2));
    }

    #[test]
    fn neighbours_at_the_edge() {
        let maze = corridor();
        // Left of the entry is out of bounds.
        let n = maze.neighbours(&maze.entry());
        assert_eq!(n.len(), 1);
        assert_eq!(n[0], (GridState::new(1, 1), GridMove::Right));
        assert_eq!(maze.apply(&maze.entry(), &GridMove::Left), None);
        assert_eq!(maze.apply(&maze.entry(), &GridMove::Up), None);
    }

    #[test]
    fn rejects_bad_maps() {
        assert_eq!(GridMaze::try_from(""), Err(MazeParseError::EmptyInput));
        assert_eq!(
            GridMaze::try_from("#"),
            Err(MazeParseError::TooSmall {
                height: 1,
                width: 1
            })
        );
        assert_eq!(
            GridMaze::try_from("##\n#"),
            Err(MazeParseError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            GridMaze::try_from("##\n#x"),
            Err(MazeParseError::InvalidCell { row: 1, col: 1, .. })
        ));
    }

    #[test]
    fn parse_marked_problem() {
        let (maze, start, goal) = parse_problem(indoc! {"
          ####
          #S #
          # G#
          ####
        "})
        .unwrap();
        assert_eq!(start, GridState::new(1, 1));
        assert_eq!(goal, GridState::new(2, 2));
        assert!(maze.valid(&start));
        assert!(maze.valid(&goal));
        assert_eq!(maze.count_passable(), 4);

        assert_eq!(
            parse_problem("###\n#S#\n###"),
            Err(MazeParseError::Marks { mark: 'G', found: 0 })
        );
    }

    #[test]
    fn manhattan() {
        let a = GridState::new(1, 5);
        let b = GridState::new(4, 2);
        assert_eq!(ManhattanDistance::h(&a, &b), 6);
        assert_eq!(ManhattanDistance::h(&b, &a), 6);
        assert_eq!(ManhattanDistance::h(&a, &a), 0);
    }

    #[test]
    fn valid_path() {
        use crate::space::Path;

        let maze = corridor();
        let p = Path::from_states(vec![
            GridState::new(1, 0),
            GridState::new(1, 1),
            GridState::new(2, 1),
            GridState::new(3, 1),
        ])
        .unwrap();
        assert!(maze.valid_path(&p));

        let jump = Path::from_states(vec![GridState::new(1, 0), GridState::new(3, 1)]).unwrap();
        assert!(!maze.valid_path(&jump));
    }
}

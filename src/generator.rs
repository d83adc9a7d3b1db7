//! Maze generation by carving passages out of a solid grid.
//!
//! A `dim`x`dim` grid of logical cells is embedded in a `(2dim+1)`x`(2dim+1)`
//! physical grid. Logical cell `(x, y)` lives at physical `(2x+1, 2y+1)` and
//! the wall between two adjacent logical cells sits between them.

use derive_more::Display;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use smallvec::SmallVec;
use thiserror::Error;

use crate::problems::maze_2d::GridCell;
use crate::problems::maze_2d::GridMaze;

const MIN_DIM: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Maze dimension {0} is too small, it must be at least 2")]
    DimensionTooSmall(usize),
    #[error("Difficulty must be at least 1")]
    ZeroDifficulty,
}

/// How passages are carved.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum GenerationStrategy {
    /// Randomised depth-first spanning tree. Produces perfect mazes.
    #[display("recursive backtracker")]
    RecursiveBacktracker,
    /// Randomised Prim's spanning tree, plus random openings.
    #[display("Prim's (+{extra_openings} openings)")]
    Prim { extra_openings: usize },
    /// Uniform spanning tree from a random walk, plus random openings.
    #[display("Aldous-Broder (+{extra_openings} openings)")]
    AldousBroder { extra_openings: usize },
}

impl GenerationStrategy {
    /// Picks the strategy for a difficulty level.
    ///
    /// - `..=3`: recursive backtracker.
    /// - `4..=6`: Prim's with `(difficulty-3)*2` extra openings.
    /// - `7..`: Aldous-Broder with `(difficulty-6)*10` extra openings.
    pub fn from_difficulty(difficulty: u32) -> Result<Self, GenerateError> {
        let d = difficulty as usize;
        match difficulty {
            0 => Err(GenerateError::ZeroDifficulty),
            1..=3 => Ok(Self::RecursiveBacktracker),
            4..=6 => Ok(Self::Prim {
                extra_openings: (d - 3) * 2,
            }),
            _ => Ok(Self::AldousBroder {
                extra_openings: (d - 6) * 10,
            }),
        }
    }

    /// Carves a `dim`x`dim` maze.
    pub fn carve<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        dim: usize,
    ) -> Result<GridMaze, GenerateError> {
        if dim < MIN_DIM {
            return Err(GenerateError::DimensionTooSmall(dim));
        }
        log::debug!("Carving a {dim}x{dim} maze with {self}");

        let mut carver = Carver::new(dim);
        match self {
            Self::RecursiveBacktracker => carver.recursive_backtracker(rng),
            Self::Prim { extra_openings } => {
                carver.prim(rng);
                carver.open_randomly(rng, extra_openings);
            }
            Self::AldousBroder { extra_openings } => {
                carver.aldous_broder(rng);
                carver.open_randomly(rng, extra_openings);
            }
        }
        Ok(carver.finish())
    }
}

/// Generates a maze for a difficulty level.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    difficulty: u32,
    dim: usize,
) -> Result<GridMaze, GenerateError> {
    GenerationStrategy::from_difficulty(difficulty)?.carve(rng, dim)
}

/// A maze generator owning a seeded random source.
#[derive(Debug, Clone)]
pub struct MazeGenerator {
    rng: ChaCha8Rng,
}

impl MazeGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, difficulty: u32, dim: usize) -> Result<GridMaze, GenerateError> {
        generate(&mut self.rng, difficulty, dim)
    }
}

type Logical = (usize, usize);

struct Carver {
    dim: usize,
    map: Vec<Vec<GridCell>>,
    visited: Vec<bool>,
}

impl Carver {
    fn new(dim: usize) -> Self {
        let side = 2 * dim + 1;
        Self {
            dim,
            map: vec![vec![GridCell::Wall; side]; side],
            visited: vec![false; dim * dim],
        }
    }

    /// In-grid logical neighbours, in North, South, West, East order.
    fn neighbours(&self, (x, y): Logical) -> SmallVec<[Logical; 4]> {
        let mut v = SmallVec::new();
        if x > 0 {
            v.push((x - 1, y));
        }
        if x + 1 < self.dim {
            v.push((x + 1, y));
        }
        if y > 0 {
            v.push((x, y - 1));
        }
        if y + 1 < self.dim {
            v.push((x, y + 1));
        }
        v
    }

    #[inline(always)]
    fn is_visited(&self, (x, y): Logical) -> bool {
        self.visited[x * self.dim + y]
    }

    /// Marks a logical cell as visited and clears it.
    #[inline(always)]
    fn visit(&mut self, (x, y): Logical) {
        self.visited[x * self.dim + y] = true;
        self.map[2 * x + 1][2 * y + 1] = GridCell::Open;
    }

    /// Clears the wall between two adjacent logical cells.
    #[inline(always)]
    fn open_wall(&mut self, (x, y): Logical, (nx, ny): Logical) {
        debug_assert_eq!(x.abs_diff(nx) + y.abs_diff(ny), 1);
        self.map[x + nx + 1][y + ny + 1] = GridCell::Open;
    }

    fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Logical {
        (rng.random_range(0..self.dim), rng.random_range(0..self.dim))
    }

    fn recursive_backtracker<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let start = (0, 0);
        self.visit(start);
        let mut stack = vec![start];

        while let Some(&current) = stack.last() {
            let mut directions = self.neighbours(current);
            directions.shuffle(rng);
            match directions.into_iter().find(|n| !self.is_visited(*n)) {
                Some(next) => {
                    self.open_wall(current, next);
                    self.visit(next);
                    stack.push(next);
                }
                None => {
                    stack.pop();
                }
            }
        }
    }

    fn prim<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let start = self.random_cell(rng);
        self.visit(start);

        // Candidate walls as (visited cell, cell beyond the wall).
        let mut frontier: Vec<(Logical, Logical)> =
            self.neighbours(start).into_iter().map(|n| (start, n)).collect();

        while !frontier.is_empty() {
            let i = rng.random_range(0..frontier.len());
            let (from, to) = frontier.swap_remove(i);
            if self.is_visited(to) {
                continue;
            }
            self.open_wall(from, to);
            self.visit(to);
            for n in self.neighbours(to) {
                if !self.is_visited(n) {
                    frontier.push((to, n));
                }
            }
        }
    }

    fn aldous_broder<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut current = self.random_cell(rng);
        self.visit(current);
        let mut remaining = self.dim * self.dim - 1;

        while remaining > 0 {
            let Some(&next) = self.neighbours(current).choose(rng) else {
                break;
            };
            if !self.is_visited(next) {
                self.open_wall(current, next);
                self.visit(next);
                remaining -= 1;
            }
            current = next;
        }
    }

    /// Clears `n` uniformly random interior cells, possibly adding loops.
    fn open_randomly<R: Rng + ?Sized>(&mut self, rng: &mut R, n: usize) {
        let last = 2 * self.dim - 1;
        for _ in 0..n {
            let row = rng.random_range(1..=last);
            let col = rng.random_range(1..=last);
            self.map[row][col] = GridCell::Open;
        }
    }

    /// Walls the border and opens the entry and the exit.
    fn finish(mut self) -> GridMaze {
        let side = self.map.len();
        for i in 0..side {
            self.map[0][i] = GridCell::Wall;
            self.map[side - 1][i] = GridCell::Wall;
            self.map[i][0] = GridCell::Wall;
            self.map[i][side - 1] = GridCell::Wall;
        }
        self.map[1][0] = GridCell::Open;
        self.map[side - 2][side - 1] = GridCell::Open;

        GridMaze::new_unchecked(self.map)
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use super::*;
    use crate::problems::maze_2d::GridState;
    use crate::space::Space;

    const SEEDS: u64 = 20;

    /// Counts undirected edges between passable cells.
    fn count_edges(maze: &GridMaze) -> usize {
        maze.passable_states()
            .map(|s| maze.neighbours(&s).len())
            .sum::<usize>()
            / 2
    }

    fn reachable_from(maze: &GridMaze, start: GridState) -> FxHashSet<GridState> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![start];
        while let Some(s) = stack.pop() {
            if seen.insert(s) {
                stack.extend(maze.neighbours(&s).iter().map(|(n, _)| *n));
            }
        }
        seen
    }

    #[test]
    fn strategy_from_difficulty() {
        use GenerationStrategy::*;
        assert_eq!(
            GenerationStrategy::from_difficulty(0),
            Err(GenerateError::ZeroDifficulty)
        );
        assert_eq!(GenerationStrategy::from_difficulty(1), Ok(RecursiveBacktracker));
        assert_eq!(GenerationStrategy::from_difficulty(3), Ok(RecursiveBacktracker));
        assert_eq!(
            GenerationStrategy::from_difficulty(4),
            Ok(Prim { extra_openings: 2 })
        );
        assert_eq!(
            GenerationStrategy::from_difficulty(6),
            Ok(Prim { extra_openings: 6 })
        );
        assert_eq!(
            GenerationStrategy::from_difficulty(7),
            Ok(AldousBroder { extra_openings: 10 })
        );
        assert_eq!(
            GenerationStrategy::from_difficulty(10),
            Ok(AldousBroder { extra_openings: 40 })
        );
    }

    #[test]
    fn rejects_tiny_mazes() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            generate(&mut rng, 1, 1),
            Err(GenerateError::DimensionTooSmall(1))
        );
        assert_eq!(
            generate(&mut rng, 1, 0),
            Err(GenerateError::DimensionTooSmall(0))
        );
    }

    #[test]
    fn borders_entry_and_exit() {
        for difficulty in 1..=10 {
            for seed in 0..SEEDS {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let dim = 2 + (seed as usize % 7);
                let maze = generate(&mut rng, difficulty, dim).unwrap();

                assert_eq!(maze.dimensions(), (2 * dim + 1, 2 * dim + 1));
                assert!(maze.valid(&maze.entry()));
                assert!(maze.valid(&maze.exit()));
                assert!(maze.border_is_sealed(), "{maze}");
            }
        }
    }

    #[test]
    fn backtracker_carves_spanning_trees() {
        for seed in 0..SEEDS {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let dim = 2 + (seed as usize % 9);
            let maze = generate(&mut rng, 2, dim).unwrap();

            let logical_cells = (0..dim)
                .flat_map(|x| (0..dim).map(move |y| (x, y)))
                .filter(|(x, y)| maze.is_passable(2 * x + 1, 2 * y + 1))
                .count();
            assert_eq!(logical_cells, dim * dim);

            let nodes = maze.count_passable();
            assert_eq!(count_edges(&maze), nodes - 1, "{maze}");
            assert_eq!(reachable_from(&maze, maze.entry()).len(), nodes);
        }
    }

    #[test]
    fn spanning_trees_reach_every_cell() {
        for strategy in [
            GenerationStrategy::Prim { extra_openings: 0 },
            GenerationStrategy::AldousBroder { extra_openings: 0 },
        ] {
            for seed in 0..SEEDS {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let maze = strategy.carve(&mut rng, 6).unwrap();

                let nodes = maze.count_passable();
                assert_eq!(nodes, 6 * 6 + (6 * 6 - 1) + 2, "{strategy} {maze}");
                assert_eq!(count_edges(&maze), nodes - 1, "{strategy} {maze}");
                assert!(reachable_from(&maze, maze.entry()).contains(&maze.exit()));
            }
        }
    }

    #[test]
    fn openings_add_loops() {
        // Dense openings on a small maze always create at least one cycle.
        let strategy = GenerationStrategy::Prim { extra_openings: 200 };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let maze = strategy.carve(&mut rng, 5).unwrap();
        assert!(count_edges(&maze) > maze.count_passable() - 1);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = MazeGenerator::from_seed(42).generate(8, 10).unwrap();
        let b = MazeGenerator::from_seed(42).generate(8, 10).unwrap();
        assert_eq!(a, b);
    }
}

//! Compares solvers on freshly generated mazes.

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use crate::algorithms::mdp::MazeModel;
use crate::algorithms::uninformed::BreadthFirstSearch;
use crate::generator::GenerateError;
use crate::generator::generate;
use crate::problems::maze_2d::GridMaze;
use crate::problems::maze_2d::GridProblem;
use crate::problems::maze_2d::GridState;
use crate::solver::SolveError;
use crate::solver::SolveResult;
use crate::solver::Solver;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("No solvable maze after {0} attempts")]
    Unsolvable(usize),
}

/// A maze known to connect its entry to its exit.
#[derive(Clone, Debug)]
pub struct SolvableMaze {
    pub maze: GridMaze,
    /// Mazes thrown away before this one.
    pub rejected: usize,
}

impl SolvableMaze {
    pub fn start(&self) -> GridState {
        self.maze.entry()
    }
    pub fn goal(&self) -> GridState {
        self.maze.exit()
    }
}

/// Whether a breadth-first probe connects the entry to the exit.
pub fn is_solvable(maze: &GridMaze) -> bool {
    let problem = GridProblem::entry_to_exit(maze);
    BreadthFirstSearch::new(&problem).find_goal().is_some()
}

/// Generates mazes until one is solvable, giving up after `max_attempts`.
pub fn generate_solvable<R: Rng + ?Sized>(
    rng: &mut R,
    difficulty: u32,
    dim: usize,
    max_attempts: usize,
) -> Result<SolvableMaze, DriverError> {
    for attempt in 0..max_attempts {
        let maze = generate(rng, difficulty, dim)?;
        if is_solvable(&maze) {
            return Ok(SolvableMaze {
                maze,
                rejected: attempt,
            });
        }
        log::info!("Maze {attempt} has no path from entry to exit, generating a new one");
    }
    Err(DriverError::Unsolvable(max_attempts))
}

/// The MDP model of `maze`, built only when some solver needs it.
fn shared_model(solvers: &[Box<dyn Solver>], maze: &GridMaze) -> Option<Arc<MazeModel>> {
    solvers
        .iter()
        .any(|solver| solver.algorithm().is_mdp())
        .then(|| Arc::new(MazeModel::new(maze)))
}

fn run_one(
    solver: &dyn Solver,
    maze: &GridMaze,
    model: Option<&Arc<MazeModel>>,
    start: GridState,
    goal: GridState,
) -> Result<SolveResult, SolveError> {
    log::info!("Running {}", solver.algorithm());
    match model {
        Some(model) => solver.solve_with_model(maze, model, start, goal),
        None => solver.solve(maze, start, goal),
    }
}

/// Runs every solver on the same problem, in order.
pub fn run_sequential(
    solvers: &[Box<dyn Solver>],
    maze: &GridMaze,
    start: GridState,
    goal: GridState,
) -> Vec<Result<SolveResult, SolveError>> {
    let model = shared_model(solvers, maze);
    solvers
        .iter()
        .map(|solver| run_one(solver.as_ref(), maze, model.as_ref(), start, goal))
        .collect()
}

/// Runs every solver on the same problem, one thread each.
///
/// Results are returned in the order of `solvers`.
pub fn run_parallel(
    solvers: &[Box<dyn Solver>],
    maze: &GridMaze,
    start: GridState,
    goal: GridState,
) -> Vec<Result<SolveResult, SolveError>> {
    let model = shared_model(solvers, maze);
    let model = model.as_ref();
    std::thread::scope(|scope| {
        let handles: Vec<_> = solvers
            .iter()
            .map(|solver| scope.spawn(move || run_one(solver.as_ref(), maze, model, start, goal)))
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

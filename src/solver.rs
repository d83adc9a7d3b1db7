//! A uniform interface over every maze solving algorithm.

use std::sync::Arc;
use std::time::Duration;

use derive_more::Display;
use hrsw::Stopwatch;
use thiserror::Error;

use crate::algorithms::astar::AStarSearch;
use crate::algorithms::mdp::MazeModel;
use crate::algorithms::mdp::Mdp;
use crate::algorithms::mdp::MdpOptions;
use crate::algorithms::mdp::MdpOptionsError;
use crate::algorithms::mdp::Rewards;
pub use crate::algorithms::mdp::SolveWarning;
use crate::algorithms::policy_iteration::PolicyIteration;
use crate::algorithms::uninformed::BreadthFirstSearch;
use crate::algorithms::uninformed::DepthFirstSearch;
use crate::algorithms::value_iteration::ValueIteration;
use crate::problems::maze_2d::GridCost;
use crate::problems::maze_2d::GridMaze;
use crate::problems::maze_2d::GridMove;
use crate::problems::maze_2d::GridProblem;
use crate::problems::maze_2d::GridState;
use crate::problems::maze_2d::ManhattanDistance;
use crate::space::Path;

type GridAStar<'p, 'm> =
    AStarSearch<'p, ManhattanDistance, GridProblem<'m>, GridMaze, GridState, GridMove, GridCost>;
type GridBfs<'p, 'm> =
    BreadthFirstSearch<'p, GridProblem<'m>, GridMaze, GridState, GridMove, GridCost>;
type GridDfs<'p, 'm> =
    DepthFirstSearch<'p, GridProblem<'m>, GridMaze, GridState, GridMove, GridCost>;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Algorithm {
    #[display("DFS")]
    #[value(name = "dfs")]
    DepthFirst,
    #[display("BFS")]
    #[value(name = "bfs")]
    BreadthFirst,
    #[display("A*")]
    #[value(name = "astar", alias = "a*")]
    AStar,
    #[display("MDP policy iteration")]
    #[value(name = "policy")]
    PolicyIteration,
    #[display("MDP value iteration")]
    #[value(name = "value")]
    ValueIteration,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::DepthFirst,
        Algorithm::BreadthFirst,
        Algorithm::AStar,
        Algorithm::PolicyIteration,
        Algorithm::ValueIteration,
    ];

    pub fn is_mdp(self) -> bool {
        matches!(self, Algorithm::PolicyIteration | Algorithm::ValueIteration)
    }

    /// Builds a solver with default options.
    pub fn solver(self) -> Box<dyn Solver> {
        match self {
            Algorithm::DepthFirst => Box::new(GraphSearchSolver::depth_first()),
            Algorithm::BreadthFirst => Box::new(GraphSearchSolver::breadth_first()),
            Algorithm::AStar => Box::new(GraphSearchSolver::astar()),
            Algorithm::PolicyIteration => Box::new(MdpSolver::policy_iteration()),
            Algorithm::ValueIteration => Box::new(MdpSolver::value_iteration()),
        }
    }
}

/// Which end of the problem was rejected.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Role {
    #[display("start")]
    Start,
    #[display("goal")]
    Goal,
}

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    #[error("The {role} {state} is not a passable cell of the maze")]
    InvalidState { role: Role, state: GridState },
    #[error("Invalid MDP options. {0}")]
    InvalidOptions(#[from] MdpOptionsError),
}

/// Everything a solver reports about a single run.
#[derive(Clone, Debug)]
pub struct SolveResult {
    pub algorithm: Algorithm,
    /// `None` when no path to the goal exists.
    pub path: Option<Path<GridState>>,
    /// States on the path, or 0 when there is none.
    pub path_length: usize,
    pub elapsed: Duration,
    pub warnings: Vec<SolveWarning>,
}

impl SolveResult {
    fn new(
        algorithm: Algorithm,
        path: Option<Path<GridState>>,
        elapsed: Duration,
        warnings: Vec<SolveWarning>,
    ) -> Self {
        Self {
            algorithm,
            path_length: path.as_ref().map_or(0, Path::len),
            path,
            elapsed,
            warnings,
        }
    }

    /// Whether the path ends at `goal`.
    pub fn reaches(&self, goal: GridState) -> bool {
        self.path.as_ref().is_some_and(|p| p.end() == goal)
    }
}

pub trait Solver: std::fmt::Debug + Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn solve(
        &self,
        maze: &GridMaze,
        start: GridState,
        goal: GridState,
    ) -> Result<SolveResult, SolveError>;

    /// Like [`Solver::solve`], reusing a `model` already derived from `maze`.
    fn solve_with_model(
        &self,
        maze: &GridMaze,
        _model: &Arc<MazeModel>,
        start: GridState,
        goal: GridState,
    ) -> Result<SolveResult, SolveError> {
        self.solve(maze, start, goal)
    }
}

fn check_states(maze: &GridMaze, start: GridState, goal: GridState) -> Result<(), SolveError> {
    for (role, state) in [(Role::Start, start), (Role::Goal, goal)] {
        if !maze.is_passable(state.row, state.col) {
            return Err(SolveError::InvalidState { role, state });
        }
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum GraphSearch {
    DepthFirst,
    BreadthFirst,
    AStar,
}

/// Depth-first, breadth-first or A* search.
#[derive(Copy, Clone, Debug)]
pub struct GraphSearchSolver {
    search: GraphSearch,
}

impl GraphSearchSolver {
    pub fn depth_first() -> Self {
        Self {
            search: GraphSearch::DepthFirst,
        }
    }
    pub fn breadth_first() -> Self {
        Self {
            search: GraphSearch::BreadthFirst,
        }
    }
    pub fn astar() -> Self {
        Self {
            search: GraphSearch::AStar,
        }
    }
}

impl Solver for GraphSearchSolver {
    fn algorithm(&self) -> Algorithm {
        match self.search {
            GraphSearch::DepthFirst => Algorithm::DepthFirst,
            GraphSearch::BreadthFirst => Algorithm::BreadthFirst,
            GraphSearch::AStar => Algorithm::AStar,
        }
    }

    fn solve(
        &self,
        maze: &GridMaze,
        start: GridState,
        goal: GridState,
    ) -> Result<SolveResult, SolveError> {
        check_states(maze, start, goal)?;
        let problem = GridProblem::new(maze, start, goal);

        let mut stopwatch = Stopwatch::new_started();
        let path = match self.search {
            GraphSearch::DepthFirst => GridDfs::new(&problem).find_goal(),
            GraphSearch::BreadthFirst => GridBfs::new(&problem).find_goal(),
            GraphSearch::AStar => GridAStar::new(&problem).find_goal(),
        };
        stopwatch.stop();

        Ok(SolveResult::new(
            self.algorithm(),
            path,
            stopwatch.elapsed(),
            vec![],
        ))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DynamicProgram {
    PolicyIteration,
    ValueIteration,
}

/// Policy iteration or value iteration, followed by a greedy walk.
#[derive(Copy, Clone, Debug)]
pub struct MdpSolver {
    program: DynamicProgram,
    options: MdpOptions,
}

impl MdpSolver {
    pub fn policy_iteration() -> Self {
        Self {
            program: DynamicProgram::PolicyIteration,
            options: MdpOptions::policy_iteration(),
        }
    }
    pub fn value_iteration() -> Self {
        Self {
            program: DynamicProgram::ValueIteration,
            options: MdpOptions::value_iteration(),
        }
    }

    #[must_use]
    pub fn with_options(self, options: MdpOptions) -> Self {
        Self { options, ..self }
    }
    pub fn options(&self) -> &MdpOptions {
        &self.options
    }

    fn rewards(&self) -> Rewards {
        match self.program {
            DynamicProgram::PolicyIteration => Rewards::POLICY_ITERATION,
            DynamicProgram::ValueIteration => Rewards::VALUE_ITERATION,
        }
    }
}

impl Solver for MdpSolver {
    fn algorithm(&self) -> Algorithm {
        match self.program {
            DynamicProgram::PolicyIteration => Algorithm::PolicyIteration,
            DynamicProgram::ValueIteration => Algorithm::ValueIteration,
        }
    }

    fn solve(
        &self,
        maze: &GridMaze,
        start: GridState,
        goal: GridState,
    ) -> Result<SolveResult, SolveError> {
        self.options.validate()?;
        check_states(maze, start, goal)?;
        let model = Arc::new(MazeModel::new(maze));
        self.solve_with_model(maze, &model, start, goal)
    }

    /// Only the dynamic program and the walk are timed.
    fn solve_with_model(
        &self,
        maze: &GridMaze,
        model: &Arc<MazeModel>,
        start: GridState,
        goal: GridState,
    ) -> Result<SolveResult, SolveError> {
        self.options.validate()?;
        check_states(maze, start, goal)?;

        let mdp = Mdp::from_model(model.clone(), goal, self.rewards(), self.options.discount)
            .ok_or(SolveError::InvalidState {
                role: Role::Goal,
                state: goal,
            })?;
        let start = mdp.space().index_of(&start).ok_or(SolveError::InvalidState {
            role: Role::Start,
            state: start,
        })?;

        let mut stopwatch = Stopwatch::new_started();
        let (path, mut warnings) = match self.program {
            DynamicProgram::ValueIteration => {
                let mut vi = ValueIteration::new(&mdp, self.options);
                let warnings: Vec<_> = vi.solve().into_iter().collect();
                (vi.extract_path(start), warnings)
            }
            DynamicProgram::PolicyIteration => {
                let mut pi = PolicyIteration::new(&mdp, self.options);
                let warnings = pi.solve();
                log::debug!(
                    "Policy iteration took {} rounds from a {} policy",
                    pi.rounds(),
                    pi.initial_policy()
                );
                (pi.extract_path(start), warnings)
            }
        };
        stopwatch.stop();

        let (path, walk_warning) = path;
        warnings.extend(walk_warning);
        Ok(SolveResult::new(
            self.algorithm(),
            Some(path),
            stopwatch.elapsed(),
            warnings,
        ))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use proptest::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;
    use crate::algorithms::mdp::InitialPolicy;
    use crate::generator::GenerationStrategy;
    use crate::generator::generate;
    use crate::problems::maze_2d::parse_problem;
    use crate::space::Space;

    fn solve(
        algorithm: Algorithm,
        maze: &GridMaze,
        start: GridState,
        goal: GridState,
    ) -> SolveResult {
        algorithm.solver().solve(maze, start, goal).unwrap()
    }

    fn precise_solver(algorithm: Algorithm) -> Box<dyn Solver> {
        match algorithm {
            Algorithm::PolicyIteration => Box::new(
                MdpSolver::policy_iteration()
                    .with_options(MdpOptions::policy_iteration().with_theta(1e-6)),
            ),
            Algorithm::ValueIteration => Box::new(
                MdpSolver::value_iteration()
                    .with_options(MdpOptions::value_iteration().with_theta(1e-6)),
            ),
            _ => algorithm.solver(),
        }
    }

    #[test]
    fn every_algorithm_solves_a_small_maze() {
        let (maze, start, goal) = parse_problem(indoc! {"
          #######
          #S    #
          # ### #
          #   #G#
          #######
        "})
        .unwrap();

        for algorithm in Algorithm::ALL {
            let result = solve(algorithm, &maze, start, goal);
            assert_eq!(result.algorithm, algorithm);
            assert!(result.reaches(goal), "{algorithm} failed");
            let path = result.path.as_ref().unwrap();
            assert_eq!(path.start(), start);
            assert!(maze.valid_path(path));
            assert_eq!(result.path_length, path.len());
            assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        }
    }

    #[test]
    fn solvers_report_their_algorithm() {
        assert_eq!(GraphSearchSolver::depth_first().algorithm(), Algorithm::DepthFirst);
        assert_eq!(GraphSearchSolver::breadth_first().algorithm(), Algorithm::BreadthFirst);
        assert_eq!(GraphSearchSolver::astar().algorithm(), Algorithm::AStar);
        assert_eq!(MdpSolver::policy_iteration().algorithm(), Algorithm::PolicyIteration);
        assert_eq!(MdpSolver::value_iteration().algorithm(), Algorithm::ValueIteration);
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.solver().algorithm(), algorithm);
        }
    }

    #[test]
    fn shared_model_gives_the_same_paths() {
        let (maze, start, goal) = parse_problem(indoc! {"
          #######
          #S    #
          # ### #
          #   #G#
          #######
        "})
        .unwrap();
        let model = Arc::new(MazeModel::new(&maze));

        for algorithm in Algorithm::ALL {
            let solver = algorithm.solver();
            let own = solver.solve(&maze, start, goal).unwrap();
            let shared = solver.solve_with_model(&maze, &model, start, goal).unwrap();
            assert_eq!(own.path, shared.path, "{algorithm}");
            assert_eq!(own.warnings, shared.warnings, "{algorithm}");

            let back = solver.solve_with_model(&maze, &model, goal, start).unwrap();
            assert!(back.reaches(start), "{algorithm}");
        }
        assert_eq!(Arc::strong_count(&model), 1);

        let wall = GridState::new(0, 0);
        assert_eq!(
            MdpSolver::value_iteration()
                .solve_with_model(&maze, &model, start, wall)
                .unwrap_err(),
            SolveError::InvalidState {
                role: Role::Goal,
                state: wall
            }
        );
    }

    #[test]
    fn start_is_goal() {
        let (maze, start, _) = parse_problem("####\n#SG#\n####").unwrap();
        for algorithm in Algorithm::ALL {
            let result = solve(algorithm, &maze, start, start);
            assert_eq!(result.path_length, 1);
            assert_eq!(result.path.unwrap().states(), &[start]);
        }
    }

    #[test]
    fn invalid_states_are_rejected() {
        let (maze, start, goal) = parse_problem("####\n#SG#\n####").unwrap();
        let wall = GridState::new(0, 0);
        let outside = GridState::new(10, 10);

        for algorithm in Algorithm::ALL {
            let solver = algorithm.solver();
            assert_eq!(
                solver.solve(&maze, wall, goal).unwrap_err(),
                SolveError::InvalidState {
                    role: Role::Start,
                    state: wall
                }
            );
            assert_eq!(
                solver.solve(&maze, start, outside).unwrap_err(),
                SolveError::InvalidState {
                    role: Role::Goal,
                    state: outside
                }
            );
        }
    }

    #[test]
    fn invalid_options_are_rejected() {
        let (maze, start, goal) = parse_problem("####\n#SG#\n####").unwrap();
        let solver = MdpSolver::value_iteration()
            .with_options(MdpOptions::value_iteration().with_discount(1.5));
        assert_eq!(
            solver.solve(&maze, start, goal).unwrap_err(),
            SolveError::InvalidOptions(MdpOptionsError::Discount(1.5))
        );

        let solver = MdpSolver::policy_iteration()
            .with_options(MdpOptions::policy_iteration().with_theta(0.0));
        assert!(matches!(
            solver.solve(&maze, start, goal),
            Err(SolveError::InvalidOptions(MdpOptionsError::Theta(_)))
        ));
    }

    #[test]
    fn unreachable_goal() {
        let (maze, start, goal) = parse_problem(indoc! {"
          #######
          #S # G#
          #######
        "})
        .unwrap();

        for algorithm in [Algorithm::DepthFirst, Algorithm::BreadthFirst, Algorithm::AStar] {
            let result = solve(algorithm, &maze, start, goal);
            assert_eq!(result.path, None);
            assert_eq!(result.path_length, 0);
        }
        for algorithm in [Algorithm::PolicyIteration, Algorithm::ValueIteration] {
            let result = solve(algorithm, &maze, start, goal);
            assert!(!result.reaches(goal));
            assert!(
                result
                    .warnings
                    .iter()
                    .any(|w| matches!(w, SolveWarning::Stuck { .. }))
            );
        }
    }

    #[test]
    fn seven_by_seven_backtracker() {
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let maze = GenerationStrategy::RecursiveBacktracker
                .carve(&mut rng, 3)
                .unwrap();
            assert_eq!(maze.dimensions(), (7, 7));

            let result = solve(Algorithm::BreadthFirst, &maze, maze.entry(), maze.exit());
            let path = result.path.unwrap();
            assert_eq!(path.start(), GridState::new(1, 0));
            assert_eq!(path.end(), GridState::new(5, 6));
            // At worst a snake through all 9 cells and the 8 walls between them.
            assert!(path.steps() <= 9 * 2);
        }
    }

    #[test]
    fn random_initial_policy_still_solves() {
        let (maze, start, goal) = parse_problem(indoc! {"
          #######
          #S    #
          # ### #
          #   #G#
          #######
        "})
        .unwrap();
        let options = MdpOptions::policy_iteration()
            .with_initial_policy(InitialPolicy::Random { seed: 42 });
        let result = MdpSolver::policy_iteration()
            .with_options(options)
            .solve(&maze, start, goal)
            .unwrap();
        assert!(result.reaches(goal));
        assert_eq!(result.path_length, 7);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn graph_search_lengths(
            seed in any::<u64>(),
            difficulty in 1u32..=10,
            dim in 2usize..=8,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let maze = generate(&mut rng, difficulty, dim).unwrap();
            let (start, goal) = (maze.entry(), maze.exit());

            let bfs = solve(Algorithm::BreadthFirst, &maze, start, goal);
            let dfs = solve(Algorithm::DepthFirst, &maze, start, goal);
            let astar = solve(Algorithm::AStar, &maze, start, goal);

            prop_assert_eq!(bfs.path.is_some(), dfs.path.is_some());
            prop_assert_eq!(bfs.path.is_some(), astar.path.is_some());
            if bfs.path.is_some() {
                prop_assert_eq!(astar.path_length, bfs.path_length);
                prop_assert!(bfs.path_length <= dfs.path_length);
                for result in [&bfs, &dfs, &astar] {
                    let path = result.path.as_ref().unwrap();
                    prop_assert_eq!(path.start(), start);
                    prop_assert_eq!(path.end(), goal);
                    prop_assert!(maze.valid_path(path));
                }
            }
        }

        #[test]
        fn mdp_paths_are_near_shortest(
            seed in any::<u64>(),
            difficulty in 1u32..=10,
            dim in 2usize..=5,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let maze = generate(&mut rng, difficulty, dim).unwrap();
            let (start, goal) = (maze.entry(), maze.exit());

            let bfs = solve(Algorithm::BreadthFirst, &maze, start, goal);
            prop_assume!(bfs.path.is_some());

            for algorithm in [Algorithm::PolicyIteration, Algorithm::ValueIteration] {
                let result = precise_solver(algorithm).solve(&maze, start, goal).unwrap();
                prop_assert!(
                    result.reaches(goal),
                    "{} did not reach the goal: {:?}",
                    algorithm,
                    result.warnings
                );
                prop_assert!(result.path_length <= 2 * bfs.path_length);
                prop_assert!(maze.valid_path(result.path.as_ref().unwrap()));
            }
        }

        #[test]
        fn solving_is_deterministic(
            seed in any::<u64>(),
            difficulty in 1u32..=10,
            dim in 2usize..=5,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let maze = generate(&mut rng, difficulty, dim).unwrap();

            for algorithm in Algorithm::ALL {
                let a = solve(algorithm, &maze, maze.entry(), maze.exit());
                let b = solve(algorithm, &maze, maze.entry(), maze.exit());
                prop_assert_eq!(a.path, b.path);
                prop_assert_eq!(a.path_length, b.path_length);
            }
        }
    }
}

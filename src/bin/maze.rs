use anstream::println;
use clap::Parser;
use human_duration::human_duration;
use owo_colors::OwoColorize;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use thousands::Separable;
use tracing_subscriber::filter::EnvFilter;

use maze_search::algorithms::mdp::InitialPolicy;
use maze_search::algorithms::mdp::MdpOptions;
use maze_search::driver::generate_solvable;
use maze_search::driver::run_parallel;
use maze_search::driver::run_sequential;
use maze_search::generator::GenerationStrategy;
use maze_search::solver::Algorithm;
use maze_search::solver::MdpSolver;
use maze_search::solver::SolveResult;
use maze_search::solver::Solver;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Generates a maze and compares how each algorithm solves it.
#[derive(Parser, Debug)]
#[clap(long_version = maze_search::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Logical cells per side.
    #[arg(short, long, env = "MAZE_DIM", default_value_t = 10usize)]
    pub dim: usize,

    /// 1-3 carves perfect mazes, higher levels add loops.
    #[arg(short = 'l', long, env = "MAZE_DIFFICULTY", default_value_t = 1u32)]
    pub difficulty: u32,

    /// Random seed, picked at random when missing.
    #[arg(short, long, env = "MAZE_SEED")]
    pub seed: Option<u64>,

    /// Mazes to try before giving up on finding a solvable one.
    #[arg(long, env = "MAZE_MAX_ATTEMPTS", default_value_t = 100usize)]
    pub max_attempts: usize,

    #[arg(
        short,
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = Algorithm::ALL
    )]
    pub algorithms: Vec<Algorithm>,

    /// Run each algorithm on its own thread.
    #[arg(short, long)]
    pub parallel: bool,

    /// Print the maze.
    #[arg(long)]
    pub show_maze: bool,

    #[arg(long, default_value_t = MdpOptions::policy_iteration().discount)]
    pub policy_discount: f64,
    #[arg(long, default_value_t = MdpOptions::DEFAULT_THETA)]
    pub policy_theta: f64,
    /// Start policy iteration from a random policy with this seed.
    #[arg(long)]
    pub random_initial_policy: Option<u64>,

    #[arg(long, default_value_t = MdpOptions::value_iteration().discount)]
    pub value_discount: f64,
    #[arg(long, default_value_t = MdpOptions::DEFAULT_THETA)]
    pub value_theta: f64,

    #[arg(long, default_value_t = MdpOptions::DEFAULT_MAX_SWEEPS)]
    pub max_sweeps: usize,
    #[arg(long, default_value_t = MdpOptions::DEFAULT_MAX_ROUNDS)]
    pub max_rounds: usize,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

impl Args {
    fn solver(&self, algorithm: Algorithm) -> Box<dyn Solver> {
        match algorithm {
            Algorithm::PolicyIteration => {
                let initial_policy = self
                    .random_initial_policy
                    .map_or(InitialPolicy::Greedy, |seed| InitialPolicy::Random { seed });
                let options = MdpOptions::policy_iteration()
                    .with_discount(self.policy_discount)
                    .with_theta(self.policy_theta)
                    .with_max_sweeps(self.max_sweeps)
                    .with_max_rounds(self.max_rounds)
                    .with_initial_policy(initial_policy);
                Box::new(MdpSolver::policy_iteration().with_options(options))
            }
            Algorithm::ValueIteration => {
                let options = MdpOptions::value_iteration()
                    .with_discount(self.value_discount)
                    .with_theta(self.value_theta)
                    .with_max_sweeps(self.max_sweeps);
                Box::new(MdpSolver::value_iteration().with_options(options))
            }
            graph_search => graph_search.solver(),
        }
    }
}

fn print_result(result: &SolveResult, goal_reached: bool) {
    let length = if result.path.is_none() {
        "no path".red().to_string()
    } else if goal_reached {
        result.path_length.separate_with_commas().green().to_string()
    } else {
        format!("{} (short)", result.path_length.separate_with_commas())
            .yellow()
            .to_string()
    };
    println!(
        "| {:22} | {:>20} | {:>12} |",
        result.algorithm.to_string().bold(),
        length,
        human_duration(&result.elapsed)
    );
    for warning in &result.warnings {
        println!("|   {} {warning}", "warning:".yellow());
    }
}

/// `RUST_LOG` when set and valid, `info` otherwise.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    args.color.write_global();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .init();

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let strategy = GenerationStrategy::from_difficulty(args.difficulty)?;
    println!(
        "Generating a {dim}x{dim} maze with {strategy} (seed {})",
        seed.yellow(),
        dim = args.dim
    );

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let solvable = generate_solvable(&mut rng, args.difficulty, args.dim, args.max_attempts)?;
    if solvable.rejected > 0 {
        tracing::info!("Discarded {} unsolvable mazes", solvable.rejected);
    }
    let (height, width) = solvable.maze.dimensions();
    println!(
        "Solving from {} to {} on {}x{} cells ({} passable)",
        solvable.start().green(),
        solvable.goal().green(),
        height,
        width,
        solvable.maze.count_passable().separate_with_commas()
    );
    if args.show_maze {
        println!("{}", solvable.maze);
    }

    let solvers: Vec<_> = args.algorithms.iter().map(|a| args.solver(*a)).collect();
    let results = if args.parallel {
        run_parallel(&solvers, &solvable.maze, solvable.start(), solvable.goal())
    } else {
        run_sequential(&solvers, &solvable.maze, solvable.start(), solvable.goal())
    };

    println!(
        "| {:22} | {:>20} | {:>12} |",
        "Algorithm".bold(),
        "Path length".bold(),
        "Time".bold()
    );
    for result in results {
        let result = result?;
        print_result(&result, result.reaches(solvable.goal()));
    }

    Ok(())
}

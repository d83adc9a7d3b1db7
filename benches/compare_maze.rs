use std::time::Duration;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use hrsw::Stopwatch;
use human_duration::human_duration;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use maze_search::driver::SolvableMaze;
use maze_search::driver::generate_solvable;
use maze_search::solver::Algorithm;
use maze_search::solver::Solver;

/// Maximum time willing to wait for a single benchmark instance.
/// Experiments are carried out at least 5s and at least 100 times, so running a
/// 1s instance takes 1m40s.
const MAX_INSTANCE_TIME: Duration = Duration::from_secs(1);

fn solve(solver: &dyn Solver, instance: &SolvableMaze) -> usize {
    solver
        .solve(&instance.maze, instance.start(), instance.goal())
        .map_or(0, |r| r.path_length)
}

fn compare_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("Maze solvers");

    for (difficulty, dim) in [(1u32, 10usize), (5, 10), (8, 10), (1, 25), (8, 25)] {
        for seed in 0..3u64 {
            let instance_name = format!("d{difficulty}[{dim}x{dim}]:{seed}");
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let Ok(instance) = generate_solvable(&mut rng, difficulty, dim, 100) else {
                log::warn!("Skipping {instance_name}, no solvable maze");
                continue;
            };

            for algorithm in Algorithm::ALL {
                let solver = algorithm.solver();

                let mut stopwatch = Stopwatch::new_started();
                let length = solve(solver.as_ref(), &instance);
                stopwatch.stop();
                let elapsed = stopwatch.elapsed();
                if elapsed > MAX_INSTANCE_TIME {
                    log::warn!(
                        "Skipping {instance_name} as it takes too long with {algorithm} ({})",
                        human_duration(&elapsed)
                    );
                    continue;
                }
                println!("{algorithm} on {instance_name}: {length} states");

                group.bench_with_input(
                    BenchmarkId::new(algorithm.to_string(), &instance_name),
                    &instance,
                    |b, i| b.iter(|| solve(solver.as_ref(), i)),
                );
            }
        }
    }
    group.finish();
}

criterion_group!(benches, compare_solvers);
criterion_main!(benches);

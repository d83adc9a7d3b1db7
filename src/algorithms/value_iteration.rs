//! Value iteration with synchronous Bellman optimality sweeps.

use crate::algorithms::mdp::Mdp;
use crate::algorithms::mdp::MdpOptions;
use crate::algorithms::mdp::Phase;
use crate::algorithms::mdp::SolveWarning;
use crate::algorithms::mdp::max_delta;
use crate::problems::maze_2d::GridState;
use crate::space::Path;

#[derive(Debug)]
pub struct ValueIteration<'m> {
    mdp: &'m Mdp,
    options: MdpOptions,
    values: Vec<f64>,
    sweeps: usize,
    delta: f64,
}

impl<'m> ValueIteration<'m> {
    #[must_use]
    pub fn new(mdp: &'m Mdp, options: MdpOptions) -> Self {
        Self {
            mdp,
            options,
            values: vec![0.0; mdp.len()],
            sweeps: 0,
            delta: f64::INFINITY,
        }
    }

    /// Runs one sweep over all non-goal states, returning the largest change.
    ///
    /// Every update reads the values from before the sweep.
    pub fn sweep(&mut self) -> f64 {
        let mdp = self.mdp;
        let old = &self.values;
        let new: Vec<f64> = (0..mdp.len())
            .map(|s| {
                if s == mdp.goal() {
                    0.0
                } else {
                    mdp.greedy(old, s).1
                }
            })
            .collect();

        self.delta = max_delta(old, &new);
        self.values = new;
        self.sweeps += 1;
        self.delta
    }

    /// Sweeps until values settle below θ, or the sweep cap is hit.
    pub fn solve(&mut self) -> Option<SolveWarning> {
        while self.sweeps < self.options.max_sweeps {
            if self.sweep() < self.options.theta {
                log::info!(
                    "Value iteration converged after {} sweeps (Δ={:e})",
                    self.sweeps,
                    self.delta
                );
                return None;
            }
        }

        log::warn!(
            "Value iteration stopped after {} sweeps (Δ={:e})",
            self.sweeps,
            self.delta
        );
        Some(SolveWarning::NonConvergence {
            phase: Phase::ValueIteration,
            iterations: self.sweeps,
            delta: self.delta,
        })
    }

    /// Follows the greedy action from `start`.
    pub fn extract_path(&self, start: usize) -> (Path<GridState>, Option<SolveWarning>) {
        self.mdp.walk(start, |s| {
            let (a, _) = self.mdp.greedy(&self.values, s);
            self.mdp.transitions().next(s, a)
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }
    pub fn converged(&self) -> bool {
        self.delta < self.options.theta
    }
}

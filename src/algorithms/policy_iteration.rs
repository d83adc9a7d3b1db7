//! Policy iteration.
//!
//! Alternates evaluating the current policy until its values settle, and
//! greedily improving it, until no state changes its action.

use crate::algorithms::mdp::InitialPolicy;
use crate::algorithms::mdp::Mdp;
use crate::algorithms::mdp::MdpOptions;
use crate::algorithms::mdp::Phase;
use crate::algorithms::mdp::SolveWarning;
use crate::algorithms::mdp::max_delta;
use crate::problems::maze_2d::GridMove;
use crate::problems::maze_2d::GridState;
use crate::space::Path;

#[derive(Debug)]
pub struct PolicyIteration<'m> {
    mdp: &'m Mdp,
    options: MdpOptions,
    /// The action taken on every state, `None` only at the goal.
    policy: Vec<Option<GridMove>>,
    values: Vec<f64>,
    /// Improvement rounds so far.
    rounds: usize,
    /// Evaluation sweeps so far, over all rounds.
    sweeps: usize,
}

impl<'m> PolicyIteration<'m> {
    #[must_use]
    pub fn new(mdp: &'m Mdp, options: MdpOptions) -> Self {
        Self {
            mdp,
            options,
            policy: mdp.initial_policy(options.initial_policy),
            values: vec![0.0; mdp.len()],
            rounds: 0,
            sweeps: 0,
        }
    }

    /// Iterates the current policy's values until they settle below θ.
    pub fn evaluate(&mut self) -> Option<SolveWarning> {
        let mdp = self.mdp;
        let mut delta = f64::INFINITY;

        for sweep in 1..=self.options.max_sweeps {
            let new: Vec<f64> = self
                .policy
                .iter()
                .enumerate()
                .map(|(s, a)| a.map_or(0.0, |a| mdp.q_value(&self.values, s, a)))
                .collect();
            delta = max_delta(&self.values, &new);
            self.values = new;
            self.sweeps += 1;

            if delta < self.options.theta {
                log::debug!("Policy evaluation settled after {sweep} sweeps (Δ={delta:e})");
                return None;
            }
        }

        log::warn!(
            "Policy evaluation stopped after {} sweeps (Δ={delta:e})",
            self.options.max_sweeps
        );
        Some(SolveWarning::NonConvergence {
            phase: Phase::PolicyEvaluation,
            iterations: self.options.max_sweeps,
            delta,
        })
    }

    /// Switches every state to its greedy action, returning how many changed.
    pub fn improve(&mut self) -> usize {
        let mdp = self.mdp;
        let mut changed = 0;
        for s in 0..mdp.len() {
            if s == mdp.goal() {
                continue;
            }
            let (best, _) = mdp.greedy(&self.values, s);
            if self.policy[s] != Some(best) {
                self.policy[s] = Some(best);
                changed += 1;
            }
        }
        changed
    }

    /// Evaluates and improves until the policy is stable or the round cap
    /// is hit.
    pub fn solve(&mut self) -> Vec<SolveWarning> {
        let mut warnings = vec![];
        let mut changed = 0;

        while self.rounds < self.options.max_rounds {
            self.rounds += 1;
            warnings.extend(self.evaluate());

            changed = self.improve();
            log::debug!("Policy improvement round {} changed {changed} actions", self.rounds);
            if changed == 0 {
                log::info!(
                    "Policy iteration converged after {} rounds ({} evaluation sweeps)",
                    self.rounds,
                    self.sweeps
                );
                return warnings;
            }
        }

        log::warn!("Policy iteration stopped after {} rounds", self.rounds);
        warnings.push(SolveWarning::NonConvergence {
            phase: Phase::PolicyImprovement,
            iterations: self.rounds,
            // Actions changed by the last round.
            delta: changed as f64,
        });
        warnings
    }

    /// Follows the policy from `start`.
    pub fn extract_path(&self, start: usize) -> (Path<GridState>, Option<SolveWarning>) {
        self.mdp.walk(start, |s| match self.policy[s] {
            Some(a) => self.mdp.transitions().next(s, a),
            None => s,
        })
    }

    pub fn policy(&self) -> &[Option<GridMove>] {
        &self.policy
    }
    pub fn values(&self) -> &[f64] {
        &self.values
    }
    pub fn rounds(&self) -> usize {
        self.rounds
    }
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }
    pub fn initial_policy(&self) -> InitialPolicy {
        self.options.initial_policy
    }
}

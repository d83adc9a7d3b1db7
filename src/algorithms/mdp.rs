//! The maze as a Markov Decision Process.
//!
//! Every passable cell is a state, every [`GridMove`] an action, and moves
//! into walls or off the grid leave the agent in place. Transitions are
//! deterministic, so a model is just a table of successor indices.

use std::sync::Arc;

use derive_more::Display;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::problems::maze_2d::GridMaze;
use crate::problems::maze_2d::GridMove;
use crate::problems::maze_2d::GridState;
use crate::space::Path;
use crate::space::Space;

/// Passable states of a maze, row-major, with their index.
#[derive(Clone, Debug)]
pub struct StateSpace {
    states: Vec<GridState>,
    index: FxHashMap<GridState, usize>,
}

impl StateSpace {
    pub fn new(maze: &GridMaze) -> Self {
        let states: Vec<GridState> = maze.passable_states().collect();
        let index = states.iter().enumerate().map(|(i, s)| (*s, i)).collect();
        Self { states, index }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.states.len()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline(always)]
    pub fn index_of(&self, s: &GridState) -> Option<usize> {
        self.index.get(s).copied()
    }
    #[inline(always)]
    pub fn state(&self, i: usize) -> GridState {
        self.states[i]
    }
    pub fn states(&self) -> &[GridState] {
        &self.states
    }
}

/// Successor of every `(state, action)` pair, by state index.
#[derive(Clone, Debug)]
pub struct TransitionModel {
    next: Vec<[usize; 4]>,
}

impl TransitionModel {
    pub fn new(maze: &GridMaze, space: &StateSpace) -> Self {
        let next = space
            .states()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                GridMove::ALL.map(|a| {
                    maze.apply(s, &a)
                        .and_then(|n| space.index_of(&n))
                        .unwrap_or(i)
                })
            })
            .collect();
        Self { next }
    }

    /// The state reached from `s` by `a`, or `s` itself when blocked.
    #[inline(always)]
    pub fn next(&self, s: usize, a: GridMove) -> usize {
        self.next[s][a.index()]
    }

    pub fn len(&self) -> usize {
        self.next.len()
    }
    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }
}

/// Reward for a transition, depending only on whether it lands on the goal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rewards {
    pub goal: f64,
    pub step: f64,
}

impl Rewards {
    pub const VALUE_ITERATION: Self = Self {
        goal: 1.0,
        step: -0.01,
    };
    pub const POLICY_ITERATION: Self = Self {
        goal: 0.0,
        step: -1.0,
    };
}

/// How policy iteration picks its first policy.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq)]
pub enum InitialPolicy {
    /// One-step lookahead on an all-zero value function.
    #[default]
    #[display("greedy")]
    Greedy,
    /// A uniformly random action per state.
    #[display("random({seed})")]
    Random { seed: u64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum MdpOptionsError {
    #[error("Discount must be in (0, 1], got {0}")]
    Discount(f64),
    #[error("Convergence threshold must be positive, got {0}")]
    Theta(f64),
}

/// Knobs shared by both dynamic programming solvers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MdpOptions {
    /// γ
    pub discount: f64,
    /// θ, sweeps stop once no value moves this much.
    pub theta: f64,
    /// Maximum Bellman sweeps per value iteration run or policy evaluation.
    pub max_sweeps: usize,
    /// Maximum policy improvement rounds.
    pub max_rounds: usize,
    pub initial_policy: InitialPolicy,
}

impl MdpOptions {
    pub const DEFAULT_MAX_SWEEPS: usize = 100_000;
    pub const DEFAULT_MAX_ROUNDS: usize = 10_000;
    pub const DEFAULT_THETA: f64 = 0.001;

    pub fn value_iteration() -> Self {
        Self {
            discount: 0.99,
            theta: Self::DEFAULT_THETA,
            max_sweeps: Self::DEFAULT_MAX_SWEEPS,
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
            initial_policy: InitialPolicy::default(),
        }
    }
    pub fn policy_iteration() -> Self {
        Self {
            discount: 0.9,
            ..Self::value_iteration()
        }
    }

    #[must_use]
    pub fn with_discount(self, discount: f64) -> Self {
        Self { discount, ..self }
    }
    #[must_use]
    pub fn with_theta(self, theta: f64) -> Self {
        Self { theta, ..self }
    }
    #[must_use]
    pub fn with_max_sweeps(self, max_sweeps: usize) -> Self {
        Self { max_sweeps, ..self }
    }
    #[must_use]
    pub fn with_max_rounds(self, max_rounds: usize) -> Self {
        Self { max_rounds, ..self }
    }
    #[must_use]
    pub fn with_initial_policy(self, initial_policy: InitialPolicy) -> Self {
        Self {
            initial_policy,
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), MdpOptionsError> {
        // Written so NaN fails too.
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(MdpOptionsError::Discount(self.discount));
        }
        if !(self.theta > 0.0) {
            return Err(MdpOptionsError::Theta(self.theta));
        }
        if self.discount == 1.0 {
            log::warn!("Undiscounted MDP (γ=1), convergence is only bounded by the sweep cap");
        }
        Ok(())
    }
}

/// The loop that failed to settle.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Phase {
    #[display("value iteration")]
    ValueIteration,
    #[display("policy evaluation")]
    PolicyEvaluation,
    #[display("policy improvement")]
    PolicyImprovement,
}

/// Things that went wrong during a solve without invalidating it.
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum SolveWarning {
    /// A loop hit its cap while still changing by `delta`.
    #[display("{phase} did not converge after {iterations} iterations (Δ={delta})")]
    NonConvergence {
        phase: Phase,
        iterations: usize,
        delta: f64,
    },
    /// The greedy walk chose to stay in place before reaching the goal.
    #[display("stuck at {at}")]
    Stuck { at: GridState },
    /// The greedy walk took as many steps as there are states.
    #[display("gave up following the policy after {steps} steps")]
    PathCapReached { steps: usize },
}

/// The goal-independent part of a maze MDP.
///
/// Built once per maze and shared by every MDP solved on it.
#[derive(Clone, Debug)]
pub struct MazeModel {
    space: StateSpace,
    transitions: TransitionModel,
}

impl MazeModel {
    pub fn new(maze: &GridMaze) -> Self {
        let space = StateSpace::new(maze);
        let transitions = TransitionModel::new(maze, &space);
        log::debug!("Maze model with {} states", space.len());
        Self { space, transitions }
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }
    pub fn transitions(&self) -> &TransitionModel {
        &self.transitions
    }
}

/// A maze MDP for a fixed goal.
#[derive(Clone, Debug)]
pub struct Mdp {
    model: Arc<MazeModel>,
    rewards: Rewards,
    discount: f64,
    goal: usize,
}

impl Mdp {
    /// Builds the MDP, or `None` if `goal` is not a passable cell.
    pub fn new(maze: &GridMaze, goal: GridState, rewards: Rewards, discount: f64) -> Option<Self> {
        Self::from_model(Arc::new(MazeModel::new(maze)), goal, rewards, discount)
    }

    /// Reuses an existing model, or `None` if `goal` is not one of its states.
    pub fn from_model(
        model: Arc<MazeModel>,
        goal: GridState,
        rewards: Rewards,
        discount: f64,
    ) -> Option<Self> {
        let goal = model.space.index_of(&goal)?;
        Some(Self {
            model,
            rewards,
            discount,
            goal,
        })
    }

    pub fn space(&self) -> &StateSpace {
        &self.model.space
    }
    pub fn transitions(&self) -> &TransitionModel {
        &self.model.transitions
    }
    pub fn model(&self) -> &Arc<MazeModel> {
        &self.model
    }
    #[inline(always)]
    pub fn goal(&self) -> usize {
        self.goal
    }
    #[inline(always)]
    pub fn discount(&self) -> f64 {
        self.discount
    }
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.model.space.len()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.model.space.is_empty()
    }

    #[inline(always)]
    pub fn reward(&self, next: usize) -> f64 {
        if next == self.goal {
            self.rewards.goal
        } else {
            self.rewards.step
        }
    }

    /// r(s, a) + γ·V(T(s, a))
    #[inline(always)]
    pub fn q_value(&self, values: &[f64], s: usize, a: GridMove) -> f64 {
        let next = self.model.transitions.next(s, a);
        self.reward(next) + self.discount * values[next]
    }

    /// The best action from `s` and its value.
    ///
    /// Only strict improvements replace the running best, so the first action
    /// in [`GridMove::ALL`] order wins ties.
    pub fn greedy(&self, values: &[f64], s: usize) -> (GridMove, f64) {
        let mut best = (GridMove::ALL[0], f64::NEG_INFINITY);
        for a in GridMove::ALL {
            let q = self.q_value(values, s, a);
            if q > best.1 {
                best = (a, q);
            }
        }
        best
    }

    /// Walks from `start` following `step` until the goal.
    ///
    /// Stops early when `step` stays in place, or after as many steps as
    /// there are states. Either case is reported as a warning.
    pub fn walk<F>(&self, start: usize, mut step: F) -> (Path<GridState>, Option<SolveWarning>)
    where
        F: FnMut(usize) -> usize,
    {
        let mut path = Path::new_from_start(self.model.space.state(start));
        let mut current = start;
        let mut steps = 0;

        while current != self.goal {
            if steps >= self.len() {
                log::warn!("Gave up following the policy after {steps} steps");
                return (path, Some(SolveWarning::PathCapReached { steps }));
            }
            let next = step(current);
            if next == current {
                let at = self.model.space.state(current);
                log::warn!("Policy is stuck at {at}");
                return (path, Some(SolveWarning::Stuck { at }));
            }
            path.append(self.model.space.state(next));
            current = next;
            steps += 1;
        }

        (path, None)
    }

    /// A policy for every non-goal state, chosen per [`InitialPolicy`].
    pub fn initial_policy(&self, initial: InitialPolicy) -> Vec<Option<GridMove>> {
        match initial {
            InitialPolicy::Greedy => {
                let zeros = vec![0.0; self.len()];
                (0..self.len())
                    .map(|s| (s != self.goal).then(|| self.greedy(&zeros, s).0))
                    .collect()
            }
            InitialPolicy::Random { seed } => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                (0..self.len())
                    .map(|s| {
                        let a = GridMove::ALL[rng.random_range(0..GridMove::ALL.len())];
                        (s != self.goal).then_some(a)
                    })
                    .collect()
            }
        }
    }
}

/// Largest absolute change between two value functions.
pub(crate) fn max_delta(old: &[f64], new: &[f64]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(o, n)| (n - o).abs())
        .fold(0.0, f64::max)
}

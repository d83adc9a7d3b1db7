//! Implementation of search algorithms.
//!
//! Graph searches work on generic search problems, while the dynamic
//! programming solvers treat a maze as a Markov Decision Process.

pub mod astar;
pub mod uninformed;

pub mod mdp;
pub mod policy_iteration;
pub mod value_iteration;

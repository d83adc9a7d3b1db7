use shadow_rs::shadow;

shadow!(build);

// Internals
// ---------
pub mod data_structures;
pub mod heap_primitives;

// Search space and problems
// -------------------------
pub mod cost;
pub mod problem;
pub mod search;
pub mod space;

// Problems
// --------
pub mod generator;
pub mod problems;

// Algorithms
// ----------
pub mod algorithms;
pub mod driver;
pub mod solver;

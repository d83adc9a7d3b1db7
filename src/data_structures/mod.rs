//! Containers backing the search algorithms.

pub mod dary_heap;

use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::cost::Cost;

const MAX_ELEMENTS_DISPLAYED: usize = 20;

pub trait Action: Copy + Clone + Debug + PartialEq + Eq {}
pub trait State: Copy + Clone + Debug + PartialEq + Eq + Hash + PartialOrd + Ord {}

/// Expansions are small enough to live on the stack.
pub type Neighbours<St, A> = SmallVec<[(St, A); 4]>;

/// A sequence of States visited in order.
///
/// Never empty, and never holds the same State twice in a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path<St>
where
    St: State,
{
    states: Vec<St>,
}

impl<St> Path<St>
where
    St: State,
{
    #[inline(always)]
    pub fn new_from_start(start: St) -> Self {
        Self {
            states: vec![start],
        }
    }

    /// Builds a Path from an ordered list of states.
    ///
    /// Returns `None` for empty lists or lists repeating a state back-to-back.
    pub fn from_states(states: Vec<St>) -> Option<Self> {
        if states.is_empty() || states.windows(2).any(|w| w[0] == w[1]) {
            return None;
        }
        Some(Self { states })
    }

    #[inline(always)]
    pub fn start(&self) -> St {
        self.states[0]
    }
    #[inline(always)]
    pub fn end(&self) -> St {
        self.states[self.states.len() - 1]
    }

    /// Number of States on the Path, including both ends.
    #[inline(always)]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Number of moves taken.
    #[inline(always)]
    pub fn steps(&self) -> usize {
        self.states.len() - 1
    }

    #[inline(always)]
    pub fn states(&self) -> &[St] {
        &self.states
    }

    #[inline(always)]
    pub fn append(&mut self, s: St) {
        debug_assert_ne!(self.end(), s, "Paths can't stay in place");
        self.states.push(s);
    }

    /// Reverses the Path.
    ///
    /// Useful when naturally reconstructing paths in reverse.
    pub fn reverse(&mut self) {
        self.states.reverse();
    }
}

impl<St> std::fmt::Display for Path<St>
where
    St: State + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Path({} steps, ", self.steps())?;
        for (i, s) in self.states.iter().take(MAX_ELEMENTS_DISPLAYED).enumerate() {
            if i > 0 {
                write!(f, "→")?;
            }
            write!(f, "{s}")?;
        }
        if self.states.len() > MAX_ELEMENTS_DISPLAYED {
            write!(f, "→…→{}", self.end())?;
        }
        write!(f, ")")
    }
}

pub trait Space<St, A, C>: Clone + std::fmt::Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    /// Applies an action, if it leads to a valid State.
    fn apply(&self, s: &St, a: &A) -> Option<St>;

    fn cost(&self, _s: &St, _a: &A) -> C {
        C::one()
    }
    /// Expands a State
    fn neighbours(&self, s: &St) -> Neighbours<St, A>;
    /// Verify is a State is valid.
    fn valid(&self, s: &St) -> bool;

    /// Checks that every step on the Path is a single valid move.
    fn valid_path(&self, p: &Path<St>) -> bool {
        if !self.valid(&p.start()) {
            return false;
        }
        p.states()
            .windows(2)
            .all(|w| self.neighbours(&w[0]).iter().any(|(s, _a)| *s == w[1]))
    }
}

/// A heuristic estimating the cost between two States.
pub trait ObjectiveHeuristic<Sp, St, A, C>: std::fmt::Debug
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    fn h(_a: &St, _b: &St) -> C {
        C::zero()
    }
}

//! Depth-first and breadth-first search.
//!
//! Both share the same loop and only differ in the order their frontier hands
//! nodes back. States are marked as visited when popped, and already visited
//! neighbours are not pushed again.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::marker::PhantomData;

use rustc_hash::FxHashSet;

use crate::cost::Cost;
use crate::problem::Problem;
use crate::search::SearchTree;
use crate::search::SearchTreeIndex;
use crate::search::SearchTreeNode;
use crate::space::Action;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// The open list of an uninformed search.
pub trait Frontier: Debug + Default {
    fn push(&mut self, i: SearchTreeIndex);
    fn pop(&mut self) -> Option<SearchTreeIndex>;
    fn len(&self) -> usize;
}

/// Last in, first out.
#[derive(Debug, Default)]
pub struct Lifo(Vec<SearchTreeIndex>);

impl Frontier for Lifo {
    #[inline(always)]
    fn push(&mut self, i: SearchTreeIndex) {
        self.0.push(i);
    }
    #[inline(always)]
    fn pop(&mut self) -> Option<SearchTreeIndex> {
        self.0.pop()
    }
    fn len(&self) -> usize {
        self.0.len()
    }
}

/// First in, first out.
#[derive(Debug, Default)]
pub struct Fifo(VecDeque<SearchTreeIndex>);

impl Frontier for Fifo {
    #[inline(always)]
    fn push(&mut self, i: SearchTreeIndex) {
        self.0.push_back(i);
    }
    #[inline(always)]
    fn pop(&mut self) -> Option<SearchTreeIndex> {
        self.0.pop_front()
    }
    fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug)]
pub struct UninformedSearch<'p, F, P, Sp, St, A, C>
where
    F: Frontier,
    P: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    problem: &'p P,
    search_tree: SearchTree<St>,
    frontier: F,
    /// States already expanded.
    closed: FxHashSet<St>,

    _phantom_space: PhantomData<Sp>,
    _phantom_action: PhantomData<A>,
    _phantom_cost: PhantomData<C>,
}

pub type DepthFirstSearch<'p, P, Sp, St, A, C> = UninformedSearch<'p, Lifo, P, Sp, St, A, C>;
pub type BreadthFirstSearch<'p, P, Sp, St, A, C> = UninformedSearch<'p, Fifo, P, Sp, St, A, C>;

impl<'p, F, P, Sp, St, A, C> UninformedSearch<'p, F, P, Sp, St, A, C>
where
    F: Frontier,
    P: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(problem: &'p P) -> Self {
        let mut search = Self {
            problem,
            search_tree: SearchTree::new(),
            frontier: F::default(),
            closed: FxHashSet::default(),

            _phantom_space: PhantomData,
            _phantom_action: PhantomData,
            _phantom_cost: PhantomData,
        };

        let root = search
            .search_tree
            .push(SearchTreeNode::new(problem.start(), None));
        search.frontier.push(root);
        search
    }

    /// Runs until the goal is popped or the frontier runs dry.
    #[must_use]
    pub fn find_goal(&mut self) -> Option<Path<St>> {
        while let Some(node_index) = self.frontier.pop() {
            let state = *self.search_tree[node_index].state();

            if self.problem.is_goal(&state) {
                log::debug!(
                    "Found goal {:?} after expanding {} states ({} generated)",
                    state,
                    self.expanded(),
                    self.generated()
                );
                return Some(self.search_tree.path(node_index));
            }

            if !self.closed.insert(state) {
                continue;
            }

            for (s, _a) in self.problem.space().neighbours(&state) {
                if self.closed.contains(&s) {
                    continue;
                }
                let child = self
                    .search_tree
                    .push(SearchTreeNode::new(s, Some(node_index)));
                self.frontier.push(child);
            }
        }

        log::debug!(
            "Exhausted the frontier after expanding {} states",
            self.expanded()
        );
        None
    }

    /// Number of States expanded so far.
    pub fn expanded(&self) -> usize {
        self.closed.len()
    }
    /// Number of search nodes created so far.
    pub fn generated(&self) -> usize {
        self.search_tree.len()
    }
    /// Number of nodes waiting in the frontier.
    pub fn open(&self) -> usize {
        self.frontier.len()
    }
}

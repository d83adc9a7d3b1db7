//! Implementation of A*.

use std::marker::PhantomData;

use rustc_hash::FxHashMap;

use crate::cost::Cost;
use crate::data_structures::dary_heap::DaryHeap;
use crate::problem::Problem;
use crate::search::SearchTree;
use crate::search::SearchTreeIndex;
use crate::search::SearchTreeNode;
use crate::space::Action;
use crate::space::ObjectiveHeuristic;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// The ranking tuple for A*
///
/// We prefer better f-values, and tie break for lower g.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AStarRank<C: Cost> {
    f: C,
    g: C,
}
impl<C> AStarRank<C>
where
    C: Cost,
{
    pub fn new(g: C, h: C) -> Self {
        Self {
            f: g.saturating_add(&h),
            g,
        }
    }
    pub fn f(&self) -> C {
        self.f
    }
    pub fn g(&self) -> C {
        self.g
    }
}

/// An entry in the open list.
///
/// Ordered by rank, then by State, then by creation order, which keeps runs
/// deterministic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AStarHeapNode<St, C>
where
    St: State,
    C: Cost,
{
    /// The rank of this node that defines how good it is.
    pub rank: AStarRank<C>,
    pub state: St,
    /// The index of this node in the Search Tree
    pub node_index: SearchTreeIndex,
}

#[derive(Debug)]
pub struct AStarSearch<'p, OH, P, Sp, St, A, C>
where
    OH: ObjectiveHeuristic<Sp, St, A, C>,
    P: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    problem: &'p P,
    /// All the Search Nodes. Naturally forms a Search Tree as each node may
    /// have a parent Node.
    search_tree: SearchTree<St>,
    open: DaryHeap<AStarHeapNode<St, C>>,
    /// The best g-value each expanded State was expanded with.
    ///
    /// A State popped again without a strictly better g-value is skipped.
    best_g: FxHashMap<St, C>,

    _phantom_heuristic: PhantomData<OH>,
    _phantom_space: PhantomData<Sp>,
    _phantom_action: PhantomData<A>,
}

impl<'p, OH, P, Sp, St, A, C> AStarSearch<'p, OH, P, Sp, St, A, C>
where
    OH: ObjectiveHeuristic<Sp, St, A, C>,
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
            open: DaryHeap::with_capacity(1024),
            best_g: FxHashMap::default(),

            _phantom_heuristic: PhantomData,
            _phantom_space: PhantomData,
            _phantom_action: PhantomData,
        };

        let start = problem.start();
        search.push_new(start, None, C::zero());
        search
    }

    #[must_use]
    pub fn find_goal(&mut self) -> Option<Path<St>> {
        while let Some(AStarHeapNode {
            rank,
            state,
            node_index,
        }) = self.open.pop()
        {
            if self.problem.is_goal(&state) {
                log::debug!(
                    "Found goal {:?} with cost {} after expanding {} states ({} generated)",
                    state,
                    rank.g(),
                    self.expanded(),
                    self.generated()
                );
                return Some(self.search_tree.path(node_index));
            }

            let g = rank.g();
            match self.best_g.get(&state) {
                Some(best) if *best <= g => continue,
                _ => {
                    self.best_g.insert(state, g);
                }
            }

            let space = self.problem.space();
            for (s, a) in space.neighbours(&state) {
                let new_g = g.saturating_add(&space.cost(&state, &a));
                self.push_new(s, Some(node_index), new_g);
            }
        }

        log::debug!(
            "Exhausted the open list after expanding {} states",
            self.expanded()
        );
        None
    }

    #[inline(always)]
    fn push_new(&mut self, s: St, parent: Option<SearchTreeIndex>, g: C) {
        let h = OH::h(&s, &self.problem.goal());
        let node_index = self.search_tree.push(SearchTreeNode::new(s, parent));
        self.open.push(AStarHeapNode {
            rank: AStarRank::new(g, h),
            state: s,
            node_index,
        });
    }

    /// Number of States expanded so far.
    pub fn expanded(&self) -> usize {
        self.best_g.len()
    }
    /// Number of search nodes created so far.
    pub fn generated(&self) -> usize {
        self.search_tree.len()
    }
}

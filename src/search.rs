use std::fmt::Debug;

use crate::space::Path;
use crate::space::State;

/// A reference to a `SearchTreeNode<St>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchTreeIndex {
    index: usize,
}

impl SearchTreeIndex {
    #[inline(always)]
    fn new(index: usize) -> Self {
        Self { index }
    }
}

#[derive(Debug, Clone)]
pub struct SearchTreeNode<St>
where
    St: State,
{
    pub(crate) parent: Option<SearchTreeIndex>,
    pub(crate) state: St,
}

impl<St> SearchTreeNode<St>
where
    St: State,
{
    pub fn new(s: St, parent: Option<SearchTreeIndex>) -> Self {
        Self { parent, state: s }
    }

    #[inline(always)]
    pub(crate) fn state(&self) -> &St {
        &self.state
    }
}

/// All the nodes generated by a search.
///
/// Frontier entries refer to nodes here, which in turn point to the node they
/// were generated from. Paths are only materialised once a goal is found.
pub(crate) struct SearchTree<St>
where
    St: State,
{
    nodes: Vec<SearchTreeNode<St>>,
}

impl<St> SearchTree<St>
where
    St: State,
{
    #[inline(always)]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[inline(always)]
    pub(crate) fn push(&mut self, node: SearchTreeNode<St>) -> SearchTreeIndex {
        self.nodes.push(node);
        SearchTreeIndex::new(self.nodes.len() - 1)
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Follows parents back to the root, returning the root-first Path.
    #[must_use]
    pub fn path(&self, mut node_index: SearchTreeIndex) -> Path<St> {
        let mut path = Path::<St>::new_from_start(*self[node_index].state());

        while let Some(parent_index) = self[node_index].parent {
            debug_assert!(parent_index < node_index);
            path.append(*self[parent_index].state());
            node_index = parent_index;
        }

        path.reverse();
        path
    }
}

impl<St> Default for SearchTree<St>
where
    St: State,
{
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<St> std::ops::Index<SearchTreeIndex> for SearchTree<St>
where
    St: State,
{
    type Output = SearchTreeNode<St>;

    #[inline(always)]
    fn index(&self, index: SearchTreeIndex) -> &Self::Output {
        &self.nodes[index.index]
    }
}

impl<St> std::fmt::Debug for SearchTree<St>
where
    St: State,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SearchTree{{({} nodes)}}", self.len())
    }
}

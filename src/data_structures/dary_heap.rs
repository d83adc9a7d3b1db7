use std::fmt::Debug;

use crate::heap_primitives::children;
use crate::heap_primitives::parent;

const DEFAULT_ARITY: usize = 4usize;

/// A min-heap with `A` children per node, stored in a `Vec`.
///
/// Wider nodes make the heap shallower, trading comparisons on the way down
/// for fewer levels and better locality. Pops yield the smallest element;
/// equal elements come out in no particular order, so callers wanting
/// determinism must make their `Ord` total over distinct entries.
#[derive(Debug, Clone)]
pub struct DaryHeap<N, const A: usize = DEFAULT_ARITY>
where
    N: Ord + Debug,
{
    heap: Vec<N>,
}

impl<N, const A: usize> DaryHeap<N, A>
where
    N: Ord + Debug,
{
    pub fn new() -> Self {
        Self { heap: vec![] }
    }
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn push(&mut self, n: N) {
        self.heap.push(n);
        self.sift_up(self.heap.len() - 1);
        self.verify_heap();
    }

    pub fn pop(&mut self) -> Option<N> {
        if self.heap.len() <= 1 {
            return self.heap.pop();
        }

        let top = self.heap.swap_remove(0);
        self.sift_down(0);
        self.verify_heap();
        Some(top)
    }

    /// Raises a node, returning its new index.
    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let p = parent::<A>(index);
            if self.heap[p] <= self.heap[index] {
                break;
            }
            self.heap.swap(p, index);
            index = p;
        }
        index
    }

    /// Lowers a node, returning its new index.
    fn sift_down(&mut self, mut index: usize) -> usize {
        let len = self.heap.len();
        loop {
            let range = children::<A>(index, len);
            let first = range.start;
            let Some(best) = self.heap[range]
                .iter()
                .enumerate()
                .min_by(|(_, l), (_, r)| l.cmp(r))
                .map(|(i, _)| first + i)
            else {
                break;
            };

            if self.heap[index] <= self.heap[best] {
                break;
            }
            self.heap.swap(index, best);
            index = best;
        }
        index
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    fn verify_heap(&self) {
        // All good... (hopefully)
    }
    #[inline(always)]
    #[cfg(feature = "verify")]
    fn verify_heap(&self) {
        for i in 1..self.heap.len() {
            let p = parent::<A>(i);
            assert!(
                self.heap[p] <= self.heap[i],
                "Node[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.heap[p],
                self.heap[i],
                self.heap.len(),
            );
        }
    }
}

impl<N, const A: usize> Default for DaryHeap<N, A>
where
    N: Ord + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

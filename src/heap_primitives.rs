// Index arithmetic for d-ary heaps stored in a flat array.
//
// With arity `A`, the node at index `i` has children `A*i+1 ..= A*i+A`, and
// every node but the root has parent `(i-1)/A`.
//
// ```text
// A=2:                0
//            1                 2
//        3       4        5        6
//      7   8   9  10   11  12   13  14
// ```
//
// The last level will often be incomplete.

/// The parent node
///
/// ```
/// use maze_search::heap_primitives::parent;
/// assert_eq!(parent::<2>(1), 0);
/// assert_eq!(parent::<2>(2), 0);
/// assert_eq!(parent::<2>(6), 2);
/// assert_eq!(parent::<4>(4), 0);
/// assert_eq!(parent::<4>(5), 1);
/// ```
#[inline(always)]
#[must_use]
pub fn parent<const A: usize>(i: usize) -> usize {
    debug_assert!(i > 0, "The root has no parent");
    (i - 1) / A
}

/// The first child
///
/// ```
/// use maze_search::heap_primitives::first_child;
/// assert_eq!(first_child::<2>(0), 1);
/// assert_eq!(first_child::<2>(3), 7);
/// assert_eq!(first_child::<4>(1), 5);
/// ```
#[inline(always)]
#[must_use]
pub fn first_child<const A: usize>(i: usize) -> usize {
    (A * i) + 1
}

/// The children of a node that exist in a heap of `len` elements.
///
/// ```
/// use maze_search::heap_primitives::children;
/// assert_eq!(children::<2>(0, 10), 1..3);
/// assert_eq!(children::<4>(1, 7), 5..7);
/// assert!(children::<4>(2, 7).is_empty());
/// ```
#[inline(always)]
#[must_use]
pub fn children<const A: usize>(i: usize, len: usize) -> std::ops::Range<usize> {
    let first = first_child::<A>(i);
    first.min(len)..(first + A).min(len)
}

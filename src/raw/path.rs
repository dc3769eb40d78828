use smallvec::SmallVec;

use crate::handle::Handle;

// Ancestors held inline before the stack spills to the heap.
#[cfg(test)]
const INLINE_DEPTH: usize = 4;
#[cfg(not(test))]
const INLINE_DEPTH: usize = 32;

/// Ancestor stack used by trees whose linkage has no parent link.
///
/// While a mutation rebalances, the stack holds the ancestors of the node
/// currently being fixed, root first, excluding the node itself. Each balance
/// step pops exactly one entry.
pub(crate) type Path = SmallVec<[Handle; INLINE_DEPTH]>;

use core::fmt;

use crate::handle::Handle;

/// A structural defect found by [`WavlTree::rank`](crate::WavlTree::rank).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvariantViolation {
    /// The ranks implied through the left and right edges of `node` disagree.
    RankMismatch { node: Handle, left: i32, right: i32 },
    /// A node without children does not have rank 0.
    LeafRank { node: Handle, rank: i32 },
    /// `child` is linked under `node` but its parent link points elsewhere.
    ParentMismatch { node: Handle, child: Handle },
}

impl InvariantViolation {
    /// Returns the node at which the defect was detected.
    #[must_use]
    pub const fn node(&self) -> Handle {
        match *self {
            Self::RankMismatch { node, .. } | Self::LeafRank { node, .. } | Self::ParentMismatch { node, .. } => node,
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RankMismatch { node, left, right } => {
                write!(f, "rank mismatch at {node}: left edge implies {left}, right edge implies {right}")
            }
            Self::LeafRank { node, rank } => write!(f, "leaf {node} has rank {rank}, expected 0"),
            Self::ParentMismatch { node, child } => write!(f, "child {child} of {node} does not link back to it"),
        }
    }
}

impl core::error::Error for InvariantViolation {}

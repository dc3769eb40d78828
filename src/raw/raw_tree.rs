use core::cmp::Ordering;

use super::nodes::{Nodes, NodesMut};
use super::path::Path;
use crate::entry::{Dir, Linkage};
use crate::error::InvariantViolation;
use crate::handle::Handle;
use crate::ops::TreeOps;
use crate::store::NodeStore;

/// Root, length and scratch state of a weak-AVL tree.
///
/// The tree never owns records. Every operation is handed a [`Nodes`] or
/// [`NodesMut`] view of the caller's store.
#[derive(Clone, Debug, Default)]
pub(crate) struct RawTree {
    pub(super) root: Option<Handle>,
    pub(super) len: usize,
    pub(super) path: Path,
    pub(super) last_rotations: u8,
}

impl RawTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn last_rotations(&self) -> u8 {
        self.last_rotations
    }

    /// Forgets every record without touching the store.
    pub(crate) fn clear(&mut self) {
        self.root = None;
        self.len = 0;
        self.path.clear();
        self.last_rotations = 0;
    }

    // ─── Search ─────────────────────────────────────────────────────────────

    /// Descends by `f`, which orders the visited record against the target.
    /// Returns the exact match along with the last node at which the descent
    /// turned left (`ceil`) and right (`floor`).
    fn search<T, O, S, F>(&self, nodes: Nodes<'_, T, O, S>, mut f: F) -> (Option<Handle>, Option<Handle>, Option<Handle>)
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
        F: FnMut(&T) -> Ordering,
    {
        let (mut floor, mut ceil) = (None, None);
        let mut cur = self.root;
        while let Some(h) = cur {
            match f(nodes.node(h)) {
                Ordering::Less => {
                    floor = Some(h);
                    cur = nodes.child(h, Dir::Right);
                }
                Ordering::Greater => {
                    ceil = Some(h);
                    cur = nodes.child(h, Dir::Left);
                }
                Ordering::Equal => return (Some(h), floor, ceil),
            }
        }
        (None, floor, ceil)
    }

    pub(crate) fn find_by<T, O, S, F>(&self, nodes: Nodes<'_, T, O, S>, f: F) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
        F: FnMut(&T) -> Ordering,
    {
        self.search(nodes, f).0
    }

    pub(crate) fn nfind_by<T, O, S, F>(&self, nodes: Nodes<'_, T, O, S>, f: F) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
        F: FnMut(&T) -> Ordering,
    {
        let (found, _, ceil) = self.search(nodes, f);
        found.or(ceil)
    }

    pub(crate) fn pfind_by<T, O, S, F>(&self, nodes: Nodes<'_, T, O, S>, f: F) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
        F: FnMut(&T) -> Ordering,
    {
        let (found, floor, _) = self.search(nodes, f);
        found.or(floor)
    }

    // ─── Navigation ─────────────────────────────────────────────────────────

    /// Returns the leftmost (`Dir::Left`) or rightmost (`Dir::Right`) node.
    pub(crate) fn first<T, O, S>(&self, nodes: Nodes<'_, T, O, S>, dir: Dir) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        self.root.map(|root| nodes.extreme(root, dir))
    }

    /// Returns the in-order neighbour of `h` towards `dir`: the successor for
    /// `Dir::Right`, the predecessor for `Dir::Left`.
    pub(crate) fn step<T, O, S>(&self, nodes: Nodes<'_, T, O, S>, h: Handle, dir: Dir) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        if let Some(child) = nodes.child(h, dir) {
            return Some(nodes.extreme(child, dir.opposite()));
        }

        if Nodes::<T, O, S>::HAS_PARENT {
            let mut cur = h;
            while let Some(parent) = nodes.parent(cur) {
                if nodes.child(parent, dir) != Some(cur) {
                    return Some(parent);
                }
                cur = parent;
            }
            return None;
        }

        // Without parent links, find `h` again and remember the last ancestor
        // from which the descent turned away from `dir`.
        let mut turn = None;
        let mut cur = self.root;
        while let Some(c) = cur {
            if c == h {
                return turn;
            }
            let towards = match nodes.compare(h, c) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => return None,
            };
            if towards != dir {
                turn = Some(c);
            }
            cur = nodes.child(c, towards);
        }
        None
    }

    // ─── Ancestor tracking ──────────────────────────────────────────────────

    #[inline]
    pub(super) fn push<L: Linkage>(&mut self, h: Handle) {
        if !L::HAS_PARENT {
            self.path.push(h);
        }
    }

    #[inline]
    pub(super) fn pop<L: Linkage>(&mut self) {
        if !L::HAS_PARENT {
            self.path.pop();
        }
    }

    /// Returns the parent of `h`, which must be the node currently being fixed.
    #[inline]
    pub(super) fn parent_of<T, O, S>(&self, nodes: &NodesMut<'_, T, O, S>, h: Handle) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        if NodesMut::<T, O, S>::HAS_PARENT { nodes.parent(h) } else { self.path.last().copied() }
    }

    /// Moves one level up from `h`, the node currently being fixed.
    #[inline]
    pub(super) fn climb<T, O, S>(&mut self, nodes: &NodesMut<'_, T, O, S>, h: Handle) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        if NodesMut::<T, O, S>::HAS_PARENT { nodes.parent(h) } else { self.path.pop() }
    }

    /// Rotates `elm` down towards `dir` under `celm` and counts the rotation.
    #[inline]
    pub(super) fn rotate<T, O, S>(&mut self, nodes: &mut NodesMut<'_, T, O, S>, elm: Handle, celm: Handle, dir: Dir)
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        nodes.rotate(elm, celm, dir);
        self.last_rotations += 1;
    }

    /// Points the link that held `old` at `new` instead.
    pub(super) fn replace_child<T, O, S>(
        &mut self,
        nodes: &mut NodesMut<'_, T, O, S>,
        parent: Option<Handle>,
        old: Handle,
        new: Option<Handle>,
    ) where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let dir = nodes.dir_of(parent, old);
                nodes.set_child(parent, dir, new);
            }
        }
    }

    /// Checks that `node` is linked in this tree. Without parent links this
    /// also leaves the ancestors of `node` on the path.
    pub(super) fn locate<T, O, S>(&mut self, nodes: Nodes<'_, T, O, S>, node: Handle) -> bool
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        self.path.clear();
        let Some(entry) = nodes.try_entry(node) else {
            return false;
        };

        if Nodes::<T, O, S>::HAS_PARENT {
            let mut cur = node;
            let mut parent = entry.parent();
            // A valid tree is never deeper than it is long.
            for _ in 0..=self.len {
                let Some(p) = parent else {
                    return self.root == Some(cur);
                };
                let Some(up) = nodes.try_entry(p) else {
                    return false;
                };
                if up.child(Dir::Left) != Some(cur) && up.child(Dir::Right) != Some(cur) {
                    return false;
                }
                cur = p;
                parent = up.parent();
            }
            return false;
        }

        let mut cur = self.root;
        while let Some(c) = cur {
            if c == node {
                return true;
            }
            let dir = match nodes.compare(node, c) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => break,
            };
            self.path.push(c);
            cur = nodes.child(c, dir);
        }
        self.path.clear();
        false
    }

    // ─── Augmentation ───────────────────────────────────────────────────────

    /// Recomputes aggregates from `start` towards the root.
    ///
    /// Stops at the first node whose aggregate did not change, unless a pending
    /// node has yet to be reached. Always leaves the path empty.
    pub(super) fn augment_walk<T, O, S>(&mut self, nodes: &mut NodesMut<'_, T, O, S>, mut start: Option<Handle>)
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        if nodes.is_augmented() {
            while let Some(h) = start {
                let forced = nodes.pending() == Some(h);
                if !nodes.augment(h) && !forced && nodes.pending().is_none() {
                    break;
                }
                start = self.climb(nodes, h);
            }
        }
        self.path.clear();
    }

    // ─── Diagnostics ────────────────────────────────────────────────────────

    /// Returns the rank of the subtree rooted at `h` after validating it.
    pub(crate) fn rank_of<T, O, S>(nodes: Nodes<'_, T, O, S>, h: Option<Handle>) -> Result<i32, InvariantViolation>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        let Some(node) = h else {
            return Ok(-1);
        };
        let entry = nodes.entry(node);
        let (left, right) = (entry.child(Dir::Left), entry.child(Dir::Right));

        if Nodes::<T, O, S>::HAS_PARENT {
            for child in [left, right].into_iter().flatten() {
                if nodes.parent(child) != Some(node) {
                    return Err(InvariantViolation::ParentMismatch { node, child });
                }
            }
        }

        let left_rank = Self::rank_of(nodes, left)? + 1 + i32::from(entry.rdiff(Dir::Left));
        let right_rank = Self::rank_of(nodes, right)? + 1 + i32::from(entry.rdiff(Dir::Right));
        if left_rank != right_rank {
            return Err(InvariantViolation::RankMismatch {
                node,
                left: left_rank,
                right: right_rank,
            });
        }
        if entry.is_leaf() && left_rank != 0 {
            return Err(InvariantViolation::LeafRank { node, rank: left_rank });
        }
        Ok(left_rank)
    }

    /// Returns the rank of the whole tree, -1 when empty.
    pub(crate) fn rank<T, O, S>(&self, nodes: Nodes<'_, T, O, S>) -> Result<i32, InvariantViolation>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        Self::rank_of(nodes, self.root)
    }
}

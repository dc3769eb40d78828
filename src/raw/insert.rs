use core::cmp::Ordering;

use super::nodes::NodesMut;
use super::raw_tree::RawTree;
use crate::entry::Dir;
use crate::handle::Handle;
use crate::ops::TreeOps;
use crate::store::NodeStore;

impl RawTree {
    /// Links `node` by key. Returns the already linked record that compares
    /// equal, leaving the tree unchanged, or `None` once `node` is linked.
    pub(crate) fn insert<T, O, S>(&mut self, mut nodes: NodesMut<'_, T, O, S>, node: Handle) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        self.path.clear();
        self.last_rotations = 0;

        let mut parent = None;
        let mut dir = Dir::Left;
        let mut cur = self.root;
        while let Some(c) = cur {
            dir = match nodes.compare(node, c) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => {
                    self.path.clear();
                    return Some(c);
                }
            };
            self.push::<O::Entry>(c);
            parent = Some(c);
            cur = nodes.child(c, dir);
        }
        self.pop::<O::Entry>();

        self.link_leaf(&mut nodes, parent, dir, node);
        None
    }

    /// Links `node` as the in-order neighbour of `anchor` on side `dir`
    /// without comparing keys against the rest of the tree.
    ///
    /// # Panics
    ///
    /// Without parent links, panics if `anchor` is not linked in this tree.
    pub(crate) fn insert_beside<T, O, S>(&mut self, mut nodes: NodesMut<'_, T, O, S>, anchor: Handle, node: Handle, dir: Dir)
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        let name = if dir == Dir::Right { "insert_after" } else { "insert_before" };
        debug_assert!(
            {
                let view = nodes.view();
                let order = if dir == Dir::Right { Ordering::Less } else { Ordering::Greater };
                view.compare(anchor, node) == order
                    && self.step(view, anchor, dir).is_none_or(|next| view.compare(node, next) == order)
            },
            "`WavlTree::{name}()` - `node` does not fit beside `anchor`!"
        );

        if NodesMut::<T, O, S>::HAS_PARENT {
            self.path.clear();
        } else {
            assert!(
                self.locate(nodes.view(), anchor),
                "`WavlTree::{name}()` - `anchor` is not linked in this tree!"
            );
        }

        let (parent, slot) = match nodes.child(anchor, dir) {
            None => (anchor, dir),
            Some(child) => {
                self.push::<O::Entry>(anchor);
                let mut cur = child;
                while let Some(next) = nodes.child(cur, dir.opposite()) {
                    self.push::<O::Entry>(cur);
                    cur = next;
                }
                (cur, dir.opposite())
            }
        };

        self.link_leaf(&mut nodes, Some(parent), slot, node);
    }

    /// Hangs `node` as a fresh leaf under `parent` and rebalances.
    ///
    /// The path must hold the ancestors of `parent`.
    fn link_leaf<T, O, S>(&mut self, nodes: &mut NodesMut<'_, T, O, S>, parent: Option<Handle>, dir: Dir, node: Handle)
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        self.last_rotations = 0;
        nodes.reset(node);
        nodes.set_parent(node, parent);
        self.len += 1;
        nodes.augment(node);

        let Some(parent) = parent else {
            self.root = Some(node);
            self.path.clear();
            return;
        };

        let was_two = nodes.rdiff(parent, dir);
        nodes.set_child(parent, dir, Some(node));
        let start = if was_two {
            nodes.set_rdiff(parent, dir, false);
            Some(parent)
        } else {
            self.insert_balance(nodes, parent, node, dir)
        };

        self.augment_walk(nodes, start);
    }

    /// Restores the rank rule after `x`, the child of `p` on side `d`, reached
    /// the same rank as `p`. Returns the node from which aggregates still need
    /// to be recomputed.
    fn insert_balance<T, O, S>(&mut self, nodes: &mut NodesMut<'_, T, O, S>, mut p: Handle, mut x: Handle, mut d: Dir) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        loop {
            let sib = d.opposite();

            if !nodes.rdiff(p, sib) {
                // Promote `p`: its sibling edge grows to 2.
                #[cfg(feature = "tracing")]
                tracing::trace!(node = %p, "insert: promote");

                nodes.set_rdiff(p, sib, true);
                nodes.augment(p);

                let g = self.climb(nodes, p)?;
                let gd = nodes.dir_of(g, p);
                if nodes.rdiff(g, gd) {
                    nodes.set_rdiff(g, gd, false);
                    return Some(g);
                }

                x = p;
                p = g;
                d = gd;
                continue;
            }

            let gp = self.climb(nodes, p);
            let top = if nodes.rdiff(x, d) {
                // The 1-child of `x` is on the inside: double rotation.
                let c = nodes.child(x, sib).expect("`RawTree::insert()` - promoted node has no inner child!");
                let cd = nodes.rdiff(c, d);
                let cs = nodes.rdiff(c, sib);

                #[cfg(feature = "tracing")]
                tracing::trace!(node = %p, child = %x, grandchild = %c, "insert: double rotation");

                self.rotate(nodes, x, c, d);
                nodes.set_child(p, d, Some(c));
                self.rotate(nodes, p, c, sib);

                nodes.set_rdiff(x, d, false);
                nodes.set_rdiff(x, sib, cd);
                nodes.set_rdiff(p, d, cs);
                nodes.set_rdiff(p, sib, false);
                nodes.set_rdiff_bits(c, 0);

                nodes.augment(x);
                nodes.augment(p);
                c
            } else {
                #[cfg(feature = "tracing")]
                tracing::trace!(node = %p, child = %x, "insert: single rotation");

                self.rotate(nodes, p, x, sib);

                nodes.set_rdiff_bits(p, 0);
                nodes.set_rdiff_bits(x, 0);

                nodes.augment(p);
                x
            };

            nodes.set_parent(top, gp);
            self.replace_child(nodes, gp, p, Some(top));
            nodes.augment(top);
            return gp;
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::super::tests::{Harness, h};
    use crate::entry::{CompactEntry, Dir, Entry, Linkage};
    use alloc::vec::Vec;
    use pretty_assertions::assert_eq;

    fn ascending_three<L: Linkage>() {
        let mut harness = Harness::<L>::new(3);
        harness.insert(0);
        harness.insert(1);
        assert_eq!(harness.tree.last_rotations(), 0);

        // 0 -> 1 -> 2 is a right chain: one left rotation at 0.
        harness.insert(2);
        assert_eq!(harness.tree.last_rotations(), 1);
        assert_eq!(harness.tree.root(), Some(h(1)));
        assert_eq!(harness.child(1, Dir::Left), Some(h(0)));
        assert_eq!(harness.child(1, Dir::Right), Some(h(2)));
        assert_eq!(harness.rank(), 1);
        assert_eq!(harness.in_order(), [0, 1, 2]);
    }

    fn zig_zag<L: Linkage>() {
        let mut harness = Harness::<L>::new(3);
        harness.insert(2);
        harness.insert(0);

        // 1 lands inside 0: double rotation lifts it to the root.
        harness.insert(1);
        assert_eq!(harness.tree.last_rotations(), 2);
        assert_eq!(harness.tree.root(), Some(h(1)));
        assert_eq!(harness.child(1, Dir::Left), Some(h(0)));
        assert_eq!(harness.child(1, Dir::Right), Some(h(2)));
        assert_eq!(harness.rank(), 1);
    }

    fn promote_then_absorb<L: Linkage>() {
        let mut harness = Harness::<L>::new(8);
        for key in [4, 2, 6, 1] {
            harness.insert(key);
        }
        // 1 promotes 2 and 4; inserting 3 beside it needs no change in rank.
        assert_eq!(harness.rank(), 2);
        harness.insert(3);
        assert_eq!(harness.tree.last_rotations(), 0);
        assert_eq!(harness.rank(), 2);
        assert_eq!(harness.in_order(), [1, 2, 3, 4, 6]);
    }

    fn duplicate_is_rejected<L: Linkage>() {
        let mut harness = Harness::<L>::with_keys(&[5, 5]);
        assert_eq!(harness.try_insert(0), None);
        assert_eq!(harness.try_insert(1), Some(h(0)));
        assert_eq!(harness.tree.len(), 1);
        assert_eq!(harness.child(0, Dir::Left), None);
    }

    fn beside<L: Linkage>() {
        let mut harness = Harness::<L>::new(6);
        for key in [0, 2, 4] {
            harness.insert(key);
        }
        harness.insert_beside(2, 3, Dir::Right);
        harness.insert_beside(0, 1, Dir::Right);
        harness.insert_beside(4, 5, Dir::Right);
        assert_eq!(harness.in_order(), [0, 1, 2, 3, 4, 5]);
        assert!(harness.tree.last_rotations() <= 2);
        harness.rank();
    }

    fn rotations_per_insert<L: Linkage>() {
        let mut harness = Harness::<L>::new(8);
        let mut counts = Vec::new();
        for key in 0..8 {
            harness.insert(key);
            counts.push(harness.tree.last_rotations());
        }
        assert_eq!(counts, [0, 0, 1, 0, 1, 1, 1, 0]);
        harness.rank();

        // A rejected duplicate or a failed removal does not inherit the
        // previous count.
        let mut harness = Harness::<L>::new(4);
        for key in 0..3 {
            harness.insert(key);
        }
        assert_eq!(harness.tree.last_rotations(), 1);
        assert_eq!(harness.try_insert(2), Some(h(2)));
        assert_eq!(harness.tree.last_rotations(), 0);

        harness.insert(3);
        assert_eq!(harness.remove(0), Some(h(0)));
        assert_eq!(harness.tree.last_rotations(), 1);
        assert_eq!(harness.remove(0), None);
        assert_eq!(harness.tree.last_rotations(), 0);
        harness.rank();
    }

    #[test]
    fn ascending_three_rotates_once() {
        ascending_three::<Entry>();
        ascending_three::<CompactEntry>();
    }

    #[test]
    fn rotations_are_counted() {
        rotations_per_insert::<Entry>();
        rotations_per_insert::<CompactEntry>();
    }

    #[test]
    fn zig_zag_rotates_twice() {
        zig_zag::<Entry>();
        zig_zag::<CompactEntry>();
    }

    #[test]
    fn promotion_absorbed_by_two_child() {
        promote_then_absorb::<Entry>();
        promote_then_absorb::<CompactEntry>();
    }

    #[test]
    fn duplicate_keys() {
        duplicate_is_rejected::<Entry>();
        duplicate_is_rejected::<CompactEntry>();
    }

    #[test]
    fn insert_beside_anchor() {
        beside::<Entry>();
        beside::<CompactEntry>();
    }

    #[test]
    #[should_panic(expected = "`WavlTree::insert_before()` - `anchor` is not linked in this tree!")]
    fn beside_unlinked_anchor() {
        let mut harness = Harness::<CompactEntry>::new(3);
        harness.insert(0);
        harness.insert_beside(2, 1, Dir::Left);
    }
}

use super::nodes::NodesMut;
use super::raw_tree::RawTree;
use crate::entry::Dir;
use crate::handle::Handle;
use crate::ops::TreeOps;
use crate::store::NodeStore;

impl RawTree {
    /// Unlinks `node`. Returns `None`, leaving the tree unchanged, if `node` is
    /// not linked in this tree.
    pub(crate) fn remove<T, O, S>(&mut self, mut nodes: NodesMut<'_, T, O, S>, node: Handle) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        self.last_rotations = 0;
        if !self.locate(nodes.view(), node) {
            #[cfg(feature = "tracing")]
            tracing::debug!(node = %node, "remove: not linked in this tree");
            return None;
        }

        let parent = self.parent_of(&nodes, node);
        let left = nodes.child(node, Dir::Left);
        let right = nodes.child(node, Dir::Right);

        let start = if let (Some(left), Some(right)) = (left, right) {
            // Unlink the successor and graft it where `node` was.
            let slot = self.path.len();
            self.push::<O::Entry>(node);
            let mut succ = right;
            while let Some(next) = nodes.child(succ, Dir::Left) {
                self.push::<O::Entry>(succ);
                succ = next;
            }

            let orphan = nodes.child(succ, Dir::Right);
            let (fix, dir) = if succ == right {
                (succ, Dir::Right)
            } else {
                let above = self
                    .parent_of(&nodes, succ)
                    .expect("`RawTree::remove()` - successor has no parent!");
                nodes.set_child(above, Dir::Left, orphan);
                nodes.set_child(succ, Dir::Right, Some(right));
                nodes.set_parent(right, Some(succ));
                (above, Dir::Left)
            };

            nodes.set_child(succ, Dir::Left, Some(left));
            nodes.set_parent(left, Some(succ));
            let bits = nodes.rdiff_bits(node);
            nodes.set_rdiff_bits(succ, bits);
            nodes.set_parent(succ, parent);
            self.replace_child(&mut nodes, parent, node, Some(succ));
            if let Some(orphan) = orphan {
                nodes.set_parent(orphan, Some(fix));
            }

            if !NodesMut::<T, O, S>::HAS_PARENT {
                self.path[slot] = succ;
            }
            self.pop::<O::Entry>();
            nodes.set_pending(succ);
            self.remove_balance(&mut nodes, fix, dir)
        } else {
            let child = left.or(right);
            match parent {
                None => {
                    self.root = child;
                    if let Some(child) = child {
                        nodes.set_parent(child, None);
                    }
                    None
                }
                Some(parent) => {
                    let dir = nodes.dir_of(parent, node);
                    nodes.set_child(parent, dir, child);
                    if let Some(child) = child {
                        nodes.set_parent(child, Some(parent));
                    }
                    self.pop::<O::Entry>();
                    self.remove_balance(&mut nodes, parent, dir)
                }
            }
        };

        self.augment_walk(&mut nodes, start);
        nodes.reset(node);
        self.len -= 1;
        Some(node)
    }

    /// Restores the rank rule after the subtree of `p` on side `d` lost one
    /// rank. Returns the node from which aggregates still need to be
    /// recomputed.
    fn remove_balance<T, O, S>(&mut self, nodes: &mut NodesMut<'_, T, O, S>, mut p: Handle, mut d: Dir) -> Option<Handle>
    where
        O: TreeOps<T>,
        S: NodeStore<T> + ?Sized,
    {
        if nodes.is_leaf(p) {
            // A leaf must have rank 0: demote `p` before looking further up.
            #[cfg(feature = "tracing")]
            tracing::trace!(node = %p, "remove: demote leaf");

            nodes.set_rdiff_bits(p, 0);
            nodes.augment(p);
            let g = self.climb(nodes, p)?;
            d = nodes.dir_of(g, p);
            p = g;
        }

        loop {
            let sib = d.opposite();

            if !nodes.rdiff(p, d) {
                nodes.set_rdiff(p, d, true);
                return Some(p);
            }

            if nodes.rdiff(p, sib) {
                #[cfg(feature = "tracing")]
                tracing::trace!(node = %p, "remove: demote");

                nodes.set_rdiff(p, sib, false);
            } else {
                let y = nodes.child(p, sib).expect("`RawTree::remove()` - 1-sibling is missing!");
                let yd = nodes.rdiff(y, d);
                let yo = nodes.rdiff(y, sib);

                if yd && yo {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(node = %p, sibling = %y, "remove: demote with sibling");

                    nodes.set_rdiff_bits(y, 0);
                } else {
                    let gp = self.climb(nodes, p);
                    let top = if yo {
                        // The outer child of `y` is a 2-child: double rotation.
                        let w = nodes.child(y, d).expect("`RawTree::remove()` - inner nephew is missing!");
                        let wd = nodes.rdiff(w, d);
                        let wo = nodes.rdiff(w, sib);

                        #[cfg(feature = "tracing")]
                        tracing::trace!(node = %p, sibling = %y, nephew = %w, "remove: double rotation");

                        self.rotate(nodes, y, w, sib);
                        nodes.set_child(p, sib, Some(w));
                        self.rotate(nodes, p, w, d);

                        nodes.set_rdiff(p, d, false);
                        nodes.set_rdiff(p, sib, wd);
                        nodes.set_rdiff(y, d, wo);
                        nodes.set_rdiff(y, sib, false);
                        nodes.set_rdiff_bits(w, 0b11);

                        nodes.augment(p);
                        nodes.augment(y);
                        w
                    } else {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(node = %p, sibling = %y, "remove: single rotation");

                        self.rotate(nodes, p, y, d);

                        if yd {
                            // `p` ends up with two children of equal rank: demoted twice.
                            nodes.set_rdiff_bits(p, 0);
                            nodes.set_rdiff_bits(y, 0b11);
                        } else {
                            nodes.set_rdiff(p, d, true);
                            nodes.set_rdiff(p, sib, false);
                            nodes.set_rdiff(y, d, false);
                            nodes.set_rdiff(y, sib, true);
                        }

                        nodes.augment(p);
                        y
                    };

                    nodes.set_parent(top, gp);
                    self.replace_child(nodes, gp, p, Some(top));
                    nodes.augment(top);
                    return gp;
                }
            }

            nodes.augment(p);
            let g = self.climb(nodes, p)?;
            d = nodes.dir_of(g, p);
            p = g;
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::super::tests::{Harness, h};
    use crate::entry::{CompactEntry, Dir, Entry, Linkage};
    use pretty_assertions::assert_eq;

    fn leaf_and_root<L: Linkage>() {
        let mut harness = Harness::<L>::new(3);
        for key in [1, 0, 2] {
            harness.insert(key);
        }

        assert_eq!(harness.remove(0), Some(h(0)));
        assert_eq!(harness.tree.last_rotations(), 0);
        assert_eq!(harness.in_order(), [1, 2]);
        assert_eq!(harness.rank(), 1);

        // Root with a single child.
        assert_eq!(harness.remove(1), Some(h(1)));
        assert_eq!(harness.tree.root(), Some(h(2)));
        assert_eq!(harness.rank(), 0);

        assert_eq!(harness.remove(2), Some(h(2)));
        assert_eq!(harness.tree.root(), None);
        assert_eq!(harness.tree.len(), 0);
        assert_eq!(harness.rank(), -1);
    }

    fn not_linked<L: Linkage>() {
        let mut harness = Harness::<L>::new(3);
        harness.insert(0);
        harness.insert(1);
        assert_eq!(harness.remove(2), None);
        assert_eq!(harness.remove(1), Some(h(1)));
        assert_eq!(harness.remove(1), None);
        assert_eq!(harness.tree.len(), 1);
    }

    fn successor_graft<L: Linkage>() {
        let mut harness = Harness::<L>::new(16);
        for key in [8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15] {
            harness.insert(key);
        }
        assert_eq!(harness.rank(), 3);

        // 9 replaces 8 at the root.
        assert_eq!(harness.remove(8), Some(h(8)));
        assert_eq!(harness.tree.root(), Some(h(9)));
        assert_eq!(harness.child(9, Dir::Left), Some(h(4)));
        assert_eq!(harness.child(9, Dir::Right), Some(h(12)));
        harness.rank();

        // 5 is the leftmost node under 6.
        assert_eq!(harness.remove(4), Some(h(4)));
        assert_eq!(harness.child(9, Dir::Left), Some(h(5)));
        harness.rank();

        // Now the successor of 5 is its right child itself.
        assert_eq!(harness.remove(5), Some(h(5)));
        assert_eq!(harness.child(9, Dir::Left), Some(h(6)));
        assert_eq!(harness.child(6, Dir::Left), Some(h(2)));
        assert_eq!(harness.child(6, Dir::Right), Some(h(7)));
        harness.rank();

        assert_eq!(harness.in_order(), [1, 2, 3, 6, 7, 9, 10, 11, 12, 13, 14, 15]);
    }

    fn rotation_on_removal<L: Linkage>() {
        let mut harness = Harness::<L>::new(4);
        for key in [1, 0, 2, 3] {
            harness.insert(key);
        }

        // Removing 0 leaves 1 with a 3-edge on the left and a 2,1 sibling.
        harness.remove(0);
        assert_eq!(harness.tree.last_rotations(), 1);
        assert_eq!(harness.tree.root(), Some(h(2)));
        assert_eq!(harness.child(2, Dir::Left), Some(h(1)));
        assert_eq!(harness.rank(), 2);
        assert_eq!(harness.in_order(), [1, 2, 3]);
    }

    fn double_rotation_on_removal<L: Linkage>() {
        let mut harness = Harness::<L>::new(4);
        for key in [1, 0, 3, 2] {
            harness.insert(key);
        }

        // The sibling 3 has its 1-child on the inside.
        harness.remove(0);
        assert_eq!(harness.tree.last_rotations(), 2);
        assert_eq!(harness.tree.root(), Some(h(2)));
        assert_eq!(harness.child(2, Dir::Left), Some(h(1)));
        assert_eq!(harness.child(2, Dir::Right), Some(h(3)));
        assert_eq!(harness.rank(), 2);
        assert_eq!(harness.in_order(), [1, 2, 3]);
    }

    #[test]
    fn remove_leaf_and_root() {
        leaf_and_root::<Entry>();
        leaf_and_root::<CompactEntry>();
    }

    #[test]
    fn remove_not_linked() {
        not_linked::<Entry>();
        not_linked::<CompactEntry>();
    }

    #[test]
    fn remove_grafts_successor() {
        successor_graft::<Entry>();
        successor_graft::<CompactEntry>();
    }

    #[test]
    fn remove_single_rotation() {
        rotation_on_removal::<Entry>();
        rotation_on_removal::<CompactEntry>();
    }

    #[test]
    fn remove_double_rotation() {
        double_rotation_on_removal::<Entry>();
        double_rotation_on_removal::<CompactEntry>();
    }
}

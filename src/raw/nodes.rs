use core::cmp::Ordering;
use core::marker::PhantomData;

use crate::entry::{Dir, Linkage};
use crate::handle::Handle;
use crate::ops::TreeOps;
use crate::store::NodeStore;

/// Shared view of a store through a tree's [`TreeOps`].
pub(crate) struct Nodes<'a, T, O, S: ?Sized> {
    ops: &'a O,
    store: &'a S,
    marker: PhantomData<&'a T>,
}

impl<T, O, S: ?Sized> Clone for Nodes<'_, T, O, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, O, S: ?Sized> Copy for Nodes<'_, T, O, S> {}

impl<'a, T: 'a, O, S> Nodes<'a, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
    pub(crate) const HAS_PARENT: bool = O::Entry::HAS_PARENT;

    #[inline]
    pub(crate) const fn new(ops: &'a O, store: &'a S) -> Self {
        Self {
            ops,
            store,
            marker: PhantomData,
        }
    }

    /// Returns the record behind `h`.
    #[inline]
    pub(crate) fn node(self, h: Handle) -> &'a T {
        self.store.node(h)
    }

    /// Returns the linkage of `h`.
    #[inline]
    pub(crate) fn entry(self, h: Handle) -> &'a O::Entry {
        self.ops.entry(self.store.node(h))
    }

    /// Returns the linkage of `h`, or `None` if `h` does not index the store.
    #[inline]
    pub(crate) fn try_entry(self, h: Handle) -> Option<&'a O::Entry> {
        self.store.get(h).map(|node| self.ops.entry(node))
    }

    #[inline]
    pub(crate) fn child(self, h: Handle, dir: Dir) -> Option<Handle> {
        self.entry(h).child(dir)
    }

    #[inline]
    pub(crate) fn parent(self, h: Handle) -> Option<Handle> {
        self.entry(h).parent()
    }

    #[inline]
    pub(crate) fn rdiff(self, h: Handle, dir: Dir) -> bool {
        self.entry(h).rdiff(dir)
    }

    /// Returns the side of `parent` that `child` hangs from.
    #[inline]
    pub(crate) fn dir_of(self, parent: Handle, child: Handle) -> Dir {
        if self.child(parent, Dir::Left) == Some(child) { Dir::Left } else { Dir::Right }
    }

    /// Follows `dir` links from `h` as far as they go.
    pub(crate) fn extreme(self, mut h: Handle, dir: Dir) -> Handle {
        while let Some(next) = self.child(h, dir) {
            h = next;
        }
        h
    }

    #[inline]
    pub(crate) fn compare(self, a: Handle, b: Handle) -> Ordering {
        self.ops.compare(self.store.node(a), self.store.node(b))
    }
}

/// Exclusive view of a store through a tree's [`TreeOps`].
///
/// Also tracks a pending node: one whose aggregate must be recomputed before
/// aggregate propagation may stop early.
pub(crate) struct NodesMut<'a, T, O, S: ?Sized> {
    ops: &'a O,
    store: &'a mut S,
    pending: Option<Handle>,
    marker: PhantomData<fn(&T)>,
}

impl<'a, T, O, S> NodesMut<'a, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
    pub(crate) const HAS_PARENT: bool = O::Entry::HAS_PARENT;

    #[inline]
    pub(crate) const fn new(ops: &'a O, store: &'a mut S) -> Self {
        Self {
            ops,
            store,
            pending: None,
            marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn view(&self) -> Nodes<'_, T, O, S> {
        Nodes::new(self.ops, self.store)
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, h: Handle) -> &mut O::Entry {
        self.ops.entry_mut(self.store.node_mut(h))
    }

    #[inline]
    pub(crate) fn child(&self, h: Handle, dir: Dir) -> Option<Handle> {
        self.view().child(h, dir)
    }

    #[inline]
    pub(crate) fn parent(&self, h: Handle) -> Option<Handle> {
        self.view().parent(h)
    }

    #[inline]
    pub(crate) fn rdiff(&self, h: Handle, dir: Dir) -> bool {
        self.view().rdiff(h, dir)
    }

    #[inline]
    pub(crate) fn rdiff_bits(&self, h: Handle) -> u8 {
        self.view().entry(h).rdiff_bits()
    }

    #[inline]
    pub(crate) fn is_leaf(&self, h: Handle) -> bool {
        self.view().entry(h).is_leaf()
    }

    #[inline]
    pub(crate) fn dir_of(&self, parent: Handle, child: Handle) -> Dir {
        self.view().dir_of(parent, child)
    }

    #[inline]
    pub(crate) fn compare(&self, a: Handle, b: Handle) -> Ordering {
        self.view().compare(a, b)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, h: Handle, dir: Dir, child: Option<Handle>) {
        self.entry_mut(h).set_child(dir, child);
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, h: Handle, parent: Option<Handle>) {
        if Self::HAS_PARENT {
            self.entry_mut(h).set_parent(parent);
        }
    }

    #[inline]
    pub(crate) fn set_rdiff(&mut self, h: Handle, dir: Dir, two: bool) {
        self.entry_mut(h).set_rdiff(dir, two);
    }

    #[inline]
    pub(crate) fn set_rdiff_bits(&mut self, h: Handle, bits: u8) {
        self.entry_mut(h).set_rdiff_bits(bits);
    }

    /// Resets the linkage of `h` to the unlinked state.
    #[inline]
    pub(crate) fn reset(&mut self, h: Handle) {
        *self.entry_mut(h) = O::Entry::default();
    }

    /// Rotates `elm` down towards `dir`, lifting its child `celm` into its place.
    ///
    /// `celm` must be the child of `elm` opposite `dir`. Rank bits and the link
    /// from `elm`'s former parent are left to the caller.
    pub(crate) fn rotate(&mut self, elm: Handle, celm: Handle, dir: Dir) {
        debug_assert_eq!(self.child(elm, dir.opposite()), Some(celm));

        let inner = self.child(celm, dir);
        self.set_child(elm, dir.opposite(), inner);
        if let Some(inner) = inner {
            self.set_parent(inner, Some(elm));
        }
        self.set_child(celm, dir, Some(elm));
        self.set_parent(elm, Some(celm));
    }

    #[inline]
    pub(crate) fn is_augmented(&self) -> bool {
        self.ops.is_augmented()
    }

    #[inline]
    pub(crate) const fn pending(&self) -> Option<Handle> {
        self.pending
    }

    #[inline]
    pub(crate) const fn set_pending(&mut self, h: Handle) {
        self.pending = Some(h);
    }

    /// Recomputes the aggregate of `h` and returns `true` if it changed.
    pub(crate) fn augment(&mut self, h: Handle) -> bool {
        if self.pending == Some(h) {
            self.pending = None;
        }
        if !self.ops.is_augmented() {
            return false;
        }

        let entry = self.view().entry(h);
        let (left, right) = (entry.child(Dir::Left), entry.child(Dir::Right));
        let (node, left, right) = self.store.node_with_children(h, left, right);
        self.ops.augment(node, left, right)
    }
}

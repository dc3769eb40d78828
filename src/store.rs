use alloc::vec::Vec;

use crate::handle::Handle;

/// Caller-owned storage that a tree's [`Handle`]s index into.
///
/// The tree never allocates, moves or drops records; every operation borrows
/// the store for its duration. Implementations are provided for slices,
/// `Vec<T>` and [`Arena<T>`](crate::Arena).
pub trait NodeStore<T> {
    /// Returns the record behind `handle`, if any.
    fn get(&self, handle: Handle) -> Option<&T>;

    /// Returns the record behind `handle` mutably, if any.
    fn get_mut(&mut self, handle: Handle) -> Option<&mut T>;

    /// Borrows `node` mutably together with its two children.
    ///
    /// `left` and `right` are distinct from `node` and from each other. This is
    /// what lets an augmentation callback read both children while updating the
    /// parent.
    ///
    /// # Panics
    ///
    /// Panics if any of the handles is invalid.
    fn node_with_children(
        &mut self,
        node: Handle,
        left: Option<Handle>,
        right: Option<Handle>,
    ) -> (&mut T, Option<&T>, Option<&T>);

    /// Returns the record behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is invalid.
    #[inline]
    fn node(&self, handle: Handle) -> &T {
        self.get(handle).expect("`NodeStore::node()` - `handle` is invalid!")
    }

    /// Returns the record behind `handle` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is invalid.
    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut T {
        self.get_mut(handle).expect("`NodeStore::node_mut()` - `handle` is invalid!")
    }
}

impl<T> NodeStore<T> for [T] {
    #[inline]
    fn get(&self, handle: Handle) -> Option<&T> {
        <[T]>::get(self, handle.to_index())
    }

    #[inline]
    fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        <[T]>::get_mut(self, handle.to_index())
    }

    fn node_with_children(
        &mut self,
        node: Handle,
        left: Option<Handle>,
        right: Option<Handle>,
    ) -> (&mut T, Option<&T>, Option<&T>) {
        split_with_children(self, node, left, right)
    }
}

impl<T> NodeStore<T> for Vec<T> {
    #[inline]
    fn get(&self, handle: Handle) -> Option<&T> {
        self.as_slice().get(handle.to_index())
    }

    #[inline]
    fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.as_mut_slice().get_mut(handle.to_index())
    }

    fn node_with_children(
        &mut self,
        node: Handle,
        left: Option<Handle>,
        right: Option<Handle>,
    ) -> (&mut T, Option<&T>, Option<&T>) {
        split_with_children(self.as_mut_slice(), node, left, right)
    }
}

/// Splits `slots` into the slot at `node` (mutable) and the slots at `left` and
/// `right` (shared).
pub(crate) fn split_with_children<S>(
    slots: &mut [S],
    node: Handle,
    left: Option<Handle>,
    right: Option<Handle>,
) -> (&mut S, Option<&S>, Option<&S>) {
    let index = node.to_index();
    debug_assert!(left != Some(node) && right != Some(node), "`NodeStore::node_with_children()` - child is `node`!");

    let (before, rest) = slots.split_at_mut(index);
    let (target, after) = rest.split_first_mut().expect("`NodeStore::node_with_children()` - `node` is invalid!");
    let before: &[S] = before;
    let after: &[S] = after;

    let left = left.map(|h| pick(before, after, index, h.to_index()));
    let right = right.map(|h| pick(before, after, index, h.to_index()));
    (target, left, right)
}

#[inline]
fn pick<'a, S>(before: &'a [S], after: &'a [S], split: usize, index: usize) -> &'a S {
    if index < split {
        &before[index]
    } else {
        &after[index - split - 1]
    }
}

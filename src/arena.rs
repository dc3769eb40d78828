use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::handle::Handle;
use crate::store::{NodeStore, split_with_children};

/// A slot allocator handing out stable [`Handle`]s.
///
/// Freed slots are recycled before the backing vector grows, so handles stay
/// dense. The arena owns node memory; a [`WavlTree`](crate::WavlTree) only links
/// the records it is given.
///
/// # Examples
///
/// ```
/// use wavl_tree::Arena;
///
/// let mut arena = Arena::new();
/// let a = arena.alloc("a");
/// let b = arena.alloc("b");
/// assert_eq!(arena[a], "a");
///
/// assert_eq!(arena.take(a), Some("a"));
/// assert_eq!(arena.get(a), None);
/// assert_eq!(arena.alloc("c"), a);
/// assert_eq!(arena[b], "b");
/// ```
#[derive(Clone, Debug)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Creates an empty arena with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Returns the number of records the arena can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the number of live records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    /// Returns `true` if the arena holds no live records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `element` and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if the arena already holds [`Handle::MAX`] slots.
    pub fn alloc(&mut self, element: T) -> Handle {
        let Some(h) = self.free.pop() else {
            let index = self.slots.len();
            assert!(index < Handle::MAX, "`Arena::alloc()` - all {} slots are in use!", Handle::MAX);
            self.slots.push(Some(element));
            return Handle::from_index(index);
        };
        let slot = &mut self.slots[h.to_index()];
        debug_assert!(slot.is_none(), "`Arena::alloc()` - recycled slot is occupied!");
        *slot = Some(element);
        h
    }

    /// Returns the record behind `handle`, or `None` if the slot is free.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.as_slice().get(handle.to_index()).and_then(Option::as_ref)
    }

    /// Returns the record behind `handle` mutably, or `None` if the slot is free.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.as_mut_slice().get_mut(handle.to_index()).and_then(Option::as_mut)
    }

    /// Removes the record behind `handle` and recycles its slot.
    ///
    /// The record must already be unlinked from every tree that references it.
    pub fn take(&mut self, handle: Handle) -> Option<T> {
        self.slots
            .as_mut_slice()
            .get_mut(handle.to_index())?
            .take()
            .inspect(|_| self.free.push(handle))
    }

    /// Drops the record behind `handle` and recycles its slot.
    pub fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Returns an iterator over the live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|element| (Handle::from_index(index), element)))
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: Handle) -> &T {
        self.get(handle).expect("`Arena::index()` - `handle` is invalid!")
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        self.get_mut(handle).expect("`Arena::index_mut()` - `handle` is invalid!")
    }
}

impl<T> NodeStore<T> for Arena<T> {
    #[inline]
    fn get(&self, handle: Handle) -> Option<&T> {
        Arena::get(self, handle)
    }

    #[inline]
    fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        Arena::get_mut(self, handle)
    }

    fn node_with_children(
        &mut self,
        node: Handle,
        left: Option<Handle>,
        right: Option<Handle>,
    ) -> (&mut T, Option<&T>, Option<&T>) {
        let (node, left, right) = split_with_children(self.slots.as_mut_slice(), node, left, right);
        (
            node.as_mut().expect("`Arena::node_with_children()` - `node` is invalid!"),
            left.map(|slot| slot.as_ref().expect("`Arena::node_with_children()` - `left` is invalid!")),
            right.map(|slot| slot.as_ref().expect("`Arena::node_with_children()` - `right` is invalid!")),
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arena_capacity() {
        let arena: Arena<u32> = Arena::with_capacity(10);
        assert_eq!(arena.capacity(), 10);
    }

    #[test]
    #[should_panic(expected = "`Arena::index()` - `handle` is invalid!")]
    fn index_freed_slot() {
        let mut arena = Arena::new();
        let h = arena.alloc(1_u8);
        arena.free(h);
        let _ = arena[h];
    }

    #[test]
    fn node_with_children_splits_slots() {
        let mut arena = Arena::new();
        let a = arena.alloc(1_u32);
        let b = arena.alloc(2_u32);
        let c = arena.alloc(3_u32);

        let (node, left, right) = arena.node_with_children(b, Some(c), Some(a));
        *node += left.copied().unwrap_or(0) + right.copied().unwrap_or(0);
        assert_eq!(arena[b], 6);

        let (node, left, right) = arena.node_with_children(a, None, Some(c));
        assert_eq!((*node, left, right), (1, None, Some(&3)));
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, u32)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        let handle = arena.alloc(value);
                        model.push((handle, value));
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        arena[handle] = value;
                        model[index].1 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        let (_, expected) = model.swap_remove(index);
                        prop_assert_eq!(arena.take(handle), Some(expected));
                        prop_assert_eq!(arena.take(handle), None);
                    }
                    Operation::Clear => {
                        arena.clear();
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());
                prop_assert_eq!(arena.iter().count(), model.len());

                for &(handle, value) in &model {
                    prop_assert_eq!(arena.get(handle), Some(&value));
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        GetMut(usize, u32),
        Take(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            5 => any::<usize>().prop_map(Operation::Take),
            1 => Just(Operation::Clear),
        ]
    }
}

use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::entry::{Dir, Entry, Linkage};
use crate::error::InvariantViolation;
use crate::handle::Handle;
use crate::ops::{TreeOps, TreeType};
use crate::raw::{Nodes, NodesMut, RawTree};
use crate::store::NodeStore;

/// An intrusive ordered tree balanced by the weak-AVL rank rule.
///
/// Records live in caller-owned storage (any [`NodeStore`]) and embed the
/// linkage chosen by `O::Entry`: [`Entry`] for parent links and O(1) amortized
/// navigation, or [`CompactEntry`](crate::CompactEntry) for one link less per
/// record. The tree itself holds only the root, the length and scratch space,
/// so every operation takes the store as an argument.
///
/// Every insertion and removal performs at most two rotations, and the height
/// never exceeds `2 * log2(n + 1)`.
///
/// It is a logic error to change a record's key, or to move or drop a record,
/// while it is linked. The tree cannot detect this; lookups may then miss
/// records and [`rank`](WavlTree::rank) may report violations.
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use wavl_tree::{Arena, Entry, TreeOps, WavlTree};
///
/// #[derive(Default)]
/// struct Job {
///     priority: u32,
///     link: Entry,
/// }
///
/// #[derive(Default)]
/// struct ByPriority;
///
/// impl TreeOps<Job> for ByPriority {
///     type Entry = Entry;
///
///     fn entry<'a>(&self, node: &'a Job) -> &'a Entry {
///         &node.link
///     }
///
///     fn entry_mut<'a>(&self, node: &'a mut Job) -> &'a mut Entry {
///         &mut node.link
///     }
///
///     fn compare(&self, a: &Job, b: &Job) -> Ordering {
///         a.priority.cmp(&b.priority)
///     }
/// }
///
/// let mut jobs = Arena::new();
/// let mut queue: WavlTree<Job, ByPriority> = WavlTree::new();
///
/// for priority in [30, 10, 20] {
///     let job = jobs.alloc(Job { priority, ..Job::default() });
///     queue.insert(&mut jobs, job);
/// }
///
/// // Pop the most urgent job.
/// let first = queue.min(&jobs).unwrap();
/// queue.remove(&mut jobs, first);
/// assert_eq!(jobs.take(first).unwrap().priority, 10);
///
/// let rest: Vec<u32> = queue.iter(&jobs).map(|(_, job)| job.priority).collect();
/// assert_eq!(rest, [20, 30]);
/// ```
pub struct WavlTree<T, O> {
    raw: RawTree,
    ops: O,
    marker: PhantomData<fn(&T)>,
}

/// A tree driven by a runtime [`TreeType`] descriptor.
pub type DynTree<T, E = Entry> = WavlTree<T, TreeType<T, E>>;

impl<T, O: TreeOps<T> + Default> WavlTree<T, O> {
    /// Creates an empty tree.
    ///
    /// # Complexity
    ///
    /// O(1).
    #[must_use]
    pub fn new() -> Self {
        Self::with_ops(O::default())
    }
}

impl<T, O: TreeOps<T> + Default> Default for WavlTree<T, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, O: TreeOps<T>> fmt::Debug for WavlTree<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WavlTree")
            .field("root", &self.raw.root())
            .field("len", &self.raw.len())
            .finish_non_exhaustive()
    }
}

impl<T, O: TreeOps<T>> WavlTree<T, O> {
    /// Creates an empty tree that accesses records through `ops`.
    ///
    /// # Complexity
    ///
    /// O(1).
    #[must_use]
    pub fn with_ops(ops: O) -> Self {
        Self {
            raw: RawTree::new(),
            ops,
            marker: PhantomData,
        }
    }

    /// Returns the record accessor this tree was built with.
    #[must_use]
    pub const fn ops(&self) -> &O {
        &self.ops
    }

    /// Returns the number of linked records.
    ///
    /// # Complexity
    ///
    /// O(1).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if no records are linked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the root record.
    #[must_use]
    pub const fn root(&self) -> Option<Handle> {
        self.raw.root()
    }

    /// Returns the number of rotations performed by the most recent
    /// [`insert`](WavlTree::insert), [`insert_after`](WavlTree::insert_after),
    /// [`insert_before`](WavlTree::insert_before) or [`remove`](WavlTree::remove).
    /// Never more than 2.
    #[must_use]
    pub const fn last_rotations(&self) -> u8 {
        self.raw.last_rotations()
    }

    /// Forgets every record. The records themselves are not touched and keep
    /// their stale linkage.
    ///
    /// # Complexity
    ///
    /// O(1).
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    #[inline]
    fn view<'a, S: NodeStore<T> + ?Sized>(&'a self, nodes: &'a S) -> Nodes<'a, T, O, S> {
        Nodes::new(&self.ops, nodes)
    }

    // ─── Mutation ───────────────────────────────────────────────────────────

    /// Links `node` by its key.
    ///
    /// Returns `None` once `node` is linked. If a record with an equal key is
    /// already linked, returns that record and leaves the tree and `node`
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = [7, 3, 7].into_iter().map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    ///
    /// assert_eq!(tree.insert(&mut items, Handle::from_index(0)), None);
    /// assert_eq!(tree.insert(&mut items, Handle::from_index(1)), None);
    /// assert_eq!(tree.insert(&mut items, Handle::from_index(2)), Some(Handle::from_index(0)));
    /// assert_eq!(tree.len(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n), at most two rotations.
    pub fn insert<S: NodeStore<T> + ?Sized>(&mut self, nodes: &mut S, node: Handle) -> Option<Handle> {
        self.raw.insert(NodesMut::new(&self.ops, nodes), node)
    }

    /// Links `node` as the immediate successor of `anchor`.
    ///
    /// `node` must order strictly between `anchor` and its current successor;
    /// this is only checked in debug builds.
    ///
    /// # Panics
    ///
    /// With [`CompactEntry`](crate::CompactEntry) linkage, panics if `anchor`
    /// is not linked in this tree.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = [10, 30, 20].into_iter().map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// let [a, b, c] = [0, 1, 2].map(Handle::from_index);
    ///
    /// tree.insert(&mut items, a);
    /// tree.insert(&mut items, b);
    /// tree.insert_after(&mut items, a, c);
    /// assert_eq!(tree.next(&items, a), Some(c));
    /// assert_eq!(tree.next(&items, c), Some(b));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1) amortized with parent links plus rebalancing; O(log n) without.
    pub fn insert_after<S: NodeStore<T> + ?Sized>(&mut self, nodes: &mut S, anchor: Handle, node: Handle) {
        self.raw.insert_beside(NodesMut::new(&self.ops, nodes), anchor, node, Dir::Right);
    }

    /// Links `node` as the immediate predecessor of `anchor`.
    ///
    /// `node` must order strictly between `anchor` and its current
    /// predecessor; this is only checked in debug builds.
    ///
    /// # Panics
    ///
    /// With [`CompactEntry`](crate::CompactEntry) linkage, panics if `anchor`
    /// is not linked in this tree.
    ///
    /// # Complexity
    ///
    /// O(1) amortized with parent links plus rebalancing; O(log n) without.
    pub fn insert_before<S: NodeStore<T> + ?Sized>(&mut self, nodes: &mut S, anchor: Handle, node: Handle) {
        self.raw.insert_beside(NodesMut::new(&self.ops, nodes), anchor, node, Dir::Left);
    }

    /// Unlinks `node` and resets its linkage.
    ///
    /// Returns `node`, or `None` if it is not linked in this tree.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = (0..4).map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// for index in 0..3 {
    ///     tree.insert(&mut items, Handle::from_index(index));
    /// }
    ///
    /// let h = Handle::from_index(1);
    /// assert_eq!(tree.remove(&mut items, h), Some(h));
    /// assert_eq!(tree.remove(&mut items, h), None);
    /// assert_eq!(tree.remove(&mut items, Handle::from_index(3)), None);
    /// assert_eq!(tree.len(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n), at most two rotations.
    pub fn remove<S: NodeStore<T> + ?Sized>(&mut self, nodes: &mut S, node: Handle) -> Option<Handle> {
        self.raw.remove(NodesMut::new(&self.ops, nodes), node)
    }

    // ─── Search ─────────────────────────────────────────────────────────────
    /// Returns the linked record that compares equal to `key`.
    /// Returns the linked record whose key equals `key`'s.
    ///
    /// `key` does not need to be linked or even stored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = [10, 20, 30].into_iter().map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// for index in 0..3 {
    ///     tree.insert(&mut items, Handle::from_index(index));
    /// }
    ///
    /// let key = Item { key: 20, ..Item::default() };
    /// assert_eq!(tree.find(&items, &key), Some(Handle::from_index(1)));
    /// assert_eq!(tree.find(&items, &Item { key: 25, ..Item::default() }), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n).
    #[must_use]
    pub fn find<S: NodeStore<T> + ?Sized>(&self, nodes: &S, key: &T) -> Option<Handle> {
        self.raw.find_by(self.view(nodes), |node| self.ops.compare(node, key))
    }

    /// Returns the linked record for which `f` returns [`Ordering::Equal`].
    ///
    /// `f` orders a visited record against the target, the way
    /// [`slice::binary_search_by`] does: `Less` if the record sorts before
    /// the target.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = [10, 20, 30].into_iter().map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// for index in 0..3 {
    ///     tree.insert(&mut items, Handle::from_index(index));
    /// }
    ///
    /// assert_eq!(tree.find_by(&items, |item| item.key.cmp(&30)), Some(Handle::from_index(2)));
    /// assert_eq!(tree.find_by(&items, |item| item.key.cmp(&5)), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n).
    pub fn find_by<S, F>(&self, nodes: &S, f: F) -> Option<Handle>
    where
        S: NodeStore<T> + ?Sized,
        F: FnMut(&T) -> Ordering,
    {
        self.raw.find_by(self.view(nodes), f)
    }

    /// Returns the record equal to `key`, or else the smallest record greater
    /// than it.
    ///
    /// # Complexity
    ///
    /// O(log n).
    #[must_use]
    pub fn nfind<S: NodeStore<T> + ?Sized>(&self, nodes: &S, key: &T) -> Option<Handle> {
        self.raw.nfind_by(self.view(nodes), |node| self.ops.compare(node, key))
    }

    /// Like [`nfind`](WavlTree::nfind), with the target described by `f` as in
    /// [`find_by`](WavlTree::find_by).
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = [10, 20, 30].into_iter().map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// for index in 0..3 {
    ///     tree.insert(&mut items, Handle::from_index(index));
    /// }
    ///
    /// assert_eq!(tree.nfind_by(&items, |item| item.key.cmp(&15)), Some(Handle::from_index(1)));
    /// assert_eq!(tree.nfind_by(&items, |item| item.key.cmp(&20)), Some(Handle::from_index(1)));
    /// assert_eq!(tree.nfind_by(&items, |item| item.key.cmp(&31)), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n).
    pub fn nfind_by<S, F>(&self, nodes: &S, f: F) -> Option<Handle>
    where
        S: NodeStore<T> + ?Sized,
        F: FnMut(&T) -> Ordering,
    {
        self.raw.nfind_by(self.view(nodes), f)
    }

    /// Returns the record equal to `key`, or else the largest record smaller
    /// than it.
    ///
    /// # Complexity
    ///
    /// O(log n).
    #[must_use]
    pub fn pfind<S: NodeStore<T> + ?Sized>(&self, nodes: &S, key: &T) -> Option<Handle> {
        self.raw.pfind_by(self.view(nodes), |node| self.ops.compare(node, key))
    }

    /// Like [`pfind`](WavlTree::pfind), with the target described by `f` as in
    /// [`find_by`](WavlTree::find_by).
    ///
    /// # Complexity
    ///
    /// O(log n).
    pub fn pfind_by<S, F>(&self, nodes: &S, f: F) -> Option<Handle>
    where
        S: NodeStore<T> + ?Sized,
        F: FnMut(&T) -> Ordering,
    {
        self.raw.pfind_by(self.view(nodes), f)
    }

    // ─── Navigation ─────────────────────────────────────────────────────────

    /// Returns the record with the smallest key.
    ///
    /// # Complexity
    ///
    /// O(log n).
    #[must_use]
    pub fn min<S: NodeStore<T> + ?Sized>(&self, nodes: &S) -> Option<Handle> {
        self.raw.first(self.view(nodes), Dir::Left)
    }

    /// Returns the record with the largest key.
    ///
    /// # Complexity
    ///
    /// O(log n).
    #[must_use]
    pub fn max<S: NodeStore<T> + ?Sized>(&self, nodes: &S) -> Option<Handle> {
        self.raw.first(self.view(nodes), Dir::Right)
    }

    /// Returns the record following `node` in key order.
    ///
    /// Without parent links, returns `None` when `node` is not linked in this
    /// tree.
    ///
    /// # Complexity
    ///
    /// O(1) amortized over a full traversal with parent links; O(log n)
    /// without.
    #[must_use]
    pub fn next<S: NodeStore<T> + ?Sized>(&self, nodes: &S, node: Handle) -> Option<Handle> {
        self.raw.step(self.view(nodes), node, Dir::Right)
    }

    /// Returns the record preceding `node` in key order.
    ///
    /// # Complexity
    ///
    /// O(1) amortized over a full traversal with parent links; O(log n)
    /// without.
    #[must_use]
    pub fn prev<S: NodeStore<T> + ?Sized>(&self, nodes: &S, node: Handle) -> Option<Handle> {
        self.raw.step(self.view(nodes), node, Dir::Left)
    }

    /// Returns an in-order iterator over `(handle, record)` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = [3, 1, 2].into_iter().map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// for index in 0..3 {
    ///     tree.insert(&mut items, Handle::from_index(index));
    /// }
    ///
    /// let keys: Vec<u32> = tree.iter(&items).map(|(_, item)| item.key).collect();
    /// assert_eq!(keys, [1, 2, 3]);
    ///
    /// let keys: Vec<u32> = tree.iter(&items).rev().map(|(_, item)| item.key).collect();
    /// assert_eq!(keys, [3, 2, 1]);
    /// ```
    pub fn iter<'a, S: NodeStore<T> + ?Sized>(&'a self, nodes: &'a S) -> Iter<'a, T, O, S> {
        let remaining = self.len();
        Iter {
            tree: self,
            nodes,
            front: self.min(nodes),
            back: self.max(nodes),
            remaining,
        }
    }

    /// Returns an iterator over `node` and every record after it.
    ///
    /// Iterating the result in reverse walks from the largest record back
    /// down to `node`. `node` must be linked in this tree.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = (0..5).map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// for index in 0..5 {
    ///     tree.insert(&mut items, Handle::from_index(index));
    /// }
    ///
    /// let keys: Vec<u32> = tree.iter_from(&items, Handle::from_index(2)).map(|(_, item)| item.key).collect();
    /// assert_eq!(keys, [2, 3, 4]);
    /// ```
    pub fn iter_from<'a, S: NodeStore<T> + ?Sized>(&'a self, nodes: &'a S, node: Handle) -> Range<'a, T, O, S> {
        Range {
            tree: self,
            nodes,
            front: Some(node),
            back: self.max(nodes),
        }
    }

    /// Returns an iterator over every record up to and including `node`.
    ///
    /// `iter_to(nodes, node).rev()` walks backwards starting at `node`.
    /// `node` must be linked in this tree.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = (0..5).map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// for index in 0..5 {
    ///     tree.insert(&mut items, Handle::from_index(index));
    /// }
    ///
    /// let keys: Vec<u32> = tree.iter_to(&items, Handle::from_index(2)).rev().map(|(_, item)| item.key).collect();
    /// assert_eq!(keys, [2, 1, 0]);
    /// ```
    pub fn iter_to<'a, S: NodeStore<T> + ?Sized>(&'a self, nodes: &'a S, node: Handle) -> Range<'a, T, O, S> {
        Range {
            tree: self,
            nodes,
            front: self.min(nodes),
            back: Some(node),
        }
    }

    // ─── Removal while walking ──────────────────────────────────────────────

    /// Keeps only the records for which `f` returns `true`, visiting them in
    /// key order. Rejected records are unlinked with their linkage reset.
    ///
    /// Each successor is looked up before `f` sees the current record, so
    /// removal never cuts the walk short.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = (0..6).map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// for index in 0..6 {
    ///     tree.insert(&mut items, Handle::from_index(index));
    /// }
    ///
    /// tree.retain(&mut items, |_, item| item.key % 2 == 0);
    /// let keys: Vec<u32> = tree.iter(&items).map(|(_, item)| item.key).collect();
    /// assert_eq!(keys, [0, 2, 4]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n) with parent links, O(n log n) without.
    pub fn retain<S, F>(&mut self, nodes: &mut S, mut f: F)
    where
        S: NodeStore<T> + ?Sized,
        F: FnMut(Handle, &T) -> bool,
    {
        let mut cur = self.min(&*nodes);
        while let Some(h) = cur {
            cur = self.next(&*nodes, h);
            if !f(h, nodes.node(h)) {
                self.remove(nodes, h);
            }
        }
    }

    /// Unlinks and returns the record with the smallest key.
    ///
    /// # Complexity
    ///
    /// O(log n).
    pub fn pop_first<S: NodeStore<T> + ?Sized>(&mut self, nodes: &mut S) -> Option<Handle> {
        let h = self.min(&*nodes)?;
        self.remove(nodes, h)
    }

    /// Unlinks and returns the record with the largest key.
    ///
    /// # Complexity
    ///
    /// O(log n).
    pub fn pop_last<S: NodeStore<T> + ?Sized>(&mut self, nodes: &mut S) -> Option<Handle> {
        let h = self.max(&*nodes)?;
        self.remove(nodes, h)
    }

    // ─── Raw links ──────────────────────────────────────────────────────────

    /// Returns the left child of `node`.
    #[must_use]
    pub fn left<S: NodeStore<T> + ?Sized>(&self, nodes: &S, node: Handle) -> Option<Handle> {
        self.view(nodes).child(node, Dir::Left)
    }

    /// Returns the right child of `node`.
    #[must_use]
    pub fn right<S: NodeStore<T> + ?Sized>(&self, nodes: &S, node: Handle) -> Option<Handle> {
        self.view(nodes).child(node, Dir::Right)
    }

    /// Returns the parent of `node`. Always `None` without parent links.
    #[must_use]
    pub fn parent<S: NodeStore<T> + ?Sized>(&self, nodes: &S, node: Handle) -> Option<Handle> {
        self.view(nodes).parent(node)
    }

    /// Overwrites the left link of `node`. Rank bits are not touched.
    ///
    /// Only meaningful when rebuilding a shape that was valid before; a
    /// careless write breaks every later operation on this tree.
    pub fn set_left<S: NodeStore<T> + ?Sized>(&self, nodes: &mut S, node: Handle, child: Option<Handle>) {
        self.ops.entry_mut(nodes.node_mut(node)).set_child(Dir::Left, child);
    }

    /// Overwrites the right link of `node`. Rank bits are not touched.
    ///
    /// Only meaningful when rebuilding a shape that was valid before.
    pub fn set_right<S: NodeStore<T> + ?Sized>(&self, nodes: &mut S, node: Handle, child: Option<Handle>) {
        self.ops.entry_mut(nodes.node_mut(node)).set_child(Dir::Right, child);
    }

    /// Overwrites the parent link of `node`. Does nothing without parent links.
    pub fn set_parent<S: NodeStore<T> + ?Sized>(&self, nodes: &mut S, node: Handle, parent: Option<Handle>) {
        self.ops.entry_mut(nodes.node_mut(node)).set_parent(parent);
    }

    // ─── Diagnostics ────────────────────────────────────────────────────────

    /// Overwrites every link of the unlinked record `node` with `sentinel`, so
    /// that [`check`](WavlTree::check) can later tell whether it was reused.
    ///
    /// # Examples
    ///
    /// ```
    /// # use wavl_tree::{DynTree, Entry, Handle, TreeType};
    /// # #[derive(Default)]
    /// # struct Item { key: u32, link: Entry }
    /// let mut items: Vec<Item> = (0..2).map(|key| Item { key, ..Item::default() }).collect();
    /// let mut tree = DynTree::with_ops(TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link));
    /// let sentinel = Handle::from_index(Handle::MAX);
    /// let [a, b] = [0, 1].map(Handle::from_index);
    ///
    /// tree.insert(&mut items, a);
    /// tree.insert(&mut items, b);
    /// tree.remove(&mut items, a);
    /// tree.poison(&mut items, a, sentinel);
    ///
    /// assert!(tree.check(&items, a, sentinel));
    /// assert!(!tree.check(&items, b, sentinel));
    /// ```
    pub fn poison<S: NodeStore<T> + ?Sized>(&self, nodes: &mut S, node: Handle, sentinel: Handle) {
        self.ops.entry_mut(nodes.node_mut(node)).poison(sentinel);
    }

    /// Returns `true` if every link of `node` still holds `sentinel`.
    #[must_use]
    pub fn check<S: NodeStore<T> + ?Sized>(&self, nodes: &S, node: Handle, sentinel: Handle) -> bool {
        self.view(nodes).entry(node).is_poisoned(sentinel)
    }

    /// Validates the whole tree and returns its rank: -1 when empty, 0 for a
    /// single record.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    ///
    /// # Complexity
    ///
    /// O(n).
    pub fn rank<S: NodeStore<T> + ?Sized>(&self, nodes: &S) -> Result<i32, InvariantViolation> {
        self.raw.rank(self.view(nodes))
    }

    /// Validates the subtree rooted at `node` and returns its rank.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn rank_of<S: NodeStore<T> + ?Sized>(&self, nodes: &S, node: Handle) -> Result<i32, InvariantViolation> {
        RawTree::rank_of(self.view(nodes), Some(node))
    }
}

/// An in-order iterator over the records of a [`WavlTree`].
///
/// This `struct` is created by the [`iter`](WavlTree::iter) method on
/// [`WavlTree`].
pub struct Iter<'a, T, O, S: ?Sized> {
    tree: &'a WavlTree<T, O>,
    nodes: &'a S,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<T, O, S: ?Sized> Clone for Iter<'_, T, O, S> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<T, O, S: ?Sized> fmt::Debug for Iter<'_, T, O, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("front", &self.front)
            .field("back", &self.back)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<'a, T, O, S> Iterator for Iter<'a, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.front?;
        self.remaining -= 1;
        self.front = if self.remaining == 0 { None } else { self.tree.next(self.nodes, h) };
        Some((h, self.nodes.node(h)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, O, S> DoubleEndedIterator for Iter<'_, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.back?;
        self.remaining -= 1;
        self.back = if self.remaining == 0 { None } else { self.tree.prev(self.nodes, h) };
        Some((h, self.nodes.node(h)))
    }
}

impl<T, O, S> ExactSizeIterator for Iter<'_, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
}

impl<T, O, S> FusedIterator for Iter<'_, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
}

/// An in-order iterator over a run of records of a [`WavlTree`].
///
/// This `struct` is created by the [`iter_from`](WavlTree::iter_from) and
/// [`iter_to`](WavlTree::iter_to) methods on [`WavlTree`]. The two ends stop
/// once they meet.
pub struct Range<'a, T, O, S: ?Sized> {
    tree: &'a WavlTree<T, O>,
    nodes: &'a S,
    front: Option<Handle>,
    back: Option<Handle>,
}

impl<T, O, S: ?Sized> Clone for Range<'_, T, O, S> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            nodes: self.nodes,
            front: self.front,
            back: self.back,
        }
    }
}

impl<T, O, S: ?Sized> fmt::Debug for Range<'_, T, O, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish_non_exhaustive()
    }
}

impl<'a, T, O, S> Iterator for Range<'a, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.front?;
        if self.back == Some(h) {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.tree.next(self.nodes, h);
        }
        Some((h, self.nodes.node(h)))
    }
}

impl<T, O, S> DoubleEndedIterator for Range<'_, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let h = self.back?;
        if self.front == Some(h) {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.tree.prev(self.nodes, h);
        }
        Some((h, self.nodes.node(h)))
    }
}

impl<T, O, S> FusedIterator for Range<'_, T, O, S>
where
    O: TreeOps<T>,
    S: NodeStore<T> + ?Sized,
{
}

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;

use crate::entry::{Entry, Linkage};

/// Describes how a tree reaches into its records.
///
/// An implementation names the linkage type embedded in `T`, projects to it,
/// and orders records. Trees that maintain a subtree aggregate also override
/// [`is_augmented`](TreeOps::is_augmented) and [`augment`](TreeOps::augment).
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use wavl_tree::{Entry, TreeOps};
///
/// #[derive(Default)]
/// struct Timer {
///     deadline: u64,
///     link: Entry,
/// }
///
/// #[derive(Default)]
/// struct ByDeadline;
///
/// impl TreeOps<Timer> for ByDeadline {
///     type Entry = Entry;
///
///     fn entry<'a>(&self, node: &'a Timer) -> &'a Entry {
///         &node.link
///     }
///
///     fn entry_mut<'a>(&self, node: &'a mut Timer) -> &'a mut Entry {
///         &mut node.link
///     }
///
///     fn compare(&self, a: &Timer, b: &Timer) -> Ordering {
///         a.deadline.cmp(&b.deadline)
///     }
/// }
/// ```
pub trait TreeOps<T> {
    /// The linkage embedded in each record.
    type Entry: Linkage;

    /// Returns the linkage embedded in `node`.
    fn entry<'a>(&self, node: &'a T) -> &'a Self::Entry;

    /// Returns the linkage embedded in `node` mutably.
    fn entry_mut<'a>(&self, node: &'a mut T) -> &'a mut Self::Entry;

    /// Orders two records. Must be a total order that does not change while
    /// either record is linked.
    fn compare(&self, a: &T, b: &T) -> Ordering;

    /// Returns `true` if [`augment`](TreeOps::augment) maintains an aggregate.
    /// When `false` the tree skips aggregate propagation entirely.
    #[inline]
    fn is_augmented(&self) -> bool {
        false
    }

    /// Recomputes the aggregate stored in `node` from its children and returns
    /// `true` if it changed.
    ///
    /// Propagation towards the root stops at the first node whose aggregate is
    /// unchanged, so a callback that always returns `true` is correct but
    /// slower.
    #[inline]
    fn augment(&self, node: &mut T, left: Option<&T>, right: Option<&T>) -> bool {
        let _ = (node, left, right);
        false
    }
}

/// Compares two records.
pub type CompareFn<T> = fn(&T, &T) -> Ordering;
/// Recomputes a record's aggregate from its children, returning `true` on change.
pub type AugmentFn<T> = fn(&mut T, Option<&T>, Option<&T>) -> bool;

/// A runtime descriptor implementing [`TreeOps`] through function pointers.
///
/// Every tree sharing a descriptor type shares one code path; comparisons and
/// aggregate updates cost one indirect call each. See [`DynTree`](crate::DynTree).
///
/// # Examples
///
/// ```
/// use wavl_tree::{CompactEntry, DynTree, Handle, TreeType};
///
/// #[derive(Default)]
/// struct Item {
///     key: u32,
///     link: CompactEntry,
/// }
///
/// let ops = TreeType::new(|a: &Item, b: &Item| a.key.cmp(&b.key), |n| &n.link, |n| &mut n.link);
/// let mut items: Vec<Item> = (0..4).map(|key| Item { key, ..Item::default() }).collect();
/// let mut tree: DynTree<Item, CompactEntry> = DynTree::with_ops(ops);
/// for h in (0..4).map(Handle::from_index) {
///     tree.insert(&mut items, h);
/// }
/// assert_eq!(tree.len(), 4);
/// ```
pub struct TreeType<T, E = Entry> {
    compare: CompareFn<T>,
    augment: Option<AugmentFn<T>>,
    entry: fn(&T) -> &E,
    entry_mut: fn(&mut T) -> &mut E,
    marker: PhantomData<fn() -> E>,
}

impl<T, E: Linkage> TreeType<T, E> {
    /// Creates a descriptor without augmentation.
    #[must_use]
    pub const fn new(compare: CompareFn<T>, entry: fn(&T) -> &E, entry_mut: fn(&mut T) -> &mut E) -> Self {
        Self {
            compare,
            augment: None,
            entry,
            entry_mut,
            marker: PhantomData,
        }
    }

    /// Returns this descriptor with `augment` as its aggregate callback.
    #[must_use]
    pub const fn with_augment(mut self, augment: AugmentFn<T>) -> Self {
        self.augment = Some(augment);
        self
    }
}

impl<T, E> Clone for TreeType<T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E> Copy for TreeType<T, E> {}

impl<T, E> fmt::Debug for TreeType<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeType")
            .field("augmented", &self.augment.is_some())
            .finish_non_exhaustive()
    }
}

impl<T, E: Linkage> TreeOps<T> for TreeType<T, E> {
    type Entry = E;

    #[inline]
    fn entry<'a>(&self, node: &'a T) -> &'a E {
        (self.entry)(node)
    }

    #[inline]
    fn entry_mut<'a>(&self, node: &'a mut T) -> &'a mut E {
        (self.entry_mut)(node)
    }

    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    #[inline]
    fn is_augmented(&self) -> bool {
        self.augment.is_some()
    }

    #[inline]
    fn augment(&self, node: &mut T, left: Option<&T>, right: Option<&T>) -> bool {
        self.augment.is_some_and(|augment| augment(node, left, right))
    }
}

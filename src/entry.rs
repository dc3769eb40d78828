use crate::handle::Handle;

/// A child direction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Dir {
    Left,
    Right,
}

impl Dir {
    /// Returns the other direction.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// Tree linkage embedded in a caller's record.
///
/// A linkage stores the child links, optionally a parent link, and one
/// rank-difference bit per child edge. A clear bit means the child's rank is one
/// below its parent's; a set bit means it is two below. A missing child has rank
/// -1, so a leaf of rank 0 has both bits clear.
///
/// The tree owns these fields while the record is linked. Writing to them
/// directly (or through the raw link setters on [`WavlTree`](crate::WavlTree))
/// is only meaningful when restoring a previously valid shape.
pub trait Linkage: Default {
    /// `true` if this linkage stores a parent link. Without one, the tree keeps
    /// an ancestor stack while it rebalances.
    const HAS_PARENT: bool;

    /// Returns the child in direction `dir`.
    fn child(&self, dir: Dir) -> Option<Handle>;

    /// Sets the child in direction `dir`.
    fn set_child(&mut self, dir: Dir, child: Option<Handle>);

    /// Returns the parent, or `None` at the root and for linkages without a
    /// parent link.
    fn parent(&self) -> Option<Handle>;

    /// Sets the parent. Does nothing for linkages without a parent link.
    fn set_parent(&mut self, parent: Option<Handle>);

    /// Returns both rank-difference bits (bit 0 left, bit 1 right).
    fn rdiff_bits(&self) -> u8;

    /// Replaces both rank-difference bits.
    fn set_rdiff_bits(&mut self, bits: u8);

    /// Overwrites every link with `sentinel`.
    fn poison(&mut self, sentinel: Handle);

    /// Returns `true` if every link still holds `sentinel`.
    fn is_poisoned(&self, sentinel: Handle) -> bool;

    /// Returns `true` if the edge to the child in direction `dir` has rank
    /// difference 2.
    #[inline]
    fn rdiff(&self, dir: Dir) -> bool {
        self.rdiff_bits() & dir.bit() != 0
    }

    /// Sets the rank difference of the edge in direction `dir` to 2 (`true`) or
    /// 1 (`false`).
    #[inline]
    fn set_rdiff(&mut self, dir: Dir, two: bool) {
        let bits = self.rdiff_bits() & !dir.bit();
        self.set_rdiff_bits(if two { bits | dir.bit() } else { bits });
    }

    /// Toggles the rank difference of the edge in direction `dir`.
    #[inline]
    fn flip_rdiff(&mut self, dir: Dir) {
        self.set_rdiff_bits(self.rdiff_bits() ^ dir.bit());
    }

    /// Returns `true` if neither child is present.
    #[inline]
    fn is_leaf(&self) -> bool {
        self.child(Dir::Left).is_none() && self.child(Dir::Right).is_none()
    }
}

/// Three-slot linkage: two children and a parent.
///
/// Successor, predecessor and removal climb parent links instead of searching
/// from the root.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Entry {
    child: [Option<Handle>; 2],
    parent: Option<Handle>,
    rdiff: u8,
}

impl Linkage for Entry {
    const HAS_PARENT: bool = true;

    #[inline]
    fn child(&self, dir: Dir) -> Option<Handle> {
        self.child[dir.index()]
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Option<Handle>) {
        self.child[dir.index()] = child;
    }

    #[inline]
    fn parent(&self) -> Option<Handle> {
        self.parent
    }

    #[inline]
    fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    #[inline]
    fn rdiff_bits(&self) -> u8 {
        self.rdiff
    }

    #[inline]
    fn set_rdiff_bits(&mut self, bits: u8) {
        self.rdiff = bits;
    }

    fn poison(&mut self, sentinel: Handle) {
        self.child = [Some(sentinel); 2];
        self.parent = Some(sentinel);
    }

    fn is_poisoned(&self, sentinel: Handle) -> bool {
        self.child == [Some(sentinel); 2] && self.parent == Some(sentinel)
    }
}

/// Two-slot linkage: children only.
///
/// Saves one link per record. Navigation from an arbitrary node re-descends
/// from the root by key, so `next`/`prev` cost O(log n) each.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CompactEntry {
    child: [Option<Handle>; 2],
    rdiff: u8,
}

impl Linkage for CompactEntry {
    const HAS_PARENT: bool = false;

    #[inline]
    fn child(&self, dir: Dir) -> Option<Handle> {
        self.child[dir.index()]
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Option<Handle>) {
        self.child[dir.index()] = child;
    }

    #[inline]
    fn parent(&self) -> Option<Handle> {
        None
    }

    #[inline]
    fn set_parent(&mut self, _parent: Option<Handle>) {}

    #[inline]
    fn rdiff_bits(&self) -> u8 {
        self.rdiff
    }

    #[inline]
    fn set_rdiff_bits(&mut self, bits: u8) {
        self.rdiff = bits;
    }

    fn poison(&mut self, sentinel: Handle) {
        self.child = [Some(sentinel); 2];
    }

    fn is_poisoned(&self, sentinel: Handle) -> bool {
        self.child == [Some(sentinel); 2]
    }
}

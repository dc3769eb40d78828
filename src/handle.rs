use core::fmt;
use core::num::NonZero;

#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// A reference to a node stored in caller-owned storage.
///
/// A `Handle` is a slot index offset by one so that `Option<Handle>` costs no
/// more space than the handle itself. Every link inside an [`Entry`](crate::Entry)
/// or [`CompactEntry`](crate::CompactEntry) is an `Option<Handle>`.
///
/// # Examples
///
/// ```
/// use wavl_tree::Handle;
///
/// let handle = Handle::from_index(7);
/// assert_eq!(handle.to_index(), 7);
/// ```
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Handle(NonZero<RawHandle>);

impl Handle {
    /// The largest index a handle can refer to.
    pub const MAX: usize = (RawHandle::MAX - 1) as usize;

    /// Creates a handle referring to slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than [`Handle::MAX`].
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((index + 1) as RawHandle) {
            Some(raw) => Self(raw),
            None => unreachable!(),
        }
    }

    /// Returns the slot index this handle refers to.
    #[inline]
    #[must_use]
    pub const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.to_index())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_index())
    }
}

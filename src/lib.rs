//! Intrusive weak-AVL trees for Rust.
//!
//! This crate provides [`WavlTree`], an ordered tree whose records live in
//! storage the caller owns. Each record embeds its own linkage, so linking and
//! unlinking never allocates:
//!
//! - [`Entry`] - two child links, a parent link and two rank bits
//! - [`CompactEntry`] - two child links and two rank bits; the tree keeps an
//!   ancestor stack while it rebalances instead
//!
//! Records are addressed by [`Handle`] into any [`NodeStore`]: a slice, a
//! `Vec`, or the slot allocator [`Arena`].
//!
//! # Example
//!
//! ```
//! use wavl_tree::{Arena, DynTree, Entry, TreeType};
//!
//! #[derive(Default)]
//! struct Interval {
//!     start: u64,
//!     len: u64,
//!     link: Entry,
//! }
//!
//! let mut free = Arena::new();
//! let mut by_start: DynTree<Interval> =
//!     DynTree::with_ops(TreeType::new(|a: &Interval, b: &Interval| a.start.cmp(&b.start), |n| &n.link, |n| &mut n.link));
//!
//! for (start, len) in [(0, 16), (64, 8), (32, 4)] {
//!     let h = free.alloc(Interval { start, len, ..Interval::default() });
//!     by_start.insert(&mut free, h);
//! }
//!
//! // The interval starting at or before address 40.
//! let h = by_start.pfind_by(&free, |n| n.start.cmp(&40)).unwrap();
//! assert_eq!((free[h].start, free[h].len), (32, 4));
//!
//! // Every insertion kept the rank rule.
//! assert_eq!(by_start.rank(&free), Ok(1));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **At most two rotations** per insertion or removal
//! - **Subtree aggregates** - [`TreeOps::augment`] is re-run bottom-up after every change,
//!   stopping at the first node whose aggregate is unchanged
//! - **`tracing`** (optional feature) - trace events for every rebalancing step
//!
//! # Implementation
//!
//! Each node stores the rank difference to each child (1 or 2) as one bit.
//! Missing children have rank -1 and leaves rank 0. Insertion promotes along
//! the path until a 2-edge absorbs the growth or one or two rotations end it;
//! removal demotes along the path until a 1-edge absorbs the shrinkage or one
//! or two rotations end it.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod arena;
mod entry;
mod error;
mod handle;
mod ops;
mod raw;
mod store;

pub mod wavl_tree;

pub use arena::Arena;
pub use entry::{CompactEntry, Dir, Entry, Linkage};
pub use error::InvariantViolation;
pub use handle::Handle;
pub use ops::{AugmentFn, CompareFn, TreeOps, TreeType};
pub use store::NodeStore;
pub use wavl_tree::{DynTree, WavlTree};

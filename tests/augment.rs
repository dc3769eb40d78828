use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::marker::PhantomData;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use wavl_tree::{CompactEntry, DynTree, Entry, Handle, Linkage, TreeOps, TreeType, WavlTree};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 1_000;

const KEY_SPACE: u32 = 256;

// ─── Subtree sizes ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Counted<L> {
    key: u32,
    size: usize,
    link: L,
}

#[derive(Default)]
struct BySize<L>(PhantomData<L>);

fn size_of<L>(node: Option<&Counted<L>>) -> usize {
    node.map_or(0, |node| node.size)
}

fn update_size<L>(node: &mut Counted<L>, left: Option<&Counted<L>>, right: Option<&Counted<L>>) -> bool {
    let size = 1 + size_of(left) + size_of(right);
    let changed = size != node.size;
    node.size = size;
    changed
}

impl<L: Linkage> TreeOps<Counted<L>> for BySize<L> {
    type Entry = L;

    fn entry<'a>(&self, node: &'a Counted<L>) -> &'a L {
        &node.link
    }

    fn entry_mut<'a>(&self, node: &'a mut Counted<L>) -> &'a mut L {
        &mut node.link
    }

    fn compare(&self, a: &Counted<L>, b: &Counted<L>) -> Ordering {
        a.key.cmp(&b.key)
    }

    fn is_augmented(&self) -> bool {
        true
    }

    fn augment(&self, node: &mut Counted<L>, left: Option<&Counted<L>>, right: Option<&Counted<L>>) -> bool {
        update_size(node, left, right)
    }
}

fn counted<L: Linkage>() -> Vec<Counted<L>> {
    (0..KEY_SPACE).map(|key| Counted { key, size: 0, link: L::default() }).collect()
}

/// Recomputes every subtree size from scratch and compares it with the
/// stored aggregate.
fn verify_sizes<L, O>(tree: &WavlTree<Counted<L>, O>, nodes: &[Counted<L>], node: Option<Handle>) -> usize
where
    L: Linkage,
    O: TreeOps<Counted<L>, Entry = L>,
{
    let Some(node) = node else {
        return 0;
    };
    let size = 1 + verify_sizes(tree, nodes, tree.left(nodes, node)) + verify_sizes(tree, nodes, tree.right(nodes, node));
    assert_eq!(nodes[node.to_index()].size, size, "size of {node}");
    size
}

/// Returns the record of rank `index` (0-based) in key order.
fn select<L, O>(tree: &WavlTree<Counted<L>, O>, nodes: &[Counted<L>], mut index: usize) -> Option<Handle>
where
    L: Linkage,
    O: TreeOps<Counted<L>, Entry = L>,
{
    let mut cur = tree.root();
    while let Some(node) = cur {
        let left = tree.left(nodes, node);
        let left_size = left.map_or(0, |h| nodes[h.to_index()].size);
        match index.cmp(&left_size) {
            Ordering::Less => cur = left,
            Ordering::Equal => return Some(node),
            Ordering::Greater => {
                index -= left_size + 1;
                cur = tree.right(nodes, node);
            }
        }
    }
    None
}

fn run_sizes<L, O>(mut tree: WavlTree<Counted<L>, O>, ops: &[(bool, u32)]) -> Result<(), TestCaseError>
where
    L: Linkage,
    O: TreeOps<Counted<L>, Entry = L>,
{
    let mut nodes = counted::<L>();
    let mut model = BTreeSet::new();

    for &(insert, key) in ops {
        let h = Handle::from_index(key as usize);
        if insert {
            prop_assert_eq!(tree.insert(&mut nodes, h).is_none(), model.insert(key), "insert({})", key);
        } else {
            prop_assert_eq!(tree.remove(&mut nodes, h).is_some(), model.remove(&key), "remove({})", key);
        }

        prop_assert_eq!(verify_sizes(&tree, &nodes, tree.root()), model.len());
        prop_assert!(tree.rank(&nodes).is_ok());
    }

    for (index, &key) in model.iter().enumerate() {
        let found = select(&tree, &nodes, index).map(|h| nodes[h.to_index()].key);
        prop_assert_eq!(found, Some(key), "select({})", index);
    }
    prop_assert_eq!(select(&tree, &nodes, model.len()), None);
    Ok(())
}

fn size_op_strategy() -> impl Strategy<Value = (bool, u32)> {
    (prop::bool::weighted(0.6), 0..KEY_SPACE)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn sizes_with_parent_links(ops in proptest::collection::vec(size_op_strategy(), TEST_SIZE)) {
        run_sizes(WavlTree::<Counted<Entry>, BySize<Entry>>::new(), &ops)?;
    }

    #[test]
    fn sizes_without_parent_links(ops in proptest::collection::vec(size_op_strategy(), TEST_SIZE)) {
        run_sizes(WavlTree::<Counted<CompactEntry>, BySize<CompactEntry>>::new(), &ops)?;
    }

    #[test]
    fn sizes_through_descriptor(ops in proptest::collection::vec(size_op_strategy(), TEST_SIZE)) {
        let ops_table = TreeType::new(
            |a: &Counted<CompactEntry>, b: &Counted<CompactEntry>| a.key.cmp(&b.key),
            |n| &n.link,
            |n| &mut n.link,
        )
        .with_augment(update_size);
        let tree: DynTree<Counted<CompactEntry>, CompactEntry> = DynTree::with_ops(ops_table);
        run_sizes(tree, &ops)?;
    }
}

#[test]
fn select_after_removals() {
    let mut nodes = counted::<Entry>();
    let mut tree = WavlTree::<Counted<Entry>, BySize<Entry>>::new();
    for key in 0..100 {
        tree.insert(&mut nodes, Handle::from_index(key));
    }
    for key in (0..100).step_by(3) {
        tree.remove(&mut nodes, Handle::from_index(key));
    }

    let remaining: Vec<u32> = (0..100).filter(|key| key % 3 != 0).collect();
    assert_eq!(verify_sizes(&tree, &nodes, tree.root()), remaining.len());
    for (index, &key) in remaining.iter().enumerate() {
        assert_eq!(select(&tree, &nodes, index), Some(Handle::from_index(key as usize)));
    }
}

#[test]
fn insert_beside_keeps_sizes() {
    let mut nodes = counted::<CompactEntry>();
    let mut tree = WavlTree::<Counted<CompactEntry>, BySize<CompactEntry>>::new();

    tree.insert(&mut nodes, Handle::from_index(0));
    for key in 1..64 {
        tree.insert_after(&mut nodes, Handle::from_index(key - 1), Handle::from_index(key));
        assert_eq!(verify_sizes(&tree, &nodes, tree.root()), key + 1);
    }
    for key in (64..128).rev() {
        let anchor = tree.max(&nodes).unwrap();
        if key == 127 {
            tree.insert_after(&mut nodes, anchor, Handle::from_index(key));
        } else {
            tree.insert_before(&mut nodes, Handle::from_index(key + 1), Handle::from_index(key));
        }
        verify_sizes(&tree, &nodes, tree.root());
    }
    assert_eq!(tree.len(), 128);
    assert!(tree.rank(&nodes).is_ok());
}

// ─── Early stop ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Tagged {
    key: u32,
    max: u32,
    link: Entry,
}

/// Keeps the largest key of each subtree and counts callback invocations.
#[derive(Default)]
struct ByMax {
    calls: Cell<usize>,
}

impl TreeOps<Tagged> for ByMax {
    type Entry = Entry;

    fn entry<'a>(&self, node: &'a Tagged) -> &'a Entry {
        &node.link
    }

    fn entry_mut<'a>(&self, node: &'a mut Tagged) -> &'a mut Entry {
        &mut node.link
    }

    fn compare(&self, a: &Tagged, b: &Tagged) -> Ordering {
        a.key.cmp(&b.key)
    }

    fn is_augmented(&self) -> bool {
        true
    }

    fn augment(&self, node: &mut Tagged, left: Option<&Tagged>, right: Option<&Tagged>) -> bool {
        self.calls.set(self.calls.get() + 1);
        let max = [left, right].into_iter().flatten().map(|n| n.max).fold(node.key, u32::max);
        let changed = max != node.max;
        node.max = max;
        changed
    }
}

fn verify_max(tree: &WavlTree<Tagged, ByMax>, nodes: &[Tagged], node: Option<Handle>) -> u32 {
    let Some(node) = node else {
        return 0;
    };
    let max = nodes[node.to_index()]
        .key
        .max(verify_max(tree, nodes, tree.left(nodes, node)))
        .max(verify_max(tree, nodes, tree.right(nodes, node)));
    assert_eq!(nodes[node.to_index()].max, max, "max of {node}");
    max
}

#[test]
fn unchanged_aggregate_stops_propagation() {
    let keys = [40, 20, 60, 10, 30, 50, 70, 5, 15];
    let mut nodes: Vec<Tagged> = keys.iter().map(|&key| Tagged { key, ..Tagged::default() }).collect();
    let mut tree = WavlTree::<Tagged, ByMax>::new();

    for index in 0..8 {
        tree.insert(&mut nodes, Handle::from_index(index));
    }
    assert_eq!(tree.rank(&nodes), Ok(3));
    verify_max(&tree, &nodes, tree.root());

    // 15 lands under 10; the maximum of 20's subtree stays 30, so neither 20's
    // ancestors nor the root are revisited.
    tree.ops().calls.set(0);
    tree.insert(&mut nodes, Handle::from_index(8));
    assert_eq!(tree.last_rotations(), 0);
    assert_eq!(tree.ops().calls.get(), 3);
    verify_max(&tree, &nodes, tree.root());

    // Removing the global maximum changes the aggregate all the way up.
    tree.ops().calls.set(0);
    tree.remove(&mut nodes, Handle::from_index(6));
    assert_eq!(nodes[tree.root().unwrap().to_index()].max, 60);
    verify_max(&tree, &nodes, tree.root());
    assert!(tree.ops().calls.get() >= 2);
}

#[test]
fn successor_graft_updates_aggregates() {
    let keys: Vec<u32> = (1..=31).collect();
    let mut nodes: Vec<Tagged> = keys.iter().map(|&key| Tagged { key, ..Tagged::default() }).collect();
    let mut tree = WavlTree::<Tagged, ByMax>::new();
    for index in 0..keys.len() {
        tree.insert(&mut nodes, Handle::from_index(index));
    }

    // Interior removals replace each node with its successor.
    while let Some(root) = tree.root() {
        tree.remove(&mut nodes, root);
        verify_max(&tree, &nodes, tree.root());
        assert!(tree.rank(&nodes).is_ok());
    }
}

use super::*;

use crate::trie::{ABSENT, LEAF, ROOT};
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

fn validate_trie(t: &BinaryTrieSet) {
    let len = t.nodes.len();
    let mut seen = vec![false; len];
    seen[ROOT as usize] = true;

    let mut stack = vec![(ROOT, 0u32)];
    let mut leaf_count = 0u64;
    while let Some((node, depth)) = stack.pop() {
        let mut children = 0;
        for child in t.nodes[node as usize].children {
            if child == ABSENT {
                continue;
            }
            children += 1;
            if depth == ADDRESS_BITS - 1 {
                assert_eq!(child, LEAF, "depth-31 slot must hold a leaf tag");
                leaf_count += 1;
                continue;
            }
            assert_ne!(child, LEAF, "leaf tag above depth 31 (depth {depth})");
            let idx = child as usize;
            assert!(idx < len, "child index {idx} out of bounds");
            assert!(!seen[idx], "node {idx} reachable twice");
            seen[idx] = true;
            stack.push((child, depth + 1));
        }
        if node != ROOT {
            assert!(children > 0, "non-root node {node} has no children");
        }
    }

    assert!(seen.iter().all(|&s| s), "unreachable arena nodes");
    assert_eq!(
        leaf_count,
        t.unique_count(),
        "reachable leaf count must match unique_count"
    );
}

fn key_strategy() -> impl Strategy<Value = AddressKey> {
    // Clustered keys share long prefixes and exercise the low-order bits.
    prop_oneof![
        4 => any::<u32>(),
        4 => (0u32..64).prop_map(|k| 0xC0A8_0000 | k),
        1 => (0u32..8).prop_map(|k| u32::MAX - k),
        1 => (0u32..8),
    ]
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "key_strategy()")] AddressKey),
    #[proptest(weight = 4)]
    Search(#[proptest(strategy = "key_strategy()")] AddressKey),
    #[proptest(weight = 1)]
    InsertRange(
        #[proptest(strategy = "key_strategy()")] AddressKey,
        #[proptest(strategy = "0u32..300")] u32,
    ),
}

fn apply(op: &Op, set: &mut impl MembershipSet, model: &mut BTreeSet<AddressKey>) -> Result<(), TestCaseError> {
    match *op {
        Op::Insert(key) => {
            prop_assert_eq!(set.insert_key(key), model.insert(key));
        }
        Op::Search(key) => {
            prop_assert_eq!(set.search_key(key), model.contains(&key));
        }
        Op::InsertRange(start, len) => {
            let end = start.saturating_add(len);
            let added = (start..=end).filter(|&k| model.insert(k)).count() as u64;
            prop_assert_eq!(set.insert_range(start..=end), added);
        }
    }
    prop_assert_eq!(set.unique_count(), model.len() as u64);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_trie_matches_model(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        let mut t = BinaryTrieSet::new();
        let mut m = BTreeSet::new();
        for op in &ops {
            apply(op, &mut t, &mut m)?;
        }
        validate_trie(&t);
        for &key in &m {
            prop_assert!(t.search_key(key));
        }
    }

    #[test]
    fn prop_dense_matches_model(ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        let mut d = DenseBitVectorSet::new();
        let mut m = BTreeSet::new();
        for op in &ops {
            apply(op, &mut d, &mut m)?;
        }
        for &key in &m {
            prop_assert!(d.search_key(key));
        }
    }

    #[test]
    fn prop_backings_agree(
        inserts in prop::collection::vec(key_strategy(), 0..=300),
        probes in prop::collection::vec(key_strategy(), 0..=300),
    ) {
        let mut d = DenseBitVectorSet::new();
        let mut t = BinaryTrieSet::new();
        for &key in &inserts {
            prop_assert_eq!(d.insert_key(key), t.insert_key(key));
        }
        prop_assert_eq!(d.unique_count(), t.unique_count());
        for &key in inserts.iter().chain(&probes) {
            prop_assert_eq!(d.search_key(key), t.search_key(key));
        }
    }

    #[test]
    fn prop_text_and_key_paths_agree(key in key_strategy()) {
        let text = format_address(key);
        let mut t = BinaryTrieSet::new();
        prop_assert_eq!(t.insert(&text), Ok(true));
        prop_assert!(t.search_key(key));
        prop_assert_eq!(t.search(&text), Ok(true));
    }

    #[test]
    fn prop_reinsert_is_idempotent(keys in prop::collection::vec(key_strategy(), 1..=100)) {
        let mut t = BinaryTrieSet::new();
        for &key in &keys {
            t.insert_key(key);
        }
        let count = t.unique_count();
        let nodes = t.node_count();
        for &key in &keys {
            prop_assert!(!t.insert_key(key));
        }
        prop_assert_eq!(t.unique_count(), count);
        prop_assert_eq!(t.node_count(), nodes);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<AddressKey> = vec![
        0xC0A8_0001,
        0xC0A8_0002,
        0xC0A8_0001,
        0x0A00_0001,
        0x0808_0808,
        u32::MAX,
    ];
    let expected: BTreeSet<AddressKey> = keys.iter().copied().collect();

    let mut shape = None;
    for_each_permutation(&keys, |perm| {
        let mut t = BinaryTrieSet::new();
        for k in perm {
            t.insert_key(k);
        }
        validate_trie(&t);
        assert_eq!(t.unique_count(), expected.len() as u64);
        for &k in &expected {
            assert!(t.search_key(k));
        }
        assert!(!t.search_key(0xC0A8_0003));

        // Arena size depends only on the set of keys, not on insertion order.
        let nodes = t.node_count();
        assert_eq!(*shape.get_or_insert(nodes), nodes);
    });
}

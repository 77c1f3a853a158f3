use super::tests::{tree_order, validate};
use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Clone, Debug)]
enum Op {
    Insert(Prefix, u32),
    Touch(Prefix),
    Erase(Prefix),
    Lookup(Endpoint),
}

fn v4_address() -> impl Strategy<Value = Endpoint> + Clone {
    // Few distinct leading octets so that generated prefixes nest and
    // diverge inside each other instead of scattering across the space.
    (
        prop::sample::select(vec![10u8, 192]),
        0u8..4,
        prop::sample::select(vec![0u8, 1, 128, 255]),
        any::<u8>(),
    )
        .prop_map(|(a, b, c, d)| Endpoint::from(Ipv4Addr::new(a, b, c, d)))
}

fn v6_address() -> impl Strategy<Value = Endpoint> + Clone {
    (
        prop::sample::select(vec![0x2001u16, 0xfe80]),
        0u16..4,
        prop::sample::select(vec![0u16, 1, 0x8000]),
        any::<u16>(),
    )
        .prop_map(|(a, b, c, d)| Endpoint::from(Ipv6Addr::new(a, b, c, 0, 0, 0, 0, d)))
}

fn address_strategy() -> impl Strategy<Value = Endpoint> + Clone {
    prop_oneof![3 => v4_address(), 1 => v6_address()]
}

fn prefix_strategy() -> impl Strategy<Value = Prefix> + Clone {
    prop_oneof![
        3 => (v4_address(), 0u8..=32).prop_map(|(a, len)| Prefix::new(a, len)),
        1 => (v6_address(), 0u8..=128).prop_map(|(a, len)| Prefix::new(a, len)),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let prefix = prefix_strategy();
    let op = prop_oneof![
        40 => (prefix.clone(), any::<u32>()).prop_map(|(p, v)| Op::Insert(p, v)),
        10 => prefix.clone().prop_map(Op::Touch),
        30 => prefix.clone().prop_map(Op::Erase),
        20 => address_strategy().prop_map(Op::Lookup),
    ];
    prop::collection::vec(op, 0..=400)
}

/// Longest matching key in the model, by exhaustive scan.
fn model_lookup(m: &BTreeMap<Prefix, u32>, address: &Endpoint) -> Option<(Prefix, u32)> {
    m.iter()
        .filter(|(k, _)| k.matches(address))
        .max_by_key(|(k, _)| k.length())
        .map(|(k, v)| (*k, *v))
}

fn model_in_trie_order(m: &BTreeMap<Prefix, u32>) -> Vec<(Prefix, u32)> {
    let mut entries: Vec<(Prefix, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
    entries.sort_by_key(|(k, _)| tree_order(k));
    entries
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: PrefixTrie<u32> = PrefixTrie::new();
        let mut m: BTreeMap<Prefix, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(prefix, value) => {
                    t.insert_or_assign(&prefix, value);
                    m.insert(prefix.normalized(), value);
                }
                Op::Touch(prefix) => {
                    let got_t = *t.insert(&prefix);
                    let got_m = *m.entry(prefix.normalized()).or_default();
                    prop_assert_eq!(got_t, got_m);
                }
                Op::Erase(prefix) => {
                    let old_t = t.erase(&prefix);
                    let old_m = m.remove(&prefix.normalized());
                    prop_assert_eq!(old_t, old_m);
                    prop_assert!(!t.has(&prefix));
                }
                Op::Lookup(address) => {
                    let got_t = t.lookup(&address).map(|(k, v)| (*k, *v));
                    prop_assert_eq!(got_t, model_lookup(&m, &address));
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate(&t);
        let got: Vec<(Prefix, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, model_in_trie_order(&m));
    }

    #[test]
    fn prop_lookup_matches_scan(
        prefixes in prop::collection::vec(prefix_strategy(), 0..=64),
        probes in prop::collection::vec(address_strategy(), 1..=64),
    ) {
        let mut t: PrefixTrie<u32> = PrefixTrie::new();
        let mut m: BTreeMap<Prefix, u32> = BTreeMap::new();
        for (i, prefix) in prefixes.iter().enumerate() {
            let value = i as u32;
            t.insert_or_assign(prefix, value);
            m.insert(prefix.normalized(), value);
        }
        validate(&t);

        for address in &probes {
            let got = t.lookup(address).map(|(k, v)| (*k, *v));
            prop_assert_eq!(got, model_lookup(&m, address));
            prop_assert_eq!(t.matches(address), got.is_some());
        }
        for prefix in &prefixes {
            prop_assert!(t.has(prefix));
            prop_assert_eq!(t.get(prefix).copied(), m.get(&prefix.normalized()).copied());
        }
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

fn small_set() -> Vec<Prefix> {
    [
        "0.0.0.0/0",
        "10.0.0.0/8",
        "10.0.0.0/16",
        "10.128.0.0/9",
        "10.1.0.0/16",
        "2001:db8::/32",
    ]
    .iter()
    .map(|s| s.parse().unwrap())
    .collect()
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_set();

    for_each_permutation(&keys, |perm| {
        let mut t: PrefixTrie<u32> = PrefixTrie::new();
        let mut m: BTreeMap<Prefix, u32> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u32;
            t.insert_or_assign(&k, v);
            m.insert(k, v);
            validate(&t);
        }

        let got: Vec<(Prefix, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, model_in_trie_order(&m));
    });
}

#[test]
fn exhaustive_erase_order_small_set() {
    let keys = small_set();

    // Insert in a fixed order, then erase in all permutations.
    let mut base: PrefixTrie<u32> = PrefixTrie::new();
    for (i, k) in keys.iter().enumerate() {
        base.insert_or_assign(k, i as u32);
    }
    let probes: Vec<Endpoint> = ["10.0.0.1", "10.1.0.1", "10.200.0.1", "11.0.0.1", "2001:db8::1"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut m: BTreeMap<Prefix, u32> =
            keys.iter().enumerate().map(|(i, k)| (*k, i as u32)).collect();

        for k in perm {
            assert_eq!(t.erase(&k), m.remove(&k));
            assert_eq!(t.len(), m.len());
            validate(&t);
            for probe in &probes {
                assert_eq!(t.lookup(probe).map(|(k, v)| (*k, *v)), model_lookup(&m, probe));
            }
        }
        assert!(t.is_empty());
        assert_eq!(t.nodes.len(), 0);
        assert!(t.first().is_none());
    });
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Free functions over [`Map`], mirroring the dictionary utilities of dynamic runtimes.
//!
//! All of them go through the [`Map`] API, so they work for every backing store.

use crate::builtin::Map;
use crate::meta::error::MapError;
use crate::meta::{Element, Key};

/// Removes all entries. Fails if `map` is read-only.
pub fn clear<K: Key, V: Element>(map: &mut Map<K, V>) -> Result<(), MapError> {
    map.clear()
}

/// New writable map with the entries of `map`, in the same order, backed by a local store.
///
/// The result is never read-only, even if `map` is.
pub fn duplicate<K: Key, V: Element>(map: &Map<K, V>) -> Map<K, V> {
    map.iter().collect()
}

/// Copies every entry of `src` whose key is absent in `dst` into `dst`, keeping existing values.
///
/// Fails with [`MapError::ReadOnly`] if `dst` is read-only and `src` brings at least one new key.
pub fn merge<K: Key, V: Element>(dst: &mut Map<K, V>, src: &Map<K, V>) -> Result<(), MapError> {
    dst.extend_map(src, false)
}

/// New map with the entries of `a`, followed by the entries of `b` whose keys are absent in `a`.
pub fn merged<K: Key, V: Element>(a: &Map<K, V>, b: &Map<K, V>) -> Map<K, V> {
    let from_b = b.iter().filter(|(key, _)| !a.has(key));

    a.iter().chain(from_b).collect()
}

/// First key (in iteration order) whose value equals `value`.
pub fn find_key<K: Key, V: Element + PartialEq>(map: &Map<K, V>, value: &V) -> Option<K> {
    map.iter()
        .find(|(_, candidate)| candidate == value)
        .map(|(key, _)| key)
}

/// Whether every entry of `a` has a deeply equal counterpart in `b`.
///
/// Nested dictionaries and arrays are compared recursively. Note that this is a _subset_ check: `b` may contain additional
/// keys. Combine with a length comparison, or use `==`, for full equality.
///
/// Two nil maps are equal; a nil map is never equal to a non-nil one, even an empty one.
pub fn recursively_equal_to<K: Key, V: Element>(a: &Map<K, V>, b: &Map<K, V>) -> bool {
    match (a.is_nil(), b.is_nil()) {
        (true, true) => true,
        (false, false) => entries_contained_in(a, b, 0),
        _ => false,
    }
}

pub(crate) fn entries_contained_in<K: Key, V: Element>(a: &Map<K, V>, b: &Map<K, V>, depth: usize) -> bool {
    a.iter().all(|(key, value)| match b.lookup(&key) {
        Some(other) => value
            .to_variant()
            .recursively_equal_at(&other.to_variant(), depth),
        None => false,
    })
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::builtin::{vdict, VarMap, Variant};

    fn map(entries: &[(&str, i64)]) -> Map<String, i64> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    #[test]
    fn duplicate_is_independent_and_writable() {
        let mut original = map(&[("a", 1), ("b", 2)]);
        original.make_read_only();

        let mut copy = duplicate(&original);
        assert!(!copy.is_read_only());
        assert_eq!(copy.keys(), ["a", "b"]);

        copy.set_index("c".into(), 3).unwrap();
        assert_eq!(original.len(), 2);
    }

    #[test]
    fn merge_keeps_existing_values() {
        let mut dst = map(&[("a", 1), ("b", 2)]);
        let src = map(&[("b", 20), ("c", 30)]);

        merge(&mut dst, &src).unwrap();
        assert_eq!(dst.keys(), ["a", "b", "c"]);
        assert_eq!(dst.values(), [1, 2, 30]);
    }

    #[test]
    fn merge_into_read_only_fails_only_for_new_keys() {
        let mut dst = map(&[("a", 1)]);
        dst.make_read_only();

        assert!(merge(&mut dst, &map(&[("a", 5)])).is_ok());
        assert!(merge(&mut dst, &map(&[("z", 5)])).unwrap_err().is_read_only());
    }

    #[test]
    fn merged_orders_first_map_then_new_keys() {
        let a = map(&[("x", 1), ("y", 2)]);
        let b = map(&[("z", 3), ("x", 100)]);

        let result = merged(&a, &b);
        assert_eq!(result.keys(), ["x", "y", "z"]);
        assert_eq!(result.values(), [1, 2, 3]);

        // Inputs untouched.
        assert_eq!(a.len(), 2);
        assert_eq!(b.index(&"x".into()), 100);
    }

    #[test]
    fn find_key_returns_first_match() {
        let m = map(&[("a", 1), ("b", 2), ("c", 2)]);

        assert_eq!(find_key(&m, &2), Some("b".to_string()));
        assert_eq!(find_key(&m, &7), None);
    }

    #[test]
    fn recursive_equality_ignores_order_and_descends() {
        let a: VarMap = vdict! { "k": 1, "nested": vdict! { "x": 1.5 } };
        let b: VarMap = vdict! { "nested": vdict! { "x": 1.5 }, "k": 1 };
        let c: VarMap = vdict! { "k": 1, "nested": vdict! { "x": 2.5 } };

        assert!(recursively_equal_to(&a, &b));
        assert!(!recursively_equal_to(&a, &c));
    }

    #[test]
    fn recursive_equality_is_a_subset_check() {
        let small = map(&[("a", 1)]);
        let large = map(&[("a", 1), ("b", 2)]);

        assert!(recursively_equal_to(&small, &large));
        assert!(!recursively_equal_to(&large, &small));
        assert_ne!(small, large);
    }

    #[test]
    fn recursive_equality_nil_handling() {
        let nil = Map::<String, i64>::default();
        let empty = Map::<String, i64>::new();

        assert!(recursively_equal_to(&nil, &Map::default()));
        assert!(!recursively_equal_to(&nil, &empty));
        assert!(!recursively_equal_to(&empty, &nil));
        assert!(recursively_equal_to(&empty, &empty));
    }

    #[test]
    fn int_and_float_values_differ() {
        let ints: VarMap = vdict! { "n": 1 };
        let floats: VarMap = vdict! { "n": 1.0 };

        assert!(!recursively_equal_to(&ints, &floats));
        assert_eq!(ints.index(&Variant::from("n")), Variant::Int(1));
    }

    #[test]
    fn clear_through_function() {
        let mut m = map(&[("a", 1)]);
        clear(&mut m).unwrap();
        assert!(m.is_empty());
    }

    proptest! {
        #[test]
        fn merged_keeps_first_values(
            a in proptest::collection::vec(("[a-e]", any::<i64>()), 0..12),
            b in proptest::collection::vec(("[a-e]", any::<i64>()), 0..12),
        ) {
            let a: Map<String, i64> = a.into_iter().collect();
            let b: Map<String, i64> = b.into_iter().collect();
            let result = merged(&a, &b);

            for (key, value) in result.iter() {
                let expected = a.lookup(&key).or_else(|| b.lookup(&key));
                prop_assert_eq!(Some(value), expected);
            }
            prop_assert!(a.iter().all(|(key, _)| result.has(&key)));
            prop_assert!(b.iter().all(|(key, _)| result.has(&key)));
        }
    }
}

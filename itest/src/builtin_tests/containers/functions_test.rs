/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use vardict::builtin::functions::{clear, duplicate, find_key, merge, merged, recursively_equal_to};
use vardict::builtin::{adapt, dict, vdict, Map, SlotStore, Variant};
use vardict::meta::ToVariant;

#[test]
fn merge_first_writer_wins() {
    let mut dst: Map<String, i64> = dict! { "k": 1, "only_dst": 0 };
    let src: Map<String, i64> = dict! { "k": 2, "only_src": 5 };

    merge(&mut dst, &src).unwrap();

    assert_eq!(dst.index(&"k".into()), 1);
    assert_eq!(dst.index(&"only_src".into()), 5);
    assert_eq!(dst.len(), 3);
    assert_eq!(src.len(), 2);
}

#[test]
fn merged_end_to_end() {
    let a: Map<String, i64> = dict! { "x": 1, "y": 2 };
    let b: Map<String, i64> = dict! { "y": 99, "z": 3 };

    let result = merged(&a, &b);

    let expected: Map<String, i64> = dict! { "x": 1, "y": 2, "z": 3 };
    assert_eq!(result, expected);
    assert_eq!(result.keys(), ["x", "y", "z"].map(String::from));

    assert_eq!(a, dict! { "x": 1, "y": 2 });
    assert_eq!(b, dict! { "y": 99, "z": 3 });
}

#[test]
fn duplicate_is_independent() {
    let mut original: Map<String, i64> = dict! { "a": 1, "b": 2 };
    let mut copy = duplicate(&original);

    copy.set_index("a".into(), 10).unwrap();
    original.set_index("c".into(), 3).unwrap();

    assert_eq!(original.index(&"a".into()), 1);
    assert!(!copy.has(&"c".into()));
}

#[test]
fn duplicate_of_proxied_map_is_local() {
    let slots = SlotStore::<String, i64>::new();
    let mut original: Map<String, i64> = dict! { "a": 1 };
    adapt(&mut original, || slots.allocate()).unwrap();
    original.make_read_only();

    let mut copy = duplicate(&original);
    copy.set_index("b".into(), 2).unwrap();

    assert_eq!(original.len(), 1);
    assert_eq!(slots.live_count(), 1);
}

#[test]
fn find_key_first_inserted() {
    let map: Map<String, i64> = dict! { "first": 7, "other": 1, "second": 7 };

    assert_eq!(find_key(&map, &7), Some("first".to_string()));
    assert_eq!(map.find_key_by_value(&1), Some("other".to_string()));
    assert_eq!(find_key(&map, &42), None);
}

#[test]
fn recursively_equal_nested() {
    let lhs = vdict! {
        "list": Variant::Array(vec![1.to_variant(), vdict! { "deep": true }.to_variant()]),
        "n": 1,
    };
    let rhs = vdict! {
        "n": 1,
        "list": Variant::Array(vec![1.to_variant(), vdict! { "deep": true }.to_variant()]),
    };
    let different = vdict! {
        "n": 1,
        "list": Variant::Array(vec![1.to_variant(), vdict! { "deep": false }.to_variant()]),
    };

    assert!(recursively_equal_to(&lhs, &rhs));
    assert!(recursively_equal_to(&rhs, &lhs));
    assert!(!recursively_equal_to(&lhs, &different));
}

#[test]
fn clear_respects_read_only() {
    let mut map: Map<String, i64> = dict! { "a": 1 };
    clear(&mut map).unwrap();
    assert!(map.is_empty());

    map.make_read_only();
    assert!(clear(&mut map).is_err());
}

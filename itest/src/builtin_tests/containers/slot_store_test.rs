/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use vardict::builtin::{adapt, Map, Proxy, SlotStore, VarMap, Variant};
use vardict::meta::ToVariant;

use crate::framework::expect_panic;

#[test]
fn slot_store_multiplexes_dictionaries() {
    let slots = SlotStore::<String, i64>::new();
    let (store, a) = slots.allocate();
    let (_, b) = slots.allocate();

    let mut first: Map<String, i64> = Map::via(store.clone(), a);
    let mut second: Map<String, i64> = Map::via(store, b);
    first.set_index("k".into(), 1).unwrap();
    second.set_index("k".into(), 2).unwrap();

    assert_eq!(first.index(&"k".into()), 1);
    assert_eq!(second.index(&"k".into()), 2);
    assert_eq!(slots.live_count(), 2);
}

#[test]
fn slot_store_clone_is_handle() {
    let slots = SlotStore::<String, i64>::new();
    let (store, state) = slots.allocate();

    let map: Map<String, i64> = Map::via(store, state);
    let mut handle = map.clone();
    handle.set_index("shared".into(), 7).unwrap();

    assert_eq!(map.lookup(&"shared".into()), Some(7));
    assert_eq!(map, handle);
}

#[test]
fn slot_store_read_only_per_dictionary() {
    let slots = SlotStore::<String, i64>::new();
    let (store, a) = slots.allocate();
    let (_, b) = slots.allocate();

    store.make_read_only(a);
    assert!(store.is_read_only(a));
    assert!(!store.is_read_only(b));
    assert!(store.set_index(a, "x".into(), 1).is_err());
    assert!(store.set_index(b, "x".into(), 1).is_ok());
}

#[test]
fn slot_store_erased_view() {
    let slots = SlotStore::<String, i64>::new();
    let (store, state) = slots.allocate();
    let typed: Map<String, i64> = Map::via(store, state);

    let mut erased: VarMap = typed.any();
    erased.set_index("a".to_variant(), 1.to_variant()).unwrap();
    assert!(erased.set_index(1.to_variant(), 1.to_variant()).is_err());

    assert_eq!(typed.index(&"a".into()), 1);
    assert_eq!(typed.hash_u32(), erased.hash_u32());
}

#[test]
fn slot_store_variant_store_erases_without_view() {
    let slots = SlotStore::<Variant, Variant>::new();
    let (store, state) = slots.allocate();
    let map: VarMap = Map::via(store.clone(), state);

    let erased = map.any();
    let proxy = erased.proxy().expect("erased view of a store is never nil");
    assert!(std::rc::Rc::ptr_eq(proxy, &(store as std::rc::Rc<dyn Proxy<Variant, Variant>>)));
}

#[test]
fn slot_store_release() {
    let slots = SlotStore::<String, i64>::new();
    let (store, state) = slots.allocate();
    let map: Map<String, i64> = Map::via(store, state);

    assert!(slots.release(state));
    assert!(!slots.is_live(state));

    expect_panic("access to released dictionary", || {
        let _ = map.len();
    });
}

#[test]
fn slot_store_nested_dictionaries() {
    let slots = SlotStore::<Variant, Variant>::new();
    let mut inner = VarMap::new();
    let mut outer = VarMap::new();
    adapt(&mut inner, || slots.allocate()).unwrap();
    adapt(&mut outer, || slots.allocate()).unwrap();

    inner.set_index("x".to_variant(), 1.to_variant()).unwrap();
    outer.set_index("inner".to_variant(), inner.to_variant()).unwrap();
    let itself = outer.to_variant();
    outer.set_index("self".to_variant(), itself).unwrap();

    assert_ne!(outer.hash_u32(), 0);
    assert!(outer.to_string().starts_with(r#"{ "inner": { "x": 1 }, "self": { "inner""#));

    let fetched = outer.index(&"self".to_variant()).to::<VarMap>();
    assert_eq!(fetched.index(&"inner".to_variant()), inner.to_variant());
    assert_eq!(slots.live_count(), 2);
}

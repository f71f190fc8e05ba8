/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::rc::Rc;

use crate::builtin::collections::proxy::downcast_proxy;
use crate::builtin::{Map, Proxy, State};
use crate::meta::error::MapError;
use crate::meta::{Element, Key};

/// Makes sure `map` is backed by a proxy of type `P`, and returns that proxy with its state.
///
/// `alloc` produces a fresh, empty `P` and is called at most once, only when the entries have to move.
///
/// - A nil map gets a freshly allocated `P`.
/// - If `P` already backs the map (directly, behind a forwarding local store, or behind a type-erased view), the existing
///   proxy and state are returned. No entries are copied, so calling `adapt` again is free.
/// - If the map is backed by a store that can hand over its storage (an un-promoted [`LocalFirst`][crate::builtin::LocalFirst],
///   or a view of one), all entries are replayed into the new `P` in iteration order. A read-only flag is carried over once
///   the replay is complete. The old store then forwards to `P`, so every existing handle and view of it sees the new backing.
/// - Otherwise the map is backed by an unrelated store, and [`MapError::AlreadyProxied`] is returned. Silently copying would
///   break the sharing that other handles rely on.
///
/// # Errors
/// Besides [`MapError::AlreadyProxied`], errors of `P` during the replay are returned as is. The map then stays on its old
/// backing with all entries, and nothing is redirected. The freshly allocated `P` keeps the entries replayed so far and is not
/// referenced by any map. Releasing it is up to the allocator, e.g. through [`SlotStore::release()`][crate::builtin::SlotStore::release].
///
/// # Example
/// ```
/// use vardict_core::builtin::{adapt, Map, Proxy, SlotStore};
///
/// let slots = SlotStore::<String, i64>::new();
/// let mut map: Map<String, i64> = Map::new();
/// map.set_index("a".into(), 1).unwrap();
///
/// let (store, state) = adapt(&mut map, || slots.allocate()).unwrap();
/// assert_eq!(store.lookup(state, &"a".to_string()), Some(1));
///
/// // Second call finds the same store and does not allocate.
/// let (again, same_state) = adapt(&mut map, || unreachable!()).unwrap();
/// assert!(std::rc::Rc::ptr_eq(&store, &again));
/// assert_eq!(state, same_state);
/// ```
pub fn adapt<P, K, V>(
    map: &mut Map<K, V>,
    alloc: impl FnOnce() -> (Rc<P>, State),
) -> Result<(Rc<P>, State), MapError>
where
    P: Proxy<K, V>,
    K: Key,
    V: Element,
{
    let Some(head) = map.proxy().cloned() else {
        let (proxy, state) = alloc();
        out!("adapt: nil map gets fresh {}", (*proxy).proxy_type_name());
        map.attach(proxy.clone(), state);
        return Ok((proxy, state));
    };
    let head_state = map.state();

    // Already backed by P, possibly behind forwarding local stores.
    let (mut link, mut link_state) = (Rc::clone(&head), head_state);
    loop {
        if let Some(proxy) = downcast_proxy::<P, K, V>(&link) {
            map.attach(proxy.clone(), link_state);
            return Ok((proxy, link_state));
        }

        match link.forwarded(link_state) {
            Some((next, next_state)) => {
                link = next;
                link_state = next_state;
            }
            None => break,
        }
    }

    // Backed by P behind a type-erased view.
    if let Some((origin, origin_state)) = link.lift(link_state) {
        if let Ok(proxy) = Rc::clone(&origin).into_any_rc().downcast::<P>() {
            map.attach(proxy.clone(), origin_state);
            return Ok((proxy, origin_state));
        }
    }

    // The end of the forwarding chain is the store that currently holds the entries.
    if !link.supports_install(link_state) {
        return Err(MapError::already_proxied(
            std::any::type_name::<P>(),
            (*link).proxy_type_name(),
        ));
    }

    // Promotion: replay into a fresh P, then redirect the old storage.
    let (proxy, state) = alloc();
    let read_only = link.is_read_only(link_state);

    let mut replayed = 0;
    for (key, value) in Rc::clone(&link).iter(link_state) {
        proxy.set_index(state, key, value)?;
        replayed += 1;
    }
    balanced_assert_eq!(
        replayed,
        link.len(link_state),
        "adapt(): replay lost entries"
    );

    if read_only {
        proxy.make_read_only(state);
    }

    link.install(link_state, proxy.clone(), state)?;
    map.attach(proxy.clone(), state);

    log::debug!(
        "promoted dictionary with {replayed} entries from {} to {}",
        crate::meta::short_type_name((*link).proxy_type_name()),
        crate::meta::short_type_name((*proxy).proxy_type_name()),
    );
    Ok((proxy, state))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use proptest::prelude::*;

    use super::*;
    use crate::builtin::collections::proxy::erase_proxy;
    use crate::builtin::{LocalFirst, ProxyIter, SlotStore, VarMap, Variant};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Store that refuses one key, so that a replay stops halfway.
    #[derive(Debug)]
    struct Picky {
        entries: Rc<LocalFirst<String, i64>>,
        refused: &'static str,
    }

    impl Picky {
        fn new(refused: &'static str) -> Rc<Self> {
            Rc::new(Self {
                entries: Rc::new(LocalFirst::new()),
                refused,
            })
        }
    }

    impl Proxy<String, i64> for Picky {
        fn lookup(&self, state: State, key: &String) -> Option<i64> {
            self.entries.lookup(state, key)
        }

        fn has(&self, state: State, key: &String) -> bool {
            self.entries.has(state, key)
        }

        fn set_index(&self, state: State, key: String, value: i64) -> Result<(), MapError> {
            if key == self.refused {
                return Err(MapError::ReadOnly);
            }
            self.entries.set_index(state, key, value)
        }

        fn clear(&self, state: State) -> Result<(), MapError> {
            self.entries.clear(state)
        }

        fn iter(self: Rc<Self>, state: State) -> ProxyIter<String, i64> {
            Rc::clone(&self.entries).iter(state)
        }

        fn erase(&self, state: State, key: &String) -> Result<bool, MapError> {
            self.entries.erase(state, key)
        }

        fn hash_u32(&self, state: State) -> u32 {
            self.entries.hash_u32(state)
        }

        fn len(&self, state: State) -> usize {
            self.entries.len(state)
        }

        fn is_read_only(&self, state: State) -> bool {
            self.entries.is_read_only(state)
        }

        fn make_read_only(&self, state: State) {
            self.entries.make_read_only(state)
        }

        fn any(self: Rc<Self>, state: State) -> VarMap {
            erase_proxy(self, state)
        }

        fn sort(&self, state: State, less: &dyn Fn(&String, &String) -> bool) -> Result<(), MapError> {
            self.entries.sort(state, less)
        }
    }

    fn sample() -> Map<String, i64> {
        let mut map = Map::new();
        for (key, value) in [("one", 1), ("two", 2), ("three", 3)] {
            map.set_index(key.to_string(), value).unwrap();
        }
        map
    }

    #[test]
    fn adapt_is_idempotent() {
        init_logger();
        let slots = SlotStore::<String, i64>::new();
        let calls = Cell::new(0);
        let alloc = || {
            calls.set(calls.get() + 1);
            slots.allocate()
        };

        let mut map = sample();
        let (first, first_state) = adapt(&mut map, alloc).unwrap();
        let (second, second_state) = adapt(&mut map, alloc).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first_state, second_state);
        assert_eq!(calls.get(), 1);
        assert_eq!(slots.live_count(), 1);
    }

    #[test]
    fn nil_map_allocates_directly() {
        let slots = SlotStore::<String, i64>::new();
        let mut map = Map::<String, i64>::default();

        let (store, state) = adapt(&mut map, || slots.allocate()).unwrap();
        assert_eq!(store.len(state), 0);

        map.set_index("k".into(), 1).unwrap();
        assert_eq!(store.lookup(state, &"k".to_string()), Some(1));
    }

    #[test]
    fn promotion_carries_read_only_after_replay() {
        let slots = SlotStore::<String, i64>::new();
        let mut map = sample();
        map.make_read_only();

        let (store, state) = adapt(&mut map, || slots.allocate()).unwrap();

        assert_eq!(store.len(state), 3);
        assert!(store.is_read_only(state));
        assert!(map.set_index("four".into(), 4).unwrap_err().is_read_only());
    }

    #[test]
    fn old_handles_follow_promotion() {
        let slots = SlotStore::<String, i64>::new();
        let mut map = sample();
        let erased = map.any();
        let mut alias = map.clone();

        // Clone of an un-promoted local map is independent.
        alias.set_index("alias-only".into(), 0).unwrap();
        assert!(!map.has(&"alias-only".to_string()));

        let (store, state) = adapt(&mut map, || slots.allocate()).unwrap();
        map.set_index("four".into(), 4).unwrap();

        assert_eq!(store.lookup(state, &"four".to_string()), Some(4));
        assert_eq!(erased.index(&Variant::from("four")), Variant::Int(4));
        assert_eq!(erased.len(), 4);
    }

    #[test]
    fn erased_view_converges_with_typed_promotion() {
        let erased_slots = SlotStore::<Variant, Variant>::new();
        let typed_slots = SlotStore::<String, i64>::new();

        let mut typed = sample();
        let mut erased: VarMap = typed.any();

        // Promote the erased view first, then the typed map: both end up on the erased slot store.
        let (erased_store, erased_state) = adapt(&mut erased, || erased_slots.allocate()).unwrap();
        let result = adapt(&mut typed, || typed_slots.allocate());
        assert!(matches!(result, Err(MapError::AlreadyProxied { .. })));

        typed.set_index("four".into(), 4).unwrap();
        assert_eq!(
            erased_store.lookup(erased_state, &Variant::from("four")),
            Some(Variant::Int(4))
        );
        assert_eq!(erased.len(), 4);
        assert_eq!(typed_slots.live_count(), 0);
    }

    #[test]
    fn lift_finds_erased_origin() {
        let erased_slots = SlotStore::<Variant, Variant>::new();

        let typed = sample();
        let mut erased = typed.any();
        let (store, state) = adapt(&mut erased, || erased_slots.allocate()).unwrap();

        // A second erased view of the typed map lifts to the same store, without allocating.
        let mut second = typed.any();
        let (lifted, lifted_state) = adapt(&mut second, || unreachable!("must not allocate")).unwrap();

        assert!(Rc::ptr_eq(&store, &lifted));
        assert_eq!(state, lifted_state);
        assert_eq!(erased_slots.live_count(), 1);
    }

    #[test]
    fn foreign_backing_is_not_copied() {
        let first = SlotStore::<String, i64>::new();
        let second = SlotStore::<String, i64>::new();

        let (store, state) = first.allocate();
        let mut map: Map<String, i64> = Map::via(store, state);

        // Another instance of the same proxy type is accepted as is.
        let (found, _) = adapt(&mut map, || second.allocate()).unwrap();
        assert_eq!(second.live_count(), 0);
        assert_eq!(found.live_count(), 1);

        // An unrelated proxy type is refused.
        let err = adapt(&mut map, || (Rc::new(LocalFirst::new()), State::ZERO)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dictionary already proxied: cannot adapt to LocalFirst<String, i64>, backed by SlotStore<String, i64>"
        );
    }

    #[test]
    fn failed_replay_keeps_old_backing() {
        let target = Picky::new("two");
        let mut map = sample();
        let erased = map.any();

        let err = adapt(&mut map, || (Rc::clone(&target), State::ZERO)).unwrap_err();
        assert!(err.is_read_only(), "{err}");

        // The fresh store holds what was replayed before the failure, but nothing points to it.
        assert_eq!(target.len(State::ZERO), 1);
        assert!(target.has(State::ZERO, &"one".to_string()));

        let local = map
            .proxy()
            .and_then(downcast_proxy::<LocalFirst<String, i64>, String, i64>)
            .expect("still local");
        assert!(!local.is_forwarded());

        map.set_index("four".into(), 4).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(erased.len(), 4);
        assert!(!target.has(State::ZERO, &"four".to_string()));
    }

    proptest! {
        #[test]
        fn promotion_preserves_order(values in proptest::collection::vec(any::<i64>(), 0..32)) {
            let slots = SlotStore::<String, i64>::new();
            let mut map = Map::new();
            for (i, value) in values.iter().enumerate() {
                map.set_index(format!("k{i}"), *value).unwrap();
            }
            let before: Vec<(String, i64)> = map.iter().collect();

            adapt(&mut map, || slots.allocate()).unwrap();
            let after: Vec<(String, i64)> = map.iter().collect();

            prop_assert_eq!(before, after);
        }
    }
}

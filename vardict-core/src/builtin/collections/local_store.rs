/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::builtin::collections::proxy::{erase_proxy, sort_keys};
use crate::builtin::variant::hash_entries;
use crate::builtin::{Proxy, ProxyIter, State, VarMap};
use crate::meta::error::MapError;
use crate::meta::{Element, Key};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Ordered storage

/// Insertion-ordered entries with a read-only latch. Shared by [`LocalFirst`] and [`SlotStore`][crate::builtin::SlotStore].
#[derive(Clone)]
pub(crate) struct OrderedStore<K, V> {
    /// Each key exactly once, in first-insertion order. Same key set as `values`.
    order: Vec<K>,
    values: HashMap<K, V>,
    fixed: bool,
}

impl<K: Key, V: Element> OrderedStore<K, V> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            values: HashMap::new(),
            fixed: false,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn keys(&self) -> &[K] {
        &self.order
    }

    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .iter()
            .filter_map(|key| self.values.get(key).map(|value| (key, value)))
    }

    pub fn is_read_only(&self) -> bool {
        self.fixed
    }

    pub fn make_read_only(&mut self) {
        self.fixed = true;
    }

    pub fn hash_u32(&self) -> u32 {
        hash_entries(self.entries())
    }

    pub fn set(&mut self, key: K, value: V) -> Result<(), MapError> {
        self.ensure_writable()?;
        self.insert_unchecked(key, value);
        Ok(())
    }

    /// Upsert that ignores the read-only latch; for building fresh stores.
    pub fn insert_unchecked(&mut self, key: K, value: V) {
        match self.values.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(value);
            }
            Entry::Vacant(entry) => {
                self.order.push(entry.key().clone());
                entry.insert(value);
            }
        }

        strict_assert_eq!(self.order.len(), self.values.len());
    }

    pub fn erase(&mut self, key: &K) -> Result<bool, MapError> {
        self.ensure_writable()?;

        if self.values.remove(key).is_none() {
            return Ok(false);
        }

        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }

        strict_assert_eq!(self.order.len(), self.values.len());
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), MapError> {
        self.ensure_writable()?;
        self.order.clear();
        self.values.clear();
        Ok(())
    }

    /// Key order to be sorted outside of any borrow, then passed to [`reorder()`][Self::reorder].
    pub fn keys_for_sort(&self) -> Result<Vec<K>, MapError> {
        self.ensure_writable()?;
        Ok(self.order.clone())
    }

    /// Applies a sorted key order.
    ///
    /// Keys erased since [`keys_for_sort()`][Self::keys_for_sort] are dropped, keys added since then go last.
    pub fn reorder(&mut self, sorted: Vec<K>) -> Result<(), MapError> {
        self.ensure_writable()?;

        let mut order: Vec<K> = sorted
            .into_iter()
            .filter(|key| self.values.contains_key(key))
            .collect();

        let added: Vec<K> = {
            let placed: HashSet<&K> = order.iter().collect();
            self.order
                .iter()
                .filter(|key| !placed.contains(key))
                .cloned()
                .collect()
        };

        order.extend(added);
        self.order = order;

        strict_assert_eq!(self.order.len(), self.values.len());
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), MapError> {
        if self.fixed {
            Err(MapError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl<K: Key, V: Element> FromIterator<(K, V)> for OrderedStore<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (key, value) in iter {
            store.insert_unchecked(key, value);
        }
        store
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Local-first proxy

enum Backing<K: Key, V: Element> {
    Local(OrderedStore<K, V>),

    /// Entries moved to another store; every call goes there.
    Forwarded {
        proxy: Rc<dyn Proxy<K, V>>,
        state: State,
    },
}

/// Default backing store of a [`Map`][crate::builtin::Map]: in-process, insertion-ordered.
///
/// A `LocalFirst` holds its own entries until [`adapt()`][crate::builtin::adapt] moves them into another proxy. From then on,
/// it is a forwarding shim to that proxy, so handles and views created earlier keep addressing the same dictionary.
/// Forwarding happens at most once.
///
/// The state token passed to its methods is ignored.
pub struct LocalFirst<K: Key, V: Element> {
    backing: RefCell<Backing<K, V>>,
}

impl<K: Key, V: Element> LocalFirst<K, V> {
    /// Empty, writable store.
    pub fn new() -> Self {
        Self::from_store(OrderedStore::new())
    }

    pub(crate) fn from_store(store: OrderedStore<K, V>) -> Self {
        Self {
            backing: RefCell::new(Backing::Local(store)),
        }
    }

    /// Whether the entries have moved to another store.
    pub fn is_forwarded(&self) -> bool {
        matches!(&*self.backing.borrow(), Backing::Forwarded { .. })
    }

    /// Independent copy of the entries and the read-only flag, or `None` once forwarded.
    ///
    /// Also `None` while the entries are being written, since they cannot be read consistently then.
    pub(crate) fn detached_copy(&self) -> Option<Self> {
        match &*self.backing.try_borrow().ok()? {
            Backing::Local(store) => Some(Self::from_store(store.clone())),
            Backing::Forwarded { .. } => None,
        }
    }

    /// Drops the local entries and delegates all further calls to `proxy`.
    ///
    /// Entries are not copied; that is the caller's job.
    pub fn forward_to(&self, proxy: Rc<dyn Proxy<K, V>>, state: State) -> Result<(), MapError> {
        let mut backing = self.backing.borrow_mut();

        if let Backing::Forwarded { proxy: current, .. } = &*backing {
            return Err(MapError::already_proxied(
                (*proxy).proxy_type_name(),
                (**current).proxy_type_name(),
            ));
        }

        out!("LocalFirst: forward to {} {state:?}", (*proxy).proxy_type_name());
        *backing = Backing::Forwarded { proxy, state };
        Ok(())
    }

    fn forward_target(&self) -> Option<(Rc<dyn Proxy<K, V>>, State)> {
        match &*self.backing.borrow() {
            Backing::Local(_) => None,
            Backing::Forwarded { proxy, state } => Some((Rc::clone(proxy), *state)),
        }
    }

    /// Runs `local` on the own entries, or returns the store that calls are forwarded to.
    ///
    /// The `RefCell` is released on return, so the caller may call into the target store freely.
    fn try_write<R>(
        &self,
        local: impl FnOnce(&mut OrderedStore<K, V>) -> R,
    ) -> Result<R, (Rc<dyn Proxy<K, V>>, State)> {
        match &mut *self.backing.borrow_mut() {
            Backing::Local(store) => Ok(local(store)),
            Backing::Forwarded { proxy, state } => Err((Rc::clone(proxy), *state)),
        }
    }

    /// Like [`try_write()`][Self::try_write], with a shared borrow.
    ///
    /// Reads may nest: cloning or hashing a value can read this same store again, when the dictionary contains itself.
    fn try_read<R>(&self, local: impl FnOnce(&OrderedStore<K, V>) -> R) -> Result<R, (Rc<dyn Proxy<K, V>>, State)> {
        match &*self.backing.borrow() {
            Backing::Local(store) => Ok(local(store)),
            Backing::Forwarded { proxy, state } => Err((Rc::clone(proxy), *state)),
        }
    }

    fn route_read<R>(
        &self,
        local: impl FnOnce(&OrderedStore<K, V>) -> R,
        forwarded: impl FnOnce(&Rc<dyn Proxy<K, V>>, State) -> R,
    ) -> R {
        self.try_read(local)
            .unwrap_or_else(|(proxy, state)| forwarded(&proxy, state))
    }

    fn route_write<R>(
        &self,
        local: impl FnOnce(&mut OrderedStore<K, V>) -> R,
        forwarded: impl FnOnce(&Rc<dyn Proxy<K, V>>, State) -> R,
    ) -> R {
        self.try_write(local)
            .unwrap_or_else(|(proxy, state)| forwarded(&proxy, state))
    }
}

impl<K: Key, V: Element> Default for LocalFirst<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V: Element> fmt::Debug for LocalFirst<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("LocalFirst");

        match self.backing.try_borrow().as_deref() {
            Ok(Backing::Local(store)) => debug.field("len", &store.len()).field("read_only", &store.is_read_only()),
            Ok(Backing::Forwarded { proxy, state }) => debug
                .field("forwarded_to", &(**proxy).proxy_type_name())
                .field("state", state),
            Err(_) => debug.field("backing", &"<borrowed>"),
        };

        debug.finish()
    }
}

impl<K: Key, V: Element> Proxy<K, V> for LocalFirst<K, V> {
    fn lookup(&self, _state: State, key: &K) -> Option<V> {
        self.route_read(
            |store| store.get(key).cloned(),
            |proxy, state| proxy.lookup(state, key),
        )
    }

    fn has(&self, _state: State, key: &K) -> bool {
        self.route_read(
            |store| store.contains(key),
            |proxy, state| proxy.has(state, key),
        )
    }

    fn set_index(&self, _state: State, key: K, value: V) -> Result<(), MapError> {
        let (proxy, state) = {
            let mut backing = self.backing.borrow_mut();
            match &mut *backing {
                Backing::Local(store) => return store.set(key, value),
                Backing::Forwarded { proxy, state } => (Rc::clone(proxy), *state),
            }
        };

        proxy.set_index(state, key, value)
    }

    fn clear(&self, _state: State) -> Result<(), MapError> {
        self.route_write(OrderedStore::clear, |proxy, state| proxy.clear(state))
    }

    fn iter(self: Rc<Self>, state: State) -> ProxyIter<K, V> {
        // Snapshot of the key order; values are looked up lazily, skipping keys erased in the meantime.
        let keys = match self.try_read(|store| store.keys().to_vec()) {
            Ok(keys) => keys,
            Err((proxy, target_state)) => return proxy.iter(target_state),
        };

        Box::new(keys.into_iter().filter_map(move |key| {
            let value = self.lookup(state, &key)?;
            Some((key, value))
        }))
    }

    fn erase(&self, _state: State, key: &K) -> Result<bool, MapError> {
        self.route_write(|store| store.erase(key), |proxy, state| proxy.erase(state, key))
    }

    fn hash_u32(&self, _state: State) -> u32 {
        self.route_read(|store| store.hash_u32(), |proxy, state| proxy.hash_u32(state))
    }

    fn len(&self, _state: State) -> usize {
        self.route_read(|store| store.len(), |proxy, state| proxy.len(state))
    }

    fn is_read_only(&self, _state: State) -> bool {
        self.route_read(
            |store| store.is_read_only(),
            |proxy, state| proxy.is_read_only(state),
        )
    }

    fn make_read_only(&self, _state: State) {
        self.route_write(
            OrderedStore::make_read_only,
            |proxy, state| proxy.make_read_only(state),
        )
    }

    fn any(self: Rc<Self>, state: State) -> VarMap {
        erase_proxy(self, state)
    }

    fn sort(&self, _state: State, less: &dyn Fn(&K, &K) -> bool) -> Result<(), MapError> {
        // `less` may read this dictionary, so it runs while no borrow is held.
        let mut keys = match self.try_read(OrderedStore::keys_for_sort) {
            Ok(keys) => keys?,
            Err((proxy, state)) => return proxy.sort(state, less),
        };
        sort_keys(&mut keys, less);

        self.route_write(|store| store.reorder(keys), |proxy, state| proxy.sort(state, less))
    }

    fn forwarded(&self, _state: State) -> Option<(Rc<dyn Proxy<K, V>>, State)> {
        self.forward_target()
    }

    fn supports_install(&self, _state: State) -> bool {
        !self.is_forwarded()
    }

    fn install(&self, _state: State, target: Rc<dyn Proxy<K, V>>, target_state: State) -> Result<(), MapError> {
        self.forward_to(target, target_state)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::SlotStore;

    fn local() -> Rc<LocalFirst<String, i64>> {
        Rc::new(LocalFirst::new())
    }

    fn keys(store: &Rc<LocalFirst<String, i64>>) -> Vec<String> {
        Rc::clone(store).iter(State::ZERO).map(|(k, _)| k).collect()
    }

    #[test]
    fn overwrite_keeps_position() {
        let store = local();
        let s = State::ZERO;

        store.set_index(s, "a".into(), 1).unwrap();
        store.set_index(s, "b".into(), 2).unwrap();
        store.set_index(s, "a".into(), 3).unwrap();

        assert_eq!(keys(&store), ["a", "b"]);
        assert_eq!(store.index(s, &"a".to_string()), 3);
        assert_eq!(store.len(s), 2);
    }

    #[test]
    fn erase_splices_order() {
        let store = local();
        let s = State::ZERO;
        for (i, key) in ["x", "y", "z"].into_iter().enumerate() {
            store.set_index(s, key.into(), i as i64).unwrap();
        }

        assert!(store.erase(s, &"y".to_string()).unwrap());
        assert!(!store.erase(s, &"y".to_string()).unwrap());
        assert_eq!(keys(&store), ["x", "z"]);
    }

    #[test]
    fn read_only_rejects_every_mutator() {
        let store = local();
        let s = State::ZERO;
        store.set_index(s, "a".into(), 1).unwrap();
        store.make_read_only(s);

        assert!(store.set_index(s, "b".into(), 2).unwrap_err().is_read_only());
        assert!(store.erase(s, &"a".to_string()).unwrap_err().is_read_only());
        assert!(store.clear(s).unwrap_err().is_read_only());
        assert!(store.sort(s, &|a, b| a < b).unwrap_err().is_read_only());
        assert!(store.is_read_only(s));
        assert_eq!(store.len(s), 1);
    }

    #[test]
    fn iteration_skips_entries_erased_meanwhile() {
        let store = local();
        let s = State::ZERO;
        for key in ["a", "b", "c"] {
            store.set_index(s, key.into(), 0).unwrap();
        }

        let mut iter = Rc::clone(&store).iter(s);
        assert_eq!(iter.next().map(|(k, _)| k).as_deref(), Some("a"));

        store.erase(s, &"b".to_string()).unwrap();
        let rest: Vec<String> = iter.map(|(k, _)| k).collect();
        assert_eq!(rest, ["c"]);
    }

    #[test]
    fn sort_reorders_keys_only() {
        let store = local();
        let s = State::ZERO;
        for (key, value) in [("c", 1), ("a", 2), ("b", 3)] {
            store.set_index(s, key.into(), value).unwrap();
        }

        store.sort(s, &|a, b| a < b).unwrap();
        let entries: Vec<(String, i64)> = Rc::clone(&store).iter(s).collect();
        let expected = [("a", 2i64), ("b", 3), ("c", 1)].map(|(k, v)| (k.to_string(), v));
        assert_eq!(entries, expected);
    }

    #[test]
    fn sort_comparator_may_read_the_store() {
        let store = local();
        let s = State::ZERO;
        for (key, value) in [("a", 3), ("b", 1), ("c", 2)] {
            store.set_index(s, key.into(), value).unwrap();
        }

        let reader = Rc::clone(&store);
        store
            .sort(s, &|a, b| reader.index(s, a) < reader.index(s, b))
            .unwrap();
        assert_eq!(keys(&store), ["b", "c", "a"]);
    }

    #[test]
    fn sort_keeps_keys_added_by_comparator() {
        let store = local();
        let s = State::ZERO;
        store.set_index(s, "a".into(), 1).unwrap();
        store.set_index(s, "b".into(), 2).unwrap();

        let writer = Rc::clone(&store);
        store
            .sort(s, &|a, b| {
                writer.set_index(s, "late".into(), 0).unwrap();
                a > b
            })
            .unwrap();

        assert_eq!(keys(&store), ["b", "a", "late"]);
        assert_eq!(store.len(s), 3);
    }

    #[test]
    fn debug_shows_backing() {
        let store = local();
        store.set_index(State::ZERO, "a".into(), 1).unwrap();
        assert_eq!(format!("{store:?}"), "LocalFirst { len: 1, read_only: false }");

        let slots = SlotStore::<String, i64>::new();
        let (target, target_state) = slots.allocate();
        store.forward_to(target, target_state).unwrap();
        assert!(format!("{store:?}").contains("forwarded_to"));
    }

    #[test]
    fn hash_is_zero_only_when_empty() {
        let store = local();
        let s = State::ZERO;
        assert_eq!(store.hash_u32(s), 0);

        store.set_index(s, "a".into(), 1).unwrap();
        let first = store.hash_u32(s);
        assert_ne!(first, 0);

        store.set_index(s, "a".into(), 2).unwrap();
        assert_ne!(store.hash_u32(s), first);
    }

    #[test]
    fn forwarded_store_delegates_and_forwards_once() {
        let store = local();
        let slots = SlotStore::<String, i64>::new();
        let (target, target_state) = slots.allocate();

        store.forward_to(target.clone(), target_state).unwrap();
        assert!(store.is_forwarded());
        assert!(!store.supports_install(State::ZERO));

        store.set_index(State::ZERO, "k".into(), 7).unwrap();
        assert_eq!(target.lookup(target_state, &"k".to_string()), Some(7));

        let err = store.forward_to(target, target_state).unwrap_err();
        assert!(matches!(err, MapError::AlreadyProxied { .. }), "{err}");
    }
}

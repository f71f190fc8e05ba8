/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Zero-copy adapters between `Proxy<K, V>` and `Proxy<Variant, Variant>`.
//!
//! Keys and values are converted at the call boundary. Reads through [`TypedView`] panic if the erased store holds a value of
//! the wrong type; writes through [`AnyView`] return [`MapError::Convert`] instead.

use std::marker::PhantomData;
use std::rc::Rc;

use crate::builtin::{Map, Proxy, ProxyIter, State, VarMap, Variant};
use crate::meta::error::MapError;
use crate::meta::{Element, Key};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// TypedView

/// Presents an erased store as `Proxy<K, V>`.
///
/// The state token belongs to the wrapped store and is passed through unchanged.
pub struct TypedView<K, V> {
    erased: Rc<dyn Proxy<Variant, Variant>>,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K: Key, V: Element> TypedView<K, V> {
    pub fn new(erased: Rc<dyn Proxy<Variant, Variant>>) -> Self {
        Self {
            erased,
            _types: PhantomData,
        }
    }

    /// The wrapped erased store.
    pub fn erased(&self) -> &Rc<dyn Proxy<Variant, Variant>> {
        &self.erased
    }
}

impl<K: Key, V: Element> Proxy<K, V> for TypedView<K, V> {
    fn lookup(&self, state: State, key: &K) -> Option<V> {
        self.erased
            .lookup(state, &key.to_variant())
            .map(|value| V::from_variant(&value))
    }

    fn has(&self, state: State, key: &K) -> bool {
        self.erased.has(state, &key.to_variant())
    }

    fn set_index(&self, state: State, key: K, value: V) -> Result<(), MapError> {
        self.erased
            .set_index(state, key.to_variant(), value.to_variant())
    }

    fn clear(&self, state: State) -> Result<(), MapError> {
        self.erased.clear(state)
    }

    fn iter(self: Rc<Self>, state: State) -> ProxyIter<K, V> {
        let entries = Rc::clone(&self.erased).iter(state);

        Box::new(entries.map(|(key, value)| (K::from_variant(&key), V::from_variant(&value))))
    }

    fn erase(&self, state: State, key: &K) -> Result<bool, MapError> {
        self.erased.erase(state, &key.to_variant())
    }

    fn hash_u32(&self, state: State) -> u32 {
        self.erased.hash_u32(state)
    }

    fn len(&self, state: State) -> usize {
        self.erased.len(state)
    }

    fn is_read_only(&self, state: State) -> bool {
        self.erased.is_read_only(state)
    }

    fn make_read_only(&self, state: State) {
        self.erased.make_read_only(state)
    }

    fn any(self: Rc<Self>, state: State) -> VarMap {
        Map::via(Rc::clone(&self.erased), state)
    }

    fn sort(&self, state: State, less: &dyn Fn(&K, &K) -> bool) -> Result<(), MapError> {
        self.erased.sort(state, &|a: &Variant, b: &Variant| {
            less(&K::from_variant(a), &K::from_variant(b))
        })
    }

    fn lift(&self, state: State) -> Option<(Rc<dyn Proxy<Variant, Variant>>, State)> {
        Some((Rc::clone(&self.erased), state))
    }

    fn supports_install(&self, state: State) -> bool {
        self.erased.supports_install(state)
    }

    fn install(&self, state: State, target: Rc<dyn Proxy<K, V>>, target_state: State) -> Result<(), MapError> {
        let (erased_target, erased_state) = match Rc::clone(&target).any(target_state).into_parts() {
            (Some(erased_target), erased_state) => (erased_target, erased_state),
            (None, _) => {
                let view: Rc<dyn Proxy<Variant, Variant>> = Rc::new(AnyView::new(target));
                (view, target_state)
            }
        };

        self.erased.install(state, erased_target, erased_state)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// AnyView

/// Presents a typed store as `Proxy<Variant, Variant>`.
///
/// Keys that do not convert to `K` are reported as absent by reads, and rejected with [`MapError::Convert`] by writes.
pub struct AnyView<K: Key, V: Element> {
    typed: Rc<dyn Proxy<K, V>>,
}

impl<K: Key, V: Element> AnyView<K, V> {
    pub fn new(typed: Rc<dyn Proxy<K, V>>) -> Self {
        Self { typed }
    }

    /// The wrapped typed store.
    pub fn typed(&self) -> &Rc<dyn Proxy<K, V>> {
        &self.typed
    }
}

impl<K: Key, V: Element> Proxy<Variant, Variant> for AnyView<K, V> {
    fn lookup(&self, state: State, key: &Variant) -> Option<Variant> {
        let key = K::try_from_variant(key).ok()?;
        self.typed.lookup(state, &key).map(|value| value.to_variant())
    }

    fn has(&self, state: State, key: &Variant) -> bool {
        K::try_from_variant(key).is_ok_and(|key| self.typed.has(state, &key))
    }

    fn set_index(&self, state: State, key: Variant, value: Variant) -> Result<(), MapError> {
        let key = K::try_from_variant(&key)?;
        let value = V::try_from_variant(&value)?;
        self.typed.set_index(state, key, value)
    }

    fn clear(&self, state: State) -> Result<(), MapError> {
        self.typed.clear(state)
    }

    fn iter(self: Rc<Self>, state: State) -> ProxyIter<Variant, Variant> {
        let entries = Rc::clone(&self.typed).iter(state);

        Box::new(entries.map(|(key, value)| (key.to_variant(), value.to_variant())))
    }

    fn erase(&self, state: State, key: &Variant) -> Result<bool, MapError> {
        match K::try_from_variant(key) {
            Ok(key) => self.typed.erase(state, &key),
            // Read-only still wins over "absent", like for any other key.
            Err(_) if self.typed.is_read_only(state) => Err(MapError::ReadOnly),
            Err(_) => Ok(false),
        }
    }

    fn hash_u32(&self, state: State) -> u32 {
        self.typed.hash_u32(state)
    }

    fn len(&self, state: State) -> usize {
        self.typed.len(state)
    }

    fn is_read_only(&self, state: State) -> bool {
        self.typed.is_read_only(state)
    }

    fn make_read_only(&self, state: State) {
        self.typed.make_read_only(state)
    }

    fn any(self: Rc<Self>, state: State) -> VarMap {
        Map::via(self, state)
    }

    fn sort(&self, state: State, less: &dyn Fn(&Variant, &Variant) -> bool) -> Result<(), MapError> {
        self.typed.sort(state, &|a: &K, b: &K| {
            less(&a.to_variant(), &b.to_variant())
        })
    }

    fn lift(&self, state: State) -> Option<(Rc<dyn Proxy<Variant, Variant>>, State)> {
        let (mut proxy, mut state) = (Rc::clone(&self.typed), state);

        while let Some((next, next_state)) = proxy.forwarded(state) {
            proxy = next;
            state = next_state;
        }

        proxy.lift(state)
    }

    fn supports_install(&self, state: State) -> bool {
        self.typed.supports_install(state)
    }

    fn install(
        &self,
        state: State,
        target: Rc<dyn Proxy<Variant, Variant>>,
        target_state: State,
    ) -> Result<(), MapError> {
        let typed_target: Rc<dyn Proxy<K, V>> = Rc::new(TypedView::<K, V>::new(target));
        self.typed.install(state, typed_target, target_state)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::rc::Rc;

use crate::builtin::collections::functions;
use crate::builtin::collections::local_store::OrderedStore;
use crate::builtin::collections::proxy::downcast_proxy;
use crate::builtin::variant::fmt_entries;
use crate::builtin::{AnyView, LocalFirst, Proxy, ProxyIter, State, TypedView, Variant, VariantType};
use crate::meta::error::{ConvertError, FromVariantError, MapError};
use crate::meta::{same_type, Element, FromVariant, Key, ToVariant};

/// Insertion-ordered dictionary with keys of type `K` and values of type `V`.
///
/// # Storage and sharing
/// A `Map` is a handle to storage reached through a [`Proxy`]:
///
/// - [`Map::new()`] creates a map backed by its own [`LocalFirst`] store.
/// - [`Map::default()`] creates a _nil_ map without storage. It reads as empty, and the first write allocates a local store.
/// - [`Map::via()`] attaches to an existing proxy and state, e.g. a dictionary living in a [`SlotStore`][crate::builtin::SlotStore].
///
/// A local store is owned by the handle that created it: the one returned by [`Map::new()`] or `collect()`, or a nil map after
/// its first write. Cloning that handle copies the entries (keeping the read-only flag), and the copy owns its new store.
/// Cloning any other handle, such as the result of [`any()`][Self::any], [`via()`][Self::via] or a promoted map, produces another
/// handle to the same dictionary: writes through one are visible through the other.
///
/// # Element types
/// Keys must implement [`Key`], values [`Element`]. [`VarMap`] (`Map<Variant, Variant>`) accepts any value; [`Map::any()`]
/// and [`Map::from_any()`] switch between the typed and the erased form _without copying_.
///
/// # Errors
/// Writes return [`MapError::ReadOnly`] once [`make_read_only()`][Self::make_read_only] was called. Reading an absent key
/// through [`index()`][Self::index] is not an error, it returns `V::default()`.
///
/// # Thread safety
/// `Map` is neither `Send` nor `Sync`.
pub struct Map<K: Key, V: Element> {
    state: State,
    proxy: Option<Rc<dyn Proxy<K, V>>>,

    /// Whether this handle created its local store. Only owning handles copy on clone.
    owns_store: bool,
}

/// Dictionary with [`Variant`] keys and values.
pub type VarMap = Map<Variant, Variant>;

impl<K: Key, V: Element> Map<K, V> {
    /// Constructs an empty map backed by a local store.
    pub fn new() -> Self {
        Self::from_store(OrderedStore::new())
    }

    /// Handle to the dictionary identified by `state` inside `proxy`.
    ///
    /// The handle never owns the storage, so its clones alias it.
    pub fn via(proxy: Rc<dyn Proxy<K, V>>, state: State) -> Self {
        Self {
            state,
            proxy: Some(proxy),
            owns_store: false,
        }
    }

    pub(crate) fn from_store(store: OrderedStore<K, V>) -> Self {
        Self::owning(Rc::new(LocalFirst::from_store(store)))
    }

    fn owning(local: Rc<LocalFirst<K, V>>) -> Self {
        Self {
            state: State::ZERO,
            proxy: Some(local),
            owns_store: true,
        }
    }

    /// Whether this map has no storage yet (see [`Map::default()`]).
    pub fn is_nil(&self) -> bool {
        self.proxy.is_none()
    }

    /// Proxy currently backing the map, or `None` for a nil map.
    pub fn proxy(&self) -> Option<&Rc<dyn Proxy<K, V>>> {
        self.proxy.as_ref()
    }

    /// State token passed to the proxy.
    pub fn state(&self) -> State {
        self.state
    }

    /// Points the handle at another store, which it does not own.
    pub(crate) fn attach(&mut self, proxy: Rc<dyn Proxy<K, V>>, state: State) {
        self.proxy = Some(proxy);
        self.state = state;
        self.owns_store = false;
    }

    pub(crate) fn into_parts(self) -> (Option<Rc<dyn Proxy<K, V>>>, State) {
        (self.proxy, self.state)
    }

    fn materialize(&mut self) -> (Rc<dyn Proxy<K, V>>, State) {
        let proxy: Rc<dyn Proxy<K, V>> = match &self.proxy {
            Some(proxy) => Rc::clone(proxy),
            None => {
                out!("Map: materialize local store for nil map");
                let local = Rc::new(LocalFirst::new());
                *self = Self::owning(Rc::clone(&local));
                local
            }
        };

        (proxy, self.state)
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Reads

    /// Returns the value for `key`, or `V::default()` if absent.
    ///
    /// Use [`lookup()`][Self::lookup] to tell "absent" apart from "present with the default value".
    pub fn index(&self, key: &K) -> V {
        match &self.proxy {
            Some(proxy) => proxy.index(self.state, key),
            None => V::default(),
        }
    }

    /// Returns the value for `key`, or `None` if absent.
    pub fn lookup(&self, key: &K) -> Option<V> {
        self.proxy.as_ref()?.lookup(self.state, key)
    }

    /// Returns `true` if the map contains the given key.
    pub fn has(&self, key: &K) -> bool {
        self.proxy
            .as_ref()
            .is_some_and(|proxy| proxy.has(self.state, key))
    }

    /// Returns `true` if the map contains all of the given keys.
    pub fn contains_all_keys(&self, keys: &[K]) -> bool {
        keys.iter().all(|key| self.has(key))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.proxy
            .as_ref()
            .map_or(0, |proxy| proxy.len(self.state))
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content hash over the entries in iteration order. `0` for empty maps.
    pub fn hash_u32(&self) -> u32 {
        self.proxy
            .as_ref()
            .map_or(0, |proxy| proxy.hash_u32(self.state))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Values in insertion order of their keys.
    pub fn values(&self) -> Vec<V> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    ///
    /// Do not erase entries while iterating. Collect the keys first if the map must change during traversal.
    pub fn iter(&self) -> Iter<K, V> {
        Iter {
            inner: self
                .proxy
                .as_ref()
                .map(|proxy| Rc::clone(proxy).iter(self.state)),
        }
    }

    /// Returns the first key (in insertion order) whose value equals `value`.
    pub fn find_key_by_value(&self, value: &V) -> Option<K>
    where
        V: PartialEq,
    {
        functions::find_key(self, value)
    }

    /// Returns `true` if the map is read-only. See [`make_read_only()`][Self::make_read_only].
    pub fn is_read_only(&self) -> bool {
        self.proxy
            .as_ref()
            .is_some_and(|proxy| proxy.is_read_only(self.state))
    }

    /// Type-erased view of the same dictionary.
    ///
    /// Writes through the returned map are visible here and vice versa.
    ///
    /// A nil map has no storage to share, so its erased form is a separate nil map. Writing to that one materializes storage
    /// of its own, which this map never sees. Write to the map once before calling `any()` if the two must stay connected.
    pub fn any(&self) -> VarMap {
        match &self.proxy {
            Some(proxy) => Rc::clone(proxy).any(self.state),
            None => VarMap::default(),
        }
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Writes

    /// Inserts or overwrites the value for `key`.
    ///
    /// A new key goes to the end of the iteration order; overwriting keeps the key's position.
    pub fn set_index(&mut self, key: K, value: V) -> Result<(), MapError> {
        let (proxy, state) = self.materialize();
        proxy.set_index(state, key, value)
    }

    /// Inserts a value, returning the previous value for `key`, if any.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, MapError> {
        let previous = self.lookup(&key);
        self.set_index(key, value)?;
        Ok(previous)
    }

    /// Returns the value for `key`, inserting `default` first if absent.
    pub fn get_or_insert(&mut self, key: K, default: V) -> Result<V, MapError> {
        if let Some(existing) = self.lookup(&key) {
            return Ok(existing);
        }

        self.set_index(key, default.clone())?;
        Ok(default)
    }

    /// Removes `key`, returning whether it was present.
    pub fn erase(&mut self, key: &K) -> Result<bool, MapError> {
        let (proxy, state) = self.materialize();
        proxy.erase(state, key)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>, MapError> {
        let previous = self.lookup(key);
        self.erase(key)?;
        Ok(previous)
    }

    /// Removes all entries.
    pub fn clear(&mut self) -> Result<(), MapError> {
        let (proxy, state) = self.materialize();
        proxy.clear(state)
    }

    /// Copies the entries of `other` into `self`.
    ///
    /// With `overwrite`, values of keys present in both maps are taken from `other`; otherwise they are kept.
    pub fn extend_map(&mut self, other: &Map<K, V>, overwrite: bool) -> Result<(), MapError> {
        for (key, value) in other.iter() {
            if overwrite || !self.has(&key) {
                self.set_index(key, value)?;
            }
        }
        Ok(())
    }

    /// Stable reordering of the keys by a strict "less than" predicate. Values are not touched.
    pub fn sort(&mut self, less: impl Fn(&K, &K) -> bool) -> Result<(), MapError> {
        let (proxy, state) = self.materialize();
        proxy.sort(state, &less)
    }

    /// Turns the map into a read-only map.
    ///
    /// Subsequent writes return [`MapError::ReadOnly`]. There is no way to make it writable again; use
    /// [`duplicate_shallow()`][Self::duplicate_shallow] for a writable copy.
    pub fn make_read_only(&mut self) {
        let (proxy, state) = self.materialize();
        proxy.make_read_only(state);
    }

    /// Consuming variant of [`make_read_only()`][Self::make_read_only].
    pub fn into_read_only(mut self) -> Self {
        self.make_read_only();
        self
    }

    /// New writable map with the same entries, backed by a local store.
    ///
    /// Values are cloned, so nested dictionaries in a [`VarMap`] follow their own clone semantics.
    pub fn duplicate_shallow(&self) -> Self {
        functions::duplicate(self)
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Type erasure

    /// Typed view over an erased map, sharing its storage.
    ///
    /// Values are converted on access. If the erased map holds an entry that does not convert to `K`/`V`, reading it panics;
    /// use [`try_from_any()`][Self::try_from_any] to validate upfront.
    pub fn from_any(any: VarMap) -> Self {
        let any = match same_type::<VarMap, Self>(any) {
            Ok(same) => return same,
            Err(any) => any,
        };

        let (proxy, state) = any.into_parts();
        let Some(proxy) = proxy else {
            return Self::default();
        };

        // Erased view of a typed store: unwrap instead of stacking another conversion layer.
        if let Some(view) = downcast_proxy::<AnyView<K, V>, Variant, Variant>(&proxy) {
            return Self::via(Rc::clone(view.typed()), state);
        }

        Self::via(Rc::new(TypedView::<K, V>::new(proxy)), state)
    }

    /// Like [`from_any()`][Self::from_any], but checks every entry first.
    pub fn try_from_any(any: VarMap) -> Result<Self, ConvertError> {
        for (key, value) in any.iter() {
            if let Err(err) = K::try_from_variant(&key) {
                let reason = format!("key: {err}");
                return Err(FromVariantError::BadEntry { key: key.clone(), reason }.into_error(key));
            }
            if let Err(err) = V::try_from_variant(&value) {
                let reason = format!("value: {err}");
                return Err(FromVariantError::BadEntry { key, reason }.into_error(value));
            }
        }

        Ok(Self::from_any(any))
    }
}

impl VarMap {
    /// New writable map, copying nested arrays and dictionaries recursively.
    pub fn duplicate_deep(&self) -> Self {
        self.iter()
            .map(|(key, value)| (key.duplicate_deep(), value.duplicate_deep()))
            .collect()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Traits

impl<K: Key, V: Element> Default for Map<K, V> {
    /// Nil map: no storage until the first write.
    fn default() -> Self {
        Self {
            state: State::ZERO,
            proxy: None,
            owns_store: false,
        }
    }
}

impl<K: Key, V: Element> Clone for Map<K, V> {
    /// Copies the local store this handle owns, as long as it is not promoted. Shares every other backing.
    fn clone(&self) -> Self {
        let copy = self
            .proxy
            .as_ref()
            .filter(|_| self.owns_store)
            .and_then(downcast_proxy::<LocalFirst<K, V>, K, V>)
            .and_then(|local| local.detached_copy());

        match copy {
            Some(copy) => Self::owning(Rc::new(copy)),
            None => Self {
                state: self.state,
                proxy: self.proxy.clone(),
                owns_store: false,
            },
        }
    }
}

impl<K: Key, V: Element> PartialEq for Map<K, V> {
    /// Same size, and every entry of `self` has a deeply equal counterpart in `other`. Order is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && functions::entries_contained_in(self, other, 0)
    }
}

impl<K: Key, V: Element> fmt::Debug for Map<K, V> {
    /// Same as `Display`, which stops at [`MAX_RECURSION`][crate::builtin::MAX_RECURSION] levels of nesting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<K: Key, V: Element> fmt::Display for Map<K, V> {
    /// Formats the map like GDScript's `str()`, e.g. `{ "a": 1, "b": [2, 3] }`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_entries(
            f,
            self.iter()
                .map(|(key, value)| (key.to_variant(), value.to_variant())),
            0,
        )
    }
}

impl<K: Key, V: Element> FromIterator<(K, V)> for Map<K, V> {
    /// Creates a local map from an iterator. Later duplicates overwrite earlier values, keeping the first position.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_store(iter.into_iter().collect())
    }
}

impl<K: Key, V: Element> Extend<(K, V)> for Map<K, V> {
    /// Inserts all pairs, overwriting existing keys.
    ///
    /// # Panics
    /// If the map is read-only, or rejects a pair.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            if let Err(err) = self.set_index(key, value) {
                panic!("Map::extend() failed -- {err}");
            }
        }
    }
}

impl<'a, K: Key, V: Element> IntoIterator for &'a Map<K, V> {
    type Item = (K, V);
    type IntoIter = Iter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Key, V: Element> ToVariant for Map<K, V> {
    /// Shares the storage, like [`Map::any()`].
    fn to_variant(&self) -> Variant {
        Variant::Dictionary(self.any())
    }
}

impl<K: Key, V: Element> FromVariant for Map<K, V> {
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError> {
        match variant {
            Variant::Dictionary(dict) => Self::try_from_any(dict.clone()),
            other => Err(FromVariantError::BadType {
                expected: VariantType::Dictionary,
                actual: other.get_type(),
            }
            .into_error(other.clone())),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Iterator

/// Iterator over `(key, value)` pairs of a [`Map`], in insertion order.
///
/// Created by [`Map::iter()`].
pub struct Iter<K, V> {
    inner: Option<ProxyIter<K, V>>,
}

impl<K, V> Iterator for Iter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner
            .as_ref()
            .map_or((0, Some(0)), |inner| inner.size_hint())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros

/// Constructs [`Map`] literals.
///
/// Keys and values go through [`Into`], so the target type must be known from context.
///
/// # Example
/// ```no_run
/// use vardict_core::builtin::{dict, Map};
///
/// let d: Map<String, i64> = dict! {
///     "key1": 10,
///     "another": 20,
/// };
/// ```
#[macro_export]
macro_rules! dict {
    ($($key:tt: $value:expr),* $(,)?) => {
        {
            let mut map = $crate::builtin::Map::new();
            $(
                // `cargo check` complains that `(1 + 2): true` has unused parens, even though it's not
                // possible to omit the parens.
                #[allow(unused_parens)]
                ::std::iter::Extend::extend(
                    &mut map,
                    [(::std::convert::Into::into($key), ::std::convert::Into::into($value))],
                );
            )*
            map
        }
    };
}

/// Constructs [`VarMap`] literals, close to GDScript's own syntax.
///
/// Any value can be used as a key, but to use an expression you need to surround it in `()` or `{}`.
///
/// # Example
/// ```no_run
/// use vardict_core::builtin::{vdict, Variant};
///
/// let key = "my_key";
/// let d = vdict! {
///     "key1": 10,
///     "another": Variant::nil(),
///     key: true,
///     (1 + 2): "final",
/// };
/// ```
#[macro_export]
macro_rules! vdict {
    ($($key:tt: $value:expr),* $(,)?) => {
        {
            use $crate::meta::ToVariant as _;
            let mut dict = $crate::builtin::VarMap::new();
            $(
                #[allow(unused_parens)]
                ::std::iter::Extend::extend(&mut dict, [($key.to_variant(), $value.to_variant())]);
            )*
            dict
        }
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(feature = "serde")]
mod serialize {
    use super::*;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::marker::PhantomData;

    impl<K, V> Serialize for Map<K, V>
    where
        K: Key + Serialize,
        V: Element + Serialize,
    {
        #[inline]
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                map.serialize_entry(&key, &value)?;
            }
            map.end()
        }
    }

    impl<'de, K, V> Deserialize<'de> for Map<K, V>
    where
        K: Key + Deserialize<'de>,
        V: Element + Deserialize<'de>,
    {
        #[inline]
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            struct MapVisitor<K, V>(PhantomData<(K, V)>);

            impl<'de, K, V> Visitor<'de> for MapVisitor<K, V>
            where
                K: Key + Deserialize<'de>,
                V: Element + Deserialize<'de>,
            {
                type Value = Map<K, V>;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str(std::any::type_name::<Self::Value>())
                }

                fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
                where
                    A: MapAccess<'de>,
                {
                    let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                    while let Some(entry) = access.next_entry::<K, V>()? {
                        entries.push(entry);
                    }
                    Ok(entries.into_iter().collect())
                }
            }

            deserializer.deserialize_map(MapVisitor(PhantomData))
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

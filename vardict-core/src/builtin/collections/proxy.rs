/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::builtin::collections::views::AnyView;
use crate::builtin::{Map, VarMap, Variant};
use crate::meta::error::MapError;
use crate::meta::{same_type, Element, Key};

/// Opaque token identifying one logical dictionary inside a [`Proxy`].
///
/// Only the proxy that handed out a state can interpret it. Stores that hold a single dictionary per instance use
/// [`State::ZERO`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct State([u64; 2]);

impl State {
    /// State for proxies that ignore it.
    pub const ZERO: Self = Self([0; 2]);

    pub const fn new(first: u64, second: u64) -> Self {
        Self([first, second])
    }

    pub const fn words(self) -> [u64; 2] {
        self.0
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [first, second] = self.0;
        write!(f, "State({first:#x}, {second:#x})")
    }
}

/// Owning iterator over the entries of a proxied dictionary, in insertion order.
pub type ProxyIter<K, V> = Box<dyn Iterator<Item = (K, V)>>;

/// Runtime type identity of a proxy, used to recognize a specific store type behind `Rc<dyn Proxy>`.
///
/// Implemented for every `'static` type; there is no need to implement it manually. Since that includes `Rc` itself,
/// call it on the pointee (`(*rc).proxy_type_name()`), not on the `Rc`.
pub trait AsAnyRc: 'static {
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;

    /// Fully qualified type name of the concrete proxy.
    fn proxy_type_name(&self) -> &'static str;
}

impl<T: 'static> AsAnyRc for T {
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn proxy_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Backing store of a [`Map<K, V>`].
///
/// Every operation addresses one logical dictionary by the pair (proxy instance, [`State`]). A single proxy instance may
/// serve many dictionaries at once, e.g. a dispatcher over handles into a foreign runtime.
///
/// # Contract
/// - Iteration follows insertion order. Overwriting an existing key keeps its position.
/// - [`index()`][Self::index] returns `V::default()` for absent keys; only [`lookup()`][Self::lookup] and
///   [`has()`][Self::has] distinguish presence.
/// - After [`make_read_only()`][Self::make_read_only], all mutators return [`MapError::ReadOnly`]. There is no way back.
/// - [`any()`][Self::any] returns a view of the _same_ storage, not a copy.
///
/// The last four methods are hooks for [`adapt()`][crate::builtin::adapt]. Stores that own their data can keep the
/// defaults.
pub trait Proxy<K: Key, V: Element>: AsAnyRc {
    /// Value for `key`, or `V::default()` if absent.
    fn index(&self, state: State, key: &K) -> V {
        self.lookup(state, key).unwrap_or_default()
    }

    fn lookup(&self, state: State, key: &K) -> Option<V>;

    fn has(&self, state: State, key: &K) -> bool;

    /// Inserts or overwrites. New keys are appended to the iteration order.
    fn set_index(&self, state: State, key: K, value: V) -> Result<(), MapError>;

    fn clear(&self, state: State) -> Result<(), MapError>;

    /// Entries in insertion order.
    ///
    /// Mutating the dictionary while the iterator is alive is allowed, but which entries are observed is unspecified.
    fn iter(self: Rc<Self>, state: State) -> ProxyIter<K, V>;

    /// Removes `key`, returning whether it was present.
    fn erase(&self, state: State, key: &K) -> Result<bool, MapError>;

    fn hash_u32(&self, state: State) -> u32;

    fn len(&self, state: State) -> usize;

    fn is_read_only(&self, state: State) -> bool;

    fn make_read_only(&self, state: State);

    /// Type-erased view over the same storage.
    fn any(self: Rc<Self>, state: State) -> VarMap;

    /// Stable reordering of the keys, given a strict "less than" predicate.
    fn sort(&self, state: State, less: &dyn Fn(&K, &K) -> bool) -> Result<(), MapError>;

    /// Store that this proxy delegates every call to, if any.
    fn forwarded(&self, _state: State) -> Option<(Rc<dyn Proxy<K, V>>, State)> {
        None
    }

    /// Concrete type-erased store behind a conversion view, if any.
    fn lift(&self, _state: State) -> Option<(Rc<dyn Proxy<Variant, Variant>>, State)> {
        None
    }

    /// Whether [`install()`][Self::install] can hand this storage over to another store.
    fn supports_install(&self, _state: State) -> bool {
        false
    }

    /// Redirects this storage to `target` for all current and future handles.
    ///
    /// The caller has already copied the entries over.
    fn install(&self, _state: State, target: Rc<dyn Proxy<K, V>>, _target_state: State) -> Result<(), MapError> {
        Err(MapError::already_proxied(
            (*target).proxy_type_name(),
            self.proxy_type_name(),
        ))
    }
}

/// Returns the concrete `P` behind `proxy`, if that is its type.
pub(crate) fn downcast_proxy<P, K, V>(proxy: &Rc<dyn Proxy<K, V>>) -> Option<Rc<P>>
where
    P: 'static,
    K: Key,
    V: Element,
{
    Rc::clone(proxy).into_any_rc().downcast::<P>().ok()
}

/// Type-erased map over `proxy`, skipping the conversion layer when `K` and `V` are already `Variant`.
pub(crate) fn erase_proxy<K: Key, V: Element>(proxy: Rc<dyn Proxy<K, V>>, state: State) -> VarMap {
    match same_type::<Rc<dyn Proxy<K, V>>, Rc<dyn Proxy<Variant, Variant>>>(proxy) {
        Ok(erased) => Map::via(erased, state),
        Err(typed) => Map::via(Rc::new(AnyView::new(typed)), state),
    }
}

/// Stable sort of `keys` by a strict "less than" predicate.
pub(crate) fn sort_keys<K>(keys: &mut [K], less: &dyn Fn(&K, &K) -> bool) {
    use std::cmp::Ordering;

    keys.sort_by(|a, b| {
        if less(a, b) {
            Ordering::Less
        } else if less(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    });
}

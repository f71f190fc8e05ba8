/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{DefaultKey, Key as _, KeyData, SlotMap};

use crate::builtin::collections::local_store::OrderedStore;
use crate::builtin::collections::proxy::{erase_proxy, sort_keys};
use crate::builtin::{Proxy, ProxyIter, State, VarMap};
use crate::meta::error::MapError;
use crate::meta::{Element, Key};

/// Handle-addressed store holding many dictionaries behind one proxy instance.
///
/// Each dictionary lives in a slot; its [`State`] carries the slot key. This mirrors a dispatcher over handles into a foreign
/// runtime: the store, not the [`Map`][crate::builtin::Map], decides when a dictionary dies. Use [`allocate()`][Self::allocate]
/// as the allocator for [`adapt()`][crate::builtin::adapt], and [`release()`][Self::release] to free a slot.
///
/// Slots are borrowed one at a time, and only for the duration of a single call. A dictionary may therefore hold other
/// dictionaries of the same store, or itself, as keys and values.
///
/// # Panics
/// Any operation on a released state panics, like a dangling handle would in the foreign runtime.
pub struct SlotStore<K: Key, V: Element> {
    slots: RefCell<SlotMap<DefaultKey, Slot<K, V>>>,
}

type Slot<K, V> = Rc<RefCell<OrderedStore<K, V>>>;

impl<K: Key, V: Element> SlotStore<K, V> {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            slots: RefCell::new(SlotMap::new()),
        })
    }

    /// Creates an empty dictionary and returns the proxy together with its state.
    pub fn allocate(self: &Rc<Self>) -> (Rc<Self>, State) {
        let key = self
            .slots
            .borrow_mut()
            .insert(Rc::new(RefCell::new(OrderedStore::new())));
        let state = State::new(key.data().as_ffi(), 0);

        log::debug!("SlotStore: allocated {state:?}");
        (Rc::clone(self), state)
    }

    /// Frees the dictionary behind `state`. Returns `false` if it was already released.
    pub fn release(&self, state: State) -> bool {
        let released = self.slots.borrow_mut().remove(Self::slot_key(state)).is_some();

        if released {
            log::debug!("SlotStore: released {state:?}");
        }
        released
    }

    /// Number of dictionaries allocated and not yet released.
    pub fn live_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Whether `state` refers to a live dictionary of this store.
    pub fn is_live(&self, state: State) -> bool {
        self.slots.borrow().contains_key(Self::slot_key(state))
    }

    fn slot_key(state: State) -> DefaultKey {
        let [ffi, _] = state.words();
        KeyData::from_ffi(ffi).into()
    }

    fn slot(&self, state: State) -> Slot<K, V> {
        let slots = self.slots.borrow();
        let slot = slots
            .get(Self::slot_key(state))
            .unwrap_or_else(|| panic!("SlotStore: dictionary {state:?} was released or never allocated"));

        Rc::clone(slot)
    }

    fn read_slot<R>(&self, state: State, f: impl FnOnce(&OrderedStore<K, V>) -> R) -> R {
        let slot = self.slot(state);
        let store = slot.borrow();
        f(&store)
    }

    fn write_slot<R>(&self, state: State, f: impl FnOnce(&mut OrderedStore<K, V>) -> R) -> R {
        let slot = self.slot(state);
        let mut store = slot.borrow_mut();
        f(&mut store)
    }
}

impl<K: Key, V: Element> Proxy<K, V> for SlotStore<K, V> {
    fn lookup(&self, state: State, key: &K) -> Option<V> {
        self.read_slot(state, |slot| slot.get(key).cloned())
    }

    fn has(&self, state: State, key: &K) -> bool {
        self.read_slot(state, |slot| slot.contains(key))
    }

    fn set_index(&self, state: State, key: K, value: V) -> Result<(), MapError> {
        self.write_slot(state, |slot| slot.set(key, value))
    }

    fn clear(&self, state: State) -> Result<(), MapError> {
        self.write_slot(state, OrderedStore::clear)
    }

    fn iter(self: Rc<Self>, state: State) -> ProxyIter<K, V> {
        let entries: Vec<(K, V)> = self.read_slot(state, |slot| {
            slot.entries()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        });

        Box::new(entries.into_iter())
    }

    fn erase(&self, state: State, key: &K) -> Result<bool, MapError> {
        self.write_slot(state, |slot| slot.erase(key))
    }

    fn hash_u32(&self, state: State) -> u32 {
        self.read_slot(state, |slot| slot.hash_u32())
    }

    fn len(&self, state: State) -> usize {
        self.read_slot(state, |slot| slot.len())
    }

    fn is_read_only(&self, state: State) -> bool {
        self.read_slot(state, |slot| slot.is_read_only())
    }

    fn make_read_only(&self, state: State) {
        self.write_slot(state, OrderedStore::make_read_only)
    }

    fn any(self: Rc<Self>, state: State) -> VarMap {
        erase_proxy(self, state)
    }

    fn sort(&self, state: State, less: &dyn Fn(&K, &K) -> bool) -> Result<(), MapError> {
        // `less` may read this dictionary, so it runs while the slot is not borrowed.
        let mut keys = self.read_slot(state, OrderedStore::keys_for_sort)?;
        sort_keys(&mut keys, less);

        self.write_slot(state, |slot| slot.reorder(keys))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

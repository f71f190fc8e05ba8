/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cell::Cell;
use std::panic;
use std::rc::Rc;

use vardict::builtin::{SlotStore, State};
use vardict::meta::{Element, Key};

/// Swaps panic hooks, to disable printing during expected panics.
pub fn suppress_panic_log<R>(callback: impl FnOnce() -> R) -> R {
    // DISABLE following lines to *temporarily* debug panics.
    let prev_hook = panic::take_hook();
    panic::set_hook(Box::new(
        |_panic_info| { /* suppress panic hook; do nothing */ },
    ));

    let res = callback();

    // DISABLE following line to *temporarily* debug panics.
    panic::set_hook(prev_hook);

    res
}

pub fn expect_panic(context: &str, code: impl FnOnce()) {
    // Generally, types should be unwind safe, and this helps ergonomics in testing (especially around &mut in expect_panic closures).
    let code = panic::AssertUnwindSafe(code);
    let panic = suppress_panic_log(move || panic::catch_unwind(code));

    assert!(
        panic.is_err(),
        "code should have panicked but did not: {context}",
    );
}

/// Routes `log` output of the library through the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Allocator for [`adapt()`][vardict::builtin::adapt] that counts how often it was invoked.
pub struct CountingAlloc<K: Key, V: Element> {
    store: Rc<SlotStore<K, V>>,
    calls: Cell<usize>,
}

impl<K: Key, V: Element> CountingAlloc<K, V> {
    pub fn new() -> Self {
        Self {
            store: SlotStore::new(),
            calls: Cell::new(0),
        }
    }

    pub fn alloc(&self) -> (Rc<SlotStore<K, V>>, State) {
        self.calls.set(self.calls.get() + 1);
        self.store.allocate()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn store(&self) -> &Rc<SlotStore<K, V>> {
        &self.store
    }
}

impl<K: Key, V: Element> Default for CountingAlloc<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

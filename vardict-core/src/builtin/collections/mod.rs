/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod adapt;
mod local_store;
mod map;
mod proxy;
mod slot_store;
mod views;

pub(crate) mod functions;

// Re-export in vardict_core::builtin.
pub(crate) mod containers {
    pub use super::adapt::adapt;
    pub use super::local_store::LocalFirst;
    pub use super::map::{Map, VarMap};
    pub use super::proxy::{AsAnyRc, Proxy, ProxyIter, State};
    pub use super::slot_store::SlotStore;
    pub use super::views::{AnyView, TypedView};
}

// Re-export in vardict_core::builtin::iter.
pub(crate) mod iterators {
    pub use super::map::Iter as MapIter;
}

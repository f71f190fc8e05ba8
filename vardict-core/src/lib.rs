/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Internal crate of **vardict**
//!
//! Do not depend on this crate directly, instead use the `vardict` crate.
//! No SemVer or other guarantees are provided.
//!
//! # Contributor docs
//!
//! The central type is [`Map<K, V>`][builtin::Map], an insertion-ordered dictionary whose storage is reached through the
//! [`Proxy`][builtin::Proxy] trait. A freshly created map is backed by an in-process local store. The first time the map
//! has to interoperate with some other store (a foreign runtime, a handle table, ...), [`adapt()`][builtin::adapt] replays
//! its entries into that store and turns the local store into a forwarding shim. From then on, every handle to the
//! dictionary (including type-erased [`VarMap`][builtin::VarMap] views) addresses the same storage.
//!
//! Type erasure goes through [`Variant`][builtin::Variant]: a typed `Map<K, V>` can be viewed as `Map<Variant, Variant>`
//! and back, without copying, by converting keys and values at the call boundary.

#[macro_use]
mod assertions;

pub mod builtin;
pub mod meta;

#[doc(hidden)]
pub use log as __log;

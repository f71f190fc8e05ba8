/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The **vardict** library provides insertion-ordered dictionaries with pluggable storage.
//!
//! # Handles and backing stores
//!
//! A [`Map<K, V>`][builtin::Map] does not own its entries directly. It holds a [`State`][builtin::State] token and a
//! reference to a [`Proxy`][builtin::Proxy], which implements the actual storage. Three kinds of maps result from that:
//!
//! 1. **Local maps**, created with [`Map::new()`][builtin::Map::new] or the [`dict!`][builtin::dict] macro.
//!
//!    Entries live in an in-process store. Cloning such a map copies its entries, like a `Vec`. <br><br>
//!
//! 2. **Proxied maps**, attached to some store with [`Map::via()`][builtin::Map::via] or moved there with
//!    [`adapt()`][builtin::adapt].
//!
//!    Every handle to the same proxy and state addresses the same dictionary: changes through one handle are visible through
//!    all others. Cloning creates another handle. <br><br>
//!
//! 3. **Nil maps**, created with [`Map::default()`][builtin::Map::default].
//!
//!    They have no storage at all and read as empty. The first write allocates a local store.
//!
//! # Type erasure
//!
//! [`VarMap`][builtin::VarMap] is the dynamically typed `Map<Variant, Variant>`. [`Map::any()`][builtin::Map::any] and
//! [`Map::from_any()`][builtin::Map::from_any] convert in both directions without copying entries. Conversions happen when
//! entries are accessed, so a typed view over an erased map holding mismatched entries panics on read. Use
//! [`Map::try_from_any()`][builtin::Map::try_from_any] to validate upfront.
//!
//! # Ergonomics and panics
//!
//! Writes return `Result<_, MapError>`, since read-only maps and erased views can reject them. Reads never fail for a missing
//! key: [`index()`][builtin::Map::index] returns the default value, [`lookup()`][builtin::Map::lookup] returns `None`.
//!
//! # Cargo features
//!
//! * **`serde`**
//!
//!   Implements `Serialize` and `Deserialize` for `Map` and `Variant`. Maps serialize as JSON-like objects in insertion order.
//!   <br><br>
//!
//! * **`safeguards-strict`**, **`safeguards-disengaged`**
//!
//!   Select the level of internal consistency checks. Strict checks are on in debug builds by default; disengaged turns off
//!   even the balanced checks that release builds keep.
//!
//! # Logging
//!
//! The library logs through the [`log`](https://docs.rs/log) facade. Promotions and slot allocations are reported at `debug`
//! level. Install any logger implementation (e.g. `env_logger`) to see them.

#[doc(inline)]
pub use vardict_core::{builtin, meta};

pub mod prelude;

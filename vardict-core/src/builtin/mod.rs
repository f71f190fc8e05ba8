/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Built-in types: [`Variant`], [`Map`] and the [`Proxy`] machinery behind it.
//!
//! # Storage model
//!
//! A [`Map<K, V>`] is a thin handle: an opaque [`State`] token plus an optional reference to a [`Proxy`]. The proxy owns (or
//! reaches) the actual entries; the state tells it _which_ dictionary is meant, so one proxy instance can serve many maps.
//!
//! - [`LocalFirst`] is the default proxy, an insertion-ordered in-process store.
//! - [`SlotStore`] is a handle-addressed store multiplexing many dictionaries, and the reference for foreign stores.
//! - [`TypedView`] and [`AnyView`] translate between `Map<K, V>` and [`VarMap`] without copying.
//!
//! [`adapt()`] moves a map onto a specific proxy type, replaying entries only when needed.

// Re-export macros.
pub use crate::{dict, vdict};

#[doc(hidden)]
pub mod __prelude_reexport {
    use super::*;

    pub use collections::containers::*;
    pub use variant::*;

    pub use crate::{dict, vdict};
}

pub use __prelude_reexport::*;

/// Free functions operating on [`Map`] through its public API only.
pub mod functions {
    pub use super::collections::functions::*;
}

/// Iterator types for maps.
pub mod iter {
    pub use super::collections::iterators::*;
}

mod collections;
mod variant;

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::meta::error::ConvertError;

/// Error returned by fallible [`Map`][crate::builtin::Map] and [`Proxy`][crate::builtin::Proxy] operations.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A mutating operation hit a dictionary that was made read-only.
    #[error("mutating operation on read-only dictionary")]
    ReadOnly,

    /// The dictionary is already backed by a proxy of another kind, and that proxy cannot hand over its storage.
    #[error("dictionary already proxied: cannot adapt to {requested}, backed by {actual}")]
    AlreadyProxied {
        /// Short type name of the proxy that was requested.
        requested: String,
        /// Short type name of the proxy currently backing the dictionary.
        actual: String,
    },

    /// A type-erased write carried a key or value that does not convert to the map's element types.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl MapError {
    pub(crate) fn already_proxied(requested: &'static str, actual: &'static str) -> Self {
        Self::AlreadyProxied {
            requested: crate::meta::short_type_name(requested),
            actual: crate::meta::short_type_name(actual),
        }
    }

    /// Whether this error came from a write into a read-only dictionary.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

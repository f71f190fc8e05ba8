/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Often-imported symbols.

pub use super::builtin::__prelude_reexport::*;
pub use super::builtin::functions;
pub use super::meta::error::{ConvertError, MapError};
pub use super::meta::{Element, FromVariant, Key, ToVariant};

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Conversions between Rust types and [`Variant`], and the traits that bound map keys and values.
//!
//! Every type stored in a [`Map<K, V>`][crate::builtin::Map] goes through [`ToVariant`] and [`FromVariant`] whenever the map
//! is accessed through a type-erased view. The conversion _out_ of a `Variant` is the only place where dynamic typing re-enters
//! the otherwise statically typed API, so it has two flavors:
//! - [`FromVariant::try_from_variant()`] returns a [`ConvertError`][error::ConvertError] describing the mismatch.
//! - [`FromVariant::from_variant()`] panics with the same message.

pub mod error;

mod impls;

use std::fmt;
use std::hash::Hash;

use crate::builtin::Variant;
use crate::meta::error::ConvertError;

/// Defines the canonical conversion of a type to [`Variant`].
///
/// It is assumed that equal inputs produce equal variants, and that if [`FromVariant`] is implemented, converting to a
/// `Variant` and back again returns a value equal to the starting value.
///
/// Violating these assumptions is safe but will give unexpected results.
pub trait ToVariant {
    /// Converts this value to a [`Variant`].
    // Must not panic: type-erased writes rely on it to report errors instead.
    fn to_variant(&self) -> Variant;
}

/// Defines the canonical conversion from [`Variant`] to a type.
pub trait FromVariant: Sized {
    /// Performs the conversion from a [`Variant`], returning `Err` on failure.
    fn try_from_variant(variant: &Variant) -> Result<Self, ConvertError>;

    /// ⚠️ Performs the conversion from a [`Variant`].
    ///
    /// # Panics
    /// If the conversion fails.
    fn from_variant(variant: &Variant) -> Self {
        Self::try_from_variant(variant).unwrap_or_else(|err| {
            panic!("FromVariant::from_variant() failed -- {err}");
        })
    }
}

/// Types that can be stored as values in a [`Map`][crate::builtin::Map].
///
/// `Default` provides the value that [`Map::index()`][crate::builtin::Map::index] returns for absent keys.
///
/// This trait is implemented automatically for every type that fulfills the bounds.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be stored in a `Map`",
    note = "map elements need `ToVariant + FromVariant + Clone + Default + Debug + 'static`"
)]
pub trait Element: ToVariant + FromVariant + Clone + Default + fmt::Debug + 'static {}

impl<T> Element for T where T: ToVariant + FromVariant + Clone + Default + fmt::Debug + 'static {}

/// Types that can be used as keys in a [`Map`][crate::builtin::Map].
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a `Map` key",
    note = "map keys need to be `Element + Eq + Hash`"
)]
pub trait Key: Element + Eq + Hash {}

impl<T> Key for T where T: Element + Eq + Hash {}

/// Attempts `value` as `U`, if `T` and `U` are the same type. Returns `value` otherwise.
///
/// Used to skip conversion layers when a generic parameter turns out to be `Variant` itself.
pub(crate) fn same_type<T: 'static, U: 'static>(value: T) -> Result<U, T> {
    let boxed: Box<dyn std::any::Any> = Box::new(value);

    match boxed.downcast::<U>() {
        Ok(same) => Ok(*same),
        Err(boxed) => match boxed.downcast::<T>() {
            Ok(original) => Err(*original),
            // The box was created from a `T` two lines above.
            Err(_) => unreachable!("Box<dyn Any> lost its original type"),
        },
    }
}

/// Shortens a fully-qualified type name to the last path segment of each component, for error messages.
pub(crate) fn short_type_name(full: &'static str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;

    for (i, c) in full.char_indices() {
        if matches!(c, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&') {
            out.push_str(last_segment(&full[segment_start..i]));
            out.push(c);
            segment_start = i + c.len_utf8();
        }
    }
    out.push_str(last_segment(&full[segment_start..]));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

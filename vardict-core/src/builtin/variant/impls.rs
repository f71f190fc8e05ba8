/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::hash::{Hash, Hasher};

use super::{Variant, MAX_RECURSION};
use crate::builtin::VarMap;
use crate::meta::ToVariant;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Equality and std hashing

// All NaNs are equal to each other, and -0.0 equals 0.0. This keeps `Eq` reflexive, so NaN keys can be found again.
fn float_eq(lhs: f64, rhs: f64) -> bool {
    lhs == rhs || (lhs.is_nan() && rhs.is_nan())
}

fn float_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
            (Self::Int(lhs), Self::Int(rhs)) => lhs == rhs,
            (Self::Float(lhs), Self::Float(rhs)) => float_eq(*lhs, *rhs),
            (Self::String(lhs), Self::String(rhs)) => lhs == rhs,
            (Self::Array(lhs), Self::Array(rhs)) => lhs == rhs,
            (Self::Dictionary(lhs), Self::Dictionary(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl Eq for Variant {}

impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Self::Nil => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(x) => float_bits(*x).hash(state),
            Self::String(s) => s.hash(state),
            Self::Array(elements) => elements.hash(state),
            // Length only: entries may refer back to this dictionary, and equality ignores their order anyway.
            Self::Dictionary(dict) => dict.len().hash(state),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Content hashing (xxh32)

const TAG_NIL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_ARRAY: u8 = 5;
const TAG_DICTIONARY: u8 = 6;
const TAG_TOO_DEEP: u8 = 0xff;

impl Variant {
    /// Appends a self-delimiting byte encoding of this value.
    pub(super) fn write_canonical(&self, out: &mut Vec<u8>, depth: usize) {
        if depth > MAX_RECURSION {
            out.push(TAG_TOO_DEEP);
            return;
        }

        match self {
            Self::Nil => out.push(TAG_NIL),
            Self::Bool(b) => out.extend([TAG_BOOL, u8::from(*b)]),
            Self::Int(i) => {
                out.push(TAG_INT);
                out.extend(i.to_le_bytes());
            }
            Self::Float(x) => {
                out.push(TAG_FLOAT);
                out.extend(float_bits(*x).to_le_bytes());
            }
            Self::String(s) => {
                out.push(TAG_STRING);
                out.extend((s.len() as u64).to_le_bytes());
                out.extend(s.as_bytes());
            }
            Self::Array(elements) => {
                out.push(TAG_ARRAY);
                out.extend((elements.len() as u64).to_le_bytes());
                for element in elements {
                    element.write_canonical(out, depth + 1);
                }
            }
            Self::Dictionary(dict) => {
                out.push(TAG_DICTIONARY);
                out.extend((dict.len() as u64).to_le_bytes());
                for (key, value) in dict.iter() {
                    key.write_canonical(out, depth + 1);
                    value.write_canonical(out, depth + 1);
                }
            }
        }
    }
}

/// Content hash over entries in iteration order, shared by all built-in proxies.
///
/// Empty dictionaries hash to `0`, so a map keeps its hash when it moves from one store to another.
pub(crate) fn hash_entries<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> u32
where
    K: ToVariant + 'a,
    V: ToVariant + 'a,
{
    let mut bytes = Vec::new();
    for (key, value) in entries {
        key.to_variant().write_canonical(&mut bytes, 0);
        value.to_variant().write_canonical(&mut bytes, 0);
    }

    if bytes.is_empty() {
        0
    } else {
        xxhash_rust::xxh32::xxh32(&bytes, 0)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// From impls

macro_rules! impl_variant_from {
    ($($T:ty => $Variant:ident),* $(,)?) => {
        $(
            impl From<$T> for Variant {
                fn from(value: $T) -> Self {
                    Self::$Variant(value.into())
                }
            }
        )*
    };
}

impl_variant_from!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => String,
    &str => String,
    Vec<Variant> => Array,
);

impl From<VarMap> for Variant {
    /// Stores a shared handle, like [`ToVariant`]: clones of the variant address the same dictionary.
    fn from(value: VarMap) -> Self {
        Self::Dictionary(value.any())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
